//! Core immutable containers: scalar slabs, string pools and CSR arrays.
//!
//! Everything here is constructed once (by the compiler or the loader) and
//! read concurrently afterwards without synchronization.

mod array;
mod csr;
mod string_pool;

pub use array::{Array, MappedSlice, Scalar};
pub use csr::{Csr, CsrBuilder, CsrValues};
pub use string_pool::{StringPool, StringPoolBuilder};
