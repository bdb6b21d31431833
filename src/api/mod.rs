//! The query surface handed to callers after a load.
//!
//! An [`Api`] owns every view and cache for one store; nothing is
//! process-global, so multiple stores coexist in one process. After
//! construction all data is immutable and every method is safe to call
//! from any number of threads.

mod handle;
mod locality;
mod nodes;
mod text;

pub use handle::{Api, Computed};
pub use locality::Locality;
pub use nodes::Nodes;
pub use text::{Text, DEFAULT_FORMAT};
