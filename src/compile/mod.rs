//! Compilation: textual feature files in, compiled store out.
//!
//! The pipeline parses the warp (`otype`, `oslots`) single-threaded,
//! fans the remaining feature files out over a worker pool, derives the
//! computed indices, and publishes everything with one atomic rename.
//! Given identical inputs the emitted store is byte-identical.

mod compiler;
mod features;
mod warp;

pub use compiler::compile;

pub(crate) use features::{compile_edge_feature, compile_node_feature, CompiledFeature};
pub(crate) use warp::{compile_oslots, compile_otype, Warp};
