//! Parsing of textual feature files, the compiler's input format.
//!
//! A feature file is UTF-8, line-oriented: a preamble of `@` directives up
//! to the first blank line, then a body of records whose grammar depends
//! on the feature's role (node, edge, or config).

mod preamble;
mod reader;

pub use preamble::{FeatureRole, Preamble};
pub use reader::{EdgeRecords, FeatureFile, NodeRecords, SlotRecords};
