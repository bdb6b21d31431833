//! Typed feature views over the store: thin facades that resolve node and
//! edge lookups against mapped columns without copying.

mod edge;
mod node;
mod oslots;
mod otype;

pub use edge::{EdgeFeature, ValuesView};
pub use node::{NodeFeature, Value, ABSENT_INT};
pub use oslots::{OslotsFeature, Slots};
pub use otype::OtypeFeature;
