//! The compiled store: on-disk layout, binary headers, the mmap-backed
//! reader and the atomic writer.

mod header;
pub(crate) mod layout;
mod meta;
mod mmap_store;
mod writer;

pub use header::{BinHeader, Dtype, FileKind, HEADER_LEN, MAGIC};
pub use layout::{store_root, tmp_root, StoreKind, FORMAT_VERSION, STORE_DIR};
pub use meta::{FeatureLists, FeatureMeta, OtextConfig, StoreMeta, ValueKind};
pub use mmap_store::MmapStore;
pub use writer::StoreWriter;
