//! Read side of the compiled store.
//!
//! Opens a store directory and exposes typed, zero-copy views of its
//! arrays, CSRs, string pools and JSON sidecars. Files are mapped lazily
//! on first access and the mappings cached until the store is dropped, so
//! a load only touches the features it actually uses.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::{Mmap, MmapOptions};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::collections::{Array, Csr, CsrValues, MappedSlice, Scalar, StringPool};
use crate::errors::{FabricError, Result};
use crate::storage::layout;
use crate::storage::{
    BinHeader, FeatureMeta, FileKind, StoreKind, StoreMeta, ValueKind, FORMAT_VERSION, HEADER_LEN,
};

pub struct MmapStore {
    root: PathBuf,
    meta: StoreMeta,
    maps: Mutex<HashMap<PathBuf, Arc<Mmap>>>,
}

impl MmapStore {
    /// Opens the store rooted at `root` (a `<location>/.cfm/<version>`
    /// directory). Fails with `NotPresent` when there is no store,
    /// `SchemaMismatch` when the format version differs, and `Corruption`
    /// when `meta.json` does not parse.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let meta_path = layout::meta_file(&root);
        let bytes = match std::fs::read(&meta_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FabricError::not_present(format!(
                    "no compiled store at {}",
                    root.display()
                )))
            }
            Err(e) => return Err(FabricError::io(&meta_path, e)),
        };
        let meta: StoreMeta = serde_json::from_slice(&bytes)
            .map_err(|e| FabricError::corruption(&meta_path, format!("bad meta.json: {e}")))?;
        if meta.version != FORMAT_VERSION {
            return Err(FabricError::SchemaMismatch {
                found: meta.version.to_string(),
                expected: FORMAT_VERSION.to_string(),
            });
        }
        Ok(Self {
            root,
            meta,
            maps: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    pub fn max_slot(&self) -> u32 {
        self.meta.max_slot
    }

    pub fn max_node(&self) -> u32 {
        self.meta.max_node
    }

    pub fn slot_type(&self) -> &str {
        &self.meta.slot_type
    }

    fn map_file(&self, path: &Path) -> Result<Arc<Mmap>> {
        if let Some(mmap) = self.maps.lock().get(path) {
            return Ok(mmap.clone());
        }
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FabricError::not_present(path.display().to_string()))
            }
            Err(e) => return Err(FabricError::io(path, e)),
        };
        // Safety: read-only mapping of a file that is immutable by store
        // contract once the compile's atomic rename has happened.
        let mmap = unsafe {
            MmapOptions::new()
                .map(&file)
                .map_err(|e| FabricError::io(path, e))?
        };
        let mmap = Arc::new(mmap);
        self.maps
            .lock()
            .insert(path.to_path_buf(), mmap.clone());
        Ok(mmap)
    }

    fn typed_array<T: Scalar>(&self, path: &Path, expect: FileKind) -> Result<Array<T>> {
        let mmap = self.map_file(path)?;
        let header =
            BinHeader::decode(&mmap[..]).map_err(|msg| FabricError::corruption(path, msg))?;
        if header.kind != expect {
            return Err(FabricError::corruption(
                path,
                format!("expected {expect:?} file, found {:?}", header.kind),
            ));
        }
        if header.dtype != T::DTYPE {
            return Err(FabricError::corruption(
                path,
                format!("expected dtype {:?}, found {:?}", T::DTYPE, header.dtype),
            ));
        }
        if header.expected_file_len() != mmap.len() as u64 {
            return Err(FabricError::corruption(
                path,
                format!(
                    "length mismatch: header implies {} bytes, file has {}",
                    header.expected_file_len(),
                    mmap.len()
                ),
            ));
        }
        Ok(Array::Mapped(MappedSlice::new(
            mmap,
            HEADER_LEN,
            header.shape as usize,
        )))
    }

    /// A plain scalar array, e.g. `warp/otype` or `computed/rank`.
    pub fn array<T: Scalar>(&self, kind: StoreKind, name: &str) -> Result<Array<T>> {
        self.typed_array(&layout::array_file(&self.root, kind, name), FileKind::Array)
    }

    /// A CSR without a value column.
    pub fn csr(&self, kind: StoreKind, name: &str) -> Result<Csr> {
        self.csr_inner(kind, name, None)
    }

    /// A CSR with a positionally aligned value column.
    pub fn csr_with_values(&self, kind: StoreKind, name: &str, values: ValueKind) -> Result<Csr> {
        self.csr_inner(kind, name, Some(values))
    }

    fn csr_inner(&self, kind: StoreKind, name: &str, values: Option<ValueKind>) -> Result<Csr> {
        let indptr_path = layout::csr_indptr_file(&self.root, kind, name);
        let data_path = layout::csr_data_file(&self.root, kind, name);
        let indptr = self.typed_array::<u64>(&indptr_path, FileKind::CsrIndptr)?;
        let data = self.typed_array::<u32>(&data_path, FileKind::CsrData)?;
        let values = match values {
            None => None,
            Some(values_kind) => {
                let path = layout::csr_values_file(&self.root, kind, name);
                Some(match values_kind {
                    ValueKind::Int => {
                        CsrValues::Int(self.typed_array::<i64>(&path, FileKind::CsrValues)?)
                    }
                    ValueKind::Str => {
                        CsrValues::StrIds(self.typed_array::<u32>(&path, FileKind::CsrValues)?)
                    }
                })
            }
        };
        let csr = Csr::new(indptr, data, values);
        csr.validate()
            .map_err(|msg| FabricError::corruption(&data_path, msg))?;
        Ok(csr)
    }

    /// The bytes+offsets pair of a string pool.
    pub fn string_pool(&self, kind: StoreKind, name: &str) -> Result<StringPool> {
        let bytes_path = layout::pool_bytes_file(&self.root, kind, name);
        let offsets_path = layout::pool_offsets_file(&self.root, kind, name);
        let pool = StringPool::new(
            self.typed_array::<u8>(&bytes_path, FileKind::PoolBytes)?,
            self.typed_array::<u64>(&offsets_path, FileKind::PoolOffsets)?,
        );
        pool.validate()
            .map_err(|msg| FabricError::corruption(&offsets_path, msg))?;
        Ok(pool)
    }

    /// A string feature column: pool plus the per-node id array.
    pub fn string_column(&self, kind: StoreKind, name: &str) -> Result<(StringPool, Array<u32>)> {
        let pool = self.string_pool(kind, name)?;
        let idx = self.typed_array::<u32>(
            &layout::pool_index_file(&self.root, kind, name),
            FileKind::PoolIndex,
        )?;
        Ok((pool, idx))
    }

    /// A JSON sidecar such as `warp/otype_types.json` or
    /// `computed/levels.json`.
    pub fn json<T: DeserializeOwned>(&self, kind: StoreKind, name: &str) -> Result<T> {
        let path = layout::json_file(&self.root, kind, name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FabricError::not_present(path.display().to_string()))
            }
            Err(e) => return Err(FabricError::io(&path, e)),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| FabricError::corruption(&path, format!("bad json: {e}")))
    }

    /// Metadata sidecar of a node or edge feature.
    pub fn feature_meta(&self, kind: StoreKind, name: &str) -> Result<FeatureMeta> {
        self.json(kind, &layout::feature_meta_name(name))
    }
}

impl std::fmt::Debug for MmapStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapStore")
            .field("root", &self.root)
            .field("mapped_files", &self.maps.lock().len())
            .finish()
    }
}
