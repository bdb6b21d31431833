//! Write side of the compiled store.
//!
//! Everything is written into `<location>/.cfm/<version>.tmp/` and moved
//! into place with a single rename, so readers never observe a
//! half-written store. An uncommitted writer removes its staging directory
//! on drop.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::collections::{Csr, CsrValues, Scalar, StringPool};
use crate::errors::{FabricError, Result};
use crate::storage::layout;
use crate::storage::{BinHeader, FileKind, StoreKind};

pub struct StoreWriter {
    tmp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StoreWriter {
    /// Creates a fresh staging directory for `location`, clearing any
    /// leftover from an earlier aborted compile.
    pub fn create(location: &Path) -> Result<Self> {
        let tmp = layout::tmp_root(location);
        let target = layout::store_root(location);
        if tmp.exists() {
            fs::remove_dir_all(&tmp).map_err(|e| FabricError::io(&tmp, e))?;
        }
        let stale = target.with_extension("stale");
        if stale.exists() {
            fs::remove_dir_all(&stale).map_err(|e| FabricError::io(&stale, e))?;
        }
        for kind in StoreKind::ALL {
            let dir = tmp.join(kind.dir());
            fs::create_dir_all(&dir).map_err(|e| FabricError::io(&dir, e))?;
        }
        Ok(Self {
            tmp,
            target,
            committed: false,
        })
    }

    fn write_payload<T: Scalar>(
        &self,
        path: &Path,
        file_kind: FileKind,
        data: &[T],
        encode: impl Fn(&T, &mut Vec<u8>),
    ) -> Result<()> {
        let file = File::create(path).map_err(|e| FabricError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let header = BinHeader::new(file_kind, T::DTYPE, data.len() as u64);
        writer
            .write_all(&header.encode())
            .map_err(|e| FabricError::io(path, e))?;
        let mut buf = Vec::with_capacity(8);
        for item in data {
            buf.clear();
            encode(item, &mut buf);
            writer.write_all(&buf).map_err(|e| FabricError::io(path, e))?;
        }
        let file = writer
            .into_inner()
            .map_err(|e| FabricError::io(path, e.into_error()))?;
        file.sync_all().map_err(|e| FabricError::io(path, e))?;
        Ok(())
    }

    fn write_u8s(&self, path: &Path, file_kind: FileKind, data: &[u8]) -> Result<()> {
        self.write_payload(path, file_kind, data, |v, buf| buf.push(*v))
    }

    fn write_u16s(&self, path: &Path, file_kind: FileKind, data: &[u16]) -> Result<()> {
        self.write_payload(path, file_kind, data, |v, buf| {
            buf.extend_from_slice(&v.to_le_bytes())
        })
    }

    fn write_u32s(&self, path: &Path, file_kind: FileKind, data: &[u32]) -> Result<()> {
        self.write_payload(path, file_kind, data, |v, buf| {
            buf.extend_from_slice(&v.to_le_bytes())
        })
    }

    fn write_u64s(&self, path: &Path, file_kind: FileKind, data: &[u64]) -> Result<()> {
        self.write_payload(path, file_kind, data, |v, buf| {
            buf.extend_from_slice(&v.to_le_bytes())
        })
    }

    fn write_i64s(&self, path: &Path, file_kind: FileKind, data: &[i64]) -> Result<()> {
        self.write_payload(path, file_kind, data, |v, buf| {
            buf.extend_from_slice(&v.to_le_bytes())
        })
    }

    pub fn write_u16_array(&self, kind: StoreKind, name: &str, data: &[u16]) -> Result<()> {
        self.write_u16s(&layout::array_file(&self.tmp, kind, name), FileKind::Array, data)
    }

    pub fn write_u32_array(&self, kind: StoreKind, name: &str, data: &[u32]) -> Result<()> {
        self.write_u32s(&layout::array_file(&self.tmp, kind, name), FileKind::Array, data)
    }

    pub fn write_i64_array(&self, kind: StoreKind, name: &str, data: &[i64]) -> Result<()> {
        self.write_i64s(&layout::array_file(&self.tmp, kind, name), FileKind::Array, data)
    }

    pub fn write_csr(&self, kind: StoreKind, name: &str, csr: &Csr) -> Result<()> {
        self.write_u64s(
            &layout::csr_indptr_file(&self.tmp, kind, name),
            FileKind::CsrIndptr,
            csr.indptr_slice(),
        )?;
        self.write_u32s(
            &layout::csr_data_file(&self.tmp, kind, name),
            FileKind::CsrData,
            csr.data_slice(),
        )?;
        match csr.values_ref() {
            None => {}
            Some(CsrValues::Int(vals)) => self.write_i64s(
                &layout::csr_values_file(&self.tmp, kind, name),
                FileKind::CsrValues,
                vals.as_slice(),
            )?,
            Some(CsrValues::StrIds(ids)) => self.write_u32s(
                &layout::csr_values_file(&self.tmp, kind, name),
                FileKind::CsrValues,
                ids.as_slice(),
            )?,
        }
        Ok(())
    }

    pub fn write_pool(&self, kind: StoreKind, name: &str, pool: &StringPool) -> Result<()> {
        self.write_u8s(
            &layout::pool_bytes_file(&self.tmp, kind, name),
            FileKind::PoolBytes,
            pool.bytes_slice(),
        )?;
        self.write_u64s(
            &layout::pool_offsets_file(&self.tmp, kind, name),
            FileKind::PoolOffsets,
            pool.offsets_slice(),
        )
    }

    /// A string feature column: pool files plus the per-node id array.
    pub fn write_string_column(
        &self,
        kind: StoreKind,
        name: &str,
        pool: &StringPool,
        idx: &[u32],
    ) -> Result<()> {
        self.write_pool(kind, name, pool)?;
        self.write_u32s(
            &layout::pool_index_file(&self.tmp, kind, name),
            FileKind::PoolIndex,
            idx,
        )
    }

    pub fn write_json<T: Serialize>(&self, kind: StoreKind, name: &str, value: &T) -> Result<()> {
        self.write_json_at(&layout::json_file(&self.tmp, kind, name), value)
    }

    pub fn write_meta<T: Serialize>(&self, value: &T) -> Result<()> {
        self.write_json_at(&layout::meta_file(&self.tmp), value)
    }

    fn write_json_at<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| {
            FabricError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        let file = File::create(path).map_err(|e| FabricError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes).map_err(|e| FabricError::io(path, e))?;
        writer.write_all(b"\n").map_err(|e| FabricError::io(path, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| FabricError::io(path, e.into_error()))?;
        file.sync_all().map_err(|e| FabricError::io(path, e))
    }

    fn sync_dir(path: &Path) -> Result<()> {
        // Directory fsync is best-effort on platforms that do not support
        // opening directories; errors other than open failures surface.
        if let Ok(dir) = File::open(path) {
            dir.sync_all().map_err(|e| FabricError::io(path, e))?;
        }
        Ok(())
    }

    /// Atomically publishes the staged store, replacing any existing one.
    /// Returns the final store root.
    ///
    /// The `tmp -> target` rename is the single transition between "old
    /// store" and "new store": an existing store is renamed aside first
    /// and restored if publishing fails, so at every instant one valid
    /// store directory exists on disk.
    pub fn commit(mut self) -> Result<PathBuf> {
        for kind in StoreKind::ALL {
            Self::sync_dir(&self.tmp.join(kind.dir()))?;
        }
        Self::sync_dir(&self.tmp)?;

        let stale = self.target.with_extension("stale");
        let displaced = self.target.exists();
        if displaced {
            if stale.exists() {
                fs::remove_dir_all(&stale).map_err(|e| FabricError::io(&stale, e))?;
            }
            fs::rename(&self.target, &stale).map_err(|e| FabricError::io(&self.target, e))?;
        }
        if let Err(e) = fs::rename(&self.tmp, &self.target) {
            // Put the old store back; the staged directory is discarded
            // on drop.
            if displaced {
                let _ = fs::rename(&stale, &self.target);
            }
            return Err(FabricError::io(&self.target, e));
        }
        self.committed = true;
        if let Some(parent) = self.target.parent() {
            Self::sync_dir(parent)?;
        }
        if displaced {
            // A leftover here is harmless; create() clears it next time.
            let _ = fs::remove_dir_all(&stale);
        }
        Ok(self.target.clone())
    }
}

impl Drop for StoreWriter {
    fn drop(&mut self) {
        if !self.committed && self.tmp.exists() {
            let _ = fs::remove_dir_all(&self.tmp);
        }
    }
}
