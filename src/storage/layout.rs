//! Store directory layout and file naming.
//!
//! A compiled store lives at `<location>/.cfm/<version>/` with one
//! subdirectory per kind. Splitting every feature into its own files keeps
//! page-cache sharing precise: processes touching different feature
//! subsets do not contend.

use std::path::{Path, PathBuf};

pub const STORE_DIR: &str = ".cfm";
pub const FORMAT_VERSION: u32 = 1;

/// Subdirectory a store artifact belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreKind {
    /// The warp: `otype` and `oslots`, the skeleton every load needs.
    Warp,
    Features,
    Edges,
    Computed,
}

impl StoreKind {
    pub fn dir(self) -> &'static str {
        match self {
            StoreKind::Warp => "warp",
            StoreKind::Features => "features",
            StoreKind::Edges => "edges",
            StoreKind::Computed => "computed",
        }
    }

    pub const ALL: [StoreKind; 4] = [
        StoreKind::Warp,
        StoreKind::Features,
        StoreKind::Edges,
        StoreKind::Computed,
    ];
}

/// Final store directory for a location.
pub fn store_root(location: &Path) -> PathBuf {
    location.join(STORE_DIR).join(FORMAT_VERSION.to_string())
}

/// Staging directory a compile writes into before the atomic rename.
pub fn tmp_root(location: &Path) -> PathBuf {
    location
        .join(STORE_DIR)
        .join(format!("{FORMAT_VERSION}.tmp"))
}

pub(crate) fn array_file(root: &Path, kind: StoreKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{name}.npy"))
}

pub(crate) fn csr_indptr_file(root: &Path, kind: StoreKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{name}.indptr"))
}

pub(crate) fn csr_data_file(root: &Path, kind: StoreKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{name}.data"))
}

pub(crate) fn csr_values_file(root: &Path, kind: StoreKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{name}.values"))
}

pub(crate) fn pool_bytes_file(root: &Path, kind: StoreKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{name}.bytes"))
}

pub(crate) fn pool_offsets_file(root: &Path, kind: StoreKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{name}.offsets"))
}

pub(crate) fn pool_index_file(root: &Path, kind: StoreKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{name}.idx"))
}

pub(crate) fn json_file(root: &Path, kind: StoreKind, name: &str) -> PathBuf {
    root.join(kind.dir()).join(format!("{name}.json"))
}

pub(crate) fn meta_file(root: &Path) -> PathBuf {
    root.join("meta.json")
}

/// Name under which an edge feature's inverse CSR is stored.
pub(crate) fn inverse_name(name: &str) -> String {
    format!("{name}_inv")
}

/// Name of a feature's metadata sidecar.
pub(crate) fn feature_meta_name(name: &str) -> String {
    format!("{name}_meta")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_root_includes_version() {
        let root = store_root(Path::new("/corpus"));
        assert_eq!(root, PathBuf::from("/corpus/.cfm/1"));
        assert_eq!(tmp_root(Path::new("/corpus")), PathBuf::from("/corpus/.cfm/1.tmp"));
    }

    #[test]
    fn test_file_names() {
        let root = Path::new("/s");
        assert_eq!(
            array_file(root, StoreKind::Warp, "otype"),
            PathBuf::from("/s/warp/otype.npy")
        );
        assert_eq!(
            csr_data_file(root, StoreKind::Edges, "parent_inv"),
            PathBuf::from("/s/edges/parent_inv.data")
        );
        assert_eq!(
            pool_index_file(root, StoreKind::Features, "gloss"),
            PathBuf::from("/s/features/gloss.idx")
        );
    }
}
