//! On-disk format behavior: schema bumps, corruption, atomicity.

mod common;

use std::fs;

use common::{snapshot_files, write_tiny_corpus};
use context_fabric::storage::{store_root, MmapStore, StoreKind};
use context_fabric::{Fabric, FabricConfig, FabricError, Silent, TerminationFlag};

fn fabric_at(dir: &std::path::Path) -> Fabric {
    Fabric::new(FabricConfig::at(dir).with_silent(Silent::Deep))
}

#[test]
fn test_schema_bump_forces_identical_recompile() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(dir.path());
    fabric_at(dir.path()).load_all().expect("first compile");

    let root = store_root(dir.path());
    let before = snapshot_files(&root);

    // Bump the stored format version; the store is now incompatible.
    let meta_path = root.join("meta.json");
    let meta = fs::read_to_string(&meta_path).expect("meta.json");
    fs::write(&meta_path, meta.replace("\"version\": 1", "\"version\": 2")).expect("tampered");
    assert!(matches!(
        MmapStore::open(&root),
        Err(FabricError::SchemaMismatch { .. })
    ));

    // The next load recompiles and the result is byte-identical to the
    // original compile.
    let api = fabric_at(dir.path()).load_all().expect("recompile");
    assert_eq!(api.max_node(), 5);
    assert_eq!(snapshot_files(&root), before);

    // Replacing the store must leave no staging or staled-aside dirs.
    let entries: Vec<String> = fs::read_dir(dir.path().join(".cfm"))
        .expect("readable .cfm")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["1"]);
}

#[test]
fn test_truncated_csr_is_reported_as_corruption() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(dir.path());
    fabric_at(dir.path()).load_all().expect("compile");

    let root = store_root(dir.path());
    let data_path = root.join("warp").join("oslots.data");
    let bytes = fs::read(&data_path).expect("oslots.data");
    fs::write(&data_path, &bytes[..bytes.len() - 1]).expect("truncated");

    let store = MmapStore::open(&root).expect("meta still opens");
    let err = store
        .csr(StoreKind::Warp, "oslots")
        .expect_err("truncated file");
    match &err {
        FabricError::Corruption { path, .. } => {
            assert!(path.ends_with("warp/oslots.data"), "path was {path:?}");
        }
        other => panic!("expected Corruption, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_corrupt_store_without_sources_fails_load() {
    let source_dir = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(source_dir.path());
    fabric_at(source_dir.path()).load_all().expect("compile");

    // Move the store to a location without source files, then damage it.
    let bare_dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(bare_dir.path().join(".cfm")).expect("store dir");
    let target = store_root(bare_dir.path());
    copy_tree(&store_root(source_dir.path()), &target);
    let data_path = target.join("warp").join("oslots.data");
    let bytes = fs::read(&data_path).expect("oslots.data");
    fs::write(&data_path, &bytes[..bytes.len() - 1]).expect("truncated");

    let err = fabric_at(bare_dir.path())
        .load_all()
        .expect_err("no partial API from a damaged store");
    assert!(matches!(err, FabricError::Corruption { .. }));
}

#[test]
fn test_bad_magic_is_corruption() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(dir.path());
    fabric_at(dir.path()).load_all().expect("compile");

    let root = store_root(dir.path());
    let rank_path = root.join("computed").join("rank.npy");
    let mut bytes = fs::read(&rank_path).expect("rank.npy");
    bytes[0] = b'X';
    fs::write(&rank_path, bytes).expect("tampered");

    let store = MmapStore::open(&root).expect("meta still opens");
    assert!(matches!(
        store.array::<u32>(StoreKind::Computed, "rank"),
        Err(FabricError::Corruption { .. })
    ));
}

#[test]
fn test_cancelled_compile_leaves_nothing_behind() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(dir.path());

    let flag = TerminationFlag::running_true();
    flag.terminate();
    let err = fabric_at(dir.path())
        .compile(&flag)
        .expect_err("cancelled compile");
    assert!(matches!(err, FabricError::Cancelled));

    let cfm = dir.path().join(".cfm");
    assert!(!store_root(dir.path()).exists());
    if cfm.exists() {
        let leftovers: Vec<_> = fs::read_dir(&cfm)
            .expect("readable .cfm")
            .filter_map(|e| e.ok())
            .collect();
        assert!(leftovers.is_empty(), "staging dir must be cleaned up");
    }
}

#[test]
fn test_malformed_source_reports_file_and_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(dir.path());
    // Slot 9 is out of range for maxSlot=3.
    fs::write(
        dir.path().join("oslots.tf"),
        "@edge\n@valueType=str\n\n1-2\n2,9\n",
    )
    .expect("broken oslots");

    let err = fabric_at(dir.path()).load_all().expect_err("bad source");
    match &err {
        FabricError::Malformed { path, line, .. } => {
            assert!(path.ends_with("oslots.tf"));
            assert_eq!(*line, 5);
        }
        other => panic!("expected Malformed, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 3);
    assert!(!store_root(dir.path()).exists(), "no partial store");
}

fn copy_tree(from: &std::path::Path, to: &std::path::Path) {
    fs::create_dir_all(to).expect("target dir");
    for entry in fs::read_dir(from).expect("source dir") {
        let entry = entry.expect("entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("copied file");
        }
    }
}
