//! Compile-then-load round trips over the fixture corpora.

mod common;

use common::{snapshot_files, write_tiny_corpus};
use context_fabric::features::Value;
use context_fabric::storage::store_root;
use context_fabric::{Fabric, FabricConfig, FabricError, Silent};

fn tiny_fabric() -> (tempfile::TempDir, Fabric) {
    let dir = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(dir.path());
    let fabric = Fabric::new(FabricConfig::at(dir.path()).with_silent(Silent::Deep));
    (dir, fabric)
}

#[test]
fn test_load_all_compiles_and_answers_queries() {
    let (_dir, fabric) = tiny_fabric();
    let api = fabric.load_all().expect("load_all");

    assert_eq!(api.max_slot(), 3);
    assert_eq!(api.max_node(), 5);
    assert_eq!(api.slot_type(), "word");

    // Locality around slot 2 and sentence 4.
    assert_eq!(api.l().u(2, None), vec![4, 5]);
    assert_eq!(api.l().d(4, None), vec![1, 2]);

    // Slot coverage in both directions.
    assert_eq!(&*api.oslots().s(4), &[1, 2]);
    assert_eq!(api.oslots().t(2), &[4, 5]);

    // Text rendering of sentence 4.
    assert_eq!(api.t().text(&[4], None).expect("text"), "a b");
}

#[test]
fn test_round_trip_of_every_source_record() {
    let (_dir, fabric) = tiny_fabric();
    let api = fabric.load_all().expect("load_all");

    let text = api.f("text").expect("text feature");
    assert_eq!(text.v_str(1), Some("a"));
    assert_eq!(text.v_str(2), Some("b"));
    assert_eq!(text.v_str(3), Some("c"));
    assert_eq!(text.v(4), None);

    let number = api.f("number").expect("number feature");
    assert_eq!(number.v_int(1), Some(10));
    assert_eq!(number.v_int(2), Some(20));
    assert_eq!(number.v_int(3), Some(10));

    assert_eq!(api.otype().v(4), Some("sentence"));
    assert_eq!(api.otype().v(1), Some("word"));
}

#[test]
fn test_absence_is_distinct_from_empty_string() {
    let (_dir, fabric) = tiny_fabric();
    let api = fabric.load_all().expect("load_all");

    let gloss = api.f("gloss").expect("gloss feature");
    assert_eq!(gloss.v(1), Some(Value::Str("")));
    assert_eq!(gloss.v(2), None);
    assert_eq!(gloss.v(3), None);
}

#[test]
fn test_edge_values_travel_both_directions() {
    let (_dir, fabric) = tiny_fabric();
    let api = fabric.load_all().expect("load_all");

    let parent = api.e("parent").expect("parent feature");
    let (targets, values) = parent.f_with_values(2);
    assert_eq!(targets, &[4]);
    assert_eq!(values.get(0), Some(Value::Str("head")));

    let (sources, values) = parent.t_with_values(4);
    assert_eq!(sources, &[2, 3]);
    let collected: Vec<_> = values.iter().collect();
    assert_eq!(collected, vec![Value::Str("head"), Value::Str("mod")]);

    assert_eq!(parent.f(1), &[] as &[u32]);
    assert_eq!(parent.t(2), &[] as &[u32]);
}

#[test]
fn test_compile_is_deterministic() {
    let dir_a = tempfile::tempdir().expect("tempdir");
    let dir_b = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(dir_a.path());
    write_tiny_corpus(dir_b.path());

    Fabric::new(FabricConfig::at(dir_a.path()).with_silent(Silent::Deep))
        .load_all()
        .expect("first compile");
    Fabric::new(FabricConfig::at(dir_b.path()).with_silent(Silent::Deep))
        .load_all()
        .expect("second compile");

    let files_a = snapshot_files(&store_root(dir_a.path()));
    let files_b = snapshot_files(&store_root(dir_b.path()));
    assert!(!files_a.is_empty());
    assert_eq!(
        files_a.iter().map(|(name, _)| name).collect::<Vec<_>>(),
        files_b.iter().map(|(name, _)| name).collect::<Vec<_>>()
    );
    for ((name_a, bytes_a), (_, bytes_b)) in files_a.iter().zip(&files_b) {
        assert_eq!(bytes_a, bytes_b, "store file {name_a} differs between runs");
    }
}

#[test]
fn test_second_load_reuses_the_store() {
    let (dir, fabric) = tiny_fabric();
    fabric.load_all().expect("first load");
    let before = snapshot_files(&store_root(dir.path()));

    let again = Fabric::new(FabricConfig::at(dir.path()).with_silent(Silent::Deep));
    let api = again.load_all().expect("second load");
    assert_eq!(api.max_node(), 5);

    let after = snapshot_files(&store_root(dir.path()));
    assert_eq!(before, after, "loading must not rewrite the store");
}

#[test]
fn test_explore_lists_features_without_loading() {
    let (dir, fabric) = tiny_fabric();
    let catalogs = fabric.explore().expect("explore");
    let catalog = catalogs
        .get(dir.path())
        .or_else(|| catalogs.values().next())
        .expect("catalog for location");

    assert!(catalog.nodes.iter().any(|n| n == "otype"));
    assert!(catalog.nodes.iter().any(|n| n == "text"));
    assert!(catalog.edges.iter().any(|n| n == "oslots"));
    assert!(catalog.edges.iter().any(|n| n == "parent"));
    assert!(catalog.configs.iter().any(|n| n == "otext"));
    // Exploring must not compile anything.
    assert!(!store_root(dir.path()).exists());
}

#[test]
fn test_load_subset_skips_other_features() {
    let (_dir, fabric) = tiny_fabric();
    let api = fabric.load(&["text"]).expect("load subset");
    assert!(api.f("text").is_some());
    assert!(api.f("gloss").is_none());
    assert!(api.e("parent").is_none());
    // The warp is always present.
    assert_eq!(api.otype().v(4), Some("sentence"));
}

#[test]
fn test_strict_mode_fails_on_missing_feature() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_tiny_corpus(dir.path());
    let fabric = Fabric::new(
        FabricConfig::at(dir.path())
            .with_silent(Silent::Deep)
            .with_strict(true),
    );
    let err = fabric.load(&["nosuch"]).expect_err("missing feature");
    assert!(matches!(err, FabricError::NotPresent(_)));

    let relaxed = Fabric::new(FabricConfig::at(dir.path()).with_silent(Silent::Deep));
    assert!(relaxed.load(&["nosuch"]).is_ok());
}

#[test]
fn test_load_from_empty_location_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fabric = Fabric::new(FabricConfig::at(dir.path()).with_silent(Silent::Deep));
    let err = fabric.load_all().expect_err("nothing to load");
    assert!(err.is_not_present());
}
