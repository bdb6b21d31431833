//! The compilation pipeline.

use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;

use crate::compile::{
    compile_edge_feature, compile_node_feature, compile_oslots, compile_otype, CompiledFeature,
    Warp,
};
use crate::compute::{
    build_boundary, build_embedding, build_levels, build_rank, node_levels, node_spans,
};
use crate::errors::{FabricError, Result};
use crate::source::{FeatureFile, FeatureRole};
use crate::storage::{
    layout, FeatureLists, OtextConfig, StoreKind, StoreMeta, StoreWriter, FORMAT_VERSION,
};
use crate::termination::TerminationFlag;

/// Names with a fixed role in every corpus.
const OTYPE: &str = "otype";
const OSLOTS: &str = "oslots";
const OTEXT: &str = "otext";

/// Feature files in a source directory, sorted by name for determinism.
fn discover(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(source_dir).map_err(|e| FabricError::io(source_dir, e))?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FabricError::io(source_dir, e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("tf") && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn find<'a>(files: &'a [FeatureFile], name: &str) -> Option<&'a FeatureFile> {
    files.iter().find(|f| f.name == name)
}

fn compile_warp(files: &[FeatureFile]) -> Result<Warp> {
    let otype = find(files, OTYPE).ok_or_else(|| {
        FabricError::InvariantViolation("required feature file 'otype' is missing".into())
    })?;
    let oslots = find(files, OSLOTS).ok_or_else(|| {
        FabricError::InvariantViolation("required feature file 'oslots' is missing".into())
    })?;

    let (slot_type, max_slot, type_names, type_codes) = compile_otype(otype)?;
    let max_node = max_slot + type_codes.len() as u32;
    let oslots = compile_oslots(oslots, max_slot, max_node)?;
    Ok(Warp {
        slot_type,
        max_slot,
        max_node,
        type_names,
        type_codes,
        oslots,
    })
}

/// Compiles the source directory at `location` into
/// `<location>/.cfm/<version>/` and returns the store root.
///
/// Per-feature work runs on a pool of `workers` threads; the flag is
/// honored between phases and between feature files. On cancellation or
/// error the staging directory is removed and no store is published.
pub fn compile(location: &Path, workers: usize, flag: &TerminationFlag) -> Result<PathBuf> {
    flag.check()?;
    let paths = discover(location)?;
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        flag.check()?;
        files.push(FeatureFile::read(path)?);
    }

    let warp = compile_warp(&files)?;
    debug!(
        "warp compiled: {} slots, {} nodes, {} types",
        warp.max_slot,
        warp.max_node,
        warp.type_names.len()
    );
    flag.check()?;

    let otext = find(&files, OTEXT)
        .map(|f| OtextConfig::from_preamble(&f.preamble.meta))
        .unwrap_or_default();

    let data_files: Vec<&FeatureFile> = files
        .iter()
        .filter(|f| !matches!(f.name.as_str(), OTYPE | OSLOTS | OTEXT))
        .collect();
    for file in &data_files {
        if file.preamble.role == FeatureRole::Config {
            return Err(FabricError::malformed(
                &file.path,
                1,
                format!("unexpected @config feature '{}'", file.name),
            ));
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| FabricError::InvariantViolation(format!("worker pool: {e}")))?;
    let max_node = warp.max_node;
    let compiled: Vec<CompiledFeature> = pool.install(|| {
        data_files
            .par_iter()
            .map(|file| {
                flag.check()?;
                match file.preamble.role {
                    FeatureRole::Node => compile_node_feature(file, max_node),
                    FeatureRole::Edge => compile_edge_feature(file, max_node),
                    FeatureRole::Config => unreachable!("filtered above"),
                }
            })
            .collect::<Result<Vec<_>>>()
    })?;
    debug!("{} features compiled", compiled.len());
    flag.check()?;

    // Computed indices.
    let cover = warp
        .oslots
        .transpose(warp.max_slot as usize, warp.max_slot + 1);
    let (mins, maxs) = node_spans(&warp.oslots, warp.max_slot, warp.max_node);
    let levels = build_levels(
        &warp.type_names,
        &warp.type_codes,
        &warp.oslots,
        &warp.slot_type,
        warp.max_slot,
    );
    let per_node_levels = node_levels(
        &levels,
        &warp.type_codes,
        &warp.type_names,
        &warp.slot_type,
        warp.max_slot,
        warp.max_node,
    );
    let (rank, order) = build_rank(&mins, &maxs, &per_node_levels);
    let (boundary_first, boundary_last) = build_boundary(&mins, &maxs, &rank, warp.max_slot);
    let (lev_up, lev_down) = build_embedding(
        &warp.oslots,
        &cover,
        &mins,
        &rank,
        warp.max_slot,
        warp.max_node,
    );
    flag.check()?;

    // Write everything, then publish atomically.
    let writer = StoreWriter::create(location)?;

    let mut lists = FeatureLists::default();
    for feature in &compiled {
        let meta = feature.meta();
        if meta.is_edge {
            lists.edge.push(meta.name.clone());
        } else {
            lists.node.push(meta.name.clone());
        }
    }
    lists.node.sort();
    lists.edge.sort();

    writer.write_meta(&StoreMeta {
        version: FORMAT_VERSION,
        max_slot: warp.max_slot,
        max_node: warp.max_node,
        slot_type: warp.slot_type.clone(),
        features: lists,
        otext,
    })?;

    writer.write_u16_array(StoreKind::Warp, OTYPE, &warp.type_codes)?;
    writer.write_json(StoreKind::Warp, "otype_types", &warp.type_names)?;
    writer.write_csr(StoreKind::Warp, OSLOTS, &warp.oslots)?;

    for feature in &compiled {
        flag.check()?;
        let name = feature.meta().name.as_str();
        match feature {
            CompiledFeature::IntNode { meta, values } => {
                writer.write_i64_array(StoreKind::Features, name, values)?;
                writer.write_json(
                    StoreKind::Features,
                    &layout::feature_meta_name(name),
                    meta,
                )?;
            }
            CompiledFeature::StrNode { meta, pool, idx } => {
                writer.write_string_column(StoreKind::Features, name, pool, idx)?;
                writer.write_json(
                    StoreKind::Features,
                    &layout::feature_meta_name(name),
                    meta,
                )?;
            }
            CompiledFeature::Edge {
                meta,
                forward,
                inverse,
                pool,
            } => {
                writer.write_csr(StoreKind::Edges, name, forward)?;
                writer.write_csr(StoreKind::Edges, &layout::inverse_name(name), inverse)?;
                if let Some(pool) = pool {
                    writer.write_pool(StoreKind::Edges, name, pool)?;
                }
                writer.write_json(StoreKind::Edges, &layout::feature_meta_name(name), meta)?;
            }
        }
    }

    writer.write_u32_array(StoreKind::Computed, "rank", &rank)?;
    writer.write_u32_array(StoreKind::Computed, "order", &order)?;
    writer.write_csr(StoreKind::Computed, "levup", &lev_up)?;
    writer.write_csr(StoreKind::Computed, "levdown", &lev_down)?;
    writer.write_csr(StoreKind::Computed, "boundary_first", &boundary_first)?;
    writer.write_csr(StoreKind::Computed, "boundary_last", &boundary_last)?;
    writer.write_json(StoreKind::Computed, "levels", &levels)?;

    flag.check()?;
    let root = writer.commit()?;
    debug!("store published at {}", root.display());
    Ok(root)
}
