//! The façade: binds locations to a compiled store and hands out API
//! handles.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::{info, warn};
use once_cell::sync::OnceCell;

use crate::api::Api;
use crate::compile;
use crate::config::FabricConfig;
use crate::errors::{FabricError, Result};
use crate::source::{FeatureFile, FeatureRole};
use crate::storage::{store_root, MmapStore};
use crate::termination::TerminationFlag;

/// What `explore` reports per location, without loading bulk data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureCatalog {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
    pub configs: Vec<String>,
}

/// Entry point: locate sources and stores, compile when needed, load.
///
/// ```no_run
/// use context_fabric::{Fabric, FabricConfig};
///
/// let fabric = Fabric::new(FabricConfig::at("/corpus/bhsa"));
/// let api = fabric.load_all()?;
/// let otype = api.otype();
/// assert!(otype.max_node() >= otype.max_slot());
/// # Ok::<(), context_fabric::FabricError>(())
/// ```
pub struct Fabric {
    config: FabricConfig,
    catalog: OnceCell<BTreeMap<PathBuf, FeatureCatalog>>,
}

impl Fabric {
    pub fn new(config: FabricConfig) -> Self {
        Self {
            config,
            catalog: OnceCell::new(),
        }
    }

    /// Convenience constructor for a single location with defaults.
    pub fn at(location: impl Into<PathBuf>) -> Self {
        Self::new(FabricConfig::at(location))
    }

    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    fn has_sources(location: &Path) -> bool {
        location.join("otype.tf").is_file()
    }

    /// Lists available features per location by reading only preambles.
    /// Cached for the lifetime of this handle.
    pub fn explore(&self) -> Result<&BTreeMap<PathBuf, FeatureCatalog>> {
        self.catalog.get_or_try_init(|| {
            let mut out = BTreeMap::new();
            for location in &self.config.locations {
                let mut catalog = FeatureCatalog::default();
                let entries = match std::fs::read_dir(location) {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(e) => return Err(FabricError::io(location, e)),
                };
                let mut paths: Vec<PathBuf> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| {
                        p.extension().and_then(|e| e.to_str()) == Some("tf") && p.is_file()
                    })
                    .collect();
                paths.sort();
                for path in paths {
                    let file = FeatureFile::read(&path)?;
                    match file.preamble.role {
                        FeatureRole::Node => catalog.nodes.push(file.name),
                        FeatureRole::Edge => catalog.edges.push(file.name),
                        FeatureRole::Config => catalog.configs.push(file.name),
                    }
                }
                out.insert(location.clone(), catalog);
            }
            Ok(out)
        })
    }

    /// Opens an existing compatible store or compiles one, searching the
    /// configured locations in order.
    fn ensure_store(&self, flag: &TerminationFlag) -> Result<MmapStore> {
        let mut compile_candidate: Option<&Path> = None;
        for location in &self.config.locations {
            match MmapStore::open(store_root(location)) {
                Ok(store) => {
                    if self.config.silent.allows_info() {
                        info!("store opened at {}", store.root().display());
                    }
                    return Ok(store);
                }
                Err(e @ (FabricError::SchemaMismatch { .. } | FabricError::Corruption { .. })) => {
                    if Self::has_sources(location) {
                        if self.config.silent.allows_warn() {
                            warn!("recompiling {}: {e}", location.display());
                        }
                        let root = compile::compile(location, self.config.workers, flag)?;
                        return MmapStore::open(root);
                    }
                    return Err(e);
                }
                Err(e) if e.is_not_present() => {
                    if compile_candidate.is_none() && Self::has_sources(location) {
                        compile_candidate = Some(location);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        let location = compile_candidate.ok_or_else(|| {
            FabricError::not_present(format!(
                "no store or sources in {} location(s)",
                self.config.locations.len()
            ))
        })?;
        if self.config.silent.allows_info() {
            info!("compiling sources at {}", location.display());
        }
        let root = compile::compile(location, self.config.workers, flag)?;
        MmapStore::open(root)
    }

    /// Compiles unconditionally, replacing any existing store.
    pub fn compile(&self, flag: &TerminationFlag) -> Result<PathBuf> {
        for location in &self.config.locations {
            if Self::has_sources(location) {
                return compile::compile(location, self.config.workers, flag);
            }
        }
        Err(FabricError::not_present("no location holds source files"))
    }

    fn selection(&self, features: Option<&[&str]>) -> Option<BTreeSet<String>> {
        let explicit: Option<BTreeSet<String>> =
            features.map(|names| names.iter().map(|s| s.to_string()).collect());
        match (explicit, &self.config.modules) {
            (None, None) => None,
            (Some(sel), None) => Some(sel),
            (None, Some(modules)) => Some(modules.clone()),
            (Some(sel), Some(modules)) => {
                Some(sel.intersection(modules).cloned().collect())
            }
        }
    }

    /// Loads the named features (plus the warp, always).
    pub fn load(&self, features: &[&str]) -> Result<Api> {
        let flag = TerminationFlag::running_true();
        let store = self.ensure_store(&flag)?;
        Api::from_store(&store, self.selection(Some(features)).as_ref(), &self.config)
    }

    /// Loads every feature the store carries, honoring `modules`.
    pub fn load_all(&self) -> Result<Api> {
        let flag = TerminationFlag::running_true();
        let store = self.ensure_store(&flag)?;
        Api::from_store(&store, self.selection(None).as_ref(), &self.config)
    }

    /// Like [`load_all`](Self::load_all) but honoring a caller-supplied
    /// cancellation flag during any compilation.
    pub fn load_all_with_flag(&self, flag: &TerminationFlag) -> Result<Api> {
        let store = self.ensure_store(flag)?;
        Api::from_store(&store, self.selection(None).as_ref(), &self.config)
    }
}
