//! The API handle and its construction from an open store.

use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::api::text::Template;
use crate::api::{Locality, Nodes, Text};
use crate::collections::{Array, Csr, CsrBuilder};
use crate::compute::{
    build_boundary, build_embedding, build_levels, build_rank, build_section_index, node_levels,
    node_spans, sort_by_rank, LevelInfo, SectionIndex,
};
use crate::config::FabricConfig;
use crate::errors::{FabricError, Result};
use crate::features::{EdgeFeature, NodeFeature, OslotsFeature, OtypeFeature};
use crate::storage::layout;
use crate::storage::{MmapStore, StoreKind, StoreMeta, ValueKind};
use crate::Node;

/// The computed indices of a loaded corpus. Mapped from the store when
/// present, rebuilt in memory otherwise.
#[derive(Debug)]
pub struct Computed {
    pub rank: Array<u32>,
    pub order: Array<u32>,
    pub lev_up: Csr,
    pub lev_down: Csr,
    pub boundary_first: Csr,
    pub boundary_last: Csr,
    pub levels: Vec<LevelInfo>,
    pub sections: Option<SectionIndex>,
    pub structure: Option<SectionIndex>,
}

/// A loaded corpus: feature maps plus the computed indices, bound to the
/// mapped store files that back them.
#[derive(Debug)]
pub struct Api {
    meta: StoreMeta,
    otype: OtypeFeature,
    oslots: OslotsFeature,
    node_features: BTreeMap<String, NodeFeature>,
    edge_features: BTreeMap<String, EdgeFeature>,
    computed: Computed,
    pub(crate) formats: BTreeMap<String, Template>,
}

impl Api {
    pub fn max_slot(&self) -> u32 {
        self.meta.max_slot
    }

    pub fn max_node(&self) -> u32 {
        self.meta.max_node
    }

    pub fn slot_type(&self) -> &str {
        &self.meta.slot_type
    }

    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    /// Node feature by name (the `F` namespace).
    pub fn f(&self, name: &str) -> Option<&NodeFeature> {
        self.node_features.get(name)
    }

    /// Edge feature by name (the `E` namespace).
    pub fn e(&self, name: &str) -> Option<&EdgeFeature> {
        self.edge_features.get(name)
    }

    /// The computed indices (the `C` namespace).
    pub fn c(&self) -> &Computed {
        &self.computed
    }

    pub fn otype(&self) -> &OtypeFeature {
        &self.otype
    }

    pub fn oslots(&self) -> &OslotsFeature {
        &self.oslots
    }

    /// Node iteration in canonical order (the `N` namespace).
    pub fn n(&self) -> Nodes<'_> {
        Nodes::new(self)
    }

    /// Locality queries (the `L` namespace).
    pub fn l(&self) -> Locality<'_> {
        Locality::new(self)
    }

    /// Text and section addressing (the `T` namespace).
    pub fn t(&self) -> Text<'_> {
        Text::new(self)
    }

    pub fn node_feature_names(&self) -> impl Iterator<Item = &str> {
        self.node_features.keys().map(String::as_str)
    }

    pub fn edge_feature_names(&self) -> impl Iterator<Item = &str> {
        self.edge_features.keys().map(String::as_str)
    }

    /// Canonical position of a node, `None` outside `1..=max_node`.
    pub fn rank_of(&self, node: Node) -> Option<u32> {
        if node == 0 {
            return None;
        }
        self.computed.rank.get((node - 1) as usize)
    }

    /// Builds the full API from an open store. `selection` restricts the
    /// loaded node/edge features; `None` loads everything the store has.
    pub(crate) fn from_store(
        store: &MmapStore,
        selection: Option<&BTreeSet<String>>,
        config: &FabricConfig,
    ) -> Result<Self> {
        let meta = store.meta().clone();
        let max_slot = meta.max_slot;
        let max_node = meta.max_node;

        // Warp.
        let type_names: Vec<String> = store.json(StoreKind::Warp, "otype_types")?;
        let codes = store.array::<u16>(StoreKind::Warp, "otype")?;
        let otype = OtypeFeature::new(
            type_names,
            codes,
            max_slot,
            max_node,
            meta.slot_type.clone(),
        )?;
        let oslots_csr = store.csr(StoreKind::Warp, "oslots")?;
        if oslots_csr.len() != (max_node - max_slot) as usize {
            return Err(FabricError::InvariantViolation(format!(
                "oslots has {} rows for {} composite nodes",
                oslots_csr.len(),
                max_node - max_slot
            )));
        }
        for &slot in oslots_csr.data_slice() {
            if slot < 1 || slot > max_slot {
                return Err(FabricError::InvariantViolation(format!(
                    "oslots references slot {slot} outside [1, {max_slot}]"
                )));
            }
        }

        // Computed indices: map when stored, rebuild when not.
        let (mins, maxs) = node_spans(&oslots_csr, max_slot, max_node);
        let levels: Vec<LevelInfo> = match store.json(StoreKind::Computed, "levels") {
            Ok(levels) => levels,
            Err(e) if e.is_not_present() => build_levels(
                otype.type_names(),
                otype.codes_slice(),
                &oslots_csr,
                &meta.slot_type,
                max_slot,
            ),
            Err(e) => return Err(e),
        };

        let (rank, order) = match (
            store.array::<u32>(StoreKind::Computed, "rank"),
            store.array::<u32>(StoreKind::Computed, "order"),
        ) {
            (Ok(rank), Ok(order)) => (rank, order),
            (Err(e), _) | (_, Err(e)) if !e.is_not_present() => return Err(e),
            _ => {
                let per_node = node_levels(
                    &levels,
                    otype.codes_slice(),
                    otype.type_names(),
                    &meta.slot_type,
                    max_slot,
                    max_node,
                );
                let (rank, order) = build_rank(&mins, &maxs, &per_node);
                (rank.into(), order.into())
            }
        };
        if rank.len() != max_node as usize || order.len() != max_node as usize {
            return Err(FabricError::InvariantViolation(format!(
                "rank/order cover {}/{} nodes, expected {max_node}",
                rank.len(),
                order.len()
            )));
        }

        // Slot coverage index, rank-sorted per slot.
        let mut cover_rows: Vec<Vec<u32>> = vec![Vec::new(); max_slot as usize];
        for node in max_slot + 1..=max_node {
            for &slot in oslots_csr.row((node - max_slot - 1) as usize) {
                cover_rows[(slot - 1) as usize].push(node);
            }
        }
        let mut cover = CsrBuilder::new();
        for row in &mut cover_rows {
            sort_by_rank(row, rank.as_slice());
            cover.push_row(row);
        }
        let cover = cover.finish();

        let (boundary_first, boundary_last) = match (
            store.csr(StoreKind::Computed, "boundary_first"),
            store.csr(StoreKind::Computed, "boundary_last"),
        ) {
            (Ok(first), Ok(last)) => (first, last),
            (Err(e), _) | (_, Err(e)) if !e.is_not_present() => return Err(e),
            _ => build_boundary(&mins, &maxs, rank.as_slice(), max_slot),
        };

        let (lev_up, lev_down) = match (
            store.csr(StoreKind::Computed, "levup"),
            store.csr(StoreKind::Computed, "levdown"),
        ) {
            (Ok(up), Ok(down)) => (up, down),
            (Err(e), _) | (_, Err(e)) if !e.is_not_present() => return Err(e),
            _ => build_embedding(
                &oslots_csr,
                &cover,
                &mins,
                rank.as_slice(),
                max_slot,
                max_node,
            ),
        };

        let oslots = OslotsFeature::new(oslots_csr, cover, max_slot, max_node);

        // Node and edge features.
        let wanted = |name: &str| selection.map(|s| s.contains(name)).unwrap_or(true);
        let mut node_features = BTreeMap::new();
        for name in meta.features.node.iter().filter(|n| wanted(n.as_str())) {
            let feature_meta = store.feature_meta(StoreKind::Features, name)?;
            let feature = match feature_meta.value_type {
                ValueKind::Int => NodeFeature::new_int(
                    name.clone(),
                    feature_meta,
                    store.array::<i64>(StoreKind::Features, name)?,
                ),
                ValueKind::Str => {
                    let (pool, idx) = store.string_column(StoreKind::Features, name)?;
                    NodeFeature::new_str(name.clone(), feature_meta, idx, pool)
                }
            };
            node_features.insert(name.clone(), feature);
        }

        let mut edge_features = BTreeMap::new();
        for name in meta.features.edge.iter().filter(|n| wanted(n.as_str())) {
            let feature_meta = store.feature_meta(StoreKind::Edges, name)?;
            let inverse_name = layout::inverse_name(name);
            let (forward, inverse, pool) = if feature_meta.edge_values {
                let forward =
                    store.csr_with_values(StoreKind::Edges, name, feature_meta.value_type)?;
                let inverse = store.csr_with_values(
                    StoreKind::Edges,
                    &inverse_name,
                    feature_meta.value_type,
                )?;
                let pool = match feature_meta.value_type {
                    ValueKind::Str => Some(store.string_pool(StoreKind::Edges, name)?),
                    ValueKind::Int => None,
                };
                (forward, inverse, pool)
            } else {
                (
                    store.csr(StoreKind::Edges, name)?,
                    store.csr(StoreKind::Edges, &inverse_name)?,
                    None,
                )
            };
            edge_features.insert(
                name.clone(),
                EdgeFeature::new(name.clone(), feature_meta, forward, inverse, pool),
            );
        }

        // Report requested features the store does not carry.
        if let Some(selection) = selection {
            for name in selection {
                if !node_features.contains_key(name) && !edge_features.contains_key(name) {
                    if config.strict {
                        return Err(FabricError::not_present(format!("feature '{name}'")));
                    }
                    if config.silent.allows_warn() {
                        warn!("requested feature '{name}' is not present; skipping");
                    }
                }
            }
        }

        // Section and structure indices.
        let otext = &meta.otext;
        let sections = if otext.has_sections() {
            match build_section_index(
                &otext.section_types,
                &otext.section_features,
                &otext.section_languages,
                &otype,
                &lev_up,
                &node_features,
            ) {
                Ok(index) => Some(index),
                Err(e) if e.is_not_present() => {
                    if config.silent.allows_warn() {
                        warn!("sections unavailable: {e}");
                    }
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };
        let structure = if otext.has_structure() {
            match build_section_index(
                &otext.structure_types,
                &otext.structure_features,
                &[],
                &otype,
                &lev_up,
                &node_features,
            ) {
                Ok(index) => Some(index),
                Err(e) if e.is_not_present() => {
                    if config.silent.allows_warn() {
                        warn!("structure unavailable: {e}");
                    }
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let mut formats = BTreeMap::new();
        for (name, source) in &otext.formats {
            formats.insert(name.clone(), Template::parse(source)?);
        }

        Ok(Self {
            meta,
            otype,
            oslots,
            node_features,
            edge_features,
            computed: Computed {
                rank,
                order,
                lev_up,
                lev_down,
                boundary_first,
                boundary_last,
                levels,
                sections,
                structure,
            },
            formats,
        })
    }
}
