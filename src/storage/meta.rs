//! JSON metadata documents stored alongside the binary files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declared value type of a feature column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Str,
    Int,
}

/// Top-level `meta.json` of a compiled store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMeta {
    pub version: u32,
    pub max_slot: u32,
    pub max_node: u32,
    pub slot_type: String,
    pub features: FeatureLists,
    #[serde(default)]
    pub otext: OtextConfig,
}

/// Names of the node and edge features the store carries, sorted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FeatureLists {
    pub node: Vec<String>,
    pub edge: Vec<String>,
}

/// Per-feature metadata sidecar (`<name>_meta.json`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureMeta {
    pub name: String,
    pub value_type: ValueKind,
    pub is_edge: bool,
    #[serde(default)]
    pub edge_values: bool,
    /// Free-form preamble metadata (description, licence, ...).
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
}

/// Text-formatting and sectioning configuration, from the `otext` source
/// file's preamble.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtextConfig {
    #[serde(default)]
    pub section_types: Vec<String>,
    #[serde(default)]
    pub section_features: Vec<String>,
    /// Languages with heading variants, declared explicitly; for each
    /// language `xx` every section feature `f` must exist as `f@xx`.
    #[serde(default)]
    pub section_languages: Vec<String>,
    #[serde(default)]
    pub structure_types: Vec<String>,
    #[serde(default)]
    pub structure_features: Vec<String>,
    /// Text formats by name; templates use `{feature}` placeholders.
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
}

impl OtextConfig {
    /// Builds the config from an `otext` preamble metadata map.
    pub fn from_preamble(meta: &BTreeMap<String, String>) -> Self {
        fn list(meta: &BTreeMap<String, String>, key: &str) -> Vec<String> {
            meta.get(key)
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_owned())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default()
        }

        let mut formats = BTreeMap::new();
        for (key, value) in meta {
            if let Some(name) = key.strip_prefix("fmt:") {
                formats.insert(name.to_owned(), value.clone());
            }
        }

        Self {
            section_types: list(meta, "sectionTypes"),
            section_features: list(meta, "sectionFeatures"),
            section_languages: list(meta, "sectionLanguages"),
            structure_types: list(meta, "structureTypes"),
            structure_features: list(meta, "structureFeatures"),
            formats,
        }
    }

    pub fn has_sections(&self) -> bool {
        !self.section_types.is_empty() && self.section_types.len() == self.section_features.len()
    }

    pub fn has_structure(&self) -> bool {
        !self.structure_types.is_empty()
            && self.structure_types.len() == self.structure_features.len()
    }
}
