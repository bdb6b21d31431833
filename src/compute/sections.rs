//! Section and structure addressing: heading tuples ↔ nodes.
//!
//! The `otext` config names a sequence of section types (book, chapter,
//! verse, ...) and the features carrying their headings. Language
//! variants are built only for languages declared in `@sectionLanguages`,
//! using features named `<feature>@<lang>`.

use std::collections::BTreeMap;

use crate::collections::Csr;
use crate::errors::{FabricError, Result};
use crate::features::{NodeFeature, OtypeFeature, Value};
use crate::Node;

/// Key of the default (unsuffixed) heading language.
pub const DEFAULT_LANG: &str = "";

/// Bidirectional heading index over a declared hierarchy of types.
#[derive(Debug)]
pub struct SectionIndex {
    types: Vec<String>,
    features: Vec<String>,
    maps: BTreeMap<String, BTreeMap<Vec<String>, Node>>,
}

impl SectionIndex {
    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    /// Resolves a heading path like `["Genesis", "1", "2"]` to its node.
    /// Shorter paths address coarser levels.
    pub fn node_from_heading(&self, lang: &str, heading: &[&str]) -> Option<Node> {
        let map = self.maps.get(lang)?;
        let key: Vec<String> = heading.iter().map(|s| s.to_string()).collect();
        map.get(&key).copied()
    }

    /// Number of addressed nodes for a language.
    pub fn len(&self, lang: &str) -> usize {
        self.maps.get(lang).map(BTreeMap::len).unwrap_or(0)
    }
}

fn heading_value(feature: &NodeFeature, node: Node) -> Option<String> {
    match feature.v(node)? {
        Value::Str(s) => Some(s.to_owned()),
        Value::Int(i) => Some(i.to_string()),
    }
}

fn suffixed(feature: &str, lang: &str) -> String {
    if lang.is_empty() {
        feature.to_owned()
    } else {
        format!("{feature}@{lang}")
    }
}

/// Builds the index for the default language plus every declared one.
///
/// `lev_up` rows must be rank-sorted (the nearest ancestor of a type is
/// the last row entry of that type). Fails with `NotPresent` when a
/// heading feature for a declared language is not loaded.
pub fn build_section_index(
    types: &[String],
    features: &[String],
    languages: &[String],
    otype: &OtypeFeature,
    lev_up: &Csr,
    node_features: &BTreeMap<String, NodeFeature>,
) -> Result<SectionIndex> {
    let mut maps = BTreeMap::new();
    let mut langs: Vec<&str> = vec![DEFAULT_LANG];
    langs.extend(languages.iter().map(String::as_str));

    for lang in langs {
        let mut heading_features = Vec::with_capacity(features.len());
        for feature in features {
            let name = suffixed(feature, lang);
            let feature = node_features.get(&name).ok_or_else(|| {
                FabricError::not_present(format!("section heading feature '{name}'"))
            })?;
            heading_features.push(feature);
        }

        let mut map: BTreeMap<Vec<String>, Node> = BTreeMap::new();
        for (level, section_type) in types.iter().enumerate() {
            let Some((min_node, max_node)) = otype.s_interval(section_type) else {
                continue;
            };
            for node in min_node..=max_node {
                let mut path = Vec::with_capacity(level + 1);
                for (ancestor_level, ancestor_type) in types.iter().enumerate().take(level) {
                    let ancestor = lev_up
                        .row((node - 1) as usize)
                        .iter()
                        .rev()
                        .copied()
                        .find(|&m| otype.v(m) == Some(ancestor_type.as_str()));
                    match ancestor.and_then(|m| heading_value(heading_features[ancestor_level], m))
                    {
                        Some(name) => path.push(name),
                        None => break,
                    }
                }
                if path.len() < level {
                    continue;
                }
                match heading_value(heading_features[level], node) {
                    Some(name) => path.push(name),
                    None => continue,
                }
                map.entry(path).or_insert(node);
            }
        }
        maps.insert(
            if lang.is_empty() {
                String::new()
            } else {
                lang.to_owned()
            },
            map,
        );
    }

    Ok(SectionIndex {
        types: types.to_vec(),
        features: features.to_vec(),
        maps,
    })
}
