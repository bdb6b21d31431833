use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::{FabricError, Result};
use crate::storage::ValueKind;

/// What a feature file declares itself to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureRole {
    Node,
    Edge,
    Config,
}

/// Parsed `@` directives from the top of a feature file.
#[derive(Clone, Debug)]
pub struct Preamble {
    pub role: FeatureRole,
    pub value_type: Option<ValueKind>,
    pub edge_values: bool,
    /// Everything not recognized above, e.g. descriptions and licences.
    pub meta: BTreeMap<String, String>,
}

impl Preamble {
    /// Parses directive lines until the first blank line; returns the
    /// preamble and the index of the first body line.
    pub fn parse(path: &Path, lines: &[&str]) -> Result<(Self, usize)> {
        let mut role = None;
        let mut value_type = None;
        let mut edge_values = false;
        let mut meta = BTreeMap::new();
        let mut body_start = lines.len();

        for (i, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                body_start = i + 1;
                break;
            }
            let line_no = i + 1;
            let directive = line.strip_prefix('@').ok_or_else(|| {
                FabricError::malformed(path, line_no, "preamble line must start with '@'")
            })?;
            let (key, value) = match directive.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (directive, None),
            };
            match (key, value) {
                ("node", None) => role = Some(FeatureRole::Node),
                ("edge", None) => role = Some(FeatureRole::Edge),
                ("config", None) => role = Some(FeatureRole::Config),
                ("valueType", Some("str")) => value_type = Some(ValueKind::Str),
                ("valueType", Some("int")) => value_type = Some(ValueKind::Int),
                ("valueType", Some(other)) => {
                    return Err(FabricError::malformed(
                        path,
                        line_no,
                        format!("valueType must be 'str' or 'int', not '{other}'"),
                    ))
                }
                ("edgeValues", Some("true")) => edge_values = true,
                ("edgeValues", Some("false")) => edge_values = false,
                ("edgeValues", Some(other)) => {
                    return Err(FabricError::malformed(
                        path,
                        line_no,
                        format!("edgeValues must be 'true' or 'false', not '{other}'"),
                    ))
                }
                (key, value) => {
                    meta.insert(key.to_owned(), value.unwrap_or("").to_owned());
                }
            }
        }

        let role = role.ok_or_else(|| {
            FabricError::malformed(path, 1, "preamble declares neither @node, @edge nor @config")
        })?;
        Ok((
            Self {
                role,
                value_type,
                edge_values,
                meta,
            },
            body_start,
        ))
    }

    /// The declared value type; an error naming the feature when missing.
    pub fn require_value_type(&self, path: &Path, name: &str) -> Result<ValueKind> {
        self.value_type.ok_or_else(|| {
            FabricError::malformed(path, 1, format!("feature '{name}' declares no @valueType"))
        })
    }
}
