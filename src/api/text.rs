//! Text rendering and section addressing.

use std::fmt::Write as _;

use crate::api::Api;
use crate::errors::{FabricError, Result};
use crate::features::Value;
use crate::Node;

/// Format used when the caller does not name one.
pub const DEFAULT_FORMAT: &str = "text-orig-full";

#[derive(Debug)]
enum Segment {
    Literal(String),
    Feature(String),
}

/// A parsed `otext` format template: literal text interleaved with
/// `{feature}` placeholders, rendered once per slot.
#[derive(Debug)]
pub(crate) struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub(crate) fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars();
        while let Some(c) = chars.next() {
            if c != '{' {
                literal.push(c);
                continue;
            }
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => name.push(c),
                    None => {
                        return Err(FabricError::InvariantViolation(format!(
                            "unterminated placeholder in text format '{source}'"
                        )))
                    }
                }
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Feature(name));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    fn render(&self, api: &Api, slot: Node, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Feature(name) => {
                    if let Some(value) = api.f(name).and_then(|f| f.v(slot)) {
                        match value {
                            Value::Str(s) => out.push_str(s),
                            Value::Int(i) => {
                                let _ = write!(out, "{i}");
                            }
                        }
                    }
                }
            }
        }
    }
}

/// The `T` namespace: text rendering and heading ↔ node addressing.
pub struct Text<'a> {
    api: &'a Api,
}

impl<'a> Text<'a> {
    pub(crate) fn new(api: &'a Api) -> Self {
        Self { api }
    }

    /// Renders the slots of `nodes` through a format from `otext`
    /// (`DEFAULT_FORMAT` when `fmt` is `None`). Trailing whitespace of
    /// the final rendering is trimmed.
    pub fn text(&self, nodes: &[Node], fmt: Option<&str>) -> Result<String> {
        let name = fmt.unwrap_or(DEFAULT_FORMAT);
        let template = self.api.formats.get(name).ok_or_else(|| {
            FabricError::not_present(format!("text format '{name}'"))
        })?;
        let mut out = String::new();
        for &node in nodes {
            for &slot in &*self.api.oslots().s(node) {
                template.render(self.api, slot, &mut out);
            }
        }
        out.truncate(out.trim_end().len());
        Ok(out)
    }

    /// Available format names.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.api.formats.keys().map(String::as_str)
    }

    /// Heading tuple of the sections containing `node`, coarsest first,
    /// in the default or the given language. `None` when the corpus has
    /// no section configuration.
    pub fn section_from_node(&self, node: Node, lang: Option<&str>) -> Option<Vec<String>> {
        if node == 0 || node > self.api.max_node() {
            return None;
        }
        let sections = self.api.c().sections.as_ref()?;
        let lang = lang.unwrap_or("");
        // For a slot the covering nodes come from the coverage index:
        // a single-slot section covers its slot with an equal set, which
        // strict embedding does not report.
        let containers: &[u32] = if node <= self.api.max_slot() {
            self.api.oslots().t(node)
        } else {
            self.api.c().lev_up.row((node - 1) as usize)
        };
        let mut heading = Vec::new();
        for (level, section_type) in sections.types().iter().enumerate() {
            let holder = if self.api.otype().v(node) == Some(section_type.as_str()) {
                Some(node)
            } else {
                // Rank-sorted rows end with the nearest container.
                containers
                    .iter()
                    .rev()
                    .copied()
                    .find(|&m| self.api.otype().v(m) == Some(section_type.as_str()))
            };
            let Some(holder) = holder else { break };
            let feature_name = if lang.is_empty() {
                sections.features()[level].clone()
            } else {
                format!("{}@{lang}", sections.features()[level])
            };
            let Some(value) = self.api.f(&feature_name).and_then(|f| f.v(holder)) else {
                break;
            };
            heading.push(value.to_string());
        }
        if heading.is_empty() {
            None
        } else {
            Some(heading)
        }
    }

    /// Node addressed by a heading tuple, coarsest first.
    pub fn node_from_section(&self, heading: &[&str], lang: Option<&str>) -> Option<Node> {
        self.api
            .c()
            .sections
            .as_ref()?
            .node_from_heading(lang.unwrap_or(""), heading)
    }

    /// Node addressed by a heading in the user-declared structure
    /// hierarchy.
    pub fn node_from_structure(&self, heading: &[&str]) -> Option<Node> {
        self.api
            .c()
            .structure
            .as_ref()?
            .node_from_heading("", heading)
    }
}
