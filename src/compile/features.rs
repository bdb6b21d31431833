//! Per-feature compilation: node columns and edge CSRs.

use std::collections::BTreeMap;

use crate::collections::{Csr, CsrBuilder, StringPool, StringPoolBuilder};
use crate::errors::{FabricError, Result};
use crate::features::ABSENT_INT;
use crate::source::FeatureFile;
use crate::storage::{FeatureMeta, ValueKind};

/// A fully compiled feature, ready to be written.
#[derive(Debug)]
pub(crate) enum CompiledFeature {
    IntNode {
        meta: FeatureMeta,
        values: Vec<i64>,
    },
    StrNode {
        meta: FeatureMeta,
        pool: StringPool,
        idx: Vec<u32>,
    },
    Edge {
        meta: FeatureMeta,
        forward: Csr,
        inverse: Csr,
        pool: Option<StringPool>,
    },
}

impl CompiledFeature {
    pub(crate) fn meta(&self) -> &FeatureMeta {
        match self {
            CompiledFeature::IntNode { meta, .. }
            | CompiledFeature::StrNode { meta, .. }
            | CompiledFeature::Edge { meta, .. } => meta,
        }
    }
}

fn feature_meta(file: &FeatureFile, value_type: ValueKind, is_edge: bool) -> FeatureMeta {
    FeatureMeta {
        name: file.name.clone(),
        value_type,
        is_edge,
        edge_values: file.preamble.edge_values,
        meta: file
            .preamble
            .meta
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn parse_int(file: &FeatureFile, line: usize, text: &str) -> Result<i64> {
    text.parse().map_err(|_| {
        FabricError::malformed(&file.path, line, format!("expected integer, found '{text}'"))
    })
}

/// Compiles a node feature into a dense column over `1..=max_node`.
/// Records may arrive in any order; duplicates are fatal. Pool ids for
/// string features are assigned in node order, not record order.
pub(crate) fn compile_node_feature(file: &FeatureFile, max_node: u32) -> Result<CompiledFeature> {
    let value_type = file.preamble.require_value_type(&file.path, &file.name)?;

    let mut raw: Vec<Option<&str>> = vec![None; max_node as usize];
    for record in file.node_records(1) {
        let (line, node, value) = record?;
        if node > max_node {
            return Err(FabricError::malformed(
                &file.path,
                line,
                format!("node {node} exceeds maxNode {max_node}"),
            ));
        }
        let slot = &mut raw[(node - 1) as usize];
        if slot.is_some() {
            return Err(FabricError::malformed(
                &file.path,
                line,
                format!("duplicate value for node {node}"),
            ));
        }
        *slot = Some(value);
    }

    match value_type {
        ValueKind::Int => {
            let mut values = vec![ABSENT_INT; max_node as usize];
            for (i, value) in raw.iter().enumerate() {
                if let Some(text) = value {
                    values[i] = match text.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            // Line information is dropped in the first pass;
                            // re-walk the records to report the right line.
                            let line = file
                                .node_records(1)
                                .flatten()
                                .find(|&(_, node, _)| node as usize == i + 1)
                                .map(|(line, _, _)| line)
                                .unwrap_or(0);
                            return Err(parse_int(file, line, text).unwrap_err());
                        }
                    };
                }
            }
            Ok(CompiledFeature::IntNode {
                meta: feature_meta(file, ValueKind::Int, false),
                values,
            })
        }
        ValueKind::Str => {
            let mut pool = StringPoolBuilder::new();
            let idx: Vec<u32> = raw
                .iter()
                .map(|value| value.map(|s| pool.intern(s)).unwrap_or(0))
                .collect();
            Ok(CompiledFeature::StrNode {
                meta: feature_meta(file, ValueKind::Str, false),
                pool: pool.finish(),
                idx,
            })
        }
    }
}

/// Compiles an edge feature into forward and inverse CSRs over all nodes.
/// Edges are sorted by `(src, dst)` before emission; the inverse is the
/// exact transpose. A record whose value presence disagrees with the
/// declared `@edgeValues` is fatal.
pub(crate) fn compile_edge_feature(file: &FeatureFile, max_node: u32) -> Result<CompiledFeature> {
    let has_values = file.preamble.edge_values;
    let value_type = if has_values {
        file.preamble.require_value_type(&file.path, &file.name)?
    } else {
        file.preamble.value_type.unwrap_or(ValueKind::Str)
    };

    let mut edges: Vec<(u32, u32, Option<&str>)> = Vec::new();
    for record in file.edge_records() {
        let (line, src, dst, value) = record?;
        if src > max_node || dst > max_node {
            return Err(FabricError::malformed(
                &file.path,
                line,
                format!("edge ({src}, {dst}) exceeds maxNode {max_node}"),
            ));
        }
        match (has_values, value) {
            (true, None) => {
                return Err(FabricError::malformed(
                    &file.path,
                    line,
                    "edge record lacks a value but @edgeValues=true",
                ))
            }
            (false, Some(_)) => {
                return Err(FabricError::malformed(
                    &file.path,
                    line,
                    "edge record carries a value but @edgeValues=false",
                ))
            }
            _ => {}
        }
        if has_values && value_type == ValueKind::Int {
            if let Some(text) = value {
                parse_int(file, line, text)?;
            }
        }
        edges.push((src, dst, value));
    }
    edges.sort_by_key(|&(src, dst, _)| (src, dst));

    let mut pool = (has_values && value_type == ValueKind::Str).then(StringPoolBuilder::new);
    let mut builder = match (has_values, value_type) {
        (false, _) => CsrBuilder::new(),
        (true, ValueKind::Int) => CsrBuilder::with_int_values(),
        (true, ValueKind::Str) => CsrBuilder::with_str_ids(),
    };

    let mut cursor = 0usize;
    let mut row: Vec<u32> = Vec::new();
    let mut int_row: Vec<i64> = Vec::new();
    let mut id_row: Vec<u32> = Vec::new();
    for node in 1..=max_node {
        row.clear();
        int_row.clear();
        id_row.clear();
        while let Some(&(src, dst, value)) = edges.get(cursor) {
            if src != node {
                break;
            }
            cursor += 1;
            row.push(dst);
            if has_values {
                match &mut pool {
                    // Parse already validated above.
                    None => int_row.push(value.unwrap_or("0").parse().unwrap_or(0)),
                    Some(pool) => id_row.push(pool.intern(value.unwrap_or(""))),
                }
            }
        }
        match (has_values, value_type) {
            (false, _) => builder.push_row(&row),
            (true, ValueKind::Int) => builder.push_row_with_int(&row, &int_row),
            (true, ValueKind::Str) => builder.push_row_with_str(&row, &id_row),
        }
    }

    let forward = builder.finish();
    let inverse = forward.transpose(max_node as usize, 1);
    Ok(CompiledFeature::Edge {
        meta: feature_meta(
            file,
            if has_values { value_type } else { ValueKind::Str },
            true,
        ),
        forward,
        inverse,
        pool: pool.map(StringPoolBuilder::finish),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn feature(content: &str) -> (tempfile::TempDir, FeatureFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feat.tf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let parsed = FeatureFile::read(&path).unwrap();
        (dir, parsed)
    }

    #[test]
    fn test_str_node_feature_pool_ids_in_node_order() {
        // Records deliberately out of node order.
        let (_dir, file) = feature("@node\n@valueType=str\n\n3\tcc\n1\taa\n2\tbb\n");
        let compiled = compile_node_feature(&file, 4).unwrap();
        match compiled {
            CompiledFeature::StrNode { pool, idx, .. } => {
                assert_eq!(idx, vec![1, 2, 3, 0]);
                assert_eq!(pool.get(1), Some("aa"));
                assert_eq!(pool.get(3), Some("cc"));
            }
            other => panic!("expected string feature, got {other:?}"),
        }
    }

    #[test]
    fn test_int_node_feature_with_absence() {
        let (_dir, file) = feature("@node\n@valueType=int\n\n1\t7\n3\t-42\n");
        let compiled = compile_node_feature(&file, 3).unwrap();
        match compiled {
            CompiledFeature::IntNode { values, .. } => {
                assert_eq!(values, vec![7, ABSENT_INT, -42]);
            }
            other => panic!("expected int feature, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_node_is_fatal() {
        let (_dir, file) = feature("@node\n@valueType=str\n\n1\ta\n1\tb\n");
        let err = compile_node_feature(&file, 3).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_bad_int_reports_line() {
        let (_dir, file) = feature("@node\n@valueType=int\n\n1\t7\n2\tseven\n");
        let err = compile_node_feature(&file, 3).unwrap_err();
        assert!(err.to_string().contains(":5:"));
    }

    #[test]
    fn test_edge_feature_with_string_values() {
        let (_dir, file) = feature("@edge\n@valueType=str\n@edgeValues=true\n\n3\t4\tmod\n2\t4\thead\n");
        let compiled = compile_edge_feature(&file, 4).unwrap();
        match compiled {
            CompiledFeature::Edge {
                forward,
                inverse,
                pool,
                ..
            } => {
                let pool = pool.unwrap();
                assert_eq!(forward.row(1), &[4]);
                let (sources, ids) = inverse.row_with_str_ids(3).unwrap();
                assert_eq!(sources, &[2, 3]);
                let values: Vec<_> = ids.iter().map(|&id| pool.get(id).unwrap()).collect();
                assert_eq!(values, vec!["head", "mod"]);
            }
            other => panic!("expected edge feature, got {other:?}"),
        }
    }

    #[test]
    fn test_edge_value_mismatch_is_fatal() {
        let (_dir, file) = feature("@edge\n@valueType=str\n@edgeValues=true\n\n2\t4\n");
        assert!(compile_edge_feature(&file, 4).is_err());

        let (_dir, file) = feature("@edge\n@valueType=str\n@edgeValues=false\n\n2\t4\tx\n");
        assert!(compile_edge_feature(&file, 4).is_err());
    }

    #[test]
    fn test_compiled_edge_transpose_carries_values() {
        let (_dir, file) = feature("@edge\n@valueType=int\n@edgeValues=true\n\n1\t3\t10\n2\t3\t20\n");
        let CompiledFeature::Edge { inverse, .. } = compile_edge_feature(&file, 3).unwrap() else {
            panic!("expected edge");
        };
        let (sources, values) = inverse.row_with_int_values(2).unwrap();
        assert_eq!(sources, &[1, 2]);
        assert_eq!(values, &[10, 20]);
    }
}
