//! Record readers over feature file bodies.
//!
//! Node-feature bodies are cursor-based: `node<TAB>value` repositions the
//! cursor, a bare `value` applies at the cursor, `-` or a blank line
//! repeats the previous value, and the cursor advances after every record.
//! `oslots` bodies carry comma-separated slot lists with `a-b` range
//! shorthand; edge bodies carry `src<TAB>dst[<TAB>value]`.

use std::path::{Path, PathBuf};

use crate::errors::{FabricError, Result};
use crate::source::Preamble;
use crate::Node;

/// A feature file read into memory: preamble parsed, body untouched.
#[derive(Debug)]
pub struct FeatureFile {
    pub name: String,
    pub path: PathBuf,
    pub preamble: Preamble,
    content: String,
    body_start: usize,
}

impl FeatureFile {
    pub fn read(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_owned();
        let content = std::fs::read_to_string(path).map_err(|e| FabricError::io(path, e))?;
        let (preamble, body_start) = {
            let lines: Vec<&str> = content.lines().collect();
            Preamble::parse(path, &lines)?
        };
        Ok(Self {
            name,
            path: path.to_path_buf(),
            preamble,
            content,
            body_start,
        })
    }

    fn body_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content
            .lines()
            .enumerate()
            .skip(self.body_start)
            .map(|(i, line)| (i + 1, line))
    }

    /// Node-feature records, cursor starting at `start_node`.
    pub fn node_records(&self, start_node: Node) -> NodeRecords<'_> {
        NodeRecords {
            path: &self.path,
            lines: Box::new(self.body_lines()),
            cursor: start_node,
            prev: None,
        }
    }

    /// `oslots` records, cursor starting at `start_node`.
    pub fn slot_records(&self, start_node: Node) -> SlotRecords<'_> {
        SlotRecords {
            path: &self.path,
            lines: Box::new(self.body_lines()),
            cursor: start_node,
        }
    }

    /// Edge records; blank lines are ignored.
    pub fn edge_records(&self) -> EdgeRecords<'_> {
        EdgeRecords {
            path: &self.path,
            lines: Box::new(self.body_lines()),
        }
    }
}

fn parse_id(path: &Path, line_no: usize, text: &str) -> Result<Node> {
    let id: Node = text.parse().map_err(|_| {
        FabricError::malformed(path, line_no, format!("expected node id, found '{text}'"))
    })?;
    if id == 0 {
        return Err(FabricError::malformed(path, line_no, "node id 0 is invalid"));
    }
    Ok(id)
}

/// Iterator over `(line, node, value)` node-feature records.
pub struct NodeRecords<'a> {
    path: &'a Path,
    lines: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    cursor: Node,
    prev: Option<&'a str>,
}

impl<'a> Iterator for NodeRecords<'a> {
    type Item = Result<(usize, Node, &'a str)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line_no, line) = self.lines.next()?;
        let value = if line.is_empty() || line == "-" {
            match self.prev {
                Some(prev) => prev,
                None => {
                    return Some(Err(FabricError::malformed(
                        self.path,
                        line_no,
                        "repeat record with no previous value",
                    )))
                }
            }
        } else if let Some((node_text, value)) = line.split_once('\t') {
            match parse_id(self.path, line_no, node_text) {
                Ok(node) => self.cursor = node,
                Err(e) => return Some(Err(e)),
            }
            value
        } else {
            line
        };
        let node = self.cursor;
        self.cursor += 1;
        self.prev = Some(value);
        Some(Ok((line_no, node, value)))
    }
}

/// Iterator over `(line, node, slots)` oslots records.
pub struct SlotRecords<'a> {
    path: &'a Path,
    lines: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    cursor: Node,
}

impl<'a> SlotRecords<'a> {
    fn parse_slot_spec(&self, line_no: usize, spec: &str) -> Result<Vec<u32>> {
        let mut slots = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(FabricError::malformed(
                    self.path,
                    line_no,
                    "empty entry in slot list",
                ));
            }
            match part.split_once('-') {
                Some((a, b)) => {
                    let a = parse_id(self.path, line_no, a)?;
                    let b = parse_id(self.path, line_no, b)?;
                    if b < a {
                        return Err(FabricError::malformed(
                            self.path,
                            line_no,
                            format!("descending slot range {a}-{b}"),
                        ));
                    }
                    slots.extend(a..=b);
                }
                None => slots.push(parse_id(self.path, line_no, part)?),
            }
        }
        Ok(slots)
    }
}

impl<'a> Iterator for SlotRecords<'a> {
    type Item = Result<(usize, Node, Vec<u32>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (line_no, line) = self.lines.next()?;
            if line.is_empty() {
                continue;
            }
            let spec = if let Some((node_text, spec)) = line.split_once('\t') {
                match parse_id(self.path, line_no, node_text) {
                    Ok(node) => self.cursor = node,
                    Err(e) => return Some(Err(e)),
                }
                spec
            } else {
                line
            };
            let node = self.cursor;
            self.cursor += 1;
            return Some(match self.parse_slot_spec(line_no, spec) {
                Ok(slots) => Ok((line_no, node, slots)),
                Err(e) => Err(e),
            });
        }
    }
}

/// Iterator over `(line, src, dst, value)` edge records.
pub struct EdgeRecords<'a> {
    path: &'a Path,
    lines: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
}

impl<'a> Iterator for EdgeRecords<'a> {
    type Item = Result<(usize, Node, Node, Option<&'a str>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (line_no, line) = self.lines.next()?;
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(3, '\t');
            let src = match parts.next() {
                Some(text) => match parse_id(self.path, line_no, text) {
                    Ok(id) => id,
                    Err(e) => return Some(Err(e)),
                },
                None => continue,
            };
            let dst = match parts.next() {
                Some(text) => match parse_id(self.path, line_no, text) {
                    Ok(id) => id,
                    Err(e) => return Some(Err(e)),
                },
                None => {
                    return Some(Err(FabricError::malformed(
                        self.path,
                        line_no,
                        "edge record needs at least src and dst",
                    )))
                }
            };
            return Some(Ok((line_no, src, dst, parts.next())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn feature_file(content: &str) -> (tempfile::TempDir, FeatureFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.tf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let parsed = FeatureFile::read(&path).unwrap();
        (dir, parsed)
    }

    #[test]
    fn test_node_records_cursor_and_repeats() {
        let (_dir, file) = feature_file("@node\n@valueType=str\n\na\nb\n5\tz\n-\n");
        let records: Vec<_> = file
            .node_records(1)
            .map(|r| r.unwrap())
            .map(|(_, node, value)| (node, value))
            .collect();
        assert_eq!(records, vec![(1, "a"), (2, "b"), (5, "z"), (6, "z")]);
    }

    #[test]
    fn test_leading_repeat_is_malformed() {
        let (_dir, file) = feature_file("@node\n@valueType=str\n\n-\n");
        let err = file.node_records(1).next().unwrap().unwrap_err();
        assert!(err.to_string().contains("no previous value"));
    }

    #[test]
    fn test_slot_records_with_ranges() {
        let (_dir, file) = feature_file("@edge\n@valueType=str\n\n1-2\n2,3\n9\t4-5,7\n");
        let records: Vec<_> = file
            .slot_records(4)
            .map(|r| r.unwrap())
            .map(|(_, node, slots)| (node, slots))
            .collect();
        assert_eq!(
            records,
            vec![(4, vec![1, 2]), (5, vec![2, 3]), (9, vec![4, 5, 7])]
        );
    }

    #[test]
    fn test_descending_range_is_malformed() {
        let (_dir, file) = feature_file("@edge\n@valueType=str\n\n5-3\n");
        assert!(file.slot_records(4).next().unwrap().is_err());
    }

    #[test]
    fn test_edge_records_with_and_without_values() {
        let (_dir, file) = feature_file("@edge\n@valueType=str\n@edgeValues=true\n\n2\t4\thead\n3\t4\n");
        let records: Vec<_> = file.edge_records().map(|r| r.unwrap()).collect();
        assert_eq!(records[0], (5, 2, 4, Some("head")));
        assert_eq!(records[1], (6, 3, 4, None));
    }

    #[test]
    fn test_bad_node_id_reports_line() {
        let (_dir, file) = feature_file("@node\n@valueType=str\n\nxyz\tvalue\n");
        let err = file.node_records(1).next().unwrap().unwrap_err();
        assert!(err.to_string().contains(":4:"));
    }
}
