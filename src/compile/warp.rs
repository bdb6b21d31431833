//! Compiling the warp: `otype` and `oslots`.

use std::collections::HashMap;

use crate::collections::{Csr, CsrBuilder};
use crate::errors::{FabricError, Result};
use crate::source::FeatureFile;

/// The corpus skeleton, as learned from the two required feature files.
#[derive(Debug)]
pub(crate) struct Warp {
    pub slot_type: String,
    pub max_slot: u32,
    pub max_node: u32,
    pub type_names: Vec<String>,
    pub type_codes: Vec<u16>,
    pub oslots: Csr,
}

/// Parses the `otype` body: one type per composite node in order. The
/// preamble must carry `@slotType` and `@maxSlot`; `maxNode` follows from
/// the body length. Type codes are assigned by first appearance.
pub(crate) fn compile_otype(file: &FeatureFile) -> Result<(String, u32, Vec<String>, Vec<u16>)> {
    let slot_type = file
        .preamble
        .meta
        .get("slotType")
        .cloned()
        .ok_or_else(|| FabricError::malformed(&file.path, 1, "otype declares no @slotType"))?;
    let max_slot: u32 = file
        .preamble
        .meta
        .get("maxSlot")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| {
            FabricError::malformed(&file.path, 1, "otype declares no numeric @maxSlot")
        })?;

    let mut type_names: Vec<String> = Vec::new();
    let mut codes_by_name: HashMap<String, u16> = HashMap::new();
    let mut type_codes: Vec<u16> = Vec::new();
    let mut expected = max_slot + 1;

    for record in file.node_records(max_slot + 1) {
        let (line, node, value) = record?;
        if node != expected {
            return Err(FabricError::malformed(
                &file.path,
                line,
                format!("otype must cover nodes densely; expected node {expected}, found {node}"),
            ));
        }
        if value == slot_type {
            return Err(FabricError::malformed(
                &file.path,
                line,
                format!("composite node {node} carries the slot type '{slot_type}'"),
            ));
        }
        let code = match codes_by_name.get(value) {
            Some(&code) => code,
            None => {
                let code = type_names.len() as u16;
                type_names.push(value.to_owned());
                codes_by_name.insert(value.to_owned(), code);
                code
            }
        };
        type_codes.push(code);
        expected += 1;
    }

    Ok((slot_type, max_slot, type_names, type_codes))
}

/// Parses the `oslots` body into a CSR, checking density, strict
/// monotonicity per row and the slot range.
pub(crate) fn compile_oslots(file: &FeatureFile, max_slot: u32, max_node: u32) -> Result<Csr> {
    let mut builder = CsrBuilder::new();
    let mut expected = max_slot + 1;

    for record in file.slot_records(max_slot + 1) {
        let (line, node, slots) = record?;
        if node != expected {
            return Err(FabricError::malformed(
                &file.path,
                line,
                format!("oslots must cover nodes densely; expected node {expected}, found {node}"),
            ));
        }
        if node > max_node {
            return Err(FabricError::malformed(
                &file.path,
                line,
                format!("node {node} exceeds maxNode {max_node}"),
            ));
        }
        for pair in slots.windows(2) {
            if pair[1] <= pair[0] {
                return Err(FabricError::malformed(
                    &file.path,
                    line,
                    format!("slots of node {node} are not strictly increasing"),
                ));
            }
        }
        if let (Some(&first), Some(&last)) = (slots.first(), slots.last()) {
            if first < 1 || last > max_slot {
                return Err(FabricError::malformed(
                    &file.path,
                    line,
                    format!("slot out of range [1, {max_slot}] for node {node}"),
                ));
            }
        }
        builder.push_row(&slots);
        expected += 1;
    }

    if builder.row_count() != (max_node - max_slot) as usize {
        return Err(FabricError::InvariantViolation(format!(
            "oslots covers {} nodes, expected {}",
            builder.row_count(),
            max_node - max_slot
        )));
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_compile_otype_assigns_codes_by_first_appearance() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "otype.tf",
            "@node\n@valueType=str\n@slotType=word\n@maxSlot=3\n\nsentence\nsentence\nphrase\n",
        );
        let file = FeatureFile::read(&path).unwrap();
        let (slot_type, max_slot, names, codes) = compile_otype(&file).unwrap();
        assert_eq!(slot_type, "word");
        assert_eq!(max_slot, 3);
        assert_eq!(names, vec!["sentence", "phrase"]);
        assert_eq!(codes, vec![0, 0, 1]);
    }

    #[test]
    fn test_compile_otype_rejects_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "otype.tf",
            "@node\n@valueType=str\n@slotType=word\n@maxSlot=3\n\nsentence\n9\tphrase\n",
        );
        let file = FeatureFile::read(&path).unwrap();
        assert!(compile_otype(&file).is_err());
    }

    #[test]
    fn test_compile_oslots_checks_monotonicity_and_range() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(&dir, "a.tf", "@edge\n@valueType=str\n\n1-2\n2,3\n");
        let file = FeatureFile::read(&good).unwrap();
        let csr = compile_oslots(&file, 3, 5).unwrap();
        assert_eq!(csr.row(0), &[1, 2]);
        assert_eq!(csr.row(1), &[2, 3]);

        let unsorted = write_file(&dir, "b.tf", "@edge\n@valueType=str\n\n2,1\n3\n");
        let file = FeatureFile::read(&unsorted).unwrap();
        assert!(compile_oslots(&file, 3, 5).is_err());

        let out_of_range = write_file(&dir, "c.tf", "@edge\n@valueType=str\n\n1-2\n2,9\n");
        let file = FeatureFile::read(&out_of_range).unwrap();
        assert!(compile_oslots(&file, 3, 5).is_err());
    }
}
