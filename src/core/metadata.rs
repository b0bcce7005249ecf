//! Dataset metadata extraction from DVC descriptor (`.dvc`) files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yml::Value;

use crate::error::{Error, Result};
use crate::utils::io;

pub const DEFAULT_OUTPUT: &str = "dataset_metadata.json";

/// One dataset and the content hash DVC recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub dataset_name: String,
    pub md5: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataOutput {
    pub output: String,
    pub records: Vec<DatasetMetadata>,
}

/// Dataset name for a descriptor: its file name minus the final extension.
///
/// `diabetes.csv.dvc` becomes `diabetes.csv`.
pub fn dataset_name(descriptor: &Path) -> String {
    descriptor
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Read the `outs[0].md5` hash from descriptor content.
pub fn parse_descriptor(content: &str, path: &str) -> Result<String> {
    let doc: Value = serde_yml::from_str(content)
        .map_err(|e| Error::metadata_invalid_descriptor(path, e.to_string()))?;

    let outs = doc
        .get("outs")
        .ok_or_else(|| Error::metadata_missing_key(path, "outs"))?;
    let first = outs
        .as_sequence()
        .ok_or_else(|| Error::metadata_invalid_descriptor(path, "'outs' is not a list"))?
        .first()
        .ok_or_else(|| Error::metadata_missing_key(path, "outs[0]"))?;
    let md5 = first
        .get("md5")
        .ok_or_else(|| Error::metadata_missing_key(path, "outs[0].md5"))?;

    match md5 {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::metadata_invalid_descriptor(
            path,
            "'outs[0].md5' is not a string",
        )),
    }
}

/// Extract one record per descriptor, in input order.
///
/// Any failure aborts the whole batch.
pub fn extract(descriptors: &[PathBuf]) -> Result<Vec<DatasetMetadata>> {
    descriptors
        .iter()
        .map(|path| {
            let display = path.display().to_string();
            let content = io::read_file(path, &format!("read descriptor {}", display))?;
            Ok(DatasetMetadata {
                dataset_name: dataset_name(path),
                md5: parse_descriptor(&content, &display)?,
            })
        })
        .collect()
}

/// Render records as a JSON array indented by four spaces.
pub fn to_json(records: &[DatasetMetadata]) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records
        .serialize(&mut ser)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize metadata".to_string())))?;
    String::from_utf8(buf)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize metadata".to_string())))
}

/// Extract metadata and write it to `output`.
///
/// Nothing is written unless every descriptor was read successfully.
pub fn extract_to_file(descriptors: &[PathBuf], output: &Path) -> Result<MetadataOutput> {
    let records = extract(descriptors)?;
    let json = to_json(&records)?;
    io::write_file_atomic(output, &json, &format!("write {}", output.display()))?;
    log_status!("metadata", "Metadata successfully saved to {}", output.display());

    Ok(MetadataOutput {
        output: output.display().to_string(),
        records,
    })
}

/// All `*.dvc` files directly inside `dir`, sorted by name.
pub fn discover_descriptors(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*.dvc");
    let pattern = pattern.to_string_lossy();
    let mut found: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| {
            Error::validation_invalid_argument(
                "descriptor_files",
                format!("Invalid glob pattern '{}': {}", pattern, e),
                None,
                None,
            )
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    found.sort();
    Ok(found)
}
