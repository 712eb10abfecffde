//! Manifest Validation
//!
//! Checks run in a fixed order and stop at the first failure:
//! presence, version range, `files` shape, `domNodes` shape.

use serde_json::Value;

use crate::error::ManifestError;
use crate::range::SupportedRange;
use crate::types::Manifest;

/// Validate a parsed manifest payload against a version range expression.
///
/// `None` stands for "nothing came back". A range that fails to parse
/// accepts no version.
pub fn validate_manifest(
    payload: Option<&Value>,
    supported_version: &str,
) -> Result<Manifest, ManifestError> {
    let payload = match payload {
        Some(value) if is_truthy(value) => value,
        _ => return Err(ManifestError::Missing),
    };

    let found = payload
        .get("manifestVersion")
        .and_then(Value::as_str)
        .map(str::to_string);

    let compatible = match (&found, SupportedRange::parse(supported_version)) {
        (Some(version), Ok(range)) => range.satisfies(version),
        _ => false,
    };
    if !compatible {
        return Err(ManifestError::VersionIncompatible {
            found,
            required: supported_version.to_string(),
        });
    }

    let files = match payload.get("files") {
        Some(Value::Object(files)) => files.clone(),
        _ => return Err(ManifestError::FilesNotObject),
    };

    let dom_nodes = match payload.get("domNodes") {
        Some(Value::Array(nodes)) => nodes.clone(),
        _ => return Err(ManifestError::DomNodesNotArray),
    };

    Ok(Manifest {
        // checked above
        manifest_version: found.unwrap_or_default(),
        files,
        dom_nodes,
    })
}

/// JSON values that count as "no manifest": null, false, 0, and "".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
