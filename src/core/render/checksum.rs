//! Checksum calculation for rendered reports
//!
//! Rendering the same raw results twice must produce byte-identical output;
//! the checksum makes that property observable and is recorded on audit
//! entries alongside mutating operations.

use crate::domain::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Calculate SHA-256 checksum of JSON data
///
/// Uses canonical JSON serialization to ensure consistent checksums
/// regardless of key ordering or whitespace differences.
///
/// # Examples
///
/// ```
/// use assay::core::render::checksum::calculate_checksum;
/// use serde_json::json;
///
/// let data = json!({"hemoglobin": 13.2});
/// let checksum = calculate_checksum(&data).unwrap();
/// assert_eq!(checksum.len(), 64); // SHA-256 produces 64 hex characters
/// ```
pub fn calculate_checksum(data: &Value) -> Result<String> {
    // Normalize the JSON to ensure consistent key ordering
    let normalized = normalize_json(data);

    let data_str = serde_json::to_string(&normalized)
        .map_err(|e| crate::domain::AssayError::Serialization(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(data_str.as_bytes());
    let result = hasher.finalize();

    Ok(format!("{result:x}"))
}

/// Normalize JSON value to ensure consistent key ordering
///
/// This recursively sorts all object keys to ensure that semantically
/// identical JSON produces the same checksum.
fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: std::collections::BTreeMap<String, Value> =
                std::collections::BTreeMap::new();
            for (k, v) in map {
                sorted.insert(k.clone(), normalize_json(v));
            }
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(normalize_json).collect()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_calculate_checksum_deterministic() {
        let data = json!({
            "hemoglobin": 6.5,
            "wbc_count": 8.2
        });

        let checksum1 = calculate_checksum(&data).unwrap();
        let checksum2 = calculate_checksum(&data).unwrap();

        assert_eq!(checksum1, checksum2);
        assert_eq!(checksum1.len(), 64);
    }

    #[test]
    fn test_calculate_checksum_different_content() {
        let data1 = json!({"hemoglobin": 6.5});
        let data2 = json!({"hemoglobin": 13.0});

        assert_ne!(
            calculate_checksum(&data1).unwrap(),
            calculate_checksum(&data2).unwrap()
        );
    }

    #[test]
    fn test_checksum_ignores_key_order() {
        let data1 = json!({"a": 1, "b": 2});
        let data2 = json!({"b": 2, "a": 1});

        assert_eq!(
            calculate_checksum(&data1).unwrap(),
            calculate_checksum(&data2).unwrap()
        );
    }
}
