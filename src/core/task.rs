// strings-scanner - core/task.rs
//
// Task routing filter and payload validation.
// Turns an untyped task payload into a `StringBatch` or a precise
// `MalformedTaskError`; never performs I/O.

use crate::core::model::{StringBatch, Task};
use crate::util::constants;
use crate::util::error::MalformedTaskError;
use serde_json::Value;
use std::collections::BTreeMap;

// =============================================================================
// Routing filter
// =============================================================================

/// Header values a task must carry for this worker to handle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    required: Vec<(String, String)>,
}

impl TaskFilter {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            required: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// True when every required header is present with an equal value.
    /// Extra headers are ignored.
    pub fn matches(&self, headers: &BTreeMap<String, String>) -> bool {
        self.required
            .iter()
            .all(|(key, value)| headers.get(key) == Some(value))
    }
}

impl Default for TaskFilter {
    /// `type=feature, stage=raw, kind=strings`.
    fn default() -> Self {
        Self::new(constants::TASK_FILTER.iter().copied())
    }
}

// =============================================================================
// Payload validation
// =============================================================================

impl StringBatch {
    /// Validate a task payload of the shape `{"sha256": "<hex>", "data": [..]}`.
    ///
    /// A JSON `null` counts as absent. An empty `data` array is valid. The
    /// sample id becomes a URL path segment, so it must be non-empty ASCII hex.
    pub fn from_payload(payload: &Value) -> Result<Self, MalformedTaskError> {
        let sample_id = match payload.get(constants::PAYLOAD_SHA256_FIELD) {
            None | Some(Value::Null) => {
                return Err(MalformedTaskError::MissingField {
                    field: constants::PAYLOAD_SHA256_FIELD,
                })
            }
            Some(Value::String(s)) if is_hex_digest(s) => s.clone(),
            Some(Value::String(s)) => {
                return Err(MalformedTaskError::InvalidSampleId { value: s.clone() })
            }
            Some(_) => {
                return Err(MalformedTaskError::WrongType {
                    field: constants::PAYLOAD_SHA256_FIELD,
                    expected: "a string",
                })
            }
        };

        let items = match payload.get(constants::PAYLOAD_DATA_FIELD) {
            None | Some(Value::Null) => {
                return Err(MalformedTaskError::MissingField {
                    field: constants::PAYLOAD_DATA_FIELD,
                })
            }
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(MalformedTaskError::WrongType {
                    field: constants::PAYLOAD_DATA_FIELD,
                    expected: "an array of strings",
                })
            }
        };

        let strings = items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(MalformedTaskError::NonStringElement { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { sample_id, strings })
    }
}

fn is_hex_digest(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

impl Task {
    /// Convenience constructor for a strings task with the default routing headers.
    pub fn strings(sample_id: &str, data: &[&str]) -> Self {
        let headers = constants::TASK_FILTER
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            headers,
            payload: serde_json::json!({
                "sha256": sample_id,
                "data": data,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_payload() {
        let batch =
            StringBatch::from_payload(&json!({"sha256": "abc123", "data": ["a", "b"]})).unwrap();
        assert_eq!(batch.sample_id, "abc123");
        assert_eq!(batch.strings, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_data_is_valid() {
        let batch = StringBatch::from_payload(&json!({"sha256": "abc123", "data": []})).unwrap();
        assert!(batch.strings.is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let err = StringBatch::from_payload(&json!({"data": ["a"]})).unwrap_err();
        assert!(matches!(
            err,
            MalformedTaskError::MissingField { field: "sha256" }
        ));

        let err = StringBatch::from_payload(&json!({"sha256": "abc123"})).unwrap_err();
        assert!(matches!(err, MalformedTaskError::MissingField { field: "data" }));

        let err = StringBatch::from_payload(&json!({"sha256": null, "data": []})).unwrap_err();
        assert!(matches!(
            err,
            MalformedTaskError::MissingField { field: "sha256" }
        ));

        let err = StringBatch::from_payload(&Value::Null).unwrap_err();
        assert!(matches!(err, MalformedTaskError::MissingField { .. }));
    }

    #[test]
    fn test_wrong_types() {
        let err = StringBatch::from_payload(&json!({"sha256": 42, "data": []})).unwrap_err();
        assert!(matches!(
            err,
            MalformedTaskError::WrongType { field: "sha256", .. }
        ));

        let err = StringBatch::from_payload(&json!({"sha256": "ab", "data": "a"})).unwrap_err();
        assert!(matches!(err, MalformedTaskError::WrongType { field: "data", .. }));

        let err =
            StringBatch::from_payload(&json!({"sha256": "ab", "data": ["a", 1]})).unwrap_err();
        assert!(matches!(err, MalformedTaskError::NonStringElement { index: 1 }));
    }

    #[test]
    fn test_sample_id_must_be_hex() {
        for bad in ["", "x?admin=1#", "../etc", "ab cd", "abc/123"] {
            let err = StringBatch::from_payload(&json!({"sha256": bad, "data": []})).unwrap_err();
            match err {
                MalformedTaskError::InvalidSampleId { value } => assert_eq!(value, bad),
                other => panic!("Expected InvalidSampleId for {bad:?}, got: {other:?}"),
            }
        }

        let digest = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";
        let batch = StringBatch::from_payload(&json!({"sha256": digest, "data": []})).unwrap();
        assert_eq!(batch.sample_id, digest);
    }

    #[test]
    fn test_default_filter() {
        let task = Task::strings("abc123", &["x"]);
        assert!(TaskFilter::default().matches(&task.headers));

        let mut headers = task.headers.clone();
        headers.insert("origin".to_string(), "extractor".to_string());
        assert!(TaskFilter::default().matches(&headers));

        headers.insert("kind".to_string(), "imports".to_string());
        assert!(!TaskFilter::default().matches(&headers));

        assert!(!TaskFilter::default().matches(&BTreeMap::new()));
    }
}
