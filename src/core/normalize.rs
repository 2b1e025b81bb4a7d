use crate::domain::model::{json_kind, Entry};
use crate::utils::error::{EtlError, Result};
use serde_json::{Deserializer, Value};

/// Parse raw text holding one or more concatenated top-level JSON fragments
/// (one per fetched page) and flatten them into a single entry list. Each
/// fragment is either an array of entries or a bare entry object.
pub fn coalesce_fragments(raw: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut fragments = 0usize;

    for fragment in Deserializer::from_str(raw).into_iter::<Value>() {
        let fragment = fragment?;
        fragments += 1;
        match fragment {
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(fields) => entries.push(Entry::new(fields)),
                        other => {
                            tracing::warn!("skipping non-object entry ({})", json_kind(&other));
                        }
                    }
                }
            }
            Value::Object(fields) => entries.push(Entry::new(fields)),
            other => {
                return Err(EtlError::ProcessingError {
                    message: format!(
                        "unexpected top-level {} fragment in response data",
                        json_kind(&other)
                    ),
                });
            }
        }
    }

    tracing::debug!(
        "coalesced {} fragment(s) into {} entries",
        fragments,
        entries.len()
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_array_fragment() {
        let raw = r#"[{"id": 1}, {"id": 2}]"#;
        let entries = coalesce_fragments(raw).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].fields.get("id").unwrap().as_i64().unwrap(), 1);
    }

    #[test]
    fn test_concatenated_array_fragments() {
        // Two raw pages written back to back, as the fetch step produces.
        let raw = r#"[{"id": 1}, {"id": 2}][{"id": 3}]"#;
        let entries = coalesce_fragments(raw).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].fields.get("id").unwrap().as_i64().unwrap(), 3);
    }

    #[test]
    fn test_fragments_separated_by_whitespace() {
        let raw = "[{\"id\": 1}]\n[{\"id\": 2}]\n";
        let entries = coalesce_fragments(raw).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_bare_object_fragment() {
        let raw = r#"{"id": 7}"#;
        let entries = coalesce_fragments(raw).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_non_object_items_are_skipped() {
        let raw = r#"[{"id": 1}, 42, "stray", {"id": 2}]"#;
        let entries = coalesce_fragments(raw).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_scalar_fragment_is_an_error() {
        assert!(coalesce_fragments("42").is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(coalesce_fragments(r#"[{"id": 1}"#).is_err());
    }

    #[test]
    fn test_empty_input_yields_no_entries() {
        let entries = coalesce_fragments("").unwrap();
        assert!(entries.is_empty());
    }
}
