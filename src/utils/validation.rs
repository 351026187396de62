//! Validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::traits::CollectionValidator;
use crate::types::*;

static GSTIN_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z0-9]{10}[0-9A-Z]{1}[A-Z0-9]{1}[0-9A-Z]{1}$")
        .expect("GSTIN pattern is a valid regex")
});

/// Structural check on a collection: it must be an array of objects
pub fn validate_collection(collection: &str, value: &Value) -> ReconResult<()> {
    let items = value.as_array().ok_or_else(|| ReconError::InvalidCollection {
        collection: collection.to_string(),
        reason: format!("expected an array of rows, found {}", json_kind(value)),
    })?;

    if let Some((position, item)) = items.iter().enumerate().find(|(_, item)| !item.is_object()) {
        return Err(ReconError::InvalidCollection {
            collection: collection.to_string(),
            reason: format!("row {} is {}, expected an object", position, json_kind(item)),
        });
    }

    Ok(())
}

/// Whether a GSTIN has the 15-character registration shape
pub fn is_well_formed_gstin(gstin: &str) -> bool {
    GSTIN_FORMAT.is_match(gstin.trim())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Default collection validator: arrays of objects only
pub struct DefaultCollectionValidator;

impl CollectionValidator for DefaultCollectionValidator {
    fn validate(&self, collection: &str, value: &Value) -> ReconResult<()> {
        validate_collection(collection, value)
    }
}

/// Rejects collections whose rows carry no invoice identity at all.
///
/// Useful when the upstream edit layer is known to emit full rows and an
/// empty object indicates a serialization bug rather than a blank line.
pub struct NonEmptyRowValidator;

impl CollectionValidator for NonEmptyRowValidator {
    fn validate(&self, collection: &str, value: &Value) -> ReconResult<()> {
        validate_collection(collection, value)?;

        let empty = value
            .as_array()
            .map(|rows| rows.iter().position(|row| row.as_object().is_some_and(|o| o.is_empty())))
            .unwrap_or(None);
        if let Some(position) = empty {
            return Err(ReconError::InvalidCollection {
                collection: collection.to_string(),
                reason: format!("row {} has no fields", position),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_must_be_array() {
        let err = validate_collection("processed", &json!({"a": 1})).unwrap_err();
        assert!(err.to_string().contains("processed"));
        assert!(validate_collection("processed", &json!([])).is_ok());
    }

    #[test]
    fn test_collection_rows_must_be_objects() {
        assert!(validate_collection("rcm", &json!([{"GSTIN": "x"}, 5])).is_err());
    }

    #[test]
    fn test_non_empty_row_validator() {
        let validator = NonEmptyRowValidator;
        assert!(validator.validate("mismatched", &json!([{}])).is_err());
        assert!(validator.validate("mismatched", &json!([{"GSTIN": "x"}])).is_ok());
    }

    #[test]
    fn test_gstin_shape() {
        assert!(is_well_formed_gstin("29ABCDE1234F1Z5"));
        assert!(!is_well_formed_gstin("29ABCDE1234F1Z"));
        assert!(!is_well_formed_gstin(""));
    }
}
