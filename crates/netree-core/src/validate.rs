//! Shape check for device records before they enter the tree

use serde_json::Value;

use crate::device::{DeviceKind, DeviceRecord, DeviceStatus};
use crate::error::ValidationError;

const REQUIRED_FIELDS: [&str; 4] = ["id", "type", "name", "status"];

/// Check that a raw record has every required field and in-range enums
pub fn validate_device(record: &Value) -> Result<(), ValidationError> {
    let Some(fields) = record.as_object() else {
        return Err(ValidationError::Malformed("expected a JSON object".to_string()));
    };

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|field| !fields.contains_key(**field)) {
        return Err(ValidationError::MissingField(*missing));
    }

    let kind = fields["type"].as_str().unwrap_or_default();
    if !DeviceKind::ALL.iter().any(|k| k.as_str() == kind) {
        return Err(ValidationError::InvalidType(fields["type"].to_string()));
    }

    let status = fields["status"].as_str().unwrap_or_default();
    if status.parse::<DeviceStatus>().is_err() {
        return Err(ValidationError::InvalidStatus(fields["status"].to_string()));
    }

    Ok(())
}

pub fn is_valid_device(record: &Value) -> bool {
    validate_device(record).is_ok()
}

/// Validate, then convert into a typed record
pub fn parse_device(record: Value) -> Result<DeviceRecord, ValidationError> {
    validate_device(&record)?;
    serde_json::from_value(record).map_err(|e| ValidationError::Malformed(e.to_string()))
}
