//! Error types for tree operations, validation, and persistence

use thiserror::Error;

use crate::device::DeviceId;

/// Structural failures of tree operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("device {0} already exists")]
    DuplicateId(DeviceId),
    #[error("device {0} not found")]
    NotFound(DeviceId),
    #[error("parent device {0} not found")]
    UnknownParent(DeviceId),
    #[error("a root device already exists ({0})")]
    RootExists(DeviceId),
    #[error("moving device {id} under {parent} would create a cycle")]
    Cycle { id: DeviceId, parent: DeviceId },
}

/// Failures of the create-time shape check
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid device type: {0}")]
    InvalidType(String),
    #[error("invalid device status: {0}")]
    InvalidStatus(String),
    #[error("malformed device record: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
