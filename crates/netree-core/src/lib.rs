//! netree Core - Device tree, validation, and persistence
//!
//! This crate provides the foundational pieces of the netree inventory:
//! - Device types (ids, kinds, statuses, flat records and nested views)
//! - The rooted device tree with add/update/delete, traversal, and search
//! - Create-time validation of raw device records
//! - Flat-file JSON persistence of the whole tree

pub mod device;
pub mod error;
pub mod store;
pub mod tree;
pub mod validate;

pub use device::{DeviceId, DeviceKind, DeviceNode, DeviceRecord, DeviceStatus, DeviceView};
pub use error::{StoreError, TreeError, ValidationError};
pub use store::{DeviceStore, LoadReport};
pub use tree::{DeviceUpdate, Tree};
pub use validate::{is_valid_device, parse_device, validate_device};
