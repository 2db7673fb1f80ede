//! Device types for the topology inventory

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Unique identifier for a device in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of network device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Router,
    Hub,
    Switch,
    Computer,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 4] = [Self::Router, Self::Hub, Self::Switch, Self::Computer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Hub => "hub",
            Self::Switch => "switch",
            Self::Computer => "computer",
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidType(s.to_string()))
    }
}

/// Administrative status of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Inactive,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Flat device record, as accepted on create and stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: DeviceId,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<DeviceId>,
    pub status: DeviceStatus,
}

/// A device stored in the tree
///
/// Children are held by id; the owning [`crate::Tree`] resolves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    pub id: DeviceId,
    pub kind: DeviceKind,
    pub name: String,
    /// Parent device (None for the root)
    pub parent_id: Option<DeviceId>,
    pub status: DeviceStatus,
    /// Children in append order
    pub children: Vec<DeviceId>,
}

impl DeviceNode {
    pub fn from_record(record: DeviceRecord) -> Self {
        Self {
            id: record.id,
            kind: record.kind,
            name: record.name,
            parent_id: record.parent_id,
            status: record.status,
            children: Vec::new(),
        }
    }

    pub fn to_record(&self) -> DeviceRecord {
        DeviceRecord {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            parent_id: self.parent_id,
            status: self.status,
        }
    }

    /// Whether the node matches a search query by exact id or by name substring
    pub fn matches(&self, query: &str) -> bool {
        self.id.to_string() == query || self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Nested serialization of a device and its whole subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceView {
    pub id: DeviceId,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub name: String,
    pub parent_id: Option<DeviceId>,
    pub status: DeviceStatus,
    pub children: Vec<DeviceView>,
}

impl DeviceView {
    /// Number of devices in this view, including itself
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(DeviceView::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(id: i64, name: &str) -> DeviceNode {
        DeviceNode::from_record(DeviceRecord {
            id: DeviceId(id),
            kind: DeviceKind::Router,
            name: name.to_string(),
            parent_id: None,
            status: DeviceStatus::Active,
        })
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("switch".parse::<DeviceKind>().unwrap(), DeviceKind::Switch);
        assert!("Switch".parse::<DeviceKind>().is_err());
        assert_eq!(
            "firewall".parse::<DeviceKind>(),
            Err(ValidationError::InvalidType("firewall".to_string()))
        );
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("inactive".parse::<DeviceStatus>().unwrap(), DeviceStatus::Inactive);
        assert_eq!(
            "down".parse::<DeviceStatus>(),
            Err(ValidationError::InvalidStatus("down".to_string()))
        );
    }

    #[test]
    fn test_record_wire_format() {
        let json = r#"{"id":7,"type":"hub","name":"Lab","parent_id":null,"status":"inactive"}"#;
        let record: DeviceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, DeviceId(7));
        assert_eq!(record.kind, DeviceKind::Hub);
        assert_eq!(record.parent_id, None);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "hub");
        assert_eq!(value["parent_id"], serde_json::Value::Null);
    }

    #[test]
    fn test_matches_id_and_name() {
        let node = router(3, "Core Router");
        assert!(node.matches("3"));
        assert!(node.matches("core"));
        assert!(node.matches("ROUTER"));
        assert!(!node.matches("33"));
        assert!(!node.matches("edge"));
    }
}
