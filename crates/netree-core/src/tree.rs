//! Rooted device tree with mutation and query operations
//!
//! The tree owns every [`DeviceNode`] in an id-indexed map. Parent links are
//! stored on each node (`parent_id`) and child links on the parent
//! (`children`); every mutation keeps the two sides consistent, keeps a single
//! root, and refuses any change that would introduce a cycle.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::device::{DeviceId, DeviceKind, DeviceNode, DeviceRecord, DeviceStatus, DeviceView};
use crate::error::TreeError;

/// Field changes for [`Tree::update_node`]
///
/// `None` leaves a field unchanged; `parent_id` moves the device under another
/// existing device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub kind: Option<DeviceKind>,
    pub name: Option<String>,
    pub parent_id: Option<DeviceId>,
    pub status: Option<DeviceStatus>,
}

/// Device topology as a single rooted tree
#[derive(Debug, Clone, Default)]
pub struct Tree {
    /// All nodes indexed by device ID
    nodes: HashMap<DeviceId, DeviceNode>,
    /// Insertion order of `nodes`
    order: Vec<DeviceId>,
    /// Root device ID
    root: Option<DeviceId>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn root_id(&self) -> Option<DeviceId> {
        self.root
    }

    /// Get a node by ID
    pub fn get(&self, id: DeviceId) -> Option<&DeviceNode> {
        self.nodes.get(&id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &DeviceNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.root = None;
    }

    /// Add a device, either as the root or as the last child of its parent
    pub fn add_node(&mut self, record: DeviceRecord) -> Result<(), TreeError> {
        if self.nodes.contains_key(&record.id) {
            return Err(TreeError::DuplicateId(record.id));
        }

        match record.parent_id {
            None => {
                if let Some(root) = self.root {
                    return Err(TreeError::RootExists(root));
                }
                self.root = Some(record.id);
            }
            Some(parent_id) => {
                let parent = self
                    .nodes
                    .get_mut(&parent_id)
                    .ok_or(TreeError::UnknownParent(parent_id))?;
                parent.children.push(record.id);
            }
        }

        debug!(device = %record.id, parent = ?record.parent_id, "Added device");
        self.order.push(record.id);
        self.nodes.insert(record.id, DeviceNode::from_record(record));
        Ok(())
    }

    /// Update a device's fields and optionally move it under a new parent
    ///
    /// All checks run before anything is modified, so a failed update leaves
    /// the tree exactly as it was.
    pub fn update_node(&mut self, id: DeviceId, update: DeviceUpdate) -> Result<(), TreeError> {
        if !self.nodes.contains_key(&id) {
            return Err(TreeError::NotFound(id));
        }

        if let Some(parent_id) = update.parent_id {
            if parent_id == id || self.has_cycle(id, parent_id) {
                return Err(TreeError::Cycle { id, parent: parent_id });
            }
            if !self.nodes.contains_key(&parent_id) {
                return Err(TreeError::UnknownParent(parent_id));
            }

            self.detach(id);
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.push(id);
            }
        }

        let Some(node) = self.nodes.get_mut(&id) else {
            return Err(TreeError::NotFound(id));
        };
        if let Some(parent_id) = update.parent_id {
            node.parent_id = Some(parent_id);
        }
        if let Some(kind) = update.kind {
            node.kind = kind;
        }
        if let Some(name) = update.name.filter(|name| !name.is_empty()) {
            node.name = name;
        }
        if let Some(status) = update.status {
            node.status = status;
        }

        debug!(device = %id, "Updated device");
        Ok(())
    }

    /// Delete a device and its whole subtree, returning how many were removed
    pub fn delete_node(&mut self, id: DeviceId) -> Result<usize, TreeError> {
        if !self.nodes.contains_key(&id) {
            return Err(TreeError::NotFound(id));
        }

        // Pre-order, so reversing it removes children before their parent
        let subtree = self.subtree_ids(id);
        self.detach(id);

        for victim in subtree.iter().rev() {
            self.nodes.remove(victim);
            if self.root == Some(*victim) {
                self.root = None;
            }
        }
        let removed: HashSet<DeviceId> = subtree.iter().copied().collect();
        self.order.retain(|id| !removed.contains(id));

        debug!(device = %id, removed = removed.len(), "Deleted device subtree");
        Ok(removed.len())
    }

    /// Nested serialization of a single device
    pub fn view(&self, id: DeviceId) -> Option<DeviceView> {
        let node = self.nodes.get(&id)?;
        Some(DeviceView {
            id: node.id,
            kind: node.kind,
            name: node.name.clone(),
            parent_id: node.parent_id,
            status: node.status,
            children: node
                .children
                .iter()
                .filter_map(|child| self.view(*child))
                .collect(),
        })
    }

    /// The whole tree, nested from the root
    pub fn get_tree(&self) -> Option<DeviceView> {
        self.root.and_then(|root| self.view(root))
    }

    /// Every device, each with its nested subtree, in insertion order
    pub fn list(&self) -> Vec<DeviceView> {
        self.order.iter().filter_map(|id| self.view(*id)).collect()
    }

    /// Pre-order traversal from the root
    pub fn dfs(&self) -> Vec<DeviceView> {
        let mut result = Vec::new();
        let mut stack: Vec<DeviceId> = self.root.into_iter().collect();

        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            result.extend(self.view(id));
            stack.extend(node.children.iter().rev().copied());
        }

        result
    }

    /// Level-order traversal from the root
    pub fn bfs(&self) -> Vec<DeviceView> {
        let mut result = Vec::new();
        let mut queue: VecDeque<DeviceId> = self.root.into_iter().collect();

        while let Some(id) = queue.pop_front() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            result.extend(self.view(id));
            queue.extend(node.children.iter().copied());
        }

        result
    }

    /// Devices whose id equals `query` or whose name contains it, ignoring case
    pub fn search(&self, query: &str) -> Vec<DeviceView> {
        self.nodes()
            .filter(|node| node.matches(query))
            .filter_map(|node| self.view(node.id))
            .collect()
    }

    /// Flat records in insertion order, as written to disk
    pub fn records(&self) -> Vec<DeviceRecord> {
        self.nodes().map(DeviceNode::to_record).collect()
    }

    /// Walk the ancestor chain of `new_parent` looking for `id`
    fn has_cycle(&self, id: DeviceId, new_parent: DeviceId) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(new_parent);

        while let Some(current_id) = current {
            if current_id == id || !visited.insert(current_id) {
                return true;
            }
            current = self.nodes.get(&current_id).and_then(|node| node.parent_id);
        }

        false
    }

    /// Remove `id` from its parent's children list
    fn detach(&mut self, id: DeviceId) {
        let parent_id = self.nodes.get(&id).and_then(|node| node.parent_id);
        if let Some(parent) = parent_id.and_then(|pid| self.nodes.get_mut(&pid)) {
            parent.children.retain(|child| *child != id);
        }
    }

    fn subtree_ids(&self, id: DeviceId) -> Vec<DeviceId> {
        let mut ids = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                ids.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }

        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, kind: DeviceKind, name: &str, parent: Option<i64>) -> DeviceRecord {
        DeviceRecord {
            id: DeviceId(id),
            kind,
            name: name.to_string(),
            parent_id: parent.map(DeviceId),
            status: DeviceStatus::Active,
        }
    }

    fn ids(views: &[DeviceView]) -> Vec<i64> {
        views.iter().map(|v| v.id.0).collect()
    }

    /// 1 ─┬─ 2 ─┬─ 4
    ///    │     └─ 5
    ///    └─ 3 ─── 6
    fn sample_tree() -> Tree {
        let mut tree = Tree::new();
        tree.add_node(record(1, DeviceKind::Router, "Core Router", None)).unwrap();
        tree.add_node(record(2, DeviceKind::Switch, "Edge Switch", Some(1))).unwrap();
        tree.add_node(record(3, DeviceKind::Hub, "Lab Hub", Some(1))).unwrap();
        tree.add_node(record(4, DeviceKind::Computer, "Workstation", Some(2))).unwrap();
        tree.add_node(record(5, DeviceKind::Computer, "Printer", Some(2))).unwrap();
        tree.add_node(record(6, DeviceKind::Computer, "Backup Router", Some(3))).unwrap();
        tree
    }

    /// Every non-root node is reachable from the root and links agree both ways
    fn assert_consistent(tree: &Tree) {
        let reachable = tree.dfs();
        assert_eq!(reachable.len(), tree.len());
        for node in tree.nodes() {
            match node.parent_id {
                None => assert_eq!(tree.root_id(), Some(node.id)),
                Some(pid) => {
                    let parent = tree.get(pid).unwrap();
                    assert_eq!(parent.children.iter().filter(|c| **c == node.id).count(), 1);
                }
            }
            for child in &node.children {
                assert_eq!(tree.get(*child).unwrap().parent_id, Some(node.id));
            }
        }
    }

    #[test]
    fn test_add_root_and_children() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.root_id(), Some(DeviceId(1)));
        assert_eq!(tree.get(DeviceId(1)).unwrap().children, vec![DeviceId(2), DeviceId(3)]);
        assert_consistent(&tree);
    }

    #[test]
    fn test_add_duplicate_id() {
        let mut tree = sample_tree();
        let err = tree
            .add_node(record(2, DeviceKind::Hub, "Other", Some(1)))
            .unwrap_err();
        assert_eq!(err, TreeError::DuplicateId(DeviceId(2)));
        assert_eq!(tree.get(DeviceId(2)).unwrap().name, "Edge Switch");
    }

    #[test]
    fn test_add_second_root() {
        let mut tree = sample_tree();
        let err = tree
            .add_node(record(9, DeviceKind::Router, "Rogue", None))
            .unwrap_err();
        assert_eq!(err, TreeError::RootExists(DeviceId(1)));
        assert!(!tree.contains(DeviceId(9)));
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_add_unknown_parent_leaves_nodes_unchanged() {
        let mut tree = sample_tree();
        let before = tree.records();
        let err = tree
            .add_node(record(9, DeviceKind::Computer, "Orphan", Some(42)))
            .unwrap_err();
        assert_eq!(err, TreeError::UnknownParent(DeviceId(42)));
        assert_eq!(tree.records(), before);
    }

    #[test]
    fn test_update_fields() {
        let mut tree = sample_tree();
        tree.update_node(
            DeviceId(4),
            DeviceUpdate {
                kind: Some(DeviceKind::Router),
                name: Some("Renamed".to_string()),
                status: Some(DeviceStatus::Inactive),
                parent_id: None,
            },
        )
        .unwrap();

        let node = tree.get(DeviceId(4)).unwrap();
        assert_eq!(node.kind, DeviceKind::Router);
        assert_eq!(node.name, "Renamed");
        assert_eq!(node.status, DeviceStatus::Inactive);
        assert_eq!(node.parent_id, Some(DeviceId(2)));
    }

    #[test]
    fn test_update_empty_name_keeps_value() {
        let mut tree = sample_tree();
        tree.update_node(
            DeviceId(3),
            DeviceUpdate {
                name: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(tree.get(DeviceId(3)).unwrap().name, "Lab Hub");
    }

    #[test]
    fn test_update_unknown_device() {
        let mut tree = sample_tree();
        let err = tree.update_node(DeviceId(99), DeviceUpdate::default()).unwrap_err();
        assert_eq!(err, TreeError::NotFound(DeviceId(99)));
    }

    #[test]
    fn test_reparent_moves_subtree() {
        let mut tree = sample_tree();
        tree.update_node(
            DeviceId(2),
            DeviceUpdate {
                parent_id: Some(DeviceId(3)),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(tree.get(DeviceId(1)).unwrap().children, vec![DeviceId(3)]);
        assert_eq!(tree.get(DeviceId(3)).unwrap().children, vec![DeviceId(6), DeviceId(2)]);
        assert_eq!(tree.get(DeviceId(2)).unwrap().parent_id, Some(DeviceId(3)));
        assert_eq!(ids(&tree.dfs()), vec![1, 3, 6, 2, 4, 5]);
        assert_consistent(&tree);
    }

    #[test]
    fn test_reparent_to_same_parent_appends() {
        let mut tree = sample_tree();
        tree.update_node(
            DeviceId(2),
            DeviceUpdate {
                parent_id: Some(DeviceId(1)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(tree.get(DeviceId(1)).unwrap().children, vec![DeviceId(3), DeviceId(2)]);
        assert_consistent(&tree);
    }

    #[test]
    fn test_reparent_to_self_rejected() {
        let mut tree = sample_tree();
        let err = tree
            .update_node(
                DeviceId(2),
                DeviceUpdate {
                    parent_id: Some(DeviceId(2)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, TreeError::Cycle { .. }));
    }

    #[test]
    fn test_reparent_to_descendant_leaves_topology_unchanged() {
        let mut tree = sample_tree();
        let before = tree.dfs();
        let err = tree
            .update_node(
                DeviceId(1),
                DeviceUpdate {
                    name: Some("Should Not Apply".to_string()),
                    parent_id: Some(DeviceId(5)),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert_eq!(err, TreeError::Cycle { id: DeviceId(1), parent: DeviceId(5) });
        assert_eq!(tree.dfs(), before);
        assert_eq!(tree.get(DeviceId(1)).unwrap().name, "Core Router");
    }

    #[test]
    fn test_reparent_to_unknown_parent_is_clean() {
        let mut tree = sample_tree();
        let before = tree.dfs();
        let err = tree
            .update_node(
                DeviceId(4),
                DeviceUpdate {
                    parent_id: Some(DeviceId(77)),
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert_eq!(err, TreeError::UnknownParent(DeviceId(77)));
        assert_eq!(tree.dfs(), before);
        assert_consistent(&tree);
    }

    #[test]
    fn test_update_without_parent_keeps_position() {
        let mut tree = sample_tree();
        tree.update_node(
            DeviceId(4),
            DeviceUpdate {
                name: Some("Laptop".to_string()),
                parent_id: None,
                ..Default::default()
            },
        )
        .unwrap();

        let node = tree.get(DeviceId(4)).unwrap();
        assert_eq!(node.name, "Laptop");
        assert_eq!(node.parent_id, Some(DeviceId(2)));
        assert_eq!(tree.get(DeviceId(2)).unwrap().children, vec![DeviceId(4), DeviceId(5)]);
        assert_eq!(tree.root_id(), Some(DeviceId(1)));
        assert_consistent(&tree);
    }

    #[test]
    fn test_delete_subtree() {
        let mut tree = sample_tree();
        assert_eq!(tree.delete_node(DeviceId(2)).unwrap(), 3);
        assert_eq!(tree.len(), 3);
        assert!(!tree.contains(DeviceId(4)));
        assert!(!tree.contains(DeviceId(5)));
        assert_eq!(tree.get(DeviceId(1)).unwrap().children, vec![DeviceId(3)]);
        assert_consistent(&tree);
    }

    #[test]
    fn test_delete_root_empties_tree() {
        let mut tree = sample_tree();
        assert_eq!(tree.delete_node(DeviceId(1)).unwrap(), 6);
        assert!(tree.is_empty());
        assert_eq!(tree.root_id(), None);
        assert!(tree.get_tree().is_none());
        assert!(tree.dfs().is_empty());
        assert!(tree.bfs().is_empty());
    }

    #[test]
    fn test_delete_unknown() {
        let mut tree = sample_tree();
        assert_eq!(tree.delete_node(DeviceId(50)), Err(TreeError::NotFound(DeviceId(50))));
    }

    #[test]
    fn test_dfs_and_bfs_order() {
        let tree = sample_tree();
        assert_eq!(ids(&tree.dfs()), vec![1, 2, 4, 5, 3, 6]);
        assert_eq!(ids(&tree.bfs()), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_traversal_entries_carry_nested_children() {
        let tree = sample_tree();
        let dfs = tree.dfs();
        assert_eq!(dfs[0].count(), 6);
        assert_eq!(dfs[1].id, DeviceId(2));
        assert_eq!(ids(&dfs[1].children), vec![4, 5]);
    }

    #[test]
    fn test_dfs_reinsert_is_stable() {
        let tree = sample_tree();
        let first = tree.dfs();

        let mut rebuilt = Tree::new();
        for view in &first {
            rebuilt
                .add_node(DeviceRecord {
                    id: view.id,
                    kind: view.kind,
                    name: view.name.clone(),
                    parent_id: view.parent_id,
                    status: view.status,
                })
                .unwrap();
        }

        assert_eq!(rebuilt.dfs(), first);
    }

    #[test]
    fn test_search_by_id_and_name() {
        let mut tree = sample_tree();
        assert_eq!(ids(&tree.search("3")), vec![3]);
        assert_eq!(ids(&tree.search("ro")), vec![1, 6]);
        assert_eq!(ids(&tree.search("ROUTER")), vec![1, 6]);
        assert!(tree.search("nothing").is_empty());

        // Matches by both id and name only once
        tree.add_node(record(7, DeviceKind::Hub, "Hub 7", Some(3))).unwrap();
        assert_eq!(ids(&tree.search("7")), vec![7]);
    }

    #[test]
    fn test_search_follows_insertion_order() {
        let mut tree = Tree::new();
        tree.add_node(record(10, DeviceKind::Router, "net-a", None)).unwrap();
        tree.add_node(record(2, DeviceKind::Switch, "net-b", Some(10))).unwrap();
        tree.add_node(record(5, DeviceKind::Switch, "net-c", Some(10))).unwrap();
        assert_eq!(ids(&tree.search("net")), vec![10, 2, 5]);
    }

    #[test]
    fn test_get_tree_nested() {
        let tree = sample_tree();
        let root = tree.get_tree().unwrap();
        assert_eq!(root.id, DeviceId(1));
        assert_eq!(ids(&root.children), vec![2, 3]);
        assert_eq!(ids(&root.children[1].children), vec![6]);
    }

    #[test]
    fn test_scenario_core_edge() {
        let mut tree = Tree::new();
        tree.add_node(record(1, DeviceKind::Router, "Core", None)).unwrap();
        assert_eq!(tree.root_id(), Some(DeviceId(1)));
        tree.add_node(record(2, DeviceKind::Switch, "Edge", Some(1))).unwrap();
        assert_eq!(tree.len(), 2);

        tree.update_node(
            DeviceId(2),
            DeviceUpdate {
                parent_id: Some(DeviceId(1)),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(tree
            .update_node(
                DeviceId(1),
                DeviceUpdate {
                    parent_id: Some(DeviceId(2)),
                    ..Default::default()
                },
            )
            .is_err());

        tree.delete_node(DeviceId(1)).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.root_id(), None);
    }
}
