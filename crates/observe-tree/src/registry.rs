//! Path registry: node identity -> path from the observed root.

use crate::path::Path;
use crate::value::{Node, NodeCell, NodeKey, Value};
use std::collections::HashMap;
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of one observed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TreeId(u64);

impl TreeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A registration staged by the walker, committed only after the whole walk
/// succeeded.
#[derive(Debug)]
pub(crate) struct Pending {
    pub node: Node,
    pub path: Path,
}

struct Entry {
    node: Weak<NodeCell>,
    path: Path,
}

/// Registrations of one tree.
///
/// A node is registered iff its owner marker names this tree. The marker
/// lives on the node but is never enumerated.
pub(crate) struct Registry {
    tree: TreeId,
    entries: HashMap<NodeKey, Entry>,
}

impl Registry {
    pub fn new(tree: TreeId) -> Self {
        Self {
            tree,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, node: &Node) -> bool {
        node.owner() == Some(self.tree) && self.entries.contains_key(&node.key())
    }

    pub fn path_of(&self, node: &Node) -> Option<&Path> {
        if node.owner() != Some(self.tree) {
            return None;
        }
        self.entries.get(&node.key()).map(|entry| &entry.path)
    }

    pub fn register(&mut self, pending: Vec<Pending>) {
        for Pending { node, path } in pending {
            node.set_owner(Some(self.tree));
            self.entries.insert(
                node.key(),
                Entry {
                    node: node.downgrade(),
                    path,
                },
            );
        }
    }

    /// Forgets `value` and everything registered below it, so the subtree
    /// can be observed again later. Returns the number of released nodes.
    pub fn release(&mut self, value: &Value) -> usize {
        let Value::Node(node) = value else {
            return 0;
        };
        if !self.contains(node) {
            return 0;
        }
        self.entries.remove(&node.key());
        node.set_owner(None);
        let mut released = 1;
        for (_, child) in node.entries() {
            released += self.release(&child);
        }
        released
    }

    /// Releases every registration.
    pub fn clear(&mut self) {
        for entry in self.entries.values() {
            if let Some(node) = Node::upgrade(&entry.node) {
                if node.owner() == Some(self.tree) {
                    node.set_owner(None);
                }
            }
        }
        self.entries.clear();
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(node: &Node, path: Path) -> Pending {
        Pending {
            node: node.clone(),
            path,
        }
    }

    #[test]
    fn register_and_lookup() {
        let root = Node::object();
        let child = Node::array();
        root.insert("xs", &child);

        let mut registry = Registry::new(TreeId::next());
        registry.register(vec![
            pending(&root, Path::root()),
            pending(&child, Path::from(["xs"])),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.path_of(&child), Some(&Path::from(["xs"])));
        assert_eq!(child.owner(), root.owner());
        assert!(child.owner().is_some());
        assert!(registry.path_of(&Node::object()).is_none());
    }

    #[test]
    fn other_tree_does_not_see_registration() {
        let node = Node::object();
        let mut a = Registry::new(TreeId::next());
        let b = Registry::new(TreeId::next());
        a.register(vec![pending(&node, Path::root())]);
        assert!(a.contains(&node));
        assert!(!b.contains(&node));
    }

    #[test]
    fn release_is_recursive_and_clears_markers() {
        let root = Node::object();
        let mid = Node::object();
        let leaf = Node::array();
        root.insert("mid", &mid);
        mid.insert("leaf", &leaf);

        let mut registry = Registry::new(TreeId::next());
        registry.register(vec![
            pending(&root, Path::root()),
            pending(&mid, Path::from(["mid"])),
            pending(&leaf, Path::from(["mid", "leaf"])),
        ]);

        assert_eq!(registry.release(&Value::from(&mid)), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(mid.owner(), None);
        assert_eq!(leaf.owner(), None);
        assert_eq!(registry.release(&Value::from(&mid)), 0);
        assert_eq!(registry.release(&Value::from("leaf")), 0);
    }

    #[test]
    fn drop_clears_markers() {
        let node = Node::object();
        {
            let mut registry = Registry::new(TreeId::next());
            registry.register(vec![pending(&node, Path::root())]);
            assert!(node.owner().is_some());
        }
        assert_eq!(node.owner(), None);
    }
}
