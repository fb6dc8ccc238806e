//! Tree walker: validates a candidate subtree and stages its registrations.

use crate::error::ObservationError;
use crate::gate::{admit, Admission};
use crate::path::Path;
use crate::registry::Pending;
use crate::value::{NodeKey, Value};
use std::collections::{HashMap, HashSet};

/// Walks `value` depth-first in pre-order, as if it were placed at `base`.
///
/// Returns one [`Pending`] registration per reachable container, nothing
/// for a primitive. Fails on the first disallowed shape, on a node already
/// owned by some tree, on a node reached twice, and on a cycle.
pub(crate) fn plan(value: &Value, base: &Path) -> Result<Vec<Pending>, ObservationError> {
    let mut walker = Walker::default();
    walker.visit(value, base)?;
    Ok(walker.pending)
}

#[derive(Default)]
struct Walker {
    pending: Vec<Pending>,
    // Staged node -> index into `pending`.
    seen: HashMap<NodeKey, usize>,
    // Nodes on the current DFS stack.
    open: HashSet<NodeKey>,
}

impl Walker {
    fn visit(&mut self, value: &Value, path: &Path) -> Result<(), ObservationError> {
        if admit(value, path)? == Admission::Primitive {
            return Ok(());
        }
        let Value::Node(node) = value else {
            return Ok(());
        };
        let key = node.key();
        if self.open.contains(&key) {
            let path = self
                .seen
                .get(&key)
                .map(|&idx| self.pending[idx].path.clone())
                .unwrap_or_else(|| path.clone());
            return Err(ObservationError::Cycle { path });
        }
        if node.owner().is_some() || self.seen.contains_key(&key) {
            return Err(ObservationError::DoubleObserving { path: path.clone() });
        }

        self.seen.insert(key, self.pending.len());
        self.pending.push(Pending {
            node: node.clone(),
            path: path.clone(),
        });
        self.open.insert(key);
        for (step, child) in node.entries() {
            self.visit(&child, &path.child(step))?;
        }
        self.open.remove(&key);
        Ok(())
    }
}
