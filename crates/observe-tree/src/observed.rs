//! Observed trees and the mutation interceptor.

use crate::error::ObservationError;
use crate::path::{Path, PathStep};
use crate::record::ChangeRecord;
use crate::registry::{Registry, TreeId};
use crate::value::{Node, Shape, Value};
use crate::walk;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

type Callback = Box<dyn FnMut(&ChangeRecord)>;

struct Shared {
    registry: RefCell<Registry>,
    callback: RefCell<Callback>,
    mutating: Cell<bool>,
}

impl Shared {
    fn enter(&self) -> Result<MutationGuard<'_>, ObservationError> {
        if self.mutating.replace(true) {
            return Err(ObservationError::Reentrant);
        }
        Ok(MutationGuard(&self.mutating))
    }

    fn notify(&self, record: &ChangeRecord) {
        let mut callback = self.callback.borrow_mut();
        (&mut *callback)(record);
    }
}

// Resets the re-entrancy flag, also when the callback panics.
struct MutationGuard<'a>(&'a Cell<bool>);

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Starts observing `tree`.
///
/// Every container reachable from `tree` is validated and registered with
/// its path before anything is returned. Mutations made through the
/// returned handle (and handles derived from it) are reported to
/// `callback` before they are committed.
///
/// ```
/// use observe_tree::{observe, ChangeRecord, Node, Value};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let seen: Rc<RefCell<Vec<ChangeRecord>>> = Rc::default();
/// let sink = Rc::clone(&seen);
/// let tree = observe(Node::object(), move |record| sink.borrow_mut().push(record.clone()))?;
///
/// tree.set("a", "alpha")?;
/// let records = seen.borrow();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].path.to_string(), "a");
/// assert_eq!(records[0].old_value, None);
/// assert_eq!(records[0].new_value, Some(Value::from("alpha")));
/// # Ok::<(), observe_tree::ObservationError>(())
/// ```
pub fn observe<F>(tree: impl Into<Value>, callback: F) -> Result<ObservedTree, ObservationError>
where
    F: FnMut(&ChangeRecord) + 'static,
{
    let tree = tree.into();
    // Observing a primitive could never report anything.
    let Value::Node(root) = &tree else {
        return Err(ObservationError::PrimitiveRoot);
    };
    let pending = walk::plan(&tree, &Path::root())?;
    let mut registry = Registry::new(TreeId::next());
    registry.register(pending);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        message = "observe.start",
        class = root.class_name(),
        nodes = registry.len()
    );

    let shared = Rc::new(Shared {
        registry: RefCell::new(registry),
        callback: RefCell::new(Box::new(callback)),
        mutating: Cell::new(false),
    });
    Ok(ObservedTree {
        root: Observed {
            shared,
            node: root.clone(),
        },
    })
}

/// The result of [`observe`]. Dereferences to the root [`Observed`] handle.
///
/// Dropping the tree and all handles derived from it releases every node,
/// after which the same data may be observed again.
pub struct ObservedTree {
    root: Observed,
}

impl ObservedTree {
    pub fn root(&self) -> &Observed {
        &self.root
    }

    /// The observed root as a plain value.
    pub fn value(&self) -> Value {
        Value::Node(self.root.node.clone())
    }

    /// Number of nodes currently registered.
    pub fn registered_len(&self) -> usize {
        self.root.shared.registry.borrow().len()
    }

    /// Stops observing and hands the root back. Handles that are still
    /// around report [`ObservationError::Detached`] from then on.
    pub fn into_inner(self) -> Value {
        self.root.shared.registry.borrow_mut().clear();
        Value::Node(self.root.node)
    }
}

impl Deref for ObservedTree {
    type Target = Observed;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}

impl fmt::Debug for ObservedTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedTree")
            .field("root", &self.root.node)
            .field("registered", &self.registered_len())
            .finish()
    }
}

/// Interceptable handle to one node of an observed tree.
///
/// Reads pass straight through to the node. Writes go through [`set`] and
/// [`delete`], which report a [`ChangeRecord`] to the tree's callback.
///
/// [`set`]: Observed::set
/// [`delete`]: Observed::delete
#[derive(Clone)]
pub struct Observed {
    shared: Rc<Shared>,
    node: Node,
}

impl Observed {
    /// The underlying node. Mutating it directly bypasses interception.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Current path of this node from the root.
    pub fn path(&self) -> Result<Path, ObservationError> {
        self.shared
            .registry
            .borrow()
            .path_of(&self.node)
            .cloned()
            .ok_or(ObservationError::Detached)
    }

    pub fn get(&self, key: impl Into<PathStep>) -> Option<Value> {
        self.node.get(key)
    }

    pub fn has(&self, key: impl Into<PathStep>) -> bool {
        self.node.contains_key(key)
    }

    pub fn keys(&self) -> Vec<PathStep> {
        self.node.keys()
    }

    pub fn len(&self) -> usize {
        self.node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    /// Handle to the container stored under `key`, `None` for primitives
    /// and absent keys.
    pub fn child(&self, key: impl Into<PathStep>) -> Option<Observed> {
        match self.node.get(key)? {
            Value::Node(node) => Some(Observed {
                shared: Rc::clone(&self.shared),
                node,
            }),
            _ => None,
        }
    }

    /// Follows `path` through container children.
    pub fn at<I>(&self, path: I) -> Option<Observed>
    where
        I: IntoIterator,
        I::Item: Into<PathStep>,
    {
        let mut cur = self.clone();
        for step in path {
            cur = cur.child(step)?;
        }
        Some(cur)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ObservationError> {
        Value::Node(self.node.clone()).to_json()
    }

    /// Assigns `value` to `key`.
    ///
    /// A container value is validated and registered as a subtree placed at
    /// `path + key`. The callback sees the record before the assignment is
    /// stored, so reads from inside the callback observe the old value.
    pub fn set(
        &self,
        key: impl Into<PathStep>,
        value: impl Into<Value>,
    ) -> Result<(), ObservationError> {
        let result = self.intercept_set(key.into(), value.into());
        #[cfg(feature = "tracing")]
        Self::log_outcome("set", &result);
        result
    }

    /// Deletes `key`. Always reports a record, even when `key` was absent.
    pub fn delete(&self, key: impl Into<PathStep>) -> Result<(), ObservationError> {
        let result = self.intercept_delete(key.into());
        #[cfg(feature = "tracing")]
        Self::log_outcome("delete", &result);
        result
    }

    /// Changing the class of an observed node is never allowed.
    pub fn set_prototype(&self, _shape: Shape) -> Result<(), ObservationError> {
        let result = Err(ObservationError::SetPrototype);
        #[cfg(feature = "tracing")]
        Self::log_outcome("set_prototype", &result);
        result
    }

    /// Defining a property outside of [`Observed::set`] is never allowed.
    pub fn define_property(
        &self,
        _key: impl Into<PathStep>,
        _value: impl Into<Value>,
    ) -> Result<(), ObservationError> {
        let result = Err(ObservationError::DefineProperty);
        #[cfg(feature = "tracing")]
        Self::log_outcome("define_property", &result);
        result
    }

    fn intercept_set(&self, key: PathStep, value: Value) -> Result<(), ObservationError> {
        let _guard = self.shared.enter()?;
        let key = self.node.normalize(key);
        let path = self.path()?.child(key.clone());
        let pending = walk::plan(&value, &path)?;

        let record = ChangeRecord {
            path,
            old_value: self.node.get(key.clone()),
            new_value: Some(value.clone()),
        };
        self.shared.notify(&record);

        self.node.insert(key, value);
        let mut registry = self.shared.registry.borrow_mut();
        if let Some(old) = &record.old_value {
            registry.release(old);
        }
        registry.register(pending);
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "observe.set", path = %record.path);
        Ok(())
    }

    fn intercept_delete(&self, key: PathStep) -> Result<(), ObservationError> {
        let _guard = self.shared.enter()?;
        let key = self.node.normalize(key);
        let path = self.path()?.child(key.clone());

        let record = ChangeRecord {
            path,
            old_value: self.node.get(key.clone()),
            new_value: None,
        };
        self.shared.notify(&record);

        self.node.remove(key);
        if let Some(old) = &record.old_value {
            self.shared.registry.borrow_mut().release(old);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "observe.delete", path = %record.path);
        Ok(())
    }

    #[cfg(feature = "tracing")]
    fn log_outcome(op: &'static str, result: &Result<(), ObservationError>) {
        if let Err(err) = result {
            tracing::debug!(message = "observe.reject", op, error = %err);
        }
    }
}

impl fmt::Debug for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observed")
            .field("node", &self.node)
            .field("path", &self.path().ok())
            .finish()
    }
}
