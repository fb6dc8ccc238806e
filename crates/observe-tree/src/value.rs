//! Host value model: primitives plus identity-carrying container nodes.
//!
//! A [`Node`] is a shared handle. Cloning it clones the handle, not the
//! data, so the same node can appear at several places of a graph (and can
//! even contain itself). Observation relies on that identity: see
//! [`crate::observe`].

use crate::path::PathStep;
use crate::registry::TreeId;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Any value that can be stored in, or offered to, an observed tree.
#[derive(Debug, Clone)]
pub enum Value {
    /// Never admitted into a tree: a record could not tell it from an
    /// absent key.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(Symbol),
    Node(Node),
}

impl Value {
    /// `true` for every variant except [`Value::Node`].
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Node(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Strict equality: primitives by value (`NaN != NaN`), symbols and nodes
/// by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        Value::Node(node.clone())
    }
}

/// A unique primitive compared by identity.
#[derive(Clone)]
pub struct Symbol(Rc<Option<String>>);

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        Self(Rc::new(Some(description.into())))
    }

    pub fn anonymous() -> Self {
        Self(Rc::new(None))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// Boxed primitive kinds. They are objects that can carry extra properties,
/// which is why they are never admitted as leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrappedKind {
    String,
    Number,
    Boolean,
    Symbol,
}

impl WrappedKind {
    pub fn class_name(self) -> &'static str {
        match self {
            WrappedKind::String => "String",
            WrappedKind::Number => "Number",
            WrappedKind::Boolean => "Boolean",
            WrappedKind::Symbol => "Symbol",
        }
    }
}

impl fmt::Display for WrappedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WrappedKind::String => "string",
            WrappedKind::Number => "number",
            WrappedKind::Boolean => "boolean",
            WrappedKind::Symbol => "symbol",
        })
    }
}

/// The class of a node. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
    /// Milliseconds since the Unix epoch.
    Date(i64),
    Wrapped(WrappedKind),
    /// Anything else: class instances, functions, maps, sets.
    Instance(String),
}

impl Shape {
    pub fn class_name(&self) -> &str {
        match self {
            Shape::Object => "Object",
            Shape::Array => "Array",
            Shape::Date(_) => "Date",
            Shape::Wrapped(kind) => kind.class_name(),
            Shape::Instance(class) => class,
        }
    }

    /// Plain containers are the only admitted nodes.
    pub fn is_plain(&self) -> bool {
        matches!(self, Shape::Object | Shape::Array | Shape::Date(_))
    }
}

// Array elements are sparse: `length` may exceed the number of elements.
#[derive(Debug, Default)]
struct Body {
    items: BTreeMap<usize, Value>,
    length: usize,
    props: IndexMap<String, Value>,
}

pub(crate) struct NodeCell {
    shape: Shape,
    body: RefCell<Body>,
    owner: Cell<Option<TreeId>>,
}

/// Identity of a node, usable as a map key while the node is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey(usize);

/// Shared handle to a container.
#[derive(Clone)]
pub struct Node(Rc<NodeCell>);

impl Node {
    pub fn new(shape: Shape) -> Self {
        Self(Rc::new(NodeCell {
            shape,
            body: RefCell::new(Body::default()),
            owner: Cell::new(None),
        }))
    }

    pub fn object() -> Self {
        Self::new(Shape::Object)
    }

    pub fn array() -> Self {
        Self::new(Shape::Array)
    }

    pub fn date(epoch_ms: i64) -> Self {
        Self::new(Shape::Date(epoch_ms))
    }

    pub fn wrapped(kind: WrappedKind) -> Self {
        Self::new(Shape::Wrapped(kind))
    }

    pub fn instance(class: impl Into<String>) -> Self {
        Self::new(Shape::Instance(class.into()))
    }

    /// Builds an object node from `(key, value)` pairs.
    pub fn object_from<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let node = Self::object();
        for (key, value) in entries {
            node.insert(PathStep::Key(key.into()), value);
        }
        node
    }

    /// Builds an array node from its elements.
    pub fn array_from<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let node = Self::array();
        for item in items {
            node.push(item);
        }
        node
    }

    pub fn shape(&self) -> &Shape {
        &self.0.shape
    }

    pub fn class_name(&self) -> &str {
        self.0.shape.class_name()
    }

    pub fn is_array(&self) -> bool {
        self.0.shape == Shape::Array
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Maps `step` onto the key space of this node.
    ///
    /// Arrays address elements by canonical index keys; every other shape
    /// only has named properties, so indices become decimal strings.
    pub fn normalize(&self, step: PathStep) -> PathStep {
        if self.is_array() {
            match step.as_index() {
                Some(idx) => PathStep::Index(idx),
                None => PathStep::Key(step.to_key()),
            }
        } else {
            match step {
                PathStep::Index(idx) => PathStep::Key(idx.to_string()),
                key => key,
            }
        }
    }

    pub fn get(&self, key: impl Into<PathStep>) -> Option<Value> {
        let body = self.0.body.borrow();
        match self.normalize(key.into()) {
            PathStep::Index(idx) => body.items.get(&idx).cloned(),
            PathStep::Key(key) => body.props.get(&key).cloned(),
        }
    }

    pub fn contains_key(&self, key: impl Into<PathStep>) -> bool {
        let body = self.0.body.borrow();
        match self.normalize(key.into()) {
            PathStep::Index(idx) => body.items.contains_key(&idx),
            PathStep::Key(key) => body.props.contains_key(&key),
        }
    }

    /// Stores `value` without interception and returns the previous value.
    ///
    /// Writing past the end of an array grows its length; the skipped
    /// indices are holes and take no space.
    pub fn insert(&self, key: impl Into<PathStep>, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();
        let mut body = self.0.body.borrow_mut();
        match self.normalize(key.into()) {
            PathStep::Index(idx) => {
                // idx <= MAX_ARRAY_INDEX, so this cannot overflow.
                body.length = body.length.max(idx + 1);
                body.items.insert(idx, value)
            }
            PathStep::Key(key) => body.props.insert(key, value),
        }
    }

    /// Removes a key without interception. Array elements leave a hole and
    /// the length is unchanged.
    pub fn remove(&self, key: impl Into<PathStep>) -> Option<Value> {
        let mut body = self.0.body.borrow_mut();
        match self.normalize(key.into()) {
            PathStep::Index(idx) => body.items.remove(&idx),
            PathStep::Key(key) => body.props.shift_remove(&key),
        }
    }

    /// Appends an element (at index `len()`). A full array gets the value
    /// as the property `"4294967295"`.
    pub fn push(&self, value: impl Into<Value>) {
        let next = self.len();
        self.insert(PathStep::Index(next), value);
    }

    /// Array length (holes included) for arrays, property count otherwise.
    pub fn len(&self) -> usize {
        let body = self.0.body.borrow();
        if self.is_array() {
            body.length
        } else {
            body.props.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerable keys: present array elements in index order, then
    /// properties in insertion order.
    pub fn keys(&self) -> Vec<PathStep> {
        let body = self.0.body.borrow();
        let elements = body.items.keys().map(|idx| PathStep::Index(*idx));
        let props = body.props.keys().map(|key| PathStep::Key(key.clone()));
        elements.chain(props).collect()
    }

    /// Snapshot of the enumerable entries in [`Node::keys`] order.
    pub fn entries(&self) -> Vec<(PathStep, Value)> {
        let body = self.0.body.borrow();
        let elements = body
            .items
            .iter()
            .map(|(idx, value)| (PathStep::Index(*idx), value.clone()));
        let props = body
            .props
            .iter()
            .map(|(key, value)| (PathStep::Key(key.clone()), value.clone()));
        elements.chain(props).collect()
    }

    /// Elements including holes (`None`), `len()` entries long. Empty for
    /// non-arrays.
    pub fn items(&self) -> Vec<Option<Value>> {
        let body = self.0.body.borrow();
        (0..body.length).map(|idx| body.items.get(&idx).cloned()).collect()
    }

    /// Named properties in insertion order.
    pub fn props(&self) -> Vec<(String, Value)> {
        let body = self.0.body.borrow();
        body.props
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub(crate) fn key(&self) -> NodeKey {
        NodeKey(Rc::as_ptr(&self.0) as usize)
    }

    pub(crate) fn owner(&self) -> Option<TreeId> {
        self.0.owner.get()
    }

    pub(crate) fn set_owner(&self, owner: Option<TreeId>) {
        self.0.owner.set(owner);
    }

    pub(crate) fn downgrade(&self) -> Weak<NodeCell> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<NodeCell>) -> Option<Node> {
        weak.upgrade().map(Node)
    }
}

// Not recursive: nodes may form cycles.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node({} @ {:#x}, len {})",
            self.class_name(),
            self.key().0,
            self.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::MAX_ARRAY_INDEX;

    #[test]
    fn node_equality_is_identity() {
        let a = Node::object();
        let b = Node::object();
        assert_eq!(Value::from(&a), Value::from(&a));
        assert_ne!(Value::from(&a), Value::from(&b));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        let sym = Symbol::new("s");
        assert_eq!(Value::from(sym.clone()), Value::from(sym));
        assert_ne!(Value::from(Symbol::new("s")), Value::from(Symbol::new("s")));
    }

    #[test]
    fn array_keys_are_normalized() {
        let arr = Node::array_from(["a", "b"]);
        assert_eq!(arr.get("1"), Some(Value::from("b")));
        assert_eq!(arr.normalize(PathStep::from("1")), PathStep::Index(1));
        assert_eq!(arr.normalize(PathStep::from("01")), PathStep::from("01"));
        arr.insert("m", "mu");
        assert_eq!(arr.len(), 2);
        assert_eq!(
            arr.keys(),
            vec![PathStep::Index(0), PathStep::Index(1), PathStep::from("m")]
        );

        let obj = Node::object();
        obj.insert(3, true);
        assert_eq!(obj.keys(), vec![PathStep::from("3")]);
        assert_eq!(obj.get("3"), Some(Value::Bool(true)));
    }

    #[test]
    fn array_removal_leaves_hole() {
        let arr = Node::array_from([1, 2, 3]);
        assert_eq!(arr.remove(1), Some(Value::from(2)));
        assert_eq!(arr.len(), 3);
        assert!(!arr.contains_key(1));
        assert_eq!(arr.keys(), vec![PathStep::Index(0), PathStep::Index(2)]);

        arr.insert(5, "tail");
        assert_eq!(arr.len(), 6);
        assert_eq!(arr.get(4), None);
        assert_eq!(
            arr.items(),
            vec![
                Some(Value::from(1)),
                None,
                Some(Value::from(3)),
                None,
                None,
                Some(Value::from("tail")),
            ]
        );
    }

    #[test]
    fn far_indices_stay_sparse() {
        let arr = Node::array_from([1]);
        arr.insert("4294967294", "last");
        assert_eq!(arr.len(), MAX_ARRAY_INDEX + 1);
        assert_eq!(
            arr.keys(),
            vec![PathStep::Index(0), PathStep::Index(MAX_ARRAY_INDEX)]
        );

        arr.insert("4294967295", "named");
        arr.insert("18446744073709551615", "named too");
        assert_eq!(arr.len(), MAX_ARRAY_INDEX + 1);
        assert_eq!(arr.get("4294967295"), Some(Value::from("named")));
        assert_eq!(arr.keys().len(), 4);

        arr.push("overflow");
        assert_eq!(arr.get("4294967295"), Some(Value::from("overflow")));
        assert_eq!(arr.len(), MAX_ARRAY_INDEX + 1);
    }

    #[test]
    fn array_with_only_props_is_empty() {
        let arr = Node::array();
        arr.insert("m", 1);
        assert_eq!(arr.len(), 0);
        assert!(arr.is_empty());
        assert!(!arr.contains_key(0));
    }

    #[test]
    fn object_removal_keeps_insertion_order() {
        let obj = Node::object_from([("a", 1), ("b", 2), ("c", 3)]);
        obj.remove("b");
        obj.insert("b", 4);
        assert_eq!(
            obj.keys(),
            vec![PathStep::from("a"), PathStep::from("c"), PathStep::from("b")]
        );
    }

    #[test]
    fn debug_of_self_containing_node_terminates() {
        let node = Node::object();
        node.insert("me", &node);
        assert!(format!("{node:?}").starts_with("Node(Object @"));
    }
}
