//! Observe a tree of plain data and get a change record for every mutation,
//! at any depth.
//!
//! [`observe`] walks the tree once, validates every value, and registers
//! each container node with its path from the root. The returned
//! [`ObservedTree`] hands out [`Observed`] handles whose [`set`] and
//! [`delete`] report a [`ChangeRecord`] to the callback before changing
//! the data.
//!
//! Accepted values are primitives (except `undefined`) and plain
//! containers: objects, arrays and dates. A container may appear at most
//! once in a tree and in at most one tree at a time.
//!
//! # Example
//!
//! ```
//! use observe_tree::{observe, Path};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let paths = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&paths);
//! let tree = observe(json!({}), move |record| sink.borrow_mut().push(record.path.clone()))?;
//!
//! tree.set("a", json!({}))?;
//! tree.child("a").unwrap().set("b", json!({}))?;
//! tree.at(["a", "b"]).unwrap().set("c", "x")?;
//!
//! assert_eq!(
//!     *paths.borrow(),
//!     vec![Path::from(["a"]), Path::from(["a", "b"]), Path::from(["a", "b", "c"])]
//! );
//! assert_eq!(tree.to_json()?, json!({"a": {"b": {"c": "x"}}}));
//! # Ok::<(), observe_tree::ObservationError>(())
//! ```
//!
//! [`set`]: Observed::set
//! [`delete`]: Observed::delete

mod error;
pub mod gate;
mod json;
mod observed;
mod path;
mod record;
mod registry;
mod value;
mod walk;

pub use error::ObservationError;
pub use observed::{observe, Observed, ObservedTree};
pub use path::{Path, PathStep, MAX_ARRAY_INDEX};
pub use record::{ChangeKind, ChangeRecord};
pub use value::{Node, Shape, Symbol, Value, WrappedKind};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
