//! Change records handed to the observer callback.

use crate::error::ObservationError;
use crate::path::{Path, PathStep};
use crate::value::Value;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

/// What a [`ChangeRecord`] did to its key, derived from which values are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The key was absent and now holds `new_value`.
    Create,
    /// `old_value` was overwritten with `new_value`.
    Replace,
    /// The key was deleted, whether or not it held a value.
    Delete,
}

/// One accepted mutation.
///
/// `old_value` is `None` when the key was absent before, `new_value` is
/// `None` for a deletion. Every mutation gets its own record.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub path: Path,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

impl ChangeRecord {
    pub fn kind(&self) -> ChangeKind {
        match (&self.old_value, &self.new_value) {
            (_, None) => ChangeKind::Delete,
            (None, Some(_)) => ChangeKind::Create,
            (Some(_), Some(_)) => ChangeKind::Replace,
        }
    }

    /// Wire form: `{"path": [...], "oldValue"?: ..., "newValue"?: ...}`.
    pub fn to_json(&self) -> Result<serde_json::Value, ObservationError> {
        let mut out = serde_json::Map::new();
        let path = self
            .path
            .iter()
            .map(|step| match step {
                PathStep::Key(key) => serde_json::Value::String(key.clone()),
                PathStep::Index(idx) => serde_json::Value::from(*idx),
            })
            .collect();
        out.insert("path".into(), serde_json::Value::Array(path));
        if let Some(old) = &self.old_value {
            out.insert("oldValue".into(), old.to_json()?);
        }
        if let Some(new) = &self.new_value {
            out.insert("newValue".into(), new.to_json()?);
        }
        Ok(serde_json::Value::Object(out))
    }
}

impl Serialize for ChangeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}
