//! Conversions between [`Value`] and `serde_json::Value`.

use crate::error::ObservationError;
use crate::path::{Path, PathStep};
use crate::value::{Node, NodeKey, Shape, Value};
use serde_json::{Map, Number, Value as JsonValue};

/// Builds a fresh tree of new nodes.
impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => {
                Value::Node(Node::array_from(items.into_iter().map(Value::from)))
            }
            JsonValue::Object(map) => Value::Node(Node::object_from(
                map.into_iter().map(|(key, value)| (key, Value::from(value))),
            )),
        }
    }
}

impl Value {
    /// Serializes like `JSON.stringify`.
    ///
    /// - `undefined`, symbols and holes become `null` inside arrays and are
    ///   skipped as properties;
    /// - named properties of arrays are skipped;
    /// - integral numbers are emitted as integers, non-finite ones as `null`;
    /// - dates become their epoch milliseconds.
    ///
    /// A node that contains itself yields [`ObservationError::Cycle`].
    ///
    /// ```
    /// use observe_tree::{Node, Value};
    /// use serde_json::json;
    ///
    /// let xs = Node::array_from([Value::from(1), Value::Undefined, Value::from(2.5)]);
    /// let root = Node::object_from([("xs", Value::from(xs)), ("u", Value::Undefined)]);
    /// assert_eq!(Value::from(root).to_json().unwrap(), json!({"xs": [1, null, 2.5]}));
    /// ```
    pub fn to_json(&self) -> Result<JsonValue, ObservationError> {
        let mut open = Vec::new();
        to_json_at(self, &Path::root(), &mut open)
    }
}

fn to_json_at(
    value: &Value,
    path: &Path,
    open: &mut Vec<NodeKey>,
) -> Result<JsonValue, ObservationError> {
    let node = match value {
        Value::Undefined | Value::Null | Value::Symbol(_) => return Ok(JsonValue::Null),
        Value::Bool(b) => return Ok(JsonValue::Bool(*b)),
        Value::Number(n) => return Ok(number_to_json(*n)),
        Value::String(s) => return Ok(JsonValue::String(s.clone())),
        Value::Node(node) => node,
    };
    if let Shape::Date(ms) = node.shape() {
        return Ok(JsonValue::from(*ms));
    }
    let key = node.key();
    if open.contains(&key) {
        return Err(ObservationError::Cycle { path: path.clone() });
    }
    open.push(key);
    let json = if node.is_array() {
        let mut items = Vec::with_capacity(node.len());
        for (idx, item) in node.items().into_iter().enumerate() {
            items.push(match item {
                Some(item) => to_json_at(&item, &path.child(idx), open)?,
                None => JsonValue::Null,
            });
        }
        JsonValue::Array(items)
    } else {
        let mut map = Map::new();
        for (key, prop) in node.props() {
            if matches!(prop, Value::Undefined | Value::Symbol(_)) {
                continue;
            }
            let json = to_json_at(&prop, &path.child(PathStep::Key(key.clone())), open)?;
            map.insert(key, json);
        }
        JsonValue::Object(map)
    };
    open.pop();
    Ok(json)
}

fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return JsonValue::from(n as i64);
    }
    Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Symbol;
    use serde_json::json;

    #[test]
    fn json_roundtrip_builds_fresh_nodes() {
        let source = json!({"a": [1, "two", null, {"b": true}], "c": {}});
        let first = Value::from(source.clone());
        let second = Value::from(source.clone());
        assert_ne!(first, second);
        assert_eq!(first.to_json().unwrap(), source);
    }

    #[test]
    fn stringify_conventions() {
        let arr = Node::array_from([Value::Symbol(Symbol::anonymous()), Value::Number(f64::NAN)]);
        arr.insert(3, -0.5);
        arr.insert("named", "skipped");
        let root = Node::object_from([
            ("arr", Value::from(&arr)),
            ("sym", Value::Symbol(Symbol::new("s"))),
            ("when", Node::date(1_000).into()),
        ]);
        assert_eq!(
            Value::from(root).to_json().unwrap(),
            json!({"arr": [null, null, null, -0.5], "when": 1000})
        );
    }

    #[test]
    fn cycle_is_reported() {
        let root = Node::object();
        let inner = Node::array();
        root.insert("inner", &inner);
        inner.push(&root);
        let err = Value::from(&root).to_json().unwrap_err();
        assert_eq!(
            err,
            ObservationError::Cycle {
                path: [PathStep::from("inner"), PathStep::from(0)].into_iter().collect()
            }
        );
    }
}
