//! Type gate: decides whether a value may enter an observed tree.

use crate::error::ObservationError;
use crate::value::{Shape, Value};

/// How an admitted value takes part in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Atomic leaf, ends recursion.
    Primitive,
    /// Plain object, array or date; walked and registered.
    Container,
}

/// Classifies `value`, rejecting every shape a tree cannot hold.
///
/// `label` only feeds the error message.
///
/// ```
/// use observe_tree::gate::{admit, Admission};
/// use observe_tree::{Node, ObservationError, Value, WrappedKind};
///
/// assert_eq!(admit(&Value::Null, "x"), Ok(Admission::Primitive));
/// assert_eq!(admit(&Node::date(0).into(), "x"), Ok(Admission::Container));
/// assert!(matches!(
///     admit(&Node::wrapped(WrappedKind::Number).into(), "x"),
///     Err(ObservationError::WrappedPrimitive { kind: WrappedKind::Number, .. })
/// ));
/// ```
pub fn admit(value: &Value, label: impl ToString) -> Result<Admission, ObservationError> {
    match value {
        Value::Undefined => Err(ObservationError::Undefined {
            label: label.to_string(),
        }),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Symbol(_) => {
            Ok(Admission::Primitive)
        }
        Value::Node(node) => match node.shape() {
            Shape::Object | Shape::Array | Shape::Date(_) => Ok(Admission::Container),
            Shape::Wrapped(kind) => Err(ObservationError::WrappedPrimitive {
                label: label.to_string(),
                kind: *kind,
            }),
            Shape::Instance(class) => Err(ObservationError::NonPlainObject {
                label: label.to_string(),
                class: class.clone(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Node, Symbol, WrappedKind};

    #[test]
    fn primitives_pass() {
        for value in [
            Value::Null,
            Value::Bool(false),
            Value::Number(42.0),
            Value::String("string".into()),
            Value::Symbol(Symbol::anonymous()),
        ] {
            assert_eq!(admit(&value, "v"), Ok(Admission::Primitive));
        }
    }

    #[test]
    fn plain_containers_pass() {
        for node in [Node::object(), Node::array(), Node::date(1_500_000_000_000)] {
            assert_eq!(admit(&node.into(), "v"), Ok(Admission::Container));
        }
    }

    #[test]
    fn undefined_is_rejected_with_label() {
        let err = admit(&Value::Undefined, "a.b").unwrap_err();
        assert_eq!(err.to_string(), "observe() not supported: a.b undefined");
    }

    #[test]
    fn wrapped_primitives_are_rejected() {
        for (kind, name) in [
            (WrappedKind::String, "string"),
            (WrappedKind::Number, "number"),
            (WrappedKind::Boolean, "boolean"),
            (WrappedKind::Symbol, "symbol"),
        ] {
            let err = admit(&Node::wrapped(kind).into(), "k").unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("observe() not supported: k wrapped {name}")
            );
        }
    }

    #[test]
    fn class_instances_are_rejected_by_class_name() {
        for class in ["Map", "Function", "Point"] {
            let err = admit(&Node::instance(class).into(), "k").unwrap_err();
            assert_eq!(
                err,
                ObservationError::NonPlainObject {
                    label: "k".into(),
                    class: class.into(),
                }
            );
        }
    }
}
