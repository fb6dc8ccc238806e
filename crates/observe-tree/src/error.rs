use crate::path::Path;
use crate::value::WrappedKind;
use thiserror::Error;

/// Why an observation or a mutation of an observed tree was refused.
///
/// These are programmer errors: retrying the same call fails the same way.
/// Nothing is committed when one of them is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationError {
    #[error("observe() not supported: primitive")]
    PrimitiveRoot,
    #[error("observe() not supported: double observing at {path}")]
    DoubleObserving { path: Path },
    #[error("observe() not supported: cycle at {path}")]
    Cycle { path: Path },
    #[error("observe() not supported: {label} undefined")]
    Undefined { label: String },
    #[error("observe() not supported: {label} wrapped {kind}")]
    WrappedPrimitive { label: String, kind: WrappedKind },
    #[error("observe() not supported: {label} object of class {class}")]
    NonPlainObject { label: String, class: String },
    #[error("observe() not supported: setting prototype")]
    SetPrototype,
    #[error("observe() not supported: defining property")]
    DefineProperty,
    #[error("node is no longer part of the observed tree")]
    Detached,
    #[error("observed tree mutated from within its own change callback")]
    Reentrant,
}
