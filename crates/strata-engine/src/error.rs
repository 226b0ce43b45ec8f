use std::fmt;

use strata_expr::ExprError;

use crate::layer::LayerType;

/// Errors raised while building or populating bucket buffers.
///
/// Per-feature errors ([`OutOfRange`](Self::OutOfRange),
/// [`CapacityOverflow`](Self::CapacityOverflow)) leave previously written
/// records intact and let population continue with the next feature. All other
/// variants are fatal: buffer layout integrity can no longer be assumed.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketError {
    /// A record or element operand index is outside the valid range.
    OutOfRange {
        what: &'static str,
        index: usize,
        length: usize,
    },
    /// A feature needs more vertices than one element group can address.
    CapacityOverflow {
        interface: String,
        requested: usize,
        ceiling: u64,
    },
    /// Backing storage for a buffer could not be reserved.
    AllocationFailure {
        buffer: String,
        requested_bytes: usize,
    },
    /// Argument or operand arity does not match the compiled schema.
    SchemaMismatch { interface: String, message: String },
    /// An attribute value expression failed to parse or compile.
    Schema {
        interface: String,
        attribute: String,
        source: ExprError,
    },
    /// The named shader interface is not part of the bucket's schema.
    UnknownInterface(String),
    /// A record was emitted before `make_room_for` opened a group.
    NoActiveGroup(String),
    /// No built-in geometry emitter exists for this layer type.
    UnsupportedLayer(LayerType),
}

impl BucketError {
    /// Returns `true` when population must stop instead of skipping the feature.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::OutOfRange { .. } | Self::CapacityOverflow { .. })
    }

    pub(crate) fn mismatch(interface: &str, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            interface: interface.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for BucketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { what, index, length } => {
                write!(f, "{what} index {index} out of range (length {length})")
            }
            Self::CapacityOverflow { interface, requested, ceiling } => write!(
                f,
                "'{interface}' needs {requested} vertices but a group holds at most {ceiling}"
            ),
            Self::AllocationFailure { buffer, requested_bytes } => {
                write!(f, "failed to allocate {requested_bytes} bytes for buffer '{buffer}'")
            }
            Self::SchemaMismatch { interface, message } => {
                write!(f, "schema mismatch in '{interface}': {message}")
            }
            Self::Schema { interface, attribute, source } => {
                write!(f, "invalid value for '{interface}.{attribute}': {source}")
            }
            Self::UnknownInterface(name) => write!(f, "unknown shader interface '{name}'"),
            Self::NoActiveGroup(name) => {
                write!(f, "no active element group for '{name}'; call make_room_for first")
            }
            Self::UnsupportedLayer(ty) => write!(f, "no geometry emitter for '{}' layers", ty.as_str()),
        }
    }
}

impl std::error::Error for BucketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema { source, .. } => Some(source),
            _ => None,
        }
    }
}
