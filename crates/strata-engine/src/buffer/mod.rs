//! Schema-described, growable record buffers.
//!
//! This module owns the byte-level layout work: attribute types, record
//! layouts with aligned offsets, and the [`StructuredBuffer`] that stores
//! records and grows on demand.

mod layout;
mod structured;
mod types;

pub use layout::{BufferLayout, LayoutAttribute};
pub use structured::{Record, StructuredBuffer};
pub use types::{AttributeType, BufferType};
