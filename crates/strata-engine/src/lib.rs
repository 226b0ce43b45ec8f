//! Strata engine crate.
//!
//! Builds GPU-ready vertex and index buffers from decoded tile features.
//!
//! | Module | Role |
//! |---|---|
//! | [`buffer`] | Typed, growable record storage (`StructuredBuffer`) |
//! | [`schema`] | Shader interface declarations and their compiled form |
//! | [`bucket`] | Population protocol and element-group splitting |
//! | [`emit`] | Circle, line and fill geometry emitters |
//! | [`gpu`] | wgpu vertex/index descriptors and draw segments |
//! | [`layer`] | Style layer boundary and layout resolution |
//!
//! A bucket compiles its emitter's interfaces once, then for each feature the
//! emitter reserves room, appends vertices and appends index tuples. When an
//! interface would exceed what its index type can address, a new
//! [`ElementGroup`](bucket::ElementGroup) starts and indices restart at zero.

pub mod bucket;
pub mod buffer;
pub mod config;
pub mod emit;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod layer;
pub mod logging;
pub mod schema;

pub use bucket::{Bucket, PopulateReport};
pub use config::{BucketConfig, BufferOptions};
pub use error::BucketError;
