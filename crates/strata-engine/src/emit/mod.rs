//! Geometry emitters.
//!
//! An emitter owns the shader interfaces of one geometry kind and turns each
//! feature into vertex and element records through a [`BucketBuffers`] sink.
//! Built-in emitters are selected from the style layer type by
//! [`emitter_for`]; custom ones are passed to
//! [`Bucket::with_emitter`](crate::bucket::Bucket::with_emitter).

mod circle;
mod fill;
mod line;

pub use circle::CircleEmitter;
pub use fill::FillEmitter;
pub use line::LineEmitter;

use std::sync::{Arc, OnceLock};

use crate::bucket::BucketBuffers;
use crate::error::BucketError;
use crate::geometry::Feature;
use crate::layer::LayerType;
use crate::schema::{CompiledSchema, IndexWidth, ShaderInterface};

/// Per-geometry-kind feature writer.
pub trait GeometryEmitter: Send {
    /// Interface declarations this emitter writes through.
    fn shader_interfaces(&self) -> Vec<ShaderInterface>;

    /// Compiled form of [`shader_interfaces`](Self::shader_interfaces).
    ///
    /// The default compiles on every call; built-in emitters override it to
    /// share one compiled schema per index width.
    fn compiled_schema(&self) -> Result<Arc<CompiledSchema>, BucketError> {
        CompiledSchema::compile(&self.shader_interfaces()).map(Arc::new)
    }

    /// Writes one feature. Must reserve room before emitting vertices.
    fn add_feature(&mut self, feature: &dyn Feature, sink: &mut BucketBuffers) -> Result<(), BucketError>;
}

/// Built-in emitter for `ty`, or [`BucketError::UnsupportedLayer`].
pub fn emitter_for(ty: LayerType, index_width: IndexWidth) -> Result<Box<dyn GeometryEmitter>, BucketError> {
    Ok(match ty {
        LayerType::Circle => Box::new(CircleEmitter::new(index_width)),
        LayerType::Line => Box::new(LineEmitter::new(index_width)),
        LayerType::Fill => Box::new(FillEmitter::new(index_width)),
        other => return Err(BucketError::UnsupportedLayer(other)),
    })
}

// ── schema cache ──────────────────────────────────────────────────────────

/// One lazily compiled schema per index width.
pub(crate) struct SchemaCache {
    slots: [OnceLock<Arc<CompiledSchema>>; 2],
}

impl SchemaCache {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [OnceLock::new(), OnceLock::new()],
        }
    }

    pub(crate) fn get_or_compile(
        &self,
        index_width: IndexWidth,
        declare: impl FnOnce() -> Vec<ShaderInterface>,
    ) -> Result<Arc<CompiledSchema>, BucketError> {
        let slot = match index_width {
            IndexWidth::U16 => &self.slots[0],
            IndexWidth::U32 => &self.slots[1],
        };
        if let Some(schema) = slot.get() {
            return Ok(schema.clone());
        }
        // A racing thread may win; both results are identical.
        let compiled = Arc::new(CompiledSchema::compile(&declare())?);
        Ok(slot.get_or_init(|| compiled).clone())
    }
}
