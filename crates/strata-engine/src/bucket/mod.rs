//! Bucket: the population protocol over one layer's features.
//!
//! Usage:
//!
//! ```
//! use strata_engine::bucket::Bucket;
//! use strata_engine::config::BucketConfig;
//! use strata_engine::geometry::VectorFeature;
//! use strata_engine::layer::{LayerType, StyleLayer};
//!
//! let mut bucket = Bucket::new(StyleLayer::new("dots", LayerType::Circle), BucketConfig::default())?;
//! bucket.set_features(vec![VectorFeature::point(17.0, 42.0).boxed()]);
//! let report = bucket.populate_buffers()?;
//! assert_eq!(report.added, 1);
//! assert_eq!(bucket.element_groups("circle").len(), 1);
//! # Ok::<(), strata_engine::error::BucketError>(())
//! ```

mod buffers;
mod group;

pub use buffers::{BucketBuffers, InterfaceBuffers};
pub use group::{ElementGroup, ElementGroups};

use std::fmt;

use crate::buffer::StructuredBuffer;
use crate::config::BucketConfig;
use crate::emit::{self, GeometryEmitter};
use crate::error::BucketError;
use crate::geometry::BoxedFeature;
use crate::layer::{Layout, StyleLayer};
use crate::schema::{BufferRole, CompiledInterface};

/// A feature dropped by [`Bucket::populate_buffers`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFeature {
    /// Position in the feature list.
    pub index: usize,
    pub error: BucketError,
}

/// Outcome of one populate pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulateReport {
    pub added: usize,
    pub skipped: Vec<SkippedFeature>,
}

impl PopulateReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Owns the buffers and element groups built for one style layer.
pub struct Bucket {
    layer: StyleLayer,
    config: BucketConfig,
    emitter: Box<dyn GeometryEmitter>,
    buffers: BucketBuffers,
    features: Vec<BoxedFeature>,
}

impl Bucket {
    /// Creates a bucket with the built-in emitter for `layer`'s type.
    pub fn new(layer: StyleLayer, config: BucketConfig) -> Result<Self, BucketError> {
        let emitter = emit::emitter_for(layer.ty, config.index_width)?;
        Self::with_emitter(layer, config, emitter)
    }

    /// Creates a bucket writing through a caller-provided emitter.
    pub fn with_emitter(
        layer: StyleLayer,
        config: BucketConfig,
        emitter: Box<dyn GeometryEmitter>,
    ) -> Result<Self, BucketError> {
        let schema = emitter.compiled_schema()?;
        let buffers = BucketBuffers::new(schema, &config)?;
        log::debug!(
            "bucket '{}' ({}): {} interface(s)",
            layer.id,
            layer.ty.as_str(),
            buffers.schema().interfaces().len()
        );
        Ok(Self {
            layer,
            config,
            emitter,
            buffers,
            features: Vec::new(),
        })
    }

    /// Clears every buffer and group so the next populate starts from nothing.
    ///
    /// Buffer identities and capacities are kept.
    pub fn create_buffers(&mut self) {
        self.buffers.reset();
    }

    pub fn set_features(&mut self, features: Vec<BoxedFeature>) {
        self.features = features;
    }

    #[inline]
    pub fn features(&self) -> &[BoxedFeature] {
        &self.features
    }

    /// Runs the emitter over every feature, appending to the current buffers.
    ///
    /// Per-feature errors are logged and collected in the report, and every
    /// record the skipped feature wrote is rolled back. Fatal errors (and any
    /// error when `abort_on_feature_error` is set) are returned immediately
    /// with the failing feature's partial records left in place.
    pub fn populate_buffers(&mut self) -> Result<PopulateReport, BucketError> {
        let mut report = PopulateReport::default();

        for (index, feature) in self.features.iter().enumerate() {
            let mark = self.buffers.checkpoint();
            match self.emitter.add_feature(&**feature, &mut self.buffers) {
                Ok(()) => report.added += 1,
                Err(error) if error.is_fatal() || self.config.abort_on_feature_error => {
                    return Err(error);
                }
                Err(error) => {
                    // A skipped feature leaves nothing behind.
                    self.buffers.rollback(mark);
                    log::warn!("layer '{}': skipping feature {}: {}", self.layer.id, index, error);
                    report.skipped.push(SkippedFeature { index, error });
                }
            }
        }

        log::debug!(
            "layer '{}': populated {} feature(s), skipped {}",
            self.layer.id,
            report.added,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Resolves the layer's layout properties and returns them.
    pub fn create_style_layer(&mut self) -> &Layout {
        self.layer.resolve_layout()
    }

    #[inline]
    pub fn layer(&self) -> &StyleLayer {
        &self.layer
    }

    #[inline]
    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    #[inline]
    pub fn interfaces(&self) -> &[CompiledInterface] {
        self.buffers.schema().interfaces()
    }

    #[inline]
    pub fn buffers(&self) -> &BucketBuffers {
        &self.buffers
    }

    pub fn buffer(&self, interface: &str, role: BufferRole) -> Option<&StructuredBuffer> {
        self.buffers.buffer(interface, role)
    }

    pub fn element_groups(&self, interface: &str) -> &[ElementGroup] {
        self.buffers.element_groups(interface)
    }

    /// Hands the populated buffers to the rendering stage.
    pub fn into_buffers(self) -> BucketBuffers {
        self.buffers
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("layer", &self.layer.id)
            .field("config", &self.config)
            .field("buffers", &self.buffers)
            .field("features", &self.features.len())
            .finish_non_exhaustive()
    }
}
