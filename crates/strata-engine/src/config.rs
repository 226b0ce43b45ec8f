use crate::schema::IndexWidth;

/// Storage options applied to every buffer a bucket creates.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferOptions {
    /// Records reserved when a buffer is created.
    pub initial_capacity: usize,
    /// Capacity multiplier applied when a full buffer grows.
    ///
    /// Values at or below 1.0 still grow by one record per step.
    pub growth_factor: f32,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 128,
            growth_factor: 1.5,
        }
    }
}

/// Bucket configuration.
///
/// `index_width` selects the index type used by the built-in emitters and
/// therefore the per-group vertex ceiling (65 536 for `U16`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketConfig {
    pub buffers: BufferOptions,
    pub index_width: IndexWidth,
    /// Reject element operands that do not name a vertex already written to the active group.
    pub check_element_operands: bool,
    /// Stop `populate_buffers` at the first per-feature error instead of skipping the feature.
    pub abort_on_feature_error: bool,
}

impl BucketConfig {
    pub fn with_buffers(mut self, buffers: BufferOptions) -> Self {
        self.buffers = buffers;
        self
    }

    pub fn with_index_width(mut self, index_width: IndexWidth) -> Self {
        self.index_width = index_width;
        self
    }

    pub fn with_element_operand_checks(mut self, enabled: bool) -> Self {
        self.check_element_operands = enabled;
        self
    }

    pub fn with_abort_on_feature_error(mut self, enabled: bool) -> Self {
        self.abort_on_feature_error = enabled;
        self
    }
}
