use std::sync::Arc;

use crate::bucket::BucketBuffers;
use crate::buffer::AttributeType;
use crate::error::BucketError;
use crate::geometry::{Feature, Point};
use crate::schema::{AttributeDecl, CompiledSchema, IndexWidth, ShaderInterface};

use super::{GeometryEmitter, SchemaCache};

const INTERFACE: &str = "fill";

static SCHEMAS: SchemaCache = SchemaCache::new();

/// Emits a triangle fan and a closed outline per polygon ring.
///
/// Triangles go to the primary element buffer; outline segments go to the
/// secondary one. Each ring reserves its own room, so a multi-ring feature
/// may span two groups but a single ring never does.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillEmitter {
    index_width: IndexWidth,
}

impl FillEmitter {
    pub fn new(index_width: IndexWidth) -> Self {
        Self { index_width }
    }

    fn add_ring(&self, ring: &[Point], sink: &mut BucketBuffers) -> Result<(), BucketError> {
        sink.make_room_for(INTERFACE, ring.len())?;

        let mut indices = Vec::with_capacity(ring.len());
        for p in ring {
            indices.push(sink.add_vertex(INTERFACE, &[p.x as f64, p.y as f64])?);
        }

        let first = indices[0];
        for pair in indices[1..].windows(2) {
            sink.add_element(INTERFACE, &[first, pair[0], pair[1]])?;
        }
        for (i, &a) in indices.iter().enumerate() {
            let b = indices[(i + 1) % indices.len()];
            sink.add_second_element(INTERFACE, &[a, b])?;
        }
        Ok(())
    }
}

impl GeometryEmitter for FillEmitter {
    fn shader_interfaces(&self) -> Vec<ShaderInterface> {
        vec![
            ShaderInterface::new(INTERFACE)
                .args(["x", "y"])
                .attribute(
                    AttributeDecl::new("pos")
                        .components(2)
                        .ty(AttributeType::Short)
                        .value(["x", "y"]),
                )
                .element(3)
                .second_element(2)
                .index_width(self.index_width),
        ]
    }

    fn compiled_schema(&self) -> Result<Arc<CompiledSchema>, BucketError> {
        SCHEMAS.get_or_compile(self.index_width, || self.shader_interfaces())
    }

    fn add_feature(&mut self, feature: &dyn Feature, sink: &mut BucketBuffers) -> Result<(), BucketError> {
        for mut ring in feature.load_geometry() {
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            if ring.len() < 3 {
                continue;
            }
            self.add_ring(&ring, sink)?;
        }
        Ok(())
    }
}
