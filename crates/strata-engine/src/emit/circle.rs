use std::sync::Arc;

use crate::bucket::BucketBuffers;
use crate::buffer::AttributeType;
use crate::error::BucketError;
use crate::geometry::{EXTENT, Feature, Point};
use crate::schema::{AttributeDecl, CompiledSchema, IndexWidth, ShaderInterface};

use super::{GeometryEmitter, SchemaCache};

const INTERFACE: &str = "circle";

/// Quad corner extrusions, counter-clockwise from top-left.
const CORNERS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

static SCHEMAS: SchemaCache = SchemaCache::new();

/// Emits one extruded quad per point.
///
/// The corner extrusion is packed into the low bit of each doubled
/// coordinate, so the shader recovers both from a single `Short×2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircleEmitter {
    index_width: IndexWidth,
}

impl CircleEmitter {
    pub fn new(index_width: IndexWidth) -> Self {
        Self { index_width }
    }
}

impl GeometryEmitter for CircleEmitter {
    fn shader_interfaces(&self) -> Vec<ShaderInterface> {
        vec![
            ShaderInterface::new(INTERFACE)
                .args(["x", "y", "ex", "ey"])
                .attribute(
                    AttributeDecl::new("pos")
                        .components(2)
                        .ty(AttributeType::Short)
                        .value(["x * 2 + ((ex + 1) / 2)", "y * 2 + ((ey + 1) / 2)"]),
                )
                .element(3)
                .index_width(self.index_width),
        ]
    }

    fn compiled_schema(&self) -> Result<Arc<CompiledSchema>, BucketError> {
        SCHEMAS.get_or_compile(self.index_width, || self.shader_interfaces())
    }

    fn add_feature(&mut self, feature: &dyn Feature, sink: &mut BucketBuffers) -> Result<(), BucketError> {
        let points: Vec<Point> = feature
            .load_geometry()
            .flatten()
            .filter(|p| in_extent(*p))
            .collect();
        if points.is_empty() {
            return Ok(());
        }

        sink.make_room_for(INTERFACE, points.len() * CORNERS.len())?;
        for p in points {
            let mut quad = [0u32; 4];
            for (slot, (ex, ey)) in quad.iter_mut().zip(CORNERS) {
                *slot = sink.add_vertex(INTERFACE, &[p.x as f64, p.y as f64, ex, ey])?;
            }
            sink.add_element(INTERFACE, &[quad[0], quad[1], quad[2]])?;
            sink.add_element(INTERFACE, &[quad[0], quad[3], quad[2]])?;
        }
        Ok(())
    }
}

#[inline]
fn in_extent(p: Point) -> bool {
    (0.0..EXTENT).contains(&p.x) && (0.0..EXTENT).contains(&p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BucketConfig;
    use crate::geometry::VectorFeature;
    use crate::schema::BufferRole;

    fn sink() -> BucketBuffers {
        let emitter = CircleEmitter::default();
        BucketBuffers::new(emitter.compiled_schema().unwrap(), &BucketConfig::default()).unwrap()
    }

    #[test]
    fn point_becomes_quad() {
        let mut s = sink();
        CircleEmitter::default()
            .add_feature(&VectorFeature::point(10.0, 20.0), &mut s)
            .unwrap();

        let vertices = s.buffer(INTERFACE, BufferRole::Vertex).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices.get(0).unwrap().get("pos"), Some(&[20.0, 40.0][..]));
        assert_eq!(vertices.get(2).unwrap().get("pos"), Some(&[21.0, 41.0][..]));

        let elements = s.buffer(INTERFACE, BufferRole::Element).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements.get(1).unwrap().get("vertices"), Some(&[0.0, 3.0, 2.0][..]));
    }

    #[test]
    fn points_outside_extent_are_skipped() {
        let mut s = sink();
        let feature = VectorFeature::new(
            crate::geometry::GeometryKind::Point,
            vec![vec![Point::new(-1.0, 5.0), Point::new(5.0, 5.0), Point::new(5.0, EXTENT)]],
        );
        CircleEmitter::default().add_feature(&feature, &mut s).unwrap();
        assert_eq!(s.buffer(INTERFACE, BufferRole::Vertex).unwrap().len(), 4);
    }

    #[test]
    fn empty_feature_opens_no_group() {
        let mut s = sink();
        CircleEmitter::default()
            .add_feature(&VectorFeature::point(f32::NAN, 0.0), &mut s)
            .unwrap();
        assert!(s.element_groups(INTERFACE).is_empty());
    }
}
