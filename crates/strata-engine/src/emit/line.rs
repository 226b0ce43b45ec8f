use std::sync::Arc;

use crate::bucket::BucketBuffers;
use crate::buffer::AttributeType;
use crate::error::BucketError;
use crate::geometry::{Feature, Point};
use crate::schema::{AttributeDecl, CompiledSchema, IndexWidth, ShaderInterface};

use super::{GeometryEmitter, SchemaCache};

const INTERFACE: &str = "line";

static SCHEMAS: SchemaCache = SchemaCache::new();

/// Emits an extruded triangle strip per line string.
///
/// Every point produces two vertices sharing its position, extruded along
/// `+normal` and `-normal`. The normal at a joint is the normalized average of
/// the adjacent segment normals; at a full reversal it falls back to the
/// incoming segment's normal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEmitter {
    index_width: IndexWidth,
}

impl LineEmitter {
    pub fn new(index_width: IndexWidth) -> Self {
        Self { index_width }
    }

    fn add_line(&self, points: &[Point], sink: &mut BucketBuffers) -> Result<(), BucketError> {
        sink.make_room_for(INTERFACE, points.len() * 2)?;

        let mut prev: Option<(u32, u32)> = None;
        for (i, &p) in points.iter().enumerate() {
            let n = joint_normal(points, i);
            let left = sink.add_vertex(INTERFACE, &vertex_args(p, n))?;
            let right = sink.add_vertex(INTERFACE, &vertex_args(p, -n))?;
            if let Some((prev_left, prev_right)) = prev {
                sink.add_element(INTERFACE, &[prev_left, prev_right, left])?;
                sink.add_element(INTERFACE, &[prev_right, right, left])?;
            }
            prev = Some((left, right));
        }
        Ok(())
    }
}

impl GeometryEmitter for LineEmitter {
    fn shader_interfaces(&self) -> Vec<ShaderInterface> {
        vec![
            ShaderInterface::new(INTERFACE)
                .args(["x", "y", "nx", "ny"])
                .attribute(
                    AttributeDecl::new("pos")
                        .components(2)
                        .ty(AttributeType::Short)
                        .value(["x", "y"]),
                )
                .attribute(
                    AttributeDecl::new("extrude")
                        .components(2)
                        .ty(AttributeType::Byte)
                        .value(["round(nx * 63)", "round(ny * 63)"]),
                )
                .element(3)
                .index_width(self.index_width),
        ]
    }

    fn compiled_schema(&self) -> Result<Arc<CompiledSchema>, BucketError> {
        SCHEMAS.get_or_compile(self.index_width, || self.shader_interfaces())
    }

    fn add_feature(&mut self, feature: &dyn Feature, sink: &mut BucketBuffers) -> Result<(), BucketError> {
        for ring in feature.load_geometry() {
            let mut points = ring;
            points.dedup();
            if points.len() < 2 {
                continue;
            }
            self.add_line(&points, sink)?;
        }
        Ok(())
    }
}

#[inline]
fn vertex_args(p: Point, n: Point) -> [f64; 4] {
    [p.x as f64, p.y as f64, n.x as f64, n.y as f64]
}

fn segment_normal(a: Point, b: Point) -> Point {
    (b - a).normalized().perp()
}

fn joint_normal(points: &[Point], i: usize) -> Point {
    let incoming = (i > 0).then(|| segment_normal(points[i - 1], points[i]));
    let outgoing = points.get(i + 1).map(|&next| segment_normal(points[i], next));
    match (incoming, outgoing) {
        (Some(a), Some(b)) => {
            let avg = (a + b).normalized();
            if avg == Point::zero() { a } else { avg }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => Point::zero(),
    }
}
