use super::Point;

/// One ring (or line string, or point cluster) of a feature's geometry.
pub type Ring = Vec<Point>;

/// Geometry kind reported by a decoded tile feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
}

/// A decoded tile feature.
///
/// `load_geometry` yields rings lazily; emitters consume the iterator once
/// per `add_feature` call and never restart it.
pub trait Feature {
    fn kind(&self) -> GeometryKind;

    fn load_geometry(&self) -> Box<dyn Iterator<Item = Ring> + '_>;
}

/// Owned feature handle stored by a bucket. `Send + Sync` so a populated
/// bucket can move to the rendering thread.
pub type BoxedFeature = Box<dyn Feature + Send + Sync>;

/// In-memory feature with eagerly decoded rings.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeature {
    pub kind: GeometryKind,
    pub rings: Vec<Ring>,
}

impl VectorFeature {
    pub fn new(kind: GeometryKind, rings: Vec<Ring>) -> Self {
        Self { kind, rings }
    }

    /// Single-point feature.
    pub fn point(x: f32, y: f32) -> Self {
        Self::new(GeometryKind::Point, vec![vec![Point::new(x, y)]])
    }

    pub fn line(points: impl IntoIterator<Item = Point>) -> Self {
        Self::new(GeometryKind::LineString, vec![points.into_iter().collect()])
    }

    pub fn polygon(rings: Vec<Ring>) -> Self {
        Self::new(GeometryKind::Polygon, rings)
    }

    pub fn boxed(self) -> BoxedFeature {
        Box::new(self)
    }
}

impl Feature for VectorFeature {
    fn kind(&self) -> GeometryKind {
        self.kind
    }

    fn load_geometry(&self) -> Box<dyn Iterator<Item = Ring> + '_> {
        Box::new(self.rings.iter().cloned())
    }
}
