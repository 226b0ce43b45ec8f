use strata_engine::bucket::{Bucket, BucketBuffers};
use strata_engine::buffer::{AttributeType, BufferType, Record};
use strata_engine::config::BucketConfig;
use strata_engine::emit::GeometryEmitter;
use strata_engine::error::BucketError;
use strata_engine::geometry::{Feature, Point, VectorFeature};
use strata_engine::gpu;
use strata_engine::layer::{LayerType, StyleLayer, Visibility};
use strata_engine::logging::{LoggingConfig, init_logging};
use strata_engine::schema::{AttributeDecl, BufferRole, IndexWidth, ShaderInterface};

// ── fixtures ──────────────────────────────────────────────────────────────

/// Writes one vertex, a fixed triangle, and the point itself as a segment.
struct TestEmitter;

impl GeometryEmitter for TestEmitter {
    fn shader_interfaces(&self) -> Vec<ShaderInterface> {
        vec![
            ShaderInterface::new("test")
                .args(["x", "y"])
                .attribute(AttributeDecl::new("map").value(["x"]))
                .attribute(
                    AttributeDecl::new("box")
                        .components(2)
                        .ty(AttributeType::Short)
                        .value(["x * 2", "y * 2"]),
                )
                .element(3)
                .second_element(2),
        ]
    }

    fn add_feature(&mut self, feature: &dyn Feature, sink: &mut BucketBuffers) -> Result<(), BucketError> {
        sink.make_room_for("test", 1)?;
        let point = feature
            .load_geometry()
            .next()
            .and_then(|ring| ring.first().copied())
            .unwrap_or_default();
        sink.add_vertex("test", &[point.x as f64, point.y as f64])?;
        sink.add_element("test", &[1, 2, 3])?;
        sink.add_second_element("test", &[point.x as u32, point.y as u32])?;
        Ok(())
    }
}

/// Writes one vertex and the triangle `(0, 0, x)`, so `x > 0` names a vertex
/// that does not exist yet.
struct FanEmitter;

impl GeometryEmitter for FanEmitter {
    fn shader_interfaces(&self) -> Vec<ShaderInterface> {
        TestEmitter.shader_interfaces()
    }

    fn add_feature(&mut self, feature: &dyn Feature, sink: &mut BucketBuffers) -> Result<(), BucketError> {
        let point = feature
            .load_geometry()
            .next()
            .and_then(|ring| ring.first().copied())
            .unwrap_or_default();
        sink.make_room_for("test", 1)?;
        sink.add_vertex("test", &[point.x as f64, point.y as f64])?;
        sink.add_element("test", &[0, 0, point.x as u32])?;
        Ok(())
    }
}

fn create() -> Bucket {
    init_logging(LoggingConfig::default().for_tests());
    Bucket::with_emitter(
        StyleLayer::new("test", LayerType::Circle),
        BucketConfig::default(),
        Box::new(TestEmitter),
    )
    .unwrap()
}

fn record(bucket: &Bucket, role: BufferRole, index: usize) -> Record {
    bucket.buffer("test", role).unwrap().get(index).unwrap()
}

fn assert_single_population(bucket: &Bucket) {
    let vertex = bucket.buffer("test", BufferRole::Vertex).unwrap();
    assert_eq!(vertex.buffer_type(), BufferType::Vertex);
    assert_eq!(vertex.len(), 1);
    let v = record(bucket, BufferRole::Vertex, 0);
    assert_eq!(v.get("map"), Some(&[17.0][..]));
    assert_eq!(v.get("box"), Some(&[34.0, 84.0][..]));

    let element = bucket.buffer("test", BufferRole::Element).unwrap();
    assert_eq!(element.buffer_type(), BufferType::Element);
    assert_eq!(element.len(), 1);
    assert_eq!(record(bucket, BufferRole::Element, 0).get("vertices"), Some(&[1.0, 2.0, 3.0][..]));

    let second = bucket.buffer("test", BufferRole::SecondElement).unwrap();
    assert_eq!(second.buffer_type(), BufferType::Element);
    assert_eq!(second.len(), 1);
    assert_eq!(
        record(bucket, BufferRole::SecondElement, 0).get("vertices"),
        Some(&[17.0, 42.0][..])
    );
}

// ── population protocol ───────────────────────────────────────────────────

#[test]
fn add_features() {
    let mut bucket = create();
    bucket.set_features(vec![VectorFeature::point(17.0, 42.0).boxed()]);
    let report = bucket.populate_buffers().unwrap();

    assert_eq!(report.added, 1);
    assert!(report.is_clean());
    assert_single_population(&bucket);
    assert_eq!(bucket.buffer("test", BufferRole::Vertex).unwrap().label(), "testVertex");
}

#[test]
fn reset_buffers() {
    let mut bucket = create();
    bucket.set_features(vec![VectorFeature::point(17.0, 42.0).boxed()]);
    bucket.populate_buffers().unwrap();

    let capacity = bucket.buffer("test", BufferRole::Vertex).unwrap().capacity();
    bucket.create_buffers();

    for role in BufferRole::ALL {
        assert_eq!(bucket.buffer("test", role).unwrap().len(), 0);
    }
    assert_eq!(bucket.element_groups("test").len(), 0);
    assert_eq!(bucket.buffer("test", BufferRole::Vertex).unwrap().capacity(), capacity);
    assert!(bucket.buffer("test", BufferRole::Vertex).unwrap().get(0).is_err());
}

#[test]
fn reset_before_first_populate() {
    let mut bucket = create();
    bucket.create_buffers();

    for role in BufferRole::ALL {
        assert_eq!(bucket.buffer("test", role).unwrap().len(), 0);
    }
    assert!(bucket.element_groups("test").is_empty());

    bucket.set_features(vec![VectorFeature::point(17.0, 42.0).boxed()]);
    bucket.populate_buffers().unwrap();
    assert_single_population(&bucket);
}

#[test]
fn add_features_after_resetting_buffers() {
    let mut bucket = create();
    bucket.set_features(vec![VectorFeature::point(1.0, 5.0).boxed()]);
    bucket.populate_buffers().unwrap();
    bucket.create_buffers();
    bucket.set_features(vec![VectorFeature::point(17.0, 42.0).boxed()]);
    bucket.populate_buffers().unwrap();

    assert_single_population(&bucket);
    assert_eq!(bucket.element_groups("test").len(), 1);
}

#[test]
fn populate_appends_without_reset() {
    let mut bucket = create();
    bucket.set_features(vec![
        VectorFeature::point(1.0, 5.0).boxed(),
        VectorFeature::point(17.0, 42.0).boxed(),
    ]);
    bucket.populate_buffers().unwrap();

    assert_eq!(bucket.buffer("test", BufferRole::Vertex).unwrap().len(), 2);
    assert_eq!(record(&bucket, BufferRole::Vertex, 1).get("box"), Some(&[34.0, 84.0][..]));
    assert_eq!(bucket.element_groups("test")[0].vertex_length, 2);
}

#[test]
fn layout_properties() {
    let mut bucket = create();
    assert!(bucket.layer().layout.is_none());
    bucket.create_style_layer();
    let layout = bucket.layer().layout.as_ref().unwrap();
    assert_eq!(layout.visibility, Visibility::Visible);
    assert_eq!(layout.visibility.as_str(), "visible");
}

// ── built-in emitters ─────────────────────────────────────────────────────

fn square(origin: f32, size: f32) -> Vec<Point> {
    vec![
        Point::new(origin, origin),
        Point::new(origin + size, origin),
        Point::new(origin + size, origin + size),
        Point::new(origin, origin + size),
    ]
}

#[test]
fn unsupported_layer_type() {
    let err = Bucket::new(StyleLayer::new("labels", LayerType::Symbol), BucketConfig::default()).unwrap_err();
    assert_eq!(err, BucketError::UnsupportedLayer(LayerType::Symbol));
}

#[test]
fn circle_groups_split_at_ceiling() {
    let mut bucket = Bucket::new(StyleLayer::new("dots", LayerType::Circle), BucketConfig::default()).unwrap();
    // 16 384 quads fill one u16 group exactly; the next one opens a second.
    let features = (0..16_385)
        .map(|i| VectorFeature::point((i % 4000) as f32, (i / 4000) as f32).boxed())
        .collect();
    bucket.set_features(features);
    let report = bucket.populate_buffers().unwrap();
    assert_eq!(report.added, 16_385);

    let groups = bucket.element_groups("circle");
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].vertex_length, 65_536);
    assert_eq!(groups[1].vertex_start, 65_536);
    assert_eq!(groups[1].vertex_length, 4);

    let elements = bucket.buffer("circle", BufferRole::Element).unwrap();
    let last = elements.get(elements.len() - 1).unwrap();
    assert_eq!(last.get("vertices"), Some(&[0.0, 3.0, 2.0][..]));

    let interface = &bucket.interfaces()[0];
    let segments = gpu::draw_segments(interface, groups).unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].base_vertex, 65_536);
    assert_eq!(segments[1].indices, 98_304..98_310);
}

#[test]
fn oversized_feature_is_skipped() {
    let mut bucket = Bucket::new(StyleLayer::new("land", LayerType::Fill), BucketConfig::default()).unwrap();
    let huge: Vec<Point> = (0..70_000).map(|i| Point::new(i as f32, (i % 2) as f32)).collect();
    bucket.set_features(vec![
        VectorFeature::polygon(vec![square(0.0, 10.0)]).boxed(),
        VectorFeature::polygon(vec![huge]).boxed(),
        VectorFeature::polygon(vec![square(20.0, 10.0)]).boxed(),
    ]);
    let report = bucket.populate_buffers().unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 1);
    assert!(matches!(report.skipped[0].error, BucketError::CapacityOverflow { requested: 70_000, .. }));
    assert_eq!(bucket.buffer("fill", BufferRole::Vertex).unwrap().len(), 8);
}

#[test]
fn skipped_polygon_leaves_no_partial_rings() {
    let mut bucket = Bucket::new(StyleLayer::new("land", LayerType::Fill), BucketConfig::default()).unwrap();
    let huge: Vec<Point> = (0..70_000).map(|i| Point::new(i as f32, (i % 2) as f32)).collect();
    bucket.set_features(vec![
        VectorFeature::polygon(vec![square(0.0, 10.0), huge]).boxed(),
        VectorFeature::polygon(vec![square(20.0, 10.0)]).boxed(),
    ]);
    let report = bucket.populate_buffers().unwrap();

    assert_eq!(report.added, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 0);
    assert_eq!(bucket.buffer("fill", BufferRole::Vertex).unwrap().len(), 4);
    assert_eq!(bucket.buffer("fill", BufferRole::Element).unwrap().len(), 2);
    assert_eq!(bucket.buffer("fill", BufferRole::SecondElement).unwrap().len(), 4);

    let groups = bucket.element_groups("fill");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].vertex_start, 0);
    assert_eq!(groups[0].vertex_length, 4);
    let first = bucket.buffer("fill", BufferRole::Vertex).unwrap().get(0).unwrap();
    assert_eq!(first.get("pos"), Some(&[20.0, 20.0][..]));
}

#[test]
fn skipped_line_leaves_no_partial_strings() {
    let mut bucket = Bucket::new(StyleLayer::new("roads", LayerType::Line), BucketConfig::default()).unwrap();
    let long: Vec<Point> = (0..40_000).map(|i| Point::new(i as f32, 0.0)).collect();
    bucket.set_features(vec![
        VectorFeature::new(
            strata_engine::geometry::GeometryKind::LineString,
            vec![vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)], long],
        )
        .boxed(),
    ]);
    let report = bucket.populate_buffers().unwrap();

    assert_eq!(report.skipped.len(), 1);
    for role in [BufferRole::Vertex, BufferRole::Element] {
        assert_eq!(bucket.buffer("line", role).unwrap().len(), 0);
    }
    assert!(bucket.element_groups("line").is_empty());
}

#[test]
fn out_of_range_operand_skips_only_that_feature() {
    init_logging(LoggingConfig::default().for_tests());
    let config = BucketConfig::default().with_element_operand_checks(true);
    let mut bucket =
        Bucket::with_emitter(StyleLayer::new("test", LayerType::Circle), config, Box::new(FanEmitter)).unwrap();
    bucket.set_features(vec![
        VectorFeature::point(0.0, 1.0).boxed(),
        VectorFeature::point(5.0, 2.0).boxed(),
        VectorFeature::point(0.0, 3.0).boxed(),
    ]);
    let report = bucket.populate_buffers().unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 1);
    assert!(matches!(
        report.skipped[0].error,
        BucketError::OutOfRange { index: 5, length: 2, .. }
    ));

    // The skipped feature's vertex is gone, so the third one reuses its slot.
    assert_eq!(bucket.buffer("test", BufferRole::Vertex).unwrap().len(), 2);
    assert_eq!(record(&bucket, BufferRole::Vertex, 1).get("box"), Some(&[0.0, 6.0][..]));
    assert_eq!(bucket.buffer("test", BufferRole::Element).unwrap().len(), 2);
    assert_eq!(bucket.element_groups("test")[0].element_length, 2);
}

#[test]
fn abort_on_feature_error() {
    let config = BucketConfig::default().with_abort_on_feature_error(true);
    let mut bucket = Bucket::new(StyleLayer::new("land", LayerType::Fill), config).unwrap();
    let huge: Vec<Point> = (0..70_000).map(|i| Point::new(i as f32, (i % 2) as f32)).collect();
    bucket.set_features(vec![
        VectorFeature::polygon(vec![square(0.0, 10.0)]).boxed(),
        VectorFeature::polygon(vec![huge]).boxed(),
    ]);

    let err = bucket.populate_buffers().unwrap_err();
    assert!(matches!(err, BucketError::CapacityOverflow { .. }));
    assert_eq!(bucket.buffer("fill", BufferRole::Vertex).unwrap().len(), 4);
}

#[test]
fn u32_width_keeps_one_group() {
    let config = BucketConfig::default().with_index_width(IndexWidth::U32);
    let mut bucket = Bucket::new(StyleLayer::new("land", LayerType::Fill), config).unwrap();
    let big: Vec<Point> = (0..70_000).map(|i| Point::new(i as f32, (i % 2) as f32)).collect();
    bucket.set_features(vec![VectorFeature::polygon(vec![big]).boxed()]);

    let report = bucket.populate_buffers().unwrap();
    assert!(report.is_clean());
    assert_eq!(bucket.element_groups("fill").len(), 1);
    assert_eq!(gpu::index_format(bucket.interfaces()[0].index_width()), wgpu::IndexFormat::Uint32);
}

#[test]
fn line_layer_resolves_defaults() {
    let mut bucket = Bucket::new(
        StyleLayer::new("roads", LayerType::Line).with_layout_property("visibility", "none"),
        BucketConfig::default(),
    )
    .unwrap();
    bucket.set_features(vec![
        VectorFeature::line([Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 50.0)]).boxed(),
    ]);
    bucket.populate_buffers().unwrap();
    assert_eq!(bucket.buffer("line", BufferRole::Vertex).unwrap().len(), 6);
    assert_eq!(bucket.buffer("line", BufferRole::Element).unwrap().len(), 4);

    let layout = bucket.create_style_layer();
    assert_eq!(layout.visibility, Visibility::None);
    assert!(layout.get("line-join").is_some());
}

#[test]
fn populated_bucket_moves_across_threads() {
    let mut bucket = Bucket::new(StyleLayer::new("dots", LayerType::Circle), BucketConfig::default()).unwrap();
    bucket.set_features(vec![VectorFeature::point(1.0, 1.0).boxed()]);
    bucket.populate_buffers().unwrap();

    let handle = std::thread::spawn(move || {
        let buffers = bucket.into_buffers();
        buffers.buffer("circle", BufferRole::Vertex).map(|b| b.as_bytes().len())
    });
    assert_eq!(handle.join().unwrap(), Some(16));
}
