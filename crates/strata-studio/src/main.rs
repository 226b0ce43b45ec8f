use anyhow::{Context, Result};
use strata_engine::bucket::Bucket;
use strata_engine::config::BucketConfig;
use strata_engine::geometry::{BoxedFeature, EXTENT, Point, VectorFeature};
use strata_engine::gpu::{self, VertexLayoutDesc};
use strata_engine::layer::{LayerType, StyleLayer};
use strata_engine::logging::{LoggingConfig, init_logging};
use strata_engine::schema::BufferRole;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║         STRATA BUCKET STUDIO v0.1      ║");
    println!("  ║   tile geometry  ·  wgpu-ready buffers ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    let config = BucketConfig::default();

    // ── circles ───────────────────────────────────────────────────────────
    let dots = (0..20_000)
        .map(|i| {
            let x = (i % 200) as f32 * (EXTENT / 200.0);
            let y = (i / 200) as f32 * (EXTENT / 100.0);
            VectorFeature::point(x, y).boxed()
        })
        .collect();
    run(StyleLayer::new("pois", LayerType::Circle), &config, dots)?;

    // ── lines ─────────────────────────────────────────────────────────────
    let roads = (0..64)
        .map(|i| {
            let y = i as f32 * 64.0;
            VectorFeature::line((0..=32).map(|j| {
                let x = j as f32 * 128.0;
                Point::new(x, y + if j % 2 == 0 { 0.0 } else { 32.0 })
            }))
            .boxed()
        })
        .collect();
    run(
        StyleLayer::new("roads", LayerType::Line).with_layout_property("line-cap", "round"),
        &config,
        roads,
    )?;

    // ── fills ─────────────────────────────────────────────────────────────
    let mut land: Vec<BoxedFeature> = vec![
        VectorFeature::polygon(vec![circle_ring(2048.0, 2048.0, 1800.0, 60_000)]).boxed(),
        VectorFeature::polygon(vec![
            circle_ring(1024.0, 1024.0, 512.0, 10_000),
            circle_ring(1024.0, 1024.0, 128.0, 64),
        ])
        .boxed(),
    ];
    // Cannot fit in any u16 group; reported and skipped.
    land.push(VectorFeature::polygon(vec![circle_ring(2048.0, 2048.0, 2000.0, 70_000)]).boxed());
    run(StyleLayer::new("land", LayerType::Fill), &config, land)?;

    Ok(())
}

fn run(layer: StyleLayer, config: &BucketConfig, features: Vec<BoxedFeature>) -> Result<()> {
    let id = layer.id.clone();
    let mut bucket =
        Bucket::new(layer, config.clone()).with_context(|| format!("creating bucket for layer '{id}'"))?;
    bucket.set_features(features);

    let report = bucket
        .populate_buffers()
        .with_context(|| format!("populating layer '{id}'"))?;
    let visibility = bucket.create_style_layer().visibility;

    println!("  [{}] {} layer, {}", id, bucket.layer().ty.as_str(), visibility.as_str());
    println!("    features   >  {} added, {} skipped", report.added, report.skipped.len());
    for skipped in &report.skipped {
        println!("    skipped    >  #{}: {}", skipped.index, skipped.error);
    }

    for interface in bucket.interfaces() {
        let name = interface.name();
        let vertex = VertexLayoutDesc::from_interface(interface, 0)?;
        println!(
            "    {:<10} >  stride {} B, {} attribute(s), {:?} indices",
            name,
            vertex.array_stride,
            vertex.attributes.len(),
            gpu::index_format(interface.index_width())
        );

        for role in BufferRole::ALL {
            if let Some(buffer) = bucket.buffer(name, role) {
                println!(
                    "    {:<18} {:>8} records  {:>9} bytes",
                    buffer.label(),
                    buffer.len(),
                    buffer.as_bytes().len()
                );
            }
        }

        let segments = gpu::draw_segments(interface, bucket.element_groups(name))?;
        for (i, segment) in segments.iter().enumerate() {
            println!(
                "    draw {:<3} base {:>7}  indices {:?}  outline {:?}",
                i, segment.base_vertex, segment.indices, segment.second_indices
            );
        }
    }
    println!();

    let groups: usize = bucket
        .interfaces()
        .iter()
        .map(|i| bucket.element_groups(i.name()).len())
        .sum();
    log::info!("layer '{}' ready: {} group(s)", id, groups);
    Ok(())
}

/// Closed ring approximating a circle with `n` points.
fn circle_ring(cx: f32, cy: f32, r: f32, n: usize) -> Vec<Point> {
    let mut ring: Vec<Point> = (0..n)
        .map(|i| {
            let a = i as f32 / n as f32 * std::f32::consts::TAU;
            Point::new(cx + r * a.cos(), cy + r * a.sin())
        })
        .collect();
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    ring
}
