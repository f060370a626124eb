#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
//! Flattens an analytics surface over a synthetic blast pattern to a PNG.
//!
//! Usage: `cargo run --example flatten_demo -- [model] [output.png]`
//!
//! Lays out a staggered 8 x 12 pattern at UTM-scale coordinates, fires it
//! row by row, shades a padded plane with the chosen model and writes the
//! north-up raster.

use blastfield::*;

const ORIGIN_EASTING: f64 = 478_200.0;
const ORIGIN_NORTHING: f64 = 6_912_450.0;
const BENCH_RL: f64 = 310.0;

/// Staggered pattern with 3.5 m burden and 4 m spacing.
fn blast_pattern() -> Vec<HoleRecord> {
    let (rows, columns) = (8, 12);
    let (burden, spacing) = (3.5, 4.0);
    let mut holes = Vec::with_capacity(rows * columns);

    for row in 0..rows {
        let stagger = if row % 2 == 0 { 0.0 } else { spacing * 0.5 };
        for col in 0..columns {
            let x = ORIGIN_EASTING + col as f64 * spacing + stagger;
            let y = ORIGIN_NORTHING + row as f64 * burden;
            let collar = DVec3::new(x, y, BENCH_RL);
            let toe = DVec3::new(x, y, BENCH_RL - 11.0);
            let hole = HoleRecord::new(format!("R{}-{:02}", row + 1, col + 1), collar, toe, 115.0)
                .with_deck(ChargeDeck {
                    top_depth: 3.5,
                    base_depth: 11.0,
                    mass_kg: 72.0 + (col % 3) as f64 * 4.0,
                    fire_time_ms: row as f64 * 42.0 + col as f64 * 17.0,
                });
            holes.push(hole);
        }
    }
    holes
}

fn main() {
    init_logging();

    let mut args = std::env::args().skip(1);
    let model = args.next().unwrap_or_else(|| "ppv".to_string());
    let output = args.next().unwrap_or_else(|| format!("{model}.png"));

    let mut engine = match AnalyticsEngine::new_headless(EngineOptions::default()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("No GPU adapter available, nothing to render: {e}");
            return;
        }
    };

    println!("Available models:");
    for info in engine.get_available_models() {
        println!("  {:<18} {} ({})", info.name, info.display_name, info.unit);
    }

    if let Err(e) = engine.set_model(&model, &ModelParams::new()) {
        eprintln!("Cannot select '{model}': {e}");
        return;
    }

    let holes = blast_pattern();
    engine.update(&holes, None).expect("Failed to encode holes");

    let plan = Bounds2::from_points(holes.iter().map(|h| h.collar)).expect("pattern has holes");

    let mesh = engine
        .build_plane(&plan, BENCH_RL, Some(30.0))
        .expect("Failed to build plane");
    println!(
        "Plane: {} triangles around ({:.1}, {:.1})",
        mesh.triangle_count, mesh.world_offset.0.x, mesh.world_offset.0.y
    );

    let raster = engine
        .flatten(&mesh.world_bounds, Some(4.0))
        .expect("Failed to flatten");
    raster.save(&output).expect("Failed to save raster");
    println!(
        "Wrote {output}: {}x{} at {:.2} px/m",
        raster.width, raster.height, raster.pixels_per_metre
    );

    engine.dispose();
}
