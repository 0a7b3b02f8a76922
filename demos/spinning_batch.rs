//! Headless spinning batch
//!
//! Drives a transparent batch for a few seconds' worth of frames and logs what
//! a renderer would receive.
//!
//! ```text
//! RUST_LOG=info cargo run --example spinning_batch -- [settings.json]
//! ```

use batched_scene::renderer::{DrawBatch, FrameDriver, Renderer};
use batched_scene::scene::BatchedScene;
use batched_scene::settings::BatchSettings;
use log::info;

/// Stands in for a GPU renderer: remembers the nearest and farthest draw.
#[derive(Default)]
struct StatsRenderer {
    draws: usize,
    first_depth: f32,
    last_depth: f32,
}

impl Renderer for StatsRenderer {
    fn draw(&mut self, batch: &DrawBatch<'_>) {
        self.draws += batch.len();
        if let (Some(first), Some(last)) = (batch.order.first(), batch.order.last()) {
            self.first_depth = first.depth;
            self.last_depth = last.depth;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => BatchSettings::from_json_str(&std::fs::read_to_string(path)?)?,
        None => BatchSettings {
            count: 10_000,
            dynamic_count: 1_000,
            opacity: 0.6,
            diagnostics: true,
            ..Default::default()
        },
    };

    let scene = BatchedScene::new(settings)?;
    let mut driver = FrameDriver::with_orbit_camera(scene, 16.0 / 9.0);
    let mut renderer = StatsRenderer::default();

    for _ in 0..300 {
        let stats = driver.tick(&mut renderer);
        if stats.frame % 60 == 0 {
            info!(
                "frame {}: drew {} (culled {}), depth {:.2} -> {:.2}",
                stats.frame, stats.drawn, stats.culled, renderer.first_depth, renderer.last_depth
            );
        }
    }

    info!("{} instance draws over {} frames", renderer.draws, driver.frame());
    driver.shutdown();
    Ok(())
}
