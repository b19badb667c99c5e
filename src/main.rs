// src/main.rs
//
// Offline replay: feeds a file of preprocessed frames (little-endian f32,
// `model.frame_size` floats per frame) through the ONNX model and writes
// every published event to stdout as JSON lines.
//
// Usage: modeld <frames.bin> [config.yaml]

use anyhow::{bail, ensure, Context, Result};
use modeld::config::{init_logging, Config};
use modeld::inference::OrtRunner;
use modeld::pipeline::{CameraFrame, FrameDriver, JsonLinesPublisher};
use std::io::{self, BufWriter};
use tracing::info;

/// Capture timestamps are synthesised at the camera's 20 Hz.
const FRAME_INTERVAL_NS: u64 = 50_000_000;

fn read_frames(path: &str, frame_size: usize) -> Result<Vec<f32>> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read frames {}", path))?;
    let frame_bytes = frame_size * 4;
    ensure!(
        !bytes.is_empty() && bytes.len() % frame_bytes == 0,
        "{} is {} bytes, not a whole number of {}-float frames",
        path,
        bytes.len(),
        frame_size
    );
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(frames_path) = args.next() else {
        bail!("usage: modeld <frames.bin> [config.yaml]");
    };
    let config_path = args.next().unwrap_or_else(|| "config.yaml".to_string());

    let config = Config::load(&config_path)?;
    init_logging(&config.logging);
    info!("🚗 Driving model replay starting");
    info!("✓ Configuration loaded from {}", config_path);

    let frames = read_frames(&frames_path, config.model.frame_size)?;
    let frame_count = frames.len() / config.model.frame_size;
    info!("Found {} frame(s) in {}", frame_count, frames_path);

    let runner = OrtRunner::new(&config.model)?;
    let stdout = BufWriter::new(io::stdout().lock());
    let mut driver = FrameDriver::new(&config, runner, JsonLinesPublisher::new(stdout))?;

    for (idx, features) in frames.chunks_exact(config.model.frame_size).enumerate() {
        let frame_id = idx as u32;
        let frame = CameraFrame {
            frame_id,
            timestamp_eof: idx as u64 * FRAME_INTERVAL_NS,
            features,
        };
        driver
            .process_frame(frame, frame_id, None)
            .with_context(|| format!("Frame {} failed", frame_id))?;
    }

    let stats = driver.metrics();
    info!("\n✓ Replay finished");
    info!("  Frames processed: {}", stats.frames_processed);
    info!("  Events published: {}", stats.events_published);
    info!("  Peak execution: {:.2}ms", stats.peak_execution_us as f64 / 1000.0);
    info!("  Processing Speed: {:.1} FPS", stats.fps);
    Ok(())
}
