// src/pipeline/metrics.rs
//
// Daemon observability. Counters and timings for the frame loop plus the
// filtered frame-drop ratio that is published with every model record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Frames before the drop filter is allowed to leave zero.
pub const DROP_WARMUP_FRAMES: u32 = 10;
/// Per-frame dropped count is clamped before filtering.
pub const MAX_COUNTED_DROPS: u32 = 10;
const DROP_FILTER_K: f32 = 0.05;

#[derive(Debug, Clone)]
pub struct ModelMetrics {
    pub frames_processed: Arc<AtomicU64>,
    pub frames_dropped: Arc<AtomicU64>,
    pub events_published: Arc<AtomicU64>,
    pub publish_failures: Arc<AtomicU64>,
    pub execution_time_us: Arc<AtomicU64>,
    pub peak_execution_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            frames_processed: Arc::new(AtomicU64::new(0)),
            frames_dropped: Arc::new(AtomicU64::new(0)),
            events_published: Arc::new(AtomicU64::new(0)),
            publish_failures: Arc::new(AtomicU64::new(0)),
            execution_time_us: Arc::new(AtomicU64::new(0)),
            peak_execution_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_execution(&self, duration_us: u64) {
        self.execution_time_us.store(duration_us, Ordering::Relaxed);
        self.peak_execution_time_us
            .fetch_max(duration_us, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.frames_processed.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            fps: self.fps(),
            last_execution_us: self.execution_time_us.load(Ordering::Relaxed),
            peak_execution_us: self.peak_execution_time_us.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub events_published: u64,
    pub publish_failures: u64,
    pub fps: f64,
    pub last_execution_us: u64,
    pub peak_execution_us: u64,
    pub elapsed_secs: f64,
}

// ============================================================================
// FRAME DROP FILTER
// ============================================================================

/// Result of observing one camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropSample {
    /// Frames skipped since the previously processed one.
    pub dropped: u32,
    /// Filtered drop ratio in [0, 1).
    pub ratio: f32,
}

#[derive(Debug, Clone, Default)]
pub struct FrameDropTracker {
    last_frame_id: Option<u32>,
    filtered: f32,
    run_count: u32,
}

impl FrameDropTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, frame_id: u32) -> DropSample {
        let dropped = match self.last_frame_id {
            Some(last) => frame_id.saturating_sub(last).saturating_sub(1),
            None => 0,
        };
        if dropped > 0 {
            warn!("⚠️  {} frame(s) dropped before frame {}", dropped, frame_id);
        }
        self.last_frame_id = Some(frame_id);

        self.filtered = (1.0 - DROP_FILTER_K) * self.filtered
            + DROP_FILTER_K * dropped.min(MAX_COUNTED_DROPS) as f32;
        if self.run_count < DROP_WARMUP_FRAMES {
            self.filtered = 0.0;
        }
        self.run_count = self.run_count.saturating_add(1);

        DropSample {
            dropped,
            ratio: self.filtered / (1.0 + self.filtered),
        }
    }
}
