// src/pipeline/driver.rs
//
// Per-frame host loop body. Strict order, no overlap:
//   drop accounting → eval (pulse, window, recurrent, inference)
//   → decode + publish model/modelV2 → publish cameraOdometry

use crate::config::Config;
use crate::inference::ModelRunner;
use crate::pipeline::metrics::{FrameDropTracker, MetricsSummary, ModelMetrics};
use crate::pipeline::model_state::ModelState;
use crate::pipeline::publisher::{FrameInfo, FramePublisher, Publisher};
use anyhow::Result;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One preprocessed camera frame as delivered by the capture side.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame<'a> {
    pub frame_id: u32,
    pub timestamp_eof: u64,
    pub features: &'a [f32],
}

pub struct FrameDriver<R: ModelRunner, P: Publisher> {
    state: ModelState<R>,
    publisher: FramePublisher,
    transport: P,
    drops: FrameDropTracker,
    metrics: ModelMetrics,
}

impl<R: ModelRunner, P: Publisher> FrameDriver<R, P> {
    pub fn new(config: &Config, runner: R, transport: P) -> Result<Self> {
        let state = ModelState::new(&config.model, &config.vehicle, runner)?;
        info!(
            "✓ Frame driver ready (channels: {}, {}, {})",
            config.publish.model_channel,
            config.publish.model_v2_channel,
            config.publish.odometry_channel
        );
        Ok(Self {
            state,
            publisher: FramePublisher::new(config.publish.clone()),
            transport,
            drops: FrameDropTracker::new(),
            metrics: ModelMetrics::new(),
        })
    }

    /// `latest_frame_id` is the newest frame the capture side has produced,
    /// which may be ahead of `frame` when inference is lagging.
    pub fn process_frame(
        &mut self,
        frame: CameraFrame<'_>,
        latest_frame_id: u32,
        desire: Option<&[f32]>,
    ) -> Result<()> {
        let drop = self.drops.observe(frame.frame_id);
        self.metrics
            .add(&self.metrics.frames_dropped, u64::from(drop.dropped));

        let start = Instant::now();
        let out = self.state.eval_frame(frame.features, desire)?;
        let elapsed = start.elapsed();
        self.metrics.record_execution(elapsed.as_micros() as u64);

        let info = FrameInfo {
            vipc_frame_id: frame.frame_id,
            latest_frame_id,
            frame_drop: drop.ratio,
            timestamp_eof: frame.timestamp_eof,
            model_execution_time: elapsed.as_secs_f32(),
        };

        match self.publisher.model_publish(&mut self.transport, &info, &out) {
            Ok(sent) => self.metrics.add(&self.metrics.events_published, sent as u64),
            Err(e) => {
                self.metrics.inc(&self.metrics.publish_failures);
                warn!("Failed to publish model for frame {}: {:#}", frame.frame_id, e);
                return Err(e);
            }
        }

        if let Err(e) = self.publisher.posenet_publish(
            &mut self.transport,
            frame.frame_id,
            drop.dropped,
            &out,
            frame.timestamp_eof,
        ) {
            self.metrics.inc(&self.metrics.publish_failures);
            warn!("Failed to publish odometry for frame {}: {:#}", frame.frame_id, e);
            return Err(e);
        }
        self.metrics.inc(&self.metrics.events_published);
        self.metrics.inc(&self.metrics.frames_processed);

        debug!(
            "Frame {} done in {:.2}ms (dropped {}, drop ratio {:.3})",
            frame.frame_id,
            elapsed.as_secs_f64() * 1000.0,
            drop.dropped,
            drop.ratio
        );
        Ok(())
    }

    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    pub fn state(&self) -> &ModelState<R> {
        &self.state
    }

    pub fn transport(&self) -> &P {
        &self.transport
    }

    pub fn into_transport(self) -> P {
        self.transport
    }
}
