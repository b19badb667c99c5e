// src/pipeline/publisher.rs
//
// Frame metadata + transport. A `Publisher` is any sink that accepts a
// named channel and an event; `FramePublisher` builds the per-frame events
// from a decoded output buffer and hands them over.

use crate::config::PublishConfig;
use crate::decode::{assemble_v1, assemble_v2, decode_pose};
use crate::layout::ModelOutput;
use crate::types::{Event, EventPayload, FrameMeta, Framed};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

pub trait Publisher {
    fn send(&mut self, channel: &str, event: &Event) -> Result<()>;
}

// ============================================================================
// TRANSPORTS
// ============================================================================

#[derive(Serialize)]
struct Envelope<'a> {
    channel: &'a str,
    #[serde(flatten)]
    event: &'a Event,
}

/// One JSON object per line: `{"channel": .., "valid": .., "type": .., ...}`.
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Publisher for JsonLinesPublisher<W> {
    fn send(&mut self, channel: &str, event: &Event) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &Envelope { channel, event })
            .with_context(|| format!("Failed to serialize event for {}", channel))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().context("Failed to flush event stream")?;
        Ok(())
    }
}

/// Keeps every event in memory, in send order.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    pub sent: Vec<(String, Event)>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_channel<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.sent
            .iter()
            .filter(move |(c, _)| c == channel)
            .map(|(_, e)| e)
    }
}

impl Publisher for MemoryPublisher {
    fn send(&mut self, channel: &str, event: &Event) -> Result<()> {
        self.sent.push((channel.to_string(), event.clone()));
        Ok(())
    }
}

// ============================================================================
// FRAME PUBLISHER
// ============================================================================

/// Frames between the most recent capture and the one just processed.
pub fn frame_age(latest_frame_id: u32, vipc_frame_id: u32) -> u32 {
    latest_frame_id.saturating_sub(vipc_frame_id)
}

fn raw_bytes(raw: &[f32]) -> Vec<u8> {
    raw.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Identity and timing of the frame being published.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    pub vipc_frame_id: u32,
    pub latest_frame_id: u32,
    /// Filtered drop ratio in [0, 1).
    pub frame_drop: f32,
    pub timestamp_eof: u64,
    /// Seconds.
    pub model_execution_time: f32,
}

pub struct FramePublisher {
    config: PublishConfig,
}

impl FramePublisher {
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    fn frame_meta(&self, info: &FrameInfo, out: &ModelOutput<'_>) -> FrameMeta {
        FrameMeta {
            frame_id: info.vipc_frame_id,
            frame_age: frame_age(info.latest_frame_id, info.vipc_frame_id),
            frame_drop_perc: info.frame_drop * 100.0,
            timestamp_eof: info.timestamp_eof,
            model_execution_time: info.model_execution_time,
            raw_pred: self.config.send_raw_pred.then(|| raw_bytes(out.raw)),
        }
    }

    /// Decode and send both schema variants. Returns the number of events sent.
    pub fn model_publish<P: Publisher>(
        &self,
        pm: &mut P,
        info: &FrameInfo,
        out: &ModelOutput<'_>,
    ) -> Result<usize> {
        let frame = self.frame_meta(info, out);
        debug!(
            "Publishing frame {} (age {}, drop {:.1}%)",
            frame.frame_id, frame.frame_age, frame.frame_drop_perc
        );

        let v1 = Event::new(EventPayload::Model(Framed {
            frame: frame.clone(),
            model: assemble_v1(out),
        }));
        pm.send(&self.config.model_channel, &v1)?;

        let v2 = Event::new(EventPayload::ModelV2(Framed {
            frame,
            model: assemble_v2(out),
        }));
        pm.send(&self.config.model_v2_channel, &v2)?;
        Ok(2)
    }

    /// Send the odometry estimate; invalid whenever any frame was dropped.
    pub fn posenet_publish<P: Publisher>(
        &self,
        pm: &mut P,
        vipc_frame_id: u32,
        vipc_dropped_frames: u32,
        out: &ModelOutput<'_>,
        timestamp_eof: u64,
    ) -> Result<()> {
        let odometry = decode_pose(out.pose, vipc_frame_id, timestamp_eof);
        let event = Event::with_validity(
            vipc_dropped_frames < 1,
            EventPayload::CameraOdometry(odometry),
        );
        pm.send(&self.config.odometry_channel, &event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::BufferBuilder;

    fn info(vipc: u32, latest: u32) -> FrameInfo {
        FrameInfo {
            vipc_frame_id: vipc,
            latest_frame_id: latest,
            frame_drop: 0.25,
            timestamp_eof: 123_456,
            model_execution_time: 0.02,
        }
    }

    #[test]
    fn test_frame_age_never_negative() {
        assert_eq!(frame_age(10, 7), 3);
        assert_eq!(frame_age(7, 7), 0);
        assert_eq!(frame_age(3, 7), 0, "inference ahead of capture must clamp to zero");
    }

    #[test]
    fn test_model_publish_sends_both_variants() {
        let b = BufferBuilder::new(false);
        let out = b.layout.view(&b.buf);
        let publisher = FramePublisher::new(PublishConfig::default());
        let mut pm = MemoryPublisher::new();

        let sent = publisher.model_publish(&mut pm, &info(5, 8), &out).unwrap();
        assert_eq!(sent, 2);
        assert_eq!(pm.sent.len(), 2);
        assert_eq!(pm.sent[0].0, "model");
        assert_eq!(pm.sent[1].0, "modelV2");

        match &pm.sent[0].1.payload {
            EventPayload::Model(framed) => {
                assert_eq!(framed.frame.frame_id, 5);
                assert_eq!(framed.frame.frame_age, 3);
                assert_eq!(framed.frame.frame_drop_perc, 25.0);
                assert_eq!(framed.frame.timestamp_eof, 123_456);
                assert!(framed.frame.raw_pred.is_none());
            }
            other => panic!("expected legacy record, got {:?}", other),
        }
        assert!(matches!(pm.sent[1].1.payload, EventPayload::ModelV2(_)));
    }

    #[test]
    fn test_raw_pred_copies_whole_buffer() {
        let mut b = BufferBuilder::new(true);
        b.plan_score(0, 1.0);
        let out = b.layout.view(&b.buf);
        let publisher = FramePublisher::new(PublishConfig {
            send_raw_pred: true,
            ..Default::default()
        });
        let mut pm = MemoryPublisher::new();
        publisher.model_publish(&mut pm, &info(1, 1), &out).unwrap();

        let EventPayload::ModelV2(framed) = &pm.sent[1].1.payload else {
            panic!("second event must be the full record");
        };
        let raw = framed.frame.raw_pred.as_ref().unwrap();
        assert_eq!(raw.len(), b.layout.total_len * 4);
        let score_at = b.layout.plan.offset + crate::layout::PLAN_MHP_GROUP_SIZE - 1;
        assert_eq!(&raw[score_at * 4..score_at * 4 + 4], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_pose_validity_tracks_drops() {
        let mut b = BufferBuilder::new(false);
        b.pose([1.0, 0.0, 0.0, 0.0, 0.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let out = b.layout.view(&b.buf);
        let publisher = FramePublisher::new(PublishConfig::default());
        let mut pm = MemoryPublisher::new();

        publisher.posenet_publish(&mut pm, 9, 0, &out, 77).unwrap();
        publisher.posenet_publish(&mut pm, 11, 1, &out, 78).unwrap();

        let events: Vec<_> = pm.on_channel("cameraOdometry").collect();
        assert_eq!(events.len(), 2);
        assert!(events[0].valid);
        assert!(!events[1].valid, "a dropped frame invalidates odometry");
        match &events[0].payload {
            EventPayload::CameraOdometry(odo) => {
                assert_eq!(odo.frame_id, 9);
                assert_eq!(odo.trans[0], 1.0);
                assert_eq!(odo.rot[2], 0.1);
                assert_eq!(odo.trans_std, [1.0; 3]);
            }
            other => panic!("expected odometry, got {:?}", other),
        }
    }

    #[test]
    fn test_json_lines_one_object_per_line() {
        let b = BufferBuilder::new(false);
        let out = b.layout.view(&b.buf);
        let publisher = FramePublisher::new(PublishConfig::default());
        let mut pm = JsonLinesPublisher::new(Vec::new());
        publisher.model_publish(&mut pm, &info(2, 2), &out).unwrap();
        publisher.posenet_publish(&mut pm, 2, 0, &out, 0).unwrap();

        let text = String::from_utf8(pm.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["channel"], "model");
        assert_eq!(first["type"], "model");
        assert_eq!(first["frame_id"], 2);
        let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last["channel"], "cameraOdometry");
        assert_eq!(last["valid"], true);
    }
}
