// src/types.rs
//
// Decoded driving-state records. Built fresh every frame, never mutated
// after they are handed to the publisher.

use crate::layout::{
    DESIRE_LEN, DESIRE_PRED_HORIZONS, LEAD_MHP_VALS, POLYFIT_DEGREE, TRAJECTORY_SIZE,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// SHARED RECORDS
// ============================================================================

/// Legacy polynomial path: `poly = [c₃, c₂, c₁, y₀]` over arc length (m),
/// left positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathData {
    pub poly: [f32; POLYFIT_DEGREE],
    pub prob: f32,
    /// Std of the leading sample.
    pub std: f32,
    pub valid_len: f32,
}

/// Series sampled on the fixed 33-point grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XyztSeries {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub t: Vec<f32>,
}

impl XyztSeries {
    pub fn new() -> Self {
        Self {
            x: Vec::with_capacity(TRAJECTORY_SIZE),
            y: Vec::with_capacity(TRAJECTORY_SIZE),
            z: Vec::with_capacity(TRAJECTORY_SIZE),
            t: Vec::with_capacity(TRAJECTORY_SIZE),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Legacy lead track. Lateral offset is left positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadData {
    pub prob: f32,
    pub dist: f32,
    pub std: f32,
    pub rel_y: f32,
    pub rel_y_std: f32,
    pub rel_vel: f32,
    pub rel_vel_std: f32,
    pub rel_a: f32,
    pub rel_a_std: f32,
}

/// Lead track at a fixed time offset: `xyva = [dist, lateral, rel vel, rel accel]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadDataV2 {
    pub t: f32,
    pub prob: f32,
    pub xyva: [f32; LEAD_MHP_VALS],
    pub xyva_std: [f32; LEAD_MHP_VALS],
}

/// Driving intent ("desire") distributions and disengagement probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    /// Current intent simplex, DESIRE_LEN entries.
    pub desire_state: Vec<f32>,
    pub engaged_prob: f32,
    pub gas_disengage_prob: f32,
    pub brake_disengage_prob: f32,
    pub steer_override_prob: f32,
    /// Four short-horizon simplices, flattened horizon-major.
    pub desire_prediction: Vec<f32>,
}

impl MetaData {
    pub fn prediction(&self, horizon: usize) -> &[f32] {
        debug_assert!(horizon < DESIRE_PRED_HORIZONS);
        &self.desire_prediction[horizon * DESIRE_LEN..(horizon + 1) * DESIRE_LEN]
    }
}

/// Frame-to-frame visual odometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraOdometry {
    pub frame_id: u32,
    pub timestamp_eof: u64,
    pub trans: [f32; 3],
    pub rot: [f32; 3],
    pub trans_std: [f32; 3],
    pub rot_std: [f32; 3],
}

// ============================================================================
// SCHEMA VARIANTS
// ============================================================================

/// Legacy single-hypothesis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDataV1 {
    pub path: PathData,
    pub left_lane: PathData,
    pub right_lane: PathData,
    pub lead: LeadData,
    pub lead_future: LeadData,
    pub meta: MetaData,
}

/// Full multi-hypothesis record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDataV2 {
    pub position: XyztSeries,
    pub velocity: XyztSeries,
    pub orientation: XyztSeries,
    pub orientation_rate: XyztSeries,
    pub lane_lines: Vec<XyztSeries>,
    pub lane_line_probs: Vec<f32>,
    pub lane_line_stds: Vec<f32>,
    pub road_edges: Vec<XyztSeries>,
    pub road_edge_stds: Vec<f32>,
    pub leads: Vec<LeadDataV2>,
    pub meta: MetaData,
}

// ============================================================================
// FRAMING
// ============================================================================

/// Per-frame metadata attached to every published model record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    pub frame_id: u32,
    /// Frames between this inference and the most recent capture.
    pub frame_age: u32,
    pub frame_drop_perc: f32,
    pub timestamp_eof: u64,
    /// Seconds.
    pub model_execution_time: f32,
    /// Little-endian copy of the full output buffer, when enabled.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "raw_bytes"
    )]
    pub raw_pred: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Framed<T> {
    #[serde(flatten)]
    pub frame: FrameMeta,
    #[serde(flatten)]
    pub model: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventPayload {
    Model(Framed<ModelDataV1>),
    ModelV2(Framed<ModelDataV2>),
    CameraOdometry(CameraOdometry),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub valid: bool,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            valid: true,
            payload,
        }
    }

    pub fn with_validity(valid: bool, payload: EventPayload) -> Self {
        Self { valid, payload }
    }
}

/// base64 (de)serialisation for the raw prediction bytes.
mod raw_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_str(&base64::engine::general_purpose::STANDARD.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|e| {
                base64::engine::general_purpose::STANDARD
                    .decode(e)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
