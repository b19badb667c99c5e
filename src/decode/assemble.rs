// src/decode/assemble.rs
//
// Builds the two schema variants from one frame's output views.
//
// Legacy (V1): best plan → valid length → polynomial ego path plus the two
// immediate lane boundaries, leads at "now" and the short future bucket.
//
// Full (V2): best plan → XYZT position/velocity/orientation/orientation
// rate, four lane lines and two road edges (time borrowed from the plan),
// leads at {0, 2, 4}s.

use super::calibration::sigmoid;
use super::grid::{grids, MIN_VALID_LEN, MODEL_PATH_DISTANCE};
use super::lead::{decode_lead, decode_lead_v2};
use super::meta::decode_meta;
use super::path::{decode_path, PathSource};
use super::selector::select_plan;
use super::series::{decode_series, SeriesLayout};
use crate::layout::{
    plan_col, ModelOutput, PlanHypothesis, LEAD_MHP_SELECTION, TRAJECTORY_SIZE,
};
use crate::types::{MetaData, ModelDataV1, ModelDataV2};
use tracing::debug;

/// Forward extent of the ego path: running max of the x column (samples
/// 1..), clamped to [MIN_VALID_LEN, MODEL_PATH_DISTANCE].
pub fn legacy_valid_len(plan: &PlanHypothesis<'_>) -> f32 {
    let mut valid_len = 0.0f32;
    for i in 1..TRAJECTORY_SIZE {
        let len = plan.mean(i, plan_col::POSITION);
        if len >= valid_len {
            valid_len = len;
        }
    }
    valid_len.max(MIN_VALID_LEN).min(MODEL_PATH_DISTANCE)
}

fn meta(out: &ModelOutput<'_>) -> MetaData {
    decode_meta(out.desire_state, out.other_meta, out.desire_pred)
}

pub fn assemble_v1(out: &ModelOutput<'_>) -> ModelDataV1 {
    let (plan_idx, plan) = select_plan(out.plan);
    let valid_len = legacy_valid_len(&plan);
    let valid_len_idx = grids().valid_len_index(valid_len);
    debug!(
        "V1: plan hypothesis {} valid_len={:.1}m ({} samples)",
        plan_idx, valid_len, valid_len_idx
    );

    let lane = |index: usize| {
        decode_path(
            PathSource::LaneLine {
                lines: out.lane_lines,
                index,
            },
            sigmoid(out.lane_line_probs[index]),
            valid_len,
            valid_len_idx,
        )
    };

    ModelDataV1 {
        path: decode_path(PathSource::Plan(plan), 1.0, valid_len, valid_len_idx),
        left_lane: lane(1),
        right_lane: lane(2),
        lead: decode_lead(out.leads, out.lead_probs, 0),
        lead_future: decode_lead(out.leads, out.lead_probs, 1),
        meta: meta(out),
    }
}

pub fn assemble_v2(out: &ModelOutput<'_>) -> ModelDataV2 {
    let (plan_idx, plan) = select_plan(out.plan);
    debug!("V2: plan hypothesis {}", plan_idx);

    // Lane lines and road edges carry no time of their own
    let plan_t = plan.times();
    let plan_series = |column: usize| decode_series(SeriesLayout::TimeIndexed { plan, column });
    let line_series = |block, line| {
        decode_series(SeriesLayout::ArcLengthIndexed {
            block,
            line,
            plan_t: &plan_t,
        })
    };

    let lines = out.lane_lines;
    let edges = out.road_edges;

    ModelDataV2 {
        position: plan_series(plan_col::POSITION),
        velocity: plan_series(plan_col::VELOCITY),
        orientation: plan_series(plan_col::ORIENTATION),
        orientation_rate: plan_series(plan_col::ORIENTATION_RATE),
        lane_lines: (0..lines.count()).map(|i| line_series(lines, i)).collect(),
        lane_line_probs: out.lane_line_probs.iter().map(|&p| sigmoid(p)).collect(),
        lane_line_stds: (0..lines.count())
            .map(|i| lines.log_std(i, 0, 0).exp())
            .collect(),
        road_edges: (0..edges.count()).map(|i| line_series(edges, i)).collect(),
        road_edge_stds: (0..edges.count())
            .map(|i| edges.log_std(i, 0, 0).exp())
            .collect(),
        leads: (0..LEAD_MHP_SELECTION)
            .map(|b| decode_lead_v2(out.leads, out.lead_probs, b))
            .collect(),
        meta: meta(out),
    }
}
