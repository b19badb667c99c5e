// src/decode/path.rs
//
// Legacy polynomial paths (ego path, left/right lane).
//
// Each sample yields a lateral position and its std. The raw sign is flipped
// so that left is positive, the std is exp(log-std), and the leading
// `valid_len_idx` samples go through the weighted fit.

use super::polyfit::poly_fit;
use crate::layout::{plan_col, LineBlock, PlanHypothesis, TRAJECTORY_SIZE};
use crate::types::PathData;

/// Where the lateral samples of a path come from.
#[derive(Debug, Clone, Copy)]
pub enum PathSource<'a> {
    /// Ego path: fixed plan column, stride PLAN_MHP_COLUMNS.
    Plan(PlanHypothesis<'a>),
    /// Lane boundary `index` of the lane line block, stride LINE_COLUMNS.
    LaneLine { lines: LineBlock<'a>, index: usize },
}

impl PathSource<'_> {
    /// (left-positive lateral position, std) for one sample.
    fn lateral(&self, sample: usize) -> (f32, f32) {
        match self {
            Self::Plan(plan) => (
                -plan.mean(sample, plan_col::LEGACY_LATERAL),
                plan.log_std(sample, plan_col::LEGACY_LATERAL).exp(),
            ),
            Self::LaneLine { lines, index } => (
                -lines.mean(*index, sample, 0),
                lines.log_std(*index, sample, 0).exp(),
            ),
        }
    }
}

pub fn decode_path(source: PathSource<'_>, prob: f32, valid_len: f32, valid_len_idx: usize) -> PathData {
    let mut points = [0.0f32; TRAJECTORY_SIZE];
    let mut stds = [0.0f32; TRAJECTORY_SIZE];
    for i in 0..TRAJECTORY_SIZE {
        let (p, s) = source.lateral(i);
        points[i] = p;
        stds[i] = s;
    }

    PathData {
        poly: poly_fit(&points, &stds, valid_len_idx),
        prob,
        std: stds[0],
        valid_len,
    }
}
