// src/decode/series.rs
//
// XYZT series for the full schema.
//
// Two block shapes:
//   - time-indexed (ego plan): x/y/z are three consecutive plan columns and
//     the parameter is the fixed time grid the plan is sampled on.
//   - arc-length-indexed (lane lines, road edges): only y/z are stored, x is
//     the fixed distance grid, and t is borrowed from the ego plan's time
//     column. The plan must therefore be decoded first in the same frame.

use super::grid::grids;
use crate::layout::{LineBlock, PlanHypothesis, TRAJECTORY_SIZE};
use crate::types::XyztSeries;

#[derive(Debug, Clone, Copy)]
pub enum SeriesLayout<'a> {
    /// Plan columns `column..column + 3`.
    TimeIndexed {
        plan: PlanHypothesis<'a>,
        column: usize,
    },
    /// Line `line` of a lane line / road edge block.
    ArcLengthIndexed {
        block: LineBlock<'a>,
        line: usize,
        plan_t: &'a [f32; TRAJECTORY_SIZE],
    },
}

pub fn decode_series(layout: SeriesLayout<'_>) -> XyztSeries {
    let g = grids();
    let mut series = XyztSeries::new();

    for i in 0..TRAJECTORY_SIZE {
        let (x, y, z, t) = match layout {
            SeriesLayout::TimeIndexed { plan, column } => (
                plan.mean(i, column),
                plan.mean(i, column + 1),
                plan.mean(i, column + 2),
                g.t[i],
            ),
            SeriesLayout::ArcLengthIndexed {
                block,
                line,
                plan_t,
            } => (
                g.x[i],
                block.mean(line, i, 0),
                block.mean(line, i, 1),
                plan_t[i],
            ),
        };
        series.x.push(x);
        series.y.push(y);
        series.z.push(z);
        series.t.push(t);
    }

    series
}
