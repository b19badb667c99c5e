// src/test_support.rs
//
// Synthetic output buffers for decode and pipeline tests.

use crate::decode::grid::grids;
use crate::inference::{ModelInputs, ModelRunner};
use crate::layout::{
    plan_col, OutputLayout, LANE_LINES, LEAD_MHP_GROUP_SIZE, LEAD_MHP_VALS, LINE_COLUMNS, PLAN_MHP_COLUMNS,
    PLAN_MHP_GROUP_SIZE, PLAN_MHP_VALS, ROAD_EDGES, TRAJECTORY_SIZE,
};
use anyhow::{ensure, Result};

pub(crate) struct BufferBuilder {
    pub layout: OutputLayout,
    pub buf: Vec<f32>,
}

impl BufferBuilder {
    pub fn new(temporal: bool) -> Self {
        let layout = OutputLayout::new(temporal);
        let buf = vec![0.0f32; layout.total_len];
        Self { layout, buf }
    }

    fn plan_base(&self, hypothesis: usize) -> usize {
        self.layout.plan.offset + hypothesis * PLAN_MHP_GROUP_SIZE
    }

    pub fn plan_score(&mut self, hypothesis: usize, score: f32) -> &mut Self {
        let idx = self.plan_base(hypothesis) + PLAN_MHP_GROUP_SIZE - 1;
        self.buf[idx] = score;
        self
    }

    pub fn plan_mean(&mut self, hypothesis: usize, sample: usize, column: usize, v: f32) -> &mut Self {
        let idx = self.plan_base(hypothesis) + sample * PLAN_MHP_COLUMNS + column;
        self.buf[idx] = v;
        self
    }

    /// Straight path: x follows the distance grid, constant lateral offset
    /// (raw, right positive), time follows the time grid.
    pub fn straight_plan(&mut self, hypothesis: usize, lateral: f32) -> &mut Self {
        let g = grids();
        for i in 0..TRAJECTORY_SIZE {
            self.plan_mean(hypothesis, i, plan_col::POSITION, g.x[i]);
            self.plan_mean(hypothesis, i, plan_col::LEGACY_LATERAL, lateral);
            self.plan_mean(hypothesis, i, plan_col::TIME, g.t[i]);
        }
        self
    }

    pub fn plan_log_std_all(&mut self, hypothesis: usize, v: f32) -> &mut Self {
        let base = self.plan_base(hypothesis) + PLAN_MHP_VALS;
        self.buf[base..base + PLAN_MHP_VALS].fill(v);
        self
    }

    pub fn lane_line(&mut self, line: usize, y: f32, z: f32) -> &mut Self {
        let base = self.layout.lane_lines.offset + line * TRAJECTORY_SIZE * LINE_COLUMNS;
        for i in 0..TRAJECTORY_SIZE {
            self.buf[base + i * LINE_COLUMNS] = y;
            self.buf[base + i * LINE_COLUMNS + 1] = z;
        }
        self
    }

    /// Log-std of every (y, z) sample of one lane line.
    pub fn lane_line_log_std(&mut self, line: usize, v: f32) -> &mut Self {
        let line_len = TRAJECTORY_SIZE * LINE_COLUMNS;
        let base = self.layout.lane_lines.offset + (LANE_LINES + line) * line_len;
        self.buf[base..base + line_len].fill(v);
        self
    }

    pub fn road_edge_log_std(&mut self, edge: usize, v: f32) -> &mut Self {
        let line_len = TRAJECTORY_SIZE * LINE_COLUMNS;
        let base = self.layout.road_edges.offset + (ROAD_EDGES + edge) * line_len;
        self.buf[base..base + line_len].fill(v);
        self
    }

    pub fn lane_line_prob(&mut self, line: usize, logit: f32) -> &mut Self {
        self.buf[self.layout.lane_line_probs.offset + line] = logit;
        self
    }

    pub fn road_edge(&mut self, edge: usize, y: f32) -> &mut Self {
        let base = self.layout.road_edges.offset + edge * TRAJECTORY_SIZE * LINE_COLUMNS;
        for i in 0..TRAJECTORY_SIZE {
            self.buf[base + i * LINE_COLUMNS] = y;
        }
        self
    }

    pub fn lead(&mut self, hypothesis: usize, xyva: [f32; LEAD_MHP_VALS], log_std: f32) -> &mut Self {
        let base = self.layout.leads.offset + hypothesis * LEAD_MHP_GROUP_SIZE;
        self.buf[base..base + LEAD_MHP_VALS].copy_from_slice(&xyva);
        self.buf[base + LEAD_MHP_VALS..base + 2 * LEAD_MHP_VALS].fill(log_std);
        self
    }

    pub fn lead_score(&mut self, hypothesis: usize, bucket: usize, score: f32) -> &mut Self {
        let idx = self.layout.leads.offset + hypothesis * LEAD_MHP_GROUP_SIZE + 2 * LEAD_MHP_VALS + bucket;
        self.buf[idx] = score;
        self
    }

    pub fn lead_prob(&mut self, bucket: usize, logit: f32) -> &mut Self {
        self.buf[self.layout.lead_probs.offset + bucket] = logit;
        self
    }

    pub fn pose(&mut self, values: [f32; 12]) -> &mut Self {
        let off = self.layout.pose.offset;
        self.buf[off..off + 12].copy_from_slice(&values);
        self
    }

    pub fn recurrent_fill(&mut self, v: f32) -> &mut Self {
        if let Some(seg) = self.layout.recurrent {
            self.buf[seg.offset..seg.end()].fill(v);
        }
        self
    }

    pub fn build(&self) -> Vec<f32> {
        self.buf.clone()
    }
}

/// Records what it was fed and writes a scripted buffer.
pub(crate) struct ScriptedRunner {
    pub outputs: Vec<Vec<f32>>,
    pub calls: usize,
    pub seen_frames: Vec<Vec<f32>>,
    pub seen_desire: Vec<Option<Vec<f32>>>,
    pub seen_traffic: Vec<Option<Vec<f32>>>,
    pub seen_recurrent: Vec<Option<Vec<f32>>>,
    pub declared_len: Option<usize>,
}

impl ScriptedRunner {
    pub fn new(outputs: Vec<Vec<f32>>) -> Self {
        Self {
            outputs,
            calls: 0,
            seen_frames: Vec::new(),
            seen_desire: Vec::new(),
            seen_traffic: Vec::new(),
            seen_recurrent: Vec::new(),
            declared_len: None,
        }
    }
}

impl ModelRunner for ScriptedRunner {
    fn execute(&mut self, inputs: &ModelInputs<'_>, output: &mut [f32]) -> Result<()> {
        self.seen_frames.push(inputs.frames.to_vec());
        self.seen_desire.push(inputs.desire.map(|d| d.to_vec()));
        self.seen_traffic
            .push(inputs.traffic_convention.map(|t| t.to_vec()));
        self.seen_recurrent
            .push(inputs.recurrent_state.map(|r| r.to_vec()));

        ensure!(!self.outputs.is_empty(), "scripted runner has no outputs");
        let script = &self.outputs[self.calls.min(self.outputs.len() - 1)];
        ensure!(script.len() == output.len(), "scripted output length mismatch");
        output.copy_from_slice(script);
        self.calls += 1;
        Ok(())
    }

    fn output_len(&self) -> Option<usize> {
        self.declared_len
    }
}
