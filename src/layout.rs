// src/layout.rs
//
// Declarative description of the flat model output buffer.
//
// The network writes one contiguous f32 vector per frame. Every semantic
// block (plan hypotheses, lane lines, leads, meta, pose, ...) lives at a
// fixed offset that is derived here from per-block cardinalities. Decode
// code never touches a raw offset: it asks the layout for a segment slice
// and then reads it through one of the typed views below.
//
// Buffer order:
//   plan | lane lines | lane line probs | road edges | leads | lead probs |
//   desire state | other meta | desire prediction | pose | [recurrent state]

// ============================================================================
// CONSTANTS
// ============================================================================

/// Samples per decoded series (time or arc-length grid).
pub const TRAJECTORY_SIZE: usize = 33;

/// Polynomial slots in a legacy path: three fitted terms plus the intercept.
pub const POLYFIT_DEGREE: usize = 4;

pub const PLAN_MHP_N: usize = 5;
pub const PLAN_MHP_COLUMNS: usize = 30;
pub const PLAN_MHP_VALS: usize = PLAN_MHP_COLUMNS * TRAJECTORY_SIZE;
pub const PLAN_MHP_SELECTION: usize = 1;
pub const PLAN_MHP_GROUP_SIZE: usize = 2 * PLAN_MHP_VALS + PLAN_MHP_SELECTION;

pub const LANE_LINES: usize = 4;
pub const ROAD_EDGES: usize = 2;
/// Each lane line / road edge sample carries (y, z).
pub const LINE_COLUMNS: usize = 2;

pub const LEAD_MHP_N: usize = 5;
pub const LEAD_MHP_VALS: usize = 4;
pub const LEAD_MHP_SELECTION: usize = 3;
pub const LEAD_MHP_GROUP_SIZE: usize = 2 * LEAD_MHP_VALS + LEAD_MHP_SELECTION;

/// Lead time offsets (seconds), one per selection bucket.
pub const LEAD_T_OFFSETS: [f32; LEAD_MHP_SELECTION] = [0.0, 2.0, 4.0];

pub const DESIRE_LEN: usize = 8;
pub const OTHER_META_SIZE: usize = 4;
pub const DESIRE_PRED_HORIZONS: usize = 4;
pub const DESIRE_PRED_SIZE: usize = DESIRE_PRED_HORIZONS * DESIRE_LEN;

pub const POSE_SIZE: usize = 12;
pub const TEMPORAL_SIZE: usize = 512;
pub const TRAFFIC_CONVENTION_LEN: usize = 2;

pub const MODEL_WIDTH: usize = 512;
pub const MODEL_HEIGHT: usize = 256;
/// One YUV420 frame worth of network input.
pub const MODEL_FRAME_SIZE: usize = MODEL_WIDTH * MODEL_HEIGHT * 3 / 2;

/// Plan column groups.
pub mod plan_col {
    pub const POSITION: usize = 0;
    pub const VELOCITY: usize = 3;
    pub const ACCELERATION: usize = 6;
    pub const ORIENTATION: usize = 9;
    pub const ORIENTATION_RATE: usize = 12;
    pub const TIME: usize = 15;
    /// Lateral path column consumed by the legacy polynomial path.
    pub const LEGACY_LATERAL: usize = 16;
}

// ============================================================================
// SEGMENTS
// ============================================================================

/// Contiguous region of the output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub offset: usize,
    pub len: usize,
}

impl Segment {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn slice<'a>(&self, buf: &'a [f32]) -> &'a [f32] {
        &buf[self.offset..self.end()]
    }
}

/// Offsets of every named segment, derived once at context construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub plan: Segment,
    pub lane_lines: Segment,
    pub lane_line_probs: Segment,
    pub road_edges: Segment,
    pub leads: Segment,
    pub lead_probs: Segment,
    pub desire_state: Segment,
    pub other_meta: Segment,
    pub desire_pred: Segment,
    pub pose: Segment,
    /// Trailing recurrent state, present only for temporal models.
    pub recurrent: Option<Segment>,
    /// Length without the recurrent tail.
    pub output_size: usize,
    pub total_len: usize,
}

impl OutputLayout {
    pub fn new(temporal: bool) -> Self {
        let mut cursor = 0usize;
        let mut next = |len: usize| {
            let seg = Segment {
                offset: cursor,
                len,
            };
            cursor += len;
            seg
        };

        let plan = next(PLAN_MHP_N * PLAN_MHP_GROUP_SIZE);
        let lane_lines = next(LineBlock::block_len(LANE_LINES));
        let lane_line_probs = next(LANE_LINES);
        let road_edges = next(LineBlock::block_len(ROAD_EDGES));
        let leads = next(LEAD_MHP_N * LEAD_MHP_GROUP_SIZE);
        let lead_probs = next(LEAD_MHP_SELECTION);
        let desire_state = next(DESIRE_LEN);
        let other_meta = next(OTHER_META_SIZE);
        let desire_pred = next(DESIRE_PRED_SIZE);
        let pose = next(POSE_SIZE);
        let recurrent = temporal.then(|| next(TEMPORAL_SIZE));

        let output_size = pose.end();
        let total_len = recurrent.map(|r| r.end()).unwrap_or(output_size);

        Self {
            plan,
            lane_lines,
            lane_line_probs,
            road_edges,
            leads,
            lead_probs,
            desire_state,
            other_meta,
            desire_pred,
            pose,
            recurrent,
            output_size,
            total_len,
        }
    }

    /// Split a full output buffer into its named views.
    pub fn view<'a>(&self, buf: &'a [f32]) -> ModelOutput<'a> {
        debug_assert_eq!(buf.len(), self.total_len);
        ModelOutput {
            plan: self.plan.slice(buf),
            lane_lines: LineBlock::new(self.lane_lines.slice(buf), LANE_LINES),
            lane_line_probs: self.lane_line_probs.slice(buf),
            road_edges: LineBlock::new(self.road_edges.slice(buf), ROAD_EDGES),
            leads: self.leads.slice(buf),
            lead_probs: self.lead_probs.slice(buf),
            desire_state: self.desire_state.slice(buf),
            other_meta: self.other_meta.slice(buf),
            desire_pred: self.desire_pred.slice(buf),
            pose: self.pose.slice(buf),
            raw: &buf[..self.total_len],
        }
    }
}

/// Named, borrowed views of one frame's output buffer.
#[derive(Debug, Clone, Copy)]
pub struct ModelOutput<'a> {
    pub plan: &'a [f32],
    pub lane_lines: LineBlock<'a>,
    pub lane_line_probs: &'a [f32],
    pub road_edges: LineBlock<'a>,
    pub leads: &'a [f32],
    pub lead_probs: &'a [f32],
    pub desire_state: &'a [f32],
    pub other_meta: &'a [f32],
    pub desire_pred: &'a [f32],
    pub pose: &'a [f32],
    /// Whole buffer including the recurrent tail, for raw diagnostics.
    pub raw: &'a [f32],
}

// ============================================================================
// HYPOTHESIS VIEWS
// ============================================================================

/// One plan hypothesis group: `[means (33×30) | log-stds (33×30) | score]`.
#[derive(Debug, Clone, Copy)]
pub struct PlanHypothesis<'a> {
    data: &'a [f32],
}

impl<'a> PlanHypothesis<'a> {
    pub fn new(data: &'a [f32]) -> Self {
        debug_assert_eq!(data.len(), PLAN_MHP_GROUP_SIZE);
        Self { data }
    }

    #[inline]
    pub fn mean(&self, sample: usize, column: usize) -> f32 {
        self.data[sample * PLAN_MHP_COLUMNS + column]
    }

    #[inline]
    pub fn log_std(&self, sample: usize, column: usize) -> f32 {
        self.data[PLAN_MHP_VALS + sample * PLAN_MHP_COLUMNS + column]
    }

    pub fn score(&self) -> f32 {
        self.data[PLAN_MHP_GROUP_SIZE - 1]
    }

    /// Embedded per-sample time column.
    pub fn times(&self) -> [f32; TRAJECTORY_SIZE] {
        std::array::from_fn(|i| self.mean(i, plan_col::TIME))
    }
}

/// One lead hypothesis group: `[xyva (4) | log-std (4) | bucket scores (3)]`.
#[derive(Debug, Clone, Copy)]
pub struct LeadHypothesis<'a> {
    data: &'a [f32],
}

impl<'a> LeadHypothesis<'a> {
    pub fn new(data: &'a [f32]) -> Self {
        debug_assert_eq!(data.len(), LEAD_MHP_GROUP_SIZE);
        Self { data }
    }

    pub fn xyva(&self) -> &'a [f32] {
        &self.data[..LEAD_MHP_VALS]
    }

    pub fn log_std(&self) -> &'a [f32] {
        &self.data[LEAD_MHP_VALS..2 * LEAD_MHP_VALS]
    }

    pub fn score(&self, bucket: usize) -> f32 {
        self.data[2 * LEAD_MHP_VALS + bucket]
    }
}

/// Lane line or road edge block: `count` lines of (y, z) means, followed by
/// the same-shaped log-std block.
#[derive(Debug, Clone, Copy)]
pub struct LineBlock<'a> {
    data: &'a [f32],
    count: usize,
}

impl<'a> LineBlock<'a> {
    const LINE_LEN: usize = TRAJECTORY_SIZE * LINE_COLUMNS;

    pub const fn block_len(count: usize) -> usize {
        2 * count * Self::LINE_LEN
    }

    pub fn new(data: &'a [f32], count: usize) -> Self {
        debug_assert_eq!(data.len(), Self::block_len(count));
        Self { data, count }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn mean(&self, line: usize, sample: usize, column: usize) -> f32 {
        self.data[line * Self::LINE_LEN + sample * LINE_COLUMNS + column]
    }

    #[inline]
    pub fn log_std(&self, line: usize, sample: usize, column: usize) -> f32 {
        self.data[(self.count + line) * Self::LINE_LEN + sample * LINE_COLUMNS + column]
    }
}
