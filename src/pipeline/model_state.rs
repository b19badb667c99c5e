// src/pipeline/model_state.rs
//
// One model context per camera stream: input window, pulse state,
// recurrent feedback and the shared output buffer. `eval_frame` hands back
// views borrowing that buffer, so the next inference cannot start while a
// decode of the previous one is still alive.

use crate::config::{ModelConfig, VehicleConfig};
use crate::decode::grids;
use crate::inference::{ModelInputs, ModelRunner};
use crate::layout::{ModelOutput, OutputLayout, DESIRE_LEN, TEMPORAL_SIZE, TRAFFIC_CONVENTION_LEN};
use crate::pipeline::temporal_input::{DesirePulse, TemporalInput};
use anyhow::{ensure, Context, Result};
use tracing::{debug, info};

pub struct ModelState<R: ModelRunner> {
    runner: R,
    layout: OutputLayout,
    input: TemporalInput,
    desire: Option<DesirePulse>,
    traffic_convention: Option<[f32; TRAFFIC_CONVENTION_LEN]>,
    recurrent: Option<Vec<f32>>,
    output: Vec<f32>,
}

impl<R: ModelRunner> ModelState<R> {
    pub fn new(model: &ModelConfig, vehicle: &VehicleConfig, runner: R) -> Result<Self> {
        ensure!(model.frame_size > 0, "model.frame_size must be > 0");
        let layout = OutputLayout::new(model.temporal);

        if let Some(len) = runner.output_len() {
            ensure!(
                len == layout.total_len,
                "Model output has {} floats but the configured layout expects {} (temporal={})",
                len,
                layout.total_len,
                model.temporal
            );
        }

        // Grids and fit basis are built before the first frame
        let grid = grids();
        debug!("Fit basis ready ({} samples)", grid.basis.nrows());

        let traffic_convention = model.traffic_convention.then(|| {
            let mut one_hot = [0.0f32; TRAFFIC_CONVENTION_LEN];
            one_hot[usize::from(vehicle.is_rhd)] = 1.0;
            one_hot
        });

        info!(
            "✓ Model context ready: {} output floats, temporal={}, desire={}, rhd={}",
            layout.total_len, model.temporal, model.desire, vehicle.is_rhd
        );

        Ok(Self {
            runner,
            input: TemporalInput::new(model.frame_size),
            desire: model.desire.then(|| DesirePulse::new(DESIRE_LEN)),
            traffic_convention,
            recurrent: model.temporal.then(|| vec![0.0; TEMPORAL_SIZE]),
            output: vec![0.0; layout.total_len],
            layout,
        })
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Shift in a frame, run inference and return views of the fresh output.
    pub fn eval_frame(&mut self, frame: &[f32], desire: Option<&[f32]>) -> Result<ModelOutput<'_>> {
        self.input.push(frame)?;

        let pulse = match self.desire.as_mut() {
            Some(state) => Some(state.update(desire)),
            None => {
                if desire.is_some() {
                    debug!("Desire supplied but model has no desire input; ignoring");
                }
                None
            }
        };

        // Feed back last frame's recurrent tail
        if let (Some(state), Some(seg)) = (self.recurrent.as_mut(), self.layout.recurrent) {
            state.copy_from_slice(seg.slice(&self.output));
        }

        let inputs = ModelInputs {
            frames: self.input.window(),
            desire: pulse,
            traffic_convention: self.traffic_convention.as_ref().map(|tc| tc.as_slice()),
            recurrent_state: self.recurrent.as_deref(),
        };
        self.runner
            .execute(&inputs, &mut self.output)
            .context("Model execution failed")?;

        Ok(self.layout.view(&self.output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedRunner;

    fn small_model(temporal: bool) -> ModelConfig {
        ModelConfig {
            frame_size: 4,
            temporal,
            ..Default::default()
        }
    }

    #[test]
    fn test_declared_length_mismatch_fails_at_construction() {
        let mut runner = ScriptedRunner::new(Vec::new());
        runner.declared_len = Some(OutputLayout::new(false).total_len);
        let err = ModelState::new(&small_model(true), &VehicleConfig::default(), runner);
        assert!(err.is_err(), "non-temporal model must not load into a temporal layout");

        let mut runner = ScriptedRunner::new(Vec::new());
        runner.declared_len = Some(OutputLayout::new(true).total_len);
        assert!(ModelState::new(&small_model(true), &VehicleConfig::default(), runner).is_ok());
    }

    #[test]
    fn test_construction_builds_fit_grids() {
        let runner = ScriptedRunner::new(Vec::new());
        ModelState::new(&small_model(false), &VehicleConfig::default(), runner).unwrap();
        let built = crate::decode::grid::GRIDS.get();
        assert!(built.is_some(), "grids must exist before the first eval_frame");
        assert_eq!(built.unwrap().basis.nrows(), crate::layout::TRAJECTORY_SIZE);
    }

    #[test]
    fn test_traffic_convention_one_hot() {
        let layout = OutputLayout::new(false);
        let runner = ScriptedRunner::new(vec![vec![0.0; layout.total_len]]);
        let vehicle = VehicleConfig { is_rhd: true };
        let mut state = ModelState::new(&small_model(false), &vehicle, runner).unwrap();
        state.eval_frame(&[0.0; 4], None).unwrap();
        assert_eq!(state.runner().seen_traffic[0], Some(vec![0.0, 1.0]));

        let runner = ScriptedRunner::new(vec![vec![0.0; layout.total_len]]);
        let mut state =
            ModelState::new(&small_model(false), &VehicleConfig::default(), runner).unwrap();
        state.eval_frame(&[0.0; 4], None).unwrap();
        assert_eq!(state.runner().seen_traffic[0], Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_recurrent_tail_fed_back_next_frame() {
        let layout = OutputLayout::new(true);
        let seg = layout.recurrent.unwrap();
        let mut first = vec![0.0; layout.total_len];
        first[seg.offset..seg.end()].fill(0.5);
        let mut second = vec![0.0; layout.total_len];
        second[seg.offset..seg.end()].fill(0.75);

        let runner = ScriptedRunner::new(vec![first, second]);
        let mut state =
            ModelState::new(&small_model(true), &VehicleConfig::default(), runner).unwrap();
        state.eval_frame(&[1.0; 4], None).unwrap();
        state.eval_frame(&[2.0; 4], None).unwrap();
        state.eval_frame(&[3.0; 4], None).unwrap();

        let seen = &state.runner().seen_recurrent;
        assert_eq!(seen[0], Some(vec![0.0; TEMPORAL_SIZE]), "state starts zeroed");
        assert_eq!(seen[1], Some(vec![0.5; TEMPORAL_SIZE]));
        assert_eq!(seen[2], Some(vec![0.75; TEMPORAL_SIZE]));
    }

    #[test]
    fn test_disabled_features_send_nothing() {
        let model = ModelConfig {
            frame_size: 2,
            temporal: false,
            desire: false,
            traffic_convention: false,
            ..Default::default()
        };
        let layout = OutputLayout::new(false);
        let runner = ScriptedRunner::new(vec![vec![0.0; layout.total_len]]);
        let mut state = ModelState::new(&model, &VehicleConfig::default(), runner).unwrap();
        state.eval_frame(&[1.0, 2.0], Some(&[1.0; DESIRE_LEN])).unwrap();

        let r = state.runner();
        assert_eq!(r.seen_desire[0], None);
        assert_eq!(r.seen_traffic[0], None);
        assert_eq!(r.seen_recurrent[0], None);
        assert_eq!(r.seen_frames[0], vec![0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_desire_pulse_reaches_runner() {
        let layout = OutputLayout::new(true);
        let runner = ScriptedRunner::new(vec![vec![0.0; layout.total_len]]);
        let mut state =
            ModelState::new(&small_model(true), &VehicleConfig::default(), runner).unwrap();
        let mut lane_change = [0.0f32; DESIRE_LEN];
        lane_change[3] = 1.0;
        state.eval_frame(&[0.0; 4], Some(&lane_change)).unwrap();
        state.eval_frame(&[0.0; 4], Some(&lane_change)).unwrap();

        let seen = &state.runner().seen_desire;
        assert_eq!(seen[0].as_deref(), Some(&lane_change[..]));
        assert_eq!(seen[1], Some(vec![0.0; DESIRE_LEN]), "held command must not re-pulse");
    }

    #[test]
    fn test_eval_frame_returns_fresh_output() {
        let mut b = crate::test_support::BufferBuilder::new(true);
        b.lane_line_prob(2, 4.0).pose([0.5; 12]);
        let runner = ScriptedRunner::new(vec![b.build()]);
        let mut state =
            ModelState::new(&small_model(true), &VehicleConfig::default(), runner).unwrap();
        let out = state.eval_frame(&[0.0; 4], None).unwrap();
        assert_eq!(out.lane_line_probs[2], 4.0);
        assert_eq!(out.pose[11], 0.5);
    }

    #[test]
    fn test_wrong_frame_size_is_error() {
        let layout = OutputLayout::new(true);
        let runner = ScriptedRunner::new(vec![vec![0.0; layout.total_len]]);
        let mut state =
            ModelState::new(&small_model(true), &VehicleConfig::default(), runner).unwrap();
        assert!(state.eval_frame(&[0.0; 3], None).is_err());
    }
}
