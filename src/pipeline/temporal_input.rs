// src/pipeline/temporal_input.rs
//
// Network input state that persists across frames.
//
// TemporalInput: the network sees two consecutive frames concatenated
// ([older | newer]). Each new frame shifts newer → older and lands in the
// newer slot.
//
// DesirePulse: the model decides by itself when a requested maneuver is
// finished, so a command must only be presented on its rising edge. A
// channel pulses (emits its new value) when it rose by more than 0.99
// since the previous frame, otherwise it emits 0. The previous value is
// updated every frame whether or not a pulse fired.

use anyhow::{ensure, Result};
use tracing::{debug, warn};

/// Minimum frame-to-frame rise that counts as a rising edge.
pub const DESIRE_PULSE_THRESHOLD: f32 = 0.99;

// ============================================================================
// TWO-FRAME WINDOW
// ============================================================================

pub struct TemporalInput {
    frame_size: usize,
    frames: Vec<f32>,
}

impl TemporalInput {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame_size,
            frames: vec![0.0; 2 * frame_size],
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Shift the window and copy in a freshly preprocessed frame.
    pub fn push(&mut self, frame: &[f32]) -> Result<()> {
        ensure!(
            frame.len() == self.frame_size,
            "Preprocessed frame has {} floats, expected {}",
            frame.len(),
            self.frame_size
        );
        self.frames.copy_within(self.frame_size.., 0);
        self.frames[self.frame_size..].copy_from_slice(frame);
        Ok(())
    }

    /// `[older | newer]`, as fed to the network.
    pub fn window(&self) -> &[f32] {
        &self.frames
    }

    pub fn older(&self) -> &[f32] {
        &self.frames[..self.frame_size]
    }

    pub fn newer(&self) -> &[f32] {
        &self.frames[self.frame_size..]
    }
}

// ============================================================================
// RISING-EDGE PULSE
// ============================================================================

pub struct DesirePulse {
    prev: Vec<f32>,
    pulse: Vec<f32>,
}

impl DesirePulse {
    pub fn new(len: usize) -> Self {
        Self {
            prev: vec![0.0; len],
            pulse: vec![0.0; len],
        }
    }

    /// Encode this frame's raw command. With no command this frame the
    /// pulse is cleared and the previous values are kept.
    pub fn update(&mut self, desire: Option<&[f32]>) -> &[f32] {
        let Some(desire) = desire else {
            self.pulse.fill(0.0);
            return &self.pulse;
        };

        if desire.len() != self.prev.len() {
            warn!(
                "Desire input has {} channels, expected {}; unmatched channels emit 0",
                desire.len(),
                self.prev.len()
            );
        }

        // Channels without input this frame never pulse
        self.pulse.fill(0.0);
        for ((prev, pulse), &value) in self.prev.iter_mut().zip(self.pulse.iter_mut()).zip(desire) {
            *pulse = if value - *prev > DESIRE_PULSE_THRESHOLD {
                value
            } else {
                0.0
            };
            *prev = value;
        }

        if self.pulse.iter().any(|&p| p != 0.0) {
            debug!("Desire pulse: {:?}", self.pulse);
        }
        &self.pulse
    }

    pub fn pulse(&self) -> &[f32] {
        &self.pulse
    }

    pub fn previous(&self) -> &[f32] {
        &self.prev
    }
}
