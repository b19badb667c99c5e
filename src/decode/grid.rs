// src/decode/grid.rs
//
// Fixed sample grids and the polynomial basis.
//
// Both grids follow the same squared-index progression, so samples are dense
// near the car and sparse far ahead:
//   x[i] = TRAJECTORY_DISTANCE · i² / 1024
//   t[i] = TRAJECTORY_TIME     · i² / 1024
//
// The basis holds, per sample, the powers x³, x², x¹ (no constant column;
// the intercept is recovered from the local origin in the fitter). Built
// once per process and read-only afterwards.

use crate::layout::{POLYFIT_DEGREE, TRAJECTORY_SIZE};
use nalgebra::DMatrix;
use std::sync::OnceLock;
use tracing::debug;

pub const TRAJECTORY_DISTANCE: f32 = 192.0;
pub const TRAJECTORY_TIME: f32 = 10.0;
/// Legacy valid-length bounds (meters).
pub const MIN_VALID_LEN: f32 = 10.0;
pub const MODEL_PATH_DISTANCE: f32 = 192.0;

/// Fitted columns (everything but the intercept).
pub const BASIS_COLUMNS: usize = POLYFIT_DEGREE - 1;

#[derive(Debug, Clone)]
pub struct SampleGrids {
    /// Arc-length grid (meters).
    pub x: [f32; TRAJECTORY_SIZE],
    /// Time grid (seconds).
    pub t: [f32; TRAJECTORY_SIZE],
    /// TRAJECTORY_SIZE × BASIS_COLUMNS, highest power first.
    pub basis: DMatrix<f64>,
}

impl SampleGrids {
    fn build() -> Self {
        let progression = |max: f32, i: usize| max / 1024.0 * (i * i) as f32;
        let x: [f32; TRAJECTORY_SIZE] = std::array::from_fn(|i| progression(TRAJECTORY_DISTANCE, i));
        let t: [f32; TRAJECTORY_SIZE] = std::array::from_fn(|i| progression(TRAJECTORY_TIME, i));

        let basis = DMatrix::from_fn(TRAJECTORY_SIZE, BASIS_COLUMNS, |r, c| {
            (x[r] as f64).powi((POLYFIT_DEGREE - c - 1) as i32)
        });

        debug!(
            "Sample grids built: x_max={:.1}m t_max={:.2}s basis={}x{}",
            x[TRAJECTORY_SIZE - 1],
            t[TRAJECTORY_SIZE - 1],
            basis.nrows(),
            basis.ncols()
        );

        Self { x, t, basis }
    }

    /// Number of leading arc-length samples whose distance is within
    /// `valid_len`, capped at TRAJECTORY_SIZE - 1. This is how many samples
    /// the legacy fit may use.
    pub fn valid_len_index(&self, valid_len: f32) -> usize {
        let mut idx = 0;
        for i in 1..TRAJECTORY_SIZE {
            if valid_len >= self.x[idx] {
                idx = i;
            }
        }
        idx
    }
}

pub(crate) static GRIDS: OnceLock<SampleGrids> = OnceLock::new();

/// Process-wide grids. Model contexts force the build at construction so
/// no frame pays for it.
pub fn grids() -> &'static SampleGrids {
    GRIDS.get_or_init(SampleGrids::build)
}
