// src/decode/polyfit.rs
//
// Weighted least-squares polynomial fit over the fixed arc-length grid.
//
// Model:  p(x) = c₃·x³ + c₂·x² + c₁·x + y₀
//
// y₀ is not fitted. The first sample is taken as the local origin and
// subtracted from every target, and it is stored back as the last slot.
// The three remaining terms are solved with inverse-std weighting.
//
// Conditioning: on the squared-index grid x³ reaches ~7e6 while x¹ stays
// below 200, so each weighted basis column is rescaled to unit norm before
// the solve and the scale is undone afterwards. The solve itself is an SVD
// pseudo-inverse: a rank-deficient system (too few samples, absurd stds)
// still yields a minimum-norm answer instead of an error.

use super::grid::{grids, BASIS_COLUMNS};
use crate::layout::{POLYFIT_DEGREE, TRAJECTORY_SIZE};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

/// Singular values at or below this (after column scaling) are treated as zero.
const SVD_EPS: f64 = 1e-9;
const SVD_MAX_ITERATIONS: usize = 200;

/// Fit the first `valid_len` samples of `points` weighted by `stds`.
///
/// Returns `[c₃, c₂, c₁, y₀]`, highest order first.
pub fn poly_fit(points: &[f32], stds: &[f32], valid_len: usize) -> [f32; POLYFIT_DEGREE] {
    let n = valid_len
        .min(points.len())
        .min(stds.len())
        .min(TRAJECTORY_SIZE);

    let mut out = [0.0f32; POLYFIT_DEGREE];
    if n == 0 {
        warn!("poly_fit called with no samples, returning zero polynomial");
        return out;
    }

    let y0 = points[0];
    out[POLYFIT_DEGREE - 1] = y0;

    let basis = &grids().basis;
    let mut lhs = DMatrix::from_fn(n, BASIS_COLUMNS, |r, c| basis[(r, c)] / stds[r] as f64);
    let rhs = DVector::from_fn(n, |r, _| (points[r] - y0) as f64 / stds[r] as f64);

    let mut scale = [1.0f64; BASIS_COLUMNS];
    for (c, s) in scale.iter_mut().enumerate() {
        let norm = lhs.column(c).norm();
        if norm > 0.0 && norm.is_finite() {
            *s = 1.0 / norm;
            for r in 0..n {
                lhs[(r, c)] *= *s;
            }
        }
    }

    let solution = lhs
        .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .and_then(|svd| svd.solve(&rhs, SVD_EPS).ok());

    match solution {
        Some(p) => {
            for c in 0..BASIS_COLUMNS {
                out[c] = (p[c] * scale[c]) as f32;
            }
            debug!(
                "poly_fit n={} → [{:.3e}, {:.3e}, {:.4}, {:.3}]",
                n, out[0], out[1], out[2], out[3]
            );
        }
        None => {
            warn!(
                "⚠️ poly_fit: decomposition failed on {} samples, keeping intercept only",
                n
            );
        }
    }

    out
}

/// Evaluate a `[c₃, c₂, c₁, y₀]` polynomial at `x`.
pub fn poly_eval(poly: &[f32; POLYFIT_DEGREE], x: f32) -> f32 {
    poly.iter().fold(0.0, |acc, &c| acc * x + c)
}
