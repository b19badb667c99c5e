// src/decode/meta.rs
//
// Intent ("desire") and disengagement meta.

use super::calibration::{sigmoid, softmax};
use crate::layout::{DESIRE_LEN, DESIRE_PRED_HORIZONS};
use crate::types::MetaData;

/// `desire_state`: current intent logits. `other_meta`: engaged, gas,
/// brake, steer logits. `desire_pred`: four intent logit groups.
pub fn decode_meta(desire_state: &[f32], other_meta: &[f32], desire_pred: &[f32]) -> MetaData {
    let mut desire_prediction = Vec::with_capacity(DESIRE_PRED_HORIZONS * DESIRE_LEN);
    for group in desire_pred.chunks_exact(DESIRE_LEN).take(DESIRE_PRED_HORIZONS) {
        desire_prediction.extend(softmax(group));
    }

    MetaData {
        desire_state: softmax(&desire_state[..DESIRE_LEN]),
        engaged_prob: sigmoid(other_meta[0]),
        gas_disengage_prob: sigmoid(other_meta[1]),
        brake_disengage_prob: sigmoid(other_meta[2]),
        steer_override_prob: sigmoid(other_meta[3]),
        desire_prediction,
    }
}
