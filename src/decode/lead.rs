// src/decode/lead.rs
//
// Lead vehicle tracks. Hypothesis selection happens per time bucket, the
// existence probability comes from the lead-prob segment for that bucket.

use super::calibration::sigmoid;
use super::selector::select_lead;
use crate::layout::{LEAD_MHP_VALS, LEAD_T_OFFSETS};
use crate::types::{LeadData, LeadDataV2};
use tracing::debug;

/// Legacy lead for `bucket` (0 = now, 1 = short future).
pub fn decode_lead(leads: &[f32], lead_probs: &[f32], bucket: usize) -> LeadData {
    let (idx, lead) = select_lead(leads, bucket);
    let xyva = lead.xyva();
    let std = lead.log_std();
    debug!("lead bucket {} → hypothesis {}", bucket, idx);

    LeadData {
        prob: sigmoid(lead_probs[bucket]),
        dist: xyva[0],
        std: std[0].exp(),
        rel_y: -xyva[1],
        rel_y_std: std[1].exp(),
        rel_vel: xyva[2],
        rel_vel_std: std[2].exp(),
        rel_a: xyva[3],
        rel_a_std: std[3].exp(),
    }
}

/// Lead at the fixed time offset of `bucket`.
pub fn decode_lead_v2(leads: &[f32], lead_probs: &[f32], bucket: usize) -> LeadDataV2 {
    let (idx, lead) = select_lead(leads, bucket);
    debug!(
        "lead t={:.0}s → hypothesis {}",
        LEAD_T_OFFSETS[bucket], idx
    );

    let mut xyva = [0.0f32; LEAD_MHP_VALS];
    let mut xyva_std = [0.0f32; LEAD_MHP_VALS];
    xyva.copy_from_slice(lead.xyva());
    for (dst, &log_std) in xyva_std.iter_mut().zip(lead.log_std()) {
        *dst = log_std.exp();
    }

    LeadDataV2 {
        t: LEAD_T_OFFSETS[bucket],
        prob: sigmoid(lead_probs[bucket]),
        xyva,
        xyva_std,
    }
}
