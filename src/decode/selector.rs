// src/decode/selector.rs
//
// Multi-hypothesis selection.
//
// The network emits several competing candidates per block (plan, lead),
// each a fixed-size group carrying its own score. We pick the group with the
// highest score and hand back a borrowed view of it. Ties keep the earliest
// candidate: only a strictly greater score replaces the current best.
//
// Candidate 0 is seeded through its own score field, exactly like every
// other candidate.

use crate::layout::{
    LeadHypothesis, PlanHypothesis, LEAD_MHP_GROUP_SIZE, LEAD_MHP_N, LEAD_MHP_SELECTION,
    PLAN_MHP_GROUP_SIZE, PLAN_MHP_N,
};

/// Index of the group whose score is maximal, first index on ties.
///
/// `score` receives a candidate group and returns its selection key.
pub fn best_group<F>(segment: &[f32], count: usize, group_size: usize, score: F) -> usize
where
    F: Fn(&[f32]) -> f32,
{
    debug_assert!(segment.len() >= count * group_size);
    let mut best = 0;
    let mut best_score = score(&segment[..group_size]);
    for i in 1..count {
        let group = &segment[i * group_size..(i + 1) * group_size];
        let s = score(group);
        if s > best_score {
            best = i;
            best_score = s;
        }
    }
    best
}

/// Most confident plan hypothesis.
pub fn select_plan(plan: &[f32]) -> (usize, PlanHypothesis<'_>) {
    let idx = best_group(plan, PLAN_MHP_N, PLAN_MHP_GROUP_SIZE, |g| {
        PlanHypothesis::new(g).score()
    });
    let start = idx * PLAN_MHP_GROUP_SIZE;
    (
        idx,
        PlanHypothesis::new(&plan[start..start + PLAN_MHP_GROUP_SIZE]),
    )
}

/// Most likely lead hypothesis for one time bucket. Each bucket selects
/// independently, so "now" and "+4s" may come from different hypotheses.
pub fn select_lead(leads: &[f32], bucket: usize) -> (usize, LeadHypothesis<'_>) {
    debug_assert!(bucket < LEAD_MHP_SELECTION);
    let idx = best_group(leads, LEAD_MHP_N, LEAD_MHP_GROUP_SIZE, |g| {
        LeadHypothesis::new(g).score(bucket)
    });
    let start = idx * LEAD_MHP_GROUP_SIZE;
    (
        idx,
        LeadHypothesis::new(&leads[start..start + LEAD_MHP_GROUP_SIZE]),
    )
}
