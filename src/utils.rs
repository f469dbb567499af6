//! Shared numerical helpers used by the selection and tree-evaluation
//! policies.

/// UCB exploration term: `c * sqrt(parent_visits / child_visits)`.
///
/// Requires `child_visits >= 1`; every expanded child has been evaluated
/// (and therefore visited) exactly once before the next selection, so this
/// is always safe to call on an expanded child.
pub fn ucb_exploration_term(parent_visits: u64, child_visits: u64, exploration_constant: f64) -> f64 {
    debug_assert!(child_visits >= 1, "ucb exploration term requires a visited child");
    exploration_constant * (parent_visits as f64 / child_visits as f64).sqrt()
}

/// PUCT exploration term: `c * prior * sqrt(parent_visits) / (1 + child_visits)`.
pub fn puct_exploration_term(
    parent_visits: u64,
    child_visits: u64,
    prior: f32,
    exploration_constant: f64,
) -> f64 {
    exploration_constant * prior as f64 * (parent_visits as f64).sqrt() / (1.0 + child_visits as f64)
}

/// Softmax of `scores / temperature`, returning a probability for each
/// input score. Panics only on debug builds if `scores` is empty, since an
/// empty distribution is always a caller bug.
pub fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    debug_assert!(!scores.is_empty());
    debug_assert!(temperature > 0.0);

    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores
        .iter()
        .map(|s| ((s - max) / temperature).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    if sum <= 0.0 {
        let uniform = 1.0 / scores.len() as f64;
        return vec![uniform; scores.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}

/// Normalizes non-negative raw scores into a probability distribution
/// proportional to each score. If every score is zero the result is
/// uniform, matching the `T = None` contract ("proportional to raw
/// scores") without dividing by zero.
pub fn proportional(scores: &[f64]) -> Vec<f64> {
    debug_assert!(scores.iter().all(|s| *s >= 0.0));
    let sum: f64 = scores.iter().sum();
    if sum <= 0.0 {
        let uniform = 1.0 / scores.len() as f64;
        return vec![uniform; scores.len()];
    }
    scores.iter().map(|s| s / sum).collect()
}

/// Returns the indices attaining the maximum score, used for `T = 0`
/// argmax-with-uniform-tie-break semantics and for lowest-index tie break
/// in the selection policies.
pub fn argmax_set(scores: &[f64]) -> Vec<usize> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    scores
        .iter()
        .enumerate()
        .filter_map(|(i, s)| (*s == max).then_some(i))
        .collect()
}
