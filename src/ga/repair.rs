//! Feasibility repair for chromosomes.

use super::types::Encoding;

/// Restores feasibility by dropping genes, lowest density first.
///
/// A selected gene is dropped only while it contributes to a rule that is
/// still broken: the global quota, its author's total cap, or (for
/// monographs) its author's monograph cap. FORCED_IN candidates have no gene
/// and are never dropped; because they are feasible on their own, one pass is
/// enough. Pure: the outcome depends only on `genes` and `encoding`.
pub fn repair(genes: &mut [bool], encoding: &Encoding<'_>) {
    let (mut tracker, _) = encoding.pinned().base_state();
    for (g, &on) in genes.iter().enumerate() {
        if on {
            tracker.admit(encoding.candidate(g));
        }
    }
    if tracker.is_feasible() {
        return;
    }

    for &g in encoding.removal_order() {
        if !genes[g] {
            continue;
        }
        let candidate = encoding.candidate(g);
        let author = candidate.author_id();
        let contributes = tracker.global_exceeded()
            || tracker.author_exceeded(author)
            || (candidate.is_monograph() && tracker.author_monograph_exceeded(author));
        if contributes {
            tracker.release(candidate);
            genes[g] = false;
        }
    }
}
