use log::info;

use crate::models::{MatchCandidate, Row};
use crate::scorer::{score_values, SCORE_NONE};

/// Candidates scoring above this are selected without user action.
pub const AUTO_ACCEPT_THRESHOLD: u8 = 80;

impl MatchCandidate {
    pub fn is_auto_accepted(&self) -> bool {
        self.best_match.is_some() && self.score > AUTO_ACCEPT_THRESHOLD
    }
}

/// Pair every unmatched incoming row with its best-scoring reference row.
///
/// Every eligible reference row is scanned for every incoming row, so one
/// reference row may be the best match of several candidates. Ties keep the
/// first reference row encountered. Rows without an identity value are not
/// eligible targets. The result is sorted by score, highest first (stable).
pub fn auto_match(
    unmatched: Vec<Row>,
    reference: &[Row],
    key_a: &str,
    key_b: &str,
    identity_field: &str,
) -> Vec<MatchCandidate> {
    let eligible: Vec<(usize, &Row)> = reference
        .iter()
        .enumerate()
        .filter(|(_, row)| row.get_ci(identity_field).is_some_and(|v| !v.is_blank()))
        .filter(|(_, row)| row.get(key_a).is_some_and(|v| !v.is_blank()))
        .collect();

    let mut candidates: Vec<MatchCandidate> = unmatched
        .into_iter()
        .map(|source| {
            let name = source.get(key_b);
            let mut best_match = None;
            let mut best_score = SCORE_NONE;
            for (i, row) in &eligible {
                let s = score_values(row.get(key_a), name);
                if s > best_score {
                    best_score = s;
                    best_match = Some(*i);
                }
            }
            MatchCandidate {
                source,
                best_match,
                score: best_score,
            }
        })
        .collect();

    candidates.sort_by(|a, b| b.score.cmp(&a.score));

    let auto = candidates.iter().filter(|c| c.is_auto_accepted()).count();
    info!("auto-match: {} candidates, {auto} above threshold", candidates.len());
    candidates
}
