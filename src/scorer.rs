use std::collections::HashSet;

use crate::models::Value;
use crate::normalize::{collapse, tokens};

pub const SCORE_EXACT: u8 = 100;
pub const SCORE_MULTI_TOKEN: u8 = 85;
pub const SCORE_SINGLE_TOKEN: u8 = 50;
pub const SCORE_NONE: u8 = 0;

/// Confidence that two field values name the same thing: one of 0, 50, 85 or 100.
pub fn score(a: &str, b: &str) -> u8 {
    let collapsed_a = collapse(a);
    let collapsed_b = collapse(b);
    if collapsed_a.is_empty() || collapsed_b.is_empty() {
        return SCORE_NONE;
    }
    if collapsed_a == collapsed_b {
        return SCORE_EXACT;
    }

    let tokens_a: HashSet<String> = tokens(a).into_iter().collect();
    let tokens_b: HashSet<String> = tokens(b).into_iter().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return SCORE_NONE;
    }

    match tokens_a.intersection(&tokens_b).count() {
        0 => SCORE_NONE,
        1 => SCORE_SINGLE_TOKEN,
        _ => SCORE_MULTI_TOKEN,
    }
}

pub fn score_values(a: Option<&Value>, b: Option<&Value>) -> u8 {
    match (a, b) {
        (Some(a), Some(b)) => score(&a.as_text(), &b.as_text()),
        _ => SCORE_NONE,
    }
}
