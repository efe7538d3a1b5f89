use colored::{ColoredString, Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    Strong,
    Good,
    Weak,
    Poor,
}

pub fn score_tier(score: u8) -> ScoreTier {
    match score {
        s if s > 95 => ScoreTier::Strong,
        s if s >= 80 => ScoreTier::Good,
        s if s >= 40 => ScoreTier::Weak,
        _ => ScoreTier::Poor,
    }
}

/// Score as `85%`, coloured by tier.
pub fn score_label(score: u8) -> ColoredString {
    let text = format!("{score}%");
    match score_tier(score) {
        ScoreTier::Strong => text.green(),
        ScoreTier::Good => text.blue(),
        ScoreTier::Weak => text.yellow(),
        ScoreTier::Poor => text.dimmed(),
    }
}

/// Shorten `s` to at most `max` characters, ending in `…` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_tiers() {
        assert_eq!(score_tier(100), ScoreTier::Strong);
        assert_eq!(score_tier(96), ScoreTier::Strong);
        assert_eq!(score_tier(95), ScoreTier::Good);
        assert_eq!(score_tier(85), ScoreTier::Good);
        assert_eq!(score_tier(80), ScoreTier::Good);
        assert_eq!(score_tier(50), ScoreTier::Weak);
        assert_eq!(score_tier(0), ScoreTier::Poor);
    }

    #[test]
    fn test_score_label_text() {
        colored::control::set_override(false);
        assert_eq!(score_label(85).to_string(), "85%");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Jane Doe", 20), "Jane Doe");
        assert_eq!(truncate("Budi Santoso Wijaya", 8), "Budi Sa…");
    }
}
