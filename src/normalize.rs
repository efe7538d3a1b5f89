//! Canonical forms of raw field values used for matching.

use crate::models::Value;

/// Lower-cased text with whitespace, hyphens, periods, commas and apostrophes removed.
pub fn collapse(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '.' | ',' | '\'')))
        .collect()
}

/// Lower-cased words. Anything other than ASCII letters, digits, underscore
/// or whitespace acts as a separator; empty tokens are dropped.
pub fn tokens(raw: &str) -> Vec<String> {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Join-key form: lower-cased and trimmed.
pub fn join_key(value: Option<&Value>) -> String {
    value
        .map(|v| v.as_text().trim().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_strips_punctuation() {
        assert_eq!(collapse("O'Neil-Smith, Jr."), "oneilsmithjr");
        assert_eq!(collapse("  Jane   Doe "), "janedoe");
        assert_eq!(collapse(""), "");
    }

    #[test]
    fn test_tokens_split_on_punctuation() {
        assert_eq!(tokens("Jane-Doe, Smith"), vec!["jane", "doe", "smith"]);
        assert_eq!(tokens("  "), Vec::<String>::new());
        assert_eq!(tokens("a_b c"), vec!["a_b", "c"]);
    }

    #[test]
    fn test_tokens_non_ascii_letters_separate() {
        assert_eq!(tokens("José"), vec!["jos"]);
    }

    #[test]
    fn test_absent_values_are_empty() {
        assert_eq!(join_key(None), "");
        assert_eq!(join_key(Some(&Value::Null)), "");
        assert_eq!(join_key(Some(&Value::from("  ABC "))), "abc");
        assert_eq!(join_key(Some(&Value::Number(7.0))), "7");
    }
}
