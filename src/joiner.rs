use std::collections::HashMap;

use log::{debug, info};

use crate::error::{Result, WeaverError};
use crate::models::{Dataset, Row};
use crate::normalize::join_key;

/// Result of the exact-key join. Rows keep the order of the incoming dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinOutcome {
    pub matched: Vec<Row>,
    pub unmatched: Vec<Row>,
}

/// Join `incoming` onto `reference` by `merge_key` (case-insensitive header and value).
///
/// Duplicate keys in `reference` are tolerated; the first row in source order
/// that carries an identity value wins. Merged rows are the reference row with
/// the incoming row's fields written over it.
pub fn join(reference: &Dataset, incoming: &Dataset, merge_key: &str, identity_field: &str) -> Result<JoinOutcome> {
    let key_a = reference
        .find_header(merge_key)
        .ok_or_else(|| WeaverError::MissingMergeKey {
            key: merge_key.to_string(),
            file: "File A",
        })?;
    let key_b = incoming
        .find_header(merge_key)
        .ok_or_else(|| WeaverError::MissingMergeKey {
            key: merge_key.to_string(),
            file: "File B",
        })?;
    let identity = reference
        .find_header(identity_field)
        .ok_or_else(|| WeaverError::MissingIdentityField(identity_field.to_string()))?;

    let mut index: HashMap<String, Vec<&Row>> = HashMap::new();
    for row in &reference.rows {
        let key = join_key(row.get(key_a));
        let has_identity = row.get(identity).is_some_and(|v| !v.is_blank());
        if !key.is_empty() && has_identity {
            index.entry(key).or_default().push(row);
        }
    }
    debug!("join index: {} keys from {} reference rows", index.len(), reference.rows.len());

    let mut outcome = JoinOutcome::default();
    for row in &incoming.rows {
        let key = join_key(row.get(key_b));
        let target = if key.is_empty() {
            None
        } else {
            index.get(&key).and_then(|bucket| bucket.first())
        };
        match target {
            Some(a) => outcome.matched.push(a.overlay(row)),
            None => outcome.unmatched.push(row.clone()),
        }
    }

    info!(
        "joined on {merge_key}: {} matched, {} unmatched",
        outcome.matched.len(),
        outcome.unmatched.len()
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn dataset(headers: &[&str], rows: &[&[(&str, &str)]]) -> Dataset {
        Dataset::new(
            "test",
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter().map(|r| Row::from_pairs(r.iter().copied())).collect(),
        )
    }

    #[test]
    fn test_basic_join() {
        let a = dataset(&["NISN", "Nama"], &[&[("NISN", "1"), ("Nama", "Jane Doe")]]);
        let b = dataset(&["NISN", "id"], &[&[("NISN", "1"), ("id", "99")]]);
        let out = join(&a, &b, "NISN", "NISN").unwrap();
        assert_eq!(
            out.matched,
            vec![Row::from_pairs([("NISN", "1"), ("Nama", "Jane Doe"), ("id", "99")])]
        );
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn test_empty_identity_never_matches() {
        let a = dataset(&["NISN", "Nama"], &[&[("NISN", ""), ("Nama", "Jane")]]);
        let b = dataset(&["NISN", "id"], &[&[("NISN", ""), ("id", "1")]]);
        let out = join(&a, &b, "NISN", "NISN").unwrap();
        assert!(out.matched.is_empty());
        assert_eq!(out.unmatched, vec![Row::from_pairs([("NISN", ""), ("id", "1")])]);
    }

    #[test]
    fn test_equal_keys_but_blank_identity_is_skipped() {
        let a = dataset(
            &["Nama", "NISN"],
            &[
                &[("Nama", "Jane"), ("NISN", " ")],
                &[("Nama", "Jane"), ("NISN", "55")],
            ],
        );
        let b = dataset(&["nama", "id"], &[&[("nama", "JANE "), ("id", "1")]]);
        let out = join(&a, &b, "Nama", "NISN").unwrap();
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.matched[0].text("NISN"), "55");
    }

    #[test]
    fn test_first_valid_duplicate_wins() {
        let a = dataset(
            &["Nama", "NISN"],
            &[
                &[("Nama", "Budi"), ("NISN", "10")],
                &[("Nama", "budi"), ("NISN", "20")],
            ],
        );
        let b = dataset(&["Nama", "id"], &[&[("Nama", "BUDI"), ("id", "x")]]);
        let out = join(&a, &b, "nama", "nisn").unwrap();
        assert_eq!(out.matched[0].text("NISN"), "10");
        // incoming spelling wins for the shared field
        assert_eq!(out.matched[0].text("Nama"), "BUDI");
    }

    #[test]
    fn test_deterministic() {
        let a = dataset(
            &["Nama", "NISN"],
            &[&[("Nama", "A"), ("NISN", "1")], &[("Nama", "B"), ("NISN", "2")]],
        );
        let b = dataset(
            &["Nama", "id"],
            &[&[("Nama", "b"), ("id", "1")], &[("Nama", "c"), ("id", "2")], &[("Nama", "a"), ("id", "3")]],
        );
        let first = join(&a, &b, "Nama", "NISN").unwrap();
        let second = join(&a, &b, "Nama", "NISN").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.matched[0].text("id"), "1");
        assert_eq!(first.matched[1].text("id"), "3");
    }

    #[test]
    fn test_numeric_keys_match_text_keys() {
        let mut a = dataset(&["NISN", "Nama"], &[]);
        a.rows.push(Row::from_pairs([("NISN", Value::Number(123.0)), ("Nama", Value::from("X"))]));
        let b = dataset(&["nisn", "id"], &[&[("nisn", "123"), ("id", "9")]]);
        let out = join(&a, &b, "NISN", "NISN").unwrap();
        assert_eq!(out.matched.len(), 1);
    }

    #[test]
    fn test_missing_key_in_reference() {
        let a = dataset(&["Nama", "NISN"], &[]);
        let b = dataset(&["Kelas"], &[]);
        let err = join(&a, &b, "Kelas", "NISN").unwrap_err();
        assert!(matches!(err, WeaverError::MissingMergeKey { file: "File A", .. }));
    }

    #[test]
    fn test_missing_key_in_incoming() {
        let a = dataset(&["Nama", "NISN"], &[]);
        let b = dataset(&["id"], &[&[("id", "1")]]);
        let err = join(&a, &b, "Nama", "NISN").unwrap_err();
        assert!(matches!(err, WeaverError::MissingMergeKey { file: "File B", .. }));
    }

    #[test]
    fn test_missing_identity_header() {
        let a = dataset(&["Nama"], &[]);
        let b = dataset(&["Nama"], &[]);
        let err = join(&a, &b, "Nama", "NISN").unwrap_err();
        assert!(matches!(err, WeaverError::MissingIdentityField(_)));
    }
}
