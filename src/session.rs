//! Review state for one merge: matched rows, open candidates and manual selections.
//!
//! Every incoming row is either in `matched` or held by exactly one candidate.
//! Selections are keyed by the incoming row's merge-key text and point into
//! the reference dataset.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::auto_matcher::auto_match;
use crate::error::{Result, WeaverError};
use crate::joiner::join;
use crate::models::{Dataset, MatchCandidate, Row, Value};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceFile {
    pub path: String,
    pub checksum: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    Unresolved,
    Selected(usize),
    Committed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub merge_key: String,
    pub key_a: String,
    pub key_b: String,
    pub identity_field: String,
    pub sequence_field: String,
    pub reference: Dataset,
    pub incoming: Dataset,
    pub matched: Vec<Row>,
    pub candidates: Vec<MatchCandidate>,
    pub selections: BTreeMap<String, usize>,
    #[serde(default)]
    pub sources: Vec<SourceFile>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Run the exact join and the auto-matcher, recording high-confidence
    /// matches as selections.
    pub fn start(
        reference: Dataset,
        incoming: Dataset,
        merge_key: &str,
        identity_field: &str,
        sequence_field: &str,
    ) -> Result<Session> {
        let outcome = join(&reference, &incoming, merge_key, identity_field)?;
        // join() already validated both headers
        let key_a = reference.find_header(merge_key).unwrap_or(merge_key).to_string();
        let key_b = incoming.find_header(merge_key).unwrap_or(merge_key).to_string();

        let matched: Vec<Row> = outcome
            .matched
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                row.set_first(sequence_field, Value::Number((i + 1) as f64));
                row
            })
            .collect();

        let candidates = auto_match(outcome.unmatched, &reference.rows, &key_a, &key_b, identity_field);

        let mut session = Session {
            merge_key: merge_key.to_string(),
            key_a,
            key_b,
            identity_field: identity_field.to_string(),
            sequence_field: sequence_field.to_string(),
            reference,
            incoming,
            matched,
            candidates,
            selections: BTreeMap::new(),
            sources: Vec::new(),
            created_at: Utc::now(),
        };

        let auto: Vec<(String, usize)> = session
            .candidates
            .iter()
            .filter(|c| c.is_auto_accepted())
            .filter_map(|c| c.best_match.map(|i| (session.candidate_key(c), i)))
            .collect();
        for (key, target) in auto {
            session.selections.insert(key, target);
        }
        info!(
            "session started: {} matched, {} candidates, {} auto-selected",
            session.matched.len(),
            session.candidates.len(),
            session.selections.len()
        );
        Ok(session)
    }

    pub fn candidate_key(&self, candidate: &MatchCandidate) -> String {
        candidate.source.text(&self.key_b)
    }

    pub fn find_candidate(&self, key: &str) -> Option<&MatchCandidate> {
        self.candidates.iter().find(|c| self.candidate_key(c) == key)
    }

    pub fn selection(&self, key: &str) -> Option<usize> {
        self.selections.get(key).copied()
    }

    pub fn state(&self, key: &str) -> Option<CandidateState> {
        if self.find_candidate(key).is_some() {
            return Some(match self.selection(key) {
                Some(i) => CandidateState::Selected(i),
                None => CandidateState::Unresolved,
            });
        }
        self.matched
            .iter()
            .any(|row| row.text(&self.key_b) == key)
            .then_some(CandidateState::Committed)
    }

    fn is_eligible_target(&self, index: usize) -> bool {
        self.reference
            .rows
            .get(index)
            .and_then(|row| row.get_ci(&self.identity_field))
            .is_some_and(|v| !v.is_blank())
    }

    /// Choose `target` for the candidate keyed `key`. Selection is not
    /// exclusive: the same reference row may be selected for several candidates.
    pub fn select(&mut self, key: &str, target: usize) -> Result<()> {
        if self.find_candidate(key).is_none() {
            return Err(WeaverError::UnknownCandidate(key.to_string()));
        }
        if !self.is_eligible_target(target) {
            return Err(WeaverError::UnknownTarget(format!("row {}", target + 1)));
        }
        debug!("select {key} -> reference row {target}");
        self.selections.insert(key.to_string(), target);
        Ok(())
    }

    /// Returns whether a selection was removed.
    pub fn deselect(&mut self, key: &str) -> bool {
        self.selections.remove(key).is_some()
    }

    /// First eligible reference row whose merge-key value equals `value`, ignoring case.
    pub fn find_target(&self, value: &str) -> Option<usize> {
        let wanted = value.trim().to_lowercase();
        (0..self.reference.rows.len()).find(|&i| {
            self.is_eligible_target(i)
                && self.reference.rows[i].text(&self.key_a).trim().to_lowercase() == wanted
        })
    }

    /// Move every selected candidate into the matched rows. Returns how many
    /// rows were committed; zero selections is a no-op.
    pub fn commit_all(&mut self) -> usize {
        let mut committed_keys = HashSet::new();
        let mut count = 0usize;
        let mut remaining = Vec::with_capacity(self.candidates.len());

        for candidate in std::mem::take(&mut self.candidates) {
            let key = self.candidate_key(&candidate);
            let target = self.selections.get(&key).and_then(|&i| self.reference.rows.get(i));
            match target {
                Some(a) => {
                    let mut merged = a.overlay(&candidate.source);
                    let sequence = Value::Number((self.matched.len() + 1) as f64);
                    merged.set_first(self.sequence_field.clone(), sequence);
                    self.matched.push(merged);
                    committed_keys.insert(key);
                    count += 1;
                }
                None => remaining.push(candidate),
            }
        }

        self.candidates = remaining;
        for key in &committed_keys {
            self.selections.remove(key);
        }
        info!("committed {count} rows, {} still open", self.candidates.len());
        count
    }

    /// Reference rows offered for the candidate keyed `key`: rows whose
    /// merge-key value is not already matched or selected elsewhere, plus the
    /// row currently chosen for this candidate.
    pub fn available_targets(&self, key: &str) -> Vec<usize> {
        let value_of = |i: usize| -> String {
            self.reference
                .rows
                .get(i)
                .map(|r| r.text(&self.key_a).to_lowercase())
                .unwrap_or_default()
        };

        let taken: HashSet<String> = self
            .matched
            .iter()
            .map(|row| row.text(&self.key_a).to_lowercase())
            .chain(self.selections.values().map(|&i| value_of(i)))
            .filter(|v| !v.is_empty())
            .collect();

        let current = self
            .selection(key)
            .or_else(|| self.find_candidate(key).and_then(|c| c.best_match))
            .map(value_of);

        (0..self.reference.rows.len())
            .filter(|&i| {
                let value = value_of(i);
                !taken.contains(&value) || current.as_deref() == Some(value.as_str())
            })
            .collect()
    }

    /// Matched rows projected onto `headers`, looked up case-insensitively.
    pub fn result_table(&self, headers: &[String]) -> Vec<Vec<String>> {
        self.matched
            .iter()
            .map(|row| headers.iter().map(|h| row.text_ci(h)).collect())
            .collect()
    }

    pub fn load(path: &Path) -> Result<Option<Session>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }
}

/// File B must carry some id column, matched as a case-insensitive substring.
pub fn require_id_column(incoming: &Dataset) -> Result<()> {
    if incoming.headers.iter().any(|h| h.to_lowercase().contains("id")) {
        Ok(())
    } else {
        Err(WeaverError::MissingIdColumn)
    }
}

/// A's headers that also appear in B, compared case-insensitively, in A's spelling.
pub fn common_headers(a: &Dataset, b: &Dataset) -> Vec<String> {
    a.headers
        .iter()
        .filter(|h| b.find_header(h).is_some())
        .cloned()
        .collect()
}

/// Preferred key if common, else the saved default if still common, else the first common header.
pub fn suggest_merge_key(common: &[String], preferred: &str, saved: Option<&str>) -> Option<String> {
    let find = |key: &str| common.iter().find(|h| h.to_lowercase() == key.to_lowercase()).cloned();
    find(preferred)
        .or_else(|| saved.and_then(find))
        .or_else(|| common.first().cloned())
}

/// Sequence field, then A's and B's headers, de-duplicated ignoring case (first spelling wins).
pub fn merged_headers(a: &Dataset, b: &Dataset, sequence_field: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(sequence_field.to_string())
        .chain(a.headers.iter().cloned())
        .chain(b.headers.iter().cloned())
        .filter(|h| seen.insert(h.to_lowercase()))
        .collect()
}
