use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single scalar cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// Text form used for keys and comparisons. Integral numbers print without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => format_number(*n),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One record: field names in source order, as they appeared in the source.
///
/// Storage is case-preserving. The `*_ci` accessors fold case at lookup time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = Self::new();
        for (k, v) in pairs {
            row.set(k, v.into());
        }
        row
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    pub fn get_ci(&self, field: &str) -> Option<&Value> {
        let field = field.to_lowercase();
        self.fields
            .iter()
            .find(|(k, _)| k.to_lowercase() == field)
            .map(|(_, v)| v)
    }

    /// Text of `field` (exact name), empty when absent.
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(Value::as_text).unwrap_or_default()
    }

    /// Text of `field` looked up case-insensitively, empty when absent.
    pub fn text_ci(&self, field: &str) -> String {
        self.get_ci(field).map(Value::as_text).unwrap_or_default()
    }

    /// Insert or replace. A replaced field keeps its position.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some((_, v)) => *v = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Insert `field` as the first column, dropping any previous occurrence.
    pub fn set_first(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        self.fields.retain(|(k, _)| *k != field);
        self.fields.insert(0, (field, value));
    }

    /// A copy of `self` with every field of `top` written over it.
    /// Field identity is case-sensitive; `top` wins on collision.
    pub fn overlay(&self, top: &Row) -> Row {
        let mut merged = self.clone();
        for (k, v) in &top.fields {
            merged.set(k.clone(), v.clone());
        }
        merged
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Row, A::Error> {
                let mut row = Row::new();
                while let Some((k, v)) = access.next_entry::<String, Value>()? {
                    row.set(k, v);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// A parsed table: unique headers plus header-keyed rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Header spelled the way this dataset spells it, matched case-insensitively.
    pub fn find_header(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.headers
            .iter()
            .find(|h| h.to_lowercase() == key)
            .map(String::as_str)
    }
}

/// An unmatched incoming row with its best-scoring reference row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub source: Row,
    /// Index into the reference dataset's rows.
    pub best_match: Option<usize>,
    pub score: u8,
}

/// Parsed grid for callers that address cells by position.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    pub sheet_name: String,
    pub rows: Vec<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_text() {
        assert_eq!(Value::Number(12.0).as_text(), "12");
        assert_eq!(Value::Number(1.5).as_text(), "1.5");
        assert_eq!(Value::Null.as_text(), "");
        assert!(Value::Text("   ".into()).is_blank());
        assert!(!Value::Number(0.0).is_blank());
    }

    #[test]
    fn test_overlay_top_wins_and_keeps_order() {
        let a = Row::from_pairs([("NISN", "1"), ("Nama", "Jane Doe")]);
        let b = Row::from_pairs([("NISN", "1"), ("id", "99")]);
        let merged = a.overlay(&b);
        let keys: Vec<&str> = merged.keys().collect();
        assert_eq!(keys, vec!["NISN", "Nama", "id"]);
        assert_eq!(merged.text("id"), "99");
    }

    #[test]
    fn test_overlay_is_case_sensitive() {
        let a = Row::from_pairs([("Nama", "Jane")]);
        let b = Row::from_pairs([("nama", "JANE")]);
        let merged = a.overlay(&b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.text("Nama"), "Jane");
        assert_eq!(merged.text_ci("NAMA"), "Jane");
    }

    #[test]
    fn test_set_first_moves_field() {
        let mut row = Row::from_pairs([("a", "1"), ("No", "9")]);
        row.set_first("No", Value::Number(1.0));
        let keys: Vec<&str> = row.keys().collect();
        assert_eq!(keys, vec!["No", "a"]);
        assert_eq!(row.text("No"), "1");
    }

    #[test]
    fn test_row_json_preserves_order() {
        let row = Row::from_pairs([("z", Value::from("1")), ("a", Value::Number(2.0)), ("m", Value::Null)]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"z":"1","a":2.0,"m":null}"#);
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
