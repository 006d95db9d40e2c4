use crate::error::{Result, TableError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

static TEXT_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// Returns true when `text` is non-empty and holds only ASCII letters,
/// ASCII digits and spaces. Column names and values share this rule.
pub fn is_valid_text(text: &str) -> bool {
    TEXT_PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9 ]+$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(text))
}

/// One row: an ordered list of (column, value) pairs.
///
/// Equality and hashing are value based over every pair, so a record read
/// back from a file is equal to the in-memory record it was written from.
/// A record has no setters; tables share it behind an `Rc` once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Pairs `columns[i]` with `values[i]`.
    pub fn new<C, V>(columns: &[C], values: &[V]) -> Result<Self>
    where
        C: AsRef<str>,
        V: AsRef<str>,
    {
        if columns.len() != values.len() {
            return Err(TableError::validation(format!(
                "record has {} columns but {} values",
                columns.len(),
                values.len()
            )));
        }
        Self::from_pairs(
            columns
                .iter()
                .zip(values.iter())
                .map(|(column, value)| (column.as_ref(), value.as_ref())),
        )
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(column, value)| (column.into(), value.into()))
            .collect();
        let mut seen = HashSet::new();
        for (column, _) in &fields {
            if !seen.insert(column.as_str()) {
                return Err(TableError::validation(format!(
                    "duplicate column in record: {}",
                    column
                )));
            }
        }
        Ok(Self { fields })
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(column, _)| column.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(column, value)| (column.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Checks this record against `schema` and returns it with its pairs in
    /// schema order. Every schema column must be present exactly once, no
    /// other column may appear, and every value must be valid text.
    pub(crate) fn conform(&self, schema: &[String]) -> Result<Record> {
        if self.fields.len() != schema.len() {
            return Err(TableError::validation(format!(
                "record has {} columns, table has {}",
                self.fields.len(),
                schema.len()
            )));
        }
        let mut fields = Vec::with_capacity(schema.len());
        for column in schema {
            let value = self.get(column).ok_or_else(|| {
                TableError::validation(format!("record is missing column {}", column))
            })?;
            if !is_valid_text(value) {
                return Err(TableError::validation(format!(
                    "value for column {} is not alphanumeric: {:?}",
                    column, value
                )));
            }
            fields.push((column.clone(), value.to_string()));
        }
        Ok(Record { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rule_accepts_letters_digits_spaces() {
        assert!(is_valid_text("Smith"));
        assert!(is_valid_text("van der Berg 2"));
        assert!(is_valid_text("  "));
        assert!(!is_valid_text(""));
        assert!(!is_valid_text("a,b"));
        assert!(!is_valid_text("o'neil"));
        assert!(!is_valid_text("caf\u{e9}"));
    }

    #[test]
    fn conform_reorders_to_schema() {
        let schema = vec!["id".to_string(), "name".to_string()];
        let record = Record::new(&["name", "id"], &["Ann", "7"]).unwrap();
        let conformed = record.conform(&schema).unwrap();
        assert_eq!(conformed.columns().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(conformed.get("name"), Some("Ann"));
    }

    #[test]
    fn conform_rejects_extra_and_missing_columns() {
        let schema = vec!["id".to_string()];
        let extra = Record::new(&["id", "name"], &["1", "Ann"]).unwrap();
        assert!(matches!(extra.conform(&schema), Err(TableError::Validation(_))));
        let missing = Record::new(&["name"], &["Ann"]).unwrap();
        assert!(matches!(missing.conform(&schema), Err(TableError::Validation(_))));
    }

    #[test]
    fn duplicate_columns_rejected() {
        let err = Record::new(&["id", "id"], &["1", "2"]).unwrap_err();
        assert!(err.to_string().contains("duplicate column"));
    }
}
