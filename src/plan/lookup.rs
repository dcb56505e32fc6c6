//! Code books: read-only identifier → display name tables supplied by the UI layer.

use crate::error::CompositionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeBook {
    entries: BTreeMap<String, String>,
}

impl CodeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, name: impl Into<String>) {
        self.entries.insert(code.into(), name.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look a code up. Numeric codes match their decimal string form.
    pub fn name_of(&self, code: &Value) -> Option<&str> {
        code_key(code).and_then(|key| self.entries.get(&key).map(String::as_str))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CodeBook {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// All code books available to one composition, keyed by book name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTables {
    books: HashMap<String, CodeBook>,
}

impl LookupTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(mut self, name: impl Into<String>, book: CodeBook) -> Self {
        self.books.insert(name.into(), book);
        self
    }

    pub fn book(&self, name: &str) -> Result<&CodeBook, CompositionError> {
        self.books
            .get(name)
            .ok_or_else(|| CompositionError::UnknownCodeBook {
                book: name.to_string(),
            })
    }

    /// Resolve `code` in book `name` to its display name.
    pub fn resolve(&self, name: &str, code: &Value) -> Result<String, CompositionError> {
        self.book(name)?
            .name_of(code)
            .map(str::to_string)
            .ok_or_else(|| CompositionError::UnknownCode {
                book: name.to_string(),
                code: code_key(code).unwrap_or_else(|| code.to_string()),
            })
    }
}

fn code_key(code: &Value) -> Option<String> {
    match code {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
