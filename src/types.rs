//! Core data model types for decoded stats.
//!
//! Decoding produces a [`RecordSet`]: one [`Record`] per `show stat` row, each mapping a
//! canonical field name to a typed [`Value`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single typed value in a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit signed integer.
    Int64(i64),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns the string payload, if this is a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            Self::Int64(_) => None,
        }
    }

    /// Returns the integer payload, if this is a [`Value::Int64`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            Self::Utf8(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int64(i64::from(v))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Utf8(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Utf8(s.to_owned())
    }
}

/// One decoded stats row (a frontend, backend or server), keyed by canonical field name.
///
/// Absent keys are meaningful: a column that was unknown or failed to decode is simply not
/// present, so the typed accessors fall back to zero values instead of erroring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `key` as a string. Returns `""` if the key is absent or holds an integer.
    pub fn string(&self, key: &str) -> &str {
        self.values.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Reads `key` as an integer. Returns `0` if the key is absent or holds a string.
    pub fn int(&self, key: &str) -> i64 {
        self.values.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Insert a value, returning the previous value under `key` if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Builder-style insert, handy in transforms and tests.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Ordered sequence of decoded records, one per data row, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    /// Records in source order.
    pub records: Vec<Record>,
}

impl RecordSet {
    /// Create a record set from already-decoded records.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Returns the first record whose `proxy` and `name` fields match.
    ///
    /// Relies on the default canonical names; with a custom dictionary that renames these
    /// columns this finds nothing.
    pub fn find(&self, proxy: &str, name: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.string("proxy") == proxy && r.string("name") == name)
    }

    /// Create a new record set containing only records that match `predicate`.
    pub fn filter_records<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Record) -> bool,
    {
        let records = self
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        Self { records }
    }

    /// Reduce (fold) all records into an accumulator value.
    pub fn reduce_records<A, F>(&self, init: A, mut reducer: F) -> A
    where
        F: FnMut(A, &Record) -> A,
    {
        self.records.iter().fold(init, |acc, r| reducer(acc, r))
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.records
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
