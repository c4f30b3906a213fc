//! Query parameter types for export requests
//!
//! [`QueryParams`] is an insertion-ordered mapping of parameter names to
//! [`QueryValue`]s. Order matters: the serialized query string follows it, so
//! two requests built from the same params always produce the same URL.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single query parameter value
///
/// `Null` covers both "explicitly null" and "not set"; null entries are
/// dropped when the query string is built.
///
/// # Examples
///
/// ```
/// use epiexport::domain::params::QueryValue;
///
/// assert_eq!(QueryValue::from(true).to_string(), "true");
/// assert_eq!(QueryValue::from(vec!["x", "y"]).to_string(), "x,y");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// Null or undefined
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Free text
    Text(String),
    /// List of values, rendered comma-joined
    List(Vec<QueryValue>),
}

impl QueryValue {
    /// Whether this value is dropped from the query string
    pub fn is_null(&self) -> bool {
        matches!(self, QueryValue::Null)
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Only reachable inside lists; top-level nulls are filtered out
            QueryValue::Null => Ok(()),
            QueryValue::Bool(b) => write!(f, "{b}"),
            QueryValue::Int(i) => write!(f, "{i}"),
            QueryValue::Float(x) if x.is_infinite() => {
                write!(f, "{}Infinity", if *x < 0.0 { "-" } else { "" })
            }
            QueryValue::Float(x) => write!(f, "{x}"),
            QueryValue::Text(s) => f.write_str(s),
            QueryValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => QueryValue::Int(v),
            Err(_) => QueryValue::Text(value.to_string()),
        }
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(QueryValue::Null)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for QueryValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => QueryValue::Null,
            Value::Bool(b) => QueryValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => QueryValue::Int(i),
                None => QueryValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => QueryValue::Text(s),
            Value::Array(items) => QueryValue::List(items.into_iter().map(Into::into).collect()),
            obj @ Value::Object(_) => QueryValue::Text(obj.to_string()),
        }
    }
}

/// Insertion-ordered query parameters
///
/// Inserting an existing key replaces its value in place, keeping the
/// original position.
///
/// # Examples
///
/// ```
/// use epiexport::domain::params::{QueryParams, QueryValue};
///
/// let params = QueryParams::new()
///     .with("iso3", "NPL")
///     .with("indicators", vec!["cases", "deaths"])
///     .with("region", QueryValue::Null);
///
/// assert_eq!(params.len(), 3);
/// assert_eq!(params.get("iso3"), Some(&QueryValue::from("NPL")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Creates an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks up a parameter by name
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterates over entries in insertion order, nulls included
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries, nulls included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a `key=value` pair as given on the command line
    ///
    /// The value is kept as text; an empty key is rejected.
    pub fn parse_pair(pair: &str) -> Result<(String, QueryValue), String> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("Expected key=value, got '{pair}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Parameter name cannot be empty in '{pair}'"));
        }
        Ok((key.to_string(), QueryValue::Text(value.to_string())))
    }

    /// Builds parameters from a JSON object, keeping key order
    pub fn from_json_object(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(format!("Expected a JSON object, got {other}")),
        }
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}
