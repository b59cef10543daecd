use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Result, StoreError, Value};

/// Field holding the store-assigned identifier of every document.
pub const ID_FIELD: &str = "_id";

/// Store-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for RecordId {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| StoreError::InvalidId(raw.to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered field map. Field order is lexicographic, which keeps
/// serialized documents stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Missing fields read as `NULL`.
    pub fn get_or_null(&self, field: &str) -> Value {
        self.fields.get(field).cloned().unwrap_or(Value::Null)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.get(ID_FIELD).and_then(Value::as_id)
    }

    /// Copies every field of `other` over this document.
    pub fn merge(&mut self, other: Document) {
        self.fields.extend(other.fields);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    // Typed accessors used when mapping documents back onto models.

    fn required(&self, field: &str) -> Result<&Value> {
        self.get(field)
            .ok_or_else(|| StoreError::MissingField(field.to_string()))
    }

    fn mismatch(field: &str, expected: &str, found: &Value) -> StoreError {
        StoreError::TypeMismatch(format!(
            "field '{}' expected {}, found {}",
            field,
            expected,
            found.type_name()
        ))
    }

    pub fn get_id(&self, field: &str) -> Result<RecordId> {
        let value = self.required(field)?;
        value
            .as_id()
            .ok_or_else(|| Self::mismatch(field, "ID", value))
    }

    pub fn get_i64(&self, field: &str) -> Result<i64> {
        let value = self.required(field)?;
        value
            .as_i64()
            .ok_or_else(|| Self::mismatch(field, "INTEGER", value))
    }

    pub fn get_i8(&self, field: &str) -> Result<i8> {
        let raw = self.get_i64(field)?;
        i8::try_from(raw).map_err(|_| {
            StoreError::TypeMismatch(format!("field '{}' value {} out of range for i8", field, raw))
        })
    }

    pub fn get_str(&self, field: &str) -> Result<&str> {
        let value = self.required(field)?;
        value
            .as_str()
            .ok_or_else(|| Self::mismatch(field, "TEXT", value))
    }

    pub fn get_timestamp(&self, field: &str) -> Result<DateTime<Utc>> {
        let value = self.required(field)?;
        value
            .as_timestamp()
            .ok_or_else(|| Self::mismatch(field, "TIMESTAMP", value))
    }

    pub fn get_array(&self, field: &str) -> Result<&[Value]> {
        let value = self.required(field)?;
        value
            .as_array()
            .ok_or_else(|| Self::mismatch(field, "ARRAY", value))
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
