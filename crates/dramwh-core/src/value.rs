//! Untyped column values and field maps.
//!
//! Every backend speaks [`Value`]: entity structs are flattened into a
//! [`Record`](crate::entity::Record) of values on the way in and rebuilt from
//! one on the way out. [`Fields`] carries the name → value pairs used for
//! update change-sets and equality filters.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single column value as exchanged with the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Date(NaiveDate),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Short type name used in decode errors.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Null => "null",
      Self::Integer(_) => "integer",
      Self::Real(_) => "real",
      Self::Text(_) => "text",
      Self::Date(_) => "date",
    }
  }

  pub fn as_date(&self) -> Option<NaiveDate> {
    match self {
      Self::Date(d) => Some(*d),
      _ => None,
    }
  }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Integer(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("NULL"),
      Self::Integer(i) => write!(f, "{i}"),
      Self::Real(r) => write!(f, "{r}"),
      Self::Text(s) => write!(f, "{s:?}"),
      Self::Date(d) => write!(f, "{d}"),
    }
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<i32> for Value {
  fn from(v: i32) -> Self { Self::Integer(v.into()) }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self { Self::Real(v) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<NaiveDate> for Value {
  fn from(v: NaiveDate) -> Self { Self::Date(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

// ─── FieldValue ──────────────────────────────────────────────────────────────

/// Conversion between a Rust field type and a [`Value`].
///
/// `from_value` returns `None` on a type mismatch; the caller attaches the
/// table and column to the error.
pub trait FieldValue: Sized {
  /// Human-readable type name for decode errors.
  const EXPECTED: &'static str;

  fn to_value(&self) -> Value;
  fn from_value(value: Value) -> Option<Self>;
}

impl FieldValue for i64 {
  const EXPECTED: &'static str = "integer";

  fn to_value(&self) -> Value { Value::Integer(*self) }

  fn from_value(value: Value) -> Option<Self> { value.as_i64() }
}

impl FieldValue for i32 {
  const EXPECTED: &'static str = "integer";

  fn to_value(&self) -> Value { Value::Integer((*self).into()) }

  fn from_value(value: Value) -> Option<Self> {
    value.as_i64().and_then(|i| i32::try_from(i).ok())
  }
}

impl FieldValue for f64 {
  const EXPECTED: &'static str = "real";

  fn to_value(&self) -> Value { Value::Real(*self) }

  fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Real(r) => Some(r),
      // SQLite may hand back whole-valued reals as integers.
      Value::Integer(i) => Some(i as f64),
      _ => None,
    }
  }
}

impl FieldValue for String {
  const EXPECTED: &'static str = "text";

  fn to_value(&self) -> Value { Value::Text(self.clone()) }

  fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }
}

impl FieldValue for NaiveDate {
  const EXPECTED: &'static str = "date";

  fn to_value(&self) -> Value { Value::Date(*self) }

  fn from_value(value: Value) -> Option<Self> { value.as_date() }
}

impl<T: FieldValue> FieldValue for Option<T> {
  const EXPECTED: &'static str = T::EXPECTED;

  fn to_value(&self) -> Value {
    self.as_ref().map_or(Value::Null, FieldValue::to_value)
  }

  fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Null => Some(None),
      other => T::from_value(other).map(Some),
    }
  }
}

// ─── Fields ──────────────────────────────────────────────────────────────────

/// An ordered set of `field = value` pairs.
///
/// Used both as an update change-set and as an equality filter (logical AND
/// across fields). Setting the same field twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
  pub fn new() -> Self { Self::default() }

  /// Builder-style insert.
  pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
    self.set(field, value);
    self
  }

  pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
    let field = field.into();
    let value = value.into();
    match self.0.iter_mut().find(|(name, _)| *name == field) {
      Some(slot) => slot.1 = value,
      None => self.0.push((field, value)),
    }
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self.0.iter().find(|(name, _)| name == field).map(|(_, v)| v)
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.0.iter().map(|(name, v)| (name.as_str(), v))
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut fields = Self::new();
    for (k, v) in iter {
      fields.set(k, v);
    }
    fields
  }
}
