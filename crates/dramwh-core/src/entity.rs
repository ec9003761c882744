//! Entity descriptors: the static schema metadata every backend works from.
//!
//! A table is described once by an [`EntityDescriptor`] (name, ordered
//! columns, key kind). Entity structs implement [`Entity`], which converts to
//! and from a positional [`Record`] aligned with the descriptor's columns.
//! Backends never see the concrete struct types; they render SQL from the
//! descriptor and shuttle [`Value`]s.

use crate::{
  Error, Result,
  value::{FieldValue, Fields, Value},
};

// ─── Columns ─────────────────────────────────────────────────────────────────

/// Logical column type; each backend maps it to its own DDL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Integer,
  Real,
  /// Bounded text; the bound is advisory on backends without `VARCHAR(n)`.
  Text(u16),
  Date,
}

/// A foreign-key reference to `table(column)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
  pub table:  &'static str,
  pub column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name:       &'static str,
  pub ty:         ColumnType,
  pub nullable:   bool,
  pub unique:     bool,
  /// Raw SQL literal used as the column default.
  pub default:    Option<&'static str>,
  pub references: Option<ForeignKey>,
}

impl Column {
  /// A nullable column with no constraints.
  pub const fn new(name: &'static str, ty: ColumnType) -> Self {
    Self {
      name,
      ty,
      nullable: true,
      unique: false,
      default: None,
      references: None,
    }
  }

  pub const fn not_null(self) -> Self { Self { nullable: false, ..self } }

  pub const fn unique(self) -> Self { Self { unique: true, ..self } }

  pub const fn default_sql(self, literal: &'static str) -> Self {
    Self { default: Some(literal), ..self }
  }

  pub const fn references(self, table: &'static str, column: &'static str) -> Self {
    Self { references: Some(ForeignKey { table, column }), ..self }
  }
}

// ─── Descriptor ──────────────────────────────────────────────────────────────

/// Who assigns the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
  /// Supplied by the caller (e.g. the calendar date of `date_dim`).
  Natural,
  /// Assigned by the store from an identity counter.
  Generated,
}

/// Static schema metadata for one table.
///
/// `columns[0]` is always the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
  pub table:    &'static str,
  pub key_kind: KeyKind,
  pub columns:  &'static [Column],
}

impl EntityDescriptor {
  pub fn key(&self) -> &'static Column { &self.columns[0] }

  pub fn column(&self, name: &str) -> Option<&'static Column> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn position(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c.name == name)
  }

  /// Like [`position`](Self::position) but failing with
  /// [`Error::UnknownField`].
  pub fn require(&self, name: &str) -> Result<usize> {
    self.position(name).ok_or_else(|| Error::UnknownField {
      table: self.table,
      field: name.to_owned(),
    })
  }

  /// Comma-separated column names in declaration order.
  pub fn column_list(&self) -> String {
    self
      .columns
      .iter()
      .map(|c| c.name)
      .collect::<Vec<_>>()
      .join(", ")
  }

  /// Tables this one references, in column order, without duplicates.
  pub fn parents(&self) -> Vec<&'static str> {
    let mut parents: Vec<&'static str> = Vec::new();
    for fk in self.columns.iter().filter_map(|c| c.references) {
      if !parents.contains(&fk.table) {
        parents.push(fk.table);
      }
    }
    parents
  }

  /// Resolve every field of a filter to its column position.
  pub fn resolve(&self, fields: &Fields) -> Result<Vec<(usize, Value)>> {
    fields
      .iter()
      .map(|(name, value)| Ok((self.require(name)?, value.clone())))
      .collect()
  }

  /// Like [`resolve`](Self::resolve), additionally rejecting the key column.
  pub fn resolve_changes(&self, changes: &Fields) -> Result<Vec<(usize, Value)>> {
    let resolved = self.resolve(changes)?;
    if resolved.iter().any(|(pos, _)| *pos == 0) {
      return Err(Error::KeyNotUpdatable {
        table: self.table,
        field: self.key().name,
      });
    }
    Ok(resolved)
  }

  /// Positions written by an INSERT of `record`. A generated key left unset
  /// is omitted, as is a `Null` in any column with a default, so the store
  /// fills both in.
  pub fn insert_positions(&self, record: &Record) -> Vec<usize> {
    let skip_key =
      self.key_kind == KeyKind::Generated && record.key().is_null();
    self
      .columns
      .iter()
      .zip(record.values())
      .enumerate()
      .filter(|(pos, (column, value))| {
        let defaulted = column.default.is_some() && value.is_null();
        !(defaulted || (skip_key && *pos == 0))
      })
      .map(|(pos, _)| pos)
      .collect()
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One row as positional values aligned with a descriptor's columns.
#[derive(Debug, Clone)]
pub struct Record {
  descriptor: &'static EntityDescriptor,
  values:     Vec<Value>,
}

impl Record {
  /// Build a record, checking the value count against the descriptor.
  pub fn new(descriptor: &'static EntityDescriptor, values: Vec<Value>) -> Result<Self> {
    if values.len() != descriptor.columns.len() {
      return Err(Error::Arity {
        table:    descriptor.table,
        expected: descriptor.columns.len(),
        found:    values.len(),
      });
    }
    Ok(Self { descriptor, values })
  }

  /// Infallible constructor for generated `Entity` impls, whose field lists
  /// are checked against their descriptors by the test-suite.
  pub(crate) fn from_parts(
    descriptor: &'static EntityDescriptor,
    values: Vec<Value>,
  ) -> Self {
    debug_assert_eq!(values.len(), descriptor.columns.len(), "{}", descriptor.table);
    Self { descriptor, values }
  }

  pub fn descriptor(&self) -> &'static EntityDescriptor { self.descriptor }

  pub fn values(&self) -> &[Value] { &self.values }

  pub fn into_values(self) -> Vec<Value> { self.values }

  pub fn key(&self) -> &Value { &self.values[0] }

  pub fn get(&self, name: &str) -> Option<&Value> {
    self.descriptor.position(name).map(|pos| &self.values[pos])
  }

  /// Overwrite fields from a change-set. The key column cannot change.
  pub fn apply(&mut self, changes: &Fields) -> Result<()> {
    for (pos, value) in self.descriptor.resolve_changes(changes)? {
      self.values[pos] = value;
    }
    Ok(())
  }

  /// Move a column's value out, decoding it to `T`.
  pub fn take<T: FieldValue>(&mut self, name: &'static str) -> Result<T> {
    let pos = self.descriptor.require(name)?;
    let value = std::mem::replace(&mut self.values[pos], Value::Null);
    let found = value.kind();
    T::from_value(value).ok_or_else(|| Error::Decode {
      table:    self.descriptor.table,
      column:   name,
      expected: T::EXPECTED,
      found:    found.to_owned(),
    })
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A row type the generic persistence layer can store.
pub trait Entity: Clone + Send + Sync + 'static {
  const DESCRIPTOR: &'static EntityDescriptor;

  /// The primary key value (`Null` for a generated key not yet assigned).
  fn key(&self) -> Value;

  fn to_record(&self) -> Record;

  fn from_record(record: Record) -> Result<Self>;
}

/// Implement [`Entity`] for a struct whose fields are listed in the same
/// order as its descriptor's columns, key first.
macro_rules! impl_entity {
  ($ty:ident, $descriptor:expr, [$key:ident $(, $field:ident)* $(,)?]) => {
    impl $ty {
      /// Field names in column order.
      pub const FIELDS: &'static [&'static str] =
        &[stringify!($key) $(, stringify!($field))*];
    }

    impl $crate::entity::Entity for $ty {
      const DESCRIPTOR: &'static $crate::entity::EntityDescriptor = &$descriptor;

      fn key(&self) -> $crate::value::Value {
        $crate::value::FieldValue::to_value(&self.$key)
      }

      fn to_record(&self) -> $crate::entity::Record {
        $crate::entity::Record::from_parts(
          Self::DESCRIPTOR,
          vec![
            $crate::value::FieldValue::to_value(&self.$key)
            $(, $crate::value::FieldValue::to_value(&self.$field))*
          ],
        )
      }

      fn from_record(
        mut record: $crate::entity::Record,
      ) -> $crate::Result<Self> {
        Ok(Self {
          $key: record.take(stringify!($key))?,
          $($field: record.take(stringify!($field))?,)*
        })
      }
    }
  };
}

pub(crate) use impl_entity;
