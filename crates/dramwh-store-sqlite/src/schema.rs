//! SQLite DDL rendered from the warehouse entity descriptors.

use dramwh_core::{
  entity::{ColumnType, EntityDescriptor, KeyKind},
  schema,
};

/// Connection settings applied at open, outside any transaction.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

fn sql_type(ty: ColumnType) -> &'static str {
  match ty {
    ColumnType::Integer => "INTEGER",
    ColumnType::Real => "REAL",
    ColumnType::Text(_) | ColumnType::Date => "TEXT",
  }
}

/// `CREATE TABLE IF NOT EXISTS` for one descriptor.
pub fn create_table(descriptor: &EntityDescriptor) -> String {
  let defs: Vec<String> = descriptor
    .columns
    .iter()
    .enumerate()
    .map(|(pos, column)| {
      if pos == 0 && descriptor.key_kind == KeyKind::Generated {
        return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", column.name);
      }

      let mut def = format!("{} {}", column.name, sql_type(column.ty));
      if !column.nullable {
        def.push_str(" NOT NULL");
      }
      if pos == 0 {
        def.push_str(" PRIMARY KEY");
      }
      if column.unique {
        def.push_str(" UNIQUE");
      }
      if let Some(default) = column.default {
        def.push_str(&format!(" DEFAULT {default}"));
      }
      if let Some(fk) = column.references {
        def.push_str(&format!(" REFERENCES {}({})", fk.table, fk.column));
      }
      def
    })
    .collect();

  format!(
    "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
    descriptor.table,
    defs.join(",\n    ")
  )
}

/// One index per foreign-key column.
pub fn create_indexes(descriptor: &EntityDescriptor) -> Vec<String> {
  descriptor
    .columns
    .iter()
    .filter(|c| c.references.is_some())
    .map(|c| {
      format!(
        "CREATE INDEX IF NOT EXISTS {table}_{col}_idx ON {table}({col})",
        table = descriptor.table,
        col = c.name
      )
    })
    .collect()
}

/// Full schema, parents first.
pub fn create_all() -> Vec<String> {
  schema::TABLES
    .iter()
    .flat_map(|d| std::iter::once(create_table(d)).chain(create_indexes(d)))
    .collect()
}

/// Drop statements, children first.
pub fn drop_all() -> Vec<String> {
  schema::children_first()
    .map(|d| format!("DROP TABLE IF EXISTS {}", d.table))
    .collect()
}
