//! Postgres DDL rendered from the warehouse entity descriptors.

use dramwh_core::{
  entity::{ColumnType, EntityDescriptor, KeyKind},
  schema,
};

fn sql_type(ty: ColumnType) -> String {
  match ty {
    ColumnType::Integer => "INTEGER".to_owned(),
    ColumnType::Real => "DOUBLE PRECISION".to_owned(),
    ColumnType::Text(len) => format!("VARCHAR({len})"),
    ColumnType::Date => "DATE".to_owned(),
  }
}

pub fn create_table(descriptor: &EntityDescriptor) -> String {
  let defs: Vec<String> = descriptor
    .columns
    .iter()
    .enumerate()
    .map(|(pos, column)| {
      if pos == 0 && descriptor.key_kind == KeyKind::Generated {
        return format!("{} SERIAL PRIMARY KEY", column.name);
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

pub fn create_all() -> Vec<String> {
  schema::TABLES
    .iter()
    .flat_map(|d| std::iter::once(create_table(d)).chain(create_indexes(d)))
    .collect()
}

pub fn drop_all() -> Vec<String> {
  schema::children_first()
    .map(|d| format!("DROP TABLE IF EXISTS {} CASCADE", d.table))
    .collect()
}

/// A single statement clearing every table and restarting identities.
pub fn truncate_all() -> String {
  let tables: Vec<&str> = schema::children_first().map(|d| d.table).collect();
  format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", tables.join(", "))
}

#[cfg(test)]
mod tests {
  use dramwh_core::dimension::{DATE_DIM, REGION_DIM};

  use super::*;

  #[test]
  fn region_dim_uses_serial_and_unique_code() {
    let ddl = create_table(&REGION_DIM);
    assert!(ddl.contains("region_id SERIAL PRIMARY KEY"));
    assert!(ddl.contains("country_code VARCHAR(10) NOT NULL UNIQUE"));
    assert!(ddl.contains("continent_name VARCHAR(50) NOT NULL"));
  }

  #[test]
  fn date_dim_keys_on_date() {
    let ddl = create_table(&DATE_DIM);
    assert!(ddl.contains("date DATE NOT NULL PRIMARY KEY"));
  }

  #[test]
  fn truncate_restarts_identity_children_first() {
    let stmt = truncate_all();
    assert!(stmt.starts_with("TRUNCATE TABLE competitor_pricing, "));
    assert!(stmt.ends_with("region_dim, date_dim RESTART IDENTITY CASCADE"));
  }
}
