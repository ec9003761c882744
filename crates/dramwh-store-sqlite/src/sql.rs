//! DML rendered from entity descriptors. Placeholders are `?N`.

use dramwh_core::{entity::EntityDescriptor, Value};

pub fn select_all(d: &EntityDescriptor) -> String {
  format!("SELECT {} FROM {} ORDER BY {}", d.column_list(), d.table, d.key().name)
}

pub fn select_by_key(d: &EntityDescriptor) -> String {
  format!(
    "SELECT {} FROM {} WHERE {} = ?1",
    d.column_list(),
    d.table,
    d.key().name
  )
}

/// `SELECT ... WHERE a = ?1 AND b IS NULL ...`; returns the SQL and the
/// positions whose values must be bound, in placeholder order.
pub fn select_where(d: &EntityDescriptor, filter: &[(usize, Value)]) -> (String, Vec<usize>) {
  if filter.is_empty() {
    return (select_all(d), Vec::new());
  }

  let mut bound = Vec::new();
  let conds: Vec<String> = filter
    .iter()
    .enumerate()
    .map(|(i, (pos, value))| {
      let name = d.columns[*pos].name;
      if value.is_null() {
        format!("{name} IS NULL")
      } else {
        bound.push(i);
        format!("{name} = ?{}", bound.len())
      }
    })
    .collect();

  let sql = format!(
    "SELECT {} FROM {} WHERE {} ORDER BY {}",
    d.column_list(),
    d.table,
    conds.join(" AND "),
    d.key().name
  );
  (sql, bound)
}

/// `INSERT ... RETURNING <all columns>` writing only `positions`.
pub fn insert_returning(d: &EntityDescriptor, positions: &[usize]) -> String {
  let names: Vec<&str> = positions.iter().map(|p| d.columns[*p].name).collect();
  let params: Vec<String> = (1..=positions.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
    d.table,
    names.join(", "),
    params.join(", "),
    d.column_list()
  )
}

/// `UPDATE ... SET a = ?1, b = ?2 WHERE key = ?3`.
pub fn update_by_key(d: &EntityDescriptor, positions: &[usize]) -> String {
  let sets: Vec<String> = positions
    .iter()
    .enumerate()
    .map(|(i, p)| format!("{} = ?{}", d.columns[*p].name, i + 1))
    .collect();
  format!(
    "UPDATE {} SET {} WHERE {} = ?{}",
    d.table,
    sets.join(", "),
    d.key().name,
    positions.len() + 1
  )
}

pub fn delete_by_key(d: &EntityDescriptor) -> String {
  format!("DELETE FROM {} WHERE {} = ?1", d.table, d.key().name)
}

pub fn max_of(d: &EntityDescriptor, column: &str) -> String {
  format!("SELECT MAX({column}) FROM {}", d.table)
}

#[cfg(test)]
mod tests {
  use dramwh_core::fact::DRAM_PRICES;

  use super::*;

  #[test]
  fn where_clause_skips_placeholders_for_null() {
    let (sql, bound) = select_where(&DRAM_PRICES, &[
      (2, Value::Text("DDR5".into())),
      (4, Value::Null),
      (3, Value::Real(3.5)),
    ]);
    assert!(sql.ends_with("WHERE dram_type = ?1 AND source IS NULL AND price_usd = ?2 ORDER BY id"));
    assert_eq!(bound, vec![0, 2]);
  }

  #[test]
  fn insert_lists_only_written_columns() {
    assert_eq!(
      insert_returning(&DRAM_PRICES, &[1, 2, 3, 4]),
      "INSERT INTO dram_prices (date, dram_type, price_usd, source) VALUES (?1, ?2, ?3, ?4) \
       RETURNING id, date, dram_type, price_usd, source"
    );
  }

  #[test]
  fn update_binds_key_last() {
    assert_eq!(
      update_by_key(&DRAM_PRICES, &[3]),
      "UPDATE dram_prices SET price_usd = ?1 WHERE id = ?2"
    );
  }
}
