//! DML rendered from entity descriptors. Placeholders are `$N`.

use dramwh_core::{entity::EntityDescriptor, Value};

pub fn select_all(d: &EntityDescriptor) -> String {
  format!("SELECT {} FROM {} ORDER BY {}", d.column_list(), d.table, d.key().name)
}

pub fn select_by_key(d: &EntityDescriptor) -> String {
  format!(
    "SELECT {} FROM {} WHERE {} = $1",
    d.column_list(),
    d.table,
    d.key().name
  )
}

/// Filtered select; returns the SQL and the filter indexes to bind, in
/// placeholder order. `Null` filter values render as `IS NULL`.
pub fn select_where(d: &EntityDescriptor, filter: &[(usize, Value)]) -> (String, Vec<usize>) {
  if filter.is_empty() {
    return (select_all(d), Vec::new());
  }

  let mut bound = Vec::new();
  let mut conds = Vec::with_capacity(filter.len());
  for (i, (pos, value)) in filter.iter().enumerate() {
    let name = d.columns[*pos].name;
    if value.is_null() {
      conds.push(format!("{name} IS NULL"));
    } else {
      bound.push(i);
      conds.push(format!("{name} = ${}", bound.len()));
    }
  }

  let sql = format!(
    "SELECT {} FROM {} WHERE {} ORDER BY {}",
    d.column_list(),
    d.table,
    conds.join(" AND "),
    d.key().name
  );
  (sql, bound)
}

pub fn insert_returning(d: &EntityDescriptor, positions: &[usize]) -> String {
  let names: Vec<&str> = positions.iter().map(|p| d.columns[*p].name).collect();
  let params: Vec<String> = (1..=positions.len()).map(|i| format!("${i}")).collect();
  format!(
    "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
    d.table,
    names.join(", "),
    params.join(", "),
    d.column_list()
  )
}

pub fn update_by_key(d: &EntityDescriptor, positions: &[usize]) -> String {
  let sets: Vec<String> = positions
    .iter()
    .enumerate()
    .map(|(i, p)| format!("{} = ${}", d.columns[*p].name, i + 1))
    .collect();
  format!(
    "UPDATE {} SET {} WHERE {} = ${}",
    d.table,
    sets.join(", "),
    d.key().name,
    positions.len() + 1
  )
}

pub fn delete_by_key(d: &EntityDescriptor) -> String {
  format!("DELETE FROM {} WHERE {} = $1", d.table, d.key().name)
}

pub fn max_of(d: &EntityDescriptor, column: &str) -> String {
  format!("SELECT MAX({column}) FROM {}", d.table)
}
