//! Translation of a [`Query`] into SQL over the `records` table, and of JSON
//! scalars into SQLite values.
//!
//! `json_extract` yields SQL scalars: booleans come back as `0`/`1`, numbers
//! as INTEGER or REAL, strings as TEXT. Bound parameters are converted the
//! same way so comparisons line up.

use manna_core::store::{Op, Query, Row, validate_identifier};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn sql_value(v: &Value) -> SqlValue {
  match v {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match n.as_i64() {
      Some(i) => SqlValue::Integer(i),
      None => SqlValue::Real(n.as_f64().unwrap_or_default()),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  }
}

fn path(column: &str) -> String { format!("json_extract(data, '$.{column}')") }

// ─── Rows ────────────────────────────────────────────────────────────────────

pub fn decode_row(data: &str) -> Result<Row> {
  match serde_json::from_str(data)? {
    Value::Object(map) => Ok(map),
    _ => Err(Error::NotAnObject),
  }
}

pub fn encode_row(row: &Row) -> Result<String> { Ok(serde_json::to_string(row)?) }

/// Shallow merge: every key in `patch` overwrites the same key in `row`.
pub fn merge(row: &mut Row, patch: &Row) {
  for (k, v) in patch {
    row.insert(k.clone(), v.clone());
  }
}

// ─── WHERE / ORDER / LIMIT ───────────────────────────────────────────────────

/// A compiled `SELECT rowid, data FROM records ...` statement and its
/// positional parameters.
#[derive(Debug)]
pub struct Compiled {
  pub sql:    String,
  pub params: Vec<SqlValue>,
}

pub fn compile_select(table: &str, query: &Query) -> Result<Compiled> {
  validate_identifier(table)?;
  query.validate()?;

  let mut conds = vec!["tbl = ?".to_owned()];
  let mut params = vec![SqlValue::Text(table.to_owned())];

  for f in &query.filters {
    let col = path(&f.column);
    match f.op {
      Op::IsNull => conds.push(format!("{col} IS NULL")),
      Op::In => {
        let items = f.value.as_array().cloned().unwrap_or_default();
        if items.is_empty() {
          conds.push("0".to_owned());
        } else {
          let marks = vec!["?"; items.len()].join(", ");
          conds.push(format!("{col} IN ({marks})"));
          params.extend(items.iter().map(sql_value));
        }
      }
      op => {
        let sym = match op {
          Op::Eq => "=",
          Op::Neq => "!=",
          Op::Gt => ">",
          Op::Gte => ">=",
          Op::Lt => "<",
          Op::Lte => "<=",
          Op::In | Op::IsNull => unreachable!("handled above"),
        };
        conds.push(format!("{col} {sym} ?"));
        params.push(sql_value(&f.value));
      }
    }
  }

  if !query.any_of.is_empty() {
    let groups: Vec<String> = query
      .any_of
      .iter()
      .map(|group| {
        let parts: Vec<String> = group
          .iter()
          .map(|(c, v)| {
            params.push(sql_value(v));
            format!("{} = ?", path(c))
          })
          .collect();
        format!("({})", parts.join(" AND "))
      })
      .collect();
    conds.push(format!("({})", groups.join(" OR ")));
  }

  let mut sql = format!(
    "SELECT rowid, data FROM records WHERE {}",
    conds.join(" AND ")
  );

  match &query.order {
    Some(o) => {
      let dir = if o.descending { "DESC" } else { "ASC" };
      // Timestamps compare as instants; other values sort as stored.
      let col = path(&o.column);
      sql.push_str(&format!(
        " ORDER BY coalesce(julianday({col}), {col}) {dir}, rowid {dir}"
      ));
    }
    None => sql.push_str(" ORDER BY rowid ASC"),
  }

  if query.limit.is_some() || query.offset.is_some() {
    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(SqlValue::Integer(query.limit.map_or(-1, |l| l as i64)));
    params.push(SqlValue::Integer(query.offset.unwrap_or(0) as i64));
  }

  Ok(Compiled { sql, params })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn booleans_bind_as_integers() {
    assert_eq!(sql_value(&json!(true)), SqlValue::Integer(1));
    assert_eq!(sql_value(&json!(2.5)), SqlValue::Real(2.5));
    assert_eq!(sql_value(&json!("x")), SqlValue::Text("x".into()));
  }

  #[test]
  fn compiles_filters_groups_and_paging() {
    let q = Query::new()
      .eq("status", "pending")
      .or_group(vec![("user_a", json!("a")), ("user_b", json!("b"))])
      .or_group(vec![("user_a", json!("b")), ("user_b", json!("a"))])
      .order_by("created_at", true)
      .limit(10);
    let c = compile_select("friendships", &q).unwrap();

    assert!(c.sql.contains("json_extract(data, '$.status') = ?"));
    assert!(c.sql.contains(" OR "));
    assert!(c.sql.contains(
      "ORDER BY coalesce(julianday(json_extract(data, '$.created_at')), \
       json_extract(data, '$.created_at')) DESC"
    ));
    // tbl + status + 4 group values + limit + offset
    assert_eq!(c.params.len(), 8);
  }

  #[test]
  fn empty_in_list_matches_nothing() {
    let q = Query::new().is_in::<String>("id", &[]);
    let c = compile_select("events", &q).unwrap();
    assert!(c.sql.contains("AND 0"));
  }

  #[test]
  fn rejects_bad_table_names() {
    assert!(compile_select("events; --", &Query::new()).is_err());
  }
}
