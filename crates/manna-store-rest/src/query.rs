//! [`Query`] → PostgREST query-string pairs.
//!
//! `col=eq.value`, `col=in.(a,b)`, `col=is.null`,
//! `or=(and(a.eq.x,b.eq.y),c.eq.z)`, `order=col.desc`, `limit`, `offset`.

use manna_core::store::{Op, Query};
use serde_json::Value;

use crate::Result;

/// Render a scalar as PostgREST expects it inside a filter.
fn scalar(v: &Value) -> String {
  match v {
    Value::Null => "null".to_owned(),
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Quote a value that would otherwise be split by PostgREST's list and
/// logic-tree syntax.
fn quoted(v: &Value) -> String {
  let s = scalar(v);
  if s.contains([',', '(', ')', '"', '.', ':', ' ']) {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
  } else {
    s
  }
}

pub fn encode(query: &Query) -> Result<Vec<(String, String)>> {
  query.validate()?;

  let mut pairs = Vec::new();

  for f in &query.filters {
    let rhs = match f.op {
      Op::IsNull => "is.null".to_owned(),
      Op::In => {
        let items: Vec<String> = f
          .value
          .as_array()
          .map(|a| a.iter().map(quoted).collect())
          .unwrap_or_default();
        format!("in.({})", items.join(","))
      }
      op => format!("{}.{}", op.as_str(), scalar(&f.value)),
    };
    pairs.push((f.column.clone(), rhs));
  }

  if !query.any_of.is_empty() {
    let groups: Vec<String> = query
      .any_of
      .iter()
      .map(|group| {
        let parts: Vec<String> = group
          .iter()
          .map(|(c, v)| format!("{c}.eq.{}", quoted(v)))
          .collect();
        if parts.len() == 1 {
          parts.concat()
        } else {
          format!("and({})", parts.join(","))
        }
      })
      .collect();
    pairs.push(("or".to_owned(), format!("({})", groups.join(","))));
  }

  if let Some(o) = &query.order {
    let dir = if o.descending { "desc" } else { "asc" };
    pairs.push(("order".to_owned(), format!("{}.{dir}", o.column)));
  }
  if let Some(limit) = query.limit {
    pairs.push(("limit".to_owned(), limit.to_string()));
  }
  if let Some(offset) = query.offset {
    pairs.push(("offset".to_owned(), offset.to_string()));
  }

  Ok(pairs)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn pairs(q: &Query) -> Vec<(String, String)> { encode(q).unwrap() }

  #[test]
  fn simple_filters() {
    let q = Query::new()
      .eq("is_public", true)
      .eq("status", "pending")
      .is_null("read_at");
    assert_eq!(
      pairs(&q),
      vec![
        ("is_public".into(), "eq.true".into()),
        ("status".into(), "eq.pending".into()),
        ("read_at".into(), "is.null".into()),
      ]
    );
  }

  #[test]
  fn in_lists_quote_reserved_characters() {
    let q = Query::new().is_in("tag", &["prayer", "a,b"]);
    assert_eq!(pairs(&q), vec![("tag".into(), "in.(prayer,\"a,b\")".into())]);
  }

  #[test]
  fn or_groups_nest_conjunctions() {
    let q = Query::new()
      .or_group(vec![("user_a", json!("x")), ("user_b", json!("y"))])
      .or_group(vec![("user_a", json!("y"))]);
    assert_eq!(
      pairs(&q),
      vec![(
        "or".into(),
        "(and(user_a.eq.x,user_b.eq.y),user_a.eq.y)".into()
      )]
    );
  }

  #[test]
  fn order_and_paging() {
    let q = Query::new().order_by("created_at", true).limit(10).offset(20);
    assert_eq!(
      pairs(&q),
      vec![
        ("order".into(), "created_at.desc".into()),
        ("limit".into(), "10".into()),
        ("offset".into(), "20".into()),
      ]
    );
  }
}
