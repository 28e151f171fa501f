//! The `RemoteStore` trait and supporting query types.
//!
//! The trait is the one handle every entity service talks through. It is
//! implemented by storage backends (`manna-store-rest` for the hosted
//! backend, `manna-store-sqlite` for a local file). Rows cross this boundary
//! as plain JSON objects shaped like the remote tables; the mapping to the
//! canonical domain types happens in the services layer.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

/// A single row as stored in a remote table.
pub type Row = serde_json::Map<String, Value>;

// ─── Query type ──────────────────────────────────────────────────────────────

/// Comparison operator applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Eq,
  Neq,
  Gt,
  Gte,
  Lt,
  Lte,
  /// `value` must be a JSON array; the column must equal one of its items.
  In,
  /// Matches rows whose column is null or absent. `value` is ignored.
  IsNull,
}

impl Op {
  /// The PostgREST spelling of the operator.
  pub fn as_str(self) -> &'static str {
    match self {
      Op::Eq => "eq",
      Op::Neq => "neq",
      Op::Gt => "gt",
      Op::Gte => "gte",
      Op::Lt => "lt",
      Op::Lte => "lte",
      Op::In => "in",
      Op::IsNull => "is",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
  pub column: String,
  pub op:     Op,
  pub value:  Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
  pub column:     String,
  pub descending: bool,
}

/// Parameters for [`RemoteStore::select`], [`RemoteStore::update`] and
/// [`RemoteStore::delete`].
///
/// All `filters` must hold. If `any_of` is non-empty, at least one of its
/// groups must also hold, where a group is a conjunction of equalities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
  pub filters: Vec<Filter>,
  pub any_of:  Vec<Vec<(String, Value)>>,
  pub order:   Option<Order>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

fn to_value(value: impl Serialize) -> Value {
  serde_json::to_value(value).unwrap_or(Value::Null)
}

impl Query {
  pub fn new() -> Self { Self::default() }

  /// Shorthand for a query matching a single row by primary key.
  pub fn by_id(id: Uuid) -> Self { Self::new().eq("id", id) }

  pub fn filter(mut self, column: &str, op: Op, value: impl Serialize) -> Self {
    self.filters.push(Filter {
      column: column.to_owned(),
      op,
      value: to_value(value),
    });
    self
  }

  pub fn eq(self, column: &str, value: impl Serialize) -> Self {
    self.filter(column, Op::Eq, value)
  }

  pub fn neq(self, column: &str, value: impl Serialize) -> Self {
    self.filter(column, Op::Neq, value)
  }

  pub fn is_in<T: Serialize>(self, column: &str, values: &[T]) -> Self {
    self.filter(column, Op::In, values)
  }

  pub fn is_null(self, column: &str) -> Self {
    self.filter(column, Op::IsNull, Value::Null)
  }

  /// Add an alternative group of equalities; see [`Query::any_of`].
  pub fn or_group(mut self, group: Vec<(&str, Value)>) -> Self {
    self
      .any_of
      .push(group.into_iter().map(|(c, v)| (c.to_owned(), v)).collect());
    self
  }

  pub fn order_by(mut self, column: &str, descending: bool) -> Self {
    self.order = Some(Order {
      column: column.to_owned(),
      descending,
    });
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: usize) -> Self {
    self.offset = Some(offset);
    self
  }

  /// Every column name this query mentions.
  pub fn columns(&self) -> impl Iterator<Item = &str> {
    self
      .filters
      .iter()
      .map(|f| f.column.as_str())
      .chain(self.any_of.iter().flatten().map(|(c, _)| c.as_str()))
      .chain(self.order.iter().map(|o| o.column.as_str()))
  }

  /// Reject queries naming columns outside `[A-Za-z0-9_]`. Backends call
  /// this before building any wire or SQL representation.
  pub fn validate(&self) -> Result<()> {
    self.columns().try_for_each(validate_identifier)
  }
}

/// Check that a table or column name is a plain identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
  let ok = !name.is_empty()
    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
  if ok {
    Ok(())
  } else {
    Err(Error::InvalidColumn(name.to_owned()))
  }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// The user behind a valid session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id:    Uuid,
  pub email: Option<String>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the hosted tabular backend.
///
/// Stateless beyond connection configuration: every call either succeeds or
/// surfaces an error to its caller. There is no retry and no caching.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RemoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return all rows of `table` matching `query`.
  fn select<'a>(
    &'a self,
    table: &'a str,
    query: &'a Query,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + 'a;

  /// Insert `row` and return its stored representation. The backend fills
  /// in `id` and `created_at` when the row does not carry them.
  fn insert<'a>(
    &'a self,
    table: &'a str,
    row: Row,
  ) -> impl Future<Output = Result<Row, Self::Error>> + Send + 'a;

  /// Shallow-merge `patch` into every row matching `query` and return the
  /// updated rows. An empty result means nothing matched.
  fn update<'a>(
    &'a self,
    table: &'a str,
    query: &'a Query,
    patch: Row,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + 'a;

  /// Delete every row matching `query` and return the deleted rows.
  fn delete<'a>(
    &'a self,
    table: &'a str,
    query: &'a Query,
  ) -> impl Future<Output = Result<Vec<Row>, Self::Error>> + Send + 'a;

  /// Invoke a named remote procedure and return its opaque result.
  fn rpc<'a>(
    &'a self,
    name: &'a str,
    args: Value,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  /// Resolve a session token. Returns `None` for unknown or expired tokens.
  fn user_for_token<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<AuthUser>, Self::Error>> + Send + 'a;
}
