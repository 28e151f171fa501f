//! [`RestStore`], the hosted implementation of [`RemoteStore`].

use std::time::Duration;

use manna_core::store::{AuthUser, Query, RemoteStore, Row, validate_identifier};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::{Error, PublicClientConfig, Result, ServiceKey, query::encode};

/// Async handle to the hosted backend.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based. Holds only
/// connection configuration; there is no retry, pooling policy or backoff
/// beyond what `reqwest` does by default.
#[derive(Clone)]
pub struct RestStore {
  client:  Client,
  base:    String,
  api_key: String,
  bearer:  String,
}

impl std::fmt::Debug for RestStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RestStore").field("base", &self.base).finish_non_exhaustive()
  }
}

fn method_name(m: &Method) -> &'static str {
  [Method::GET, Method::POST, Method::PATCH, Method::DELETE]
    .iter()
    .zip(["GET", "POST", "PATCH", "DELETE"])
    .find_map(|(known, name)| (known == m).then_some(name))
    .unwrap_or("HTTP")
}

impl RestStore {
  fn build(base: &str, key: &str) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      base: base.trim_end_matches('/').to_owned(),
      api_key: key.to_owned(),
      bearer: key.to_owned(),
    })
  }

  /// A handle using the restricted anon key. Row-level policies on the
  /// backend apply.
  pub fn public(config: &PublicClientConfig) -> Result<Self> {
    Self::build(&config.url, &config.anon_key)
  }

  /// A handle using the elevated service key. Only for trusted
  /// request-handling code running on the server.
  pub fn privileged(url: &str, key: &ServiceKey) -> Result<Self> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
      return Err(Error::InvalidUrl(url.to_owned()));
    }
    Self::build(url, key.expose())
  }

  /// A copy of this handle that acts as the signed-in user.
  pub fn with_access_token(&self, token: &str) -> Self {
    Self {
      bearer: token.to_owned(),
      ..self.clone()
    }
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self.request_as(method, path, &self.bearer)
  }

  fn request_as(&self, method: Method, path: &str, bearer: &str) -> RequestBuilder {
    self
      .client
      .request(method, format!("{}{path}", self.base))
      .header("apikey", &self.api_key)
      .bearer_auth(bearer)
  }

  async fn send(
    &self,
    method: Method,
    path: String,
    build: impl FnOnce(RequestBuilder) -> RequestBuilder,
  ) -> Result<Response> {
    tracing::debug!(method = %method, path = %path, "remote call");
    let name = method_name(&method);
    let resp = build(self.request(method, &path)).send().await?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status {
      method: name,
      path,
      status: status.as_u16(),
      body,
    })
  }

  async fn rows(
    &self,
    method: Method,
    table: &str,
    query: &Query,
    body: Option<&Row>,
  ) -> Result<Vec<Row>> {
    validate_identifier(table)?;
    let params = encode(query)?;
    let path = format!("/rest/v1/{table}");
    let resp = self
      .send(method, path.clone(), |req| {
        let req = req
          .query(&params)
          .header("Prefer", "return=representation");
        match body {
          Some(b) => req.json(b),
          None => req,
        }
      })
      .await?;
    parse_rows(resp, &path).await
  }
}

async fn parse_rows(resp: Response, path: &str) -> Result<Vec<Row>> {
  match resp.json::<Value>().await? {
    Value::Array(items) => items
      .into_iter()
      .map(|v| match v {
        Value::Object(m) => Ok(m),
        _ => Err(Error::Shape(path.to_owned())),
      })
      .collect(),
    _ => Err(Error::Shape(path.to_owned())),
  }
}

// ─── RemoteStore impl ────────────────────────────────────────────────────────

impl RemoteStore for RestStore {
  type Error = Error;

  async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
    self.rows(Method::GET, table, query, None).await
  }

  async fn insert(&self, table: &str, row: Row) -> Result<Row> {
    let path = format!("/rest/v1/{table}");
    self
      .rows(Method::POST, table, &Query::new(), Some(&row))
      .await?
      .into_iter()
      .next()
      .ok_or(Error::Shape(path))
  }

  async fn update(&self, table: &str, query: &Query, patch: Row) -> Result<Vec<Row>> {
    self.rows(Method::PATCH, table, query, Some(&patch)).await
  }

  async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
    self.rows(Method::DELETE, table, query, None).await
  }

  async fn rpc(&self, name: &str, args: Value) -> Result<Value> {
    validate_identifier(name)?;
    let resp = self
      .send(Method::POST, format!("/rest/v1/rpc/{name}"), |req| req.json(&args))
      .await?;
    Ok(resp.json().await?)
  }

  async fn user_for_token(&self, token: &str) -> Result<Option<AuthUser>> {
    let resp = self
      .request_as(Method::GET, "/auth/v1/user", token)
      .send()
      .await?;
    match resp.status() {
      s if s == StatusCode::UNAUTHORIZED || s == StatusCode::FORBIDDEN => Ok(None),
      s if s.is_success() => Ok(Some(resp.json().await?)),
      s => Err(Error::Status {
        method: "GET",
        path:   "/auth/v1/user".to_owned(),
        status: s.as_u16(),
        body:   resp.text().await.unwrap_or_default(),
      }),
    }
  }
}
