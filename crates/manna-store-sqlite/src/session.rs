//! Opaque session tokens for the local backend.
//!
//! Tokens are 32 random bytes, base64url-encoded. Only their SHA-256 digest
//! is persisted, so a leaked database file does not leak live sessions.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use manna_core::store::AuthUser;
use rand_core::{OsRng, RngCore};
use rusqlite::OptionalExtension as _;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Result, SqliteStore};

fn token_hash(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

impl SqliteStore {
  /// Create a session for `user_id` and return the plaintext token. The
  /// token is not recoverable afterwards.
  pub async fn issue_session(&self, user_id: Uuid, email: Option<String>) -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    let hash = token_hash(&token);
    let user = user_id.to_string();
    let at = Utc::now().to_rfc3339();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, email, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![hash, user, email, at],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(%user_id, "issued session");
    Ok(token)
  }

  /// Invalidate `token`. Returns whether a session was removed.
  pub async fn revoke_session(&self, token: &str) -> Result<bool> {
    let hash = token_hash(token);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM sessions WHERE token_hash = ?1", [hash])?)
      })
      .await?;
    Ok(removed > 0)
  }

  pub(crate) async fn lookup_session(&self, token: &str) -> Result<Option<AuthUser>> {
    let hash = token_hash(token);
    let found: Option<(String, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email FROM sessions WHERE token_hash = ?1",
              [hash],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    found
      .map(|(id, email)| -> Result<AuthUser> {
        Ok(AuthUser { id: Uuid::parse_str(&id)?, email })
      })
      .transpose()
  }
}
