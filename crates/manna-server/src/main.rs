//! manna-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `MANNA_*`
//! environment variables, opens the configured backend, and serves the JSON
//! API under `/api`.
//!
//! # Local sessions
//!
//! With the SQLite backend, mint a bearer token for a user with:
//!
//! ```text
//! cargo run -p manna-server -- --issue-session <USER_ID>
//! ```

mod settings;

use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use manna_api::{AppState, api_router};
use manna_core::store::RemoteStore;
use manna_services::seed;
use manna_store_rest::{PublicClientConfig, RestStore, ServiceKey};
use manna_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::{Backend, ServerConfig};

#[derive(Parser)]
#[command(author, version, about = "Manna API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: std::path::PathBuf,

  /// Install the bundled datasets into empty tables before serving.
  #[arg(long)]
  seed: bool,

  /// Print a new session token for this user id and exit (SQLite only).
  #[arg(long, value_name = "USER_ID")]
  issue_session: Option<Uuid>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  match server_cfg.backend {
    Backend::Sqlite => {
      let store_path = server_cfg.resolved_store_path();
      if let Some(dir) = store_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
          .with_context(|| format!("failed to create {}", dir.display()))?;
      }
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;

      if let Some(user) = cli.issue_session {
        let token = store
          .issue_session(user, None)
          .await
          .context("failed to issue session")?;
        println!("{token}");
        return Ok(());
      }

      let mut state = AppState::new(Arc::new(store));
      // Optional in local mode: lets clients discover a hosted backend too.
      if let Ok(public) = PublicClientConfig::from_env() {
        state = state.with_client_config(public);
      }
      run(state, cli.seed, &server_cfg).await
    }
    Backend::Rest => {
      if cli.issue_session.is_some() {
        anyhow::bail!("--issue-session only works with the sqlite backend");
      }
      let public = PublicClientConfig::from_env()
        .context("the rest backend needs MANNA_REMOTE_URL and MANNA_ANON_KEY")?;
      let store = match ServiceKey::from_env() {
        Some(key) => {
          tracing::info!("using the privileged credential tier");
          RestStore::privileged(&public.url, &key)?
        }
        None => {
          tracing::warn!("MANNA_SERVICE_KEY not set; row-level policies apply to every call");
          RestStore::public(&public)?
        }
      };
      let state = AppState::new(Arc::new(store)).with_client_config(public);
      run(state, cli.seed, &server_cfg).await
    }
  }
}

async fn run<S>(state: AppState<S>, seed_first: bool, server_cfg: &ServerConfig) -> anyhow::Result<()>
where
  S: RemoteStore + 'static,
{
  if seed_first {
    let installed = seed::install(&**state.services.store())
      .await
      .context("failed to install bundled datasets")?;
    tracing::info!(rows = installed, "bundled datasets installed");
  }

  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = server_cfg.address();
  tracing::info!(backend = ?server_cfg.backend, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
