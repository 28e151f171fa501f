//! `manna`: read today's devotional and more from the terminal.
//!
//! Talks to the hosted backend with the public credential tier only, the
//! same way the app's browser context does. Reads that fail fall back to the
//! bundled content without comment.
//!
//! # Usage
//!
//! ```text
//! manna today
//! manna plans --difficulty beginner
//! manna login --token <ACCESS_TOKEN>
//! manna me
//! manna theme toggle
//! ```

mod prefs;
mod render;

use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use manna_core::{Fetched, channel::ChannelStatus, plan::Difficulty, store::RemoteStore};
use manna_services::{
  ChannelService, DevotionalService, EventService, PlanService, PointsService,
  context::{AuthContext, LoadState, Theme, ThemeContext, UserDataContext},
  verses,
};
use manna_store_rest::{
  PublicClientConfig, RestStore,
  config::{ENV_ANON_KEY, ENV_URL},
};
use prefs::Prefs;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "manna", about = "Daily devotionals from the terminal")]
struct Args {
  /// Path to the preferences file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the hosted backend.
  #[arg(long, env = ENV_URL)]
  url: Option<String>,

  /// The public (anon) key.
  #[arg(long, env = ENV_ANON_KEY, hide_env_values = true)]
  anon_key: Option<String>,

  /// Print JSON instead of text.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// The devotional of the day.
  Today {
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// The verse of the day (bundled, works offline).
  Verse {
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// Reading plans.
  Plans {
    #[arg(long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,
  },
  /// Upcoming events.
  Events {
    #[arg(long)]
    tag: Option<String>,
  },
  /// Broadcast channels.
  Channels {
    #[arg(long, value_parser = parse_status)]
    status: Option<ChannelStatus>,
    #[arg(long)]
    category: Option<String>,
  },
  /// Save an access token for the commands that need a session.
  Login {
    #[arg(long)]
    token: String,
  },
  /// Forget the saved access token.
  Logout,
  /// Points, level, achievements and unread notifications.
  Me,
  /// Claim today's login bonus.
  Claim,
  /// Show or change the theme.
  Theme {
    #[arg(value_enum)]
    action: Option<ThemeAction>,
  },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeAction {
  Light,
  Dark,
  System,
  Toggle,
}

fn parse_lowercase<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, String> {
  serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase())).map_err(|e| e.to_string())
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> { parse_lowercase(s) }

fn parse_status(s: &str) -> Result<ChannelStatus, String> { parse_lowercase(s) }

// ─── Output ──────────────────────────────────────────────────────────────────

/// Print `value` as JSON or as `text`. Bundled content is shown the same
/// way as live content.
fn emit<T: Serialize>(json: bool, fetched: &Fetched<T>, text: impl FnOnce(&T) -> String) -> Result<()> {
  emit_to(&mut std::io::stdout().lock(), json, fetched, text)
}

fn emit_to<T: Serialize>(
  out: &mut impl Write,
  json: bool,
  fetched: &Fetched<T>,
  text: impl FnOnce(&T) -> String,
) -> Result<()> {
  if fetched.is_fallback() {
    tracing::debug!("showing bundled content");
  }
  let value = fetched.as_inner();
  if json {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
  } else {
    write!(out, "{}", text(value))?;
  }
  Ok(())
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let prefs_path = args.config.clone().unwrap_or_else(prefs::default_path);
  let mut prefs = Prefs::load(&prefs_path)?;
  let json = args.json;

  // Commands that never touch the backend.
  match &args.command {
    Command::Verse { date } => {
      let date = date.unwrap_or_else(|| Utc::now().date_naive());
      let verse = verses::verse_of_day(date).context("no verses bundled")?;
      return emit(json, &Fetched::Live(verse), render::verse);
    }
    Command::Login { token } => {
      prefs.access_token = Some(token.clone());
      prefs.save(&prefs_path)?;
      println!("Saved session to {}", prefs_path.display());
      return Ok(());
    }
    Command::Logout => {
      prefs.access_token = None;
      prefs.save(&prefs_path)?;
      println!("Signed out.");
      return Ok(());
    }
    Command::Theme { action } => {
      let ctx = ThemeContext::load(&prefs_path).await;
      let theme = match action {
        None => ctx.current(),
        Some(ThemeAction::Toggle) => ctx.toggle().await?,
        Some(a) => {
          let next = match a {
            ThemeAction::Light => Theme::Light,
            ThemeAction::Dark => Theme::Dark,
            _ => Theme::System,
          };
          ctx.set(next).await?;
          next
        }
      };
      println!("{}", render::theme(theme));
      return Ok(());
    }
    _ => {}
  }

  let public = PublicClientConfig::new(
    args
      .url
      .or(prefs.url.clone())
      .with_context(|| format!("set {ENV_URL} or `url` in {}", prefs_path.display()))?,
    args
      .anon_key
      .or(prefs.anon_key.clone())
      .with_context(|| format!("set {ENV_ANON_KEY} or `anon_key` in {}", prefs_path.display()))?,
  )?;
  let store = RestStore::public(&public)?;

  match args.command {
    Command::Today { date } => {
      let date = date.unwrap_or_else(|| Utc::now().date_naive());
      let today = DevotionalService::new(Arc::new(store))
        .devotional_of_day(date)
        .await;
      let shown = match today {
        Fetched::Live(Some(d)) => Fetched::Live(d),
        Fetched::Fallback(Some(d)) => Fetched::Fallback(d),
        Fetched::Live(None) | Fetched::Fallback(None) => bail!("no devotional available"),
      };
      emit(json, &shown, render::devotional)
    }
    Command::Plans { difficulty } => {
      let plans = PlanService::new(Arc::new(store)).list(difficulty).await;
      emit(json, &plans, |p| render::plans(p))
    }
    Command::Events { tag } => {
      let events = EventService::new(Arc::new(store)).list(tag.as_deref()).await;
      emit(json, &events, |e| render::events(e))
    }
    Command::Channels { status, category } => {
      let channels = ChannelService::new(Arc::new(store))
        .list(status, category.as_deref())
        .await;
      emit(json, &channels, |c| render::channels(c))
    }
    Command::Me => {
      let token = prefs
        .access_token
        .as_deref()
        .context("not signed in; run `manna login --token <TOKEN>`")?;
      let store = Arc::new(store.with_access_token(token));
      let auth = AuthContext::new(store.clone());
      let (_, side_effects) = auth.sign_in_with_token(token).await?;
      side_effects.await?;

      let user_data = UserDataContext::new(store, &auth);
      user_data.refresh().await;
      let shown = match user_data.current() {
        LoadState::Ready(d) => Fetched::Live(d),
        LoadState::Fallback(d) => Fetched::Fallback(d),
        LoadState::Idle | LoadState::Loading => bail!("session ended before data arrived"),
      };
      emit(json, &shown, render::user)
    }
    Command::Claim => {
      let token = prefs
        .access_token
        .as_deref()
        .context("not signed in; run `manna login --token <TOKEN>`")?;
      let store = Arc::new(store.with_access_token(token));
      let user = store
        .user_for_token(token)
        .await?
        .context("session expired; run `manna login` again")?;
      let claim = PointsService::new(store).claim_daily(user.id).await?;
      emit(json, &Fetched::Live(claim), render::claim)
    }
    Command::Verse { .. } | Command::Login { .. } | Command::Logout | Command::Theme { .. } => {
      Ok(())
    }
  }
}
