//! `kyc` — command-line review desk for marketplace KYC verifications.
//!
//! # Usage
//!
//! ```text
//! kyc --url https://market.example/api --token-file ~/.config/kyc/token list --status pending
//! kyc show 64f1c2
//! kyc approve 64f1c2 --notes "passport matches"
//! kyc --config ~/.config/kyc/config.toml reject 64f1c2 --notes "expired id"
//! ```

mod auth;
mod client;
mod render;

use std::{
  fmt::Write as _,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result, anyhow};
use auth::{Credentials, TokenFile};
use clap::{Parser, Subcommand};
use client::{ApiConfig, HttpBackend};
use kyc_core::{
  AuthProvider, CategoryFilter, FetchOutcome, KycBackend, ReviewDesk, RowFilter,
  StaticToken, StatusFilter,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kyc", version, about = "Review marketplace KYC verifications")]
struct Args {
  /// Path to a TOML config file (url, token, token_file, timeout).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the marketplace API (default: http://localhost:8000).
  #[arg(long, env = "KYC_URL")]
  url: Option<String>,

  /// Bearer token for the API.
  #[arg(long, env = "KYC_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// File holding the bearer token; re-read before every request.
  #[arg(long, env = "KYC_TOKEN_FILE", value_name = "FILE")]
  token_file: Option<PathBuf>,

  /// Give up on a request after this many seconds (default: wait).
  #[arg(long, env = "KYC_TIMEOUT", value_name = "SECS")]
  timeout: Option<u64>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List one row per user, optionally filtered.
  List {
    /// Case-insensitive match against name or email.
    #[arg(short, long)]
    search: Option<String>,

    /// all, pending, verified or rejected.
    #[arg(long, default_value = "all")]
    status: StatusFilter,

    /// all, provider or customer.
    #[arg(long = "type", default_value = "all")]
    category: CategoryFilter,
  },

  /// Show a user's row and every document behind it.
  Show { user_id: String },

  /// Approve a user's verification.
  Approve {
    user_id: String,
    #[arg(long)]
    notes:   Option<String>,
  },

  /// Reject a user's verification.
  Reject {
    user_id: String,
    #[arg(long)]
    notes:   Option<String>,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:        String,
  #[serde(default)]
  token:      String,
  #[serde(default)]
  token_file: Option<PathBuf>,
  /// Seconds.
  #[serde(default)]
  timeout:    Option<u64>,
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile> {
  let Some(path) = path else {
    return Ok(ConfigFile::default());
  };
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

/// Flags (and their env vars) win over the config file. An explicit token
/// wins over a token file.
fn credentials(args: &Args, file: &ConfigFile) -> Credentials {
  if let Some(token) = &args.token {
    return Credentials::Static(StaticToken::new(token.clone()));
  }
  if let Some(path) = &args.token_file {
    return Credentials::File(TokenFile::new(path));
  }
  if !file.token.is_empty() {
    return Credentials::Static(StaticToken::new(file.token.clone()));
  }
  match &file.token_file {
    Some(path) => Credentials::File(TokenFile::new(path)),
    None => Credentials::Static(StaticToken::none()),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let file_cfg = load_config(args.config.as_deref())?;

  let api_config = ApiConfig {
    base_url: args
      .url
      .clone()
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    timeout:  args.timeout.or(file_cfg.timeout).map(Duration::from_secs),
  };
  let backend = HttpBackend::new(api_config)?;
  let mut desk = ReviewDesk::new(backend, credentials(&args, &file_cfg));

  print!("{}", run(&mut desk, args.command).await?);
  Ok(())
}

// ─── Commands ─────────────────────────────────────────────────────────────────

/// Run one command against `desk` and return what it prints.
///
/// `list` and `show` need the listing and fail without it. A decision goes
/// straight to the backend; the listing is fetched first only so the desk has
/// rows to splice into, and a failed fetch is logged rather than fatal.
async fn run<B, A>(desk: &mut ReviewDesk<B, A>, command: Command) -> Result<String>
where
  B: KycBackend,
  A: AuthProvider,
{
  let needs_listing = matches!(command, Command::List { .. } | Command::Show { .. });
  match desk.refresh().await {
    Ok(FetchOutcome::Skipped) => {
      eprintln!("no bearer token configured; nothing fetched");
    }
    Ok(FetchOutcome::Loaded { .. }) => {}
    Err(e) if !needs_listing => {
      tracing::warn!(error = %e, "listing unavailable; submitting decision anyway");
    }
    Err(e) => return Err(e).context("fetching kyc documents"),
  }

  let mut out = String::new();
  match command {
    Command::List {
      search,
      status,
      category,
    } => {
      let filter = RowFilter {
        search,
        status,
        category,
      };
      let rows = desk.visible(&filter);
      writeln!(out, "{}", render::summary_line(&desk.counts()))?;
      for row in &rows {
        writeln!(out, "{}", render::row_line(row))?;
      }
    }
    Command::Show { user_id } => {
      let row = desk
        .row(&user_id)
        .ok_or_else(|| anyhow!("no kyc documents for user {user_id}"))?;
      out.push_str(&render::row_detail(row));
    }
    Command::Approve { user_id, notes } => {
      let row = desk
        .decide(&user_id, true, notes)
        .await
        .with_context(|| format!("approving {user_id}"))?;
      writeln!(out, "{}", render::row_line(&row))?;
    }
    Command::Reject { user_id, notes } => {
      let row = desk
        .decide(&user_id, false, notes)
        .await
        .with_context(|| format!("rejecting {user_id}"))?;
      writeln!(out, "{}", render::row_line(&row))?;
    }
  }
  Ok(out)
}
