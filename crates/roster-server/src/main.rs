//! roster-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `ROSTER_*` environment variables, opens the SQLite store and serves the
//! JSON API over HTTP.
//!
//! # Bootstrapping an administrator
//!
//! Invitation codes can only be issued by an admin, so the first one is
//! created from the command line:
//!
//! ```sh
//! cargo run -p roster-server -- --create-admin head@school.example
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use roster_core::registration::{Credentials, provision_admin};
use roster_server::{AppState, ServerConfig};
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster staff directory server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create an admin account for EMAIL (password read from stdin) and exit.
  #[arg(long, value_name = "EMAIL")]
  create_admin: Option<String>,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ROSTER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(email) = cli.create_admin {
    let password = read_password()?;
    let credentials = Credentials {
      email,
      password: password.clone(),
      confirm_password: password,
      display_name: None,
    };
    let admin = provision_admin(&store, &store, credentials)
      .await
      .context("failed to create admin")?;
    println!("{}", admin.identity.uid);
    return Ok(());
  }

  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg.clone()),
  };

  let app = roster_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    registration = ?server_cfg.registration_mode,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Prompt for the new admin's password on stdin.
fn read_password() -> anyhow::Result<String> {
  eprint!("Password for the new admin: ");
  let password = std::io::stdin().lines().next().context("no password on stdin")??;
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
}

/// Resolve a leading `~` against `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
