//! arcop-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store and serves the portal API over HTTP.
//!
//! Expected configuration:
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 8080
//! store_path = "~/.local/share/arcop/requests.db"
//! admin_username = "dpo"
//! admin_password_hash = "$argon2id$v=19$..."
//!
//! [portal]
//! base_url = "https://portal.example.cl"
//!
//! [portal.company]
//! name = "Empresa XYZ SpA"
//! rut = "76.543.210-K"
//! dpo_email = "dpo@example.cl"
//! dpo_phone = "+56 2 2345 6789"
//!
//! [smtp]             # optional; without it notifications are only logged
//! host = "smtp.example.cl"
//! from_address = "Portal ARCOP <no-reply@example.cl>"
//! ```
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```
//! cargo run -p arcop-api --bin arcop-server -- --hash-password
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use arcop_api::{AppState, ServerConfig, api_router};
use arcop_core::notify::Notifier;
use arcop_mailer::{SmtpNotifier, TracingNotifier};
use arcop_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "ARCOP request portal server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ARCOP").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Pick the notifier: real SMTP when configured, tracing-only otherwise.
  match &server_cfg.smtp {
    Some(smtp) => {
      let notifier = SmtpNotifier::new(smtp, server_cfg.portal.clone())
        .context("failed to build smtp notifier")?;
      serve(store, notifier, server_cfg).await
    }
    None => {
      tracing::warn!("no [smtp] section configured; emails will only be logged");
      serve(store, TracingNotifier, server_cfg).await
    }
  }
}

async fn serve<N>(
  store: SqliteStore,
  notifier: N,
  config: ServerConfig,
) -> anyhow::Result<()>
where
  N: Notifier + 'static,
{
  let state = AppState::new(store, notifier, &config);

  let app = axum::Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", config.host, config.port);
  tracing::info!("listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
