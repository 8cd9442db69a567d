//! `sanskrit`: command-line access to a Sanskrit document store.
//!
//! Reads `sanskrit.toml` (or the path given with `--config`), then
//! `SANSKRIT_*` environment variables, then `--database`.
//!
//! ```text
//! sanskrit --database ~/novel.db init --name "My Novel"
//! sanskrit add "Chapter 1"
//! sanskrit outline
//! ```

mod commands;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use commands::Command;
use sanskrit_store_sqlite::{SanskritDb, StoreConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Sanskrit document store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sanskrit.toml")]
  config: PathBuf,

  /// Database file; overrides the config file and environment.
  #[arg(short, long)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = load_config(&cli.config, cli.database.as_deref())?;

  let db = SanskritDb::open(&config)
    .await
    .with_context(|| format!("failed to open store at {:?}", config.database))?;
  tracing::debug!(
    database = ?db.pool().path(),
    max_connections = db.pool().max_connections(),
    timeout = ?db.pool().timeout(),
    "opened store"
  );

  let output = commands::run(&db, cli.command).await?;
  if !output.is_empty() {
    println!("{output}");
  }

  Ok(())
}

/// Layer the config file, `SANSKRIT_*` variables and the `--database` flag.
fn load_config(file: &Path, database: Option<&Path>) -> anyhow::Result<StoreConfig> {
  let settings = config::Config::builder()
    .set_default("database", "sanskrit.db")?
    .add_source(config::File::from(file).required(false))
    .add_source(config::Environment::with_prefix("SANSKRIT"))
    .set_override_option(
      "database",
      database.map(|p| p.to_string_lossy().into_owned()),
    )?
    .build()
    .context("failed to read config file")?;

  let mut store_cfg: StoreConfig = settings
    .try_deserialize()
    .context("failed to deserialise StoreConfig")?;

  store_cfg.database = expand_tilde(&store_cfg.database);
  Ok(store_cfg)
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
