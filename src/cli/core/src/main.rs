/* src/cli/core/src/main.rs */

mod config;
mod seed;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use campaign_server::{
  MemoryStore, SeedData, SiteServer, TenantLocales, best_locale, try_tenant_locales,
};
use campaign_server_axum::IntoAxumRouter;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{SiteConfig, apply_env_overrides, find_site_config, load_site_config};

#[derive(Parser)]
#[command(name = "campaign", about = "Multi-tenant campaign site")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the site from the seeded store
  Serve {
    /// Path to campaign.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
  },
  /// Print a tenant's supported locales and the best match for a preference
  Locales {
    /// Tenant document id
    tenant_id: String,
    /// Preferred language tag (e.g. fr-CA)
    #[arg(short, long)]
    preferred: Option<String>,
    /// Path to campaign.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
  },
  /// Validate the seed data
  Check {
    /// Path to campaign.toml (auto-detected if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
  },
}

/// Resolve config path (explicit or auto-detected) and parse it
fn resolve_config(explicit: Option<PathBuf>) -> Result<(PathBuf, SiteConfig)> {
  let path = match explicit {
    Some(p) => p,
    None => {
      let cwd = std::env::current_dir().context("failed to get cwd")?;
      find_site_config(&cwd)?
    }
  };
  let mut config = load_site_config(&path)?;
  apply_env_overrides(&mut config, |k| std::env::var(k).ok())?;
  Ok((path, config))
}

/// `RUST_LOG` wins over `log.filter`.
fn init_tracing(config: &SiteConfig) -> Result<()> {
  let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
    Ok(_) => EnvFilter::from_default_env(),
    Err(_) => EnvFilter::try_new(&config.log.filter).context("invalid log.filter")?,
  };
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
  Ok(())
}

fn load_seed(config: &SiteConfig, config_path: &Path) -> Result<SeedData> {
  let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
  match config.seed_path(base_dir) {
    Some(path) => {
      SeedData::load(&path).with_context(|| format!("failed to load seed {}", path.display()))
    }
    None => Ok(SeedData::default()),
  }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
  let mut out = std::io::stdout().lock();
  serde_json::to_writer_pretty(&mut out, value)?;
  writeln!(out)?;
  Ok(())
}

async fn serve(config: SiteConfig, seed: SeedData) -> Result<()> {
  let store = seed::prepare_store(seed, chrono::Utc::now()).await?;
  let router = SiteServer::new(Arc::new(store))
    .fallback_locale(config.i18n.fallback.clone())
    .into_axum_router()
    .layer(TraceLayer::new_for_http());

  let addr = config.addr();
  let listener =
    tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {addr}"))?;
  info!("campaign site listening on http://{}", listener.local_addr()?);
  axum::serve(listener, router).await.context("server error")?;
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  match cli.command {
    Command::Serve { config } => {
      let (config_path, config) = resolve_config(config)?;
      init_tracing(&config)?;
      let seed = load_seed(&config, &config_path)?;
      serve(config, seed).await?;
    }
    Command::Locales { tenant_id, preferred, config } => {
      let (config_path, config) = resolve_config(config)?;
      init_tracing(&config)?;
      let store = MemoryStore::from_seed(load_seed(&config, &config_path)?)?;
      let locales = TenantLocales::new(try_tenant_locales(&store, &tenant_id).await?);
      let best = best_locale(&locales.locales, preferred.as_deref());
      print_json(&serde_json::json!({
        "locales": locales.locales,
        "defaultLocale": locales.default_locale,
        "best": best,
      }))?;
    }
    Command::Check { config } => {
      let (config_path, config) = resolve_config(config)?;
      init_tracing(&config)?;
      let seed = load_seed(&config, &config_path)?;
      let problems = seed::check_seed(&seed);
      if !problems.is_empty() {
        for problem in &problems {
          tracing::error!("{problem}");
        }
        bail!("seed has {} problem(s)", problems.len());
      }
      info!(tenants = seed.tenants.len(), pages = seed.pages.len(), "seed is consistent");
    }
  }
  Ok(())
}
