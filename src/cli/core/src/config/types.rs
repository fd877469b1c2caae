/* src/cli/core/src/config/types.rs */

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use campaign_server::DEFAULT_LOCALE;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
  #[serde(default)]
  pub server: ServerSection,
  #[serde(default)]
  pub i18n: I18nSection,
  #[serde(default)]
  pub store: StoreSection,
  #[serde(default)]
  pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
}

impl Default for ServerSection {
  fn default() -> Self {
    Self { host: default_host(), port: default_port() }
  }
}

fn default_host() -> String {
  "0.0.0.0".to_string()
}

fn default_port() -> u16 {
  3000
}

#[derive(Debug, Clone, Deserialize)]
pub struct I18nSection {
  #[serde(default = "default_fallback")]
  pub fallback: String,
}

impl Default for I18nSection {
  fn default() -> Self {
    Self { fallback: default_fallback() }
  }
}

fn default_fallback() -> String {
  DEFAULT_LOCALE.to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSection {
  /// Seed JSON, relative to the config file
  pub seed: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
  #[serde(default = "default_filter")]
  pub filter: String,
}

impl Default for LogSection {
  fn default() -> Self {
    Self { filter: default_filter() }
  }
}

fn default_filter() -> String {
  "campaign=info".to_string()
}

impl SiteConfig {
  pub fn validate(&self) -> Result<()> {
    if self.server.host.trim().is_empty() {
      bail!("server.host must not be empty");
    }
    if self.i18n.fallback.trim().is_empty() {
      bail!("i18n.fallback must not be empty");
    }
    if self.store.seed.as_deref().is_some_and(|s| s.trim().is_empty()) {
      bail!("store.seed must not be empty when set");
    }
    Ok(())
  }

  pub fn addr(&self) -> String {
    format!("{}:{}", self.server.host, self.server.port)
  }

  pub fn seed_path(&self, base_dir: &Path) -> Option<PathBuf> {
    self.store.seed.as_ref().map(|s| base_dir.join(s))
  }
}
