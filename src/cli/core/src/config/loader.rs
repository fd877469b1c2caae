/* src/cli/core/src/config/loader.rs */

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::SiteConfig;

pub const CONFIG_FILE: &str = "campaign.toml";

/// Walk upward from `start` to find `campaign.toml`, like Cargo.toml discovery
pub fn find_site_config(start: &Path) -> Result<PathBuf> {
  let mut dir =
    start.canonicalize().with_context(|| format!("failed to canonicalize {}", start.display()))?;
  loop {
    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
      return Ok(candidate);
    }
    if !dir.pop() {
      bail!("{CONFIG_FILE} not found (searched upward from {})", start.display());
    }
  }
}

pub fn parse_site_config(content: &str) -> Result<SiteConfig> {
  let config: SiteConfig = toml::from_str(content)?;
  config.validate()?;
  Ok(config)
}

pub fn load_site_config(path: &Path) -> Result<SiteConfig> {
  let content =
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  parse_site_config(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// `PORT` overrides `server.port`.
pub fn apply_env_overrides(
  config: &mut SiteConfig,
  var: impl Fn(&str) -> Option<String>,
) -> Result<()> {
  if let Some(port) = var("PORT").filter(|p| !p.trim().is_empty()) {
    config.server.port =
      port.trim().parse().with_context(|| format!("PORT is not a valid port: {port}"))?;
  }
  Ok(())
}
