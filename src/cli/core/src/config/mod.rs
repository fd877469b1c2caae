/* src/cli/core/src/config/mod.rs */

mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use loader::{apply_env_overrides, find_site_config, load_site_config, parse_site_config};
pub use types::SiteConfig;
