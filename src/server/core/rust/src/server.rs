/* src/server/core/rust/src/server.rs */

use std::sync::Arc;

use crate::locale::DEFAULT_LOCALE;
use crate::preview::PreviewHub;
use crate::store::ContentStore;

/// Framework-agnostic parts extracted from `SiteServer`.
/// Adapter crates consume this to build framework-specific routers.
pub struct SiteParts {
  pub store: Arc<dyn ContentStore>,
  pub fallback_locale: String,
  pub preview: Arc<PreviewHub>,
}

pub struct SiteServer {
  store: Arc<dyn ContentStore>,
  fallback_locale: String,
  preview: Option<Arc<PreviewHub>>,
}

impl SiteServer {
  pub fn new(store: Arc<dyn ContentStore>) -> Self {
    Self { store, fallback_locale: DEFAULT_LOCALE.to_string(), preview: None }
  }

  /// Locale used when a localized field has no value in the requested one.
  pub fn fallback_locale(mut self, locale: impl Into<String>) -> Self {
    let locale = locale.into();
    if !locale.is_empty() {
      self.fallback_locale = locale;
    }
    self
  }

  /// Share a preview hub with code that publishes outside the HTTP surface.
  pub fn preview_hub(mut self, hub: Arc<PreviewHub>) -> Self {
    self.preview = Some(hub);
    self
  }

  /// Consume the builder, returning framework-agnostic parts for an adapter.
  pub fn into_parts(self) -> SiteParts {
    SiteParts {
      store: self.store,
      fallback_locale: self.fallback_locale,
      preview: self.preview.unwrap_or_default(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;

  #[test]
  fn defaults() {
    let parts = SiteServer::new(Arc::new(MemoryStore::new())).into_parts();
    assert_eq!(parts.fallback_locale, "en");
  }

  #[test]
  fn empty_fallback_is_ignored() {
    let parts =
      SiteServer::new(Arc::new(MemoryStore::new())).fallback_locale("").into_parts();
    assert_eq!(parts.fallback_locale, "en");
    let parts =
      SiteServer::new(Arc::new(MemoryStore::new())).fallback_locale("fr").into_parts();
    assert_eq!(parts.fallback_locale, "fr");
  }

  #[test]
  fn shared_preview_hub_is_kept() {
    let hub = Arc::new(PreviewHub::new());
    let parts =
      SiteServer::new(Arc::new(MemoryStore::new())).preview_hub(hub.clone()).into_parts();
    assert!(Arc::ptr_eq(&hub, &parts.preview));
  }
}
