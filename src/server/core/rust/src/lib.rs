/* src/server/core/rust/src/lib.rs */

pub mod access;
pub mod errors;
pub mod locale;
pub mod localized;
pub mod media;
pub mod page;
pub mod preview;
pub mod richtext;
pub mod server;
pub mod store;
pub mod tenant;

// Re-exports for ergonomic use
pub use access::{AccessResult, Capability, Filter, Operation, Principal, evaluate};
pub use errors::SiteError;
pub use locale::{
  DEFAULT_LOCALE, TenantLocales, accept_language_candidates, best_locale, get_best_locale,
  get_localized_value, get_negotiated_locale, get_tenant_locales, is_locale_supported,
  negotiate_locale, try_tenant_locales,
};
pub use localized::Localized;
pub use page::{Page, PageOutcome, PageView, TenantPage, find_page_by_slug, find_tenant_page};
pub use preview::{BoxStream, LivePreviewData, PreviewHub, PreviewMessage};
pub use server::{SiteParts, SiteServer};
pub use store::{BoxFuture, Collection, ContentStore, MemoryStore, SeedData, StoreError, Where};
pub use tenant::Tenant;
