/* src/server/core/rust/src/locale.rs */

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::localized::value_in_locale;
use crate::store::{Collection, ContentStore, StoreError};
use crate::tenant::Tenant;

pub const DEFAULT_LOCALE: &str = "en";

/// Supported locales of one tenant plus the locale used when nothing matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantLocales {
  pub locales: Vec<String>,
  pub default_locale: String,
}

impl TenantLocales {
  pub fn new(locales: Vec<String>) -> Self {
    let default_locale = first_or_default(&locales);
    Self { locales, default_locale }
  }
}

fn first_or_default(locales: &[String]) -> String {
  locales.first().cloned().unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// Language list of an already loaded tenant, `["en"]` when none is configured.
pub fn tenant_locales(tenant: &Tenant) -> Vec<String> {
  let languages = tenant.languages();
  if languages.is_empty() { vec![DEFAULT_LOCALE.to_string()] } else { languages }
}

/// Like `get_tenant_locales`, but only an unknown tenant falls back to the default;
/// transport and decode failures are returned to the caller.
pub async fn try_tenant_locales(
  store: &dyn ContentStore,
  tenant_id: &str,
) -> Result<Vec<String>, StoreError> {
  match store.find_by_id(Collection::Tenants, tenant_id).await {
    Ok(doc) => Ok(tenant_locales(&Tenant::from_doc(doc)?)),
    Err(StoreError::NotFound { .. }) => {
      debug!(tenant_id, "tenant not found, using default locale");
      Ok(vec![DEFAULT_LOCALE.to_string()])
    }
    Err(e) => Err(e),
  }
}

/// Never fails: any load error is logged and yields `["en"]`.
pub async fn get_tenant_locales(store: &dyn ContentStore, tenant_id: &str) -> Vec<String> {
  match try_tenant_locales(store, tenant_id).await {
    Ok(locales) => locales,
    Err(e) => {
      warn!(tenant_id, error = %e, "failed to load tenant locales");
      vec![DEFAULT_LOCALE.to_string()]
    }
  }
}

/// Pick the locale to serve from `supported` for an optional preference.
///
/// Exact match first, then the first supported locale starting with the
/// preference's primary subtag (text before the first `-`), then the list head.
/// The prefix rule is a plain `starts_with`, so "en" also matches "eng-US".
pub fn best_locale(supported: &[String], preferred: Option<&str>) -> String {
  preferred
    .and_then(|p| match_locale(supported, p))
    .unwrap_or_else(|| first_or_default(supported))
}

/// Like `best_locale` over a ranked preference list: the first preference with
/// an exact or primary-subtag hit wins, otherwise the list head.
pub fn negotiate_locale(supported: &[String], ranked: &[String]) -> String {
  ranked
    .iter()
    .find_map(|p| match_locale(supported, p))
    .unwrap_or_else(|| first_or_default(supported))
}

fn match_locale(supported: &[String], preferred: &str) -> Option<String> {
  if preferred.is_empty() {
    return None;
  }
  if supported.iter().any(|l| l == preferred) {
    return Some(preferred.to_string());
  }
  let language_code = preferred.split('-').next().unwrap_or(preferred);
  if language_code.is_empty() {
    return None;
  }
  supported.iter().find(|l| l.starts_with(language_code)).cloned()
}

pub async fn get_best_locale(
  store: &dyn ContentStore,
  tenant_id: &str,
  preferred: Option<&str>,
) -> String {
  let supported = get_tenant_locales(store, tenant_id).await;
  let locale = best_locale(&supported, preferred);
  debug!(tenant_id, ?preferred, %locale, "resolved tenant locale");
  locale
}

/// Store-backed `negotiate_locale`.
pub async fn get_negotiated_locale(
  store: &dyn ContentStore,
  tenant_id: &str,
  ranked: &[String],
) -> String {
  let supported = get_tenant_locales(store, tenant_id).await;
  let locale = negotiate_locale(&supported, ranked);
  debug!(tenant_id, ?ranked, %locale, "negotiated tenant locale");
  locale
}

pub async fn is_locale_supported(store: &dyn ContentStore, tenant_id: &str, locale: &str) -> bool {
  get_tenant_locales(store, tenant_id).await.iter().any(|l| l == locale)
}

/// Field value in `locale`, else in `fallback`, else the field itself when it
/// is not localized. No scan over other locales.
pub fn get_localized_value(
  entity: &Value,
  field: &str,
  locale: &str,
  fallback: &str,
) -> Option<String> {
  if field.is_empty() {
    return None;
  }
  value_in_locale(entity.get(field)?, locale, fallback).map(str::to_string)
}

/// Language tags of an Accept-Language header, strongest first. Wildcards and
/// `q=0` ("not acceptable") entries are dropped.
pub fn accept_language_candidates(header: &str) -> Vec<String> {
  let mut entries: Vec<(&str, f64)> = Vec::new();
  for part in header.split(',') {
    let part = part.trim();
    if part.is_empty() {
      continue;
    }
    let mut segments = part.split(';');
    let lang = segments.next().unwrap_or("").trim();
    if lang.is_empty() || lang == "*" {
      continue;
    }
    let mut q = 1.0_f64;
    for s in segments {
      if let Some(val) = s.trim().strip_prefix("q=") {
        if let Ok(v) = val.parse::<f64>() {
          q = v;
        }
      }
    }
    if q > 0.0 {
      entries.push((lang, q));
    }
  }

  // Stable sort keeps header order among equal weights
  entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
  entries.into_iter().map(|(lang, _)| lang.to_string()).collect()
}
