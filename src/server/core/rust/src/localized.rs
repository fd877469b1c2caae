/* src/server/core/rust/src/localized.rs */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A text field as stored on a content entity: either one plain string,
/// or one string per locale code. A missing key, a `null` or an empty string
/// all mean "not translated".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Localized {
  Plain(String),
  PerLocale(BTreeMap<String, Option<String>>),
}

impl Localized {
  /// Requested locale, then fallback locale, then the plain value. Empty
  /// translations count as missing.
  pub fn resolve(&self, locale: &str, fallback: &str) -> Option<&str> {
    match self {
      Self::PerLocale(map) => non_empty(map.get(locale)).or_else(|| non_empty(map.get(fallback))),
      Self::Plain(s) => Some(s.as_str()),
    }
  }
}

impl From<&str> for Localized {
  fn from(s: &str) -> Self {
    Self::Plain(s.to_string())
  }
}

fn non_empty(s: Option<&Option<String>>) -> Option<&str> {
  s.and_then(Option::as_deref).filter(|s| !s.is_empty())
}

/// Read a localized field straight from a stored JSON document.
pub fn value_in_locale<'a>(
  field: &'a Value,
  locale: &str,
  fallback: &str,
) -> Option<&'a str> {
  match field {
    Value::Object(map) => {
      let pick = |key: &str| map.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
      pick(locale).or_else(|| pick(fallback))
    }
    Value::String(s) => Some(s.as_str()),
    _ => None,
  }
}

/// Rich-text content is stored either as one document (`{"root": ...}`) or as
/// one document per locale code.
pub fn document_in_locale<'a>(
  content: &'a Value,
  locale: &str,
  fallback: &str,
) -> Option<&'a Value> {
  let map = content.as_object()?;
  if map.contains_key("root") {
    return Some(content);
  }
  map.get(locale).filter(|v| !v.is_null()).or_else(|| map.get(fallback).filter(|v| !v.is_null()))
}
