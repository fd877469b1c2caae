/* src/server/core/rust/src/store.rs */

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
  #[error("{collection} '{id}' not found")]
  NotFound { collection: String, id: String },

  #[error("content store unavailable: {0}")]
  Unavailable(String),

  #[error("malformed document: {0}")]
  Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
  Tenants,
  Pages,
  Users,
  Media,
}

impl Collection {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Tenants => "tenants",
      Self::Pages => "pages",
      Self::Users => "users",
      Self::Media => "media",
    }
  }
}

impl fmt::Display for Collection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Declarative query filter over stored documents. Paths are dotted;
/// `tenant.slug` follows the tenant relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
  Equals(String, Value),
  NotEquals(String, Value),
  Exists(String, bool),
  In(String, Vec<Value>),
  And(Vec<Where>),
  Or(Vec<Where>),
}

impl Where {
  pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::Equals(path.into(), value.into())
  }

  pub fn not_equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::NotEquals(path.into(), value.into())
  }

  pub fn exists(path: impl Into<String>, exists: bool) -> Self {
    Self::Exists(path.into(), exists)
  }

  pub fn is_in<I, V>(path: impl Into<String>, values: I) -> Self
  where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
  {
    Self::In(path.into(), values.into_iter().map(Into::into).collect())
  }
}

/// The CMS collaborator: load one document by id, or find documents matching a filter.
/// Implementations own storage, querying, drafts and transport concerns.
pub trait ContentStore: Send + Sync {
  fn find_by_id<'a>(
    &'a self,
    collection: Collection,
    id: &'a str,
  ) -> BoxFuture<'a, Result<Value, StoreError>>;

  fn find<'a>(
    &'a self,
    collection: Collection,
    filter: &'a Where,
    limit: Option<usize>,
  ) -> BoxFuture<'a, Result<Vec<Value>, StoreError>>;
}

/// Initial content for a `MemoryStore`, as written in a seed JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
  #[serde(default)]
  pub tenants: Vec<Value>,
  #[serde(default)]
  pub pages: Vec<Value>,
  #[serde(default)]
  pub users: Vec<Value>,
  #[serde(default)]
  pub media: Vec<Value>,
}

impl SeedData {
  pub fn load(path: &Path) -> Result<Self, StoreError> {
    let content = std::fs::read_to_string(path)
      .map_err(|e| StoreError::Unavailable(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
      .map_err(|e| StoreError::Decode(format!("failed to parse {}: {e}", path.display())))
  }
}

/// In-process store backed by JSON documents.
#[derive(Default)]
pub struct MemoryStore {
  collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_seed(seed: SeedData) -> Result<Self, StoreError> {
    let mut collections = HashMap::new();
    for (collection, docs) in [
      (Collection::Tenants, seed.tenants),
      (Collection::Pages, seed.pages),
      (Collection::Users, seed.users),
      (Collection::Media, seed.media),
    ] {
      for doc in &docs {
        doc_id(doc).ok_or_else(|| {
          StoreError::Decode(format!("{collection} document without a string id: {doc}"))
        })?;
      }
      collections.insert(collection, docs);
    }
    Ok(Self { collections: RwLock::new(collections) })
  }

  pub fn load_seed(path: &Path) -> Result<Self, StoreError> {
    Self::from_seed(SeedData::load(path)?)
  }

  /// Insert or replace a document, keyed by its `id`.
  pub async fn insert(&self, collection: Collection, doc: Value) -> Result<(), StoreError> {
    let id = doc_id(&doc)
      .ok_or_else(|| StoreError::Decode(format!("{collection} document without a string id")))?
      .to_string();
    let mut guard = self.collections.write().await;
    let docs = guard.entry(collection).or_default();
    match docs.iter_mut().find(|d| doc_id(d) == Some(id.as_str())) {
      Some(existing) => *existing = doc,
      None => docs.push(doc),
    }
    Ok(())
  }

  pub async fn snapshot(&self) -> SeedData {
    let guard = self.collections.read().await;
    let take = |c: Collection| guard.get(&c).cloned().unwrap_or_default();
    SeedData {
      tenants: take(Collection::Tenants),
      pages: take(Collection::Pages),
      users: take(Collection::Users),
      media: take(Collection::Media),
    }
  }
}

impl ContentStore for MemoryStore {
  fn find_by_id<'a>(
    &'a self,
    collection: Collection,
    id: &'a str,
  ) -> BoxFuture<'a, Result<Value, StoreError>> {
    Box::pin(async move {
      let guard = self.collections.read().await;
      guard
        .get(&collection)
        .and_then(|docs| docs.iter().find(|d| doc_id(d) == Some(id)))
        .cloned()
        .ok_or_else(|| StoreError::NotFound {
          collection: collection.as_str().to_string(),
          id: id.to_string(),
        })
    })
  }

  fn find<'a>(
    &'a self,
    collection: Collection,
    filter: &'a Where,
    limit: Option<usize>,
  ) -> BoxFuture<'a, Result<Vec<Value>, StoreError>> {
    Box::pin(async move {
      let guard = self.collections.read().await;
      let Some(docs) = guard.get(&collection) else {
        return Ok(Vec::new());
      };
      let matched = docs.iter().filter(|doc| matches(&*guard, doc, filter)).cloned();
      Ok(match limit {
        Some(n) => matched.take(n).collect(),
        None => matched.collect(),
      })
    })
  }
}

pub fn doc_id(doc: &Value) -> Option<&str> {
  doc.get("id").and_then(Value::as_str)
}

// Relationship fields that dotted paths may traverse.
fn relation_target(field: &str) -> Option<Collection> {
  match field {
    "tenant" => Some(Collection::Tenants),
    _ => None,
  }
}

fn resolve_path<'a>(
  all: &'a HashMap<Collection, Vec<Value>>,
  doc: &'a Value,
  path: &str,
) -> Option<&'a Value> {
  let mut current = doc;
  let mut segments = path.split('.').peekable();
  while let Some(key) = segments.next() {
    let next = current.get(key)?;
    let target = relation_target(key);
    if segments.peek().is_none() {
      // A populated relation compares by its id
      current = match (target, next) {
        (Some(_), Value::Object(_)) => next.get("id")?,
        _ => next,
      };
      continue;
    }
    // Follow a relation stored as a bare id when more of the path remains
    if let (Some(target), Some(id)) = (target, next.as_str()) {
      current = all.get(&target)?.iter().find(|d| doc_id(d) == Some(id))?;
      continue;
    }
    current = next;
  }
  Some(current)
}

fn matches(all: &HashMap<Collection, Vec<Value>>, doc: &Value, filter: &Where) -> bool {
  match filter {
    Where::Equals(path, expected) => resolve_path(all, doc, path) == Some(expected),
    Where::NotEquals(path, expected) => resolve_path(all, doc, path) != Some(expected),
    Where::Exists(path, wanted) => {
      let present = resolve_path(all, doc, path).is_some_and(|v| !v.is_null());
      present == *wanted
    }
    Where::In(path, values) => resolve_path(all, doc, path).is_some_and(|v| values.contains(v)),
    Where::And(parts) => parts.iter().all(|p| matches(all, doc, p)),
    Where::Or(parts) => parts.iter().any(|p| matches(all, doc, p)),
  }
}
