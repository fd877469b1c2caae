/* src/cli/core/src/seed.rs */

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use campaign_server::page::default_campaign_pages;
use campaign_server::store::doc_id;
use campaign_server::{Collection, MemoryStore, Page, SeedData, Tenant};
use chrono::{DateTime, Utc};
use tracing::info;

/// Fill campaign defaults on every seeded tenant and give tenants without
/// any page the starter pages.
pub async fn prepare_store(seed: SeedData, now: DateTime<Utc>) -> Result<MemoryStore> {
  let tenants = seed
    .tenants
    .iter()
    .map(|doc| Tenant::from_doc(doc.clone()))
    .collect::<Result<Vec<_>, _>>()
    .context("invalid tenant in seed")?;
  let with_pages: HashSet<String> = seed
    .pages
    .iter()
    .filter_map(|doc| doc.get("tenant"))
    .filter_map(|t| t.as_str().or_else(|| t.get("id").and_then(|id| id.as_str())))
    .map(str::to_string)
    .collect();

  let store = MemoryStore::from_seed(seed).context("invalid seed")?;
  for mut tenant in tenants {
    if tenant.apply_campaign_defaults(now) {
      info!(tenant = %tenant.slug, "applied campaign defaults");
      store.insert(Collection::Tenants, serde_json::to_value(&tenant)?).await?;
    }
    if !with_pages.contains(&tenant.id) {
      let pages = default_campaign_pages(&tenant);
      info!(tenant = %tenant.slug, count = pages.len(), "created starter pages");
      for page in pages {
        store.insert(Collection::Pages, serde_json::to_value(&page)?).await?;
      }
    }
  }
  Ok(store)
}

/// Consistency problems in a seed, one message each. Empty means clean.
pub fn check_seed(seed: &SeedData) -> Vec<String> {
  let mut problems = Vec::new();

  let mut tenant_slugs: HashMap<String, String> = HashMap::new();
  let mut tenant_ids = HashSet::new();
  for doc in &seed.tenants {
    match Tenant::from_doc(doc.clone()) {
      Ok(tenant) => {
        if let Some(first) = tenant_slugs.insert(tenant.slug.clone(), tenant.id.clone()) {
          problems.push(format!(
            "tenants {first} and {} share the slug \"{}\"",
            tenant.id, tenant.slug
          ));
        }
        tenant_ids.insert(tenant.id);
      }
      Err(e) => problems.push(format!("tenant {}: {e}", doc_id(doc).unwrap_or("<no id>"))),
    }
  }

  let mut page_slugs: HashMap<(String, String), String> = HashMap::new();
  for doc in &seed.pages {
    let page = match Page::from_doc(doc.clone()) {
      Ok(page) => page,
      Err(e) => {
        problems.push(format!("page {}: {e}", doc_id(doc).unwrap_or("<no id>")));
        continue;
      }
    };
    let Some(tenant) = page.tenant_id() else {
      continue;
    };
    if !tenant_ids.contains(tenant) {
      problems.push(format!("page {} belongs to unknown tenant {tenant}", page.id));
      continue;
    }
    let Some(slug) = page.slug.as_deref().filter(|s| !s.is_empty()) else {
      continue;
    };
    let key = (tenant.to_string(), slug.to_string());
    if let Some(first) = page_slugs.insert(key, page.id.clone()) {
      problems.push(format!(
        "pages {first} and {} share the slug \"{slug}\" in tenant {tenant}",
        page.id
      ));
    }
  }

  problems
}

#[cfg(test)]
mod tests {
  use super::*;
  use campaign_server::{ContentStore, Where, get_tenant_locales};
  use serde_json::json;

  fn seed(value: serde_json::Value) -> SeedData {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn clean_seed_has_no_problems() {
    let data = seed(json!({
      "tenants": [{"id": "t1", "slug": "gold"}, {"id": "t2", "slug": "silver"}],
      "pages": [
        {"id": "p1", "tenant": "t1", "slug": "home", "title": "Home"},
        {"id": "p2", "tenant": "t2", "slug": "home", "title": "Home"},
        {"id": "p3", "slug": "home", "title": "Site"}
      ]
    }));
    assert!(check_seed(&data).is_empty());
  }

  #[test]
  fn reports_duplicates_and_dangling_tenants() {
    let data = seed(json!({
      "tenants": [{"id": "t1", "slug": "gold"}, {"id": "t2", "slug": "gold"}],
      "pages": [
        {"id": "p1", "tenant": "t1", "slug": "rules", "title": "Rules"},
        {"id": "p2", "tenant": {"id": "t1"}, "slug": "rules", "title": "Rules again"},
        {"id": "p3", "tenant": "t9", "slug": "home", "title": "Lost"}
      ]
    }));
    let problems = check_seed(&data);
    assert_eq!(
      problems,
      vec![
        "tenants t1 and t2 share the slug \"gold\"".to_string(),
        "pages p1 and p2 share the slug \"rules\" in tenant t1".to_string(),
        "page p3 belongs to unknown tenant t9".to_string(),
      ]
    );
  }

  #[test]
  fn reports_undecodable_documents() {
    let data = seed(json!({"tenants": [{"id": "t1"}], "pages": [{"id": "p1"}]}));
    let problems = check_seed(&data);
    assert_eq!(problems.len(), 2);
    assert!(problems[0].starts_with("tenant t1:"));
    assert!(problems[1].starts_with("page p1:"));
  }

  #[tokio::test]
  async fn prepare_fills_defaults_and_starter_pages() {
    let now = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
    let data = seed(json!({
      "tenants": [
        {"id": "t1", "slug": "gold", "name": "Gold"},
        {"id": "t2", "slug": "silver", "name": "Silver",
         "gameSettings": {"languages": [{"language": "de"}]}}
      ],
      "pages": [{"id": "p1", "tenant": "t2", "slug": "home", "title": "Start"}]
    }));
    let store = prepare_store(data, now).await.unwrap();

    assert_eq!(get_tenant_locales(&store, "t1").await, vec!["en"]);
    assert_eq!(get_tenant_locales(&store, "t2").await, vec!["de"]);
    let gold = store.find_by_id(Collection::Tenants, "t1").await.unwrap();
    let gold = Tenant::from_doc(gold).unwrap();
    assert_eq!(gold.settings().campaign_id.as_deref(), Some("campaign_gold_1735689600000"));

    let gold_pages =
      store.find(Collection::Pages, &Where::equals("tenant", "t1"), None).await.unwrap();
    assert_eq!(gold_pages.len(), 7);
    let silver_pages =
      store.find(Collection::Pages, &Where::equals("tenant", "t2"), None).await.unwrap();
    assert_eq!(silver_pages.len(), 1);
  }
}
