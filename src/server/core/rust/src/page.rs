/* src/server/core/rust/src/page.rs */

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::access::{self, Operation, Principal, TenantRef};
use crate::errors::SiteError;
use crate::localized::{Localized, document_in_locale};
use crate::richtext::{escape_html, render_document};
use crate::store::{Collection, ContentStore, StoreError, Where};
use crate::tenant::Tenant;

pub const HOME_SLUG: &str = "home";

const NO_CONTENT_HTML: &str = "<p>No content available</p>";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
  #[default]
  Standard,
  Landing,
  Leaderboard,
  Loading,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
  #[default]
  Draft,
  Published,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tenant: Option<TenantRef>,
  pub title: Localized,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slug: Option<String>,
  #[serde(default)]
  pub page_type: PageType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub landing_description: Option<Localized>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub loading_description: Option<Localized>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub leaderboard_description: Option<Localized>,
  /// Rich-text document, or one document per locale.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<Value>,
  #[serde(default)]
  pub status: PageStatus,
}

impl Page {
  pub fn from_doc(doc: Value) -> Result<Self, StoreError> {
    serde_json::from_value(doc).map_err(|e| StoreError::Decode(format!("page: {e}")))
  }

  pub fn tenant_id(&self) -> Option<&str> {
    self.tenant.as_ref().map(TenantRef::id)
  }

  /// Only the description matching the page type is shown.
  pub fn description(&self) -> Option<&Localized> {
    match self.page_type {
      PageType::Landing => self.landing_description.as_ref(),
      PageType::Loading => self.loading_description.as_ref(),
      PageType::Leaderboard => self.leaderboard_description.as_ref(),
      PageType::Standard => None,
    }
  }
}

/// A page resolved for one locale, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
  pub id: String,
  pub locale: String,
  pub title: String,
  pub description: Option<String>,
  /// Rendered rich text, `None` when the page has no content in this locale.
  pub body_html: Option<String>,
}

impl PageView {
  pub fn build(page: &Page, locale: &str, fallback: &str) -> Self {
    let title = page
      .title
      .resolve(locale, fallback)
      .filter(|t| !t.is_empty())
      .unwrap_or("Untitled Page")
      .to_string();
    let description =
      page.description().and_then(|d| d.resolve(locale, fallback)).map(str::to_string);
    let body_html = page
      .content
      .as_ref()
      .and_then(|c| document_in_locale(c, locale, fallback))
      .and_then(render_document);
    Self { id: page.id.clone(), locale: locale.to_string(), title, description, body_html }
  }

  /// Standalone HTML document for the page.
  pub fn to_html(&self) -> String {
    let lang = escape_html(&self.locale);
    let title = escape_html(&self.title);
    let mut head = format!("<meta charset=\"utf-8\"><title>{title}</title>");
    if let Some(desc) = self.description.as_deref().filter(|d| !d.is_empty()) {
      head.push_str(&format!("<meta name=\"description\" content=\"{}\">", escape_html(desc)));
    }
    let body = self.body_html.as_deref().unwrap_or(NO_CONTENT_HTML);
    format!(
      "<!DOCTYPE html><html lang=\"{lang}\"><head>{head}</head>\
       <body><main><h1>{title}</h1>{body}</main></body></html>"
    )
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TenantPage {
  pub tenant: Tenant,
  pub page: Page,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
  Found(Box<TenantPage>),
  /// No such tenant, or the caller may not see it; send them to the tenant login.
  TenantUnavailable,
  NotFound,
}

/// Slug filter for a catch-all route: joined segments match exactly, no segments
/// match the home page (empty, "home" or unset slug).
pub fn page_slug_constraint(segments: &[String]) -> Where {
  if segments.is_empty() {
    Where::Or(vec![
      Where::equals("slug", ""),
      Where::equals("slug", HOME_SLUG),
      Where::exists("slug", false),
    ])
  } else {
    Where::equals("slug", segments.join("/"))
  }
}

pub fn login_redirect(tenant_slug: &str, segments: &[String]) -> String {
  let mut target = format!("/tenant-slugs/{tenant_slug}");
  if !segments.is_empty() {
    target.push('/');
    target.push_str(&segments.join("/"));
  }
  format!("/tenant-slugs/{tenant_slug}/login?redirect={}", urlencoding::encode(&target))
}

fn tenant_visible(tenant: &Tenant, principal: Option<&Principal>) -> bool {
  tenant.allow_public_read
    || access::evaluate(Collection::Tenants, Operation::Read, principal).permits(&tenant.id, None)
}

pub async fn find_tenant_page(
  store: &dyn ContentStore,
  principal: Option<&Principal>,
  tenant_slug: &str,
  segments: &[String],
) -> PageOutcome {
  match lookup_tenant_page(store, principal, tenant_slug, segments).await {
    Ok(outcome) => outcome,
    Err(e) => {
      warn!(tenant_slug, error = %e, "tenant page lookup failed");
      PageOutcome::TenantUnavailable
    }
  }
}

async fn lookup_tenant_page(
  store: &dyn ContentStore,
  principal: Option<&Principal>,
  tenant_slug: &str,
  segments: &[String],
) -> Result<PageOutcome, StoreError> {
  let by_slug = Where::equals("slug", tenant_slug);
  let Some(doc) = store.find(Collection::Tenants, &by_slug, Some(1)).await?.into_iter().next()
  else {
    return Ok(PageOutcome::TenantUnavailable);
  };
  let tenant = Tenant::from_doc(doc)?;
  if !tenant_visible(&tenant, principal) {
    return Ok(PageOutcome::TenantUnavailable);
  }

  let filter =
    Where::And(vec![Where::equals("tenant", tenant.id.as_str()), page_slug_constraint(segments)]);
  let Some(doc) = store.find(Collection::Pages, &filter, Some(1)).await?.into_iter().next() else {
    return Ok(PageOutcome::NotFound);
  };
  let page = Page::from_doc(doc)?;
  Ok(PageOutcome::Found(Box::new(TenantPage { tenant, page })))
}

/// Lookup outside any tenant; no segments means the "home" page.
pub async fn find_page_by_slug(
  store: &dyn ContentStore,
  segments: &[String],
) -> Result<Option<Page>, StoreError> {
  let slug = if segments.is_empty() { HOME_SLUG.to_string() } else { segments.join("/") };
  let filter = Where::equals("slug", slug);
  match store.find(Collection::Pages, &filter, Some(1)).await?.into_iter().next() {
    Some(doc) => Ok(Some(Page::from_doc(doc)?)),
    None => Ok(None),
  }
}

/// Slugs are unique per tenant.
pub async fn validate_slug(store: &dyn ContentStore, page: &Page) -> Result<(), SiteError> {
  let (Some(slug), Some(tenant)) = (page.slug.as_deref(), page.tenant_id()) else {
    return Ok(());
  };
  if slug.is_empty() {
    return Ok(());
  }
  let filter = Where::And(vec![
    Where::equals("slug", slug),
    Where::equals("tenant", tenant),
    Where::not_equals("id", page.id.as_str()),
  ]);
  let clashes = store.find(Collection::Pages, &filter, Some(1)).await?;
  if clashes.is_empty() {
    Ok(())
  } else {
    Err(SiteError::validation(format!(
      "A page with slug \"{slug}\" already exists in this campaign. Please choose a different slug."
    )))
  }
}

// (slug, type, title prefix, description, heading)
const DEFAULT_PAGES: &[(&str, PageType, &str, &str, &str)] = &[
  (HOME_SLUG, PageType::Landing, "Home", "Welcome to {name}!", "Welcome to {name}"),
  (
    "leaderboard",
    PageType::Leaderboard,
    "Leaderboard",
    "View the top performers in {name} campaign.",
    "{name} Leaderboard",
  ),
  (
    "loading",
    PageType::Loading,
    "Loading",
    "Please wait while we prepare your {name} experience.",
    "Loading {name}",
  ),
  ("game", PageType::Standard, "Game Page", "", "Play {name}"),
  ("rules", PageType::Standard, "Rules", "", "{name} Rules"),
  ("privacy", PageType::Standard, "Privacy Policy", "", "Privacy Policy"),
  ("terms", PageType::Standard, "Terms & Conditions", "", "Terms & Conditions"),
];

/// Published starter pages created alongside a new campaign.
pub fn default_campaign_pages(tenant: &Tenant) -> Vec<Page> {
  let fill = |s: &str| s.replace("{name}", &tenant.name);
  DEFAULT_PAGES
    .iter()
    .map(|(slug, page_type, prefix, description, heading)| {
      let description = (!description.is_empty()).then(|| Localized::Plain(fill(description)));
      let content = json!({
        "root": {
          "type": "root",
          "children": [
            {
              "type": "heading",
              "tag": "h1",
              "children": [{ "type": "text", "text": fill(heading) }]
            }
          ]
        }
      });
      Page {
        id: format!("{}-{slug}", tenant.id),
        tenant: Some(TenantRef::Id(tenant.id.clone())),
        title: Localized::Plain(format!("{prefix} - {}", tenant.name)),
        slug: Some((*slug).to_string()),
        page_type: *page_type,
        landing_description: description.clone().filter(|_| *page_type == PageType::Landing),
        loading_description: description.clone().filter(|_| *page_type == PageType::Loading),
        leaderboard_description: description.filter(|_| *page_type == PageType::Leaderboard),
        content: Some(content),
        status: PageStatus::Published,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::{MemoryStore, SeedData};

  fn segs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
  }

  fn store() -> MemoryStore {
    MemoryStore::from_seed(SeedData {
      tenants: vec![
        json!({"id": "t1", "slug": "gold", "name": "Gold"}),
        json!({"id": "t2", "slug": "silver", "name": "Silver", "allowPublicRead": true}),
      ],
      pages: vec![
        json!({"id": "p1", "tenant": "t1", "slug": "home",
               "title": {"en": "Home", "fr": "Accueil"}}),
        json!({"id": "p2", "tenant": "t1", "slug": "news/latest", "title": "Latest"}),
        json!({"id": "p3", "tenant": "t2", "title": "Silver home"}),
        json!({"id": "p4", "slug": "home", "title": "Site home"}),
      ],
      ..SeedData::default()
    })
    .unwrap()
  }

  fn member() -> Principal {
    Principal::from_doc(json!({"id": "u1", "tenants": [{"tenant": "t1"}]})).unwrap()
  }

  #[tokio::test]
  async fn finds_home_page_without_segments() {
    let user = member();
    match find_tenant_page(&store(), Some(&user), "gold", &[]).await {
      PageOutcome::Found(found) => {
        assert_eq!(found.page.id, "p1");
        assert_eq!(found.tenant.slug, "gold");
      }
      other => panic!("expected page, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn joins_nested_segments() {
    let user = member();
    let outcome = find_tenant_page(&store(), Some(&user), "gold", &segs(&["news", "latest"])).await;
    assert!(matches!(outcome, PageOutcome::Found(ref f) if f.page.id == "p2"));
  }

  #[tokio::test]
  async fn unset_slug_counts_as_home() {
    let outcome = find_tenant_page(&store(), None, "silver", &[]).await;
    assert!(matches!(outcome, PageOutcome::Found(ref f) if f.page.id == "p3"));
  }

  #[tokio::test]
  async fn anonymous_callers_need_public_tenant() {
    let outcome = find_tenant_page(&store(), None, "gold", &[]).await;
    assert_eq!(outcome, PageOutcome::TenantUnavailable);
  }

  #[tokio::test]
  async fn unknown_tenant_and_missing_page() {
    let user = member();
    let store = store();
    assert_eq!(
      find_tenant_page(&store, Some(&user), "bronze", &[]).await,
      PageOutcome::TenantUnavailable
    );
    assert_eq!(
      find_tenant_page(&store, Some(&user), "gold", &segs(&["nope"])).await,
      PageOutcome::NotFound
    );
  }

  #[tokio::test]
  async fn site_level_lookup_defaults_to_home() {
    let store = store();
    let page = find_page_by_slug(&store, &[]).await.unwrap().unwrap();
    assert_eq!(page.id, "p1");
    assert!(find_page_by_slug(&store, &segs(&["missing"])).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn duplicate_slug_in_same_tenant_is_rejected() {
    let store = store();
    let mut page =
      Page::from_doc(json!({"id": "new", "tenant": "t1", "slug": "home", "title": "x"})).unwrap();
    let err = validate_slug(&store, &page).await.unwrap_err();
    assert_eq!(err.status(), 400);
    assert!(err.message().contains("\"home\""));

    page.id = "p1".into();
    assert!(validate_slug(&store, &page).await.is_ok());

    page.tenant = Some(TenantRef::Id("t2".into()));
    page.id = "new".into();
    assert!(validate_slug(&store, &page).await.is_ok());
  }

  #[test]
  fn login_redirect_encodes_target() {
    assert_eq!(
      login_redirect("gold", &segs(&["news", "latest"])),
      "/tenant-slugs/gold/login?redirect=%2Ftenant-slugs%2Fgold%2Fnews%2Flatest"
    );
    assert_eq!(
      login_redirect("gold", &[]),
      "/tenant-slugs/gold/login?redirect=%2Ftenant-slugs%2Fgold"
    );
  }

  #[test]
  fn page_view_resolves_locale() {
    let page = Page::from_doc(json!({
      "id": "p1",
      "title": {"en": "Home", "fr": "Accueil"},
      "pageType": "landing",
      "landingDescription": {"en": "Welcome"},
      "content": {
        "fr": {"root": {"children": [
          {"type": "paragraph", "children": [{"type": "text", "text": "Salut"}]}
        ]}}
      }
    }))
    .unwrap();

    let fr = PageView::build(&page, "fr", "en");
    assert_eq!(fr.title, "Accueil");
    assert_eq!(fr.description.as_deref(), Some("Welcome"));
    assert_eq!(fr.body_html.as_deref(), Some("<div><p><span>Salut</span></p></div>"));

    let de = PageView::build(&page, "de", "en");
    assert_eq!(de.title, "Home");
    assert_eq!(de.body_html, None);
  }

  #[test]
  fn page_view_html_document() {
    let view = PageView {
      id: "p1".into(),
      locale: "fr".into(),
      title: "Jeux & prix".into(),
      description: Some("Bienvenue".into()),
      body_html: Some("<div><p><span>Salut</span></p></div>".into()),
    };
    assert_eq!(
      view.to_html(),
      "<!DOCTYPE html><html lang=\"fr\"><head><meta charset=\"utf-8\">\
       <title>Jeux &amp; prix</title><meta name=\"description\" content=\"Bienvenue\"></head>\
       <body><main><h1>Jeux &amp; prix</h1><div><p><span>Salut</span></p></div></main></body></html>"
    );
  }

  #[tokio::test]
  async fn null_translation_still_resolves_page() {
    let store = MemoryStore::from_seed(SeedData {
      tenants: vec![json!({"id": "t1", "slug": "gold", "allowPublicRead": true})],
      pages: vec![json!({"id": "p1", "tenant": "t1", "slug": "home",
                         "title": {"en": "Home", "fr": null}})],
      ..SeedData::default()
    })
    .unwrap();
    let PageOutcome::Found(found) = find_tenant_page(&store, None, "gold", &[]).await else {
      panic!("expected page");
    };
    assert_eq!(PageView::build(&found.page, "fr", "en").title, "Home");
  }

  #[test]
  fn page_without_content_says_so() {
    let page = Page::from_doc(json!({"id": "p1", "title": "Rules"})).unwrap();
    let html = PageView::build(&page, "en", "en").to_html();
    assert!(html.ends_with("<h1>Rules</h1><p>No content available</p></main></body></html>"));
  }

  #[test]
  fn page_view_untitled_fallback() {
    let page = Page::from_doc(json!({"id": "p1", "title": {"de": "Start"}})).unwrap();
    assert_eq!(PageView::build(&page, "fr", "en").title, "Untitled Page");
  }

  #[test]
  fn default_pages_for_new_campaign() {
    let tenant =
      Tenant { id: "t9".into(), name: "Bronze".into(), slug: "bronze".into(), ..Default::default() };
    let pages = default_campaign_pages(&tenant);
    assert_eq!(pages.len(), 7);
    assert!(pages.iter().all(|p| p.status == PageStatus::Published && p.tenant_id() == Some("t9")));

    let home = &pages[0];
    assert_eq!(home.slug.as_deref(), Some("home"));
    assert_eq!(home.title, Localized::Plain("Home - Bronze".into()));
    assert_eq!(home.description(), Some(&Localized::Plain("Welcome to Bronze!".into())));
    assert_eq!(pages[3].description(), None);
  }
}
