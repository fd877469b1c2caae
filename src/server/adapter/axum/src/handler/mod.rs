/* src/server/adapter/axum/src/handler/mod.rs */

mod locales;
mod page;
mod preview;

use std::convert::Infallible;
use std::sync::Arc;

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::get;
use campaign_server::{ContentStore, PreviewHub, Principal, SiteParts};

pub(crate) struct AppState {
  pub store: Arc<dyn ContentStore>,
  pub fallback_locale: String,
  pub preview: Arc<PreviewHub>,
}

/// The principal installed by upstream auth middleware, if any.
pub(crate) struct MaybePrincipal(pub Option<Principal>);

impl<S: Send + Sync> FromRequestParts<S> for MaybePrincipal {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(Self(parts.extensions.get::<Principal>().cloned()))
  }
}

/// Split a catch-all tail into non-empty path segments.
pub(super) fn segments(tail: Option<&str>) -> Vec<String> {
  tail
    .unwrap_or("")
    .split('/')
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

pub(crate) fn build_router(parts: SiteParts) -> Router {
  let state = Arc::new(AppState {
    store: parts.store,
    fallback_locale: parts.fallback_locale,
    preview: parts.preview,
  });

  Router::new()
    .route("/api/tenants/{tenant_id}/locales", get(locales::handle_tenant_locales))
    .route("/api/locales", get(locales::handle_locales_query))
    .route("/tenant-slugs/{tenant}", get(page::handle_tenant_root))
    .route("/tenant-slugs/{tenant}/{*slug}", get(page::handle_tenant_page))
    .route("/pages", get(page::handle_home))
    .route("/pages/{*slug}", get(page::handle_page))
    .route("/api/preview/{doc_id}", axum::routing::post(preview::handle_publish))
    .route("/api/preview/{doc_id}/events", get(preview::handle_events))
    .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::sync::Arc;

  use axum::Router;
  use axum::body::Body;
  use axum::http::{Request, Response};
  use campaign_server::{MemoryStore, SeedData, SiteServer};
  use http_body_util::BodyExt;
  use serde_json::json;
  use tower::ServiceExt;

  pub(crate) fn seed() -> SeedData {
    serde_json::from_value(json!({
      "tenants": [
        {
          "id": "t-gold",
          "name": "Gold",
          "slug": "gold",
          "allowPublicRead": true,
          "gameSettings": {"languages": [{"language": "en"}, {"language": "fr"}]}
        },
        {"id": "t-private", "name": "Private", "slug": "private"}
      ],
      "pages": [
        {"id": "p-site-home", "slug": "home", "title": "Site home"},
        {
          "id": "p-home",
          "tenant": "t-gold",
          "slug": "home",
          "title": {"en": "Welcome", "fr": "Bienvenue"},
          "status": "published",
          "content": {"root": {"type": "root", "children": [
            {"type": "paragraph", "children": [{"type": "text", "text": "Play now"}]}
          ]}}
        },
        {"id": "p-rules", "tenant": "t-gold", "slug": "rules", "title": "Rules"},
        {"id": "p-about", "slug": "about", "title": "About us"}
      ]
    }))
    .unwrap()
  }

  pub(crate) fn router() -> Router {
    let store = MemoryStore::from_seed(seed()).unwrap();
    super::build_router(SiteServer::new(Arc::new(store)).into_parts())
  }

  pub(crate) async fn send(router: Router, req: Request<Body>) -> Response<Body> {
    router.oneshot(req).await.unwrap()
  }

  pub(crate) async fn body_string(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  pub(crate) async fn body_json(resp: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
  }
}
