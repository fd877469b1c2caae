/* src/server/adapter/axum/src/handler/page.rs */

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use campaign_server::page::login_redirect;
use campaign_server::{
  PageOutcome, PageView, SiteError, accept_language_candidates, find_page_by_slug,
  find_tenant_page, get_negotiated_locale,
};
use serde::Deserialize;

use super::{AppState, MaybePrincipal, segments};
use crate::error::AxumError;

#[derive(Deserialize)]
pub(super) struct LocaleQuery {
  locale: Option<String>,
}

/// Explicit `?locale=` alone, otherwise the Accept-Language tags by quality.
fn requested_locales(query: &LocaleQuery, headers: &HeaderMap) -> Vec<String> {
  if let Some(locale) = query.locale.as_deref().filter(|l| !l.is_empty()) {
    return vec![locale.to_string()];
  }
  headers
    .get(ACCEPT_LANGUAGE)
    .and_then(|v| v.to_str().ok())
    .map(accept_language_candidates)
    .unwrap_or_default()
}

pub(super) async fn handle_tenant_root(
  State(state): State<Arc<AppState>>,
  MaybePrincipal(principal): MaybePrincipal,
  Path(tenant): Path<String>,
  Query(query): Query<LocaleQuery>,
  headers: HeaderMap,
) -> Result<Response, AxumError> {
  render_tenant_page(&state, principal, &tenant, &[], &query, &headers).await
}

pub(super) async fn handle_tenant_page(
  State(state): State<Arc<AppState>>,
  MaybePrincipal(principal): MaybePrincipal,
  Path((tenant, slug)): Path<(String, String)>,
  Query(query): Query<LocaleQuery>,
  headers: HeaderMap,
) -> Result<Response, AxumError> {
  let segments = segments(Some(&slug));
  render_tenant_page(&state, principal, &tenant, &segments, &query, &headers).await
}

async fn render_tenant_page(
  state: &AppState,
  principal: Option<campaign_server::Principal>,
  tenant_slug: &str,
  segments: &[String],
  query: &LocaleQuery,
  headers: &HeaderMap,
) -> Result<Response, AxumError> {
  let store = state.store.as_ref();
  match find_tenant_page(store, principal.as_ref(), tenant_slug, segments).await {
    PageOutcome::Found(found) => {
      let ranked = requested_locales(query, headers);
      let locale = get_negotiated_locale(store, &found.tenant.id, &ranked).await;
      let view = PageView::build(&found.page, &locale, &state.fallback_locale);
      Ok(Html(view.to_html()).into_response())
    }
    PageOutcome::TenantUnavailable => {
      Ok(Redirect::to(&login_redirect(tenant_slug, segments)).into_response())
    }
    PageOutcome::NotFound => Err(SiteError::not_found("Page not found").into()),
  }
}

pub(super) async fn handle_home(
  State(state): State<Arc<AppState>>,
  Query(query): Query<LocaleQuery>,
  headers: HeaderMap,
) -> Result<Html<String>, AxumError> {
  render_site_page(&state, &[], &query, &headers).await
}

pub(super) async fn handle_page(
  State(state): State<Arc<AppState>>,
  Path(slug): Path<String>,
  Query(query): Query<LocaleQuery>,
  headers: HeaderMap,
) -> Result<Html<String>, AxumError> {
  render_site_page(&state, &segments(Some(&slug)), &query, &headers).await
}

async fn render_site_page(
  state: &AppState,
  segments: &[String],
  query: &LocaleQuery,
  headers: &HeaderMap,
) -> Result<Html<String>, AxumError> {
  let page = find_page_by_slug(state.store.as_ref(), segments)
    .await?
    .ok_or_else(|| SiteError::not_found("Page not found"))?;
  let locale = requested_locales(query, headers)
    .into_iter()
    .next()
    .unwrap_or_else(|| state.fallback_locale.clone());
  Ok(Html(PageView::build(&page, &locale, &state.fallback_locale).to_html()))
}

#[cfg(test)]
mod tests {
  use axum::body::Body;
  use axum::http::header::LOCATION;
  use axum::http::{Request, StatusCode};
  use campaign_server::Principal;
  use serde_json::json;

  use crate::handler::test_support::{body_string, router, send};

  fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  #[tokio::test]
  async fn tenant_home_in_best_locale() {
    let req = Request::builder()
      .uri("/tenant-slugs/gold")
      .header("accept-language", "fr-CA,fr;q=0.8,en;q=0.5")
      .body(Body::empty())
      .unwrap();
    let resp = send(router(), req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("<html lang=\"fr\">"), "{html}");
    assert!(html.contains("<h1>Bienvenue</h1>"), "{html}");
    assert!(html.contains("<p><span>Play now</span></p>"), "{html}");
  }

  #[tokio::test]
  async fn query_locale_wins_and_unknown_falls_back() {
    let req = Request::builder()
      .uri("/tenant-slugs/gold?locale=de")
      .header("accept-language", "fr")
      .body(Body::empty())
      .unwrap();
    let html = body_string(send(router(), req).await).await;
    assert!(html.contains("<html lang=\"en\">"), "{html}");
    assert!(html.contains("<h1>Welcome</h1>"), "{html}");
  }

  #[tokio::test]
  async fn lower_ranked_supported_language_is_served() {
    let req = Request::builder()
      .uri("/tenant-slugs/gold")
      .header("accept-language", "de,fr;q=0.8")
      .body(Body::empty())
      .unwrap();
    let html = body_string(send(router(), req).await).await;
    assert!(html.contains("<html lang=\"fr\">"), "{html}");
  }

  #[tokio::test]
  async fn unacceptable_language_is_not_served() {
    let req = Request::builder()
      .uri("/tenant-slugs/gold")
      .header("accept-language", "fr;q=0")
      .body(Body::empty())
      .unwrap();
    let html = body_string(send(router(), req).await).await;
    assert!(html.contains("<html lang=\"en\">"), "{html}");
  }

  #[tokio::test]
  async fn nested_slug_and_missing_page() {
    let html = body_string(send(router(), get("/tenant-slugs/gold/rules")).await).await;
    assert!(html.contains("<h1>Rules</h1>"), "{html}");

    let resp = send(router(), get("/tenant-slugs/gold/missing")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn private_tenant_redirects_anonymous_to_login() {
    let resp = send(router(), get("/tenant-slugs/private/rules")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
      resp.headers()[LOCATION],
      "/tenant-slugs/private/login?redirect=%2Ftenant-slugs%2Fprivate%2Frules"
    );

    let resp = send(router(), get("/tenant-slugs/unknown")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  }

  #[tokio::test]
  async fn signed_in_user_sees_private_tenant() {
    let user =
      Principal::from_doc(json!({"id": "u1", "tenants": [{"tenant": "t-private"}]})).unwrap();
    let mut req = get("/tenant-slugs/private");
    req.extensions_mut().insert(user);
    // Visible, but it has no pages
    let resp = send(router(), req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn site_pages() {
    let html = body_string(send(router(), get("/pages")).await).await;
    assert!(html.contains("<h1>Site home</h1>"), "{html}");

    let html = body_string(send(router(), get("/pages/about")).await).await;
    assert!(html.contains("<h1>About us</h1>"), "{html}");

    let resp = send(router(), get("/pages/nowhere")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
