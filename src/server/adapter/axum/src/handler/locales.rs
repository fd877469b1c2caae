/* src/server/adapter/axum/src/handler/locales.rs */

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use campaign_server::{SiteError, TenantLocales, try_tenant_locales};
use serde::Deserialize;

use super::AppState;
use crate::error::AxumError;

#[derive(Deserialize)]
pub(super) struct LocalesQuery {
  tenant: Option<String>,
}

pub(super) async fn handle_tenant_locales(
  State(state): State<Arc<AppState>>,
  Path(tenant_id): Path<String>,
) -> Result<Json<TenantLocales>, AxumError> {
  respond(&state, Some(tenant_id)).await
}

pub(super) async fn handle_locales_query(
  State(state): State<Arc<AppState>>,
  Query(query): Query<LocalesQuery>,
) -> Result<Json<TenantLocales>, AxumError> {
  respond(&state, query.tenant).await
}

async fn respond(
  state: &AppState,
  tenant_id: Option<String>,
) -> Result<Json<TenantLocales>, AxumError> {
  let tenant_id = tenant_id
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .ok_or_else(|| SiteError::validation("Tenant ID is required"))?;

  let locales = try_tenant_locales(state.store.as_ref(), &tenant_id).await.map_err(|e| {
    tracing::error!(tenant_id, error = %e, "error fetching tenant locales");
    SiteError::internal("Failed to fetch tenant locales")
  })?;
  Ok(Json(TenantLocales::new(locales)))
}
