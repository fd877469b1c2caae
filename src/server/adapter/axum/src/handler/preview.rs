/* src/server/adapter/axum/src/handler/preview.rs */

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use campaign_server::{
  Collection, ContentStore, LivePreviewData, Operation, Page, PreviewMessage, SiteError,
  StoreError, evaluate,
};
use futures_core::Stream;
use serde_json::{Value, json};
use tokio_stream::StreamExt;

use super::{AppState, MaybePrincipal};
use crate::error::AxumError;

type EventStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

/// Stored page document, `None` when the page does not exist yet.
async fn stored_page(store: &dyn ContentStore, doc_id: &str) -> Result<Option<Value>, StoreError> {
  match store.find_by_id(Collection::Pages, doc_id).await {
    Ok(doc) => Ok(Some(doc)),
    Err(StoreError::NotFound { .. }) => Ok(None),
    Err(e) => Err(e),
  }
}

/// Each event carries the document the renderer should show; an update
/// without data resets to the stored page.
pub(super) async fn handle_events(
  State(state): State<Arc<AppState>>,
  Path(doc_id): Path<String>,
) -> Result<Sse<KeepAliveStream<EventStream>>, AxumError> {
  let initial = stored_page(state.store.as_ref(), &doc_id).await?.unwrap_or(Value::Null);
  tracing::debug!(doc_id, "preview subscriber connected");
  let mut view = LivePreviewData::new(initial);
  let events = state.preview.subscribe(&doc_id).map(move |msg| {
    view.apply(&msg);
    Ok::<_, Infallible>(Event::default().event("data").data(view.current().to_string()))
  });
  let events: EventStream = Box::pin(events);
  Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Only callers allowed to update the page may push drafts to its renderers.
pub(super) async fn handle_publish(
  State(state): State<Arc<AppState>>,
  MaybePrincipal(principal): MaybePrincipal,
  Path(doc_id): Path<String>,
  Json(event): Json<Value>,
) -> Result<Json<Value>, AxumError> {
  let Some(principal) = principal else {
    return Err(SiteError::unauthorized("Sign in to publish previews").into());
  };
  let tenant = match stored_page(state.store.as_ref(), &doc_id).await? {
    Some(doc) => Page::from_doc(doc)?.tenant_id().map(str::to_string),
    None => None,
  };
  let access = evaluate(Collection::Pages, Operation::Update, Some(&principal));
  if !access.permits(&doc_id, tenant.as_deref()) {
    tracing::warn!(doc_id, user = %principal.id, "preview publish denied");
    return Err(SiteError::forbidden("Not allowed to edit this page").into());
  }

  let msg = PreviewMessage::from_event(&event)
    .ok_or_else(|| SiteError::validation("Expected a payload-live-preview message"))?;
  let delivered = state.preview.publish(&doc_id, msg);
  Ok(Json(json!({ "ok": true, "data": { "delivered": delivered } })))
}
