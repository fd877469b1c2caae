/* src/server/core/rust/src/preview.rs */

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use futures_core::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

pub const LIVE_PREVIEW_EVENT: &str = "payload-live-preview";

const DEFAULT_CAPACITY: usize = 16;

/// Editor-to-renderer notification carrying a full replacement document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewMessage {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
}

impl PreviewMessage {
  pub fn new(data: Value) -> Self {
    Self { kind: LIVE_PREVIEW_EVENT.to_string(), data: Some(data) }
  }

  /// Accept only live-preview events; anything else is ignored.
  pub fn from_event(event: &Value) -> Option<Self> {
    let msg: Self = serde_json::from_value(event.clone()).ok()?;
    (msg.kind == LIVE_PREVIEW_EVENT).then_some(msg)
  }
}

/// Renderer-side view of a previewed document. An update without data
/// resets to the document the renderer started with.
#[derive(Debug, Clone)]
pub struct LivePreviewData {
  initial: Value,
  current: Value,
}

impl LivePreviewData {
  pub fn new(initial: Value) -> Self {
    Self { current: initial.clone(), initial }
  }

  pub fn apply(&mut self, msg: &PreviewMessage) {
    self.current = msg.data.clone().unwrap_or_else(|| self.initial.clone());
  }

  pub fn current(&self) -> &Value {
    &self.current
  }
}

/// Per-document fan-out of preview updates. Subscribers only see updates
/// published after they subscribed; a lagging subscriber skips to newer ones.
pub struct PreviewHub {
  channels: Mutex<HashMap<String, broadcast::Sender<PreviewMessage>>>,
  capacity: usize,
}

impl PreviewHub {
  pub fn new() -> Self {
    Self::with_capacity(DEFAULT_CAPACITY)
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self { channels: Mutex::new(HashMap::new()), capacity: capacity.max(1) }
  }

  pub fn subscribe(&self, doc_id: &str) -> BoxStream<PreviewMessage> {
    let rx = {
      let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
      channels
        .entry(doc_id.to_string())
        .or_insert_with(|| broadcast::channel(self.capacity).0)
        .subscribe()
    };
    Box::pin(BroadcastStream::new(rx).filter_map(Result::ok))
  }

  /// Deliver `msg` to current subscribers of `doc_id`. Returns how many received it.
  pub fn publish(&self, doc_id: &str, msg: PreviewMessage) -> usize {
    let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(tx) = channels.get(doc_id) else {
      return 0;
    };
    match tx.send(msg) {
      Ok(n) => {
        debug!(doc_id, subscribers = n, "preview update delivered");
        n
      }
      Err(_) => {
        // Every receiver is gone
        channels.remove(doc_id);
        0
      }
    }
  }

  pub fn subscriber_count(&self, doc_id: &str) -> usize {
    let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
    channels.get(doc_id).map_or(0, broadcast::Sender::receiver_count)
  }
}

impl Default for PreviewHub {
  fn default() -> Self {
    Self::new()
  }
}
