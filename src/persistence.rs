//! Persistence adapter: mirrors the persisted part of the session into the host key-value store.
//!
//! The adapter is the only writer. It rehydrates once at startup via [`Persistence::load`] and then
//! follows the store's change channel via [`Persistence::mirror`]. Nothing here ever fails the caller:
//! load problems read as "no snapshot" and save problems are logged.

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::host::Host;
use crate::state::PersistedSnapshot;

pub const KEY_VIDEO_URL: &str = "videoUrl";
pub const KEY_QUERY: &str = "query";
pub const KEY_LANGUAGE: &str = "language";
pub const KEY_RESULTS: &str = "results";

pub const STORAGE_KEYS: [&str; 4] = [KEY_VIDEO_URL, KEY_QUERY, KEY_LANGUAGE, KEY_RESULTS];

#[derive(Clone)]
pub struct Persistence {
  host: Arc<dyn Host>,
}

impl Persistence {
  pub fn new(host: Arc<dyn Host>) -> Self {
    Self { host }
  }

  /// Read the last saved snapshot. `None` when the store is unavailable or holds nothing.
  pub async fn load(&self) -> Option<PersistedSnapshot> {
    let items = match self.host.storage_get(&STORAGE_KEYS).await {
      Ok(items) => items,
      Err(e) => {
        warn!(err = %e, host = self.host.kind().label(), "persistence: load failed, starting empty");
        return None;
      }
    };
    if items.is_empty() {
      debug!("persistence: no saved session");
      return None;
    }
    let snapshot = snapshot_from_items(&items);
    info!(results = snapshot.results.len(), "persistence: session restored");
    Some(snapshot)
  }

  pub async fn save(&self, snapshot: &PersistedSnapshot) {
    if let Err(e) = self.host.storage_set(snapshot_to_items(snapshot)).await {
      warn!(err = %e, "persistence: save failed");
    } else {
      debug!(results = snapshot.results.len(), "persistence: session saved");
    }
  }

  /// Save every snapshot published on `changes` until the sending store is dropped.
  /// The last published value is always written before the task ends.
  pub fn mirror(self, mut changes: watch::Receiver<PersistedSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
      while changes.changed().await.is_ok() {
        let snapshot = changes.borrow_and_update().clone();
        self.save(&snapshot).await;
      }
      debug!("persistence: store closed, mirror finished");
    })
  }
}

/// Lenient decode: each key falls back to its default on its own.
fn snapshot_from_items(items: &Map<String, Value>) -> PersistedSnapshot {
  let text = |key: &str| items.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
  PersistedSnapshot {
    video_url: text(KEY_VIDEO_URL),
    query: text(KEY_QUERY),
    language: items.get(KEY_LANGUAGE).and_then(|v| serde_json::from_value(v.clone()).ok()).unwrap_or_default(),
    results: items.get(KEY_RESULTS).and_then(|v| serde_json::from_value(v.clone()).ok()).unwrap_or_default(),
  }
}

fn snapshot_to_items(snapshot: &PersistedSnapshot) -> Map<String, Value> {
  let mut items = Map::new();
  items.insert(KEY_VIDEO_URL.to_string(), Value::String(snapshot.video_url.clone()));
  items.insert(KEY_QUERY.to_string(), Value::String(snapshot.query.clone()));
  items.insert(KEY_LANGUAGE.to_string(), Value::String(snapshot.language.code().to_string()));
  items.insert(
    KEY_RESULTS.to_string(),
    serde_json::to_value(&snapshot.results).unwrap_or_else(|_| Value::Array(Vec::new())),
  );
  items
}
