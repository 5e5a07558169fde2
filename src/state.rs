//! Session state store.
//!
//! Holds every field of the session and publishes the persisted subset on a `watch` channel
//! whenever one of those fields actually changes. Setters are plain replacements with no I/O.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::language::LanguageCode;

/// One timestamped transcript match returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
  pub text: String,
  /// Offset into the video, in seconds.
  pub start: f64,
}

/// The part of the session that survives a restart. `error`, `loading` and the title are transient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
  pub video_url: String,
  pub query: String,
  pub language: LanguageCode,
  pub results: Vec<MatchResult>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
  pub video_url: String,
  pub video_title: String,
  pub query: String,
  pub language: LanguageCode,
  pub results: Vec<MatchResult>,
  pub error: Option<String>,
  pub loading: bool,
}

impl SessionState {
  pub fn snapshot(&self) -> PersistedSnapshot {
    PersistedSnapshot {
      video_url: self.video_url.clone(),
      query: self.query.clone(),
      language: self.language,
      results: self.results.clone(),
    }
  }
}

pub struct SessionStore {
  state: SessionState,
  changes: watch::Sender<PersistedSnapshot>,
}

impl Default for SessionStore {
  fn default() -> Self {
    Self::new()
  }
}

impl SessionStore {
  pub fn new() -> Self {
    let (changes, _) = watch::channel(PersistedSnapshot::default());
    Self { state: SessionState::default(), changes }
  }

  pub fn state(&self) -> &SessionState {
    &self.state
  }

  pub fn video_url(&self) -> &str {
    &self.state.video_url
  }

  pub fn query(&self) -> &str {
    &self.state.query
  }

  pub fn language(&self) -> LanguageCode {
    self.state.language
  }

  pub fn results(&self) -> &[MatchResult] {
    &self.state.results
  }

  pub fn set_video_url(&mut self, video_url: String) {
    self.state.video_url = video_url;
    self.publish();
  }

  pub fn set_video_title(&mut self, video_title: String) {
    self.state.video_title = video_title;
  }

  pub fn set_query(&mut self, query: String) {
    self.state.query = query;
    self.publish();
  }

  pub fn set_language(&mut self, language: LanguageCode) {
    self.state.language = language;
    self.publish();
  }

  pub fn set_results(&mut self, results: Vec<MatchResult>) {
    self.state.results = results;
    self.publish();
  }

  pub fn set_error(&mut self, error: Option<String>) {
    self.state.error = error;
  }

  pub fn set_loading(&mut self, loading: bool) {
    self.state.loading = loading;
  }

  /// Replace the persisted fields in one step.
  pub fn apply_snapshot(&mut self, snapshot: PersistedSnapshot) {
    self.state.video_url = snapshot.video_url;
    self.state.query = snapshot.query;
    self.state.language = snapshot.language;
    self.state.results = snapshot.results;
    self.publish();
  }

  /// Subscribe to persisted-field changes. The value current at subscription time counts as seen.
  pub fn subscribe(&self) -> watch::Receiver<PersistedSnapshot> {
    self.changes.subscribe()
  }

  fn publish(&self) {
    let snapshot = self.state.snapshot();
    self.changes.send_if_modified(|current| {
      if *current == snapshot {
        return false;
      }
      *current = snapshot;
      true
    });
  }
}
