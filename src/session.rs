//! Session orchestration.
//!
//! [`Session`] owns the state store and drives every reaction to user input: title lookups when the
//! URL changes, the analysis request lifecycle, clipboard paste, and result navigation. Network work
//! runs in spawned tasks that report back over `oneshot` channels; outcomes are applied either by
//! polling ([`Session::check_pending`]) or by waiting ([`Session::settle`]).
//!
//! Each spawned request remembers the `video_url` it was started for. A newer request replaces the
//! pending one (its receiver is dropped, so the old response goes nowhere), and a response whose
//! URL no longer matches the current one is discarded.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::analysis::{AnalysisService, AnalyzeRequest};
use crate::constants::constants;
use crate::error::{AnalyzeError, PasteError};
use crate::host::{Host, HostKind};
use crate::language::LanguageCode;
use crate::metadata::{TitleLookup, fetch_title};
use crate::navigation::{deep_link, go_to};
use crate::persistence::Persistence;
use crate::state::{MatchResult, PersistedSnapshot, SessionState, SessionStore};
use crate::video_id::resolve_video_id;

type AnalysisOutcome = Result<Vec<MatchResult>, AnalyzeError>;

/// External collaborators, chosen once at startup.
#[derive(Clone)]
pub struct Services {
  pub host: Arc<dyn Host>,
  pub analysis: Arc<dyn AnalysisService>,
  pub titles: Arc<dyn TitleLookup>,
}

/// An in-flight task and the input it was started for.
struct Pending<T> {
  token: u64,
  video_url: String,
  rx: oneshot::Receiver<T>,
}

#[derive(Default)]
struct PendingTasks {
  analysis: Option<Pending<AnalysisOutcome>>,
  title: Option<Pending<Option<String>>>,
}

pub struct Session {
  store: SessionStore,
  services: Services,
  tasks: PendingTasks,
  next_token: u64,
  /// Informational message (clipboard outcomes). Never shares the error slot.
  notice: Option<String>,
  mirror: JoinHandle<()>,
}

impl Session {
  /// Rehydrate from the host store, start mirroring changes, and resolve the restored URL's title.
  ///
  /// `default_language` applies only when there is no saved session.
  pub async fn start(services: Services, default_language: LanguageCode) -> Self {
    let persistence = Persistence::new(Arc::clone(&services.host));
    let mut store = SessionStore::new();
    match persistence.load().await {
      Some(snapshot) => store.apply_snapshot(snapshot),
      None => store.set_language(default_language),
    }
    // Subscribing after hydration marks the restored values as seen, so nothing is written back.
    let mirror = persistence.mirror(store.subscribe());

    let mut session =
      Self { store, services, tasks: PendingTasks::default(), next_token: 0, notice: None, mirror };
    if !session.store.video_url().is_empty() {
      session.trigger_title();
    }
    session
  }

  pub fn state(&self) -> &SessionState {
    self.store.state()
  }

  pub fn notice(&self) -> Option<&str> {
    self.notice.as_deref()
  }

  pub fn host_kind(&self) -> HostKind {
    self.services.host.kind()
  }

  /// Whether any request or lookup is still outstanding.
  pub fn is_busy(&self) -> bool {
    self.tasks.analysis.is_some() || self.tasks.title.is_some()
  }

  fn next_token(&mut self) -> u64 {
    self.next_token += 1;
    self.next_token
  }

  // --- Input ---

  /// Replace the video URL. The old title is cleared and a lookup for the new URL starts.
  pub fn set_video_url(&mut self, video_url: String) {
    self.store.set_video_url(video_url);
    self.store.set_video_title(String::new());
    self.trigger_title();
  }

  pub fn set_query(&mut self, query: String) {
    self.store.set_query(query);
  }

  pub fn set_language(&mut self, language: LanguageCode) {
    self.store.set_language(language);
  }

  /// Forget everything: persisted fields return to defaults and pending work is dropped.
  pub fn reset(&mut self) {
    self.tasks = PendingTasks::default();
    self.store.apply_snapshot(PersistedSnapshot::default());
    self.store.set_video_title(String::new());
    self.store.set_error(None);
    self.store.set_loading(false);
    self.notice = None;
    info!("session: reset");
  }

  /// Take a URL from the clipboard. Only YouTube links are accepted; the outcome is also left in the notice slot.
  pub async fn paste_url(&mut self) -> Result<(), PasteError> {
    let outcome = match self.services.host.read_clipboard().await {
      Ok(text) => {
        let text = text.trim();
        if constants().accepted_url_markers.iter().any(|marker| text.contains(marker.as_str())) {
          self.set_video_url(text.to_string());
          Ok(())
        } else {
          Err(PasteError::InvalidUrl)
        }
      }
      Err(e) => {
        warn!(err = %e, "session: clipboard read failed");
        Err(PasteError::Clipboard(e))
      }
    };
    self.notice = Some(match &outcome {
      Ok(()) => "Pasted video URL from clipboard.".to_string(),
      Err(e) => e.to_string(),
    });
    outcome
  }

  // --- Title lookup ---

  fn trigger_title(&mut self) {
    if let Some(old) = self.tasks.title.take() {
      debug!(token = old.token, "session: title lookup superseded");
    }
    let video_url = self.store.video_url().to_string();
    if resolve_video_id(&video_url).is_none() {
      return;
    }

    let token = self.next_token();
    let titles = Arc::clone(&self.services.titles);
    let url = video_url.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(fetch_title(titles.as_ref(), &url).await);
    });
    self.tasks.title = Some(Pending { token, video_url, rx });
  }

  /// `outcome` is `None` when the lookup task died without answering.
  fn apply_title(&mut self, pending_url: &str, outcome: Option<Option<String>>) {
    if pending_url != self.store.video_url() {
      debug!(url = %pending_url, "session: dropping title for a replaced URL");
      return;
    }
    match outcome {
      Some(Some(title)) => self.store.set_video_title(title),
      Some(None) => {}
      None => self.store.set_video_title(constants().fallback_title.clone()),
    }
  }

  // --- Analysis ---

  /// Validate input and start an analysis request. Any pending request is superseded.
  pub fn trigger_analyze(&mut self) {
    if let Some(old) = self.tasks.analysis.take() {
      debug!(token = old.token, "session: analysis request superseded");
    }

    if self.store.video_url().is_empty() || self.store.query().is_empty() {
      self.store.set_loading(false);
      self.store.set_error(Some(AnalyzeError::Validation.to_string()));
      return;
    }

    self.store.set_error(None);
    self.store.set_results(Vec::new());
    self.store.set_loading(true);

    let token = self.next_token();
    let request = AnalyzeRequest {
      video_url: self.store.video_url().to_string(),
      query: self.store.query().to_string(),
      language: self.store.language(),
    };
    info!(token, query = %request.query, language = %request.language, "session: analysis started");

    let video_url = request.video_url.clone();
    let analysis = Arc::clone(&self.services.analysis);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(analysis.analyze(&request).await);
    });
    self.tasks.analysis = Some(Pending { token, video_url, rx });
  }

  /// `outcome` is `None` when the request task died without answering.
  fn apply_analysis(&mut self, token: u64, pending_url: &str, outcome: Option<AnalysisOutcome>) {
    let outcome = outcome.unwrap_or_else(|| {
      error!(token, "session: analysis task ended without a result");
      Err(AnalyzeError::Request)
    });

    if pending_url != self.store.video_url() {
      info!(token, "session: discarding analysis for a replaced URL");
    } else {
      match outcome {
        Ok(results) => {
          info!(token, matches = results.len(), "session: analysis finished");
          self.store.set_results(results);
          self.store.set_error(None);
        }
        Err(e) => {
          warn!(token, err = %e, "session: analysis failed");
          self.store.set_results(Vec::new());
          self.store.set_error(Some(e.to_string()));
        }
      }
    }
    self.store.set_loading(false);
  }

  /// Validate, send, and wait for the analysis outcome.
  pub async fn analyze(&mut self) {
    self.trigger_analyze();
    self.settle().await;
  }

  // --- Pending work ---

  /// Apply whatever has finished without waiting. Returns `true` while work remains outstanding.
  pub fn check_pending(&mut self) -> bool {
    if let Some(mut pending) = self.tasks.analysis.take() {
      match pending.rx.try_recv() {
        Ok(outcome) => self.apply_analysis(pending.token, &pending.video_url, Some(outcome)),
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.analysis = Some(pending),
        Err(oneshot::error::TryRecvError::Closed) => self.apply_analysis(pending.token, &pending.video_url, None),
      }
    }

    if let Some(mut pending) = self.tasks.title.take() {
      match pending.rx.try_recv() {
        Ok(title) => self.apply_title(&pending.video_url, Some(title)),
        Err(oneshot::error::TryRecvError::Empty) => self.tasks.title = Some(pending),
        Err(oneshot::error::TryRecvError::Closed) => self.apply_title(&pending.video_url, None),
      }
    }

    self.is_busy()
  }

  /// Wait for every outstanding request and lookup and apply the outcomes.
  pub async fn settle(&mut self) {
    if let Some(pending) = self.tasks.analysis.take() {
      let outcome = pending.rx.await.ok();
      self.apply_analysis(pending.token, &pending.video_url, outcome);
    }
    if let Some(pending) = self.tasks.title.take() {
      let title = pending.rx.await.ok();
      self.apply_title(&pending.video_url, title);
    }
  }

  // --- Navigation ---

  /// Navigate to the `index`-th result of the current video. Returns the deep link, or `None` when out of range.
  pub async fn open_result(&self, index: usize) -> Option<String> {
    let result = self.store.results().get(index)?;
    let base_url = self.store.video_url();
    go_to(self.services.host.as_ref(), base_url, result.start).await;
    Some(deep_link(base_url, result.start))
  }

  /// Stop mirroring and wait until the final state has been saved.
  pub async fn shutdown(self) {
    let Session { store, mirror, .. } = self;
    drop(store);
    if let Err(e) = mirror.await {
      error!(err = %e, "session: persistence mirror task failed");
    }
  }
}
