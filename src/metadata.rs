use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::constants::constants;
use crate::error::MetadataError;
use crate::video_id::{VideoId, resolve_video_id};

/// Resolves a video identifier to its human-readable title.
#[async_trait]
pub trait TitleLookup: Send + Sync {
  async fn lookup_title(&self, video_id: &VideoId) -> Result<String, MetadataError>;
}

/// oEmbed-backed title lookup.
pub struct OEmbedClient {
  http: Client,
  endpoint: String,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
  title: Option<String>,
}

impl OEmbedClient {
  pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
    Self { http, endpoint: endpoint.into() }
  }
}

#[async_trait]
impl TitleLookup for OEmbedClient {
  async fn lookup_title(&self, video_id: &VideoId) -> Result<String, MetadataError> {
    let watch_url = video_id.watch_url();
    let url = Url::parse_with_params(&self.endpoint, [("url", watch_url.as_str()), ("format", "json")])?;
    debug!(url = %url, "metadata: requesting title");

    let response = self.http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(MetadataError::Status(status.as_u16()));
    }
    let body: OEmbedResponse = response.json().await?;
    body.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).ok_or(MetadataError::MissingTitle)
  }
}

/// Best-effort title for `url`.
///
/// `None` when the URL carries no video identifier; the caller leaves the title unset.
/// Any lookup failure yields the fallback title instead of an error.
pub async fn fetch_title(lookup: &dyn TitleLookup, url: &str) -> Option<String> {
  let video_id = resolve_video_id(url)?;
  match lookup.lookup_title(&video_id).await {
    Ok(title) => Some(title),
    Err(e) => {
      warn!(video_id = %video_id, err = %e, "metadata: title lookup failed, using fallback");
      Some(constants().fallback_title.clone())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::{dead_endpoint, serve_once};
  use std::sync::Mutex;

  /// Lookup that records the ids it was asked for and answers from a fixed outcome.
  struct FixedLookup {
    title: Option<String>,
    seen: Mutex<Vec<String>>,
  }

  impl FixedLookup {
    fn new(title: Option<&str>) -> Self {
      Self { title: title.map(str::to_string), seen: Mutex::new(Vec::new()) }
    }
  }

  #[async_trait]
  impl TitleLookup for FixedLookup {
    async fn lookup_title(&self, video_id: &VideoId) -> Result<String, MetadataError> {
      self.seen.lock().unwrap().push(video_id.to_string());
      self.title.clone().ok_or(MetadataError::MissingTitle)
    }
  }

  #[tokio::test]
  async fn title_for_watch_url() {
    let lookup = FixedLookup::new(Some("Never Gonna Give You Up"));
    let title = fetch_title(&lookup, "https://youtube.com/watch?v=dQw4w9WgXcQ").await;
    assert_eq!(title.as_deref(), Some("Never Gonna Give You Up"));
    assert_eq!(*lookup.seen.lock().unwrap(), vec!["dQw4w9WgXcQ".to_string()]);
  }

  #[tokio::test]
  async fn no_identifier_skips_lookup() {
    let lookup = FixedLookup::new(Some("unused"));
    assert_eq!(fetch_title(&lookup, "https://example.com").await, None);
    assert!(lookup.seen.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn lookup_failure_uses_fallback() {
    let lookup = FixedLookup::new(None);
    let title = fetch_title(&lookup, "https://youtube.com/watch?v=abc").await;
    assert_eq!(title.as_deref(), Some("Unknown Title"));
  }

  #[tokio::test]
  async fn oembed_client_reads_title_and_sends_watch_url() {
    let (base, captured) = serve_once(200, r#"{"title":"A talk","author_name":"someone"}"#).await;
    let client = OEmbedClient::new(Client::new(), format!("{}/oembed", base));
    let id = resolve_video_id("https://youtube.com/watch?v=abc123").unwrap();

    assert_eq!(client.lookup_title(&id).await.unwrap(), "A talk");

    let request = captured.await.unwrap();
    assert!(request.head.starts_with("GET /oembed?"));
    assert!(request.head.contains("url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc123"));
    assert!(request.head.contains("format=json"));
  }

  #[tokio::test]
  async fn oembed_missing_title() {
    let (base, _captured) = serve_once(200, r#"{"author_name":"someone"}"#).await;
    let client = OEmbedClient::new(Client::new(), base);
    let id = resolve_video_id("https://youtube.com/watch?v=abc123").unwrap();
    assert!(matches!(client.lookup_title(&id).await, Err(MetadataError::MissingTitle)));
  }

  #[tokio::test]
  async fn oembed_error_status() {
    let (base, _captured) = serve_once(401, "Unauthorized").await;
    let client = OEmbedClient::new(Client::new(), base);
    let id = resolve_video_id("https://youtube.com/watch?v=private").unwrap();
    assert!(matches!(client.lookup_title(&id).await, Err(MetadataError::Status(401))));
  }

  #[tokio::test]
  async fn oembed_unreachable_falls_back_through_fetch_title() {
    let client = OEmbedClient::new(Client::new(), dead_endpoint().await);
    let title = fetch_title(&client, "https://youtube.com/watch?v=abc123").await;
    assert_eq!(title.as_deref(), Some("Unknown Title"));
  }
}
