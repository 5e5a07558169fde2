use std::fmt;
use url::Url;

use crate::constants::constants;

/// Canonical identifier of a single video (the `v` query parameter of a watch URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Canonical watch page URL for this video.
  pub fn watch_url(&self) -> String {
    format!("{}?v={}", constants().watch_url_base, self.0)
  }
}

impl fmt::Display for VideoId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Extract the video identifier from a pasted or typed URL.
/// Returns `None` for malformed URLs and URLs without a non-empty `v` parameter.
pub fn resolve_video_id(input: &str) -> Option<VideoId> {
  let parsed = Url::parse(input.trim()).ok()?;
  parsed
    .query_pairs()
    .find(|(key, value)| key == "v" && !value.trim().is_empty())
    .map(|(_, value)| VideoId(value.trim().to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn watch_url_with_extra_params() {
    let id = resolve_video_id("https://youtube.com/watch?v=abc123&t=5s").unwrap();
    assert_eq!(id.as_str(), "abc123");
  }

  #[test]
  fn v_param_not_first() {
    let id = resolve_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").unwrap();
    assert_eq!(id.as_str(), "dQw4w9WgXcQ");
  }

  #[test]
  fn surrounding_whitespace_is_ignored() {
    let id = resolve_video_id("  https://youtube.com/watch?v=xyz  ").unwrap();
    assert_eq!(id.as_str(), "xyz");
  }

  #[test]
  fn url_without_v_param() {
    assert_eq!(resolve_video_id("https://example.com"), None);
    assert_eq!(resolve_video_id("https://youtube.com/watch?list=PL123"), None);
  }

  #[test]
  fn empty_v_param() {
    assert_eq!(resolve_video_id("https://youtube.com/watch?v=&t=5s"), None);
  }

  #[test]
  fn malformed_input() {
    assert_eq!(resolve_video_id("not a link"), None);
    assert_eq!(resolve_video_id(""), None);
    assert_eq!(resolve_video_id("youtube.com/watch?v=abc"), None);
  }

  #[test]
  fn watch_url_is_canonical() {
    let id = resolve_video_id("https://m.youtube.com/watch?v=abc123").unwrap();
    assert_eq!(id.watch_url(), "https://www.youtube.com/watch?v=abc123");
  }
}
