//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available:
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// Built-in defaults. User preferences and CLI flags override the endpoint and timeout values.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub app_name: String,

  // Remote services
  pub analyze_endpoint: String,
  pub oembed_endpoint: String,
  pub watch_url_base: String,
  pub request_timeout_secs: u64,

  // Metadata
  pub fallback_title: String,

  // Clipboard paste
  pub accepted_url_markers: Vec<String>,

  // Persistence
  pub storage_file: String,
  pub log_file: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed every test fails on first access.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
