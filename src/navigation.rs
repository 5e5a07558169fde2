use tracing::warn;

use crate::host::Host;

/// Build a deep link into `base_url` at `offset_secs`, truncated to whole seconds.
/// Negative and non-finite offsets land at the start of the video.
pub fn deep_link(base_url: &str, offset_secs: f64) -> String {
  let t = if offset_secs.is_finite() && offset_secs > 0.0 { offset_secs.floor() as u64 } else { 0 };
  format!("{}&t={}s", base_url, t)
}

/// Ask the host to show `base_url` at `offset_secs`. Navigation failures are logged only.
pub async fn go_to(host: &dyn Host, base_url: &str, offset_secs: f64) {
  let target = deep_link(base_url, offset_secs);
  if let Err(e) = host.navigate(&target).await {
    warn!(err = %e, url = %target, "navigation: host refused to navigate");
  }
}
