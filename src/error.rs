/// Failure of an analysis request. `Display` is the exact message shown in the error slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzeError {
  #[error("Please provide a YouTube URL and a query.")]
  Validation,

  #[error("{}", status_message(.0))]
  HttpStatus(u16),

  /// The request went out but nothing came back (connect failure, timeout, reset).
  #[error("No response from server. Please check your internet connection.")]
  NoResponse,

  /// The request could not be built or sent, or its response could not be read.
  #[error("Something went wrong. Please try again.")]
  Request,
}

fn status_message(code: &u16) -> String {
  match *code {
    400 => "Invalid request. Please check your input and try again.".to_string(),
    404 => "No matches found for the given query.".to_string(),
    500 => "Server error. Please try again later.".to_string(),
    other => format!("Unexpected error: {}", other),
  }
}

/// Title lookup failure. Never shown to the user; it becomes the fallback title.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
  #[error("invalid metadata endpoint: {0}")]
  Endpoint(#[from] url::ParseError),

  #[error("metadata request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("metadata service returned status {0}")]
  Status(u16),

  #[error("metadata response has no title")]
  MissingTitle,
}

/// Clipboard paste rejection. `Display` is the notice text.
#[derive(Debug, thiserror::Error)]
pub enum PasteError {
  #[error("Failed to read clipboard.")]
  Clipboard(#[source] anyhow::Error),

  #[error("Clipboard does not contain a YouTube link.")]
  InvalidUrl,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_statuses_have_fixed_messages() {
    assert_eq!(
      AnalyzeError::HttpStatus(400).to_string(),
      "Invalid request. Please check your input and try again."
    );
    assert_eq!(AnalyzeError::HttpStatus(404).to_string(), "No matches found for the given query.");
    assert_eq!(AnalyzeError::HttpStatus(500).to_string(), "Server error. Please try again later.");
  }

  #[test]
  fn other_statuses_report_the_code() {
    for code in [401, 403, 418, 429, 502, 503] {
      assert_eq!(AnalyzeError::HttpStatus(code).to_string(), format!("Unexpected error: {}", code));
    }
  }

  #[test]
  fn transport_messages() {
    assert_eq!(AnalyzeError::Validation.to_string(), "Please provide a YouTube URL and a query.");
    assert_eq!(
      AnalyzeError::NoResponse.to_string(),
      "No response from server. Please check your internet connection."
    );
    assert_eq!(AnalyzeError::Request.to_string(), "Something went wrong. Please try again.");
  }

  #[test]
  fn paste_notices() {
    assert_eq!(PasteError::InvalidUrl.to_string(), "Clipboard does not contain a YouTube link.");
    assert_eq!(PasteError::Clipboard(anyhow::anyhow!("no pbpaste")).to_string(), "Failed to read clipboard.");
  }
}
