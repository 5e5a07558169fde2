use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AnalyzeError;
use crate::language::LanguageCode;
use crate::state::MatchResult;

/// Body of `POST /analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeRequest {
  pub video_url: String,
  pub query: String,
  pub language: LanguageCode,
}

/// Remote transcript analysis: returns the matches for a query, in service order.
#[async_trait]
pub trait AnalysisService: Send + Sync {
  async fn analyze(&self, request: &AnalyzeRequest) -> Result<Vec<MatchResult>, AnalyzeError>;
}

pub struct HttpAnalysisClient {
  http: Client,
  endpoint: String,
}

impl HttpAnalysisClient {
  pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
    Self { http, endpoint: endpoint.into() }
  }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
  async fn analyze(&self, request: &AnalyzeRequest) -> Result<Vec<MatchResult>, AnalyzeError> {
    info!(endpoint = %self.endpoint, language = %request.language, "analysis: sending request");

    let response = self.http.post(&self.endpoint).json(request).send().await.map_err(classify_send_error)?;

    let status = response.status();
    if !status.is_success() {
      warn!(status = status.as_u16(), "analysis: service returned an error status");
      return Err(AnalyzeError::HttpStatus(status.as_u16()));
    }

    let results: Vec<MatchResult> = response.json().await.map_err(|e| {
      if e.is_timeout() {
        AnalyzeError::NoResponse
      } else {
        warn!(err = %e, "analysis: undecodable response body");
        AnalyzeError::Request
      }
    })?;
    debug!(count = results.len(), "analysis: matches received");
    Ok(results)
  }
}

/// Map a failure from `send()`: anything after the request left the client reads as "no response".
fn classify_send_error(e: reqwest::Error) -> AnalyzeError {
  if e.is_builder() {
    warn!(err = %e, "analysis: could not build request");
    return AnalyzeError::Request;
  }
  if let Some(status) = e.status() {
    return AnalyzeError::HttpStatus(status.as_u16());
  }
  warn!(err = %e, timeout = e.is_timeout(), connect = e.is_connect(), "analysis: no response from service");
  AnalyzeError::NoResponse
}
