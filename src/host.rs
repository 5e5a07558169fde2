//! Host capabilities: key-value storage, navigation and clipboard.
//!
//! Two implementations sit behind the [`Host`] trait:
//! - [`DesktopHost`] ("hosted"): JSON document in the user data directory, the platform URL
//!   opener, and the platform clipboard tools.
//! - [`MemoryHost`] ("standalone"): everything in memory. Navigation only records the location.
//!
//! The kind is chosen once at startup ([`resolve_host_kind`]) and injected into the session.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use clap::ValueEnum;
use directories::ProjectDirs;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use tokio::process::Command;
use tracing::{debug, info};

use crate::constants::constants;

#[async_trait]
pub trait Host: Send + Sync {
  fn kind(&self) -> HostKind;

  /// Fetch the stored values for `keys`. Absent keys are simply missing from the map.
  async fn storage_get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

  /// Merge `items` into the store, replacing existing keys.
  async fn storage_set(&self, items: Map<String, Value>) -> Result<()>;

  /// Ask the host to show `url`. Success means the request was handed off, not that a page loaded.
  async fn navigate(&self, url: &str) -> Result<()>;

  async fn read_clipboard(&self) -> Result<String>;
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliHostKind {
  Auto,
  Hosted,
  Standalone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
  Hosted,
  Standalone,
}

impl HostKind {
  pub fn label(self) -> &'static str {
    match self {
      HostKind::Hosted => "hosted",
      HostKind::Standalone => "standalone",
    }
  }
}

/// Probe for desktop capabilities. A resolvable per-user data directory means the durable store is usable.
pub fn detect_host_kind() -> HostKind {
  if ProjectDirs::from("", "", &constants().app_name).is_some() { HostKind::Hosted } else { HostKind::Standalone }
}

pub fn resolve_host_kind(cli: CliHostKind) -> HostKind {
  match cli {
    CliHostKind::Auto => detect_host_kind(),
    CliHostKind::Hosted => HostKind::Hosted,
    CliHostKind::Standalone => HostKind::Standalone,
  }
}

// ---------------------------------------------------------------------------
// Desktop host
// ---------------------------------------------------------------------------

pub struct DesktopHost {
  storage_path: PathBuf,
}

impl DesktopHost {
  pub fn new() -> Result<Self> {
    let proj_dirs =
      ProjectDirs::from("", "", &constants().app_name).context("No per-user data directory on this system")?;
    Ok(Self::with_data_dir(proj_dirs.data_dir()))
  }

  pub fn with_data_dir(dir: &Path) -> Self {
    Self { storage_path: dir.join(&constants().storage_file) }
  }

  #[cfg(test)]
  pub fn storage_path(&self) -> &Path {
    &self.storage_path
  }

  async fn read_document(&self) -> Result<Map<String, Value>> {
    let content = match tokio::fs::read_to_string(&self.storage_path).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
      Err(e) => {
        return Err(anyhow!(e).context(format!("Failed to read {}", self.storage_path.display())));
      }
    };
    serde_json::from_str(&content).with_context(|| format!("Corrupt session store {}", self.storage_path.display()))
  }

  async fn write_document(&self, doc: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = self.storage_path.parent() {
      tokio::fs::create_dir_all(parent).await.context("Failed to create data directory")?;
    }
    let content = serde_json::to_string_pretty(doc).context("Failed to serialize session store")?;

    // Write to a temp file, then rename (atomic)
    let tmp_path = self.storage_path.with_extension("json.part");
    tokio::fs::write(&tmp_path, content).await.context("Failed to write session store")?;
    tokio::fs::rename(&tmp_path, &self.storage_path).await.context("Failed to finalize session store")?;
    Ok(())
  }
}

#[async_trait]
impl Host for DesktopHost {
  fn kind(&self) -> HostKind {
    HostKind::Hosted
  }

  async fn storage_get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
    let mut doc = self.read_document().await?;
    Ok(keys.iter().filter_map(|key| doc.remove(*key).map(|value| (key.to_string(), value))).collect())
  }

  async fn storage_set(&self, items: Map<String, Value>) -> Result<()> {
    let mut doc = match self.read_document().await {
      Ok(doc) => doc,
      Err(e) => {
        debug!(err = %e, "host: unreadable session store, starting a fresh document");
        Map::new()
      }
    };
    doc.extend(items);
    self.write_document(&doc).await
  }

  async fn navigate(&self, url: &str) -> Result<()> {
    let (program, args) = opener_command(url);
    info!(url = %url, program, "host: opening URL");
    let status = Command::new(program)
      .args(&args)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .status()
      .await
      .map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
          anyhow!("{} not found; cannot open {}", program, url)
        } else {
          anyhow!(e).context(format!("Failed to run {}", program))
        }
      })?;
    if !status.success() {
      return Err(anyhow!("{} exited with {}", program, status));
    }
    Ok(())
  }

  async fn read_clipboard(&self) -> Result<String> {
    let mut last_err = anyhow!("no clipboard tool for this platform");
    for (program, args) in clipboard_commands() {
      match run_capture(program, &args).await {
        Ok(text) => return Ok(text),
        Err(e) => {
          debug!(program, err = %e, "host: clipboard tool failed");
          last_err = e;
        }
      }
    }
    Err(last_err)
  }
}

fn opener_command(url: &str) -> (&'static str, Vec<String>) {
  opener_command_for(std::env::consts::OS, url)
}

/// The URL always travels as a single argument. On Windows it must not pass through `cmd`,
/// which splits on the `&` of every deep link.
fn opener_command_for(os: &str, url: &str) -> (&'static str, Vec<String>) {
  match os {
    "macos" => ("open", vec![url.to_string()]),
    "windows" => ("rundll32", vec!["url.dll,FileProtocolHandler".to_string(), url.to_string()]),
    _ => ("xdg-open", vec![url.to_string()]),
  }
}

fn clipboard_commands() -> Vec<(&'static str, Vec<&'static str>)> {
  if cfg!(target_os = "macos") {
    vec![("pbpaste", vec![])]
  } else if cfg!(target_os = "windows") {
    vec![("powershell", vec!["-NoProfile", "-Command", "Get-Clipboard"])]
  } else {
    vec![("wl-paste", vec!["--no-newline"]), ("xclip", vec!["-selection", "clipboard", "-o"])]
  }
}

/// Run a command and return its stdout.
async fn run_capture(program: &str, args: &[&str]) -> Result<String> {
  let output = Command::new(program)
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .output()
    .await
    .with_context(|| format!("Failed to run {}", program))?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    return Err(anyhow!("{} failed: {}", program, stderr.trim()));
  }
  String::from_utf8(output.stdout).with_context(|| format!("{} output non-UTF8", program))
}

// ---------------------------------------------------------------------------
// In-memory host
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryHost {
  storage: Mutex<Map<String, Value>>,
  location: Mutex<Option<String>>,
  clipboard: Mutex<Option<String>>,
}

impl MemoryHost {
  pub fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub fn set_clipboard(&self, text: Option<String>) {
    *self.clipboard.lock().unwrap_or_else(PoisonError::into_inner) = text;
  }

  /// Last location navigated to, if any.
  #[cfg(test)]
  pub fn location(&self) -> Option<String> {
    self.location.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }

  #[cfg(test)]
  pub fn stored(&self, key: &str) -> Option<Value> {
    self.storage.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
  }
}

#[async_trait]
impl Host for MemoryHost {
  fn kind(&self) -> HostKind {
    HostKind::Standalone
  }

  async fn storage_get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
    let storage = self.storage.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(keys.iter().filter_map(|key| storage.get(*key).map(|value| (key.to_string(), value.clone()))).collect())
  }

  async fn storage_set(&self, items: Map<String, Value>) -> Result<()> {
    self.storage.lock().unwrap_or_else(PoisonError::into_inner).extend(items);
    Ok(())
  }

  async fn navigate(&self, url: &str) -> Result<()> {
    info!(url = %url, "host: in-page navigation");
    *self.location.lock().unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
    Ok(())
  }

  async fn read_clipboard(&self) -> Result<String> {
    self.clipboard.lock().unwrap_or_else(PoisonError::into_inner).clone().context("Clipboard is empty")
  }
}
