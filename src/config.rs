use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::constants;
use crate::language::LanguageCode;

/// User preferences stored in `prefs.toml`. Every field is optional; unset fields fall back to `constants.ron`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub analyze_endpoint: Option<String>,
  pub oembed_endpoint: Option<String>,
  pub timeout_secs: Option<u64>,
  pub language: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", &constants().app_name) {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", &constants().app_name) {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Resolve preferences against the embedded defaults.
  pub fn settings(&self) -> Settings {
    let c = constants();
    Settings {
      analyze_endpoint: self.analyze_endpoint.clone().unwrap_or_else(|| c.analyze_endpoint.clone()),
      oembed_endpoint: self.oembed_endpoint.clone().unwrap_or_else(|| c.oembed_endpoint.clone()),
      timeout: Duration::from_secs(self.timeout_secs.unwrap_or(c.request_timeout_secs).max(1)),
      language: self.language.as_deref().and_then(|code| code.parse().ok()).unwrap_or_default(),
    }
  }
}

/// Effective settings after layering defaults, `prefs.toml` and CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
  pub analyze_endpoint: String,
  pub oembed_endpoint: String,
  pub timeout: Duration,
  /// Language used when no persisted session exists yet.
  pub language: LanguageCode,
}
