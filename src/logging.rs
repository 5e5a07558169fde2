use directories::ProjectDirs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::constants::constants;

const LOG_ENV: &str = "YTQ_LOG";

fn env_filter() -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("ytq=info"))
}

/// Install the global subscriber. Logs go to a daily rolling file in the data directory so stdout stays
/// clean for command output; stderr is the fallback when no such directory can be used.
///
/// Keep the returned guard alive until exit, or buffered lines are lost.
pub fn init_logging() -> Option<WorkerGuard> {
  let appender = ProjectDirs::from("", "", &constants().app_name).and_then(|dirs| file_appender(dirs.data_dir()));

  match appender {
    Some(appender) => {
      let (writer, guard) = tracing_appender::non_blocking(appender);
      tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();
      Some(guard)
    }
    None => {
      tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
      tracing::warn!("logging: no usable data directory, logging to stderr");
      None
    }
  }
}

fn file_appender(dir: &Path) -> Option<RollingFileAppender> {
  std::fs::create_dir_all(dir).ok()?;
  let (prefix, suffix) = log_file_parts(&constants().log_file);
  let mut builder = RollingFileAppender::builder().rotation(Rotation::DAILY).filename_prefix(prefix);
  if let Some(suffix) = suffix {
    builder = builder.filename_suffix(suffix);
  }
  builder.build(dir).ok()
}

/// Split `ytq.log` into the appender's prefix and suffix; the date goes between them.
fn log_file_parts(name: &str) -> (&str, Option<&str>) {
  match name.rsplit_once('.') {
    Some((prefix, suffix)) if !prefix.is_empty() && !suffix.is_empty() => (prefix, Some(suffix)),
    _ => (name, None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn log_file_name_splits_around_extension() {
    assert_eq!(log_file_parts("ytq.log"), ("ytq", Some("log")));
    assert_eq!(log_file_parts("ytq"), ("ytq", None));
    assert_eq!(log_file_parts(".log"), (".log", None));
  }

  #[test]
  fn appender_created_in_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("logs");
    assert!(file_appender(&nested).is_some());
    assert!(nested.is_dir());
  }
}
