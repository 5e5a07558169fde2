mod analysis;
mod config;
mod constants;
mod error;
mod host;
mod language;
mod logging;
mod metadata;
mod navigation;
mod persistence;
mod session;
mod state;
#[cfg(test)]
mod testutil;
mod video_id;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use analysis::HttpAnalysisClient;
use config::Config;
use host::{CliHostKind, DesktopHost, Host, HostKind, MemoryHost, resolve_host_kind};
use language::LanguageCode;
use metadata::OEmbedClient;
use session::{Services, Session};
use state::SessionState;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Host capabilities: 'auto', 'hosted', or 'standalone' (default: auto-detect)
  #[arg(long, default_value = "auto")]
  host: CliHostKind,

  /// Analysis endpoint for this run (overrides prefs.toml)
  #[arg(long)]
  endpoint: Option<String>,

  /// Request timeout in seconds for this run
  #[arg(long)]
  timeout: Option<u64>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the current session (default)
  Status,
  /// Set the video URL
  Url { url: String },
  /// Set the video URL from the clipboard
  Paste,
  /// Set the search query
  Query {
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
  },
  /// Set the transcript language
  Lang { code: LanguageCode },
  /// List supported languages
  Languages,
  /// Search the transcript for the current query
  Analyze {
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    language: Option<LanguageCode>,
  },
  /// List the matches from the last analysis
  Results,
  /// Open the video at a match (1-based, as listed by `results`)
  Open { index: usize },
  /// Forget the saved session
  Reset,
  /// Show or update preferences
  Config {
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    oembed: Option<String>,
    #[arg(long)]
    timeout: Option<u64>,
    #[arg(long)]
    language: Option<LanguageCode>,
  },
  /// Print shell completions
  Completions { shell: Shell },
}

// --- Output ---

/// `h:mm:ss` or `m:ss`, truncated like deep-link offsets.
fn format_offset(secs: f64) -> String {
  let total = if secs.is_finite() && secs > 0.0 { secs.floor() as u64 } else { 0 };
  let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
  if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

fn or_none(value: &str) -> &str {
  if value.is_empty() { "(none)" } else { value }
}

/// Current query, or the language's greeting as a hint when there is none.
fn query_line(state: &SessionState) -> String {
  if state.query.is_empty() {
    format!("(none, e.g. \"{}\")", state.language.greeting())
  } else {
    state.query.clone()
  }
}

fn print_status(state: &SessionState, host: HostKind) {
  println!("host:     {}", host.label());
  println!("url:      {}", or_none(&state.video_url));
  println!("title:    {}", or_none(&state.video_title));
  println!("query:    {}", query_line(state));
  println!("language: {} ({})", state.language, state.language.label());
  println!("results:  {}", state.results.len());
  if let Some(error) = &state.error {
    println!("error:    {}", error);
  }
}

fn print_results(state: &SessionState) {
  if state.results.is_empty() {
    println!("No results.");
    return;
  }
  if !state.video_title.is_empty() {
    println!("{}", state.video_title);
  }
  for (i, result) in state.results.iter().enumerate() {
    println!("{:>3}. [{}] {}", i + 1, format_offset(result.start), result.text);
  }
}

fn print_settings(config: &Config) {
  let settings = config.settings();
  println!("analyze endpoint: {}", settings.analyze_endpoint);
  println!("oembed endpoint:  {}", settings.oembed_endpoint);
  println!("timeout:          {}s", settings.timeout.as_secs());
  println!("language:         {} ({})", settings.language, settings.language.label());
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(Command::Completions { shell }) = args.command {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = logging::init_logging();
  run(args).await
}

async fn run(args: Args) -> Result<()> {
  let command = args.command.unwrap_or(Command::Status);

  if let Command::Config { endpoint, oembed, timeout, language } = command {
    return update_config(endpoint, oembed, timeout, language);
  }

  let mut config = Config::load();
  if args.endpoint.is_some() {
    config.analyze_endpoint = args.endpoint;
  }
  if args.timeout.is_some() {
    config.timeout_secs = args.timeout;
  }
  let settings = config.settings();

  let http = reqwest::Client::builder().timeout(settings.timeout).build().context("Failed to build HTTP client")?;
  let host: Arc<dyn Host> = match resolve_host_kind(args.host) {
    HostKind::Hosted => Arc::new(DesktopHost::new()?),
    HostKind::Standalone => Arc::new(MemoryHost::new()),
  };
  info!(host = host.kind().label(), endpoint = %settings.analyze_endpoint, "main: starting session");

  let services = Services {
    host,
    analysis: Arc::new(HttpAnalysisClient::new(http.clone(), settings.analyze_endpoint.clone())),
    titles: Arc::new(OEmbedClient::new(http, settings.oembed_endpoint.clone())),
  };
  let mut session = Session::start(services, settings.language).await;

  let outcome = execute(&mut session, command).await;
  session.shutdown().await;
  outcome
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Apply background results as they arrive, the way an interactive loop would.
async fn wait_idle(session: &mut Session) {
  while session.check_pending() {
    tokio::time::sleep(POLL_INTERVAL).await;
  }
}

async fn execute(session: &mut Session, command: Command) -> Result<()> {
  match command {
    Command::Status => {
      wait_idle(session).await;
      print_status(session.state(), session.host_kind());
    }
    Command::Url { url } => {
      session.set_video_url(url.trim().to_string());
      wait_idle(session).await;
      println!("url:   {}", or_none(&session.state().video_url));
      println!("title: {}", or_none(&session.state().video_title));
    }
    Command::Paste => {
      session.paste_url().await?;
      wait_idle(session).await;
      if let Some(notice) = session.notice() {
        println!("{}", notice);
      }
      println!("url:   {}", session.state().video_url);
      println!("title: {}", or_none(&session.state().video_title));
    }
    Command::Query { text } => {
      session.set_query(text.join(" "));
      println!("query: {}", session.state().query);
    }
    Command::Lang { code } => {
      session.set_language(code);
      println!("language: {} ({})", code, code.label());
    }
    Command::Languages => {
      for code in LanguageCode::ALL {
        println!("{:<3} {:<10} {}", code.to_string(), code.label(), code.greeting());
      }
    }
    Command::Analyze { url, query, language } => {
      if let Some(url) = url {
        session.set_video_url(url.trim().to_string());
      }
      if let Some(query) = query {
        session.set_query(query);
      }
      if let Some(language) = language {
        session.set_language(language);
      }
      session.analyze().await;
      if let Some(error) = &session.state().error {
        bail!("{}", error);
      }
      print_results(session.state());
    }
    Command::Results => {
      wait_idle(session).await;
      print_results(session.state());
    }
    Command::Open { index } => {
      let link = match index.checked_sub(1) {
        Some(i) => session.open_result(i).await,
        None => None,
      };
      match link {
        Some(link) => println!("Opened {}", link),
        None => bail!("No result #{}; run `results` to list them", index),
      }
    }
    Command::Reset => {
      session.reset();
      println!("Session cleared.");
    }
    Command::Config { .. } | Command::Completions { .. } => {}
  }
  Ok(())
}

fn update_config(
  endpoint: Option<String>,
  oembed: Option<String>,
  timeout: Option<u64>,
  language: Option<LanguageCode>,
) -> Result<()> {
  let mut config = Config::load();
  let changed = endpoint.is_some() || oembed.is_some() || timeout.is_some() || language.is_some();
  if let Some(endpoint) = endpoint {
    config.analyze_endpoint = Some(endpoint);
  }
  if let Some(oembed) = oembed {
    config.oembed_endpoint = Some(oembed);
  }
  if let Some(timeout) = timeout {
    config.timeout_secs = Some(timeout);
  }
  if let Some(language) = language {
    config.language = Some(language.code().to_string());
  }
  if changed {
    config.save();
    info!(?config, "main: preferences updated");
  }
  print_settings(&config);
  Ok(())
}
