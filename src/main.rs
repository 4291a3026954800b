mod api;
mod app;
mod config;
mod constants;
mod display;
mod format;
mod graphics;
mod input;
mod model;
mod player;
mod render;
mod session;
mod theme;
mod ui;
mod view;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use api::{InvidiousClient, ProxyClient, VideoIndex, http_client};
use app::App;
use config::Config;
use constants::constants;
use display::{CliDisplayMode, resolve_display_mode};
use format::Locale;
use input::handle_key_event;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Invidious-compatible instance URL (default: prefs.toml, then the built-in instance)
  #[arg(short, long)]
  instance: Option<String>,

  /// Local proxy base URL exposing /search, /video_info and /comments. Overrides --instance
  #[arg(short, long)]
  proxy: Option<String>,

  /// Interface language
  #[arg(short, long)]
  locale: Option<Locale>,

  /// Image display mode: 'auto', 'direct', 'ascii' or 'off' (default: auto-detect)
  #[arg(short, long)]
  display_mode: Option<CliDisplayMode>,

  /// Write logs here instead of the default data directory
  #[arg(long)]
  log_file: Option<PathBuf>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Setup ---

/// Log to a file; the terminal belongs to the UI. Filter with `IVS_LOG` (default `ivs=info`).
fn init_logging(path: Option<PathBuf>) -> Option<WorkerGuard> {
  let path = path.or_else(config::log_path)?;
  let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).map_or_else(|| PathBuf::from("."), PathBuf::from);
  let file_name = path.file_name()?.to_os_string();
  if std::fs::create_dir_all(&dir).is_err() {
    return None;
  }

  let filter = EnvFilter::try_from_env("IVS_LOG").unwrap_or_else(|_| EnvFilter::new("ivs=info"));
  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).try_init().ok()?;
  Some(guard)
}

/// Proxy first, then the instance from the command line, prefs.toml, or the built-in default.
fn build_backend(args: &Args, config: &Config) -> Result<Arc<dyn VideoIndex>> {
  let client = http_client()?;
  if let Some(proxy) = args.proxy.as_deref().or(config.proxy_url.as_deref()) {
    let backend = ProxyClient::new(client, proxy).context("Invalid proxy URL")?;
    return Ok(Arc::new(backend));
  }
  let instance = args.instance.as_deref().or(config.instance_url.as_deref()).unwrap_or(&constants().default_instance);
  let backend = InvidiousClient::new(client, instance).context("Invalid instance URL")?;
  Ok(Arc::new(backend))
}

fn resolve_locale(args: &Args, config: &Config) -> Locale {
  args.locale.or_else(|| config.locale.as_deref().map(Locale::from_config)).unwrap_or_default()
}

fn resolve_cli_display_mode(args: &Args, config: &Config) -> CliDisplayMode {
  args
    .display_mode
    .or_else(|| config.display_mode.as_deref().and_then(CliDisplayMode::from_config))
    .unwrap_or(CliDisplayMode::Auto)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "ivs", &mut std::io::stdout());
    return Ok(());
  }

  let _guard = init_logging(args.log_file.clone());
  let config = Config::load();
  let backend = build_backend(&args, &config)?;
  let locale = resolve_locale(&args, &config);
  let display_mode = resolve_display_mode(resolve_cli_display_mode(&args, &config));
  info!(backend = %backend.label(), locale = locale.label(), display = display_mode.label(), "ivs: starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let mut app = App::new(backend, config, display_mode, locale);
  let result = run(&mut terminal, &mut app).await;
  ratatui::restore();
  app.shutdown().await;
  result
}

async fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  loop {
    app.check_pending().await?;
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          handle_key_event(app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }
  Ok(())
}
