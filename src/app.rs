use anyhow::{Result, anyhow};
use image::DynamicImage;
use ratatui::{layout::Rect, widgets::ListState};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::api::VideoIndex;
use crate::config::Config;
use crate::constants::{Messages, constants, messages};
use crate::display::DisplayMode;
use crate::format::Locale;
use crate::graphics::fit_to_area;
use crate::model::{ChannelDetail, Comment, CommentsState, SearchResultItem, VideoDetail};
use crate::player::{MediaPlayer, open_url};
use crate::render::{self, Card, Screen};
use crate::session::{Session, Ticket};
use crate::theme::{THEMES, Theme, theme_index};
use crate::view::{Pane, ViewState};

// --- Types ---

pub type SearchResponse = (u64, Result<Vec<SearchResultItem>>);
pub type ChannelResponse = (u64, Result<ChannelDetail>);
pub type ImageResponse = (String, Result<DynamicImage>);

pub type VideoResponse = (u64, Result<VideoDetail>);
/// Comments for the video detail opened under the same generation.
pub type CommentsResponse = (u64, Result<Vec<Comment>>);

/// Where keystrokes go when no detail view is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Results,
}

/// Decoded thumbnails and icons for the current result set.
#[derive(Default)]
pub struct ImageCache {
  images: HashMap<String, DynamicImage>,
  failed: HashSet<String>,
  pending: Option<String>,
  /// Last scaled copy handed to the renderer: (url, area, image).
  fitted: Option<(String, Rect, DynamicImage)>,
}

impl ImageCache {
  pub fn clear(&mut self) {
    self.images.clear();
    self.failed.clear();
    self.pending = None;
    self.fitted = None;
  }

  /// Image scaled for `area`, recomputed only when the url or area changes.
  pub fn fitted(&mut self, url: &str, area: Rect, mode: DisplayMode) -> Option<&DynamicImage> {
    let stale = !matches!(&self.fitted, Some((u, a, _)) if u == url && *a == area);
    if stale {
      let source = self.images.get(url)?;
      self.fitted = Some((url.to_string(), area, fit_to_area(source, area, mode)));
    }
    self.fitted.as_ref().map(|(_, _, img)| img)
  }

  fn wants(&self, url: &str) -> bool {
    !self.images.contains_key(url) && !self.failed.contains(url) && self.pending.as_deref() != Some(url)
  }
}

/// In-flight request receivers. Replacing a receiver abandons the older request.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) search_rx: Option<oneshot::Receiver<SearchResponse>>,
  pub(crate) video_rx: Option<oneshot::Receiver<VideoResponse>>,
  pub(crate) comments_rx: Option<oneshot::Receiver<CommentsResponse>>,
  pub(crate) channel_rx: Option<oneshot::Receiver<ChannelResponse>>,
  pub(crate) image_rx: Option<oneshot::Receiver<ImageResponse>>,
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub session: Session,
  pub list_state: ListState,
  pub locale: Locale,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  /// Selected entry in the video's format list.
  pub format_index: usize,
  /// Vertical scroll of the detail text.
  pub detail_scroll: u16,
  pub player: MediaPlayer,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  pub images: ImageCache,
  backend: Arc<dyn VideoIndex>,
  pub(crate) tasks: AsyncTasks,
  config: Config,
  /// When the last error was set, for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(backend: Arc<dyn VideoIndex>, config: Config, display_mode: DisplayMode, locale: Locale) -> Self {
    Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      session: Session::new(),
      list_state: ListState::default(),
      locale,
      theme_index: theme_index(config.theme_name.as_deref()),
      display_mode,
      format_index: 0,
      detail_scroll: 0,
      player: MediaPlayer::new(),
      last_error: None,
      status_message: None,
      should_quit: false,
      images: ImageCache::default(),
      backend,
      tasks: AsyncTasks::default(),
      config,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    &THEMES[self.theme_index % THEMES.len()]
  }

  pub fn messages(&self) -> &'static Messages {
    messages(self.locale)
  }

  pub fn backend_label(&self) -> String {
    self.backend.label()
  }

  /// What should be on screen right now.
  pub fn screen(&self) -> Screen {
    render::screen(&self.session, self.locale, self.messages())
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.clear_error();
    }
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    if let Err(e) = self.config.save() {
      warn!(err = %format!("{:#}", e), "config: failed to save theme");
    }
  }

  pub fn has_pending(&self) -> bool {
    self.tasks.search_rx.is_some()
      || self.tasks.video_rx.is_some()
      || self.tasks.comments_rx.is_some()
      || self.tasks.channel_rx.is_some()
  }

  // --- Selection ---

  pub fn selected_item(&self) -> Option<&SearchResultItem> {
    self.list_state.selected().and_then(|i| self.session.results().get(i))
  }

  pub fn selected_card(&self) -> Option<Card> {
    self.selected_item().map(Card::from_item)
  }

  pub fn select_next(&mut self) {
    let count = self.session.results().len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
      self.request_selected_thumbnail();
    }
  }

  pub fn select_previous(&mut self) {
    let count = self.session.results().len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
      self.request_selected_thumbnail();
    }
  }

  // --- Search ---

  pub fn trigger_search(&mut self) {
    // Abandon everything in flight; the session also bumps its generation.
    self.tasks = AsyncTasks::default();
    self.images.clear();
    self.list_state.select(None);
    self.detail_scroll = 0;
    self.clear_error();

    let Some(Ticket { seq, key: query }) = self.session.submit_search(&self.input) else {
      debug!(seq = self.session.seq(), "search: blank query ignored");
      self.status_message = None;
      return;
    };
    self.status_message = Some(format!("{} '{}'", self.messages().searching, query));

    let backend = Arc::clone(&self.backend);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = backend.search(&query).await;
      let _ = tx.send((seq, result));
    });
    self.tasks.search_rx = Some(rx);
  }

  // --- Details ---

  /// Open the video detail for the selected card.
  pub fn trigger_load(&mut self) {
    let Some(id) = self.selected_item().map(|item| item.id.clone()) else { return };
    let Some(Ticket { seq, key: id }) = self.session.open_video(&id) else { return };
    self.tasks.channel_rx = None;
    self.format_index = 0;
    self.detail_scroll = 0;
    self.clear_error();

    let backend = Arc::clone(&self.backend);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = backend.video(&id).await;
      let _ = tx.send((seq, result));
    });
    self.tasks.video_rx = Some(rx);
  }

  /// Fetch comments once the video detail is on screen, under the same generation.
  fn request_comments(&mut self, seq: u64, id: String) {
    let backend = Arc::clone(&self.backend);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = backend.comments(&id).await;
      let _ = tx.send((seq, result));
    });
    self.tasks.comments_rx = Some(rx);
  }

  /// Open the channel modal for the open video's channel, or the selected card's channel.
  pub fn trigger_channel(&mut self) {
    let author_id = match self.session.state() {
      ViewState::VideoDetailShown(_) => self.session.video_author_id().map(str::to_string),
      _ => self.selected_item().map(|item| item.author_id.clone()),
    };
    let Some(author_id) = author_id else { return };
    let Some(Ticket { seq, key: id }) = self.session.open_channel(&author_id) else { return };
    self.tasks.video_rx = None;
    self.tasks.comments_rx = None;
    self.detail_scroll = 0;
    self.clear_error();

    let backend = Arc::clone(&self.backend);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = backend.channel(&id).await;
      let _ = tx.send((seq, result));
    });
    self.tasks.channel_rx = Some(rx);
  }

  pub fn close_detail(&mut self) {
    if self.session.close_detail() {
      self.tasks.video_rx = None;
      self.tasks.comments_rx = None;
      self.tasks.channel_rx = None;
      self.detail_scroll = 0;
      self.request_selected_thumbnail();
    }
  }

  pub fn scroll_detail(&mut self, delta: i16) {
    self.detail_scroll = self.detail_scroll.saturating_add_signed(delta);
  }

  // --- Formats / playback ---

  fn ready_video(&self) -> Option<&VideoDetail> {
    match self.session.state() {
      ViewState::VideoDetailShown(pane) => pane.ready(),
      _ => None,
    }
  }

  pub fn cycle_format(&mut self, forward: bool) {
    let Some(count) = self.ready_video().map(|v| v.formats.len()).filter(|&n| n > 0) else { return };
    self.format_index = if forward { (self.format_index + 1) % count } else { (self.format_index + count - 1) % count };
  }

  /// Stream URL for playback: the chosen format, or the plain watch URL.
  pub fn playback_url(&self) -> Option<(String, String)> {
    let video = self.ready_video()?;
    let url = video
      .formats
      .get(self.format_index)
      .map(|f| f.url.clone())
      .unwrap_or_else(|| format!("{}{}", constants().watch_url_base, video.id));
    Some((video.title.clone(), url))
  }

  pub async fn play_current(&mut self) {
    let Some((title, url)) = self.playback_url() else { return };
    if let Err(e) = self.player.play(&title, &url).await {
      warn!(err = %format!("{:#}", e), "player: failed to start");
      self.set_error(format!("Playback error: {}", e));
    }
  }

  pub async fn stop_playback(&mut self) {
    if let Err(e) = self.player.stop().await {
      self.set_error(format!("Stop error: {}", e));
    }
  }

  /// Link for the open detail: the embed page, or the channel page.
  pub fn detail_link(&self) -> Option<String> {
    match self.session.state() {
      ViewState::VideoDetailShown(Pane::Ready(v)) => Some(v.embed_url.clone()),
      ViewState::ChannelDetailShown(Pane::Ready(c)) => Some(format!("{}{}", constants().channel_url_base, c.id)),
      _ => None,
    }
  }

  pub fn open_detail_link(&mut self) {
    let Some(url) = self.detail_link() else { return };
    if let Err(e) = open_url(&url) {
      self.set_error(format!("Failed to open browser: {}", e));
    }
  }

  // --- Images ---

  fn request_image(&mut self, url: String) {
    if !self.display_mode.shows_images() || !self.images.wants(&url) {
      return;
    }
    self.images.pending = Some(url.clone());
    let backend = Arc::clone(&self.backend);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = backend.image(&url).await;
      let _ = tx.send((url, result));
    });
    self.tasks.image_rx = Some(rx);
  }

  pub fn request_selected_thumbnail(&mut self) {
    if let Some(card) = self.selected_card() {
      self.request_image(card.thumbnail_url);
    }
  }

  // --- Polling ---

  pub async fn check_pending(&mut self) -> Result<()> {
    self.player.reap();

    if let Some(mut rx) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok((seq, result)) => {
          self.status_message = None;
          if self.session.finish_search(seq, result) && !self.session.results().is_empty() {
            self.list_state.select(Some(0));
            self.mode = AppMode::Results;
            self.request_selected_thumbnail();
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Search task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.video_rx.take() {
      match rx.try_recv() {
        Ok((seq, result)) => {
          if self.session.finish_video(seq, result)
            && let Some(video) = self.session.video_mut()
          {
            video.comments = CommentsState::Loading;
            let id = video.id.clone();
            self.request_comments(seq, id);
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.video_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.set_error("Video task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.comments_rx.take() {
      match rx.try_recv() {
        Ok((seq, result)) => {
          self.session.finish_comments(seq, result);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.comments_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.session.finish_comments(self.session.seq(), Err(anyhow!("comments task ended without a response")));
        }
      }
    }

    if let Some(mut rx) = self.tasks.channel_rx.take() {
      match rx.try_recv() {
        Ok((seq, result)) => {
          if self.session.finish_channel(seq, result)
            && let ViewState::ChannelDetailShown(Pane::Ready(channel)) = self.session.state()
            && let Some(icon) = channel.icon_url.clone()
          {
            self.request_image(icon);
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.channel_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.set_error("Channel task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.image_rx.take() {
      match rx.try_recv() {
        Ok((url, result)) => {
          self.images.pending = None;
          match result {
            Ok(image) => {
              self.images.images.insert(url, image);
            }
            Err(e) => {
              debug!(err = %format!("{:#}", e), "images: fetch failed");
              self.images.failed.insert(url);
            }
          }
          // The selection may have moved while this one was loading.
          self.request_selected_thumbnail();
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.image_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.images.pending = None;
        }
      }
    }

    Ok(())
  }

  pub async fn shutdown(&mut self) {
    info!("app: shutting down");
    self.stop_playback().await;
  }
}
