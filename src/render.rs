//! Screen content as plain data.
//!
//! [`screen`] turns the session state into what should be on screen (texts, cards, links)
//! without touching the terminal. `ui.rs` only lays these values out.

use crate::constants::{Messages, constants};
use crate::format::{Locale, format_count, format_count_with, format_published, html_to_text};
use crate::model::{ChannelDetail, CommentsState, SearchResultItem, StreamFormat, VideoDetail};
use crate::session::Session;
use crate::view::{Pane, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
  Info,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub text: String,
  pub tone: Tone,
}

impl Notice {
  fn info(text: &str) -> Self {
    Self { text: text.to_string(), tone: Tone::Info }
  }

  fn error(text: &str) -> Self {
    Self { text: text.to_string(), tone: Tone::Error }
  }
}

/// Summary of one video result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
  pub video_id: String,
  pub channel_id: String,
  pub title: String,
  pub author: String,
  pub thumbnail_url: String,
  pub channel_icon_url: String,
}

impl Card {
  pub fn from_item(item: &SearchResultItem) -> Self {
    let c = constants();
    Self {
      video_id: item.id.clone(),
      channel_id: item.author_id.clone(),
      title: item.title.clone(),
      author: item.author.clone(),
      thumbnail_url: item.thumbnail_urls.first().cloned().unwrap_or_else(|| c.placeholder_thumbnail.clone()),
      channel_icon_url: item.author_thumbnail_urls.first().cloned().unwrap_or_else(|| c.placeholder_card_icon.clone()),
    }
  }
}

/// Content of the results container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsView {
  /// First launch, nothing searched yet.
  Welcome,
  Notice(Notice),
  Cards(Vec<Card>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
  pub author: String,
  pub date: String,
  pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPanel {
  pub title: String,
  /// Player reference: the instance's embed page.
  pub embed_url: String,
  pub author: String,
  pub views: String,
  pub description: String,
  pub formats: Vec<String>,
  pub comments: Result<Vec<CommentLine>, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoView {
  Loading(String),
  Failed(String),
  Ready(Box<VideoPanel>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPanel {
  pub name: String,
  pub icon_url: String,
  pub subscribers: String,
  pub views: String,
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelView {
  Loading(String),
  Failed(String),
  Ready(ChannelPanel),
}

/// Everything that is visible. Containers that are hidden are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
  pub results: Option<ResultsView>,
  pub video: Option<VideoView>,
  pub channel: Option<ChannelView>,
}

pub fn screen(session: &Session, locale: Locale, messages: &Messages) -> Screen {
  let visibility = session.state().visibility();
  let results = visibility.results.then(|| results_view(session, messages));
  let video = match session.state() {
    ViewState::VideoDetailShown(pane) => visibility.video_detail.then(|| video_view(pane, locale, messages)),
    _ => None,
  };
  let channel = match session.state() {
    ViewState::ChannelDetailShown(pane) => visibility.channel_detail.then(|| channel_view(pane, locale, messages)),
    _ => None,
  };
  Screen { results, video, channel }
}

fn results_view(session: &Session, m: &Messages) -> ResultsView {
  match session.state() {
    ViewState::Idle if session.blank_query() => ResultsView::Notice(Notice::info(&m.enter_query)),
    ViewState::Idle => ResultsView::Welcome,
    ViewState::Searching => ResultsView::Notice(Notice::info(&m.searching)),
    ViewState::Error => ResultsView::Notice(Notice::error(&m.search_failed)),
    ViewState::ResultsShown if session.results().is_empty() => ResultsView::Notice(Notice::info(&m.no_results)),
    _ => ResultsView::Cards(session.results().iter().map(Card::from_item).collect()),
  }
}

fn description(html: Option<&str>, m: &Messages) -> String {
  html.map(html_to_text).filter(|t| !t.is_empty()).unwrap_or_else(|| m.no_description.clone())
}

fn count_or_private(n: Option<u64>, locale: Locale, m: &Messages) -> String {
  n.map(|n| format_count(n, locale)).unwrap_or_else(|| m.private_count.clone())
}

fn video_view(pane: &Pane<VideoDetail>, locale: Locale, m: &Messages) -> VideoView {
  match pane {
    Pane::Loading => VideoView::Loading(m.loading_video.clone()),
    Pane::Failed => VideoView::Failed(m.video_failed.clone()),
    Pane::Ready(v) => VideoView::Ready(Box::new(VideoPanel {
      title: v.title.clone(),
      embed_url: v.embed_url.clone(),
      author: v.author.clone(),
      views: v
        .view_count
        .map(|n| format_count_with(&m.view_count, n, locale))
        .unwrap_or_else(|| m.private_count.clone()),
      description: description(v.description_html.as_deref(), m),
      formats: v.formats.iter().map(StreamFormat::label).collect(),
      comments: match &v.comments {
        CommentsState::Loaded(list) if !list.is_empty() => Ok(
          list
            .iter()
            .map(|c| CommentLine {
              author: c.author.clone(),
              date: format_published(c.published, &c.published_text),
              content: html_to_text(&c.content),
            })
            .collect(),
        ),
        CommentsState::Loading => Err(m.loading_comments.clone()),
        _ => Err(m.no_comments.clone()),
      },
    })),
  }
}

fn channel_view(pane: &Pane<ChannelDetail>, locale: Locale, m: &Messages) -> ChannelView {
  match pane {
    Pane::Loading => ChannelView::Loading(m.loading_channel.clone()),
    Pane::Failed => ChannelView::Failed(m.channel_failed.clone()),
    Pane::Ready(c) => ChannelView::Ready(ChannelPanel {
      name: c.author.clone(),
      icon_url: c.icon_url.clone().unwrap_or_else(|| constants().placeholder_channel_icon.clone()),
      subscribers: count_or_private(c.subscriber_count, locale, m),
      views: count_or_private(c.view_count, locale, m),
      description: description(c.description_html.as_deref(), m),
    }),
  }
}
