//! Search and detail controller state.
//!
//! `Session` holds no I/O. Each `open_*`/`submit_*` call returns a [`Ticket`] describing the
//! request the caller should issue; the caller hands the response back through the matching
//! `finish_*` call together with the ticket's generation. Every action bumps the generation,
//! so a response that lands after a newer action is dropped instead of overwriting the screen.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::model::{ChannelDetail, Comment, CommentsState, SearchResultItem, VideoDetail};
use crate::view::{Pane, ViewState};

/// One issued request: its generation and the query or identifier it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
  pub seq: u64,
  pub key: String,
}

#[derive(Debug, Default)]
pub struct Session {
  state: ViewState,
  /// Video-type results of the last successful search.
  results: Vec<SearchResultItem>,
  /// Query of the last submitted search.
  query: String,
  /// Set when the last submission was blank; `Idle` then shows the "enter a query" prompt.
  blank_query: bool,
  /// Channel of the card whose video detail is open, so the channel modal can replace it.
  video_author_id: Option<String>,
  seq: u64,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> &ViewState {
    &self.state
  }

  pub fn results(&self) -> &[SearchResultItem] {
    &self.results
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn blank_query(&self) -> bool {
    self.blank_query
  }

  /// Generation of the most recent action.
  pub fn seq(&self) -> u64 {
    self.seq
  }

  fn bump(&mut self) -> u64 {
    self.seq += 1;
    self.seq
  }

  fn is_current(&self, seq: u64, what: &str) -> bool {
    if seq != self.seq {
      debug!(seq, current = self.seq, what, "session: dropping stale response");
      return false;
    }
    true
  }

  // --- Search ---

  /// Start a search. Returns `None` (and issues nothing) for a blank query.
  pub fn submit_search(&mut self, raw: &str) -> Option<Ticket> {
    let query = raw.trim();
    let seq = self.bump();
    self.results.clear();
    self.video_author_id = None;
    if query.is_empty() {
      self.blank_query = true;
      self.state = ViewState::Idle;
      return None;
    }
    info!(query = %query, seq, "session: search submitted");
    self.blank_query = false;
    self.query = query.to_string();
    self.state = ViewState::Searching;
    Some(Ticket { seq, key: self.query.clone() })
  }

  /// Apply a search response. Returns `false` when the response was stale and ignored.
  pub fn finish_search(&mut self, seq: u64, result: Result<Vec<SearchResultItem>>) -> bool {
    if !self.is_current(seq, "search") || !matches!(self.state, ViewState::Searching) {
      return false;
    }
    match result {
      Ok(items) => {
        let total = items.len();
        self.results = items.into_iter().filter(SearchResultItem::is_video).collect();
        info!(total, videos = self.results.len(), "session: search finished");
        self.state = ViewState::ResultsShown;
      }
      Err(e) => {
        warn!(err = %format!("{:#}", e), query = %self.query, "session: search failed");
        self.results.clear();
        self.state = ViewState::Error;
      }
    }
    true
  }

  // --- Video detail ---

  /// Open the detail view for a card on screen. Returns `None` unless cards are shown and
  /// `id` belongs to one of them.
  pub fn open_video(&mut self, id: &str) -> Option<Ticket> {
    if !matches!(self.state, ViewState::ResultsShown) {
      return None;
    }
    let card = self.results.iter().find(|r| r.id == id)?;
    self.video_author_id = Some(card.author_id.clone()).filter(|a| !a.is_empty());
    let seq = self.bump();
    info!(id, seq, "session: video detail opened");
    self.state = ViewState::VideoDetailShown(Pane::Loading);
    Some(Ticket { seq, key: id.to_string() })
  }

  pub fn finish_video(&mut self, seq: u64, result: Result<VideoDetail>) -> bool {
    if !self.is_current(seq, "video") || !matches!(self.state, ViewState::VideoDetailShown(Pane::Loading)) {
      return false;
    }
    self.state = match result {
      Ok(detail) => {
        debug!(id = %detail.id, "session: video detail ready");
        ViewState::VideoDetailShown(Pane::Ready(detail))
      }
      Err(e) => {
        warn!(err = %format!("{:#}", e), "session: video detail failed");
        ViewState::VideoDetailShown(Pane::Failed)
      }
    };
    true
  }

  /// Close the video detail and show the results again.
  pub fn close_video(&mut self) -> bool {
    if !matches!(self.state, ViewState::VideoDetailShown(_)) {
      return false;
    }
    self.bump();
    self.video_author_id = None;
    self.state = ViewState::ResultsShown;
    true
  }

  /// Mutable access to the loaded video, for attaching comments that arrive with it.
  pub fn video_mut(&mut self) -> Option<&mut VideoDetail> {
    match &mut self.state {
      ViewState::VideoDetailShown(Pane::Ready(detail)) => Some(detail),
      _ => None,
    }
  }

  /// Attach comments fetched after the video detail. Dropped unless the same detail is still
  /// open and loaded.
  pub fn finish_comments(&mut self, seq: u64, result: Result<Vec<Comment>>) -> bool {
    if !self.is_current(seq, "comments") {
      return false;
    }
    let Some(video) = self.video_mut() else { return false };
    video.comments = match result {
      Ok(list) => {
        debug!(count = list.len(), "session: comments ready");
        CommentsState::Loaded(list)
      }
      Err(e) => {
        warn!(err = %format!("{:#}", e), "session: comments failed");
        CommentsState::Unavailable
      }
    };
    true
  }

  // --- Channel detail ---

  /// Open the channel modal from the results, or in place of an open video detail.
  pub fn open_channel(&mut self, author_id: &str) -> Option<Ticket> {
    let allowed = match &self.state {
      ViewState::ResultsShown => self.results.iter().any(|r| r.author_id == author_id),
      ViewState::VideoDetailShown(_) => self.video_author_id.as_deref() == Some(author_id),
      _ => false,
    };
    if !allowed || author_id.is_empty() {
      return None;
    }
    self.video_author_id = None;
    let seq = self.bump();
    info!(author_id, seq, "session: channel detail opened");
    self.state = ViewState::ChannelDetailShown(Pane::Loading);
    Some(Ticket { seq, key: author_id.to_string() })
  }

  /// Channel of the currently open video detail, if known.
  pub fn video_author_id(&self) -> Option<&str> {
    self.video_author_id.as_deref()
  }

  pub fn finish_channel(&mut self, seq: u64, result: Result<ChannelDetail>) -> bool {
    if !self.is_current(seq, "channel") || !matches!(self.state, ViewState::ChannelDetailShown(Pane::Loading)) {
      return false;
    }
    self.state = match result {
      Ok(detail) => ViewState::ChannelDetailShown(Pane::Ready(detail)),
      Err(e) => {
        warn!(err = %format!("{:#}", e), "session: channel detail failed");
        ViewState::ChannelDetailShown(Pane::Failed)
      }
    };
    true
  }

  pub fn close_channel(&mut self) -> bool {
    if !matches!(self.state, ViewState::ChannelDetailShown(_)) {
      return false;
    }
    self.bump();
    self.state = ViewState::ResultsShown;
    true
  }

  /// Close whichever detail view is open.
  pub fn close_detail(&mut self) -> bool {
    self.close_video() || self.close_channel()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::ItemKind;
  use anyhow::anyhow;

  fn item(kind: ItemKind, id: &str, author_id: &str) -> SearchResultItem {
    SearchResultItem {
      kind,
      id: id.to_string(),
      title: format!("title {}", id),
      author: "author".to_string(),
      author_id: author_id.to_string(),
      thumbnail_urls: Vec::new(),
      author_thumbnail_urls: Vec::new(),
    }
  }

  fn mixed_results() -> Vec<SearchResultItem> {
    vec![
      item(ItemKind::Video, "v1", "UC1"),
      item(ItemKind::Channel, "UC1", "UC1"),
      item(ItemKind::Video, "v2", "UC2"),
      item(ItemKind::Playlist, "PL1", "UC1"),
      item(ItemKind::Other("hashtag".into()), "h", ""),
    ]
  }

  fn video(id: &str) -> VideoDetail {
    VideoDetail {
      id: id.to_string(),
      title: "T".to_string(),
      author: "A".to_string(),
      view_count: Some(1),
      description_html: None,
      embed_url: format!("https://iv.test/embed/{}", id),
      formats: Vec::new(),
      comments: CommentsState::Unavailable,
    }
  }

  fn channel(id: &str) -> ChannelDetail {
    ChannelDetail {
      id: id.to_string(),
      author: "A".to_string(),
      subscriber_count: None,
      view_count: None,
      icon_url: None,
      description_html: None,
    }
  }

  fn with_results() -> Session {
    let mut s = Session::new();
    let t = s.submit_search("rust").unwrap();
    assert!(s.finish_search(t.seq, Ok(mixed_results())));
    s
  }

  // --- Search ---

  #[test]
  fn blank_query_issues_nothing() {
    let mut s = Session::new();
    for q in ["", "   ", "\t\n"] {
      assert!(s.submit_search(q).is_none());
      assert!(matches!(s.state(), ViewState::Idle));
      assert!(s.blank_query());
    }
  }

  #[test]
  fn query_is_trimmed() {
    let mut s = Session::new();
    let t = s.submit_search("  lofi beats ").unwrap();
    assert_eq!(t.key, "lofi beats");
    assert!(matches!(s.state(), ViewState::Searching));
    assert!(!s.blank_query());
  }

  #[test]
  fn only_video_items_survive() {
    let s = with_results();
    assert!(matches!(s.state(), ViewState::ResultsShown));
    let ids: Vec<&str> = s.results().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v2"]);
  }

  #[test]
  fn zero_videos_is_still_results_shown() {
    let mut s = Session::new();
    let t = s.submit_search("x").unwrap();
    s.finish_search(t.seq, Ok(vec![item(ItemKind::Channel, "UC1", "UC1")]));
    assert!(matches!(s.state(), ViewState::ResultsShown));
    assert!(s.results().is_empty());
  }

  #[test]
  fn failed_search_is_recoverable() {
    let mut s = Session::new();
    let t = s.submit_search("x").unwrap();
    s.finish_search(t.seq, Err(anyhow!("HTTP status server error (500 Internal Server Error)")));
    assert!(matches!(s.state(), ViewState::Error));

    let t = s.submit_search("y").unwrap();
    assert!(s.finish_search(t.seq, Ok(mixed_results())));
    assert!(matches!(s.state(), ViewState::ResultsShown));
    assert_eq!(s.results().len(), 2);
  }

  #[test]
  fn stale_search_response_is_dropped() {
    let mut s = Session::new();
    let first = s.submit_search("first").unwrap();
    let second = s.submit_search("second").unwrap();
    assert!(second.seq > first.seq);

    assert!(s.finish_search(second.seq, Ok(vec![item(ItemKind::Video, "new", "UC")])));
    assert!(!s.finish_search(first.seq, Ok(vec![item(ItemKind::Video, "old", "UC")])));
    assert_eq!(s.results()[0].id, "new");
    assert_eq!(s.query(), "second");
  }

  #[test]
  fn blank_query_invalidates_inflight_search() {
    let mut s = Session::new();
    let t = s.submit_search("first").unwrap();
    assert!(s.submit_search(" ").is_none());
    assert!(!s.finish_search(t.seq, Ok(mixed_results())));
    assert!(matches!(s.state(), ViewState::Idle));
  }

  // --- Video detail ---

  #[test]
  fn open_video_hides_results_and_close_restores() {
    let mut s = with_results();
    let t = s.open_video("v1").unwrap();
    assert!(!s.state().visibility().results);
    assert!(s.state().visibility().video_detail);

    assert!(s.finish_video(t.seq, Ok(video("v1"))));
    assert!(s.state().visibility().video_detail);

    assert!(s.close_video());
    assert!(matches!(s.state(), ViewState::ResultsShown));
    assert!(s.state().visibility().results);
    assert_eq!(s.results().len(), 2);
  }

  #[test]
  fn open_video_requires_visible_card() {
    let mut s = Session::new();
    assert!(s.open_video("v1").is_none());
    let mut s = with_results();
    assert!(s.open_video("UC1").is_none(), "channel items are not cards");
    assert!(s.open_video("missing").is_none());
  }

  #[test]
  fn failed_video_still_closable() {
    let mut s = with_results();
    let t = s.open_video("v2").unwrap();
    s.finish_video(t.seq, Err(anyhow!("HTTP 500")));
    assert!(matches!(s.state(), ViewState::VideoDetailShown(Pane::Failed)));
    assert!(s.close_detail());
    assert!(matches!(s.state(), ViewState::ResultsShown));
  }

  #[test]
  fn video_response_after_close_is_dropped() {
    let mut s = with_results();
    let t = s.open_video("v1").unwrap();
    s.close_video();
    assert!(!s.finish_video(t.seq, Ok(video("v1"))));
    assert!(matches!(s.state(), ViewState::ResultsShown));
  }

  #[test]
  fn search_from_detail_tears_it_down() {
    let mut s = with_results();
    let v = s.open_video("v1").unwrap();
    let t = s.submit_search("other").unwrap();
    assert!(matches!(s.state(), ViewState::Searching));
    assert!(!s.finish_video(v.seq, Ok(video("v1"))));
    assert!(s.finish_search(t.seq, Ok(Vec::new())));
    assert!(s.results().is_empty());
  }

  #[test]
  fn video_mut_only_when_ready() {
    let mut s = with_results();
    let t = s.open_video("v1").unwrap();
    assert!(s.video_mut().is_none());
    s.finish_video(t.seq, Ok(video("v1")));
    s.video_mut().unwrap().comments = CommentsState::Loaded(Vec::new());
    assert_eq!(s.video_mut().unwrap().comments, CommentsState::Loaded(Vec::new()));
  }

  fn comment(content: &str) -> Comment {
    Comment { author: "viewer".into(), published: None, published_text: String::new(), content: content.into() }
  }

  #[test]
  fn comments_attach_to_the_open_video() {
    let mut s = with_results();
    let t = s.open_video("v1").unwrap();
    assert!(!s.finish_comments(t.seq, Ok(vec![comment("early")])), "nothing to attach to yet");
    s.finish_video(t.seq, Ok(video("v1")));
    assert!(s.finish_comments(t.seq, Ok(vec![comment("hi")])));
    assert_eq!(s.video_mut().unwrap().comments, CommentsState::Loaded(vec![comment("hi")]));
  }

  #[test]
  fn comments_failure_keeps_the_video() {
    let mut s = with_results();
    let t = s.open_video("v1").unwrap();
    s.finish_video(t.seq, Ok(video("v1")));
    s.video_mut().unwrap().comments = CommentsState::Loading;
    assert!(s.finish_comments(t.seq, Err(anyhow!("HTTP 500"))));
    assert!(matches!(s.state(), ViewState::VideoDetailShown(Pane::Ready(_))));
    assert_eq!(s.video_mut().unwrap().comments, CommentsState::Unavailable);
  }

  #[test]
  fn stale_comments_are_dropped() {
    let mut s = with_results();
    let first = s.open_video("v1").unwrap();
    s.finish_video(first.seq, Ok(video("v1")));
    s.close_video();
    let second = s.open_video("v2").unwrap();
    s.finish_video(second.seq, Ok(video("v2")));
    assert!(!s.finish_comments(first.seq, Ok(vec![comment("for v1")])));
    assert_eq!(s.video_mut().unwrap().comments, CommentsState::Unavailable);
  }

  // --- Channel detail ---

  #[test]
  fn channel_modal_from_results() {
    let mut s = with_results();
    let t = s.open_channel("UC2").unwrap();
    let v = s.state().visibility();
    assert!(v.channel_detail && !v.video_detail && !v.results);
    assert!(s.finish_channel(t.seq, Ok(channel("UC2"))));
    assert!(s.close_channel());
    assert!(matches!(s.state(), ViewState::ResultsShown));
  }

  #[test]
  fn channel_replaces_video_detail() {
    let mut s = with_results();
    let v = s.open_video("v1").unwrap();
    assert_eq!(s.video_author_id(), Some("UC1"));
    let c = s.open_channel("UC1").unwrap();
    let vis = s.state().visibility();
    assert!(vis.channel_detail && !vis.video_detail);
    assert!(!s.finish_video(v.seq, Ok(video("v1"))));
    assert!(s.finish_channel(c.seq, Err(anyhow!("HTTP 500"))));
    assert!(matches!(s.state(), ViewState::ChannelDetailShown(Pane::Failed)));
    s.close_detail();
    assert!(matches!(s.state(), ViewState::ResultsShown));
  }

  #[test]
  fn channel_requires_known_author() {
    let mut s = with_results();
    assert!(s.open_channel("UC9").is_none());
    assert!(s.open_channel("").is_none());
    s.open_video("v2").unwrap();
    assert!(s.open_channel("UC1").is_none(), "only the open video's channel");
  }

  #[test]
  fn close_is_noop_outside_details() {
    let mut s = with_results();
    let seq = s.seq();
    assert!(!s.close_detail());
    assert_eq!(s.seq(), seq);
  }
}
