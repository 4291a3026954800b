use crate::model::{ChannelDetail, VideoDetail};

/// Content of a detail panel while its request is outstanding or after it settled.
#[derive(Debug, Clone)]
pub enum Pane<T> {
  Loading,
  Ready(T),
  Failed,
}

impl<T> Pane<T> {
  pub fn ready(&self) -> Option<&T> {
    match self {
      Pane::Ready(t) => Some(t),
      _ => None,
    }
  }
}

/// Which screen the controller is on. Exactly one at a time.
#[derive(Debug, Clone, Default)]
pub enum ViewState {
  #[default]
  Idle,
  Searching,
  ResultsShown,
  VideoDetailShown(Pane<VideoDetail>),
  ChannelDetailShown(Pane<ChannelDetail>),
  Error,
}

/// Which containers are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
  pub results: bool,
  pub video_detail: bool,
  pub channel_detail: bool,
}

impl ViewState {
  /// Derive container visibility from the single state value.
  ///
  /// The results container doubles as the message area, so it is visible in every state
  /// except the two detail states. A detail state shows its own container and nothing else.
  pub fn visibility(&self) -> Visibility {
    match self {
      ViewState::VideoDetailShown(_) => Visibility { results: false, video_detail: true, channel_detail: false },
      ViewState::ChannelDetailShown(_) => Visibility { results: false, video_detail: false, channel_detail: true },
      ViewState::Idle | ViewState::Searching | ViewState::ResultsShown | ViewState::Error => {
        Visibility { results: true, video_detail: false, channel_detail: false }
      }
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ViewState::Idle => "idle",
      ViewState::Searching => "searching",
      ViewState::ResultsShown => "results",
      ViewState::VideoDetailShown(_) => "video",
      ViewState::ChannelDetailShown(_) => "channel",
      ViewState::Error => "error",
    }
  }

  pub fn is_detail(&self) -> bool {
    matches!(self, ViewState::VideoDetailShown(_) | ViewState::ChannelDetailShown(_))
  }
}
