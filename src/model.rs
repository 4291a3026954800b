use serde::Deserialize;

/// Result type tag as reported by the video-index API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
  Video,
  Channel,
  Playlist,
  #[serde(untagged)]
  Other(String),
}

/// A single entry from a search response.
#[derive(Debug, Clone)]
pub struct SearchResultItem {
  pub kind: ItemKind,
  pub id: String,
  pub title: String,
  pub author: String,
  pub author_id: String,
  pub thumbnail_urls: Vec<String>,
  pub author_thumbnail_urls: Vec<String>,
}

impl SearchResultItem {
  pub fn is_video(&self) -> bool {
    self.kind == ItemKind::Video
  }
}

/// A downloadable stream, as listed by the proxy backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFormat {
  pub format_id: String,
  pub ext: String,
  pub resolution: Option<String>,
  pub height: Option<u32>,
  pub url: String,
}

impl StreamFormat {
  pub fn label(&self) -> String {
    format!("{} ({})", self.resolution.as_deref().unwrap_or(&self.format_id), self.ext)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
  pub author: String,
  pub published: Option<i64>,
  pub published_text: String,
  pub content: String,
}

/// Comments are a follow-up request; the detail view renders before they arrive and
/// stays up when they fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CommentsState {
  #[default]
  Unavailable,
  Loading,
  Loaded(Vec<Comment>),
}

#[derive(Debug, Clone)]
pub struct VideoDetail {
  pub id: String,
  pub title: String,
  pub author: String,
  pub view_count: Option<u64>,
  pub description_html: Option<String>,
  pub embed_url: String,
  /// Best quality first.
  pub formats: Vec<StreamFormat>,
  pub comments: CommentsState,
}

#[derive(Debug, Clone)]
pub struct ChannelDetail {
  pub id: String,
  pub author: String,
  pub subscriber_count: Option<u64>,
  pub view_count: Option<u64>,
  pub icon_url: Option<String>,
  pub description_html: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn item_kind_known_and_unknown() {
    let kinds: Vec<ItemKind> = serde_json::from_str(r#"["video","channel","playlist","hashtag"]"#).unwrap();
    assert_eq!(kinds, vec![ItemKind::Video, ItemKind::Channel, ItemKind::Playlist, ItemKind::Other("hashtag".into())]);
  }

  #[test]
  fn format_label_falls_back_to_id() {
    let f = StreamFormat {
      format_id: "18".into(),
      ext: "mp4".into(),
      resolution: None,
      height: None,
      url: "https://cdn.test/18".into(),
    };
    assert_eq!(f.label(), "18 (mp4)");
    let f = StreamFormat { resolution: Some("1280x720".into()), ..f };
    assert_eq!(f.label(), "1280x720 (mp4)");
  }
}
