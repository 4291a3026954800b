//! Video-index API clients.
//!
//! Two backends speak the same [`VideoIndex`] trait: a public Invidious-compatible
//! instance (`/api/v1/...`) and a local proxy (`/search`, `/video_info`, `/comments`)
//! that wraps one. Responses are decoded leniently: missing optional fields fall back
//! to defaults instead of failing the whole request.

use anyhow::{Context, Result, anyhow};
use futures::future::{BoxFuture, FutureExt};
use image::DynamicImage;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

use crate::constants::constants;
use crate::model::{ChannelDetail, Comment, CommentsState, ItemKind, SearchResultItem, StreamFormat, VideoDetail};

/// Future returned by every [`VideoIndex`] call. `'static` so it can be handed to `tokio::spawn`.
pub type ApiFuture<T> = BoxFuture<'static, Result<T>>;

/// The remote service the controllers talk to.
pub trait VideoIndex: Send + Sync {
  /// Short description of the backend for the header line.
  fn label(&self) -> String;
  fn search(&self, query: &str) -> ApiFuture<Vec<SearchResultItem>>;
  fn video(&self, id: &str) -> ApiFuture<VideoDetail>;
  fn channel(&self, id: &str) -> ApiFuture<ChannelDetail>;
  fn comments(&self, id: &str) -> ApiFuture<Vec<Comment>>;
  fn image(&self, url: &str) -> ApiFuture<DynamicImage>;
}

pub fn http_client() -> Result<Client> {
  Client::builder()
    .timeout(Duration::from_secs(constants().request_timeout_secs))
    .user_agent(concat!("ivs/", env!("CARGO_PKG_VERSION")))
    .build()
    .context("Failed to build HTTP client")
}

fn parse_base(base: &str) -> Result<Url> {
  let url = Url::parse(base.trim()).with_context(|| format!("Invalid base URL: {}", base))?;
  if url.cannot_be_a_base() {
    return Err(anyhow!("URL cannot be used as an API base: {}", base));
  }
  Ok(url)
}

/// Append path segments (percent-encoded) to a base URL.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|_| anyhow!("URL cannot be used as an API base: {}", base))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}

fn with_query(mut url: Url, key: &str, value: &str) -> Url {
  url.query_pairs_mut().append_pair(key, value);
  url
}

/// Resolve protocol-relative (`//host/x`) and instance-relative (`/x`) asset URLs.
fn absolutize(base: &Url, raw: &str) -> String {
  if raw.starts_with("//") {
    format!("https:{}", raw)
  } else if raw.starts_with('/') {
    base.join(raw).map(|u| u.to_string()).unwrap_or_else(|_| raw.to_string())
  } else {
    raw.to_string()
  }
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: Url) -> Result<T> {
  debug!(url = %url, "api: GET");
  let response = client.get(url.clone()).send().await.with_context(|| format!("Request to {} failed", url))?;
  let response = response.error_for_status().with_context(|| format!("{} returned an error status", url))?;
  response.json::<T>().await.with_context(|| format!("Failed to decode JSON from {}", url))
}

async fn fetch_image(client: &Client, url: &str) -> Result<DynamicImage> {
  let response = client.get(url).send().await.with_context(|| format!("Failed to fetch image {}", url))?;
  let response = response.error_for_status().with_context(|| format!("{} returned an error status", url))?;
  let bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode image from memory (URL: {})", url))
}

/// Height in pixels from strings like `1280x720`, `720p`, `720p60` or `720`.
pub fn parse_height(resolution: &str) -> Option<u32> {
  let r = resolution.trim();
  let tail = r.rsplit_once('x').map_or(r, |(_, h)| h);
  let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
  digits.parse().ok()
}

fn sort_best_first(formats: &mut [StreamFormat]) {
  formats.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));
}

// --- Wire types ---

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A string field where `null` or any other non-string becomes empty. Numbers keep their text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
  Ok(match serde_json::Value::deserialize(deserializer)? {
    serde_json::Value::String(s) => s,
    serde_json::Value::Number(n) => n.to_string(),
    _ => String::new(),
  })
}

/// Thumbnail lists keep the entries that decode; `null` or a non-array is an empty list.
fn lenient_thumbnails<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<WireThumbnail>, D::Error> {
  Ok(match serde_json::Value::deserialize(deserializer)? {
    serde_json::Value::Array(items) => items.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect(),
    _ => Vec::new(),
  })
}

#[derive(Debug, Deserialize)]
struct WireThumbnail {
  #[serde(default, deserialize_with = "lenient_string")]
  url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSearchItem {
  #[serde(rename = "type")]
  kind: Option<ItemKind>,
  #[serde(default, deserialize_with = "lenient_string")]
  title: String,
  #[serde(default, deserialize_with = "lenient_string")]
  author: String,
  #[serde(default, deserialize_with = "lenient_string")]
  author_id: String,
  video_id: Option<String>,
  playlist_id: Option<String>,
  #[serde(default, deserialize_with = "lenient_thumbnails")]
  video_thumbnails: Vec<WireThumbnail>,
  #[serde(default, deserialize_with = "lenient_thumbnails")]
  author_thumbnails: Vec<WireThumbnail>,
}

impl WireSearchItem {
  fn into_item(self, base: &Url) -> SearchResultItem {
    let id = self.video_id.or(self.playlist_id).unwrap_or_else(|| self.author_id.clone());
    let urls = |thumbs: Vec<WireThumbnail>| -> Vec<String> {
      thumbs.into_iter().filter(|t| !t.url.is_empty()).map(|t| absolutize(base, &t.url)).collect()
    };
    SearchResultItem {
      kind: self.kind.unwrap_or_else(|| ItemKind::Other(String::new())),
      id,
      title: self.title,
      author: self.author,
      author_id: self.author_id,
      thumbnail_urls: urls(self.video_thumbnails),
      author_thumbnail_urls: urls(self.author_thumbnails),
    }
  }
}

/// Decode each element on its own so one malformed entry doesn't sink the whole response.
fn decode_items(raw: Vec<serde_json::Value>, base: &Url) -> Vec<SearchResultItem> {
  raw
    .into_iter()
    .filter_map(|v| match serde_json::from_value::<WireSearchItem>(v) {
      Ok(item) => Some(item.into_item(base)),
      Err(e) => {
        debug!(err = %e, "api: skipping undecodable search item");
        None
      }
    })
    .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFormatStream {
  #[serde(default, deserialize_with = "lenient_string")]
  url: String,
  #[serde(default, deserialize_with = "lenient_string")]
  itag: String,
  container: Option<String>,
  quality_label: Option<String>,
  resolution: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVideo {
  #[serde(default, deserialize_with = "lenient_string")]
  title: String,
  #[serde(default, deserialize_with = "lenient_string")]
  author: String,
  view_count: Option<u64>,
  description_html: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  format_streams: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChannel {
  #[serde(default, deserialize_with = "lenient_string")]
  author: String,
  sub_count: Option<u64>,
  view_count: Option<u64>,
  #[serde(default, deserialize_with = "lenient_thumbnails")]
  author_thumbnails: Vec<WireThumbnail>,
  description_html: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireComment {
  #[serde(default, deserialize_with = "lenient_string")]
  author: String,
  published: Option<i64>,
  #[serde(default, deserialize_with = "lenient_string")]
  published_text: String,
  #[serde(default, deserialize_with = "lenient_string")]
  content: String,
}

#[derive(Debug, Deserialize)]
struct WireComments {
  #[serde(default, deserialize_with = "null_as_default")]
  comments: Vec<WireComment>,
  error: Option<String>,
}

impl WireComments {
  fn into_comments(self) -> Result<Vec<Comment>> {
    if let Some(err) = self.error {
      return Err(anyhow!("Comments endpoint reported an error: {}", err));
    }
    Ok(
      self
        .comments
        .into_iter()
        .map(|c| Comment { author: c.author, published: c.published, published_text: c.published_text, content: c.content })
        .collect(),
    )
  }
}

/// Proxy search responses come as a bare array, an `{items}` wrapper, or an `{error}` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProxySearch {
  List(Vec<serde_json::Value>),
  Wrapped { items: Vec<serde_json::Value> },
  Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct ProxyFormat {
  #[serde(default)]
  format_id: Option<String>,
  #[serde(default, deserialize_with = "lenient_string")]
  ext: String,
  /// Either a `WxH` string, a bare height number, or a format note.
  #[serde(default)]
  resolution: Option<serde_json::Value>,
  #[serde(default)]
  url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProxyVideo {
  #[serde(default)]
  title: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  formats: Vec<ProxyFormat>,
  error: Option<String>,
}

// --- Invidious ---

/// Client for an Invidious-compatible instance.
#[derive(Clone)]
pub struct InvidiousClient {
  client: Client,
  base: Url,
}

impl InvidiousClient {
  pub fn new(client: Client, base: &str) -> Result<Self> {
    Ok(Self { client, base: parse_base(base)? })
  }

  fn api(&self, segments: &[&str]) -> Result<Url> {
    let mut all = vec!["api", "v1"];
    all.extend_from_slice(segments);
    endpoint(&self.base, &all)
  }

  pub fn search_url(&self, query: &str) -> Result<Url> {
    Ok(with_query(self.api(&["search"])?, "q", query))
  }

  pub fn embed_url(&self, id: &str) -> Result<Url> {
    endpoint(&self.base, &["embed", id])
  }

  fn video_from_wire(&self, id: &str, wire: WireVideo) -> Result<VideoDetail> {
    let mut formats: Vec<StreamFormat> = wire
      .format_streams
      .into_iter()
      .filter_map(|v| serde_json::from_value::<WireFormatStream>(v).ok())
      .filter(|f| !f.url.is_empty())
      .map(|f| {
        let resolution = f.quality_label.or(f.resolution);
        StreamFormat {
          height: resolution.as_deref().and_then(parse_height),
          format_id: f.itag,
          ext: f.container.unwrap_or_else(|| "mp4".to_string()),
          resolution,
          url: absolutize(&self.base, &f.url),
        }
      })
      .collect();
    sort_best_first(&mut formats);
    Ok(VideoDetail {
      id: id.to_string(),
      title: wire.title,
      author: wire.author,
      view_count: wire.view_count,
      description_html: wire.description_html.filter(|d| !d.trim().is_empty()),
      embed_url: self.embed_url(id)?.to_string(),
      formats,
      comments: CommentsState::Unavailable,
    })
  }

  fn channel_from_wire(&self, id: &str, wire: WireChannel) -> ChannelDetail {
    ChannelDetail {
      id: id.to_string(),
      author: wire.author,
      subscriber_count: wire.sub_count,
      view_count: wire.view_count,
      icon_url: wire.author_thumbnails.into_iter().find(|t| !t.url.is_empty()).map(|t| absolutize(&self.base, &t.url)),
      description_html: wire.description_html.filter(|d| !d.trim().is_empty()),
    }
  }
}

impl VideoIndex for InvidiousClient {
  fn label(&self) -> String {
    self.base.host_str().unwrap_or("invidious").to_string()
  }

  fn search(&self, query: &str) -> ApiFuture<Vec<SearchResultItem>> {
    let this = self.clone();
    let query = query.to_string();
    async move {
      let url = this.search_url(&query)?;
      let raw: Vec<serde_json::Value> = get_json(&this.client, url).await?;
      Ok(decode_items(raw, &this.base))
    }
    .boxed()
  }

  fn video(&self, id: &str) -> ApiFuture<VideoDetail> {
    let this = self.clone();
    let id = id.to_string();
    async move {
      let wire: WireVideo = get_json(&this.client, this.api(&["videos", id.as_str()])?).await?;
      this.video_from_wire(&id, wire)
    }
    .boxed()
  }

  fn channel(&self, id: &str) -> ApiFuture<ChannelDetail> {
    let this = self.clone();
    let id = id.to_string();
    async move {
      let wire: WireChannel = get_json(&this.client, this.api(&["channels", id.as_str()])?).await?;
      Ok(this.channel_from_wire(&id, wire))
    }
    .boxed()
  }

  fn comments(&self, id: &str) -> ApiFuture<Vec<Comment>> {
    let this = self.clone();
    let id = id.to_string();
    async move {
      let wire: WireComments = get_json(&this.client, this.api(&["comments", id.as_str()])?).await?;
      wire.into_comments()
    }
    .boxed()
  }

  fn image(&self, url: &str) -> ApiFuture<DynamicImage> {
    let client = self.client.clone();
    let url = url.to_string();
    async move { fetch_image(&client, &url).await }.boxed()
  }
}

// --- Local proxy ---

/// Client for a local proxy exposing `/search`, `/video_info` and `/comments`.
#[derive(Clone)]
pub struct ProxyClient {
  client: Client,
  base: Url,
}

impl ProxyClient {
  pub fn new(client: Client, base: &str) -> Result<Self> {
    Ok(Self { client, base: parse_base(base)? })
  }

  fn video_from_wire(&self, id: &str, wire: ProxyVideo) -> Result<VideoDetail> {
    if let Some(err) = wire.error {
      return Err(anyhow!("Proxy reported an error: {}", err));
    }
    let mut formats: Vec<StreamFormat> = wire
      .formats
      .into_iter()
      .filter_map(|f| {
        let url = f.url.filter(|u| !u.is_empty())?;
        let resolution = match f.resolution {
          Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
          Some(serde_json::Value::Number(n)) => Some(format!("{}p", n)),
          _ => None,
        };
        Some(StreamFormat {
          height: resolution.as_deref().and_then(parse_height),
          format_id: f.format_id.unwrap_or_default(),
          ext: f.ext,
          resolution,
          url,
        })
      })
      .collect();
    sort_best_first(&mut formats);
    Ok(VideoDetail {
      id: id.to_string(),
      title: wire.title.unwrap_or_else(|| id.to_string()),
      author: String::new(),
      view_count: None,
      description_html: None,
      embed_url: format!("{}/{}", constants().fallback_embed_base.trim_end_matches('/'), id),
      formats,
      comments: CommentsState::Unavailable,
    })
  }
}

impl VideoIndex for ProxyClient {
  fn label(&self) -> String {
    format!("proxy {}", self.base.host_str().unwrap_or("local"))
  }

  fn search(&self, query: &str) -> ApiFuture<Vec<SearchResultItem>> {
    let this = self.clone();
    let query = query.to_string();
    async move {
      let url = with_query(endpoint(&this.base, &["search"])?, "q", &query);
      match get_json::<ProxySearch>(&this.client, url).await? {
        ProxySearch::List(raw) | ProxySearch::Wrapped { items: raw } => Ok(decode_items(raw, &this.base)),
        ProxySearch::Failed { error } => Err(anyhow!("Proxy reported an error: {}", error)),
      }
    }
    .boxed()
  }

  fn video(&self, id: &str) -> ApiFuture<VideoDetail> {
    let this = self.clone();
    let id = id.to_string();
    async move {
      let url = with_query(endpoint(&this.base, &["video_info"])?, "id", &id);
      let wire: ProxyVideo = get_json(&this.client, url).await?;
      this.video_from_wire(&id, wire)
    }
    .boxed()
  }

  fn channel(&self, _id: &str) -> ApiFuture<ChannelDetail> {
    futures::future::ready(Err(anyhow!("Channel lookup is not supported by the proxy backend"))).boxed()
  }

  fn comments(&self, id: &str) -> ApiFuture<Vec<Comment>> {
    let this = self.clone();
    let id = id.to_string();
    async move {
      let url = with_query(endpoint(&this.base, &["comments"])?, "id", &id);
      let wire: WireComments = get_json(&this.client, url).await?;
      wire.into_comments()
    }
    .boxed()
  }

  fn image(&self, url: &str) -> ApiFuture<DynamicImage> {
    let client = self.client.clone();
    let url = url.to_string();
    async move { fetch_image(&client, &url).await }.boxed()
  }
}
