//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, so the message tables and
//! placeholder URLs never depend on runtime file I/O. Parsed once on first
//! access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

use crate::format::Locale;

/// User-facing strings for one locale.
#[derive(Debug, Deserialize)]
pub struct Messages {
  pub enter_query: String,
  pub searching: String,
  pub no_results: String,
  pub search_failed: String,
  pub loading_video: String,
  pub video_failed: String,
  pub loading_channel: String,
  pub channel_failed: String,
  pub no_description: String,
  pub loading_comments: String,
  pub no_comments: String,
  pub private_count: String,
  /// Template with a `{count}` placeholder.
  pub view_count: String,
  pub channel_label: String,
  pub views_label: String,
  pub subscribers_label: String,
  pub total_views_label: String,
  pub description_label: String,
  pub comments_label: String,
  pub formats_label: String,
}

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub default_instance: String,
  pub request_timeout_secs: u64,

  // Placeholders for absent thumbnails/icons
  pub placeholder_thumbnail: String,
  pub placeholder_card_icon: String,
  pub placeholder_channel_icon: String,

  // Links handed to the browser / mpv
  pub fallback_embed_base: String,
  pub watch_url_base: String,
  pub channel_url_base: String,

  // Message tables
  pub en: Messages,
  pub ja: Messages,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; a malformed file fails the first test run.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

/// Message table for the given locale.
pub fn messages(locale: Locale) -> &'static Messages {
  match locale {
    Locale::En => &constants().en,
    Locale::Ja => &constants().ja,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert!(c.default_instance.starts_with("https://"));
    assert!(c.request_timeout_secs > 0);
  }

  #[test]
  fn view_count_templates_have_placeholder() {
    assert!(messages(Locale::En).view_count.contains("{count}"));
    assert!(messages(Locale::Ja).view_count.contains("{count}"));
  }
}
