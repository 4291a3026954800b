use clap::ValueEnum;
use scraper::{Html, Node};
use serde::{Deserialize, Serialize};

/// Display language for messages and number formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
  #[default]
  En,
  Ja,
}

impl Locale {
  pub fn from_config(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "ja" | "ja-jp" | "japanese" => Locale::Ja,
      _ => Locale::En,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Locale::En => "en",
      Locale::Ja => "ja",
    }
  }

  /// Digit group separator. Both supported locales group by thousands with a comma.
  fn group_separator(self) -> char {
    match self {
      Locale::En | Locale::Ja => ',',
    }
  }
}

/// Format an integer with locale thousands grouping, e.g. `1234567` → `1,234,567`.
pub fn format_count(n: u64, locale: Locale) -> String {
  let digits = n.to_string();
  let sep = locale.group_separator();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(sep);
    }
    out.push(c);
  }
  out
}

/// Fill a `{count}` template with a grouped number.
pub fn format_count_with(template: &str, n: u64, locale: Locale) -> String {
  template.replace("{count}", &format_count(n, locale))
}

/// Flatten an HTML description into terminal text.
///
/// `<br>` and block-level closers become line breaks; everything else keeps only its text.
pub fn html_to_text(html: &str) -> String {
  let fragment = Html::parse_fragment(html);
  let mut out = String::new();
  for node in fragment.root_element().descendants() {
    match node.value() {
      Node::Text(text) => out.push_str(text),
      Node::Element(el) if el.name() == "br" => out.push('\n'),
      Node::Element(el) if matches!(el.name(), "p" | "div" | "li") && !out.is_empty() && !out.ends_with('\n') => {
        out.push('\n');
      }
      _ => {}
    }
  }
  collapse_blank_lines(out.trim())
}

fn collapse_blank_lines(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut blank_run = 0;
  for line in s.lines() {
    let line = line.trim_end();
    if line.is_empty() {
      blank_run += 1;
      if blank_run > 1 {
        continue;
      }
    } else {
      blank_run = 0;
    }
    if !out.is_empty() {
      out.push('\n');
    }
    out.push_str(line);
  }
  out
}

/// Render a comment timestamp as a date when the API provides one, otherwise the relative text.
pub fn format_published(published: Option<i64>, published_text: &str) -> String {
  published
    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
    .map(|dt| dt.format("%Y-%m-%d").to_string())
    .unwrap_or_else(|| published_text.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- format_count ---

  #[test]
  fn groups_millions() {
    assert_eq!(format_count(1_234_567, Locale::En), "1,234,567");
    assert_eq!(format_count(1_234_567, Locale::Ja), "1,234,567");
  }

  #[test]
  fn small_numbers_are_not_grouped() {
    assert_eq!(format_count(0, Locale::En), "0");
    assert_eq!(format_count(999, Locale::En), "999");
    assert_eq!(format_count(1000, Locale::En), "1,000");
  }

  #[test]
  fn view_count_template() {
    assert_eq!(format_count_with("{count} views", 12_345, Locale::En), "12,345 views");
    assert_eq!(format_count_with("{count}回", 12_345, Locale::Ja), "12,345回");
  }

  #[test]
  fn locale_from_config() {
    assert_eq!(Locale::from_config("JA"), Locale::Ja);
    assert_eq!(Locale::from_config("ja-JP"), Locale::Ja);
    assert_eq!(Locale::from_config("fr"), Locale::En);
  }

  // --- html_to_text ---

  #[test]
  fn strips_tags_and_keeps_breaks() {
    let html = r#"Line one<br>Line <a href="https://x.test">two</a><br/>End"#;
    assert_eq!(html_to_text(html), "Line one\nLine two\nEnd");
  }

  #[test]
  fn collapses_repeated_blank_lines() {
    assert_eq!(html_to_text("a<br><br><br><br>b"), "a\n\nb");
  }

  #[test]
  fn decodes_entities() {
    assert_eq!(html_to_text("Tom &amp; Jerry"), "Tom & Jerry");
  }

  // --- format_published ---

  #[test]
  fn published_prefers_timestamp() {
    assert_eq!(format_published(Some(1_700_000_000), "1 year ago"), "2023-11-14");
    assert_eq!(format_published(None, "1 year ago"), "1 year ago");
  }
}
