use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
  Off,
}

impl CliDisplayMode {
  pub fn from_config(s: &str) -> Option<Self> {
    match s.to_lowercase().as_str() {
      "auto" => Some(CliDisplayMode::Auto),
      "direct" | "halfblock" | "half-block" => Some(CliDisplayMode::Direct),
      "ascii" => Some(CliDisplayMode::Ascii),
      "off" | "none" => Some(CliDisplayMode::Off),
      _ => None,
    }
  }
}

/// How thumbnails and channel icons are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  /// No images; placeholders only.
  Off,
  Ascii,
  /// True-colour half blocks, two pixel rows per cell.
  Direct,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Off => "off",
      DisplayMode::Ascii => "ascii",
      DisplayMode::Direct => "half-block",
    }
  }

  pub fn shows_images(self) -> bool {
    self != DisplayMode::Off
  }
}

/// Pick half blocks when the terminal advertises true colour, ASCII otherwise.
pub fn detect_display_mode(colorterm: &str) -> DisplayMode {
  match colorterm.to_lowercase().as_str() {
    "truecolor" | "24bit" => DisplayMode::Direct,
    _ => DisplayMode::Ascii,
  }
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(&std::env::var("COLORTERM").unwrap_or_default()),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
    CliDisplayMode::Off => DisplayMode::Off,
  }
}
