use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub key_fg: Color,
  pub key_bg: Color,
  pub link: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "dusk",
    bg: Color::Rgb(24, 24, 32),
    fg: Color::Rgb(220, 220, 230),
    muted: Color::Rgb(130, 130, 150),
    accent: Color::Rgb(255, 110, 110),
    border: Color::Rgb(70, 70, 90),
    status: Color::Rgb(240, 200, 110),
    error: Color::Rgb(255, 90, 90),
    highlight_fg: Color::Rgb(24, 24, 32),
    highlight_bg: Color::Rgb(255, 110, 110),
    stripe_bg: Color::Rgb(30, 30, 40),
    key_fg: Color::Rgb(24, 24, 32),
    key_bg: Color::Rgb(130, 130, 150),
    link: Color::Rgb(120, 180, 255),
  },
  Theme {
    name: "paper",
    bg: Color::Rgb(250, 248, 240),
    fg: Color::Rgb(40, 40, 40),
    muted: Color::Rgb(120, 115, 105),
    accent: Color::Rgb(200, 60, 60),
    border: Color::Rgb(200, 195, 185),
    status: Color::Rgb(170, 110, 20),
    error: Color::Rgb(200, 30, 30),
    highlight_fg: Color::Rgb(250, 248, 240),
    highlight_bg: Color::Rgb(200, 60, 60),
    stripe_bg: Color::Rgb(242, 238, 228),
    key_fg: Color::Rgb(250, 248, 240),
    key_bg: Color::Rgb(120, 115, 105),
    link: Color::Rgb(30, 90, 180),
  },
  Theme {
    name: "terminal",
    bg: Color::Reset,
    fg: Color::Reset,
    muted: Color::DarkGray,
    accent: Color::Cyan,
    border: Color::DarkGray,
    status: Color::Yellow,
    error: Color::Red,
    highlight_fg: Color::Black,
    highlight_bg: Color::Cyan,
    stripe_bg: Color::Reset,
    key_fg: Color::Black,
    key_bg: Color::Gray,
    link: Color::Blue,
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name == n)).unwrap_or(0)
}
