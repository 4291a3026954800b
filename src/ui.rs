use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Flex, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::constants::Messages;
use crate::graphics::ImageWidget;
use crate::render::{Card, ChannelPanel, ChannelView, Notice, ResultsView, Tone, VideoPanel, VideoView};
use crate::theme::Theme;
use crate::view::{Pane, ViewState};

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` columns, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  use unicode_width::UnicodeWidthChar;
  if display_width(s, usize::MAX) <= max_width {
    return s.to_string();
  }
  let budget = max_width.saturating_sub(1);
  let mut used = 0;
  let truncated: String = s
    .chars()
    .take_while(|c| {
      used += c.width().unwrap_or(0);
      used <= budget
    })
    .collect();
  format!("{}…", truncated)
}

fn panel_block<'a>(title: impl Into<Line<'a>>, theme: &Theme) -> Block<'a> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1))
}

fn field<'a>(label: &str, value: &'a str, theme: &Theme) -> Line<'a> {
  Line::from(vec![
    Span::styled(format!("{:<12}", label), Style::default().fg(theme.muted)),
    Span::styled(value, Style::default().fg(theme.fg)),
  ])
}

fn section<'a>(label: &str, theme: &Theme) -> Line<'a> {
  Line::from(Span::styled(label.to_string(), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)))
}

fn text_lines<'a>(text: &'a str, theme: &Theme) -> Vec<Line<'a>> {
  text.lines().map(|l| Line::from(Span::styled(l, Style::default().fg(theme.fg)))).collect()
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(Span::styled(" ▶ ivs ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let info = format!("{} · {} · v{} ", app.backend_label(), app.locale.label(), env!("CARGO_PKG_VERSION"));
  let width = display_width(&info, usize::MAX) as u16;
  let right = Line::from(Span::styled(info, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let screen = app.screen();
  if let Some(results) = screen.results {
    match results {
      ResultsView::Welcome => render_welcome(frame, app.theme(), area),
      ResultsView::Notice(notice) => render_notice(frame, app.theme(), &notice, area),
      ResultsView::Cards(cards) => render_results(frame, app, &cards, area),
    }
  }
  if let Some(video) = screen.video {
    render_video(frame, app, &video, area);
  }
  if let Some(channel) = screen.channel {
    render_channel(frame, app, &channel, area);
  }
}

fn render_welcome(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▶  ivs", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Search a video index from the terminal.", Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled("Type a query below and press Enter.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_notice(frame: &mut Frame, theme: &Theme, notice: &Notice, area: Rect) {
  let color = match notice.tone {
    Tone::Info => theme.fg,
    Tone::Error => theme.error,
  };
  let text = vec![Line::from(""), Line::from(Span::styled(notice.text.as_str(), Style::default().fg(color)))];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(
    Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &mut App, cards: &[Card], area: Rect) {
  let theme = app.theme();
  let [list_area, preview_area] = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = list_area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = cards
    .iter()
    .enumerate()
    .map(|(i, card)| {
      let is_selected = Some(i) == app.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let author_w = display_width(&card.author, usize::MAX).min(inner_w / 3);
      let title = truncate_str(&card.title, inner_w.saturating_sub(author_w + 2));
      let author = truncate_str(&card.author, author_w);
      let gap = inner_w.saturating_sub(display_width(&title, usize::MAX) + display_width(&author, usize::MAX));
      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(author, Style::default().fg(if is_selected { fg } else { theme.muted })),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let title = format!(" Results · {} · {} ", app.session.query(), cards.len());
  let list = List::new(items)
    .block(panel_block(title, theme).padding(Padding::ZERO))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, list_area, &mut app.list_state);

  let selected = app.list_state.selected().and_then(|i| cards.get(i));
  render_preview(frame, app, selected, preview_area);
}

fn render_preview(frame: &mut Frame, app: &mut App, card: Option<&Card>, area: Rect) {
  let theme = app.theme();
  let m = app.messages();
  let block = panel_block(" Preview ", theme);
  let inner = block.inner(area);
  frame.render_widget(block, area);
  let Some(card) = card else { return };

  let thumb_h = ((inner.width as u32 * 9 / 32) as u16).min(inner.height.saturating_sub(4));
  let [thumb_area, info_area] = Layout::vertical([Constraint::Length(thumb_h), Constraint::Min(0)]).areas(inner);

  let mode = app.display_mode;
  if mode.shows_images()
    && let Some(image) = app.images.fitted(&card.thumbnail_url, thumb_area, mode)
  {
    frame.render_widget(ImageWidget { image, display_mode: mode }, thumb_area);
  }

  let w = info_area.width as usize;
  let lines = vec![
    Line::from(""),
    Line::from(Span::styled(card.title.as_str(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    field(&m.channel_label, &card.author, theme),
    Line::from(Span::styled(truncate_str(&card.thumbnail_url, w), Style::default().fg(theme.link))),
    Line::from(Span::styled(truncate_str(&card.channel_icon_url, w), Style::default().fg(theme.muted))),
  ];
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), info_area);
}

fn render_video(frame: &mut Frame, app: &App, view: &VideoView, area: Rect) {
  let theme = app.theme();
  let m = app.messages();
  match view {
    VideoView::Loading(text) => render_notice(frame, theme, &Notice { text: text.clone(), tone: Tone::Info }, area),
    VideoView::Failed(text) => render_notice(frame, theme, &Notice { text: text.clone(), tone: Tone::Error }, area),
    VideoView::Ready(panel) => {
      let lines = video_lines(panel, app.format_index, m, theme);
      let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0))
        .block(panel_block(format!(" {} ", panel.title), theme));
      frame.render_widget(paragraph, area);
    }
  }
}

fn video_lines<'a>(panel: &'a VideoPanel, format_index: usize, m: &Messages, theme: &Theme) -> Vec<Line<'a>> {
  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(panel.title.as_str(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(
      panel.embed_url.as_str(),
      Style::default().fg(theme.link).add_modifier(Modifier::UNDERLINED),
    )),
    Line::from(""),
    field(&m.channel_label, &panel.author, theme),
    field(&m.views_label, &panel.views, theme),
    Line::from(""),
    section(&m.description_label, theme),
  ];
  lines.extend(text_lines(&panel.description, theme));

  if !panel.formats.is_empty() {
    lines.push(Line::from(""));
    lines.push(section(&m.formats_label, theme));
    for (i, label) in panel.formats.iter().enumerate() {
      let (marker, style) = if i == format_index {
        ("▶ ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
      } else {
        ("  ", Style::default().fg(theme.muted))
      };
      lines.push(Line::from(Span::styled(format!("{}{}", marker, label), style)));
    }
  }

  lines.push(Line::from(""));
  lines.push(section(&m.comments_label, theme));
  match &panel.comments {
    Ok(comments) => {
      for c in comments {
        lines.push(Line::from(vec![
          Span::styled(c.author.as_str(), Style::default().fg(theme.accent)),
          Span::styled(format!("  {}", c.date), Style::default().fg(theme.muted)),
        ]));
        lines.extend(text_lines(&c.content, theme));
        lines.push(Line::from(""));
      }
    }
    Err(fallback) => lines.push(Line::from(Span::styled(fallback.as_str(), Style::default().fg(theme.muted)))),
  }
  lines
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center).areas(area);
  let [cell] = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center).areas(row);
  cell
}

fn render_channel(frame: &mut Frame, app: &mut App, view: &ChannelView, area: Rect) {
  let theme = app.theme();
  let m = app.messages();
  let modal = centered(area, 70, 70);
  frame.render_widget(Clear, modal);

  let block = panel_block(format!(" {} ", m.channel_label), theme).style(Style::default().bg(theme.bg));
  let panel = match view {
    ChannelView::Loading(text) | ChannelView::Failed(text) => {
      let color = if matches!(view, ChannelView::Failed(_)) { theme.error } else { theme.fg };
      let text = vec![Line::from(""), Line::from(Span::styled(text.as_str(), Style::default().fg(color)))];
      frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), modal);
      return;
    }
    ChannelView::Ready(panel) => panel,
  };

  let inner = block.inner(modal);
  frame.render_widget(block, modal);
  let icon_w = if app.display_mode.shows_images() { inner.width / 4 } else { 0 };
  let [icon_area, text_area] = Layout::horizontal([Constraint::Length(icon_w), Constraint::Min(0)]).areas(inner);

  let mode = app.display_mode;
  let icon_area = Rect { height: icon_area.height.min(icon_area.width / 2), ..icon_area };
  if let Some(image) = app.images.fitted(&panel.icon_url, icon_area, mode) {
    frame.render_widget(ImageWidget { image, display_mode: mode }, icon_area);
  }

  let paragraph = Paragraph::new(channel_lines(panel, m, theme))
    .wrap(Wrap { trim: false })
    .scroll((app.detail_scroll, 0))
    .block(Block::default().padding(Padding::left(1)));
  frame.render_widget(paragraph, text_area);
}

fn channel_lines<'a>(panel: &'a ChannelPanel, m: &Messages, theme: &Theme) -> Vec<Line<'a>> {
  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(panel.name.as_str(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    field(&m.subscribers_label, &panel.subscribers, theme),
    field(&m.total_views_label, &panel.views, theme),
    Line::from(""),
    section(&m.description_label, theme),
  ];
  lines.extend(text_lines(&panel.description, theme));
  lines
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(playing) = &app.player.now_playing {
    (format!(" ♪ {}", playing.title), Style::default().fg(theme.status))
  } else {
    (format!(" {}", app.session.state().label()), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Input && !app.session.state().is_detail();
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  app.input_scroll = scroll_to_cursor(cursor_col, app.input_scroll, inner_w);

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if focused {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y + 1));
  }
}

/// Horizontal scroll that keeps the cursor column inside a field `inner_w` columns wide.
fn scroll_to_cursor(cursor_col: usize, scroll: usize, inner_w: usize) -> usize {
  if cursor_col < scroll {
    cursor_col
  } else if cursor_col >= scroll + inner_w {
    (cursor_col + 1).saturating_sub(inner_w.max(1))
  } else {
    scroll
  }
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  let has_results = !app.session.results().is_empty();
  let mut k = match app.session.state() {
    ViewState::VideoDetailShown(pane) => {
      let mut k = vec![("Esc", "Close")];
      if app.session.video_author_id().is_some() {
        k.push(("c", "Channel"));
      }
      if let Pane::Ready(video) = pane {
        k.extend([("o", "Browser"), ("p", "Play")]);
        if video.formats.len() > 1 {
          k.push(("[/]", "Format"));
        }
        k.push(("j/k", "Scroll"));
      }
      k
    }
    ViewState::ChannelDetailShown(pane) => {
      let mut k = vec![("Esc", "Close")];
      if matches!(pane, Pane::Ready(_)) {
        k.extend([("o", "Browser"), ("j/k", "Scroll")]);
      }
      k
    }
    _ => match app.mode {
      AppMode::Input => {
        let mut k = vec![("Enter", "Search")];
        if has_results {
          k.push(("↓", "Results"));
        } else {
          k.push(("Esc", "Quit"));
        }
        k
      }
      AppMode::Results => vec![("Enter", "Open"), ("c", "Channel"), ("j/k", "Navigate"), ("Esc", "Search")],
    }
  };
  if app.player.is_playing() {
    k.push(("^s", "Stop"));
  }
  k.push(("^t", "Theme"));
  k
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} · {} ", app.display_mode.label(), theme.name);
  let width = theme_label.len() as u16;
  let right = Line::from(Span::styled(theme_label, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::{FakeIndex, app_with, settle};
  use ratatui::{Terminal, backend::TestBackend};
  use std::sync::Arc;

  fn draw(app: &mut App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|f| ui(f, app)).unwrap();
    let buffer = terminal.backend().buffer();
    buffer.content().iter().map(|c| c.symbol()).collect()
  }

  #[test]
  fn truncate_keeps_short_strings() {
    assert_eq!(truncate_str("hello", 10), "hello");
    assert_eq!(truncate_str("hello world", 6), "hello…");
  }

  #[test]
  fn truncate_counts_wide_chars() {
    assert_eq!(truncate_str("日本語のタイトル", 7), "日本語…");
  }

  #[test]
  fn input_scroll_follows_cursor() {
    assert_eq!(scroll_to_cursor(3, 0, 10), 0);
    assert_eq!(scroll_to_cursor(12, 0, 10), 3);
    assert_eq!(scroll_to_cursor(2, 5, 10), 2);
  }

  #[test]
  fn input_scroll_with_no_room_stays_on_cursor() {
    assert_eq!(scroll_to_cursor(0, 0, 0), 0);
    assert_eq!(scroll_to_cursor(7, 0, 0), 7);
    assert_eq!(scroll_to_cursor(7, 7, 0), 7);
  }

  #[tokio::test]
  async fn narrow_terminal_draws_without_panicking() {
    let mut app = app_with(Arc::new(FakeIndex::default()));
    app.input = "rust".to_string();
    app.cursor_position = 4;
    let mut terminal = Terminal::new(TestBackend::new(3, 12)).unwrap();
    terminal.draw(|f| ui(f, &mut app)).unwrap();
    assert_eq!(app.input_scroll, 4);
  }

  #[test]
  fn display_width_of_prefix() {
    assert_eq!(display_width("aé日", 3), 4);
    assert_eq!(display_width("aé日", 1), 1);
  }

  #[tokio::test]
  async fn draws_welcome_then_cards() {
    let mut app = app_with(Arc::new(FakeIndex::default()));
    assert!(draw(&mut app).contains("Type a query below"));

    app.input = "rust".to_string();
    app.trigger_search();
    settle(&mut app).await;
    let out = draw(&mut app);
    assert!(out.contains("Title v1"));
    assert!(out.contains("Title v3"));
    assert!(!out.contains("Title PL1"));
  }

  #[tokio::test]
  async fn draws_video_detail() {
    let mut app = app_with(Arc::new(FakeIndex::default()));
    app.input = "rust".to_string();
    app.trigger_search();
    settle(&mut app).await;
    app.trigger_load();
    settle(&mut app).await;
    let out = draw(&mut app);
    assert!(out.contains("1,234,567 views"));
    assert!(out.contains("https://iv.test/embed/v1"));
  }

  fn has(keys: &[(&str, &str)], key: &str) -> bool {
    keys.iter().any(|(k, _)| *k == key)
  }

  async fn searched() -> App {
    let mut app = app_with(Arc::new(FakeIndex::default()));
    app.input = "rust".to_string();
    app.trigger_search();
    settle(&mut app).await;
    app
  }

  #[tokio::test]
  async fn footer_while_video_loads() {
    let mut app = searched().await;
    app.trigger_load();
    let keys = footer_keys(&app);
    assert!(has(&keys, "Esc") && has(&keys, "c"));
    assert!(!has(&keys, "p") && !has(&keys, "o"));
  }

  #[tokio::test]
  async fn footer_for_ready_video() {
    let mut app = searched().await;
    app.trigger_load();
    settle(&mut app).await;
    let keys = footer_keys(&app);
    assert!(has(&keys, "c") && has(&keys, "o") && has(&keys, "p") && has(&keys, "j/k"));
    assert!(!has(&keys, "[/]"), "single format list has nothing to cycle");

    app.close_detail();
    app.select_previous();
    app.trigger_load();
    settle(&mut app).await;
    assert!(has(&footer_keys(&app), "[/]"));
  }

  #[tokio::test]
  async fn footer_for_failed_video() {
    let mut app = searched().await;
    app.select_next();
    app.trigger_load();
    settle(&mut app).await;
    let keys = footer_keys(&app);
    assert!(has(&keys, "Esc") && has(&keys, "c"));
    assert!(!has(&keys, "o") && !has(&keys, "p"));
  }

  #[tokio::test]
  async fn footer_for_channel_modal() {
    let mut app = searched().await;
    app.trigger_channel();
    settle(&mut app).await;
    let keys = footer_keys(&app);
    assert!(has(&keys, "Esc") && has(&keys, "o"));
    assert!(!has(&keys, "c") && !has(&keys, "p"));

    app.close_detail();
    app.select_next();
    app.trigger_channel();
    settle(&mut app).await;
    let keys = footer_keys(&app);
    assert!(has(&keys, "Esc"));
    assert!(!has(&keys, "o"), "failed channel has no link");
  }

  #[tokio::test]
  async fn footer_outside_details() {
    let app = app_with(Arc::new(FakeIndex::default()));
    let keys = footer_keys(&app);
    assert!(has(&keys, "Enter") && has(&keys, "Esc"));
    assert!(!has(&keys, "c"));

    let app = searched().await;
    let keys = footer_keys(&app);
    assert_eq!(app.mode, AppMode::Results);
    assert!(has(&keys, "c") && has(&keys, "j/k"));
  }
}
