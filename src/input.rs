use anyhow::Result;
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        return Ok(());
      }
      KeyCode::Char('t') => {
        app.next_theme();
        return Ok(());
      }
      KeyCode::Char('s') => {
        app.stop_playback().await;
        return Ok(());
      }
      _ => {}
    }
  }

  if app.session.state().is_detail() {
    handle_detail_key(app, key).await;
    return Ok(());
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Results => handle_results_key(app, key),
  }
  Ok(())
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if !app.session.results().is_empty() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.session.results().is_empty() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.trigger_load(),
    KeyCode::Char('c') => app.trigger_channel(),
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
    KeyCode::Char('/') | KeyCode::Esc => app.mode = AppMode::Input,
    KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

async fn handle_detail_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => app.close_detail(),
    KeyCode::Char('/') => {
      app.close_detail();
      app.mode = AppMode::Input;
    }
    KeyCode::Char('c') => app.trigger_channel(),
    KeyCode::Char('o') => app.open_detail_link(),
    KeyCode::Char('p') | KeyCode::Enter => app.play_current().await,
    KeyCode::Char(']') => app.cycle_format(true),
    KeyCode::Char('[') => app.cycle_format(false),
    KeyCode::Down | KeyCode::Char('j') => app.scroll_detail(1),
    KeyCode::Up | KeyCode::Char('k') => app.scroll_detail(-1),
    KeyCode::PageDown => app.scroll_detail(10),
    KeyCode::PageUp => app.scroll_detail(-10),
    KeyCode::Home => app.detail_scroll = 0,
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::tests::{FakeIndex, app_with, settle};
  use crate::view::ViewState;
  use ratatui::crossterm::event::KeyEvent;
  use std::sync::Arc;
  use std::sync::atomic::Ordering;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  async fn type_str(app: &mut App, s: &str) {
    for c in s.chars() {
      handle_key_event(app, key(KeyCode::Char(c))).await.unwrap();
    }
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- Key routing ---

  #[tokio::test]
  async fn typing_then_enter_searches() {
    let fake = Arc::new(FakeIndex::default());
    let mut app = app_with(fake.clone());
    type_str(&mut app, "日本 rust").await;
    assert_eq!(app.input, "日本 rust");
    handle_key_event(&mut app, key(KeyCode::Home)).await.unwrap();
    handle_key_event(&mut app, key(KeyCode::Delete)).await.unwrap();
    assert_eq!(app.input, "本 rust");

    handle_key_event(&mut app, key(KeyCode::Enter)).await.unwrap();
    settle(&mut app).await;
    assert_eq!(fake.searches.load(Ordering::SeqCst), 1);
    assert_eq!(app.session.query(), "本 rust");
    assert_eq!(app.mode, AppMode::Results);
  }

  #[tokio::test]
  async fn enter_on_blank_input_issues_nothing() {
    let fake = Arc::new(FakeIndex::default());
    let mut app = app_with(fake.clone());
    type_str(&mut app, "  ").await;
    handle_key_event(&mut app, key(KeyCode::Enter)).await.unwrap();
    assert!(!app.has_pending());
    assert_eq!(fake.searches.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn detail_keys_open_and_close() {
    let mut app = app_with(Arc::new(FakeIndex::default()));
    type_str(&mut app, "rust").await;
    handle_key_event(&mut app, key(KeyCode::Enter)).await.unwrap();
    settle(&mut app).await;

    handle_key_event(&mut app, key(KeyCode::Enter)).await.unwrap();
    settle(&mut app).await;
    assert!(matches!(app.session.state(), ViewState::VideoDetailShown(_)));

    handle_key_event(&mut app, key(KeyCode::Char('j'))).await.unwrap();
    assert_eq!(app.detail_scroll, 1);

    handle_key_event(&mut app, key(KeyCode::Char('c'))).await.unwrap();
    settle(&mut app).await;
    assert!(matches!(app.session.state(), ViewState::ChannelDetailShown(_)));

    handle_key_event(&mut app, key(KeyCode::Esc)).await.unwrap();
    assert!(matches!(app.session.state(), ViewState::ResultsShown));
    assert!(!app.should_quit);
  }

  #[tokio::test]
  async fn ctrl_c_quits_from_any_mode() {
    let mut app = app_with(Arc::new(FakeIndex::default()));
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).await.unwrap();
    assert!(app.should_quit);
  }
}
