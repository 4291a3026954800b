use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

// --- Image Widget ---

/// Draws an image that was already scaled with [`fit_to_area`].
pub struct ImageWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_RAMP: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

impl Widget for ImageWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_half_blocks(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
      DisplayMode::Off => {}
    }
  }
}

/// Pixel size an image must have to fill `area` in the given mode.
pub fn pixel_size(area: Rect, mode: DisplayMode) -> (u32, u32) {
  let w = area.width as u32;
  let h = match mode {
    DisplayMode::Direct => area.height as u32 * 2,
    DisplayMode::Ascii | DisplayMode::Off => area.height as u32,
  };
  (w.max(1), h.max(1))
}

/// Scale an image to fit inside `area`, keeping its aspect ratio.
///
/// Terminal cells are roughly twice as tall as wide, so ASCII output squashes the source
/// height by half before fitting.
pub fn fit_to_area(image: &DynamicImage, area: Rect, mode: DisplayMode) -> DynamicImage {
  let (w, h) = pixel_size(area, mode);
  match mode {
    DisplayMode::Ascii => {
      let squashed = image.resize_exact(image.width(), (image.height() / 2).max(1), FilterType::Triangle);
      squashed.resize(w, h, FilterType::Triangle)
    }
    DisplayMode::Direct | DisplayMode::Off => image.resize(w, h, FilterType::Lanczos3),
  }
}

fn centered_offset(outer: u16, inner: u32) -> u16 {
  (outer as u32).saturating_sub(inner).min(u16::MAX as u32) as u16 / 2
}

fn render_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let rgb = image.to_rgb8();
  let img_w = rgb.width().min(area.width as u32);
  let img_h = rgb.height();
  let rows = img_h.div_ceil(2).min(area.height as u32);
  let dx = centered_offset(area.width, img_w);
  let dy = centered_offset(area.height, rows);

  for row in 0..rows {
    for col in 0..img_w {
      let top = rgb.get_pixel(col, row * 2);
      let bottom_y = row * 2 + 1;
      let bg = if bottom_y < img_h {
        let bottom = rgb.get_pixel(col, bottom_y);
        Color::Rgb(bottom[0], bottom[1], bottom[2])
      } else {
        Color::Reset
      };
      let x = area.x.saturating_add(dx).saturating_add(col as u16);
      let y = area.y.saturating_add(dy).saturating_add(row as u16);
      buf.set_string(x, y, "▀", Style::default().fg(Color::Rgb(top[0], top[1], top[2])).bg(bg));
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let luma = image.to_luma8();
  let img_w = luma.width().min(area.width as u32);
  let img_h = luma.height().min(area.height as u32);
  let dx = centered_offset(area.width, img_w);
  let dy = centered_offset(area.height, img_h);

  for row in 0..img_h {
    for col in 0..img_w {
      let level = luma.get_pixel(col, row)[0] as usize * (ASCII_RAMP.len() - 1) / 255;
      let x = area.x.saturating_add(dx).saturating_add(col as u16);
      let y = area.y.saturating_add(dy).saturating_add(row as u16);
      buf.set_string(x, y, ASCII_RAMP[level].to_string(), Style::default());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn solid(w: u32, h: u32, px: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(px)))
  }

  #[test]
  fn half_block_pixel_size_doubles_rows() {
    assert_eq!(pixel_size(Rect::new(0, 0, 40, 10), DisplayMode::Direct), (40, 20));
    assert_eq!(pixel_size(Rect::new(0, 0, 40, 10), DisplayMode::Ascii), (40, 10));
    assert_eq!(pixel_size(Rect::new(0, 0, 0, 0), DisplayMode::Ascii), (1, 1));
  }

  #[test]
  fn fit_keeps_aspect_within_area() {
    let img = solid(320, 180, [10, 20, 30]);
    let fitted = fit_to_area(&img, Rect::new(0, 0, 32, 20), DisplayMode::Direct);
    assert!(fitted.width() <= 32 && fitted.height() <= 40);
    assert_eq!(fitted.width(), 32);
  }

  #[test]
  fn half_blocks_fill_cells_with_colours() {
    let img = solid(4, 4, [200, 100, 50]);
    let area = Rect::new(0, 0, 4, 2);
    let mut buf = Buffer::empty(area);
    ImageWidget { image: &img, display_mode: DisplayMode::Direct }.render(area, &mut buf);
    let cell = &buf[(0, 0)];
    assert_eq!(cell.symbol(), "▀");
    assert_eq!(cell.fg, Color::Rgb(200, 100, 50));
    assert_eq!(cell.bg, Color::Rgb(200, 100, 50));
  }

  #[test]
  fn ascii_maps_white_to_densest_glyph() {
    let img = solid(2, 1, [255, 255, 255]);
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    ImageWidget { image: &img, display_mode: DisplayMode::Ascii }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "@");
  }

  #[test]
  fn off_draws_nothing() {
    let img = solid(2, 2, [255, 255, 255]);
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    ImageWidget { image: &img, display_mode: DisplayMode::Off }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), " ");
  }
}
