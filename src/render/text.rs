use std::fs;
use std::path::{Path, PathBuf};

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use rusttype::{point, Font, Scale};
use tracing::{info, warn};

const BITMAP_GLYPH_SIZE: u32 = 8;
const LINE_SPACING: f32 = 1.25;

pub enum TextPainter {
    TrueType(Font<'static>),
    Bitmap,
}

fn font_candidates(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = configured {
        candidates.push(path.to_path_buf());
    }
    candidates.push(PathBuf::from("fonts").join("DejaVuSans.ttf"));
    candidates.push(PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"));
    candidates.push(PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"));
    candidates
}

fn load_font_from_path(path: &Path) -> Option<Font<'static>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            info!("Font not loaded from {}: {}", path.display(), err);
            return None;
        }
    };
    let font = Font::try_from_vec(bytes);
    if font.is_none() {
        warn!("File at {} is not a usable TrueType font", path.display());
    }
    font
}

impl TextPainter {
    pub fn load(configured: Option<&Path>) -> Self {
        for candidate in font_candidates(configured) {
            if !candidate.exists() {
                continue;
            }
            if let Some(font) = load_font_from_path(&candidate) {
                info!("Rendering text with font {}", candidate.display());
                return TextPainter::TrueType(font);
            }
        }
        info!("No TrueType font found; rendering text with the bitmap font");
        TextPainter::Bitmap
    }

    pub fn line_height(&self, size: f32) -> i32 {
        (size * LINE_SPACING).round() as i32
    }

    pub fn text_width(&self, size: f32, text: &str) -> f32 {
        match self {
            TextPainter::TrueType(font) => {
                let scale = Scale::uniform(size);
                text.chars()
                    .map(|ch| font.glyph(ch).scaled(scale).h_metrics().advance_width)
                    .sum()
            }
            TextPainter::Bitmap => {
                (text.chars().count() as u32 * BITMAP_GLYPH_SIZE * bitmap_scale(size)) as f32
            }
        }
    }

    pub fn wrap(&self, size: f32, text: &str, max_width: u32) -> Vec<String> {
        let max_width = max_width as f32;
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if self.text_width(size, &candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if self.text_width(size, &current) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, size: f32, color: Rgb<u8>, text: &str) {
        match self {
            TextPainter::TrueType(font) => draw_truetype(canvas, font, x, y, size, color, text),
            TextPainter::Bitmap => draw_bitmap(canvas, x, y, size, color, text),
        }
    }
}

fn bitmap_scale(size: f32) -> u32 {
    ((size / BITMAP_GLYPH_SIZE as f32).round() as u32).max(1)
}

fn bitmap_glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn put_pixel_checked(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    canvas.put_pixel(x, y, color);
}

fn draw_bitmap(canvas: &mut RgbImage, x: i32, y: i32, size: f32, color: Rgb<u8>, text: &str) {
    let scale = bitmap_scale(size) as i32;
    let advance = BITMAP_GLYPH_SIZE as i32 * scale;
    let mut caret_x = x;

    for ch in text.chars() {
        let glyph = bitmap_glyph(ch);
        for (row, bits) in glyph.iter().enumerate() {
            for column in 0..8 {
                if bits & (1 << column) == 0 {
                    continue;
                }
                let origin_x = caret_x + column * scale;
                let origin_y = y + row as i32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        put_pixel_checked(canvas, origin_x + dx, origin_y + dy, color);
                    }
                }
            }
        }
        caret_x += advance;
    }
}

fn draw_truetype(
    canvas: &mut RgbImage,
    font: &Font<'static>,
    x: i32,
    y: i32,
    size: f32,
    color: Rgb<u8>,
    text: &str,
) {
    let scale = Scale::uniform(size);
    let v_metrics = font.v_metrics(scale);
    let mut caret_x = x as f32;
    let baseline_y = y as f32 + v_metrics.ascent;

    for ch in text.chars() {
        let glyph = font
            .glyph(ch)
            .scaled(scale)
            .positioned(point(caret_x, baseline_y));
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= canvas.width() || py >= canvas.height() || coverage <= 0.0 {
                    return;
                }
                let dst = canvas.get_pixel_mut(px, py);
                let inv = 1.0 - coverage;
                for channel in 0..3 {
                    dst.0[channel] =
                        (color.0[channel] as f32 * coverage + dst.0[channel] as f32 * inv) as u8;
                }
            });
        }
        caret_x += glyph.unpositioned().h_metrics().advance_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_wrap_respects_width() {
        let painter = TextPainter::Bitmap;
        // 8px glyphs at size 8: ten characters per 80px line.
        let lines = painter.wrap(8.0, "alpha beta gamma delta", 80);
        assert_eq!(lines, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn bitmap_wrap_splits_long_words() {
        let painter = TextPainter::Bitmap;
        let lines = painter.wrap(8.0, "abcdefghijklmno", 80);
        assert_eq!(lines, vec!["abcdefghij", "klmno"]);
    }

    #[test]
    fn bitmap_draw_marks_pixels_and_clips_at_edges() {
        let painter = TextPainter::Bitmap;
        let mut canvas = RgbImage::from_pixel(16, 16, Rgb([0, 0, 0]));
        painter.draw(&mut canvas, 12, 0, 8.0, Rgb([255, 255, 255]), "HH");
        assert!(canvas.pixels().any(|pixel| pixel.0 == [255, 255, 255]));
    }

    #[test]
    fn unknown_characters_fall_back_to_question_mark() {
        assert_eq!(bitmap_glyph('🍌'), bitmap_glyph('?'));
    }
}
