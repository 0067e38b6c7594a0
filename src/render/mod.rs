pub mod text;

use std::io::Cursor;
use std::path::Path;

use image::{imageops, DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use rand::Rng;
use tracing::{error, warn};

pub use text::TextPainter;

pub const CANVAS_WIDTH: u32 = 1024;
pub const CANVAS_HEIGHT: u32 = 1024;
pub const PROMPT_DISPLAY_LIMIT: usize = 80;
pub const THUMBNAIL_MAX: u32 = 400;
pub const THUMBNAIL_REGION_X: u32 = (CANVAS_WIDTH - THUMBNAIL_MAX) / 2;
pub const THUMBNAIL_REGION_Y: u32 = 400;

const TITLE: &str = "Nano Banana Pro";
const WATERMARK: &str = "DEMO - RUNS 24/7";
const ELLIPSIS: &str = "...";
const MARGIN: i32 = 50;
const TITLE_SIZE: f32 = 32.0;
const BODY_SIZE: f32 = 24.0;
const PROMPT_TOP: i32 = 150;
const BADGES_TOP: i32 = 830;
const WATERMARK_TOP: i32 = 950;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("reference image could not be decoded: {0}")]
    Decode(#[source] image::ImageError),
    #[error("PNG encoding failed: {0}")]
    Encode(#[source] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Random,
    Fixed(Rgb<u8>),
}

impl Background {
    fn pick(self) -> Rgb<u8> {
        match self {
            Background::Fixed(color) => color,
            Background::Random => {
                let mut rng = rand::thread_rng();
                Rgb([
                    rng.gen_range(30..=100),
                    rng.gen_range(100..=200),
                    rng.gen_range(150..=255),
                ])
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Placeholder<'a> {
    pub prompt: &'a str,
    pub extra_lines: &'a [String],
    pub reference: Option<&'a [u8]>,
}

pub struct Renderer {
    painter: TextPainter,
    background: Background,
}

pub fn truncate_prompt(prompt: &str, limit: usize) -> String {
    let flattened = prompt.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= limit {
        return flattened;
    }
    let truncated: String = flattened.chars().take(limit).collect();
    format!("{truncated}{ELLIPSIS}")
}

fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut cursor = Cursor::new(Vec::new());
    canvas
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(RenderError::Encode)?;
    Ok(cursor.into_inner())
}

fn decode_thumbnail(bytes: &[u8]) -> Result<RgbImage, RenderError> {
    let source = image::load_from_memory(bytes).map_err(RenderError::Decode)?;
    let (width, height) = source.dimensions();
    let fitted: DynamicImage = if width > THUMBNAIL_MAX || height > THUMBNAIL_MAX {
        source.thumbnail(THUMBNAIL_MAX, THUMBNAIL_MAX)
    } else {
        source
    };
    Ok(fitted.to_rgb8())
}

impl Renderer {
    pub fn new(painter: TextPainter, background: Background) -> Self {
        Renderer {
            painter,
            background,
        }
    }

    pub fn with_font_path(font_path: Option<&Path>) -> Self {
        Renderer::new(TextPainter::load(font_path), Background::Random)
    }

    pub fn render(&self, prompt: &str, reference: Option<&[u8]>) -> Vec<u8> {
        self.render_placeholder(&Placeholder {
            prompt,
            extra_lines: &[],
            reference,
        })
    }

    pub fn render_placeholder(&self, placeholder: &Placeholder<'_>) -> Vec<u8> {
        let background = self.background.pick();
        let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, background);
        self.draw_text_layers(&mut canvas, placeholder);

        if let Some(bytes) = placeholder.reference.filter(|bytes| !bytes.is_empty()) {
            match decode_thumbnail(bytes) {
                Ok(thumbnail) => paste_thumbnail(&mut canvas, &thumbnail),
                Err(err) => warn!("Skipping thumbnail: {err}"),
            }
        }

        match encode_png(&canvas) {
            Ok(png) => png,
            Err(err) => {
                error!("Placeholder render failed, sending a blank canvas: {err}");
                let blank = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, background);
                encode_png(&blank).unwrap_or_default()
            }
        }
    }

    fn draw_text_layers(&self, canvas: &mut RgbImage, placeholder: &Placeholder<'_>) {
        let text_width = CANVAS_WIDTH - 2 * MARGIN as u32;
        self.painter
            .draw(canvas, MARGIN, MARGIN, TITLE_SIZE, WHITE, TITLE);

        let prompt = truncate_prompt(placeholder.prompt, PROMPT_DISPLAY_LIMIT);
        let line_height = self.painter.line_height(BODY_SIZE);
        let prompt_bottom = THUMBNAIL_REGION_Y as i32 - line_height;
        let mut y = PROMPT_TOP;
        for line in self.painter.wrap(BODY_SIZE, &prompt, text_width) {
            if y > prompt_bottom {
                break;
            }
            self.painter.draw(canvas, MARGIN, y, BODY_SIZE, WHITE, &line);
            y += line_height;
        }

        let mut y = BADGES_TOP;
        for line in placeholder.extra_lines {
            if y + line_height > WATERMARK_TOP {
                break;
            }
            self.painter.draw(canvas, MARGIN, y, BODY_SIZE, WHITE, line);
            y += line_height;
        }

        self.painter
            .draw(canvas, MARGIN, WATERMARK_TOP, BODY_SIZE, YELLOW, WATERMARK);
    }
}

fn paste_thumbnail(canvas: &mut RgbImage, thumbnail: &RgbImage) {
    let x = THUMBNAIL_REGION_X + (THUMBNAIL_MAX - thumbnail.width().min(THUMBNAIL_MAX)) / 2;
    let y = THUMBNAIL_REGION_Y + (THUMBNAIL_MAX - thumbnail.height().min(THUMBNAIL_MAX)) / 2;
    imageops::overlay(canvas, thumbnail, i64::from(x), i64::from(y));
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAY: Rgb<u8> = Rgb([40, 40, 40]);

    fn fixed_renderer() -> Renderer {
        Renderer::new(TextPainter::Bitmap, Background::Fixed(GRAY))
    }

    fn red_png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([255, 0, 0]));
        encode_png(&image).expect("encode test image")
    }

    #[test]
    fn output_is_a_fixed_size_png() {
        let png = Renderer::new(TextPainter::Bitmap, Background::Random).render("hello", None);
        let decoded = image::load_from_memory(&png).expect("valid png");
        assert_eq!(decoded.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
    }

    #[test]
    fn undecodable_reference_renders_like_no_reference() {
        let renderer = fixed_renderer();
        let without = renderer.render("product shot", None);
        let with_garbage = renderer.render("product shot", Some(&b"definitely not an image"[..]));
        assert_eq!(without, with_garbage);
    }

    #[test]
    fn decodable_reference_is_pasted_in_the_thumbnail_region() {
        let renderer = fixed_renderer();
        let reference = red_png(200, 100);
        let png = renderer.render("selfie", Some(reference.as_slice()));
        let decoded = image::load_from_memory(&png).expect("valid png").to_rgb8();

        // 200x100 is centered inside the 400x400 region starting at (312, 400).
        assert_eq!(decoded.get_pixel(512, 600), &Rgb([255, 0, 0]));
        assert_eq!(decoded.get_pixel(320, 410), &GRAY);
    }

    #[test]
    fn large_reference_is_downscaled_to_fit() {
        let thumbnail = decode_thumbnail(&red_png(1600, 800)).expect("decodes");
        assert!(thumbnail.width() <= THUMBNAIL_MAX);
        assert!(thumbnail.height() <= THUMBNAIL_MAX);
    }

    #[test]
    fn long_prompts_are_truncated_with_marker() {
        let prompt = "a".repeat(120);
        let shown = truncate_prompt(&prompt, PROMPT_DISPLAY_LIMIT);
        assert_eq!(shown.chars().count(), PROMPT_DISPLAY_LIMIT + ELLIPSIS.len());
        assert!(shown.ends_with(ELLIPSIS));
        assert_eq!(truncate_prompt("short\nprompt", PROMPT_DISPLAY_LIMIT), "short prompt");
    }
}
