//! Placeholder image synthesis.
//!
//! The asset store needs one fabricated image: a neutral canvas with a
//! centered caption, shown whenever a book has no usable cover. Drawing goes
//! through the `PlaceholderCanvas` capability so the store depends on a
//! small surface, not on a particular imaging library; `ImageCanvas` is the
//! shipped implementation on top of the `image` crate.

use image::{Rgba, RgbaImage};
use std::path::Path;

use super::store::AssetError;

/// Minimal drawing surface for synthesizing the placeholder.
pub trait PlaceholderCanvas {
    fn size(&self) -> (u32, u32);

    /// Pixel size of `text` when drawn with `draw_text`.
    fn measure_text(&self, text: &str) -> (u32, u32);

    /// Draws `text` with its top-left corner at (x, y).
    fn draw_text(&mut self, x: u32, y: u32, text: &str, color: (u8, u8, u8));

    fn save(&self, path: &Path) -> Result<(), AssetError>;
}

/// Renders the "No Image" placeholder onto `canvas`, caption centered.
pub fn render_placeholder(canvas: &mut dyn PlaceholderCanvas, caption: &str) {
    let (width, height) = canvas.size();
    let (text_w, text_h) = canvas.measure_text(caption);
    let x = width.saturating_sub(text_w) / 2;
    let y = height.saturating_sub(text_h) / 2;
    canvas.draw_text(x, y, caption, (100, 100, 100));
}

// Glyphs are 5x7 bitmaps, one byte per row, bit 4 leftmost. Only the
// characters of the placeholder caption are covered; anything else renders
// as a filled box.
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SPACING: u32 = 1;
const GLYPH_SCALE: u32 = 2;

const GLYPHS: &[(char, [u8; 7])] = &[
    (' ', [0b00000; 7]),
    (
        'N',
        [
            0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001,
        ],
    ),
    (
        'I',
        [
            0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ],
    ),
    (
        'o',
        [
            0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110,
        ],
    ),
    (
        'm',
        [
            0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10101, 0b10101,
        ],
    ),
    (
        'a',
        [
            0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111,
        ],
    ),
    (
        'g',
        [
            0b00000, 0b01111, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110,
        ],
    ),
    (
        'e',
        [
            0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110,
        ],
    ),
];

const UNKNOWN_GLYPH: [u8; 7] = [0b11111; 7];

fn glyph_for(c: char) -> &'static [u8; 7] {
    GLYPHS
        .iter()
        .find(|(glyph_char, _)| *glyph_char == c)
        .map(|(_, rows)| rows)
        .unwrap_or(&UNKNOWN_GLYPH)
}

/// `image`-crate backed canvas with an embedded bitmap font.
pub struct ImageCanvas {
    buffer: RgbaImage,
}

impl ImageCanvas {
    pub fn new(width: u32, height: u32, background: (u8, u8, u8)) -> Self {
        let (r, g, b) = background;
        ImageCanvas {
            buffer: RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])),
        }
    }

    fn draw_glyph(&mut self, x: u32, y: u32, rows: &[u8; 7], color: Rgba<u8>) {
        let (width, height) = self.buffer.dimensions();
        for (row_index, row) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if row & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                // Each font pixel becomes a GLYPH_SCALE x GLYPH_SCALE block
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        let px = x + col * GLYPH_SCALE + dx;
                        let py = y + row_index as u32 * GLYPH_SCALE + dy;
                        if px < width && py < height {
                            self.buffer.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }
}

impl PlaceholderCanvas for ImageCanvas {
    fn size(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    fn measure_text(&self, text: &str) -> (u32, u32) {
        let chars = text.chars().count() as u32;
        if chars == 0 {
            return (0, 0);
        }
        let width = (chars * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * GLYPH_SCALE;
        (width, GLYPH_HEIGHT * GLYPH_SCALE)
    }

    fn draw_text(&mut self, x: u32, y: u32, text: &str, color: (u8, u8, u8)) {
        let (r, g, b) = color;
        let color = Rgba([r, g, b, 255]);
        let mut cursor = x;
        for c in text.chars() {
            self.draw_glyph(cursor, y, glyph_for(c), color);
            cursor += (GLYPH_WIDTH + GLYPH_SPACING) * GLYPH_SCALE;
        }
    }

    fn save(&self, path: &Path) -> Result<(), AssetError> {
        self.buffer.save(path)?;
        Ok(())
    }
}
