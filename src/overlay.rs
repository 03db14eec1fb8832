//! Burned-in frame labels.
//!
//! Every captured frame gets a dark, semi-opaque box in its top-left corner
//! holding two lines of white text: `Frame {index}` and the nominal
//! timestamp as `mm:ss`. Text is drawn from a small built-in 5×7 bitmap font
//! scaled up 2×, so no font file has to ship with the crate. Only the glyphs
//! the label uses are defined; anything else is drawn as a blank cell.
//!
//! All drawing is clipped to the raster, so tiny frames simply show part of
//! the label.

use std::time::Duration;

use image::{Rgb, RgbImage};

/// Top-left corner of the label box.
const BOX_ORIGIN: (u32, u32) = (10, 10);
/// Size of the label box.
const BOX_SIZE: (u32, u32) = (200, 60);
/// Fraction of the underlying pixel that shows through the box.
const BOX_TRANSMISSION: f32 = 0.3;
/// Integer upscale applied to the 5×7 glyphs.
const GLYPH_SCALE: u32 = 2;
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Top of the `Frame N` line and of the timestamp line.
const LINE_TOPS: (u32, u32) = (16, 38);
const TEXT_LEFT: u32 = 20;
const TEXT_COLOUR: Rgb<u8> = Rgb([255, 255, 255]);

/// Format a timestamp as zero-padded `mm:ss`, truncating fractional seconds.
///
/// Minutes keep counting past 59 rather than rolling into hours.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use framegrab::format_timestamp;
///
/// assert_eq!(format_timestamp(Duration::from_secs_f64(75.9)), "01:15");
/// ```
pub fn format_timestamp(timestamp: Duration) -> String {
    let total = timestamp.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Draw the label box and text for frame `index` at `timestamp` onto `image`.
pub fn draw_label(image: &mut RgbImage, index: u32, timestamp: Duration) {
    darken_box(image);
    draw_text(image, TEXT_LEFT, LINE_TOPS.0, &format!("Frame {index}"));
    draw_text(image, TEXT_LEFT, LINE_TOPS.1, &format_timestamp(timestamp));
}

fn darken_box(image: &mut RgbImage) {
    let (x0, y0) = BOX_ORIGIN;
    let x1 = (x0 + BOX_SIZE.0).min(image.width());
    let y1 = (y0 + BOX_SIZE.1).min(image.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = image.get_pixel_mut(x, y);
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as f32 * BOX_TRANSMISSION).round() as u8;
            }
        }
    }
}

fn draw_text(image: &mut RgbImage, left: u32, top: u32, text: &str) {
    let advance = (GLYPH_WIDTH + 1) * GLYPH_SCALE;
    for (position, character) in text.chars().enumerate() {
        let Some(rows) = glyph(character) else {
            continue;
        };
        let origin_x = left + position as u32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - column)) == 0 {
                    continue;
                }
                fill_cell(
                    image,
                    origin_x + column * GLYPH_SCALE,
                    top + row as u32 * GLYPH_SCALE,
                );
            }
        }
    }
}

fn fill_cell(image: &mut RgbImage, x: u32, y: u32) {
    for dy in 0..GLYPH_SCALE {
        for dx in 0..GLYPH_SCALE {
            let (px, py) = (x + dx, y + dy);
            if px < image.width() && py < image.height() {
                image.put_pixel(px, py, TEXT_COLOUR);
            }
        }
    }
}

/// 5×7 bitmap rows (high bit = leftmost column) for the label's alphabet.
fn glyph(character: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    let rows = match character {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'a' => [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        'e' => [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'm' => [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001],
        'r' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10000, 0b10000, 0b10000],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_formatting() {
        assert_eq!(format_timestamp(Duration::ZERO), "00:00");
        assert_eq!(format_timestamp(Duration::from_secs_f64(1.33)), "00:01");
        assert_eq!(format_timestamp(Duration::from_millis(11_950)), "00:11");
        assert_eq!(format_timestamp(Duration::from_secs(125)), "02:05");
        assert_eq!(format_timestamp(Duration::from_secs(3725)), "62:05");
    }

    #[test]
    fn box_darkens_underlying_pixels() {
        let mut image = RgbImage::from_pixel(320, 240, Rgb([200, 100, 50]));
        draw_label(&mut image, 1, Duration::ZERO);

        // Inside the box but away from any glyph.
        assert_eq!(image.get_pixel(200, 65), &Rgb([60, 30, 15]));
        // Outside the box.
        assert_eq!(image.get_pixel(5, 5), &Rgb([200, 100, 50]));
        assert_eq!(image.get_pixel(250, 100), &Rgb([200, 100, 50]));
    }

    #[test]
    fn text_is_drawn_in_white() {
        let mut image = RgbImage::from_pixel(320, 240, Rgb([0, 0, 0]));
        draw_label(&mut image, 3, Duration::from_secs(7));

        // Top-left bar of the 'F' glyph.
        assert_eq!(image.get_pixel(TEXT_LEFT, LINE_TOPS.0), &TEXT_COLOUR);
        let white = image.pixels().filter(|pixel| **pixel == TEXT_COLOUR).count();
        assert!(white > 100, "expected label text, found {white} white pixels");
    }

    #[test]
    fn labels_differ_by_index() {
        let base = RgbImage::from_pixel(320, 240, Rgb([90, 90, 90]));
        let mut first = base.clone();
        let mut second = base;
        draw_label(&mut first, 1, Duration::from_secs(4));
        draw_label(&mut second, 2, Duration::from_secs(4));
        assert_ne!(first, second);
    }

    #[test]
    fn drawing_clips_on_tiny_rasters() {
        let mut image = RgbImage::from_pixel(12, 12, Rgb([200, 200, 200]));
        draw_label(&mut image, 10, Duration::from_secs(599));
        assert_eq!(image.get_pixel(11, 11), &Rgb([60, 60, 60]));

        let mut empty = RgbImage::new(0, 0);
        draw_label(&mut empty, 1, Duration::ZERO);
    }
}
