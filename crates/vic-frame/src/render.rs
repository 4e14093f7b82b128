//! Mode rasterizers.
//!
//! Five pure renderers, one per defined display mode, each producing the
//! 320x200 display window as an RGB image. Character data is indexed
//! `chars[code * 8 + y]`; bitmap data in natural raster order
//! `row * 320 + col * 8 + y`. Multicolour bitmap renders its native
//! 160x200 and is width-doubled so every mode leaves here at 320x200.
//!
//! A renderer never fails: bytes past the end of a short memory window read
//! as zero, so a truncated fetch degrades to blank cells instead of a crash.

use image::RgbImage;

use crate::palette;
use crate::state::{Mode, VicState};

/// Display window width in pixels.
pub const FRAME_WIDTH: u32 = 320;
/// Display window height in pixels.
pub const FRAME_HEIGHT: u32 = 200;

/// Character cells per row.
const COLUMNS: usize = 40;
/// Character cell rows.
const ROWS: usize = 25;

/// The memory windows a frame is reconstructed from. Unused windows (the
/// bitmap in text modes, the character set in bitmap modes) may be empty.
pub struct FrameMemory<'a> {
    /// Screen matrix: 1000 character codes, or per-cell colours in bitmap modes.
    pub screen: &'a [u8],
    /// Colour RAM: 1000 nybbles.
    pub colour: &'a [u8],
    /// Character set: 2048 glyph bytes.
    pub chars: &'a [u8],
    /// Bitmap: 8000 bytes.
    pub bitmap: &'a [u8],
}

/// A window byte, with reads past the end returning zero.
fn byte(window: &[u8], index: usize) -> u8 {
    window.get(index).copied().unwrap_or(0)
}

/// Render the display window for the decoded state.
#[must_use]
pub fn render_frame(state: &VicState, mem: &FrameMemory<'_>) -> RgbImage {
    match state.mode() {
        Mode::StandardText => standard_text(state, mem),
        Mode::MulticolourText => multicolour_text(state, mem),
        Mode::ExtendedBackground => extended_background(state, mem),
        Mode::HiresBitmap => hires_bitmap(state, mem),
        Mode::MulticolourBitmap => double_width(&multicolour_bitmap(state, mem)),
        Mode::Invalid => background_field(state),
    }
}

/// An undefined flag combination shows nothing but background.
fn background_field(state: &VicState) -> RgbImage {
    RgbImage::from_pixel(
        FRAME_WIDTH,
        FRAME_HEIGHT,
        palette::colour(state.background_colour),
    )
}

fn standard_text(state: &VicState, mem: &FrameMemory<'_>) -> RgbImage {
    let mut img = background_field(state);
    let background = palette::colour(state.background_colour);

    for row in 0..ROWS {
        for col in 0..COLUMNS {
            let pos = row * COLUMNS + col;
            let code = byte(mem.screen, pos);
            let foreground = palette::colour(byte(mem.colour, pos));
            for y in 0..8usize {
                let bits = byte(mem.chars, code as usize * 8 + y);
                for x in 0..8usize {
                    let colour = if bits & (0x80 >> x) != 0 {
                        foreground
                    } else {
                        background
                    };
                    img.put_pixel((col * 8 + x) as u32, (row * 8 + y) as u32, colour);
                }
            }
        }
    }
    img
}

fn multicolour_text(state: &VicState, mem: &FrameMemory<'_>) -> RgbImage {
    let mut img = background_field(state);
    let background = palette::colour(state.background_colour);
    let background1 = palette::colour(state.background_colour1);
    let background2 = palette::colour(state.background_colour2);

    for row in 0..ROWS {
        for col in 0..COLUMNS {
            let pos = row * COLUMNS + col;
            let code = byte(mem.screen, pos);
            let colour_byte = byte(mem.colour, pos);
            // Bit 3 of colour RAM picks multicolour per cell; clear means the
            // cell renders exactly like standard text.
            let multicolour = colour_byte & 0x08 != 0;
            for y in 0..8usize {
                let bits = byte(mem.chars, code as usize * 8 + y);
                if multicolour {
                    for x in 0..4usize {
                        let pair = (bits >> (6 - x * 2)) & 0x03;
                        let colour = match pair {
                            0 => background,
                            1 => background1,
                            2 => background2,
                            _ => palette::colour(colour_byte & 0x07),
                        };
                        img.put_pixel((col * 8 + x * 2) as u32, (row * 8 + y) as u32, colour);
                        img.put_pixel((col * 8 + x * 2 + 1) as u32, (row * 8 + y) as u32, colour);
                    }
                } else {
                    let foreground = palette::colour(colour_byte & 0x0F);
                    for x in 0..8usize {
                        let colour = if bits & (0x80 >> x) != 0 {
                            foreground
                        } else {
                            background
                        };
                        img.put_pixel((col * 8 + x) as u32, (row * 8 + y) as u32, colour);
                    }
                }
            }
        }
    }
    img
}

fn extended_background(state: &VicState, mem: &FrameMemory<'_>) -> RgbImage {
    let mut img = background_field(state);
    let backgrounds = [
        palette::colour(state.background_colour),
        palette::colour(state.background_colour1),
        palette::colour(state.background_colour2),
        palette::colour(state.background_colour3),
    ];

    for row in 0..ROWS {
        for col in 0..COLUMNS {
            let pos = row * COLUMNS + col;
            let screen_byte = byte(mem.screen, pos);
            // Top two bits of the screen byte pick the cell background;
            // only 64 character shapes remain addressable.
            let code = screen_byte & 0x3F;
            let background = backgrounds[(screen_byte >> 6) as usize];
            let foreground = palette::colour(byte(mem.colour, pos));
            for y in 0..8usize {
                let bits = byte(mem.chars, code as usize * 8 + y);
                for x in 0..8usize {
                    let colour = if bits & (0x80 >> x) != 0 {
                        foreground
                    } else {
                        background
                    };
                    img.put_pixel((col * 8 + x) as u32, (row * 8 + y) as u32, colour);
                }
            }
        }
    }
    img
}

fn hires_bitmap(state: &VicState, mem: &FrameMemory<'_>) -> RgbImage {
    let mut img = background_field(state);

    for row in 0..ROWS {
        for col in 0..COLUMNS {
            let screen_byte = byte(mem.screen, row * COLUMNS + col);
            let foreground = palette::colour(screen_byte >> 4);
            let background = palette::colour(screen_byte & 0x0F);
            let offset = row * COLUMNS * 8 + col * 8;
            for y in 0..8usize {
                let bits = byte(mem.bitmap, offset + y);
                for x in 0..8usize {
                    let colour = if bits & (0x80 >> x) != 0 {
                        foreground
                    } else {
                        background
                    };
                    img.put_pixel((col * 8 + x) as u32, (row * 8 + y) as u32, colour);
                }
            }
        }
    }
    img
}

/// Multicolour bitmap at its native resolution: 160x200, two bits per pixel.
fn multicolour_bitmap(state: &VicState, mem: &FrameMemory<'_>) -> RgbImage {
    let mut img = RgbImage::from_pixel(
        FRAME_WIDTH / 2,
        FRAME_HEIGHT,
        palette::colour(state.background_colour),
    );
    let background = palette::colour(state.background_colour);

    for row in 0..ROWS {
        for col in 0..COLUMNS {
            let pos = row * COLUMNS + col;
            let screen_byte = byte(mem.screen, pos);
            let colour1 = palette::colour(screen_byte >> 4);
            let colour2 = palette::colour(screen_byte & 0x0F);
            let colour3 = palette::colour(byte(mem.colour, pos));
            let offset = row * COLUMNS * 8 + col * 8;
            for y in 0..8usize {
                let bits = byte(mem.bitmap, offset + y);
                for x in 0..4usize {
                    let pair = (bits >> (6 - x * 2)) & 0x03;
                    let colour = match pair {
                        0 => background,
                        1 => colour1,
                        2 => colour2,
                        _ => colour3,
                    };
                    img.put_pixel((col * 4 + x) as u32, (row * 8 + y) as u32, colour);
                }
            }
        }
    }
    img
}

/// Nearest-neighbour width doubling, used to bring the 160-wide multicolour
/// bitmap up to the common 320-pixel frame.
fn double_width(img: &RgbImage) -> RgbImage {
    let mut out = RgbImage::new(img.width() * 2, img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        out.put_pixel(x * 2, y, *pixel);
        out.put_pixel(x * 2 + 1, y, *pixel);
    }
    out
}
