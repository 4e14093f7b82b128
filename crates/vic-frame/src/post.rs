//! Frame post-processing.
//!
//! Applied after rendering and sprite compositing, in order: 38-column /
//! 24-row edge blanking, the border band, and integer nearest-neighbour
//! upscaling. All transformations are pure and return a new image.

use image::RgbImage;

use crate::palette;
use crate::state::VicState;

/// Width of the border band added around the display window.
pub const BORDER_SIZE: u32 = 32;

/// Strip height/width hidden by RSEL=0 / CSEL=0.
const BLANK_STRIP: u32 = 8;

/// Hide the display edges the chip covers with border in 24-row or 38-column
/// mode. YSCROLL decides whether the top or bottom strip goes (the chip
/// shifts the window down as YSCROLL grows, so high values expose the top);
/// XSCROLL picks left or right the same way.
#[must_use]
pub fn apply_blanking(img: &RgbImage, state: &VicState) -> RgbImage {
    let mut out = img.clone();
    if state.rsel && state.csel {
        return out;
    }
    let border = palette::colour(state.border_colour);
    let (width, height) = out.dimensions();

    if !state.rsel {
        let rows = if state.yscroll >= 4 {
            height - BLANK_STRIP..height
        } else {
            0..BLANK_STRIP
        };
        for y in rows {
            for x in 0..width {
                out.put_pixel(x, y, border);
            }
        }
    }

    if !state.csel {
        let cols = if state.xscroll >= 4 {
            width - BLANK_STRIP..width
        } else {
            0..BLANK_STRIP
        };
        for x in cols {
            for y in 0..height {
                out.put_pixel(x, y, border);
            }
        }
    }

    out
}

/// Surround the frame with a band of border colour.
#[must_use]
pub fn add_border(img: &RgbImage, border_colour: u8) -> RgbImage {
    let mut out = RgbImage::from_pixel(
        img.width() + BORDER_SIZE * 2,
        img.height() + BORDER_SIZE * 2,
        palette::colour(border_colour),
    );
    for (x, y, pixel) in img.enumerate_pixels() {
        out.put_pixel(x + BORDER_SIZE, y + BORDER_SIZE, *pixel);
    }
    out
}

/// Integer nearest-neighbour upscale. A factor of 0 or 1 returns the frame
/// unchanged.
#[must_use]
pub fn upscale(img: &RgbImage, factor: u32) -> RgbImage {
    if factor <= 1 {
        return img.clone();
    }
    let mut out = RgbImage::new(img.width() * factor, img.height() * factor);
    for (x, y, pixel) in img.enumerate_pixels() {
        for dy in 0..factor {
            for dx in 0..factor {
                out.put_pixel(x * factor + dx, y * factor + dy, *pixel);
            }
        }
    }
    out
}
