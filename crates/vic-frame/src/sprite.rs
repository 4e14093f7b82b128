//! Hardware sprite compositing.
//!
//! Decodes up to eight 24x21 sprite shapes (hi-res or multicolour, each axis
//! independently doubled) and lays them over the rendered display window.
//! Sprites are drawn in descending number order so sprite 0 ends up topmost,
//! matching the chip's fixed priority. Every enabled sprite is composited as
//! foreground; the background-priority flag is decoded but not layered.
//!
//! Each sprite renders into a transient RGBA buffer so transparent pixels
//! (hi-res 0-bits, multicolour pair %00) leave the frame untouched.

use image::{Rgb, Rgba, RgbaImage, RgbImage};

use crate::palette;
use crate::state::{SpriteState, VicState};

/// Sprite shape width in pixels before expansion.
pub const SPRITE_WIDTH: u32 = 24;
/// Sprite shape height in rows before expansion.
pub const SPRITE_HEIGHT: u32 = 21;
/// Bytes of shape data per sprite.
pub const SPRITE_DATA_LEN: usize = 63;

/// The chip's sprite coordinate origin relative to the display window:
/// an unexpanded sprite at (24, 50) sits exactly in the top-left corner.
const X_OFFSET: i32 = 24;
const Y_OFFSET: i32 = 50;

fn opaque(colour: Rgb<u8>) -> Rgba<u8> {
    Rgba([colour.0[0], colour.0[1], colour.0[2], 0xFF])
}

/// Render one sprite shape at base 24x21 resolution. Transparent pixels have
/// zero alpha.
fn render_shape(sprite: &SpriteState, data: &[u8], state: &VicState) -> RgbaImage {
    let mut img = RgbaImage::new(SPRITE_WIDTH, SPRITE_HEIGHT);
    let sprite_colour = opaque(palette::colour(sprite.colour));
    let mc0 = opaque(palette::colour(state.sprite_multicolour0));
    let mc1 = opaque(palette::colour(state.sprite_multicolour1));

    for row in 0..SPRITE_HEIGHT as usize {
        let Some(row_data) = data.get(row * 3..row * 3 + 3) else {
            break;
        };
        let bits = u32::from(row_data[0]) << 16 | u32::from(row_data[1]) << 8
            | u32::from(row_data[2]);

        if sprite.multicolour {
            for col in 0..12usize {
                let pair = (bits >> (22 - col * 2)) & 0x03;
                let colour = match pair {
                    0 => continue,
                    1 => mc0,
                    2 => sprite_colour,
                    _ => mc1,
                };
                img.put_pixel((col * 2) as u32, row as u32, colour);
                img.put_pixel((col * 2 + 1) as u32, row as u32, colour);
            }
        } else {
            for col in 0..SPRITE_WIDTH as usize {
                if bits & (1 << (23 - col)) != 0 {
                    img.put_pixel(col as u32, row as u32, sprite_colour);
                }
            }
        }
    }
    img
}

/// Nearest-neighbour expansion by independent horizontal/vertical factors.
fn expand(img: &RgbaImage, fx: u32, fy: u32) -> RgbaImage {
    if fx == 1 && fy == 1 {
        return img.clone();
    }
    let mut out = RgbaImage::new(img.width() * fx, img.height() * fy);
    for (x, y, pixel) in img.enumerate_pixels() {
        for dy in 0..fy {
            for dx in 0..fx {
                out.put_pixel(x * fx + dx, y * fy + dy, *pixel);
            }
        }
    }
    out
}

/// Blit a sprite buffer onto the frame at a signed position, clipping at
/// every edge. Only opaque pixels land.
fn blit(frame: &mut RgbImage, sprite_img: &RgbaImage, at_x: i32, at_y: i32) {
    for (sx, sy, pixel) in sprite_img.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        let fx = at_x + sx as i32;
        let fy = at_y + sy as i32;
        if fx < 0 || fy < 0 || fx >= frame.width() as i32 || fy >= frame.height() as i32 {
            continue;
        }
        frame.put_pixel(fx as u32, fy as u32, Rgb([pixel.0[0], pixel.0[1], pixel.0[2]]));
    }
}

/// Composite all enabled sprites onto the frame. `sprite_data[n]` carries
/// sprite n's shape bytes, or `None` when the shape could not be fetched
/// (that sprite is skipped).
pub fn overlay_sprites(frame: &mut RgbImage, state: &VicState, sprite_data: &[Option<Vec<u8>>; 8]) {
    for n in (0..8).rev() {
        let sprite = &state.sprites[n];
        if !sprite.enabled {
            continue;
        }
        let Some(data) = &sprite_data[n] else {
            continue;
        };

        let shape = render_shape(sprite, data, state);
        let fx = if sprite.x_expand { 2 } else { 1 };
        let fy = if sprite.y_expand { 2 } else { 1 };
        let shape = expand(&shape, fx, fy);
        blit(
            frame,
            &shape,
            i32::from(sprite.x) - X_OFFSET,
            i32::from(sprite.y) - Y_OFFSET,
        );
    }
}
