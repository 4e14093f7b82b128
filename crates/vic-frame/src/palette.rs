//! C64 colour palette.
//!
//! 16 colours as RGB triples, using the VICE default palette values.

use image::Rgb;

/// C64 palette: 16 colours indexed 0-15.
pub const PALETTE: [Rgb<u8>; 16] = [
    Rgb([0x00, 0x00, 0x00]), // 0: Black
    Rgb([0xFF, 0xFF, 0xFF]), // 1: White
    Rgb([0x68, 0x37, 0x2B]), // 2: Red
    Rgb([0x70, 0xA4, 0xB2]), // 3: Cyan
    Rgb([0x6F, 0x3D, 0x86]), // 4: Purple
    Rgb([0x58, 0x8D, 0x43]), // 5: Green
    Rgb([0x35, 0x28, 0x79]), // 6: Blue
    Rgb([0xB8, 0xC7, 0x6F]), // 7: Yellow
    Rgb([0x6F, 0x4F, 0x25]), // 8: Orange
    Rgb([0x43, 0x39, 0x00]), // 9: Brown
    Rgb([0x9A, 0x67, 0x59]), // 10: Light Red
    Rgb([0x44, 0x44, 0x44]), // 11: Dark Grey
    Rgb([0x6C, 0x6C, 0x6C]), // 12: Medium Grey
    Rgb([0x9A, 0xD2, 0x84]), // 13: Light Green
    Rgb([0x6C, 0x5E, 0xB5]), // 14: Light Blue
    Rgb([0x95, 0x95, 0x95]), // 15: Light Grey
];

/// Look up a palette entry by 4-bit colour index. The high nybble is ignored,
/// matching how the chip latches colour registers.
#[must_use]
pub fn colour(index: u8) -> Rgb<u8> {
    PALETTE[(index & 0x0F) as usize]
}
