//! Embedded uppercase/graphics character set.
//!
//! The fallback glyph source for text modes when the chip is pointed at
//! character ROM, which the remote DMA read cannot see. 128 screen codes,
//! 8 bytes per glyph; the returned table is 2 KiB with the upper kibibyte a
//! copy of the lower, so reverse-video screen codes (128-255) render with
//! the plain glyph shapes.

/// Glyph bitmaps for screen codes 0-127 (uppercase/graphics bank).
const GLYPHS: [[u8; 8]; 128] = [
    [0x3C, 0x66, 0x6E, 0x6E, 0x60, 0x62, 0x3C, 0x00], // 0: @
    [0x18, 0x3C, 0x66, 0x7E, 0x66, 0x66, 0x66, 0x00], // 1: A
    [0x7C, 0x66, 0x66, 0x7C, 0x66, 0x66, 0x7C, 0x00], // 2: B
    [0x3C, 0x66, 0x60, 0x60, 0x60, 0x66, 0x3C, 0x00], // 3: C
    [0x78, 0x6C, 0x66, 0x66, 0x66, 0x6C, 0x78, 0x00], // 4: D
    [0x7E, 0x60, 0x60, 0x78, 0x60, 0x60, 0x7E, 0x00], // 5: E
    [0x7E, 0x60, 0x60, 0x78, 0x60, 0x60, 0x60, 0x00], // 6: F
    [0x3C, 0x66, 0x60, 0x6E, 0x66, 0x66, 0x3C, 0x00], // 7: G
    [0x66, 0x66, 0x66, 0x7E, 0x66, 0x66, 0x66, 0x00], // 8: H
    [0x3C, 0x18, 0x18, 0x18, 0x18, 0x18, 0x3C, 0x00], // 9: I
    [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x6C, 0x38, 0x00], // 10: J
    [0x66, 0x6C, 0x78, 0x70, 0x78, 0x6C, 0x66, 0x00], // 11: K
    [0x60, 0x60, 0x60, 0x60, 0x60, 0x60, 0x7E, 0x00], // 12: L
    [0x63, 0x77, 0x7F, 0x6B, 0x63, 0x63, 0x63, 0x00], // 13: M
    [0x66, 0x76, 0x7E, 0x7E, 0x6E, 0x66, 0x66, 0x00], // 14: N
    [0x3C, 0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x00], // 15: O
    [0x7C, 0x66, 0x66, 0x7C, 0x60, 0x60, 0x60, 0x00], // 16: P
    [0x3C, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x0E, 0x00], // 17: Q
    [0x7C, 0x66, 0x66, 0x7C, 0x78, 0x6C, 0x66, 0x00], // 18: R
    [0x3C, 0x66, 0x60, 0x3C, 0x06, 0x66, 0x3C, 0x00], // 19: S
    [0x7E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00], // 20: T
    [0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x00], // 21: U
    [0x66, 0x66, 0x66, 0x66, 0x66, 0x3C, 0x18, 0x00], // 22: V
    [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00], // 23: W
    [0x66, 0x66, 0x3C, 0x18, 0x3C, 0x66, 0x66, 0x00], // 24: X
    [0x66, 0x66, 0x66, 0x3C, 0x18, 0x18, 0x18, 0x00], // 25: Y
    [0x7E, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x7E, 0x00], // 26: Z
    [0x3C, 0x30, 0x30, 0x30, 0x30, 0x30, 0x3C, 0x00], // 27: [
    [0x0C, 0x12, 0x30, 0x7C, 0x30, 0x62, 0xFC, 0x00], // 28: pound
    [0x3C, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x3C, 0x00], // 29: ]
    [0x00, 0x08, 0x1C, 0x3E, 0x08, 0x08, 0x00, 0x00], // 30: arrow up
    [0x00, 0x10, 0x30, 0x7F, 0x30, 0x10, 0x00, 0x00], // 31: arrow left
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // 32: space
    [0x18, 0x18, 0x18, 0x18, 0x00, 0x00, 0x18, 0x00], // 33: !
    [0x66, 0x66, 0x66, 0x00, 0x00, 0x00, 0x00, 0x00], // 34: "
    [0x66, 0x66, 0xFF, 0x66, 0xFF, 0x66, 0x66, 0x00], // 35: #
    [0x18, 0x3E, 0x60, 0x3C, 0x06, 0x7C, 0x18, 0x00], // 36: $
    [0x62, 0x66, 0x0C, 0x18, 0x30, 0x66, 0x46, 0x00], // 37: %
    [0x3C, 0x66, 0x3C, 0x38, 0x67, 0x66, 0x3F, 0x00], // 38: &
    [0x06, 0x0C, 0x18, 0x00, 0x00, 0x00, 0x00, 0x00], // 39: '
    [0x0C, 0x18, 0x30, 0x30, 0x30, 0x18, 0x0C, 0x00], // 40: (
    [0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x18, 0x30, 0x00], // 41: )
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // 42: *
    [0x00, 0x18, 0x18, 0x7E, 0x18, 0x18, 0x00, 0x00], // 43: +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x30], // 44: ,
    [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00], // 45: -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00], // 46: .
    [0x00, 0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x00], // 47: /
    [0x3C, 0x66, 0x6E, 0x76, 0x66, 0x66, 0x3C, 0x00], // 48: 0
    [0x18, 0x18, 0x38, 0x18, 0x18, 0x18, 0x7E, 0x00], // 49: 1
    [0x3C, 0x66, 0x06, 0x0C, 0x30, 0x60, 0x7E, 0x00], // 50: 2
    [0x3C, 0x66, 0x06, 0x1C, 0x06, 0x66, 0x3C, 0x00], // 51: 3
    [0x06, 0x0E, 0x1E, 0x66, 0x7F, 0x06, 0x06, 0x00], // 52: 4
    [0x7E, 0x60, 0x7C, 0x06, 0x06, 0x66, 0x3C, 0x00], // 53: 5
    [0x3C, 0x66, 0x60, 0x7C, 0x66, 0x66, 0x3C, 0x00], // 54: 6
    [0x7E, 0x66, 0x0C, 0x18, 0x18, 0x18, 0x18, 0x00], // 55: 7
    [0x3C, 0x66, 0x66, 0x3C, 0x66, 0x66, 0x3C, 0x00], // 56: 8
    [0x3C, 0x66, 0x66, 0x3E, 0x06, 0x66, 0x3C, 0x00], // 57: 9
    [0x00, 0x00, 0x18, 0x00, 0x00, 0x18, 0x00, 0x00], // 58: :
    [0x00, 0x00, 0x18, 0x00, 0x00, 0x18, 0x18, 0x30], // 59: ;
    [0x0E, 0x18, 0x30, 0x60, 0x30, 0x18, 0x0E, 0x00], // 60: <
    [0x00, 0x00, 0x7E, 0x00, 0x7E, 0x00, 0x00, 0x00], // 61: =
    [0x70, 0x18, 0x0C, 0x06, 0x0C, 0x18, 0x70, 0x00], // 62: >
    [0x3C, 0x66, 0x06, 0x0C, 0x18, 0x00, 0x18, 0x00], // 63: ?
    // 64-127: graphics characters
    [0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00],
    [0x08, 0x1C, 0x3E, 0x7F, 0x7F, 0x1C, 0x3E, 0x00],
    [0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18],
    [0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF],
    [0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00],
    [0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0, 0xF0],
    [0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA],
    [0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F, 0x0F],
    [0x00, 0x00, 0x00, 0x00, 0xAA, 0x55, 0xAA, 0x55],
    [0x0F, 0x07, 0x03, 0x01, 0x00, 0x00, 0x00, 0x00],
    [0x55, 0xAA, 0x55, 0xAA, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x01, 0x03, 0x07, 0x0F],
    [0x00, 0x00, 0x00, 0x00, 0x80, 0xC0, 0xE0, 0xF0],
    [0xF0, 0xE0, 0xC0, 0x80, 0x00, 0x00, 0x00, 0x00],
    [0x01, 0x03, 0x07, 0x0F, 0x1F, 0x3F, 0x7F, 0xFF],
    [0x80, 0xC0, 0xE0, 0xF0, 0xF8, 0xFC, 0xFE, 0xFF],
    [0xFF, 0xFE, 0xFC, 0xF8, 0xF0, 0xE0, 0xC0, 0x80],
    [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
    [0xFF, 0x7F, 0x3F, 0x1F, 0x0F, 0x07, 0x03, 0x01],
    [0x3C, 0x7E, 0xFF, 0xFF, 0xFF, 0xFF, 0x7E, 0x3C],
    [0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xC0],
    [0x18, 0x18, 0x7E, 0xFF, 0xFF, 0x18, 0x3C, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0xF0, 0xF0, 0xF0, 0xF0],
    [0x0F, 0x0F, 0x0F, 0x0F, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x0F, 0x0F, 0x0F, 0x0F],
    [0xF8, 0xF0, 0xE0, 0xC0, 0x80, 0x00, 0x00, 0x00],
    [0xF0, 0xF0, 0xF0, 0xF0, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x66, 0xFF, 0xFF, 0xFF, 0x7E, 0x3C, 0x18],
    [0x00, 0x00, 0x00, 0x80, 0xC0, 0xE0, 0xF0, 0xF8],
    [0x18, 0x18, 0x18, 0xFF, 0xFF, 0x18, 0x18, 0x18],
    [0x00, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00],
    [0x18, 0x3C, 0x7E, 0xFF, 0x7E, 0x3C, 0x18, 0x00],
    [0x00, 0x00, 0x00, 0x01, 0x03, 0x07, 0x0F, 0x1F],
    [0x1F, 0x0F, 0x07, 0x03, 0x01, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x7F, 0x36, 0x36, 0x36, 0x63, 0x00],
    [0xFF, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF],
    [0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03],
    [0xC0, 0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01],
    [0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA],
    [0x01, 0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0xC0],
    [0x00, 0x00, 0x00, 0x00, 0xC0, 0xC0, 0xC0, 0xC0],
    [0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x03, 0x03, 0x03, 0x03],
    [0xC0, 0xC0, 0xC0, 0xC0, 0x00, 0x00, 0x00, 0x00],
    [0x03, 0x03, 0x03, 0x03, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0xFF, 0xFF, 0x18, 0x18, 0x18],
    [0x18, 0x18, 0x18, 0xFF, 0xFF, 0x00, 0x00, 0x00],
    [0x18, 0x18, 0x18, 0x1F, 0x1F, 0x18, 0x18, 0x18],
    [0x18, 0x18, 0x18, 0xF8, 0xF8, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0xF8, 0xF8, 0x18, 0x18, 0x18],
    [0x00, 0x00, 0x00, 0x1F, 0x1F, 0x18, 0x18, 0x18],
    [0x18, 0x18, 0x18, 0x1F, 0x1F, 0x00, 0x00, 0x00],
    [0x18, 0x18, 0x18, 0xF8, 0xF8, 0x18, 0x18, 0x18],
    [0x18, 0x18, 0x18, 0xFF, 0xFF, 0x18, 0x18, 0x18],
    [0x3C, 0x3C, 0x3C, 0x3C, 0x3C, 0x3C, 0x3C, 0x3C],
    [0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x3C, 0x3C, 0x3C, 0x3C],
    [0x3C, 0x3C, 0x3C, 0x3C, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x3C, 0x3C, 0x3C, 0x3C],
    [0x3C, 0x3C, 0x3C, 0x3C, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0xFC, 0xFC, 0x3C, 0x3C, 0x3C, 0x3C],
    [0x3C, 0x3C, 0x3C, 0x3C, 0x3F, 0x3F, 0x00, 0x00],
    [0x00, 0x7E, 0x66, 0x66, 0x66, 0x66, 0x00, 0x00],
    [0x08, 0x1C, 0x3E, 0x7F, 0x3E, 0x1C, 0x08, 0x00],
];

/// Total size of the character table in bytes.
pub const CHARSET_LEN: usize = 2048;

/// Build the 2 KiB character table: 128 glyphs, then a copy of the same
/// kibibyte for screen codes 128-255.
#[must_use]
pub fn charset() -> Vec<u8> {
    let mut table = Vec::with_capacity(CHARSET_LEN);
    for glyph in &GLYPHS {
        table.extend_from_slice(glyph);
    }
    let lower = table.clone();
    table.extend_from_slice(&lower);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_two_kib() {
        assert_eq!(charset().len(), CHARSET_LEN);
    }

    #[test]
    fn upper_kibibyte_mirrors_lower() {
        let table = charset();
        assert_eq!(table[..1024], table[1024..]);
    }

    #[test]
    fn letter_a_glyph() {
        let table = charset();
        // Screen code 1 is 'A'
        assert_eq!(
            &table[8..16],
            &[0x18, 0x3C, 0x66, 0x7E, 0x66, 0x66, 0x66, 0x00]
        );
    }

    #[test]
    fn space_is_blank() {
        let table = charset();
        assert!(table[32 * 8..33 * 8].iter().all(|&b| b == 0));
    }
}
