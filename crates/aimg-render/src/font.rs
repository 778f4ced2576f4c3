//! Police bitmap intégrée : 5×7 pour l'ASCII imprimable, blocs ombrés
//! générés par tramage ordonné.

/// Base cell width, glyph plus one column of spacing.
pub const CELL_WIDTH: u32 = 6;
/// Base cell height, glyph plus one row of spacing.
pub const CELL_HEIGHT: u32 = 8;

/// Bayer 4×4, seuils 0..=15, pour les caractères de bloc ombrés.
const BAYER_4X4: [[u8; 4]; 4] = [[0, 8, 2, 10], [12, 4, 14, 6], [3, 11, 1, 9], [15, 7, 13, 5]];

/// Colonnes 5×7 pour U+0020..=U+007E, bit 0 = ligne du haut.
#[rustfmt::skip]
const FONT_5X7: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
    [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x50, 0x30, 0x00, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
    [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
    [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
    [0x08, 0x14, 0x22, 0x41, 0x00], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x00, 0x41, 0x22, 0x14, 0x08], // '>'
    [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
    [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x09, 0x01], // 'F'
    [0x3E, 0x41, 0x49, 0x49, 0x7A], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x0C, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
    [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x3F, 0x40, 0x38, 0x40, 0x3F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x07, 0x08, 0x70, 0x08, 0x07], // 'Y'
    [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
    [0x00, 0x7F, 0x41, 0x41, 0x00], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x00, 0x41, 0x41, 0x7F, 0x00], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
    [0x00, 0x01, 0x02, 0x04, 0x00], // '`'
    [0x20, 0x54, 0x54, 0x54, 0x78], // 'a'
    [0x7F, 0x48, 0x44, 0x44, 0x38], // 'b'
    [0x38, 0x44, 0x44, 0x44, 0x20], // 'c'
    [0x38, 0x44, 0x44, 0x48, 0x7F], // 'd'
    [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
    [0x08, 0x7E, 0x09, 0x01, 0x02], // 'f'
    [0x0C, 0x52, 0x52, 0x52, 0x3E], // 'g'
    [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
    [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
    [0x20, 0x40, 0x44, 0x3D, 0x00], // 'j'
    [0x7F, 0x10, 0x28, 0x44, 0x00], // 'k'
    [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
    [0x7C, 0x04, 0x18, 0x04, 0x78], // 'm'
    [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
    [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
    [0x7C, 0x14, 0x14, 0x14, 0x08], // 'p'
    [0x08, 0x14, 0x14, 0x18, 0x7C], // 'q'
    [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
    [0x48, 0x54, 0x54, 0x54, 0x20], // 's'
    [0x04, 0x3F, 0x44, 0x40, 0x20], // 't'
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
    [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // 'y'
    [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
    [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
    [0x00, 0x00, 0x7F, 0x00, 0x00], // '|'
    [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
    [0x08, 0x04, 0x08, 0x10, 0x08], // '~'
];

/// Coverage mask (0 or 255) of `ch` on the base `CELL_WIDTH × CELL_HEIGHT`
/// cell, row-major. `None` if the built-in font has no such glyph.
///
/// # Example
/// ```
/// use aimg_render::font::{builtin_mask, CELL_WIDTH, CELL_HEIGHT};
/// let space = builtin_mask(' ').unwrap();
/// assert!(space.iter().all(|&a| a == 0));
/// let full = builtin_mask('█').unwrap();
/// assert_eq!(full.len(), (CELL_WIDTH * CELL_HEIGHT) as usize);
/// assert!(full.iter().all(|&a| a == 255));
/// assert!(builtin_mask('é').is_none());
/// ```
#[must_use]
pub fn builtin_mask(ch: char) -> Option<Vec<u8>> {
    let (w, h) = (CELL_WIDTH as usize, CELL_HEIGHT as usize);
    let mut mask = vec![0u8; w * h];

    if let Some(level) = shade_level(ch) {
        for (i, a) in mask.iter_mut().enumerate() {
            let (x, y) = (i % w, i / w);
            if BAYER_4X4[y % 4][x % 4] < level {
                *a = 255;
            }
        }
        return Some(mask);
    }

    let code = u32::from(ch);
    if !(0x20..=0x7E).contains(&code) {
        return None;
    }
    let columns = &FONT_5X7[(code - 0x20) as usize];
    for (x, &bits) in columns.iter().enumerate() {
        for y in 0..7 {
            if bits & (1 << y) != 0 {
                mask[y * w + x] = 255;
            }
        }
    }
    Some(mask)
}

/// Nombre de seuils Bayer allumés (sur 16) pour les blocs ombrés.
fn shade_level(ch: char) -> Option<u8> {
    match ch {
        '░' => Some(4),
        '▒' => Some(8),
        '▓' => Some(12),
        '█' => Some(16),
        _ => None,
    }
}

/// Every character the built-in font can draw.
pub fn builtin_chars() -> impl Iterator<Item = char> {
    (0x20u8..=0x7E)
        .map(char::from)
        .chain(['░', '▒', '▓', '█'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(ch: char) -> usize {
        builtin_mask(ch)
            .map(|m| m.iter().filter(|&&a| a > 0).count())
            .unwrap_or_default()
    }

    #[test]
    fn printable_ascii_is_covered() {
        assert_eq!(builtin_chars().count(), 95 + 4);
        for ch in builtin_chars() {
            assert!(builtin_mask(ch).is_some(), "{ch:?}");
        }
    }

    #[test]
    fn shades_grow_denser() {
        let levels: Vec<usize> = ['░', '▒', '▓', '█'].into_iter().map(coverage).collect();
        assert!(levels.windows(2).all(|w| w[0] < w[1]), "{levels:?}");
        assert_eq!(levels[3], (CELL_WIDTH * CELL_HEIGHT) as usize);
    }

    #[test]
    fn compact_ramp_glyphs_have_ink() {
        assert_eq!(coverage(' '), 0);
        for ch in ".:-=+*#%@".chars() {
            assert!(coverage(ch) > 0, "{ch:?} vide");
        }
        assert!(coverage('@') > coverage('.'));
    }
}
