use crate::error::CoreError;

/// 10 caractères — compact, bon contraste.
pub const CHARSET_COMPACT: &str = " .:-=+*#%@";

/// 70 caractères — Paul Bourke, du plus sombre au plus lumineux sur fond noir.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Blocs Unicode — pseudo-pixels.
pub const CHARSET_BLOCKS: &str = " ░▒▓█";

/// Minimal — haut contraste.
pub const CHARSET_MINIMAL: &str = " .:░▒▓█";

/// Named ramps accepted as `@name` in the `charset` config field.
pub const PRESETS: &[(&str, &str)] = &[
    ("compact", CHARSET_COMPACT),
    ("standard", CHARSET_STANDARD),
    ("blocks", CHARSET_BLOCKS),
    ("minimal", CHARSET_MINIMAL),
];

/// Rampe de glyphes ordonnée du plus sombre au plus lumineux.
///
/// Immuable une fois construite ; partagée par tout le processus via les
/// ressources du moteur.
///
/// # Example
/// ```
/// use aimg_core::charset::GlyphRamp;
/// let ramp = GlyphRamp::new(" .:#@").unwrap();
/// assert_eq!(ramp.glyph_for(0.0), ' ');
/// assert_eq!(ramp.glyph_for(1.0), '@');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphRamp {
    chars: Vec<char>,
}

impl GlyphRamp {
    /// Build a ramp from a literal string.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the ramp has fewer than 2 characters.
    pub fn new(charset: &str) -> Result<Self, CoreError> {
        let chars: Vec<char> = charset.chars().collect();
        if chars.len() < 2 {
            return Err(CoreError::Config(format!(
                "la rampe de glyphes doit contenir au moins 2 caractères (reçu {charset:?})"
            )));
        }
        Ok(Self { chars })
    }

    /// Resolve `@name` presets, otherwise treat `value` as a literal ramp.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for an unknown preset or a too-short ramp.
    ///
    /// # Example
    /// ```
    /// use aimg_core::charset::{GlyphRamp, CHARSET_BLOCKS};
    /// let ramp = GlyphRamp::resolve("@blocks").unwrap();
    /// assert_eq!(ramp, GlyphRamp::new(CHARSET_BLOCKS).unwrap());
    /// ```
    pub fn resolve(value: &str) -> Result<Self, CoreError> {
        match value.strip_prefix('@') {
            Some(name) => PRESETS
                .iter()
                .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
                .map_or_else(
                    || Err(CoreError::Config(format!("rampe inconnue : @{name}"))),
                    |(_, chars)| Self::new(chars),
                ),
            None => Self::new(value),
        }
    }

    /// Map a luminance in [0, 1] to a glyph.
    ///
    /// `N` equal-width buckets; 1.0 lands in the last one. Non-finite or
    /// negative input maps to the first glyph.
    #[inline(always)]
    #[must_use]
    pub fn glyph_for(&self, luminance: f32) -> char {
        self.chars[self.index_for(luminance)]
    }

    /// Bucket index for a luminance value.
    #[inline(always)]
    #[must_use]
    pub fn index_for(&self, luminance: f32) -> usize {
        let n = self.chars.len();
        if !luminance.is_finite() || luminance <= 0.0 {
            return 0;
        }
        ((luminance * n as f32) as usize).min(n - 1)
    }

    /// Number of glyphs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Always false: a ramp holds at least two glyphs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Glyphs, darkest first.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Darkest glyph.
    #[must_use]
    pub fn darkest(&self) -> char {
        self.chars[0]
    }

    /// Brightest glyph.
    #[must_use]
    pub fn brightest(&self) -> char {
        self.chars[self.chars.len() - 1]
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self {
            chars: CHARSET_COMPACT.chars().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_maps_extremes() {
        let ramp = GlyphRamp::new(" .:#@").unwrap();
        assert_eq!(ramp.glyph_for(0.0), ' ');
        assert_eq!(ramp.glyph_for(1.0), '@');
        assert_eq!(ramp.glyph_for(0.999_9), '@');
    }

    #[test]
    fn ramp_buckets_are_equal_width() {
        let ramp = GlyphRamp::new("abcd").unwrap();
        assert_eq!(ramp.glyph_for(0.24), 'a');
        assert_eq!(ramp.glyph_for(0.25), 'b');
        assert_eq!(ramp.glyph_for(0.5), 'c');
        assert_eq!(ramp.glyph_for(0.75), 'd');
    }

    #[test]
    fn ramp_monotonic() {
        let ramp = GlyphRamp::new(CHARSET_STANDARD).unwrap();
        let mut prev = 0usize;
        for i in 0..=1000 {
            let idx = ramp.index_for(i as f32 / 1000.0);
            assert!(idx >= prev, "rampe non monotone à {i}");
            prev = idx;
        }
    }

    #[test]
    fn degenerate_input_maps_to_darkest() {
        let ramp = GlyphRamp::default();
        assert_eq!(ramp.glyph_for(f32::NAN), ' ');
        assert_eq!(ramp.glyph_for(-3.0), ' ');
    }

    #[test]
    fn too_short_ramp_is_rejected() {
        assert!(GlyphRamp::new("@").is_err());
        assert!(GlyphRamp::resolve("@nope").is_err());
        assert_eq!(
            GlyphRamp::resolve("@Standard").unwrap().len(),
            CHARSET_STANDARD.chars().count()
        );
    }
}
