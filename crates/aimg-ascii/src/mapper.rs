use std::sync::Arc;

use aimg_core::charset::GlyphRamp;
use aimg_core::color::{ColorMode, tint};
use aimg_core::frame::{AsciiCell, AsciiGrid, LuminanceGrid};

/// Associe luminance → glyphe, et grille de luminance → grille ASCII teintée.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use aimg_ascii::mapper::GlyphMapper;
/// use aimg_core::charset::GlyphRamp;
///
/// let mapper = GlyphMapper::new(Arc::new(GlyphRamp::new(" .:#@").unwrap()));
/// assert_eq!(mapper.map_to_glyph(0.0), ' ');
/// assert_eq!(mapper.map_to_glyph(0.5), ':');
/// assert_eq!(mapper.map_to_glyph(1.0), '@');
/// ```
#[derive(Clone, Debug)]
pub struct GlyphMapper {
    ramp: Arc<GlyphRamp>,
    color_mode: ColorMode,
    saturation: f32,
    invert: bool,
}

impl GlyphMapper {
    /// HSV-bright tint, no inversion.
    #[must_use]
    pub fn new(ramp: Arc<GlyphRamp>) -> Self {
        Self {
            ramp,
            color_mode: ColorMode::HsvBright,
            saturation: 1.0,
            invert: false,
        }
    }

    /// Set the glyph colouring.
    #[must_use]
    pub fn with_color(mut self, mode: ColorMode, saturation: f32) -> Self {
        self.color_mode = mode;
        self.saturation = saturation;
        self
    }

    /// Map bright cells to the start of the ramp (light backgrounds).
    #[must_use]
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// The ramp in use.
    #[must_use]
    pub fn ramp(&self) -> &GlyphRamp {
        &self.ramp
    }

    /// Glyph for a luminance in [0, 1]. Ignores inversion.
    #[inline(always)]
    #[must_use]
    pub fn map_to_glyph(&self, luminance: f32) -> char {
        self.ramp.glyph_for(luminance)
    }

    /// Map every cell of `grid`.
    #[must_use]
    pub fn map_grid(&self, grid: &LuminanceGrid) -> AsciiGrid {
        let mut out = AsciiGrid::new(grid.width, grid.height);
        for (cell, (&lum, &rgb)) in out
            .cells
            .iter_mut()
            .zip(grid.values.iter().zip(grid.colors.iter()))
        {
            let lum = if self.invert { 1.0 - lum } else { lum };
            *cell = AsciiCell {
                ch: self.map_to_glyph(lum),
                fg: tint(rgb, self.color_mode, self.saturation),
                bg: (0, 0, 0),
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimg_core::charset::CHARSET_COMPACT;

    fn compact() -> GlyphMapper {
        GlyphMapper::new(Arc::new(GlyphRamp::new(CHARSET_COMPACT).unwrap()))
    }

    #[test]
    fn extremes_hit_ramp_ends() {
        let mapper = compact();
        assert_eq!(mapper.map_to_glyph(0.0), mapper.ramp().darkest());
        assert_eq!(mapper.map_to_glyph(1.0), mapper.ramp().brightest());
    }

    #[test]
    fn monotonic_over_unit_interval() {
        let mapper = compact();
        let order = |c: char| mapper.ramp().chars().iter().position(|&x| x == c).unwrap();
        let mut prev = 0;
        for i in 0..=512 {
            let idx = order(mapper.map_to_glyph(i as f32 / 512.0));
            assert!(idx >= prev);
            prev = idx;
        }
    }

    #[test]
    fn map_grid_tints_and_inverts() {
        let mut grid = LuminanceGrid::new(2, 1);
        grid.values = vec![0.0, 1.0];
        grid.colors = vec![(0, 0, 0), (255, 0, 0)];

        let plain = compact().with_color(ColorMode::Direct, 1.0).map_grid(&grid);
        assert_eq!(plain.lines(), vec![" @".to_string()]);
        assert_eq!(plain.get(1, 0).fg, (255, 0, 0));

        let inverted = compact()
            .with_color(ColorMode::Monochrome, 1.0)
            .inverted(true)
            .map_grid(&grid);
        assert_eq!(inverted.lines(), vec!["@ ".to_string()]);
        assert_eq!(inverted.get(0, 0).fg, (255, 255, 255));
    }
}
