use std::collections::HashMap;
use std::path::Path;

use ab_glyph::{Font, FontRef, PxScale, point};
use aimg_core::config::AsciiConfig;
use aimg_core::traits::FontMetrics;
use anyhow::{Context, Result};

use crate::font::{CELL_HEIGHT, CELL_WIDTH, builtin_chars, builtin_mask};

/// Taille de référence de la police intégrée (une cellule de base = 8 px).
const BUILTIN_BASE_PX: f32 = CELL_HEIGHT as f32;

/// Atlas logiciel : un masque alpha par caractère, pré-rastérisé.
///
/// Toutes les cellules ont la même taille ([`GlyphAtlas::metrics`]). Les
/// caractères absents de l'atlas se dessinent vides.
///
/// # Example
/// ```
/// use aimg_render::atlas::GlyphAtlas;
/// let atlas = GlyphAtlas::builtin(16.0);
/// let m = atlas.metrics();
/// assert_eq!((m.cell_width, m.cell_height), (12, 16));
/// assert_eq!(atlas.mask('@').len(), 12 * 16);
/// ```
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    metrics: FontMetrics,
    glyphs: HashMap<char, Vec<u8>>,
    empty: Vec<u8>,
}

impl GlyphAtlas {
    /// Atlas from the built-in bitmap font, scaled by an integer factor
    /// `round(font_size / 8)`, at least 1.
    #[must_use]
    pub fn builtin(font_size: f32) -> Self {
        let factor = if font_size.is_finite() {
            (font_size / BUILTIN_BASE_PX).round().max(1.0) as u32
        } else {
            1
        };
        let metrics = FontMetrics::new(CELL_WIDTH * factor, CELL_HEIGHT * factor);
        let (w, h) = (metrics.cell_width as usize, metrics.cell_height as usize);

        let mut glyphs = HashMap::new();
        for ch in builtin_chars() {
            let Some(base) = builtin_mask(ch) else {
                continue;
            };
            let mut mask = vec![0u8; w * h];
            for (i, a) in mask.iter_mut().enumerate() {
                let (x, y) = (i % w, i / w);
                let f = factor as usize;
                *a = base[(y / f) * CELL_WIDTH as usize + x / f];
            }
            glyphs.insert(ch, mask);
        }

        Self {
            metrics,
            glyphs,
            empty: vec![0u8; w * h],
        }
    }

    /// Rasterise an OpenType/TrueType font at `scale_px`.
    ///
    /// Covers printable ASCII, Latin-1 and the block elements. Characters
    /// the font has no outline for (`.notdef`) are left out.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn from_font_data(font_data: &[u8], scale_px: f32) -> Result<Self> {
        let font = FontRef::try_from_slice(font_data).context("Police invalide")?;
        let scale = PxScale::from(scale_px);
        let units = font.height_unscaled();

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / units).ceil() as u32;
        let width = (font.h_advance_unscaled(font.glyph_id('M')) * scale.x / units).ceil() as u32;
        let metrics = FontMetrics::new(width, height);

        let mut atlas = Self {
            metrics,
            glyphs: HashMap::new(),
            empty: vec![0u8; (metrics.cell_width * metrics.cell_height) as usize],
        };
        atlas.rasterize_range(&font, scale, 0x20..=0x7E);
        atlas.rasterize_range(&font, scale, 0xA0..=0xFF);
        atlas.rasterize_range(&font, scale, 0x2580..=0x259F);

        log::debug!(
            "Atlas TTF : {} glyphes, cellule {}×{}",
            atlas.glyphs.len(),
            metrics.cell_width,
            metrics.cell_height
        );
        Ok(atlas)
    }

    fn rasterize_range(
        &mut self,
        font: &FontRef,
        scale: PxScale,
        range: std::ops::RangeInclusive<u32>,
    ) {
        let (cw, ch_h) = (self.metrics.cell_width, self.metrics.cell_height);
        let ascent_px = font.ascent_unscaled() * scale.y / font.height_unscaled();

        for ch in range.filter_map(char::from_u32) {
            let gid = font.glyph_id(ch);
            if gid.0 == 0 {
                continue;
            }
            let mut mask = vec![0u8; (cw * ch_h) as usize];
            let glyph = gid.with_scale_and_position(scale, point(0.0, ascent_px));
            if let Some(outline) = font.outline_glyph(glyph) {
                let bounds = outline.px_bounds();
                #[allow(clippy::cast_possible_wrap)]
                outline.draw(|x, y, v| {
                    let px = (x as i32 + bounds.min.x as i32).max(0) as u32;
                    let py = (y as i32 + bounds.min.y as i32).max(0) as u32;
                    if px < cw && py < ch_h {
                        mask[(py * cw + px) as usize] = (v * 255.0).round() as u8;
                    }
                });
            }
            self.glyphs.insert(ch, mask);
        }
    }

    /// Load the font file at `path`, falling back to the built-in font if it
    /// cannot be read or parsed.
    #[must_use]
    pub fn from_path_or_builtin(path: &Path, font_size: f32) -> Self {
        match std::fs::read(path)
            .with_context(|| format!("Lecture de {}", path.display()))
            .and_then(|data| Self::from_font_data(&data, font_size))
        {
            Ok(atlas) => atlas,
            Err(e) => {
                log::warn!("Police {} ignorée : {e:#}", path.display());
                Self::builtin(font_size)
            }
        }
    }

    /// Atlas described by `config`: its font file if one is set, otherwise
    /// the built-in font.
    #[must_use]
    pub fn for_config(config: &AsciiConfig) -> Self {
        match &config.font_path {
            Some(path) => Self::from_path_or_builtin(path, config.font_size),
            None => Self::builtin(config.font_size),
        }
    }

    /// Cell size shared by every glyph.
    #[must_use]
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    /// Alpha mask of `ch`, `cell_width × cell_height`, row-major.
    #[must_use]
    pub fn mask(&self, ch: char) -> &[u8] {
        self.glyphs.get(&ch).unwrap_or(&self.empty)
    }

    /// Whether `ch` has a glyph.
    #[must_use]
    pub fn contains(&self, ch: char) -> bool {
        self.glyphs.contains_key(&ch)
    }

    /// Characters of `charset` with no glyph in this atlas.
    #[must_use]
    pub fn missing(&self, charset: &[char]) -> Vec<char> {
        charset
            .iter()
            .copied()
            .filter(|c| !self.contains(*c))
            .collect()
    }
}

impl Default for GlyphAtlas {
    fn default() -> Self {
        Self::builtin(AsciiConfig::default().font_size)
    }
}
