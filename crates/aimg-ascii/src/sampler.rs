use aimg_core::config::MAX_OUTPUT_SIZE;
use aimg_core::error::ConvertError;
use aimg_core::frame::{FrameBuffer, LuminanceGrid};
use rayon::prelude::*;

/// Rapport hauteur/largeur par défaut d'une cellule de police terminal.
pub const DEFAULT_GLYPH_ASPECT: f32 = 2.0;

/// Poids perceptuels BT.601.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Luminance perceptuelle normalisée dans [0, 1].
///
/// # Example
/// ```
/// use aimg_ascii::sampler::luminance;
/// assert!((luminance(255, 255, 255) - 1.0).abs() < 1e-6);
/// assert_eq!(luminance(0, 0, 0), 0.0);
/// ```
#[inline(always)]
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    weighted(f64::from(r), f64::from(g), f64::from(b), 1.0)
}

#[inline(always)]
fn weighted(r: f64, g: f64, b: f64, count: f64) -> f32 {
    let l = (LUMA_R * r + LUMA_G * g + LUMA_B * b) / (count * 255.0);
    (l as f32).clamp(0.0, 1.0)
}

/// Réduit une frame source en grille de luminance (filtre boîte).
///
/// # Example
/// ```
/// use aimg_ascii::sampler::PixelSampler;
/// use aimg_core::frame::FrameBuffer;
///
/// let frame = FrameBuffer::filled(100, 50, (255, 255, 255));
/// let grid = PixelSampler::default().sample(&frame, 10).unwrap();
/// assert_eq!((grid.width, grid.height), (10, 3));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct PixelSampler {
    glyph_aspect: f32,
}

impl Default for PixelSampler {
    fn default() -> Self {
        Self::new(DEFAULT_GLYPH_ASPECT)
    }
}

impl PixelSampler {
    /// Sampler compensating for glyphs `glyph_aspect` times taller than wide.
    /// Non-finite or non-positive factors fall back to the default.
    #[must_use]
    pub fn new(glyph_aspect: f32) -> Self {
        let glyph_aspect = if glyph_aspect.is_finite() && glyph_aspect > 0.0 {
            glyph_aspect
        } else {
            log::warn!("glyph_aspect {glyph_aspect} invalide, retour à {DEFAULT_GLYPH_ASPECT}");
            DEFAULT_GLYPH_ASPECT
        };
        Self { glyph_aspect }
    }

    /// Aspect factor in use.
    #[must_use]
    pub fn glyph_aspect(&self) -> f32 {
        self.glyph_aspect
    }

    /// Grid size for a source of `width × height` pixels.
    ///
    /// The larger source side maps to `max_output_size`; the row count is
    /// divided by the glyph aspect. Both sides are at least 1.
    ///
    /// # Example
    /// ```
    /// use aimg_ascii::sampler::PixelSampler;
    /// let s = PixelSampler::new(2.0);
    /// assert_eq!(s.output_size(1920, 1080, 160), (160, 45));
    /// assert_eq!(s.output_size(1080, 1920, 160), (90, 80));
    /// ```
    #[must_use]
    pub fn output_size(&self, width: u32, height: u32, max_output_size: u32) -> (u32, u32) {
        let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
        let max = f64::from(max_output_size);
        let aspect = f64::from(self.glyph_aspect);
        let round_positive = |v: f64| (v.round() as u32).max(1);

        if width >= height {
            (max_output_size.max(1), round_positive(max * h / w / aspect))
        } else {
            (round_positive(max * w / h), round_positive(max / aspect))
        }
    }

    /// Sample `source` into a fresh luminance grid.
    ///
    /// # Errors
    /// [`ConvertError::InvalidConfig`] if `max_output_size` is 0 or above
    /// [`MAX_OUTPUT_SIZE`];
    /// [`ConvertError::InvalidSource`] for a zero-sized or truncated buffer.
    pub fn sample(
        &self,
        source: &FrameBuffer,
        max_output_size: u32,
    ) -> Result<LuminanceGrid, ConvertError> {
        if max_output_size == 0 {
            return Err(ConvertError::InvalidConfig(
                "max output size must be greater than 0".to_string(),
            ));
        }
        if max_output_size > MAX_OUTPUT_SIZE {
            return Err(ConvertError::InvalidConfig(format!(
                "max output size {max_output_size} exceeds {MAX_OUTPUT_SIZE}"
            )));
        }
        if source.width == 0 || source.height == 0 {
            return Err(ConvertError::InvalidSource(format!(
                "source has zero dimension ({}×{})",
                source.width, source.height
            )));
        }
        if source.data.len() < source.expected_len() {
            return Err(ConvertError::InvalidSource(format!(
                "source buffer holds {} bytes, {}×{} {:?} needs {}",
                source.data.len(),
                source.width,
                source.height,
                source.format,
                source.expected_len()
            )));
        }

        let (cols, rows) = self.output_size(source.width, source.height, max_output_size);
        let x_spans: Vec<(u32, u32)> = (0..cols).map(|c| span(c, cols, source.width)).collect();

        let mut grid = LuminanceGrid::new(cols, rows);
        let channels = source.format.channels();
        let stride = source.width as usize * channels;

        grid.values
            .par_chunks_exact_mut(cols as usize)
            .zip(grid.colors.par_chunks_exact_mut(cols as usize))
            .enumerate()
            .for_each(|(cy, (values, colors))| {
                let (y0, y1) = span(cy as u32, rows, source.height);
                for (cx, &(x0, x1)) in x_spans.iter().enumerate() {
                    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
                    for y in y0..y1 {
                        let row = y as usize * stride;
                        let start = row + x0 as usize * channels;
                        let end = row + x1 as usize * channels;
                        for px in source.data[start..end].chunks_exact(channels) {
                            r += u64::from(px[0]);
                            g += u64::from(px[1]);
                            b += u64::from(px[2]);
                        }
                    }
                    let count = u64::from(x1 - x0) * u64::from(y1 - y0);
                    values[cx] = weighted(r as f64, g as f64, b as f64, count as f64);
                    colors[cx] = (mean(r, count), mean(g, count), mean(b, count));
                }
            });

        Ok(grid)
    }
}

/// Source range `[start, end)` covered by output index `i` of `n` over `len`
/// source pixels. Never empty.
#[inline(always)]
fn span(i: u32, n: u32, len: u32) -> (u32, u32) {
    let (i, n, len64) = (u64::from(i), u64::from(n), u64::from(len));
    let start = ((i * len64) / n).min(len64 - 1);
    let end = ((i + 1) * len64).div_ceil(n).clamp(start + 1, len64);
    (start as u32, end as u32)
}

#[inline(always)]
fn mean(sum: u64, count: u64) -> u8 {
    ((sum + count / 2) / count).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimg_core::frame::PixelFormat;

    #[test]
    fn landscape_larger_side_matches_max() {
        let s = PixelSampler::default();
        for max in [1u32, 2, 7, 10, 80, 333] {
            let (cols, rows) = s.output_size(640, 480, max);
            assert_eq!(cols, max);
            assert!(rows >= 1);
        }
    }

    #[test]
    fn portrait_rows_are_aspect_corrected() {
        let s = PixelSampler::new(2.0);
        let (cols, rows) = s.output_size(50, 100, 10);
        assert_eq!((cols, rows), (5, 5));
        let (cols, rows) = PixelSampler::new(1.0).output_size(50, 100, 10);
        assert_eq!((cols, rows), (5, 10));
    }

    #[test]
    fn extreme_ratios_stay_at_least_one_cell() {
        let s = PixelSampler::default();
        assert_eq!(s.output_size(10_000, 1, 20), (20, 1));
        assert_eq!(s.output_size(1, 10_000, 1), (1, 1));
    }

    #[test]
    fn white_image_is_fully_bright() {
        let frame = FrameBuffer::filled(100, 50, (255, 255, 255));
        let grid = PixelSampler::default().sample(&frame, 10).unwrap();
        assert_eq!(grid.width, 10);
        assert!(grid.values.iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(grid.colors.iter().all(|&c| c == (255, 255, 255)));
    }

    #[test]
    fn box_filter_averages_region() {
        // 2×1 source, left black, right white, sampled to one cell.
        let frame = FrameBuffer::from_raw(
            2,
            1,
            PixelFormat::Rgba8,
            vec![0, 0, 0, 255, 255, 255, 255, 255],
        );
        let grid = PixelSampler::new(1.0).sample(&frame, 1).unwrap();
        assert_eq!((grid.width, grid.height), (1, 1));
        assert!((grid.get(0, 0) - 0.5).abs() < 1e-6);
        assert_eq!(grid.color(0, 0), (128, 128, 128));
    }

    #[test]
    fn rgb_sources_are_supported() {
        let frame = FrameBuffer::from_raw(1, 1, PixelFormat::Rgb8, vec![0, 255, 0]);
        let grid = PixelSampler::default().sample(&frame, 1).unwrap();
        assert!((grid.get(0, 0) - 0.587).abs() < 1e-4);
    }

    #[test]
    fn upsampling_reads_nearest_region() {
        let frame = FrameBuffer::from_raw(
            2,
            1,
            PixelFormat::Rgba8,
            vec![0, 0, 0, 255, 255, 255, 255, 255],
        );
        let grid = PixelSampler::new(1.0).sample(&frame, 4).unwrap();
        assert_eq!(grid.width, 4);
        assert_eq!(grid.values[..2], [0.0, 0.0]);
        assert!(grid.values[2..].iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn zero_dimension_is_invalid_source() {
        let s = PixelSampler::default();
        for (w, h) in [(0, 10), (10, 0), (0, 0)] {
            let err = s.sample(&FrameBuffer::new(w, h), 10).unwrap_err();
            assert!(matches!(err, ConvertError::InvalidSource(_)), "{w}×{h}");
        }
    }

    #[test]
    fn truncated_buffer_is_invalid_source() {
        let frame = FrameBuffer::from_raw(4, 4, PixelFormat::Rgba8, vec![0; 12]);
        let err = PixelSampler::default().sample(&frame, 2).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidSource(_)));
    }

    #[test]
    fn zero_size_is_invalid_config() {
        let frame = FrameBuffer::filled(4, 4, (1, 2, 3));
        let err = PixelSampler::default().sample(&frame, 0).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn oversized_max_is_invalid_config() {
        let frame = FrameBuffer::filled(2, 1, (255, 255, 255));
        let s = PixelSampler::default();
        let err = s.sample(&frame, u32::MAX).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
        assert!(s.sample(&frame, MAX_OUTPUT_SIZE + 1).is_err());

        let grid = s.sample(&frame, MAX_OUTPUT_SIZE).unwrap();
        assert_eq!(grid.width, MAX_OUTPUT_SIZE);
    }

    #[test]
    fn sampling_is_deterministic() {
        let mut frame = FrameBuffer::new(97, 61);
        for (i, b) in frame.data.iter_mut().enumerate() {
            *b = (i * 31 % 251) as u8;
        }
        let s = PixelSampler::default();
        let a = s.sample(&frame, 40).unwrap();
        let b = s.sample(&frame, 40).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn spans_cover_source_without_gaps() {
        let (n, len) = (7u32, 23u32);
        let mut covered = 0;
        for i in 0..n {
            let (s, e) = span(i, n, len);
            assert!(s < e && e <= len);
            assert!(s <= covered, "gap before span {i}");
            covered = covered.max(e);
        }
        assert_eq!(covered, len);
    }
}
