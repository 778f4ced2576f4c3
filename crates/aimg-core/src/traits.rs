use std::sync::Arc;

use crate::error::{CaptureError, TargetError};
use crate::frame::FrameBuffer;

/// Taille d'une cellule de glyphe, en pixels de la surface cible.
///
/// # Example
/// ```
/// use aimg_core::traits::FontMetrics;
/// let m = FontMetrics::new(6, 8);
/// assert_eq!(m.grid_pixels(10, 3), (60, 24));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontMetrics {
    /// Cell width in pixels.
    pub cell_width: u32,
    /// Cell height in pixels.
    pub cell_height: u32,
}

impl FontMetrics {
    /// Metrics with each side clamped to at least one pixel.
    #[must_use]
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
        }
    }

    /// One terminal cell per glyph.
    #[must_use]
    pub fn unit() -> Self {
        Self::new(1, 1)
    }

    /// Pixel size of a `cols × rows` glyph grid.
    #[must_use]
    pub fn grid_pixels(&self, cols: u32, rows: u32) -> (u32, u32) {
        (
            cols.saturating_mul(self.cell_width),
            rows.saturating_mul(self.cell_height),
        )
    }
}

/// Surface de dessin adressable, possédée par l'appelant.
///
/// Implémenté par : `Canvas` (raster RGBA en mémoire), `TerminalCanvas`
/// (cellules de terminal). Le moteur écrit dedans, ne relit jamais.
///
/// # Example
/// ```
/// use aimg_core::traits::{FontMetrics, RenderTarget};
/// use aimg_core::frame::FrameBuffer;
/// use aimg_core::error::TargetError;
///
/// struct Null;
/// impl RenderTarget for Null {
///     fn is_attached(&self) -> bool { true }
///     fn font_metrics(&self) -> FontMetrics { FontMetrics::unit() }
///     fn size(&self) -> (u32, u32) { (0, 0) }
///     fn reset(&mut self, _w: u32, _h: u32, _bg: (u8, u8, u8)) -> Result<(), TargetError> { Ok(()) }
///     fn draw_image(&mut self, _image: &FrameBuffer) -> Result<(), TargetError> { Ok(()) }
///     fn fill_glyph(&mut self, _ch: char, _x: u32, _y: u32, _fg: (u8, u8, u8)) -> Result<(), TargetError> { Ok(()) }
/// }
/// ```
pub trait RenderTarget {
    /// False once the owner tore the surface down.
    fn is_attached(&self) -> bool;

    /// Metrics of the font this surface draws glyphs with.
    fn font_metrics(&self) -> FontMetrics;

    /// Current size in surface pixels.
    fn size(&self) -> (u32, u32);

    /// Resize to `width × height` pixels and clear to `background`.
    ///
    /// # Errors
    /// [`TargetError::Detached`] if the surface is gone.
    fn reset(&mut self, width: u32, height: u32, background: (u8, u8, u8))
    -> Result<(), TargetError>;

    /// Draw `image` scaled to the whole surface.
    ///
    /// # Errors
    /// [`TargetError::Detached`] if the surface is gone, [`TargetError::Invalid`]
    /// if the image cannot be drawn.
    fn draw_image(&mut self, image: &FrameBuffer) -> Result<(), TargetError>;

    /// Draw one glyph with its cell's top-left corner at pixel (x, y).
    ///
    /// # Errors
    /// [`TargetError::Detached`] if the surface is gone.
    fn fill_glyph(&mut self, ch: char, x: u32, y: u32, fg: (u8, u8, u8))
    -> Result<(), TargetError>;
}

/// Source vidéo lue par le scheduler à chaque tick.
///
/// Implémenté par : `VideoPlayer` (ffmpeg), sources de test.
pub trait VideoSource {
    /// Lecture en pause.
    fn is_paused(&self) -> bool;

    /// Fin du flux atteinte.
    fn is_ended(&self) -> bool;

    /// Frame courante, jamais une frame en file d'attente.
    ///
    /// # Errors
    /// [`CaptureError::Transient`] during seeks, restarts and teardown;
    /// [`CaptureError::Fault`] for anything unexpected.
    fn capture_frame(&mut self) -> Result<Arc<FrameBuffer>, CaptureError>;
}
