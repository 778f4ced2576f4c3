use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aimg_core::error::TargetError;
use aimg_core::frame::FrameBuffer;
use aimg_core::traits::{FontMetrics, RenderTarget};

use crate::atlas::GlyphAtlas;
use crate::resize::Resizer;

/// Plus grand côté accepté par `reset`, en pixels.
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// Poignée permettant au propriétaire de détacher une surface depuis un
/// autre thread. Les écritures suivantes échouent avec
/// [`TargetError::Detached`].
#[derive(Clone, Debug)]
pub struct DetachHandle(Arc<AtomicBool>);

impl DetachHandle {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Tear the surface down.
    pub fn detach(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether the surface is still usable.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn check(&self) -> Result<(), TargetError> {
        if self.is_attached() {
            Ok(())
        } else {
            Err(TargetError::Detached)
        }
    }
}

/// Surface raster RGBA en mémoire : glyphes dessinés depuis un [`GlyphAtlas`].
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use aimg_core::traits::RenderTarget;
/// use aimg_render::{Canvas, GlyphAtlas};
///
/// let mut canvas = Canvas::new(Arc::new(GlyphAtlas::builtin(8.0)));
/// canvas.reset(12, 8, (0, 0, 0)).unwrap();
/// canvas.fill_glyph('█', 0, 0, (255, 0, 0)).unwrap();
/// assert_eq!(canvas.pixels().pixel(0, 0), (255, 0, 0, 255));
/// assert_eq!(canvas.pixels().pixel(6, 0), (0, 0, 0, 255));
/// ```
pub struct Canvas {
    frame: FrameBuffer,
    atlas: Arc<GlyphAtlas>,
    handle: DetachHandle,
    resizer: Resizer,
}

impl Canvas {
    /// Empty 0×0 canvas drawing glyphs from `atlas`.
    #[must_use]
    pub fn new(atlas: Arc<GlyphAtlas>) -> Self {
        Self {
            frame: FrameBuffer::new(0, 0),
            atlas,
            handle: DetachHandle::new(),
            resizer: Resizer::new(),
        }
    }

    /// Handle to detach this canvas from elsewhere.
    #[must_use]
    pub fn detach_handle(&self) -> DetachHandle {
        self.handle.clone()
    }

    /// Current pixels, RGBA.
    #[must_use]
    pub fn pixels(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Swap the glyph atlas (font change on reload).
    pub fn set_atlas(&mut self, atlas: Arc<GlyphAtlas>) {
        self.atlas = atlas;
    }
}

impl RenderTarget for Canvas {
    fn is_attached(&self) -> bool {
        self.handle.is_attached()
    }

    fn font_metrics(&self) -> FontMetrics {
        self.atlas.metrics()
    }

    fn size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn reset(
        &mut self,
        width: u32,
        height: u32,
        background: (u8, u8, u8),
    ) -> Result<(), TargetError> {
        self.handle.check()?;
        if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
            return Err(TargetError::Invalid(format!(
                "{width}×{height} dépasse {MAX_SURFACE_SIDE} px"
            )));
        }
        let len = width as usize * height as usize * 4;
        self.frame.width = width;
        self.frame.height = height;
        self.frame.data.clear();
        self.frame.data.reserve(len);
        for _ in 0..(len / 4) {
            self.frame
                .data
                .extend_from_slice(&[background.0, background.1, background.2, 255]);
        }
        Ok(())
    }

    fn draw_image(&mut self, image: &FrameBuffer) -> Result<(), TargetError> {
        self.handle.check()?;
        self.resizer
            .resize_into(image, &mut self.frame)
            .map_err(|e| TargetError::Invalid(format!("{e:#}")))
    }

    fn fill_glyph(&mut self, ch: char, x: u32, y: u32, fg: (u8, u8, u8)) -> Result<(), TargetError> {
        self.handle.check()?;
        let metrics = self.atlas.metrics();
        let mask = self.atlas.mask(ch);
        let (fw, fh) = (self.frame.width, self.frame.height);
        let stride = fw as usize * 4;

        for gy in 0..metrics.cell_height {
            let py = y.saturating_add(gy);
            if py >= fh {
                break;
            }
            for gx in 0..metrics.cell_width {
                let px = x.saturating_add(gx);
                if px >= fw {
                    break;
                }
                let alpha = u32::from(mask[(gy * metrics.cell_width + gx) as usize]);
                if alpha == 0 {
                    continue;
                }
                let idx = py as usize * stride + px as usize * 4;
                let dst = &mut self.frame.data[idx..idx + 4];
                let inv = 255 - alpha;
                dst[0] = ((u32::from(fg.0) * alpha + u32::from(dst[0]) * inv) / 255) as u8;
                dst[1] = ((u32::from(fg.1) * alpha + u32::from(dst[1]) * inv) / 255) as u8;
                dst[2] = ((u32::from(fg.2) * alpha + u32::from(dst[2]) * inv) / 255) as u8;
                dst[3] = 255;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(Arc::new(GlyphAtlas::builtin(8.0)))
    }

    #[test]
    fn reset_clears_to_background() {
        let mut c = canvas();
        c.reset(3, 2, (1, 2, 3)).unwrap();
        assert_eq!(c.size(), (3, 2));
        assert!(c.pixels().data.chunks_exact(4).all(|p| p == [1, 2, 3, 255]));
    }

    #[test]
    fn glyph_is_clipped_at_edges() {
        let mut c = canvas();
        c.reset(8, 8, (0, 0, 0)).unwrap();
        c.fill_glyph('█', 4, 4, (9, 9, 9)).unwrap();
        assert_eq!(c.pixels().pixel(7, 7), (9, 9, 9, 255));
        assert_eq!(c.pixels().pixel(3, 3), (0, 0, 0, 255));
        c.fill_glyph('█', 100, 100, (9, 9, 9)).unwrap();
    }

    #[test]
    fn space_draws_nothing() {
        let mut c = canvas();
        c.reset(6, 8, (5, 5, 5)).unwrap();
        c.fill_glyph(' ', 0, 0, (255, 255, 255)).unwrap();
        assert!(c.pixels().data.chunks_exact(4).all(|p| p == [5, 5, 5, 255]));
    }

    #[test]
    fn draw_image_scales_to_surface() {
        let mut c = canvas();
        c.reset(4, 2, (0, 0, 0)).unwrap();
        c.draw_image(&FrameBuffer::filled(40, 20, (200, 100, 50))).unwrap();
        let (r, g, b, a) = c.pixels().pixel(3, 1);
        assert!(r.abs_diff(200) <= 1 && g.abs_diff(100) <= 1 && b.abs_diff(50) <= 1);
        assert_eq!(a, 255);
    }

    #[test]
    fn detached_canvas_rejects_writes() {
        let mut c = canvas();
        c.reset(4, 4, (0, 0, 0)).unwrap();
        let handle = c.detach_handle();
        handle.detach();
        assert!(!c.is_attached());
        assert_eq!(c.reset(4, 4, (0, 0, 0)), Err(TargetError::Detached));
        assert_eq!(c.fill_glyph('#', 0, 0, (1, 1, 1)), Err(TargetError::Detached));
        assert_eq!(
            c.draw_image(&FrameBuffer::filled(1, 1, (1, 1, 1))),
            Err(TargetError::Detached)
        );
    }

    #[test]
    fn oversized_reset_is_invalid() {
        let mut c = canvas();
        let err = c.reset(MAX_SURFACE_SIDE + 1, 1, (0, 0, 0)).unwrap_err();
        assert!(matches!(err, TargetError::Invalid(_)));
    }
}
