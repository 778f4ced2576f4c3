use aimg_core::error::{ConvertError, TargetError};
use aimg_core::frame::{AsciiGrid, FrameBuffer};
use aimg_core::traits::{FontMetrics, RenderTarget};

/// Plus grand côté par défaut de l'aperçu source, en pixels.
pub const DEFAULT_PREVIEW_MAX_SIZE: u32 = 640;

/// Fond des deux surfaces.
pub const BACKGROUND: (u8, u8, u8) = (0, 0, 0);

/// Écrit l'aperçu source et la grille de glyphes sur deux surfaces.
///
/// Ne conserve rien entre deux appels : chaque rendu remplace entièrement
/// le contenu des surfaces.
///
/// # Example
/// ```
/// use aimg_render::FrameRenderer;
/// let r = FrameRenderer::new(640);
/// assert_eq!(r.preview_size(1920, 1080), (640, 360));
/// assert_eq!(r.preview_size(320, 200), (320, 200));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FrameRenderer {
    preview_max_size: u32,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_MAX_SIZE)
    }
}

impl FrameRenderer {
    #[must_use]
    pub fn new(preview_max_size: u32) -> Self {
        Self {
            preview_max_size: preview_max_size.max(1),
        }
    }

    /// Source scaled down (never up) so its larger side is at most
    /// `preview_max_size`.
    #[must_use]
    pub fn preview_size(&self, width: u32, height: u32) -> (u32, u32) {
        let larger = width.max(height);
        if larger <= self.preview_max_size {
            return (width, height);
        }
        let scale = f64::from(self.preview_max_size) / f64::from(larger);
        let fit = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
        (fit(width), fit(height))
    }

    /// Draw `source` on `input` and `grid` on `output`.
    ///
    /// Both surfaces are checked before either is touched.
    ///
    /// # Errors
    /// [`ConvertError::RenderTargetUnavailable`] if a surface is detached
    /// or rejects the drawing.
    pub fn render(
        &self,
        grid: &AsciiGrid,
        source: &FrameBuffer,
        input: &mut dyn RenderTarget,
        output: &mut dyn RenderTarget,
        font: FontMetrics,
    ) -> Result<(), ConvertError> {
        if !input.is_attached() {
            return Err(unavailable("input preview", &TargetError::Detached));
        }
        if !output.is_attached() {
            return Err(unavailable("ascii output", &TargetError::Detached));
        }
        self.render_preview(source, input)?;
        self.render_output(grid, output, font)
    }

    /// Scaled copy of `source` on `input`.
    ///
    /// # Errors
    /// [`ConvertError::RenderTargetUnavailable`] on surface failure.
    pub fn render_preview(
        &self,
        source: &FrameBuffer,
        input: &mut dyn RenderTarget,
    ) -> Result<(), ConvertError> {
        let (w, h) = self.preview_size(source.width, source.height);
        input
            .reset(w, h, BACKGROUND)
            .and_then(|()| input.draw_image(source))
            .map_err(|e| unavailable("input preview", &e))
    }

    /// Every glyph of `grid` on `output`, one `font` cell each. The surface
    /// is resized to exactly `cols × cell_width` by `rows × cell_height`.
    ///
    /// # Errors
    /// [`ConvertError::RenderTargetUnavailable`] on surface failure.
    pub fn render_output(
        &self,
        grid: &AsciiGrid,
        output: &mut dyn RenderTarget,
        font: FontMetrics,
    ) -> Result<(), ConvertError> {
        let (w, h) = font.grid_pixels(grid.width, grid.height);
        output
            .reset(w, h, BACKGROUND)
            .map_err(|e| unavailable("ascii output", &e))?;

        for y in 0..grid.height {
            for x in 0..grid.width {
                let cell = grid.get(x, y);
                if cell.ch == ' ' {
                    continue;
                }
                output
                    .fill_glyph(cell.ch, x * font.cell_width, y * font.cell_height, cell.fg)
                    .map_err(|e| unavailable("ascii output", &e))?;
            }
        }
        Ok(())
    }
}

fn unavailable(surface: &str, err: &TargetError) -> ConvertError {
    log::debug!("Surface {surface} refusée : {err}");
    ConvertError::RenderTargetUnavailable(format!("{surface}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimg_core::frame::AsciiCell;
    use std::sync::Arc;

    use crate::{Canvas, GlyphAtlas, TerminalCanvas};

    fn grid(text: &[&str]) -> AsciiGrid {
        let width = text[0].chars().count() as u32;
        let mut g = AsciiGrid::new(width, text.len() as u32);
        for (y, row) in text.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                g.set(
                    x as u32,
                    y as u32,
                    AsciiCell {
                        ch,
                        fg: (255, 255, 255),
                        bg: BACKGROUND,
                    },
                );
            }
        }
        g
    }

    #[test]
    fn output_is_sized_to_grid_and_font() {
        let atlas = Arc::new(GlyphAtlas::builtin(16.0));
        let font = atlas.metrics();
        let mut input = Canvas::new(atlas.clone());
        let mut output = Canvas::new(atlas);
        let source = FrameBuffer::filled(100, 50, (255, 255, 255));

        FrameRenderer::default()
            .render(&grid(&["@@", "@@", "@@"]), &source, &mut input, &mut output, font)
            .unwrap();

        assert_eq!(output.size(), (2 * 12, 3 * 16));
        assert_eq!(input.size(), (100, 50));
    }

    #[test]
    fn previous_content_is_replaced() {
        let mut out = TerminalCanvas::text(10, 10);
        let renderer = FrameRenderer::default();
        renderer
            .render_output(&grid(&["###", "###"]), &mut out, FontMetrics::unit())
            .unwrap();
        renderer
            .render_output(&grid(&[". "]), &mut out, FontMetrics::unit())
            .unwrap();
        assert_eq!(out.grid().lines(), vec![". ".to_string()]);
    }

    #[test]
    fn detached_output_touches_nothing() {
        let atlas = Arc::new(GlyphAtlas::builtin(8.0));
        let mut input = Canvas::new(atlas.clone());
        let mut output = Canvas::new(atlas.clone());
        output.detach_handle().detach();

        let err = FrameRenderer::default()
            .render(
                &grid(&["@"]),
                &FrameBuffer::filled(4, 4, (1, 1, 1)),
                &mut input,
                &mut output,
                atlas.metrics(),
            )
            .unwrap_err();

        assert!(matches!(err, ConvertError::RenderTargetUnavailable(_)));
        assert_eq!(input.size(), (0, 0));
    }

    #[test]
    fn detached_input_is_reported() {
        let mut input = TerminalCanvas::preview(10, 10);
        let mut output = TerminalCanvas::text(10, 10);
        input.detach_handle().detach();
        let err = FrameRenderer::default()
            .render(
                &grid(&["@"]),
                &FrameBuffer::filled(4, 4, (1, 1, 1)),
                &mut input,
                &mut output,
                FontMetrics::unit(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ConvertError::RenderTargetUnavailable("input preview: surface detached".into())
        );
    }
}
