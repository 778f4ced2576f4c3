use aimg_core::error::TargetError;
use aimg_core::frame::{AsciiCell, AsciiGrid, FrameBuffer};
use aimg_core::traits::{FontMetrics, RenderTarget};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

use crate::canvas::DetachHandle;

/// Surface de cellules terminal.
///
/// Deux usages :
/// - [`TerminalCanvas::text`] : un pixel de surface = une cellule, les
///   glyphes sont écrits tels quels (sortie ASCII).
/// - [`TerminalCanvas::preview`] : deux pixels verticaux par cellule (`▄`,
///   haut = bg, bas = fg), la surface est réduite pour tenir dans le viewport.
///
/// # Example
/// ```
/// use aimg_core::traits::RenderTarget;
/// use aimg_render::TerminalCanvas;
///
/// let mut out = TerminalCanvas::text(80, 24);
/// out.reset(3, 1, (0, 0, 0)).unwrap();
/// out.fill_glyph('@', 1, 0, (255, 255, 255)).unwrap();
/// assert_eq!(out.grid().lines(), vec![" @ ".to_string()]);
/// ```
pub struct TerminalCanvas {
    grid: AsciiGrid,
    viewport: (u16, u16),
    rows_per_cell: u32,
    fit_viewport: bool,
    pixel_size: (u32, u32),
    handle: DetachHandle,
}

impl TerminalCanvas {
    /// One surface pixel per cell. Content past the viewport is clipped.
    #[must_use]
    pub fn text(cols: u16, rows: u16) -> Self {
        Self::with_layout(cols, rows, 1, false)
    }

    /// Half-block image surface, shrunk to fit `cols × rows` cells.
    #[must_use]
    pub fn preview(cols: u16, rows: u16) -> Self {
        Self::with_layout(cols, rows, 2, true)
    }

    fn with_layout(cols: u16, rows: u16, rows_per_cell: u32, fit_viewport: bool) -> Self {
        Self {
            grid: AsciiGrid::new(0, 0),
            viewport: (cols, rows),
            rows_per_cell,
            fit_viewport,
            pixel_size: (0, 0),
            handle: DetachHandle::new(),
        }
    }

    /// Terminal area available to this surface, in cells. Takes effect on
    /// the next `reset`.
    pub fn set_viewport(&mut self, cols: u16, rows: u16) {
        self.viewport = (cols, rows);
    }

    /// Viewport in cells.
    #[must_use]
    pub fn viewport(&self) -> (u16, u16) {
        self.viewport
    }

    /// Handle to detach this surface from elsewhere.
    #[must_use]
    pub fn detach_handle(&self) -> DetachHandle {
        self.handle.clone()
    }

    /// Cells as last drawn.
    #[must_use]
    pub fn grid(&self) -> &AsciiGrid {
        &self.grid
    }

    /// Fit `width × height` surface pixels into the viewport, keeping the
    /// aspect ratio and never enlarging.
    fn fitted(&self, width: u32, height: u32) -> (u32, u32) {
        if !self.fit_viewport || width == 0 || height == 0 {
            return (width, height);
        }
        let max_w = f64::from(self.viewport.0);
        let max_h = f64::from(self.viewport.1) * f64::from(self.rows_per_cell);
        let scale = (max_w / f64::from(width))
            .min(max_h / f64::from(height))
            .min(1.0);
        let w = ((f64::from(width) * scale).round() as u32).min(max_w as u32);
        let h = ((f64::from(height) * scale).round() as u32).min(max_h as u32);
        (w.clamp(1, width), h.clamp(1, height))
    }

    /// Copie les cellules dans un buffer ratatui, tronquées à `area`.
    pub fn blit(&self, area: Rect, buf: &mut Buffer) {
        let rows = self.grid.height.min(u32::from(area.height));
        let cols = self.grid.width.min(u32::from(area.width));
        for cy in 0..rows {
            for cx in 0..cols {
                let cell = self.grid.get(cx, cy);
                let pos = (area.x + cx as u16, area.y + cy as u16);
                if let Some(buf_cell) = buf.cell_mut(pos) {
                    buf_cell.set_char(cell.ch);
                    buf_cell.set_fg(Color::Rgb(cell.fg.0, cell.fg.1, cell.fg.2));
                    if cell.bg != (0, 0, 0) {
                        buf_cell.set_bg(Color::Rgb(cell.bg.0, cell.bg.1, cell.bg.2));
                    }
                }
            }
        }
    }
}

impl Widget for &TerminalCanvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.blit(area, buf);
    }
}

impl RenderTarget for TerminalCanvas {
    fn is_attached(&self) -> bool {
        self.handle.is_attached()
    }

    fn font_metrics(&self) -> FontMetrics {
        FontMetrics::new(1, self.rows_per_cell)
    }

    fn size(&self) -> (u32, u32) {
        self.pixel_size
    }

    fn reset(
        &mut self,
        width: u32,
        height: u32,
        background: (u8, u8, u8),
    ) -> Result<(), TargetError> {
        self.handle.check()?;
        let (w, h) = self.fitted(width, height);
        self.pixel_size = (w, h);
        self.grid.reset(w, h.div_ceil(self.rows_per_cell));
        let blank = AsciiCell {
            ch: ' ',
            fg: background,
            bg: background,
        };
        self.grid.cells.fill(blank);
        Ok(())
    }

    fn draw_image(&mut self, image: &FrameBuffer) -> Result<(), TargetError> {
        self.handle.check()?;
        if !image.is_well_formed() {
            return Err(TargetError::Invalid(format!(
                "image {}×{} malformée",
                image.width, image.height
            )));
        }
        let (pw, ph) = self.pixel_size;
        if pw == 0 || ph == 0 {
            return Ok(());
        }
        let sample = |x: u32, y: u32| {
            let sx = (u64::from(x) * u64::from(image.width) / u64::from(pw)) as u32;
            let sy = (u64::from(y.min(ph - 1)) * u64::from(image.height) / u64::from(ph)) as u32;
            let (r, g, b, _) = image.pixel(
                sx.min(image.width - 1),
                sy.min(image.height - 1),
            );
            (r, g, b)
        };

        for cy in 0..self.grid.height {
            for cx in 0..self.grid.width {
                let cell = if self.rows_per_cell == 2 {
                    AsciiCell {
                        ch: '▄',
                        fg: sample(cx, cy * 2 + 1),
                        bg: sample(cx, cy * 2),
                    }
                } else {
                    let rgb = sample(cx, cy);
                    AsciiCell {
                        ch: '█',
                        fg: rgb,
                        bg: rgb,
                    }
                };
                self.grid.set(cx, cy, cell);
            }
        }
        Ok(())
    }

    fn fill_glyph(&mut self, ch: char, x: u32, y: u32, fg: (u8, u8, u8)) -> Result<(), TargetError> {
        self.handle.check()?;
        let cy = y / self.rows_per_cell;
        if x < self.grid.width && cy < self.grid.height {
            let bg = self.grid.get(x, cy).bg;
            self.grid.set(x, cy, AsciiCell { ch, fg, bg });
        }
        Ok(())
    }
}
