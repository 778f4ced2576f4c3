use std::borrow::Cow;

/// Layout of one pixel in a [`FrameBuffer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel.
    Rgb8,
    /// 4 bytes per pixel, alpha last.
    #[default]
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[inline(always)]
    #[must_use]
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Buffer de pixels source, row-major, sans padding.
///
/// Emprunté par le moteur le temps d'une conversion, jamais conservé.
///
/// # Example
/// ```
/// use aimg_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels, row-major, `format.channels()` bytes per pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout of `data`.
    pub format: PixelFormat,
}

impl FrameBuffer {
    /// Crée un buffer RGBA noir transparent aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use aimg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.width, 100);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
            format: PixelFormat::Rgba8,
        }
    }

    /// Wrap an existing buffer. The length is not checked here; consumers
    /// that index pixels call [`FrameBuffer::is_well_formed`] first.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Un buffer RGBA uni, pratique pour les tests.
    ///
    /// # Example
    /// ```
    /// use aimg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, (255, 255, 255));
    /// assert_eq!(fb.pixel(1, 1), (255, 255, 255, 255));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: (u8, u8, u8)) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        Self::from_raw(width, height, PixelFormat::Rgba8, data)
    }

    /// Number of bytes `data` must hold for the declared size and format.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.channels()
    }

    /// True when both dimensions are non-zero and `data` covers them.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() >= self.expected_len()
    }

    /// Accès au pixel (x, y) → (r, g, b, a). Les sources RGB renvoient a = 255.
    ///
    /// # Example
    /// ```
    /// use aimg_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(10, 10);
    /// assert_eq!(fb.pixel(0, 0), (0, 0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let channels = self.format.channels();
        let idx = (y as usize * self.width as usize + x as usize) * channels;
        if idx + channels > self.data.len() {
            return (0, 0, 0, 0);
        }
        let alpha = if channels == 4 { self.data[idx + 3] } else { 255 };
        (self.data[idx], self.data[idx + 1], self.data[idx + 2], alpha)
    }

    /// Vue RGBA du buffer : emprunt si déjà RGBA, copie convertie sinon.
    #[must_use]
    pub fn to_rgba(&self) -> Cow<'_, FrameBuffer> {
        match self.format {
            PixelFormat::Rgba8 => Cow::Borrowed(self),
            PixelFormat::Rgb8 => {
                let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 4);
                for px in self.data.chunks_exact(3) {
                    data.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
                Cow::Owned(Self::from_raw(
                    self.width,
                    self.height,
                    PixelFormat::Rgba8,
                    data,
                ))
            }
        }
    }
}

/// Grille de luminance produite par l'échantillonneur, une valeur par cellule.
///
/// `values` sont dans [0, 1]. `colors` porte la moyenne RGB de chaque cellule
/// pour la teinte des glyphes.
#[derive(Clone, Debug, PartialEq)]
pub struct LuminanceGrid {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
    /// Row-major luminance, one per cell.
    pub values: Vec<f32>,
    /// Row-major mean colour, one per cell.
    pub colors: Vec<(u8, u8, u8)>,
}

impl LuminanceGrid {
    /// Crée une grille noire.
    ///
    /// # Example
    /// ```
    /// use aimg_core::frame::LuminanceGrid;
    /// let grid = LuminanceGrid::new(4, 3);
    /// assert_eq!(grid.values.len(), 12);
    /// assert_eq!(grid.get(3, 2), 0.0);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            values: vec![0.0; len],
            colors: vec![(0, 0, 0); len],
        }
    }

    /// Luminance at cell (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    /// Mean colour at cell (x, y).
    #[inline(always)]
    #[must_use]
    pub fn color(&self, x: u32, y: u32) -> (u8, u8, u8) {
        self.colors[y as usize * self.width as usize + x as usize]
    }
}

/// Grille de sortie ASCII.
///
/// # Example
/// ```
/// use aimg_core::frame::{AsciiGrid, AsciiCell};
/// let mut grid = AsciiGrid::new(80, 24);
/// grid.set(0, 0, AsciiCell { ch: '@', fg: (255, 0, 0), bg: (0, 0, 0) });
/// assert_eq!(grid.get(0, 0).ch, '@');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsciiGrid {
    /// Flat array of cells, row-major.
    pub cells: Vec<AsciiCell>,
    /// Width in characters.
    pub width: u32,
    /// Height in characters.
    pub height: u32,
}

/// Single cell in the ASCII grid.
///
/// # Example
/// ```
/// use aimg_core::frame::AsciiCell;
/// let cell = AsciiCell::default();
/// assert_eq!(cell.ch, ' ');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AsciiCell {
    /// Caractère à afficher.
    pub ch: char,
    /// Couleur foreground (RGB).
    pub fg: (u8, u8, u8),
    /// Couleur background (RGB). (0,0,0) = fond par défaut.
    pub bg: (u8, u8, u8),
}

impl Default for AsciiCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: (0, 0, 0),
            bg: (0, 0, 0),
        }
    }
}

impl AsciiGrid {
    /// Crée une grille vide.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: vec![AsciiCell::default(); width as usize * height as usize],
            width,
            height,
        }
    }

    /// Set a cell at position (x, y).
    #[inline(always)]
    pub fn set(&mut self, x: u32, y: u32, cell: AsciiCell) {
        self.cells[y as usize * self.width as usize + x as usize] = cell;
    }

    /// Get a cell reference at position (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> &AsciiCell {
        &self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Rows as strings, for logging and tests.
    ///
    /// # Example
    /// ```
    /// use aimg_core::frame::{AsciiGrid, AsciiCell};
    /// let mut grid = AsciiGrid::new(2, 1);
    /// grid.set(1, 0, AsciiCell { ch: '#', ..AsciiCell::default() });
    /// assert_eq!(grid.lines(), vec![" #".to_string()]);
    /// ```
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(|c| c.ch).collect())
            .collect()
    }

    /// Resize and clear. Reuses the allocation when possible.
    pub fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(width as usize * height as usize, AsciiCell::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_pixels_report_opaque_alpha() {
        let fb = FrameBuffer::from_raw(2, 1, PixelFormat::Rgb8, vec![10, 20, 30, 40, 50, 60]);
        assert!(fb.is_well_formed());
        assert_eq!(fb.pixel(1, 0), (40, 50, 60, 255));
    }

    #[test]
    fn short_buffer_is_not_well_formed() {
        let fb = FrameBuffer::from_raw(4, 4, PixelFormat::Rgba8, vec![0; 10]);
        assert!(!fb.is_well_formed());
        let empty = FrameBuffer::new(0, 5);
        assert!(!empty.is_well_formed());
    }

    #[test]
    fn to_rgba_expands_rgb() {
        let fb = FrameBuffer::from_raw(1, 1, PixelFormat::Rgb8, vec![1, 2, 3]);
        let rgba = fb.to_rgba();
        assert_eq!(rgba.format, PixelFormat::Rgba8);
        assert_eq!(rgba.data, vec![1, 2, 3, 255]);
    }

    #[test]
    fn ascii_grid_reset_clears() {
        let mut grid = AsciiGrid::new(3, 3);
        grid.set(1, 1, AsciiCell { ch: 'x', ..AsciiCell::default() });
        grid.reset(2, 4);
        assert_eq!(grid.cells.len(), 8);
        assert!(grid.cells.iter().all(|c| c.ch == ' '));
    }
}
