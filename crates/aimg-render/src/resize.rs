use aimg_core::frame::FrameBuffer;
use anyhow::{Context, Result, bail};
use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer as FirResizer};

/// Resizer réutilisable wrappant fast_image_resize.
///
/// Garde le resizer et un tampon source entre deux frames.
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    src_buf: Vec<u8>,
}

impl Resizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new(),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` (RGB or RGBA) into the RGBA buffer `dst`, whose
    /// dimensions set the output size. A zero-sized `dst` is a no-op.
    ///
    /// # Errors
    /// Returns an error if `src` is malformed or the resize fails.
    ///
    /// # Example
    /// ```
    /// use aimg_render::resize::Resizer;
    /// use aimg_core::frame::FrameBuffer;
    /// let mut r = Resizer::new();
    /// let src = FrameBuffer::filled(100, 100, (10, 20, 30));
    /// let mut dst = FrameBuffer::new(50, 50);
    /// r.resize_into(&src, &mut dst).unwrap();
    /// let (r, g, b, _) = dst.pixel(25, 25);
    /// assert!(r.abs_diff(10) <= 1 && g.abs_diff(20) <= 1 && b.abs_diff(30) <= 1);
    /// ```
    pub fn resize_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        if !src.is_well_formed() || src.width == 0 || src.height == 0 {
            bail!(
                "Source {}×{} {:?} invalide ({} octets)",
                src.width,
                src.height,
                src.format,
                src.data.len()
            );
        }
        if dst.width == 0 || dst.height == 0 {
            return Ok(());
        }

        let src = src.to_rgba();
        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(&src.data);
            return Ok(());
        }

        // fast_image_resize veut une source mutable : copie dans le tampon interne.
        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .context("Dimensions source invalides")?;
        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("Dimensions destination invalides")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Redimensionnement échoué")?;
        Ok(())
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}
