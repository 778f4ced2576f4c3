use std::path::Path;

use aimg_core::frame::{FrameBuffer, PixelFormat};
use anyhow::{Context, Result, bail};
use image::DynamicImage;

/// Charge une image depuis le disque en RGBA.
///
/// # Errors
/// Retourne une erreur si le fichier est illisible, dans un format non
/// supporté, ou vide (0 pixel).
///
/// # Example
/// ```no_run
/// use aimg_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("photo.png")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    to_frame(img).with_context(|| format!("Image vide : {}", path.display()))
}

/// Décode une image encodée (PNG, JPEG, BMP, GIF, WebP) depuis la mémoire.
///
/// # Errors
/// Retourne une erreur si le format n'est pas reconnu ou l'image est vide.
pub fn decode_image(bytes: &[u8]) -> Result<FrameBuffer> {
    let img = image::load_from_memory(bytes).context("Image illisible")?;
    to_frame(img)
}

fn to_frame(img: DynamicImage) -> Result<FrameBuffer> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        bail!("dimensions {width}×{height}");
    }
    log::debug!("Image décodée : {width}×{height}");
    Ok(FrameBuffer::from_raw(
        width,
        height,
        PixelFormat::Rgba8,
        rgba.into_raw(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(4, 2, |x, _| {
            if x % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn load_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        checker().save(&path).unwrap();

        let frame = load_image(&path).unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert_eq!(frame.format, PixelFormat::Rgba8);
        assert_eq!(frame.pixel(0, 0), (255, 255, 255, 255));
        assert_eq!(frame.pixel(1, 1), (0, 0, 0, 255));
    }

    #[test]
    fn decode_from_memory() {
        let mut bytes = Vec::new();
        checker()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let frame = decode_image(&bytes).unwrap();
        assert!(frame.is_well_formed());
        assert_eq!(frame.data.len(), 4 * 2 * 4);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_image(Path::new("/nonexistent/nope.png")).unwrap_err();
        assert!(format!("{err:#}").contains("nope.png"));
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        assert!(decode_image(b"definitely not an image").is_err());
    }
}
