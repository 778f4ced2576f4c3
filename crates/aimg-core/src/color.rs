use serde::{Deserialize, Serialize};

/// Couleur des glyphes dérivée de la couleur moyenne d'une cellule.
///
/// # Example
/// ```
/// use aimg_core::color::ColorMode;
/// assert_eq!(ColorMode::default(), ColorMode::HsvBright);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ColorMode {
    /// Glyphes blancs.
    Monochrome,
    /// Teinte et saturation de la cellule, V forcé à 1.0 : le glyphe porte la luminance.
    #[default]
    HsvBright,
    /// Couleur moyenne brute.
    Direct,
}

/// Hue in [0, 1), saturation and value in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    /// Convert from 8-bit RGB.
    ///
    /// # Example
    /// ```
    /// use aimg_core::color::Hsv;
    /// let hsv = Hsv::from_rgb(0, 0, 255);
    /// assert!((hsv.h - 2.0 / 3.0).abs() < 1e-4);
    /// assert!((hsv.s - 1.0).abs() < 1e-4);
    /// ```
    #[must_use]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (r, g, b) = (
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        );
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            ((g - b) / delta).rem_euclid(6.0) / 6.0
        } else if max == g {
            ((b - r) / delta + 2.0) / 6.0
        } else {
            ((r - g) / delta + 4.0) / 6.0
        };
        let s = if max == 0.0 { 0.0 } else { delta / max };
        Self { h, s, v: max }
    }

    /// Convert back to 8-bit RGB.
    ///
    /// # Example
    /// ```
    /// use aimg_core::color::Hsv;
    /// assert_eq!(Hsv { h: 0.0, s: 1.0, v: 1.0 }.to_rgb(), (255, 0, 0));
    /// ```
    #[must_use]
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h6 = self.h.rem_euclid(1.0) * 6.0;
        let sector = h6.floor();
        let f = h6 - sector;
        let (v, s) = (self.v, self.s);
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match sector as u32 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        let to_u8 = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        (to_u8(r), to_u8(g), to_u8(b))
    }
}

/// Couleur d'un glyphe pour une couleur moyenne de cellule.
///
/// # Example
/// ```
/// use aimg_core::color::{tint, ColorMode};
/// assert_eq!(tint((10, 20, 30), ColorMode::Direct, 1.0), (10, 20, 30));
/// assert_eq!(tint((10, 20, 30), ColorMode::Monochrome, 1.0), (255, 255, 255));
/// // Un gris sombre devient blanc : la luminance est portée par le glyphe.
/// assert_eq!(tint((40, 40, 40), ColorMode::HsvBright, 1.0), (255, 255, 255));
/// ```
#[must_use]
pub fn tint(rgb: (u8, u8, u8), mode: ColorMode, saturation_boost: f32) -> (u8, u8, u8) {
    match mode {
        ColorMode::Monochrome => (255, 255, 255),
        ColorMode::Direct => rgb,
        ColorMode::HsvBright => {
            let hsv = Hsv::from_rgb(rgb.0, rgb.1, rgb.2);
            Hsv {
                h: hsv.h,
                s: (hsv.s * saturation_boost).clamp(0.0, 1.0),
                v: 1.0,
            }
            .to_rgb()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_roundtrip_within_one_step() {
        for r in (0..=255u8).step_by(51) {
            for g in (0..=255u8).step_by(51) {
                for b in (0..=255u8).step_by(51) {
                    let (r2, g2, b2) = Hsv::from_rgb(r, g, b).to_rgb();
                    assert!((i16::from(r) - i16::from(r2)).abs() <= 1, "R {r} vs {r2}");
                    assert!((i16::from(g) - i16::from(g2)).abs() <= 1, "G {g} vs {g2}");
                    assert!((i16::from(b) - i16::from(b2)).abs() <= 1, "B {b} vs {b2}");
                }
            }
        }
    }

    #[test]
    fn hsv_bright_keeps_hue_and_maxes_value() {
        let before = Hsv::from_rgb(200, 50, 50);
        let (r, g, b) = tint((200, 50, 50), ColorMode::HsvBright, 1.0);
        let after = Hsv::from_rgb(r, g, b);
        assert!((before.h - after.h).abs() < 0.01, "hue shifted");
        assert!((after.v - 1.0).abs() < 0.01);
    }

    #[test]
    fn saturation_boost_is_clamped() {
        let (r, g, b) = tint((255, 0, 0), ColorMode::HsvBright, 3.0);
        assert_eq!((r, g, b), (255, 0, 0));
    }
}
