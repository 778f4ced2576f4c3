use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{CHARSET_COMPACT, GlyphRamp};
pub use crate::color::ColorMode;
use crate::error::CoreError;

/// Borne haute de `max_output_size`, en glyphes.
pub const MAX_OUTPUT_SIZE: u32 = 4096;

/// Configuration complète, hot-rechargeable.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use aimg_core::config::AsciiConfig;
/// let config = AsciiConfig::default();
/// assert_eq!(config.max_output_size, 100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AsciiConfig {
    // === Conversion ===
    /// Borne de la plus grande dimension de la grille, en caractères.
    pub max_output_size: u32,
    /// Rampe littérale (du plus sombre au plus lumineux) ou preset `@nom`.
    pub charset: String,
    /// Rapport hauteur/largeur d'une cellule de glyphe.
    pub glyph_aspect: f32,
    /// Inverser la luminance (pour fond clair).
    pub invert: bool,
    /// Couleur des glyphes.
    pub color_mode: ColorMode,
    /// Saturation boost [0.0, 3.0]. 1.0 = neutre.
    pub saturation: f32,
    /// Plus grand côté de l'aperçu de la source, en pixels.
    pub preview_max_size: u32,

    // === Vidéo ===
    /// Conversions par seconde pendant la lecture.
    pub frame_rate: f64,

    // === Police ===
    /// Police TrueType/OpenType. `None` = police bitmap intégrée.
    pub font_path: Option<PathBuf>,
    /// Taille de police en pixels (hauteur de cellule).
    pub font_size: f32,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            max_output_size: 100,
            charset: CHARSET_COMPACT.to_string(),
            glyph_aspect: 2.0,
            invert: false,
            color_mode: ColorMode::HsvBright,
            saturation: 1.0,
            preview_max_size: 640,
            frame_rate: 24.0,
            font_path: None,
            font_size: 16.0,
        }
    }
}

impl AsciiConfig {
    /// Clamp soft numeric fields to their valid ranges.
    ///
    /// Hard limits (`max_output_size`, `frame_rate`, `charset`) are not clamped;
    /// [`AsciiConfig::validate`] rejects them instead.
    pub fn clamp_all(&mut self) {
        self.glyph_aspect = self.glyph_aspect.clamp(0.5, 4.0);
        self.saturation = self.saturation.clamp(0.0, 3.0);
        self.preview_max_size = self.preview_max_size.clamp(16, 4096);
        self.font_size = self.font_size.clamp(4.0, 128.0);
    }

    /// Check the values the engine refuses to run with.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_output_size == 0 || self.max_output_size > MAX_OUTPUT_SIZE {
            return Err(CoreError::Config(format!(
                "max_output_size doit être dans [1, {MAX_OUTPUT_SIZE}] (reçu {})",
                self.max_output_size
            )));
        }
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(CoreError::Config(format!(
                "frame_rate doit être > 0 (reçu {})",
                self.frame_rate
            )));
        }
        GlyphRamp::resolve(&self.charset)?;
        Ok(())
    }

    /// Resolved glyph ramp.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if `charset` is not a usable ramp.
    pub fn ramp(&self) -> Result<GlyphRamp, CoreError> {
        GlyphRamp::resolve(&self.charset)
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    engine: Option<EngineSection>,
    video: Option<VideoSection>,
    font: Option<FontSection>,
}

#[derive(Deserialize)]
struct EngineSection {
    max_output_size: Option<u32>,
    charset: Option<String>,
    glyph_aspect: Option<f32>,
    invert: Option<bool>,
    color_mode: Option<ColorMode>,
    saturation: Option<f32>,
    preview_max_size: Option<u32>,
}

#[derive(Deserialize)]
struct VideoSection {
    frame_rate: Option<f64>,
}

#[derive(Deserialize)]
struct FontSection {
    path: Option<PathBuf>,
    size: Option<f32>,
}

/// Parse une config TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the TOML is malformed (including negative sizes) or
/// if the merged config fails validation.
///
/// # Example
/// ```
/// use aimg_core::config::parse_config;
/// let config = parse_config("[engine]\nmax_output_size = 42\n").unwrap();
/// assert_eq!(config.max_output_size, 42);
/// assert_eq!(config.frame_rate, 24.0);
/// ```
pub fn parse_config(content: &str) -> Result<AsciiConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;

    let mut config = AsciiConfig::default();

    if let Some(e) = file.engine {
        if let Some(v) = e.max_output_size {
            config.max_output_size = v;
        }
        if let Some(v) = e.charset {
            config.charset = v;
        }
        if let Some(v) = e.glyph_aspect {
            config.glyph_aspect = v;
        }
        if let Some(v) = e.invert {
            config.invert = v;
        }
        if let Some(v) = e.color_mode {
            config.color_mode = v;
        }
        if let Some(v) = e.saturation {
            config.saturation = v;
        }
        if let Some(v) = e.preview_max_size {
            config.preview_max_size = v;
        }
    }
    if let Some(v) = file.video.and_then(|v| v.frame_rate) {
        config.frame_rate = v;
    }
    if let Some(f) = file.font {
        if f.path.is_some() {
            config.font_path = f.path;
        }
        if let Some(v) = f.size {
            config.font_size = v;
        }
    }

    config.clamp_all();
    config.validate()?;
    Ok(config)
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed or validated.
///
/// # Example
/// ```no_run
/// use aimg_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AsciiConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Config invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config("[video]\nframe_rate = 12.5\n").unwrap();
        assert!((config.frame_rate - 12.5).abs() < f64::EPSILON);
        assert_eq!(config.max_output_size, 100);
        assert_eq!(config.color_mode, ColorMode::HsvBright);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("").unwrap(), AsciiConfig::default());
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(parse_config("[engine]\nmax_output_size = 0\n").is_err());
    }

    #[test]
    fn negative_size_is_rejected_at_parse() {
        assert!(parse_config("[engine]\nmax_output_size = -5\n").is_err());
    }

    #[test]
    fn oversized_output_is_rejected() {
        assert!(parse_config("[engine]\nmax_output_size = 4096\n").is_ok());
        assert!(parse_config("[engine]\nmax_output_size = 4097\n").is_err());
        assert!(parse_config("[engine]\nmax_output_size = 4294967295\n").is_err());
    }

    #[test]
    fn non_positive_frame_rate_is_rejected() {
        assert!(parse_config("[video]\nframe_rate = 0.0\n").is_err());
        assert!(parse_config("[video]\nframe_rate = -24.0\n").is_err());
    }

    #[test]
    fn soft_fields_are_clamped() {
        let config = parse_config(
            "[engine]\nglyph_aspect = 99.0\nsaturation = -1.0\n[font]\nsize = 1.0\n",
        )
        .unwrap();
        assert!((config.glyph_aspect - 4.0).abs() < f32::EPSILON);
        assert!(config.saturation.abs() < f32::EPSILON);
        assert!((config.font_size - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn preset_charset_and_color_mode() {
        let config =
            parse_config("[engine]\ncharset = \"@blocks\"\ncolor_mode = \"Monochrome\"\n")
                .unwrap();
        assert_eq!(config.ramp().unwrap().brightest(), '█');
        assert_eq!(config.color_mode, ColorMode::Monochrome);
        assert!(parse_config("[engine]\ncharset = \"@unknown\"\n").is_err());
    }

    #[test]
    fn load_config_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nmax_output_size = 64\n[font]\npath = \"mono.ttf\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.max_output_size, 64);
        assert_eq!(config.font_path.as_deref(), Some(Path::new("mono.ttf")));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/definitely/not/here.toml")).is_err());
    }
}
