use std::path::PathBuf;

use aimg_core::color::ColorMode;
use aimg_core::config::{AsciiConfig, MAX_OUTPUT_SIZE};
use clap::Parser;

/// ascii-image — convertit une image ou une vidéo en ASCII art, en direct.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Source : chemin vers une image (PNG, JPEG, BMP, GIF, WebP).
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Source : chemin vers une vidéo (décodée par ffmpeg, doit être dans le PATH).
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Fichier de configuration TOML.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Nombre de glyphes sur le plus grand côté, dans [1, 4096].
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_OUTPUT_SIZE)))]
    pub size: Option<u32>,

    /// Cadence de conversion vidéo, en images par seconde.
    #[arg(long)]
    pub fps: Option<f64>,

    /// Police TrueType/OpenType pour les glyphes.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Taille de police en pixels.
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Glyphes blancs, sans teinte.
    #[arg(long, default_value_t = false)]
    pub mono: bool,

    /// Inverser la rampe (fonds clairs).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Source choisie sur la ligne de commande.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceArg {
    Image(PathBuf),
    Video(PathBuf),
}

impl SourceArg {
    /// File name for the status line.
    #[must_use]
    pub fn display_name(&self) -> String {
        let (Self::Image(path) | Self::Video(path)) = self;
        path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }
}

/// Valeurs CLI qui priment sur le fichier de config, y compris après
/// rechargement à chaud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overrides {
    pub size: Option<u32>,
    pub fps: Option<f64>,
    pub font: Option<PathBuf>,
    pub font_size: Option<f32>,
    pub mono: bool,
    pub invert: bool,
}

impl Overrides {
    /// Write the overrides into `config`, then re-clamp it.
    pub fn apply(&self, config: &mut AsciiConfig) {
        if let Some(size) = self.size {
            config.max_output_size = size;
        }
        if let Some(fps) = self.fps {
            config.frame_rate = fps;
        }
        if let Some(ref font) = self.font {
            config.font_path = Some(font.clone());
        }
        if let Some(px) = self.font_size {
            config.font_size = px;
        }
        if self.mono {
            config.color_mode = ColorMode::Monochrome;
        }
        if self.invert {
            config.invert = true;
        }
        config.clamp_all();
    }
}

impl Cli {
    /// Exactly one of `--image` / `--video`.
    ///
    /// # Errors
    /// Returns an error if zero or both sources are specified.
    pub fn source(&self) -> anyhow::Result<SourceArg> {
        match (&self.image, &self.video) {
            (Some(path), None) => Ok(SourceArg::Image(path.clone())),
            (None, Some(path)) => Ok(SourceArg::Video(path.clone())),
            (None, None) => {
                anyhow::bail!("Aucune source spécifiée. Utilisez --image ou --video.")
            }
            (Some(_), Some(_)) => {
                anyhow::bail!("Une seule source à la fois : --image OU --video.")
            }
        }
    }

    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            size: self.size,
            fps: self.fps,
            font: self.font.clone(),
            font_size: self.font_size,
            mono: self.mono,
            invert: self.invert,
        }
    }
}
