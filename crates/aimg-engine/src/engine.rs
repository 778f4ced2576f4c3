use std::sync::Arc;

use aimg_ascii::{GlyphMapper, PixelSampler};
use aimg_core::charset::GlyphRamp;
use aimg_core::color::ColorMode;
use aimg_core::config::AsciiConfig;
use aimg_core::error::{ConvertError, CoreError};
use aimg_core::frame::{AsciiGrid, FrameBuffer, LuminanceGrid};
use aimg_core::traits::RenderTarget;
use aimg_render::{FrameRenderer, GlyphAtlas};
use arc_swap::ArcSwapOption;

/// Ressources du processus, publiées par [`init`], retirées par [`teardown`].
static RESOURCES: ArcSwapOption<EngineResources> = ArcSwapOption::const_empty();

/// Immutable resources shared by every conversion: the glyph ramp and the
/// font atlas the output surfaces draw with.
#[derive(Debug)]
pub struct EngineResources {
    ramp: Arc<GlyphRamp>,
    atlas: Arc<GlyphAtlas>,
}

impl EngineResources {
    #[must_use]
    pub fn new(ramp: GlyphRamp, atlas: GlyphAtlas) -> Self {
        Self {
            ramp: Arc::new(ramp),
            atlas: Arc::new(atlas),
        }
    }

    /// Build the ramp and the atlas described by `config`.
    ///
    /// # Errors
    /// [`CoreError::Config`] if the charset does not resolve to a ramp.
    pub fn from_config(config: &AsciiConfig) -> Result<Self, CoreError> {
        let ramp = config.ramp()?;
        let atlas = GlyphAtlas::for_config(config);
        let missing = atlas.missing(ramp.chars());
        if !missing.is_empty() {
            log::warn!("Glyphes absents de la police, rendus vides : {missing:?}");
        }
        Ok(Self::new(ramp, atlas))
    }

    #[must_use]
    pub fn ramp(&self) -> &Arc<GlyphRamp> {
        &self.ramp
    }

    #[must_use]
    pub fn atlas(&self) -> &Arc<GlyphAtlas> {
        &self.atlas
    }
}

impl Default for EngineResources {
    fn default() -> Self {
        Self::new(GlyphRamp::default(), GlyphAtlas::default())
    }
}

/// Build the process-wide resources from `config` and publish them,
/// replacing any previous ones.
///
/// # Errors
/// [`CoreError::Config`] if the charset is invalid; nothing is published.
///
/// # Example
/// ```
/// use aimg_core::config::AsciiConfig;
/// use aimg_engine::{ConversionEngine, EngineOptions, init, teardown};
///
/// init(&AsciiConfig::default()).unwrap();
/// assert!(ConversionEngine::global(EngineOptions::default()).is_ok());
/// teardown();
/// ```
pub fn init(config: &AsciiConfig) -> Result<Arc<EngineResources>, CoreError> {
    let resources = Arc::new(EngineResources::from_config(config)?);
    RESOURCES.store(Some(Arc::clone(&resources)));
    log::info!(
        "Moteur initialisé : rampe de {} glyphes, cellule {}×{}",
        resources.ramp.len(),
        resources.atlas.metrics().cell_width,
        resources.atlas.metrics().cell_height
    );
    Ok(resources)
}

/// Drop the process-wide resources. Engines already built keep theirs.
pub fn teardown() {
    if RESOURCES.swap(None).is_some() {
        log::info!("Moteur libéré");
    }
}

/// Currently published resources, if any.
#[must_use]
pub fn resources() -> Option<Arc<EngineResources>> {
    RESOURCES.load_full()
}

/// Per-conversion settings, cheap to change between frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineOptions {
    pub glyph_aspect: f32,
    pub color_mode: ColorMode,
    pub saturation: f32,
    pub invert: bool,
    pub preview_max_size: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_config(&AsciiConfig::default())
    }
}

impl EngineOptions {
    #[must_use]
    pub fn from_config(config: &AsciiConfig) -> Self {
        Self {
            glyph_aspect: config.glyph_aspect,
            color_mode: config.color_mode,
            saturation: config.saturation,
            invert: config.invert,
            preview_max_size: config.preview_max_size,
        }
    }
}

/// Grilles produites par une conversion, telles que rendues.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    pub luminance: LuminanceGrid,
    pub glyphs: AsciiGrid,
}

/// Pipeline d'une frame : échantillonnage → glyphes → rendu.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use aimg_core::frame::FrameBuffer;
/// use aimg_engine::{ConversionEngine, EngineOptions, EngineResources};
/// use aimg_render::TerminalCanvas;
///
/// let engine = ConversionEngine::new(Arc::new(EngineResources::default()), EngineOptions::default());
/// let mut input = TerminalCanvas::preview(80, 24);
/// let mut output = TerminalCanvas::text(80, 24);
/// let white = FrameBuffer::filled(100, 50, (255, 255, 255));
///
/// let conv = engine.convert(&white, &mut input, &mut output, 10).unwrap();
/// assert!(conv.glyphs.lines().iter().all(|l| l == "@@@@@@@@@@"));
/// ```
#[derive(Debug, Clone)]
pub struct ConversionEngine {
    resources: Arc<EngineResources>,
    options: EngineOptions,
    sampler: PixelSampler,
    mapper: GlyphMapper,
    renderer: FrameRenderer,
}

impl ConversionEngine {
    #[must_use]
    pub fn new(resources: Arc<EngineResources>, options: EngineOptions) -> Self {
        let mapper = GlyphMapper::new(Arc::clone(&resources.ramp));
        let mut engine = Self {
            resources,
            options,
            sampler: PixelSampler::default(),
            mapper,
            renderer: FrameRenderer::default(),
        };
        engine.set_options(options);
        engine
    }

    /// Engine over the resources published by [`init`].
    ///
    /// # Errors
    /// [`ConvertError::NotInitialized`] before `init` or after `teardown`.
    pub fn global(options: EngineOptions) -> Result<Self, ConvertError> {
        let resources = resources().ok_or(ConvertError::NotInitialized)?;
        Ok(Self::new(resources, options))
    }

    /// Replace the per-conversion options. Resources are kept.
    pub fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
        self.sampler = PixelSampler::new(options.glyph_aspect);
        self.mapper = GlyphMapper::new(Arc::clone(&self.resources.ramp))
            .with_color(options.color_mode, options.saturation)
            .inverted(options.invert);
        self.renderer = FrameRenderer::new(options.preview_max_size);
    }

    #[must_use]
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    #[must_use]
    pub fn resources(&self) -> &Arc<EngineResources> {
        &self.resources
    }

    /// Convert one frame and draw it: `source` scaled onto `input`, its
    /// glyph grid onto `output` in the output surface's font.
    ///
    /// # Errors
    /// - [`ConvertError::InvalidConfig`] if `max_output_size` is 0 or above
    ///   `MAX_OUTPUT_SIZE`;
    /// - [`ConvertError::InvalidSource`] for an empty or truncated source;
    /// - [`ConvertError::RenderTargetUnavailable`] if a surface is detached
    ///   or rejects the drawing.
    pub fn convert(
        &self,
        source: &FrameBuffer,
        input: &mut dyn RenderTarget,
        output: &mut dyn RenderTarget,
        max_output_size: u32,
    ) -> Result<Conversion, ConvertError> {
        let luminance = self.sampler.sample(source, max_output_size)?;
        let glyphs = self.mapper.map_grid(&luminance);
        let font = output.font_metrics();
        self.renderer.render(&glyphs, source, input, output, font)?;
        log::trace!(
            "Frame {}×{} → {}×{} glyphes",
            source.width,
            source.height,
            glyphs.width,
            glyphs.height
        );
        Ok(Conversion { luminance, glyphs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimg_core::frame::PixelFormat;
    use aimg_render::{Canvas, TerminalCanvas};

    fn engine() -> ConversionEngine {
        ConversionEngine::new(
            Arc::new(EngineResources::default()),
            EngineOptions::default(),
        )
    }

    fn surfaces() -> (TerminalCanvas, TerminalCanvas) {
        (TerminalCanvas::preview(80, 24), TerminalCanvas::text(200, 200))
    }

    #[test]
    fn white_image_is_brightest_glyph_everywhere() {
        let (mut input, mut output) = surfaces();
        let white = FrameBuffer::filled(100, 50, (255, 255, 255));
        let conv = engine().convert(&white, &mut input, &mut output, 10).unwrap();
        assert_eq!(conv.glyphs.width, 10);
        assert!(conv.glyphs.cells.iter().all(|c| c.ch == '@'));
        assert!(output.grid().lines().iter().all(|l| l == "@@@@@@@@@@"));
    }

    #[test]
    fn larger_side_matches_max_output_size() {
        let (mut input, mut output) = surfaces();
        let e = engine();
        for (w, h) in [(640, 480), (300, 300), (1920, 1080)] {
            let conv = e
                .convert(&FrameBuffer::filled(w, h, (9, 9, 9)), &mut input, &mut output, 80)
                .unwrap();
            assert_eq!(conv.glyphs.width, 80, "{w}×{h}");
            assert!(conv.glyphs.height >= 1);
        }
    }

    #[test]
    fn conversion_is_deterministic() {
        let (mut input, mut output) = surfaces();
        let mut frame = FrameBuffer::new(123, 77);
        for (i, b) in frame.data.iter_mut().enumerate() {
            *b = (i * 7 % 256) as u8;
        }
        let e = engine();
        let a = e.convert(&frame, &mut input, &mut output, 50).unwrap();
        let first = output.grid().clone();
        let b = e.convert(&frame, &mut input, &mut output, 50).unwrap();
        assert_eq!(a, b);
        assert_eq!(&first, output.grid());
    }

    #[test]
    fn zero_dimension_is_invalid_source() {
        let (mut input, mut output) = surfaces();
        let empty = FrameBuffer::from_raw(0, 10, PixelFormat::Rgba8, Vec::new());
        let err = engine()
            .convert(&empty, &mut input, &mut output, 10)
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidSource(_)));
    }

    #[test]
    fn zero_max_is_invalid_config() {
        let (mut input, mut output) = surfaces();
        let err = engine()
            .convert(&FrameBuffer::filled(4, 4, (0, 0, 0)), &mut input, &mut output, 0)
            .unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn detached_output_leaves_input_untouched() {
        let resources = Arc::new(EngineResources::default());
        let e = ConversionEngine::new(Arc::clone(&resources), EngineOptions::default());
        let mut input = Canvas::new(Arc::clone(resources.atlas()));
        let mut output = Canvas::new(Arc::clone(resources.atlas()));
        output.detach_handle().detach();

        let err = e
            .convert(&FrameBuffer::filled(8, 8, (1, 1, 1)), &mut input, &mut output, 4)
            .unwrap_err();
        assert!(matches!(err, ConvertError::RenderTargetUnavailable(_)));
        assert_eq!(input.pixels().data.len(), 0);
    }

    #[test]
    fn pixel_canvas_uses_atlas_metrics() {
        let resources = Arc::new(EngineResources::default());
        let e = ConversionEngine::new(Arc::clone(&resources), EngineOptions::default());
        let mut input = Canvas::new(Arc::clone(resources.atlas()));
        let mut output = Canvas::new(Arc::clone(resources.atlas()));
        let conv = e
            .convert(&FrameBuffer::filled(40, 20, (255, 255, 255)), &mut input, &mut output, 8)
            .unwrap();
        let m = resources.atlas().metrics();
        assert_eq!(
            output.size(),
            (conv.glyphs.width * m.cell_width, conv.glyphs.height * m.cell_height)
        );
    }

    #[test]
    fn options_change_without_reloading_resources() {
        let mut e = engine();
        let (mut input, mut output) = surfaces();
        let white = FrameBuffer::filled(10, 10, (255, 255, 255));
        e.set_options(EngineOptions {
            invert: true,
            ..EngineOptions::default()
        });
        let conv = e.convert(&white, &mut input, &mut output, 4).unwrap();
        assert!(conv.glyphs.cells.iter().all(|c| c.ch == ' '));
        assert!(e.options().invert);
    }

    #[test]
    fn global_lifecycle() {
        // Seul test qui touche l'état global.
        teardown();
        assert_eq!(
            ConversionEngine::global(EngineOptions::default()).unwrap_err(),
            ConvertError::NotInitialized
        );

        let config = AsciiConfig {
            charset: "@blocks".to_string(),
            ..AsciiConfig::default()
        };
        init(&config).unwrap();
        let e = ConversionEngine::global(EngineOptions::default()).unwrap();
        assert_eq!(e.resources().ramp().brightest(), '█');

        teardown();
        assert!(resources().is_none());
        assert!(ConversionEngine::global(EngineOptions::default()).is_err());
    }

    #[test]
    fn bad_charset_is_not_published() {
        let config = AsciiConfig {
            charset: "x".to_string(),
            ..AsciiConfig::default()
        };
        assert!(EngineResources::from_config(&config).is_err());
    }
}
