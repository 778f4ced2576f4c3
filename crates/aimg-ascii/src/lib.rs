/// ASCII conversion stages for ascii-image.
///
/// Pixel frames → luminance grid (box filter) → glyph grid.
pub mod mapper;
pub mod sampler;

pub use mapper::GlyphMapper;
pub use sampler::PixelSampler;
