/// Configuration, types, and shared structures for ascii-image.
///
/// This crate contains the frame and grid types, the glyph ramp, the
/// render-target and video-source traits, and the configuration logic
/// used across the workspace.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::GlyphRamp;
pub use config::AsciiConfig;
pub use error::{CaptureError, ConvertError, CoreError, TargetError};
pub use frame::{AsciiCell, AsciiGrid, FrameBuffer, LuminanceGrid, PixelFormat};
pub use traits::{FontMetrics, RenderTarget, VideoSource};
