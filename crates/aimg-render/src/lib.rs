/// Drawing surfaces and the frame renderer for ascii-image.
///
/// `Canvas` rasterises glyphs into RGBA pixels from a `GlyphAtlas`;
/// `TerminalCanvas` writes terminal cells and blits them into ratatui.
pub mod atlas;
pub mod canvas;
pub mod font;
pub mod renderer;
pub mod resize;
pub mod terminal;

pub use atlas::GlyphAtlas;
pub use canvas::{Canvas, DetachHandle};
pub use renderer::FrameRenderer;
pub use terminal::TerminalCanvas;
