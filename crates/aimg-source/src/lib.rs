/// Frame sources for ascii-image: still images and ffmpeg-decoded video.
pub mod image;
pub mod video;

pub use image::{decode_image, load_image};
pub use video::VideoPlayer;
