pub mod blit;
pub mod framebuffer;
pub mod scene;
pub mod skeleton;
#[cfg(feature = "desktop")]
pub mod window;

pub use framebuffer::FrameBuffer;
pub use scene::{OverlayRenderer, Painter, SkeletonStyle};
pub use skeleton::{LABELED_LANDMARKS, POSE_CONNECTIONS};
#[cfg(feature = "desktop")]
pub use minifb::Key;
#[cfg(feature = "desktop")]
pub use window::{MatPainter, MinifbRenderer};
