#[cfg(feature = "desktop")]
pub mod capture;
pub mod slot;

#[cfg(feature = "desktop")]
pub use capture::{OpenCvCamera, ThreadedCamera};
pub use slot::{CameraFrame, FrameSlot};
