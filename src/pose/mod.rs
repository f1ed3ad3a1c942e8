pub mod estimator;
pub mod landmark;
#[cfg(feature = "desktop")]
pub mod movenet;

pub use estimator::PoseEstimator;
pub use landmark::{Landmark, LandmarkIndex, LandmarkSet};
#[cfg(feature = "desktop")]
pub use movenet::MoveNetEstimator;
