pub mod anchor;
pub mod gate;
pub mod projector;
pub mod worker;

pub use anchor::{compute_anchor, Anchor, BodyAnchors, PlacementRule, Rect, Size};
pub use gate::FrameGate;
pub use projector::{project, FrameContext, ProjectedLandmarks, Rotation, ScreenPoint};
pub use worker::{FramePipeline, FrameUpdate, TrackingWorker, ViewSize};
