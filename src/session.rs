use std::fmt;

use crate::config::Config;
use crate::garment::{Classification, DetectedItem, GarmentOverlay, TouchAdjuster, TouchEvent};
use crate::tracker::{compute_anchor, Anchor, BodyAnchors, FrameUpdate, ProjectedLandmarks, Size, ViewSize};

/// ユーザーに見せる姿勢推定の状態
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PoseStatus {
    #[default]
    Detecting,
    Tracking,
    Error(String),
}

impl fmt::Display for PoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detecting => f.write_str("Pose: Detecting..."),
            Self::Tracking => f.write_str("Pose: Tracking"),
            Self::Error(msg) => write!(f, "Pose: Error - {}", msg),
        }
    }
}

/// 配置を更新しなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 肩が片方以上欠けている。前回の配置を維持
    MissingShoulders,
    /// ビューのレイアウトが未確定
    ViewNotReady,
    /// 服画像がまだ無い
    NoGarment,
    /// 元サイズが0以下、または肩の座標が有限でない
    InvalidGeometry,
}

/// 1フレーム適用した結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Placed(Anchor),
    Skipped(SkipReason),
    Failed,
}

/// AR試着1回分の状態。UIスレッドが所有し、ワーカーからの結果を適用する
pub struct Session {
    overlay: Option<GarmentOverlay>,
    items: Vec<DetectedItem>,
    primary_label: String,
    initial_size: Size,
    tracking_active: bool,
    status: PoseStatus,
    skeleton: ProjectedLandmarks,
    show_skeleton: bool,
    show_garment: bool,
    view: ViewSize,
    touch: TouchAdjuster,
}

impl Session {
    pub fn new(config: &Config, view: ViewSize) -> Self {
        Self {
            overlay: None,
            items: Vec::new(),
            primary_label: String::new(),
            initial_size: Size::new(config.garment.initial_width, config.garment.initial_height),
            tracking_active: false,
            status: PoseStatus::Detecting,
            skeleton: ProjectedLandmarks::default(),
            show_skeleton: config.skeleton.visible,
            show_garment: config.garment.visible,
            view,
            touch: TouchAdjuster::new(),
        }
    }

    /// 分類結果から服画像を作ってセッションを始める
    pub fn start(&mut self, classification: Classification) {
        let Classification {
            bitmap,
            items,
            primary_label,
            garment_type,
        } = classification;

        let mut overlay = GarmentOverlay::new(bitmap, garment_type, self.initial_size);
        let (w, h) = self.view.get();
        overlay.center_in(w, h);
        log::info!(
            "session started: {} ({}), {} detected items",
            garment_type,
            primary_label,
            items.len()
        );

        self.overlay = Some(overlay);
        self.items = items;
        self.primary_label = primary_label;
        self.tracking_active = false;
        self.status = PoseStatus::Detecting;
        self.skeleton = ProjectedLandmarks::default();
    }

    /// セッション終了。服画像と検出結果を破棄する
    pub fn end(&mut self) {
        self.overlay = None;
        self.items.clear();
        self.primary_label.clear();
        self.skeleton = ProjectedLandmarks::default();
        self.tracking_active = false;
        self.status = PoseStatus::Detecting;
        log::info!("session ended");
    }

    /// レイアウト確定・変更時に呼ぶ。ワーカーとも共有される
    pub fn set_view_size(&mut self, width: u32, height: u32) {
        self.view.set(width, height);
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.center_in(width, height);
        }
    }

    pub fn apply(&mut self, update: FrameUpdate) -> FrameOutcome {
        let (landmarks, projected, context) = match update {
            FrameUpdate::Pose {
                landmarks,
                projected,
                context,
            } => (landmarks, projected, context),
            FrameUpdate::Error(msg) => {
                self.status = PoseStatus::Error(msg);
                return FrameOutcome::Failed;
            }
        };
        if !context.is_ready() {
            return FrameOutcome::Skipped(SkipReason::ViewNotReady);
        }

        let body = if landmarks.has_shoulders() {
            BodyAnchors::from_projected(&projected)
        } else {
            None
        };
        self.skeleton = projected;

        let Some(body) = body else {
            log::debug!("shoulder landmarks not found");
            return FrameOutcome::Skipped(SkipReason::MissingShoulders);
        };

        self.tracking_active = true;
        self.status = PoseStatus::Tracking;

        let Some(overlay) = self.overlay.as_mut() else {
            return FrameOutcome::Skipped(SkipReason::NoGarment);
        };

        let anchor = match compute_anchor(
            &body,
            overlay.garment_type(),
            overlay.original_size(),
            overlay.current_size(),
            context.view_width,
            context.view_height,
        ) {
            Some(anchor) => anchor,
            None => {
                log::warn!("cannot place {}: degenerate size or landmarks", overlay.garment_type());
                return FrameOutcome::Skipped(SkipReason::InvalidGeometry);
            }
        };

        overlay.apply_anchor(&anchor);
        log::debug!(
            "garment {}: scale {:.2}, pos ({:.0}, {:.0}), size {:.0}x{:.0}, rotation {}",
            overlay.garment_type(),
            anchor.scale,
            anchor.rect.left,
            anchor.rect.top,
            anchor.rect.width,
            anchor.rect.height,
            context.rotation.degrees()
        );
        FrameOutcome::Placed(anchor)
    }

    pub fn handle_touch(&mut self, event: TouchEvent) {
        if let Some(overlay) = self.overlay.as_mut() {
            self.touch.handle(event, overlay);
        }
    }

    pub fn toggle_skeleton(&mut self) -> bool {
        self.show_skeleton = !self.show_skeleton;
        self.show_skeleton
    }

    pub fn toggle_garment(&mut self) -> bool {
        self.show_garment = !self.show_garment;
        self.show_garment
    }

    pub fn set_skeleton_visible(&mut self, visible: bool) {
        self.show_skeleton = visible;
    }

    pub fn set_garment_visible(&mut self, visible: bool) {
        self.show_garment = visible;
    }

    pub fn show_skeleton(&self) -> bool {
        self.show_skeleton
    }

    pub fn show_garment(&self) -> bool {
        self.show_garment
    }

    pub fn overlay(&self) -> Option<&GarmentOverlay> {
        self.overlay.as_ref()
    }

    pub fn skeleton(&self) -> &ProjectedLandmarks {
        &self.skeleton
    }

    pub fn status(&self) -> &PoseStatus {
        &self.status
    }

    /// 一度両肩を捉えたら、セッション中は true のまま
    pub fn is_tracking(&self) -> bool {
        self.tracking_active
    }

    pub fn detected_items(&self) -> &[DetectedItem] {
        &self.items
    }

    pub fn primary_label(&self) -> &str {
        &self.primary_label
    }

    pub fn view_size(&self) -> (u32, u32) {
        self.view.get()
    }
}
