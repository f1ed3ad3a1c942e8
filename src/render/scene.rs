use anyhow::Result;
use image::RgbaImage;

use super::skeleton::{label_text, KEYPOINT_COLOR, LABELED_LANDMARKS, LABEL_COLOR, POSE_CONNECTIONS, SKELETON_COLOR};
use crate::config::SkeletonConfig;
use crate::pose::LandmarkIndex;
use crate::session::Session;
use crate::tracker::{ProjectedLandmarks, Rect, ScreenPoint};

/// ステータス表示の位置
const STATUS_ORIGIN: ScreenPoint = ScreenPoint { x: 20.0, y: 40.0 };
const STATUS_COLOR: u32 = 0xFFFFFF;

/// 描画先。色は 0RGB の u32
pub trait Painter {
    fn draw_line(&mut self, from: ScreenPoint, to: ScreenPoint, width: f32, color: u32) -> Result<()>;

    fn fill_circle(&mut self, center: ScreenPoint, radius: f32, color: u32) -> Result<()>;

    /// RGBA画像を矩形に合わせて拡縮し、アルファ合成する
    fn blit(&mut self, bitmap: &RgbaImage, rect: Rect) -> Result<()>;

    /// `origin` は文字列の左下
    fn draw_text(&mut self, origin: ScreenPoint, text: &str, color: u32) -> Result<()>;
}

/// スケルトンの描画設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonStyle {
    pub point_radius: f32,
    pub line_width: f32,
    pub label_offset: f32,
}

impl From<&SkeletonConfig> for SkeletonStyle {
    fn from(config: &SkeletonConfig) -> Self {
        Self {
            point_radius: config.point_radius,
            line_width: config.line_width,
            label_offset: config.label_offset,
        }
    }
}

/// 服画像とデバッグ用スケルトンを描く
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    style: SkeletonStyle,
}

impl OverlayRenderer {
    pub fn new(style: SkeletonStyle) -> Self {
        Self { style }
    }

    pub fn from_config(config: &SkeletonConfig) -> Self {
        Self::new(SkeletonStyle::from(config))
    }

    /// 服画像を配置矩形に描く。大きさ0の矩形は描かない
    pub fn render<P: Painter>(&self, painter: &mut P, bitmap: &RgbaImage, rect: Rect) -> Result<()> {
        if !(rect.width > 0.0 && rect.height > 0.0) || bitmap.width() == 0 || bitmap.height() == 0 {
            return Ok(());
        }
        painter.blit(bitmap, rect)
    }

    /// 線 → 点 → ラベルの順に描く。端点が欠けている線は飛ばす
    pub fn render_skeleton<P: Painter>(
        &self,
        painter: &mut P,
        points: &ProjectedLandmarks,
        connections: &[(LandmarkIndex, LandmarkIndex)],
        labeled: &[(LandmarkIndex, &str)],
    ) -> Result<()> {
        for (start, end) in connections {
            if let (Some(a), Some(b)) = (points.get(*start), points.get(*end)) {
                painter.draw_line(a, b, self.style.line_width, SKELETON_COLOR)?;
            }
        }

        for (_, point) in points.iter() {
            painter.fill_circle(point, self.style.point_radius, KEYPOINT_COLOR)?;
        }

        for (index, name) in labeled {
            if let Some(p) = points.get(*index) {
                let origin = ScreenPoint::new(p.x + self.style.label_offset, p.y - self.style.label_offset);
                painter.draw_text(origin, &label_text(*index, name), LABEL_COLOR)?;
            }
        }
        Ok(())
    }

    /// セッションの現在の状態を1フレーム分描く
    pub fn draw_session<P: Painter>(&self, painter: &mut P, session: &Session) -> Result<()> {
        if session.show_garment() {
            if let Some(overlay) = session.overlay() {
                self.render(painter, overlay.bitmap(), overlay.placement())?;
            }
        }
        if session.show_skeleton() {
            self.render_skeleton(painter, session.skeleton(), &POSE_CONNECTIONS, &LABELED_LANDMARKS)?;
        }
        painter.draw_text(STATUS_ORIGIN, &session.status().to_string(), STATUS_COLOR)
    }
}
