use crate::garment::GarmentType;
use crate::pose::LandmarkIndex;

use super::projector::{ProjectedLandmarks, ScreenPoint};

/// 幅と高さ（ピクセル）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// 服画像の配置矩形（左上 + サイズ）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// ビュー中央に置いた矩形
    pub fn centered(size: Size, view_width: u32, view_height: u32) -> Self {
        Self::new(
            (view_width as f32 - size.width) / 2.0,
            (view_height as f32 - size.height) / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// 縦位置の基準線
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalReference {
    /// 両肩の中点
    Shoulders,
    /// 両腰の中点（腰が無ければ肩）
    Hips,
}

/// 服の種類ごとの配置ルール
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRule {
    /// 肩幅に掛ける係数
    pub shoulder_ratio: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub reference: VerticalReference,
    /// 基準線から服の高さの 1/n だけ上に置く
    pub height_divisor: f32,
}

const LOWER_BODY: PlacementRule = PlacementRule {
    shoulder_ratio: 1.8,
    min_scale: 0.7,
    max_scale: 2.0,
    reference: VerticalReference::Hips,
    height_divisor: 3.0,
};

const FULL_LENGTH: PlacementRule = PlacementRule {
    shoulder_ratio: 2.0,
    min_scale: 0.8,
    max_scale: 2.2,
    reference: VerticalReference::Shoulders,
    height_divisor: 6.0,
};

const UPPER_BODY: PlacementRule = PlacementRule {
    shoulder_ratio: 2.2,
    min_scale: 0.6,
    max_scale: 2.0,
    reference: VerticalReference::Shoulders,
    height_divisor: 4.0,
};

impl PlacementRule {
    pub fn for_garment(garment: GarmentType) -> &'static PlacementRule {
        match garment {
            GarmentType::Pants | GarmentType::Shorts => &LOWER_BODY,
            GarmentType::Dress => &FULL_LENGTH,
            GarmentType::Shirt | GarmentType::Jacket | GarmentType::Skirt | GarmentType::Unknown => {
                &UPPER_BODY
            }
        }
    }

    /// 肩幅から倍率を求めて範囲内に収める
    pub fn scale_for(&self, shoulder_width: f32, original_width: f32) -> f32 {
        (shoulder_width * self.shoulder_ratio / original_width)
            .min(self.max_scale)
            .max(self.min_scale)
    }
}

/// 配置計算に使う画面座標の肩と腰
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyAnchors {
    pub left_shoulder: ScreenPoint,
    pub right_shoulder: ScreenPoint,
    pub left_hip: Option<ScreenPoint>,
    pub right_hip: Option<ScreenPoint>,
}

impl BodyAnchors {
    /// 両肩が無ければ None
    pub fn from_projected(points: &ProjectedLandmarks) -> Option<Self> {
        Some(Self {
            left_shoulder: points.get(LandmarkIndex::LeftShoulder)?,
            right_shoulder: points.get(LandmarkIndex::RightShoulder)?,
            left_hip: points.get(LandmarkIndex::LeftHip),
            right_hip: points.get(LandmarkIndex::RightHip),
        })
    }

    pub fn shoulder_center(&self) -> ScreenPoint {
        self.left_shoulder.midpoint(&self.right_shoulder)
    }

    pub fn shoulder_width(&self) -> f32 {
        (self.right_shoulder.x - self.left_shoulder.x).abs()
    }

    /// 両腰が揃っていれば腰の中点のY、そうでなければ肩の中点のY
    pub fn hip_center_y(&self) -> f32 {
        match (self.left_hip, self.right_hip) {
            (Some(l), Some(r)) => l.midpoint(&r).y,
            _ => self.shoulder_center().y,
        }
    }
}

/// 配置計算の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub rect: Rect,
    pub scale: f32,
}

/// 服の配置矩形を計算する
///
/// `original` はスケール前の服サイズ、`current` は現在表示中のサイズ。
/// 縦位置のオフセットは現在の高さを基準にし、上下はビュー内に収める。
/// 左右はクランプしない。ビュー未確定や元サイズが不正なときは None。
pub fn compute_anchor(
    body: &BodyAnchors,
    garment: GarmentType,
    original: Size,
    current: Size,
    view_width: u32,
    view_height: u32,
) -> Option<Anchor> {
    if view_width == 0 || view_height == 0 {
        return None;
    }
    if !(original.width > 0.0 && original.height > 0.0) {
        return None;
    }

    let center = body.shoulder_center();
    let shoulder_width = body.shoulder_width();
    if !center.x.is_finite() || !center.y.is_finite() || !shoulder_width.is_finite() {
        return None;
    }

    let rule = PlacementRule::for_garment(garment);
    let scale = rule.scale_for(shoulder_width, original.width);

    let reference_y = match rule.reference {
        VerticalReference::Hips => body.hip_center_y(),
        VerticalReference::Shoulders => center.y,
    };
    let vertical_offset = reference_y - current.height.max(0.0) / rule.height_divisor;

    let width = (original.width * scale).max(0.0);
    let height = (original.height * scale).max(0.0);
    let left = center.x - width / 2.0;
    // 服がビューより高い場合は上端に揃える
    let top = vertical_offset.min(view_height as f32 - height).max(0.0);

    Some(Anchor {
        rect: Rect::new(left, top, width, height),
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::{Landmark, LandmarkSet};
    use crate::tracker::projector::{FrameContext, Rotation};

    const ORIGINAL: Size = Size {
        width: 400.0,
        height: 500.0,
    };

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn shoulders(lx: f32, rx: f32, y: f32) -> BodyAnchors {
        BodyAnchors {
            left_shoulder: ScreenPoint::new(lx, y),
            right_shoulder: ScreenPoint::new(rx, y),
            left_hip: None,
            right_hip: None,
        }
    }

    #[test]
    fn test_end_to_end_shirt() {
        let mut set = LandmarkSet::new();
        set.insert(11, Landmark::new(0.6, 0.3, 0.0));
        set.insert(12, Landmark::new(0.4, 0.3, 0.0));
        let ctx = FrameContext::new(1000, 2000, Rotation::Deg0, true);
        let projected = ProjectedLandmarks::project(&set, &ctx).unwrap();
        let body = BodyAnchors::from_projected(&projected).unwrap();

        assert!(approx_eq(body.left_shoulder.x, 400.0));
        assert!(approx_eq(body.right_shoulder.x, 600.0));
        assert!(approx_eq(body.shoulder_center().x, 500.0));
        assert!(approx_eq(body.shoulder_width(), 200.0));

        let anchor = compute_anchor(&body, GarmentType::Shirt, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
        // 200 * 2.2 / 400
        assert!(approx_eq(anchor.scale, 1.1));
        assert!(approx_eq(anchor.rect.width, 440.0));
        assert!(approx_eq(anchor.rect.height, 550.0));
        assert!(approx_eq(anchor.rect.left, 280.0));
        // 600 - 500/4（現在の高さ基準）
        assert!(approx_eq(anchor.rect.top, 475.0));
    }

    #[test]
    fn test_shirt_unit_scale() {
        // 肩幅 * 2.2 が元の幅と一致すると等倍
        let body = shoulders(500.0 - 400.0 / 2.2 / 2.0, 500.0 + 400.0 / 2.2 / 2.0, 600.0);
        let anchor = compute_anchor(&body, GarmentType::Shirt, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
        assert!(approx_eq(anchor.scale, 1.0));
        assert!(approx_eq(anchor.rect.width, 400.0));
        assert!(approx_eq(anchor.rect.left, 300.0));
    }

    #[test]
    fn test_idempotent() {
        let body = BodyAnchors {
            left_shoulder: ScreenPoint::new(320.0, 410.0),
            right_shoulder: ScreenPoint::new(610.0, 430.0),
            left_hip: Some(ScreenPoint::new(350.0, 900.0)),
            right_hip: Some(ScreenPoint::new(580.0, 910.0)),
        };
        for garment in [GarmentType::Pants, GarmentType::Dress, GarmentType::Jacket] {
            let a = compute_anchor(&body, garment, ORIGINAL, ORIGINAL, 1000, 2000);
            let b = compute_anchor(&body, garment, ORIGINAL, ORIGINAL, 1000, 2000);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_scale_clamped_per_type() {
        let cases = [
            (GarmentType::Pants, 0.7, 2.0),
            (GarmentType::Shorts, 0.7, 2.0),
            (GarmentType::Dress, 0.8, 2.2),
            (GarmentType::Shirt, 0.6, 2.0),
            (GarmentType::Unknown, 0.6, 2.0),
        ];
        for (garment, min, max) in cases {
            for width in [0.0, 1.0, 50.0, 200.0, 400.0, 1000.0, 5000.0] {
                let body = shoulders(500.0 - width / 2.0, 500.0 + width / 2.0, 600.0);
                let anchor = compute_anchor(&body, garment, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
                assert!(
                    anchor.scale >= min && anchor.scale <= max,
                    "{:?} width {} scale {}",
                    garment,
                    width,
                    anchor.scale
                );
            }
        }
    }

    #[test]
    fn test_dress_upper_clamp() {
        let body = shoulders(0.0, 1000.0, 600.0);
        let anchor = compute_anchor(&body, GarmentType::Dress, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
        assert!(approx_eq(anchor.scale, 2.2));
        assert!(approx_eq(anchor.rect.width, 880.0));
    }

    #[test]
    fn test_pants_without_hips_falls_back_to_shoulders() {
        let body = shoulders(400.0, 600.0, 900.0);
        let anchor = compute_anchor(&body, GarmentType::Pants, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
        // center.y - current.height / 3
        assert!(approx_eq(anchor.rect.top, 900.0 - 500.0 / 3.0));
    }

    #[test]
    fn test_pants_uses_hip_line() {
        let mut body = shoulders(400.0, 600.0, 600.0);
        body.left_hip = Some(ScreenPoint::new(420.0, 1000.0));
        body.right_hip = Some(ScreenPoint::new(580.0, 1100.0));
        let anchor = compute_anchor(&body, GarmentType::Pants, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
        assert!(approx_eq(anchor.rect.top, 1050.0 - 500.0 / 3.0));
    }

    #[test]
    fn test_single_hip_is_ignored() {
        let mut body = shoulders(400.0, 600.0, 600.0);
        body.left_hip = Some(ScreenPoint::new(420.0, 1000.0));
        assert!(approx_eq(body.hip_center_y(), 600.0));
    }

    #[test]
    fn test_dress_offset_uses_current_height() {
        let body = shoulders(400.0, 600.0, 900.0);
        let current = Size::new(300.0, 600.0);
        let anchor = compute_anchor(&body, GarmentType::Dress, ORIGINAL, current, 1000, 2000).unwrap();
        assert!(approx_eq(anchor.rect.top, 900.0 - 600.0 / 6.0));
        // サイズは元サイズ基準
        assert!(approx_eq(anchor.rect.width, 400.0));
    }

    #[test]
    fn test_top_clamped_to_view() {
        let body = shoulders(400.0, 600.0, 10.0);
        let anchor = compute_anchor(&body, GarmentType::Shirt, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
        assert_eq!(anchor.rect.top, 0.0);

        let body = shoulders(400.0, 600.0, 1990.0);
        let anchor = compute_anchor(&body, GarmentType::Shirt, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
        assert!(approx_eq(anchor.rect.top, 2000.0 - anchor.rect.height));
    }

    #[test]
    fn test_taller_than_view_pins_to_top() {
        let body = shoulders(0.0, 1000.0, 300.0);
        let anchor = compute_anchor(&body, GarmentType::Shirt, ORIGINAL, ORIGINAL, 1000, 600).unwrap();
        assert_eq!(anchor.rect.top, 0.0);
        assert!(anchor.rect.height > 600.0);
    }

    #[test]
    fn test_horizontal_not_clamped() {
        let body = shoulders(-50.0, 50.0, 600.0);
        let anchor = compute_anchor(&body, GarmentType::Shirt, ORIGINAL, ORIGINAL, 1000, 2000).unwrap();
        assert!(anchor.rect.left < 0.0);
    }

    #[test]
    fn test_unmeasured_view_is_noop() {
        let body = shoulders(400.0, 600.0, 600.0);
        assert!(compute_anchor(&body, GarmentType::Shirt, ORIGINAL, ORIGINAL, 0, 2000).is_none());
        assert!(compute_anchor(&body, GarmentType::Shirt, ORIGINAL, ORIGINAL, 1000, 0).is_none());
    }

    #[test]
    fn test_degenerate_original_size() {
        let body = shoulders(400.0, 600.0, 600.0);
        let zero = Size::new(0.0, 500.0);
        assert!(compute_anchor(&body, GarmentType::Shirt, zero, ORIGINAL, 1000, 2000).is_none());
    }

    #[test]
    fn test_missing_shoulder() {
        let mut set = LandmarkSet::new();
        set.insert(11, Landmark::new(0.6, 0.3, 0.0));
        set.insert(23, Landmark::new(0.6, 0.6, 0.0));
        set.insert(24, Landmark::new(0.4, 0.6, 0.0));
        let ctx = FrameContext::new(1000, 2000, Rotation::Deg0, true);
        let projected = ProjectedLandmarks::project(&set, &ctx).unwrap();
        assert!(BodyAnchors::from_projected(&projected).is_none());
    }

    #[test]
    fn test_rule_table() {
        assert_eq!(PlacementRule::for_garment(GarmentType::Shorts), &LOWER_BODY);
        assert_eq!(PlacementRule::for_garment(GarmentType::Dress), &FULL_LENGTH);
        assert_eq!(PlacementRule::for_garment(GarmentType::Skirt), &UPPER_BODY);
    }
}
