use image::RgbaImage;

use super::GarmentType;
use crate::tracker::{Anchor, Rect, Size};

/// セッション中に表示する1着分の服画像と配置状態
#[derive(Debug, Clone)]
pub struct GarmentOverlay {
    bitmap: RgbaImage,
    garment_type: GarmentType,
    /// スケール前の表示サイズ
    original: Size,
    placement: Rect,
    /// 最初の配置が済んだか
    placed: bool,
}

impl GarmentOverlay {
    pub fn new(bitmap: RgbaImage, garment_type: GarmentType, original: Size) -> Self {
        Self {
            bitmap,
            garment_type,
            original,
            placement: Rect::new(0.0, 0.0, original.width, original.height),
            placed: false,
        }
    }

    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    pub fn garment_type(&self) -> GarmentType {
        self.garment_type
    }

    pub fn original_size(&self) -> Size {
        self.original
    }

    pub fn placement(&self) -> Rect {
        self.placement
    }

    pub fn current_size(&self) -> Size {
        self.placement.size()
    }

    /// 姿勢が取れるまではビュー中央に置く
    pub fn center_in(&mut self, view_width: u32, view_height: u32) {
        if self.placed || view_width == 0 || view_height == 0 {
            return;
        }
        self.placement = Rect::centered(self.original, view_width, view_height);
    }

    pub fn apply_anchor(&mut self, anchor: &Anchor) {
        self.placement = anchor.rect;
        self.placed = true;
    }

    /// 手動移動
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.placement.left += dx;
        self.placement.top += dy;
        self.placed = true;
    }

    /// 手動拡縮。負のサイズにはしない
    pub fn resize(&mut self, width: f32, height: f32) {
        self.placement.width = width.max(0.0);
        self.placement.height = height.max(0.0);
        self.placed = true;
    }
}
