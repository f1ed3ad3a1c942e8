use super::overlay::GarmentOverlay;
use crate::tracker::{ScreenPoint, Size};

/// ピンチとみなす最小の指間距離（ピクセル）
const MIN_PINCH_DISTANCE: f32 = 10.0;

/// 服画像に対するタッチ操作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    /// 1本目の指が触れた
    Down(ScreenPoint),
    /// 2本目の指が触れた
    PointerDown(ScreenPoint, ScreenPoint),
    /// 1本指の移動
    Move(ScreenPoint),
    /// 2本指の移動
    Pinch(ScreenPoint, ScreenPoint),
}

/// ドラッグで移動、ピンチで拡縮する
#[derive(Debug, Default)]
pub struct TouchAdjuster {
    last: Option<ScreenPoint>,
    start_distance: f32,
    start_size: Size,
}

fn spacing(a: &ScreenPoint, b: &ScreenPoint) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

impl TouchAdjuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: TouchEvent, overlay: &mut GarmentOverlay) {
        match event {
            TouchEvent::Down(p) => self.last = Some(p),
            TouchEvent::PointerDown(a, b) => {
                self.start_distance = spacing(&a, &b);
                self.start_size = overlay.current_size();
            }
            TouchEvent::Move(p) => {
                if let Some(last) = self.last {
                    overlay.translate(p.x - last.x, p.y - last.y);
                }
                self.last = Some(p);
            }
            TouchEvent::Pinch(a, b) => {
                let distance = spacing(&a, &b);
                if distance > MIN_PINCH_DISTANCE && self.start_distance > 0.0 {
                    let scale = distance / self.start_distance;
                    overlay.resize(self.start_size.width * scale, self.start_size.height * scale);
                }
            }
        }
    }
}
