use std::collections::BTreeMap;

use crate::pose::{Landmark, LandmarkIndex, LandmarkSet};

/// カメラセンサーの回転（90度刻み）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }
}

/// フレームごとの表示条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub view_width: u32,
    pub view_height: u32,
    pub rotation: Rotation,
    pub front_facing: bool,
}

impl FrameContext {
    pub fn new(view_width: u32, view_height: u32, rotation: Rotation, front_facing: bool) -> Self {
        Self {
            view_width,
            view_height,
            rotation,
            front_facing,
        }
    }

    /// レイアウト確定前（幅か高さが 0）は false
    pub fn is_ready(&self) -> bool {
        self.view_width > 0 && self.view_height > 0
    }
}

/// 画面上のピクセル座標。ビュー外の値もそのまま保持する
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(&self, other: &ScreenPoint) -> ScreenPoint {
        ScreenPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// 正規化座標を画面座標に変換する
///
/// 270度回転のフロントカメラだけは軸が入れ替わるため別扱い。それ以外は
/// フロントカメラのときだけX方向を反転する。
pub fn project(landmark: &Landmark, ctx: &FrameContext) -> ScreenPoint {
    let w = ctx.view_width as f32;
    let h = ctx.view_height as f32;

    if ctx.rotation == Rotation::Deg270 && ctx.front_facing {
        let x = w - landmark.y * w;
        let y = (1.0 - landmark.x) * h;
        ScreenPoint::new(x, y)
    } else {
        let x = if ctx.front_facing {
            (1.0 - landmark.x) * w
        } else {
            landmark.x * w
        };
        ScreenPoint::new(x, landmark.y * h)
    }
}

/// 1フレーム分の画面座標
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedLandmarks {
    points: BTreeMap<u32, ScreenPoint>,
}

impl ProjectedLandmarks {
    /// 全ランドマークを変換する。ビュー未確定なら None
    pub fn project(set: &LandmarkSet, ctx: &FrameContext) -> Option<Self> {
        if !ctx.is_ready() {
            return None;
        }
        let points = set
            .iter()
            .map(|(index, landmark)| (index, project(landmark, ctx)))
            .collect();
        Some(Self { points })
    }

    pub fn get(&self, index: LandmarkIndex) -> Option<ScreenPoint> {
        self.points.get(&index.index()).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, ScreenPoint)> + '_ {
        self.points.iter().map(|(i, p)| (*i, *p))
    }
}
