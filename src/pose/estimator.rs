use anyhow::Result;

use super::landmark::LandmarkSet;

/// 1フレームから姿勢ランドマークを推定する外部推定器の境界
///
/// フレーム間の状態は持たない前提。人物が見つからなければ `Ok(None)`、
/// 推論そのものの失敗は `Err` で返す。
pub trait PoseEstimator {
    type Image;

    fn detect(&mut self, image: &Self::Image) -> Result<Option<LandmarkSet>>;
}
