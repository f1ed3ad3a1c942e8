use crate::pose::LandmarkIndex;

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const POSE_CONNECTIONS: [(LandmarkIndex, LandmarkIndex); 20] = [
    // 顔
    (LandmarkIndex::Nose, LandmarkIndex::LeftEyeInner),
    (LandmarkIndex::LeftEyeInner, LandmarkIndex::LeftEye),
    (LandmarkIndex::LeftEye, LandmarkIndex::LeftEyeOuter),
    (LandmarkIndex::LeftEyeOuter, LandmarkIndex::LeftEar),
    // 腕
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftElbow),
    (LandmarkIndex::LeftElbow, LandmarkIndex::LeftWrist),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightElbow),
    (LandmarkIndex::RightElbow, LandmarkIndex::RightWrist),
    // 胴体
    (LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder),
    (LandmarkIndex::LeftShoulder, LandmarkIndex::LeftHip),
    (LandmarkIndex::RightShoulder, LandmarkIndex::RightHip),
    (LandmarkIndex::LeftHip, LandmarkIndex::RightHip),
    // 脚
    (LandmarkIndex::LeftHip, LandmarkIndex::LeftKnee),
    (LandmarkIndex::LeftKnee, LandmarkIndex::LeftAnkle),
    (LandmarkIndex::LeftAnkle, LandmarkIndex::LeftHeel),
    (LandmarkIndex::LeftHeel, LandmarkIndex::LeftFootIndex),
    (LandmarkIndex::RightHip, LandmarkIndex::RightKnee),
    (LandmarkIndex::RightKnee, LandmarkIndex::RightAnkle),
    (LandmarkIndex::RightAnkle, LandmarkIndex::RightHeel),
    (LandmarkIndex::RightHeel, LandmarkIndex::RightFootIndex),
];

/// ラベルを付けるランドマーク（配置計算に使う4点）
pub const LABELED_LANDMARKS: [(LandmarkIndex, &str); 4] = [
    (LandmarkIndex::LeftShoulder, "L Shoulder"),
    (LandmarkIndex::RightShoulder, "R Shoulder"),
    (LandmarkIndex::LeftHip, "L Hip"),
    (LandmarkIndex::RightHip, "R Hip"),
];

/// キーポイントの色 (RGB)
pub const KEYPOINT_COLOR: u32 = 0xFF0000; // 赤

/// 骨格線の色 (RGB)
pub const SKELETON_COLOR: u32 = 0x00FF00; // 緑

/// ラベルの色 (RGB)
pub const LABEL_COLOR: u32 = 0xFFFF00; // 黄色

/// "11: L Shoulder" 形式のラベル
pub fn label_text(index: LandmarkIndex, name: &str) -> String {
    format!("{}: {}", index.index(), name)
}
