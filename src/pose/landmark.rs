use std::collections::BTreeMap;

/// MediaPipe Pose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    const ALL: [LandmarkIndex; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// 単一ランドマーク（正規化座標）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// 画像幅に対する割合 (0.0〜1.0)
    pub x: f32,
    /// 画像高さに対する割合 (0.0〜1.0)
    pub y: f32,
    /// 相対深度
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// 座標成分の配列から生成。2成分未満なら None
    pub fn from_components(components: &[f32]) -> Option<Self> {
        match components {
            [x, y] => Some(Self::new(*x, *y, 0.0)),
            [x, y, z, ..] => Some(Self::new(*x, *y, *z)),
            _ => None,
        }
    }
}

/// 1フレーム分のランドマーク。全インデックスが揃うとは限らない
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    landmarks: BTreeMap<u32, Landmark>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// (インデックス, 座標成分) の列から構築する。範囲外のインデックスと成分が2未満のレコードは読み飛ばす
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = (u32, &'a [f32])>,
    {
        let mut set = Self::new();
        for (index, components) in records {
            if LandmarkIndex::from_index(index).is_none() {
                log::debug!("skipping unknown landmark index {}", index);
                continue;
            }
            match Landmark::from_components(components) {
                Some(landmark) => set.insert(index, landmark),
                None => log::debug!(
                    "skipping landmark {} with {} components",
                    index,
                    components.len()
                ),
            }
        }
        set
    }

    pub fn insert(&mut self, index: u32, landmark: Landmark) {
        self.landmarks.insert(index, landmark);
    }

    pub fn get(&self, index: LandmarkIndex) -> Option<&Landmark> {
        self.landmarks.get(&index.index())
    }

    pub fn contains(&self, index: LandmarkIndex) -> bool {
        self.landmarks.contains_key(&index.index())
    }

    /// 両肩が揃っているか
    pub fn has_shoulders(&self) -> bool {
        self.contains(LandmarkIndex::LeftShoulder) && self.contains(LandmarkIndex::RightShoulder)
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Landmark)> {
        self.landmarks.iter().map(|(i, l)| (*i, l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_index_count() {
        assert_eq!(LandmarkIndex::COUNT, 33);
    }

    #[test]
    fn test_landmark_index_from_index() {
        assert_eq!(LandmarkIndex::from_index(0), Some(LandmarkIndex::Nose));
        assert_eq!(LandmarkIndex::from_index(11), Some(LandmarkIndex::LeftShoulder));
        assert_eq!(LandmarkIndex::from_index(24), Some(LandmarkIndex::RightHip));
        assert_eq!(LandmarkIndex::from_index(32), Some(LandmarkIndex::RightFootIndex));
        assert_eq!(LandmarkIndex::from_index(33), None);
    }

    #[test]
    fn test_index_values_match_position() {
        for (i, idx) in LandmarkIndex::ALL.iter().enumerate() {
            assert_eq!(idx.index() as usize, i);
        }
    }

    #[test]
    fn test_from_components() {
        assert_eq!(Landmark::from_components(&[0.1, 0.2]), Some(Landmark::new(0.1, 0.2, 0.0)));
        assert_eq!(
            Landmark::from_components(&[0.1, 0.2, -0.3, 0.9]),
            Some(Landmark::new(0.1, 0.2, -0.3))
        );
        assert_eq!(Landmark::from_components(&[0.1]), None);
        assert_eq!(Landmark::from_components(&[]), None);
    }

    #[test]
    fn test_from_records_skips_malformed() {
        let short = [0.5f32];
        let shoulder = [0.4f32, 0.3, 0.0];
        let set = LandmarkSet::from_records(vec![
            (11u32, &shoulder[..]),
            (12u32, &short[..]),
            (33u32, &shoulder[..]),
        ]);
        assert_eq!(set.len(), 1);
        assert!(set.contains(LandmarkIndex::LeftShoulder));
        assert!(!set.contains(LandmarkIndex::RightShoulder));
        assert!(!set.has_shoulders());
    }

    #[test]
    fn test_has_shoulders() {
        let mut set = LandmarkSet::new();
        set.insert(11, Landmark::new(0.6, 0.3, 0.0));
        assert!(!set.has_shoulders());
        set.insert(12, Landmark::new(0.4, 0.3, 0.0));
        assert!(set.has_shoulders());
    }
}
