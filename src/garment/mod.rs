pub mod classifier;
pub mod overlay;
pub mod touch;

pub use classifier::{Classification, ClassifierResponse, DetectedItem};
pub use overlay::GarmentOverlay;
pub use touch::{TouchAdjuster, TouchEvent};

use serde::Deserialize;

/// 服の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentType {
    Shirt,
    Jacket,
    Pants,
    Shorts,
    Dress,
    Skirt,
    #[default]
    Unknown,
}

/// ラベルのキーワード → 種類。上から順に判定する
const LABEL_KEYWORDS: [(&[&str], GarmentType); 6] = [
    (&["pants", "trousers", "jeans", "leggings"], GarmentType::Pants),
    (&["shirt", "blouse", "top", "hoodie"], GarmentType::Shirt),
    (&["dress", "gown"], GarmentType::Dress),
    (&["skirt"], GarmentType::Skirt),
    (&["coat", "jacket"], GarmentType::Jacket),
    (&["shorts"], GarmentType::Shorts),
];

impl GarmentType {
    /// 分類器の主ラベルから種類を決める（大文字小文字は区別しない）
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        LABEL_KEYWORDS
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| label.contains(k)))
            .map(|(_, garment)| *garment)
            .unwrap_or(GarmentType::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shirt => "shirt",
            Self::Jacket => "jacket",
            Self::Pants => "pants",
            Self::Shorts => "shorts",
            Self::Dress => "dress",
            Self::Skirt => "skirt",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for GarmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
