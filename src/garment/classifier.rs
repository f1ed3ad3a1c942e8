//! 服の分類結果
//!
//! 分類サービスは撮影した静止画1枚ごとに、切り抜いた服画像とラベルを返す。
//! 配置に使うのはデコードした画像と、主ラベルから決めた服の種類だけ。

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbaImage;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::GarmentType;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectedItem {
    pub label: String,
    pub score: f64,
}

/// セグメンテーションサービスの応答
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierResponse {
    pub success: bool,
    /// 服だけを残した画像の Data URL (`data:image/png;base64,...`)
    #[serde(default)]
    pub segmented_image: Option<String>,
    #[serde(default)]
    pub detected_items: Vec<DetectedItem>,
    #[serde(default)]
    pub primary_item: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// デコード済みの分類結果。セッションの服画像になる
#[derive(Debug, Clone)]
pub struct Classification {
    pub bitmap: RgbaImage,
    pub items: Vec<DetectedItem>,
    pub primary_label: String,
    pub garment_type: GarmentType,
}

impl ClassifierResponse {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse classifier response")
    }

    pub fn into_classification(self) -> Result<Classification> {
        if !self.success {
            anyhow::bail!(
                "classifier returned error: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        let data_url = self
            .segmented_image
            .context("classifier response has no segmented_image")?;
        let bitmap = decode_data_url(&data_url)?;
        let primary_label = self.primary_item.unwrap_or_default();
        let garment_type = GarmentType::from_label(&primary_label);

        for item in &self.detected_items {
            log::debug!("detected item {} ({:.2})", item.label, item.score);
        }
        log::info!("primary item '{}' -> {}", primary_label, garment_type);

        Ok(Classification {
            bitmap,
            items: self.detected_items,
            primary_label,
            garment_type,
        })
    }
}

impl Classification {
    /// 手元の切り抜き画像とラベルから作る
    pub fn from_image_file<P: AsRef<Path>>(path: P, label: &str) -> Result<Self> {
        let path = path.as_ref();
        let bitmap = image::open(path)
            .with_context(|| format!("Failed to open garment image {}", path.display()))?
            .to_rgba8();
        Ok(Self {
            bitmap,
            items: vec![DetectedItem {
                label: label.to_string(),
                score: 1.0,
            }],
            primary_label: label.to_string(),
            garment_type: GarmentType::from_label(label),
        })
    }

    /// 保存済みの応答 (JSON) を読み込む
    pub fn from_response_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ClassifierResponse::from_json(&json)?.into_classification()
    }
}

/// Data URL と素の base64 のどちらも受け付ける
fn decode_data_url(data: &str) -> Result<RgbaImage> {
    let payload = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .context("Failed to decode base64 image")?;
    let image = image::load_from_memory(&bytes).context("Failed to decode garment image")?;
    Ok(image.to_rgba8())
}
