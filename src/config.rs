use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::tracker::Rotation;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub garment: GarmentConfig,
    #[serde(default)]
    pub skeleton: SkeletonConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    /// フレーム処理の最小間隔（ミリ秒）
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GarmentConfig {
    /// スケール前の服画像の表示幅（ピクセル）
    #[serde(default = "default_initial_width")]
    pub initial_width: f32,
    /// スケール前の服画像の表示高さ（ピクセル）
    #[serde(default = "default_initial_height")]
    pub initial_height: f32,
    #[serde(default = "default_true")]
    pub visible: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SkeletonConfig {
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_point_radius")]
    pub point_radius: f32,
    #[serde(default = "default_line_width")]
    pub line_width: f32,
    /// ラベルを点から右上にずらす量（ピクセル）
    #[serde(default = "default_label_offset")]
    pub label_offset: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default)]
    pub index: i32,
    #[serde(default = "default_camera_width")]
    pub width: u32,
    #[serde(default = "default_camera_height")]
    pub height: u32,
    /// フロントカメラ（表示をX方向に反転）
    #[serde(default = "default_true")]
    pub front_facing: bool,
    /// センサー回転 (0, 90, 180, 270)
    #[serde(default)]
    pub rotation: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EstimatorConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// これ未満の信頼度のキーポイントは欠損扱い
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

fn default_min_interval_ms() -> u64 { 300 }
fn default_initial_width() -> f32 { 400.0 }
fn default_initial_height() -> f32 { 500.0 }
fn default_true() -> bool { true }
fn default_point_radius() -> f32 { 12.0 }
fn default_line_width() -> f32 { 8.0 }
fn default_label_offset() -> f32 { 20.0 }
fn default_camera_width() -> u32 { 1280 }
fn default_camera_height() -> u32 { 720 }
fn default_model_path() -> String { "models/movenet_lightning.onnx".to_string() }
fn default_min_confidence() -> f32 { 0.5 }

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

impl Default for GarmentConfig {
    fn default() -> Self {
        Self {
            initial_width: default_initial_width(),
            initial_height: default_initial_height(),
            visible: true,
        }
    }
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            visible: true,
            point_radius: default_point_radius(),
            line_width: default_line_width(),
            label_offset: default_label_offset(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: default_camera_width(),
            height: default_camera_height(),
            front_facing: true,
            rotation: 0,
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl GateConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl CameraConfig {
    pub fn rotation(&self) -> Result<Rotation> {
        Rotation::from_degrees(self.rotation)
            .with_context(|| format!("unsupported camera rotation: {}", self.rotation))
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.camera.rotation()?;
        Ok(config)
    }

    /// 読み込みに失敗した場合はデフォルト設定を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}; using default config", e);
                Self::default()
            }
        }
    }
}
