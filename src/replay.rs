//! 記録済みランドマーク列の再生
//!
//! 1行1フレームの JSON (JSON Lines) を読み、カメラと推定器の代わりに
//! [`FramePipeline`] へ流す。時刻は記録された `t_ms` から作るので、
//! 間引きの挙動も実機と同じになる。
//!
//! ```text
//! {"t_ms": 0, "view": [1080, 2400], "rotation": 0, "front_facing": true,
//!  "landmarks": {"11": [0.6, 0.3, 0.0], "12": [0.4, 0.3, 0.0]}}
//! {"t_ms": 320, "view": [1080, 2400], "error": "model crashed"}
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::camera::CameraFrame;
use crate::pose::{LandmarkSet, PoseEstimator};
use crate::session::{FrameOutcome, Session};
use crate::tracker::{FramePipeline, Rotation};

fn default_true() -> bool {
    true
}

/// トレース1行分
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraceFrame {
    pub t_ms: u64,
    /// [幅, 高さ]
    pub view: [u32; 2],
    #[serde(default)]
    pub rotation: u32,
    #[serde(default = "default_true")]
    pub front_facing: bool,
    /// インデックス文字列 → [x, y, z]
    #[serde(default)]
    pub landmarks: BTreeMap<String, Vec<f32>>,
    /// 推定失敗を再現するときのメッセージ
    #[serde(default)]
    pub error: Option<String>,
}

impl TraceFrame {
    pub fn rotation(&self) -> Result<Rotation> {
        Rotation::from_degrees(self.rotation)
            .with_context(|| format!("invalid rotation {} at t={}ms", self.rotation, self.t_ms))
    }

    /// 数値でないインデックスは読み飛ばす
    pub fn landmark_set(&self) -> LandmarkSet {
        let records = self.landmarks.iter().filter_map(|(key, components)| match key.parse::<u32>() {
            Ok(index) => Some((index, components.as_slice())),
            Err(_) => {
                log::debug!("skipping landmark with non-numeric index '{}'", key);
                None
            }
        });
        LandmarkSet::from_records(records)
    }
}

/// JSON Lines を読む。空行と `#` 始まりの行は無視
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<TraceFrame>> {
    let mut frames = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read trace")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let frame: TraceFrame = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse trace line {}", line_no + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<TraceFrame>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open trace {}", path.display()))?;
    parse_trace(BufReader::new(file))
}

/// トレースのフレームをそのまま推定結果として返す推定器
#[derive(Debug, Default)]
pub struct ReplayEstimator;

impl PoseEstimator for ReplayEstimator {
    type Image = TraceFrame;

    fn detect(&mut self, image: &TraceFrame) -> Result<Option<LandmarkSet>> {
        if let Some(msg) = &image.error {
            anyhow::bail!("{}", msg);
        }
        let set = image.landmark_set();
        Ok(if set.is_empty() { None } else { Some(set) })
    }
}

/// 再生結果の集計
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub frames: usize,
    /// 間引き・ビュー未確定・人物なしで結果が出なかったフレーム
    pub dropped: usize,
    pub placed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// トレースを先頭から順にセッションへ適用する
pub fn replay(
    session: &mut Session,
    pipeline: &mut FramePipeline<ReplayEstimator>,
    frames: &[TraceFrame],
) -> Result<ReplaySummary> {
    let origin = Instant::now();
    let mut summary = ReplaySummary::default();

    for frame in frames {
        summary.frames += 1;
        let [width, height] = frame.view;
        if session.view_size() != (width, height) {
            session.set_view_size(width, height);
        }

        let camera_frame = CameraFrame::new(frame.clone(), frame.rotation()?, frame.front_facing);
        let now = origin + Duration::from_millis(frame.t_ms);
        let Some(update) = pipeline.process(&camera_frame, now, (width, height)) else {
            summary.dropped += 1;
            continue;
        };

        match session.apply(update) {
            FrameOutcome::Placed(_) => summary.placed += 1,
            FrameOutcome::Skipped(reason) => {
                log::debug!("t={}ms skipped: {:?}", frame.t_ms, reason);
                summary.skipped += 1;
            }
            FrameOutcome::Failed => summary.failed += 1,
        }
    }

    log::info!(
        "replayed {} frames: {} placed, {} skipped, {} failed, {} dropped",
        summary.frames,
        summary.placed,
        summary.skipped,
        summary.failed,
        summary.dropped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::garment::{Classification, GarmentType};
    use crate::session::PoseStatus;
    use crate::tracker::{FrameGate, ViewSize};
    use image::RgbaImage;
    use std::io::Cursor;

    const TRACE: &str = r#"
# shoulders then a lost person then a failure
{"t_ms": 0, "view": [1000, 2000], "landmarks": {"11": [0.6, 0.3, 0.0], "12": [0.4, 0.3, 0.0]}}
{"t_ms": 100, "view": [1000, 2000], "landmarks": {"11": [0.7, 0.3, 0.0], "12": [0.3, 0.3, 0.0]}}
{"t_ms": 350, "view": [1000, 2000], "landmarks": {"0": [0.5, 0.1], "x": [0.1, 0.1], "11": [0.5]}}
{"t_ms": 700, "view": [1000, 2000], "error": "model crashed"}
{"t_ms": 1000, "view": [1000, 2000], "landmarks": {}}
"#;

    fn session() -> Session {
        let config = Config::default();
        let mut session = Session::new(&config, ViewSize::default());
        session.start(Classification {
            bitmap: RgbaImage::new(4, 5),
            items: Vec::new(),
            primary_label: "t-shirt".to_string(),
            garment_type: GarmentType::Shirt,
        });
        session
    }

    fn pipeline() -> FramePipeline<ReplayEstimator> {
        FramePipeline::new(FrameGate::new(Duration::from_millis(300)), ReplayEstimator)
    }

    #[test]
    fn test_parse_skips_comments_and_defaults() {
        let frames = parse_trace(Cursor::new(TRACE)).unwrap();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].rotation, 0);
        assert!(frames[0].front_facing);
        assert_eq!(frames[3].error.as_deref(), Some("model crashed"));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_trace(Cursor::new("{\"t_ms\": 0, \"view\": [1, 1]}\nnot json\n")).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_malformed_landmarks_skipped() {
        let frames = parse_trace(Cursor::new(TRACE)).unwrap();
        let set = frames[2].landmark_set();
        assert_eq!(set.len(), 1);
        assert!(!set.has_shoulders());
    }

    #[test]
    fn test_replay_through_session() {
        let frames = parse_trace(Cursor::new(TRACE)).unwrap();
        let mut s = session();
        let summary = replay(&mut s, &mut pipeline(), &frames).unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                frames: 5,
                dropped: 2,
                placed: 1,
                skipped: 1,
                failed: 1,
            }
        );
        // 100ms のフレームは間引かれるので、配置は最初のフレームのまま
        let placement = s.overlay().unwrap().placement();
        assert!((placement.left - 280.0).abs() < 1e-3);
        assert!(s.is_tracking());
        assert_eq!(s.status(), &PoseStatus::Error("model crashed".to_string()));
        assert_eq!(s.skeleton().len(), 1);
    }

    #[test]
    fn test_invalid_rotation() {
        let frames = parse_trace(Cursor::new(r#"{"t_ms": 0, "view": [10, 10], "rotation": 45}"#)).unwrap();
        assert!(replay(&mut session(), &mut pipeline(), &frames).is_err());
    }
}
