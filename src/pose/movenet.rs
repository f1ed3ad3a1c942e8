use anyhow::{Context, Result};
use ndarray::Array4;
use opencv::{
    core::{AlgorithmHint, Mat, Size, Vec3b},
    imgproc,
    prelude::*,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use super::estimator::PoseEstimator;
use super::landmark::{Landmark, LandmarkIndex, LandmarkSet};

/// MoveNet の入力サイズ
const INPUT_SIZE: i32 = 192;

/// MoveNet (COCO 17点) の出力順に対応する MediaPipe インデックス
const COCO_TO_MEDIAPIPE: [LandmarkIndex; 17] = [
    LandmarkIndex::Nose,
    LandmarkIndex::LeftEye,
    LandmarkIndex::RightEye,
    LandmarkIndex::LeftEar,
    LandmarkIndex::RightEar,
    LandmarkIndex::LeftShoulder,
    LandmarkIndex::RightShoulder,
    LandmarkIndex::LeftElbow,
    LandmarkIndex::RightElbow,
    LandmarkIndex::LeftWrist,
    LandmarkIndex::RightWrist,
    LandmarkIndex::LeftHip,
    LandmarkIndex::RightHip,
    LandmarkIndex::LeftKnee,
    LandmarkIndex::RightKnee,
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightAnkle,
];

/// ONNX版 MoveNet Lightning による姿勢推定器
pub struct MoveNetEstimator {
    session: Session,
    min_confidence: f32,
}

impl MoveNetEstimator {
    pub fn new<P: AsRef<Path>>(model_path: P, min_confidence: f32) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())
            .with_context(|| format!("Failed to load ONNX model {}", model_path.as_ref().display()))?;

        Ok(Self {
            session,
            min_confidence,
        })
    }
}

impl PoseEstimator for MoveNetEstimator {
    type Image = Mat;

    /// BGR フレームから推定。信頼度の低い点は欠損として扱う
    fn detect(&mut self, image: &Mat) -> Result<Option<LandmarkSet>> {
        let input = Tensor::from_array(to_input_tensor(image)?)?;
        let outputs = self
            .session
            .run(ort::inputs!["serving_default_input_0" => input])
            .context("Inference failed")?;

        // 出力は [1, 1, 17, 3] (y, x, confidence)
        let output: ndarray::ArrayViewD<f32> = outputs["StatefulPartitionedCall_0"]
            .try_extract_array()
            .context("Failed to extract output tensor")?;

        let mut set = LandmarkSet::new();
        for (i, index) in COCO_TO_MEDIAPIPE.iter().enumerate() {
            let confidence = output[[0, 0, i, 2]];
            if confidence < self.min_confidence {
                continue;
            }
            let y = output[[0, 0, i, 0]];
            let x = output[[0, 0, i, 1]];
            set.insert(index.index(), Landmark::new(x, y, 0.0));
        }

        if set.is_empty() {
            Ok(None)
        } else {
            Ok(Some(set))
        }
    }
}

/// BGR Mat → [1, 192, 192, 3] RGB f32 (0.0-255.0)
fn to_input_tensor(frame: &Mat) -> Result<Array4<f32>> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0, AlgorithmHint::ALGO_HINT_DEFAULT)?;

    let mut resized = Mat::default();
    imgproc::resize(
        &rgb,
        &mut resized,
        Size::new(INPUT_SIZE, INPUT_SIZE),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    let side = INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, side, side, 3));
    for y in 0..INPUT_SIZE {
        for x in 0..INPUT_SIZE {
            let pixel = resized.at_2d::<Vec3b>(y, x)?;
            for c in 0..3 {
                tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32;
            }
        }
    }

    Ok(tensor)
}
