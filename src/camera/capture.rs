use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::slot::{CameraFrame, FrameSlot};
use crate::config::CameraConfig;
use crate::tracker::Rotation;

/// OpenCVを使用したカメラキャプチャ
pub struct OpenCvCamera {
    capture: VideoCapture,
    width: u32,
    height: u32,
}

impl OpenCvCamera {
    /// 解像度を指定してカメラを開く
    pub fn open(index: i32, width: u32, height: u32) -> Result<Self> {
        let mut capture = VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32)
            .context("Failed to open camera")?;

        if !capture.is_opened()? {
            anyhow::bail!("Camera {} is not available", index);
        }

        capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        // 古いフレームを溜めない
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        log::info!("camera {} opened at {}x{}", index, actual_width, actual_height);

        Ok(Self {
            capture,
            width: actual_width,
            height: actual_height,
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// フレームを読み込む（BGR形式）
    pub fn read_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        self.capture
            .read(&mut frame)
            .context("Failed to read frame")?;

        if frame.empty() {
            anyhow::bail!("Empty frame received");
        }

        Ok(frame)
    }
}

/// 別スレッドでキャプチャし、最新フレームだけを [`FrameSlot`] に置く
///
/// フロントカメラの場合は表示と合わせるため左右反転せずに渡す。
/// 反転は座標変換側で行う。
pub struct ThreadedCamera {
    slot: FrameSlot<CameraFrame<Mat>>,
    stop: Arc<AtomicBool>,
    width: u32,
    height: u32,
}

impl ThreadedCamera {
    pub fn start(config: &CameraConfig) -> Result<Self> {
        let rotation = config.rotation()?;
        let front_facing = config.front_facing;
        let mut camera = OpenCvCamera::open(config.index, config.width, config.height)?;
        let (width, height) = camera.resolution();

        let slot = FrameSlot::new();
        let writer = slot.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        thread::Builder::new()
            .name("camera".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Acquire) {
                    match camera.read_frame() {
                        Ok(image) => writer.publish(CameraFrame::new(image, rotation, front_facing)),
                        Err(e) => {
                            log::warn!("camera read error: {:#}", e);
                            thread::sleep(Duration::from_millis(10));
                        }
                    }
                }
                // camera はここで drop され、デバイスが解放される
                log::info!("camera thread stopped");
            })
            .context("Failed to spawn camera thread")?;

        Ok(Self {
            slot,
            stop,
            width,
            height,
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames(&self) -> FrameSlot<CameraFrame<Mat>> {
        self.slot.clone()
    }

    /// キャプチャを止める。読み込み中のフレームは待たない
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }
}

impl Drop for ThreadedCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

/// フロントカメラのプレビュー用に左右反転する
pub fn mirror(frame: &Mat) -> Result<Mat> {
    let mut flipped = Mat::default();
    core::flip(frame, &mut flipped, 1)?;
    Ok(flipped)
}

/// 表示用にセンサー回転を打ち消す
pub fn upright(frame: &Mat, rotation: Rotation) -> Result<Mat> {
    let code = match rotation {
        Rotation::Deg0 => return Ok(frame.try_clone()?),
        Rotation::Deg90 => core::ROTATE_90_CLOCKWISE,
        Rotation::Deg180 => core::ROTATE_180,
        Rotation::Deg270 => core::ROTATE_90_COUNTERCLOCKWISE,
    };
    let mut rotated = Mat::default();
    core::rotate(frame, &mut rotated, code)?;
    Ok(rotated)
}
