use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::gate::FrameGate;
use super::projector::{FrameContext, ProjectedLandmarks};
use crate::camera::{CameraFrame, FrameSlot};
use crate::pose::{LandmarkSet, PoseEstimator};

/// 新フレーム待ちのポーリング間隔
const IDLE_WAIT: Duration = Duration::from_millis(2);

/// UIスレッドが書き込み、ワーカーが読むビューサイズ
#[derive(Debug, Clone, Default)]
pub struct ViewSize {
    packed: Arc<AtomicU64>,
}

impl ViewSize {
    pub fn new(width: u32, height: u32) -> Self {
        let view = Self::default();
        view.set(width, height);
        view
    }

    pub fn set(&self, width: u32, height: u32) {
        let packed = ((width as u64) << 32) | height as u64;
        self.packed.store(packed, Ordering::Release);
    }

    pub fn get(&self) -> (u32, u32) {
        let packed = self.packed.load(Ordering::Acquire);
        ((packed >> 32) as u32, packed as u32)
    }
}

/// 処理済みフレーム1枚分の結果。ワーカーからUIスレッドへ送る
#[derive(Debug, Clone, PartialEq)]
pub enum FrameUpdate {
    Pose {
        landmarks: LandmarkSet,
        projected: ProjectedLandmarks,
        context: FrameContext,
    },
    Error(String),
}

/// 1フレームを間引き → 推定 → 画面座標変換まで直列に処理する
pub struct FramePipeline<E> {
    gate: FrameGate,
    estimator: E,
}

impl<E: PoseEstimator> FramePipeline<E> {
    pub fn new(gate: FrameGate, estimator: E) -> Self {
        Self { gate, estimator }
    }

    /// 結果が無いフレーム（間引き・ビュー未確定・人物なし）は None
    pub fn process(
        &mut self,
        frame: &CameraFrame<E::Image>,
        now: Instant,
        view: (u32, u32),
    ) -> Option<FrameUpdate> {
        let previous = self.gate.last_processed();
        if !self.gate.admit(now) {
            return None;
        }
        if let Some(previous) = previous {
            log::trace!("frame admitted {}ms after previous", now.saturating_duration_since(previous).as_millis());
        }

        let context = FrameContext::new(view.0, view.1, frame.rotation, frame.front_facing);
        if !context.is_ready() {
            log::debug!("view not laid out yet, skipping frame");
            return None;
        }

        match self.estimator.detect(&frame.image) {
            Ok(Some(landmarks)) => {
                let projected = ProjectedLandmarks::project(&landmarks, &context)?;
                log::debug!(
                    "pose with {} landmarks, rotation {}",
                    landmarks.len(),
                    frame.rotation.degrees()
                );
                Some(FrameUpdate::Pose {
                    landmarks,
                    projected,
                    context,
                })
            }
            Ok(None) => {
                log::debug!("no pose landmarks detected");
                None
            }
            Err(e) => {
                log::warn!("pose estimation failed: {:#}", e);
                Some(FrameUpdate::Error(format!("{:#}", e)))
            }
        }
    }
}

/// 姿勢推定を専用スレッドで回すワーカー
///
/// カメラ側はブロックしない。ワーカーが処理中に届いたフレームは
/// [`FrameSlot`] で上書きされて捨てられる。
pub struct TrackingWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TrackingWorker {
    pub fn spawn<E>(
        mut pipeline: FramePipeline<E>,
        frames: FrameSlot<CameraFrame<E::Image>>,
        view: ViewSize,
        updates: Sender<FrameUpdate>,
    ) -> Result<Self>
    where
        E: PoseEstimator + Send + 'static,
        E::Image: Clone + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("tracking".to_string())
            .spawn(move || {
                let mut seen = 0u64;
                while !stop_flag.load(Ordering::Acquire) {
                    let Some((id, frame)) = frames.latest_since(seen) else {
                        thread::sleep(IDLE_WAIT);
                        continue;
                    };
                    seen = id;

                    let update = pipeline.process(&frame, Instant::now(), view.get());

                    // 停止要求後に終わったフレームは捨てる
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    if let Some(update) = update {
                        if updates.send(update).is_err() {
                            break;
                        }
                    }
                }
                log::info!("tracking worker stopped");
            })
            .context("Failed to spawn tracking thread")?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// スレッドが生きているか。停止要求後は false
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 停止を要求する。処理中のフレームは待たずに戻る
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        // JoinHandle を捨ててスレッドを切り離す。推定器はスレッド終了時に解放される
        self.handle.take();
    }
}

impl Drop for TrackingWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;
    use crate::tracker::Rotation;
    use std::sync::mpsc;

    /// 画像の代わりに結果そのものを受け取るテスト用推定器
    struct ScriptedEstimator {
        calls: usize,
    }

    #[derive(Clone)]
    enum Scripted {
        Pose(LandmarkSet),
        Empty,
        Fail,
    }

    impl PoseEstimator for ScriptedEstimator {
        type Image = Scripted;

        fn detect(&mut self, image: &Scripted) -> Result<Option<LandmarkSet>> {
            self.calls += 1;
            match image {
                Scripted::Pose(set) => Ok(Some(set.clone())),
                Scripted::Empty => Ok(None),
                Scripted::Fail => anyhow::bail!("model crashed"),
            }
        }
    }

    /// detect の途中で止まり、解放されるまで戻らない推定器
    struct BlockingEstimator {
        started: mpsc::Sender<()>,
        release: mpsc::Receiver<()>,
    }

    impl PoseEstimator for BlockingEstimator {
        type Image = Scripted;

        fn detect(&mut self, _image: &Scripted) -> Result<Option<LandmarkSet>> {
            let _ = self.started.send(());
            let _ = self.release.recv_timeout(Duration::from_secs(5));
            Ok(Some(shoulders()))
        }
    }

    fn shoulders() -> LandmarkSet {
        let mut set = LandmarkSet::new();
        set.insert(11, Landmark::new(0.6, 0.3, 0.0));
        set.insert(12, Landmark::new(0.4, 0.3, 0.0));
        set
    }

    fn pipeline() -> FramePipeline<ScriptedEstimator> {
        FramePipeline::new(
            FrameGate::new(Duration::from_millis(300)),
            ScriptedEstimator { calls: 0 },
        )
    }

    fn frame(image: Scripted) -> CameraFrame<Scripted> {
        CameraFrame::new(image, Rotation::Deg0, true)
    }

    #[test]
    fn test_view_size_roundtrip() {
        let view = ViewSize::new(1080, 2400);
        assert_eq!(view.get(), (1080, 2400));
        view.set(0, 0);
        assert_eq!(view.get(), (0, 0));
        assert_eq!(ViewSize::default().get(), (0, 0));
    }

    #[test]
    fn test_pose_projected() {
        let mut p = pipeline();
        let update = p
            .process(&frame(Scripted::Pose(shoulders())), Instant::now(), (1000, 2000))
            .unwrap();
        assert!(matches!(&update, FrameUpdate::Pose { landmarks, .. } if landmarks.has_shoulders()));
        match update {
            FrameUpdate::Pose { projected, context, .. } => {
                assert_eq!(projected.len(), 2);
                assert_eq!(context.view_width, 1000);
                assert!(context.front_facing);
            }
            FrameUpdate::Error(_) => panic!("unexpected error"),
        }
    }

    #[test]
    fn test_gated_frame_skips_estimator() {
        let mut p = pipeline();
        let t0 = Instant::now();
        assert!(p.process(&frame(Scripted::Pose(shoulders())), t0, (1000, 2000)).is_some());
        assert!(p
            .process(&frame(Scripted::Pose(shoulders())), t0 + Duration::from_millis(100), (1000, 2000))
            .is_none());
        assert_eq!(p.estimator.calls, 1);
    }

    #[test]
    fn test_unmeasured_view_skips_estimator() {
        let mut p = pipeline();
        assert!(p.process(&frame(Scripted::Pose(shoulders())), Instant::now(), (0, 0)).is_none());
        assert_eq!(p.estimator.calls, 0);
    }

    #[test]
    fn test_empty_detection() {
        let mut p = pipeline();
        assert!(p.process(&frame(Scripted::Empty), Instant::now(), (1000, 2000)).is_none());
    }

    #[test]
    fn test_estimator_failure_reported() {
        let mut p = pipeline();
        let update = p.process(&frame(Scripted::Fail), Instant::now(), (1000, 2000));
        match update {
            Some(FrameUpdate::Error(msg)) => assert!(msg.contains("model crashed")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_worker_delivers_and_stops() {
        let slot = FrameSlot::new();
        let (tx, rx) = mpsc::channel();
        let pipeline = FramePipeline::new(FrameGate::new(Duration::ZERO), ScriptedEstimator { calls: 0 });
        let mut worker =
            TrackingWorker::spawn(pipeline, slot.clone(), ViewSize::new(1000, 2000), tx).unwrap();

        slot.publish(frame(Scripted::Pose(shoulders())));
        let update = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(&update, FrameUpdate::Pose { landmarks, .. } if landmarks.has_shoulders()));
        assert!(worker.is_running());

        worker.shutdown();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_shutdown_discards_in_flight_frame() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let slot = FrameSlot::new();
        let (tx, rx) = mpsc::channel();
        let estimator = BlockingEstimator {
            started: started_tx,
            release: release_rx,
        };
        let pipeline = FramePipeline::new(FrameGate::new(Duration::ZERO), estimator);
        let mut worker =
            TrackingWorker::spawn(pipeline, slot.clone(), ViewSize::new(1000, 2000), tx).unwrap();

        slot.publish(frame(Scripted::Pose(shoulders())));
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(worker.is_running());

        // 推定中でも待たずに戻る
        let t0 = Instant::now();
        worker.shutdown();
        assert!(t0.elapsed() < Duration::from_millis(100));

        release_tx.send(()).unwrap();
        // 結果を送らずにスレッドが終わり、送信側が閉じる
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        );
    }
}
