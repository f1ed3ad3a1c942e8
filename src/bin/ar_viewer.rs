use anyhow::Result;
use clap::Parser;
use opencv::core::Mat;
use opencv::prelude::*;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use garment_overlay::camera::{capture, ThreadedCamera};
use garment_overlay::config::Config;
use garment_overlay::garment::{Classification, TouchEvent};
use garment_overlay::pose::MoveNetEstimator;
use garment_overlay::render::{Key, MatPainter, MinifbRenderer, OverlayRenderer};
use garment_overlay::session::{FrameOutcome, Session};
use garment_overlay::tracker::{FrameGate, FramePipeline, Rotation, TrackingWorker, ViewSize};

#[derive(Parser, Debug)]
#[command(name = "ar_viewer")]
#[command(about = "Live camera preview with the garment placed on the detected body")]
#[command(version = env!("GIT_VERSION"))]
struct Args {
    /// Cut-out garment image (PNG/JPEG with transparency)
    #[arg(long, conflicts_with = "response")]
    garment: Option<PathBuf>,

    /// Label for --garment (e.g. "jeans", "t-shirt")
    #[arg(long, default_value = "unknown")]
    label: String,

    /// Saved classifier response (JSON) to take the garment from
    #[arg(long)]
    response: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// 表示用に回転と反転を戻す
fn to_display(image: &Mat, rotation: Rotation, front_facing: bool) -> Result<Mat> {
    let upright = capture::upright(image, rotation)?;
    if front_facing {
        capture::mirror(&upright)
    } else {
        Ok(upright)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str()))
        .format_timestamp(None)
        .format_target(false)
        .init();

    log::info!("AR Viewer ({})", env!("GIT_VERSION"));
    log::info!("S: skeleton, G: garment, drag: move garment, ESC: exit");

    let config = Config::load_or_default(&args.config);
    let classification = match (&args.response, &args.garment) {
        (Some(path), _) => Classification::from_response_file(path)?,
        (None, Some(path)) => Classification::from_image_file(path, &args.label)?,
        (None, None) => anyhow::bail!("either --garment or --response is required"),
    };

    // カメラを開く
    let camera = ThreadedCamera::start(&config.camera)?;
    let (cam_w, cam_h) = camera.resolution();
    let (view_w, view_h) = match config.camera.rotation()? {
        Rotation::Deg90 | Rotation::Deg270 => (cam_h, cam_w),
        Rotation::Deg0 | Rotation::Deg180 => (cam_w, cam_h),
    };
    log::info!("camera {}x{}, view {}x{}", cam_w, cam_h, view_w, view_h);

    let view = ViewSize::default();
    let mut session = Session::new(&config, view.clone());
    session.start(classification);

    // モデルを読み込む
    log::info!("loading model from {}", config.estimator.model_path);
    let estimator = MoveNetEstimator::new(&config.estimator.model_path, config.estimator.min_confidence)?;
    let pipeline = FramePipeline::new(FrameGate::from_config(&config.gate), estimator);

    let (tx, rx) = mpsc::channel();
    let mut worker = TrackingWorker::spawn(pipeline, camera.frames(), view.clone(), tx)?;

    let mut window = MinifbRenderer::new("Garment Overlay", view_w as usize, view_h as usize)?;
    // ウィンドウができた時点でレイアウト確定とみなす
    session.set_view_size(view_w, view_h);
    let renderer = OverlayRenderer::from_config(&config.skeleton);

    let frames = camera.frames();
    let mut seen = 0u64;
    let mut display: Option<Mat> = None;
    let mut dragging = false;

    // FPS計測用
    let mut frame_count = 0u32;
    let mut placed_count = 0u32;
    let mut fps_timer = Instant::now();

    while window.is_open() {
        if !worker.is_running() {
            log::error!("tracking worker exited unexpectedly");
            break;
        }

        // ワーカーの結果を全部適用
        while let Ok(update) = rx.try_recv() {
            if let FrameOutcome::Placed(_) = session.apply(update) {
                placed_count += 1;
            }
        }

        if window.key_pressed(Key::S) {
            let shown = session.toggle_skeleton();
            log::info!("skeleton {}", if shown { "on" } else { "off" });
        }
        if window.key_pressed(Key::G) {
            let shown = session.toggle_garment();
            log::info!("garment {}", if shown { "on" } else { "off" });
        }

        match window.mouse_drag() {
            Some(p) if dragging => session.handle_touch(TouchEvent::Move(p)),
            Some(p) => {
                session.handle_touch(TouchEvent::Down(p));
                dragging = true;
            }
            None => dragging = false,
        }

        if let Some((id, frame)) = frames.latest_since(seen) {
            seen = id;
            match to_display(&frame.image, frame.rotation, frame.front_facing) {
                Ok(mat) => display = Some(mat),
                Err(e) => log::warn!("frame conversion failed: {:#}", e),
            }
            frame_count += 1;
        }

        if let Some(mat) = display.as_ref() {
            let mut canvas = mat.try_clone()?;
            renderer.draw_session(&mut MatPainter::new(&mut canvas), &session)?;
            window.draw_frame(&canvas)?;
        }
        window.update()?;

        let elapsed = fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            log::info!(
                "FPS: {:.1}, placements: {}, {}",
                frame_count as f32 / elapsed,
                placed_count,
                session.status()
            );
            frame_count = 0;
            placed_count = 0;
            fps_timer = Instant::now();
        }

        if display.is_none() {
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    log::info!("shutting down");
    worker.shutdown();
    camera.stop();
    session.end();
    Ok(())
}
