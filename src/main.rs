use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use garment_overlay::config::Config;
use garment_overlay::garment::Classification;
use garment_overlay::render::{FrameBuffer, OverlayRenderer};
use garment_overlay::replay::{load_trace, replay, ReplayEstimator};
use garment_overlay::session::Session;
use garment_overlay::tracker::{FrameGate, FramePipeline, ViewSize};

/// 背景色（ビューに何も描かれていない部分）
const BACKGROUND: u32 = 0x202020;

#[derive(Parser, Debug)]
#[command(name = "garment_overlay")]
#[command(about = "Replay a recorded landmark trace and render the placed garment")]
#[command(version = env!("GIT_VERSION"))]
struct Args {
    /// Landmark trace (JSON Lines, one frame per line)
    trace: PathBuf,

    /// Cut-out garment image (PNG/JPEG with transparency)
    #[arg(long, conflicts_with = "response")]
    garment: Option<PathBuf>,

    /// Label for --garment (e.g. "jeans", "t-shirt")
    #[arg(long, default_value = "unknown")]
    label: String,

    /// Saved classifier response (JSON) to take the garment from
    #[arg(long)]
    response: Option<PathBuf>,

    /// Background image drawn under the overlay
    #[arg(long)]
    background: Option<PathBuf>,

    /// Do not draw the debug skeleton
    #[arg(long)]
    no_skeleton: bool,

    /// Do not draw the garment
    #[arg(long)]
    no_garment: bool,

    /// Output PNG of the final frame
    #[arg(short, long, default_value = "overlay.png")]
    output: PathBuf,

    /// Configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn load_classification(args: &Args) -> Result<Classification> {
    match (&args.response, &args.garment) {
        (Some(path), _) => Classification::from_response_file(path),
        (None, Some(path)) => Classification::from_image_file(path, &args.label),
        (None, None) => anyhow::bail!("either --garment or --response is required"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str()))
        .format_timestamp(None)
        .format_target(false)
        .init();

    log::info!("Garment Overlay Replay ({})", env!("GIT_VERSION"));

    let config = Config::load_or_default(&args.config);
    let classification = load_classification(&args)?;
    let frames = load_trace(&args.trace)?;
    let Some(last) = frames.last() else {
        anyhow::bail!("trace {} has no frames", args.trace.display());
    };
    let [width, height] = last.view;

    let view = ViewSize::default();
    let mut session = Session::new(&config, view);
    session.start(classification);
    if args.no_skeleton {
        session.set_skeleton_visible(false);
    }
    if args.no_garment {
        session.set_garment_visible(false);
    }

    let mut pipeline = FramePipeline::new(FrameGate::from_config(&config.gate), ReplayEstimator);
    let summary = replay(&mut session, &mut pipeline, &frames)?;

    let mut canvas = match &args.background {
        Some(path) => {
            let background = image::open(path)
                .with_context(|| format!("Failed to open background {}", path.display()))?
                .resize_exact(width, height, image::imageops::FilterType::Triangle)
                .to_rgba8();
            FrameBuffer::from_rgba(&background)
        }
        None => FrameBuffer::filled(width as usize, height as usize, BACKGROUND),
    };
    let renderer = OverlayRenderer::from_config(&config.skeleton);
    renderer.draw_session(&mut canvas, &session)?;
    canvas.save(&args.output)?;

    if let Some(overlay) = session.overlay() {
        let rect = overlay.placement();
        println!(
            "{} ({}): left {:.1}, top {:.1}, size {:.1}x{:.1}",
            overlay.garment_type(),
            session.primary_label(),
            rect.left,
            rect.top,
            rect.width,
            rect.height
        );
    }
    println!(
        "{} ({})",
        session.status(),
        if session.is_tracking() { "tracking acquired" } else { "never tracked" }
    );
    println!(
        "{} frames: {} placed, {} skipped, {} failed, {} dropped",
        summary.frames, summary.placed, summary.skipped, summary.failed, summary.dropped
    );
    println!("Wrote {}", args.output.display());
    Ok(())
}
