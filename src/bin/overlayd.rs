//! overlayd - detection overlay daemon
//!
//! This daemon:
//! 1. Acquires the configured camera (synthetic stub by default, V4L2 with
//!    the source-v4l2 feature)
//! 2. Loads the detection model through the adapter
//! 3. Drives the detection loop at display cadence; inference is throttled
//!    internally to the configured rate
//! 4. Renders boxes and labels to a headless console surface and logs the
//!    textual detection feed
//! 5. Stops cleanly on interrupt via the controller's cancel handle

use anyhow::Result;
use clap::Parser;
use std::time::{Duration, Instant};

use vision_overlay::{
    CameraSource, ConsoleSurface, DetectionLoopController, LoopState, ModelOptions, OverlayConfig,
    StubEngine, TickOutcome,
};

/// Display-cadence interval between tick calls. Inference throttling is the
/// controller's job; this only bounds busy-waiting.
const TICK_INTERVAL: Duration = Duration::from_millis(16);
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "overlayd", about = "Real-time detection overlay daemon")]
struct Args {
    /// Camera device (overrides config), e.g. stub://front or /dev/video0
    #[arg(long)]
    device: Option<String>,

    /// Exit after this many rendered ticks (0 = run until interrupted)
    #[arg(long, default_value_t = 0)]
    max_ticks: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = OverlayConfig::load()?;
    if let Some(device) = args.device {
        config.camera.device = device;
    }

    let source = CameraSource::new(&config.camera.device)?;
    let surface = ConsoleSurface::new(config.camera.width, config.camera.height);
    let mut controller = DetectionLoopController::new(source, StubEngine::new(), surface, &config);

    controller.set_on_state_change(|state| log::info!("state: {}", state.as_str()));
    controller.set_on_detections(|detections| {
        for detection in detections {
            log::info!("detection: {}", detection.label());
        }
    });

    let cancel = controller.cancel_handle();
    ctrlc::set_handler(move || {
        log::info!("interrupt received, stopping");
        cancel.cancel();
    })?;

    controller.load(&ModelOptions {
        base: config.detection.base_architecture,
    })?;
    controller.start()?;
    log::info!(
        "overlayd running on {} (throttle {:?}, threshold {})",
        config.camera.device,
        config.detection.throttle,
        config.detection.score_threshold
    );

    let mut rendered = 0u64;
    let mut last_health_log = Instant::now();
    loop {
        match controller.tick(Instant::now()) {
            TickOutcome::Rendered { .. } => {
                rendered += 1;
                if args.max_ticks > 0 && rendered >= args.max_ticks {
                    log::info!("reached {} rendered ticks, stopping", args.max_ticks);
                    controller.stop();
                }
            }
            TickOutcome::Cancelled => break,
            TickOutcome::NotStreaming => break,
            _ => {}
        }

        if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
            let stats = controller.source().stats();
            log::info!(
                "camera health={} frames={} device={}",
                controller.source().is_healthy(),
                stats.frames_captured,
                stats.device
            );
            last_health_log = Instant::now();
        }

        std::thread::sleep(TICK_INTERVAL);
    }

    debug_assert_eq!(controller.state(), LoopState::Stopped);
    log::info!("overlayd stopped after {} rendered ticks", rendered);
    Ok(())
}
