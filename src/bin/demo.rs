//! Self-contained demo: synthetic camera plus stub engine.
//!
//! Runs the detection loop for a fixed number of ticks and prints the
//! textual detection log as it updates. No hardware or model weights
//! needed.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use vision_overlay::ui::Ui;
use vision_overlay::{
    CameraSource, ConsoleSurface, DetectionLoopController, ModelOptions, OverlayConfig,
    StubEngine, TickOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "demo", about = "Detection overlay demo (no hardware required)")]
struct Args {
    /// Ticks to run before stopping
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// UI mode: auto, plain, pretty
    #[arg(long)]
    ui: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let ui = Ui::from_flag(args.ui.as_deref(), std::io::stderr().is_terminal());

    let config = OverlayConfig::default();
    let source = CameraSource::new("stub://demo_camera")?;
    let surface = ConsoleSurface::new(config.camera.width, config.camera.height);
    let mut controller = DetectionLoopController::new(source, StubEngine::new(), surface, &config);

    {
        let _stage = ui.stage("loading detection model");
        controller.load(&ModelOptions::default())?;
    }
    {
        let _stage = ui.stage("acquiring camera");
        controller.start()?;
    }

    let mut rendered = 0u64;
    let mut detected = 0usize;
    for _ in 0..args.ticks {
        if let TickOutcome::Rendered { detections } = controller.tick(Instant::now()) {
            rendered += 1;
            detected += detections;
            if detections > 0 {
                for line in controller.log().lines() {
                    println!("{}", line);
                }
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    controller.stop();

    println!();
    println!("rendered ticks: {}", rendered);
    println!("total detections: {}", detected);
    Ok(())
}
