use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::detect::BaseArchitecture;

const DEFAULT_DEVICE: &str = "stub://front_camera";
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_THROTTLE_MS: u64 = 100;
const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
const DEFAULT_MOBILE_BREAKPOINT: u32 = 768;
const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    camera: Option<CameraConfigFile>,
    detection: Option<DetectionConfigFile>,
    presentation: Option<PresentationConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    throttle_ms: Option<u64>,
    score_threshold: Option<f32>,
    max_results: Option<usize>,
    base_architecture: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PresentationConfigFile {
    mobile_breakpoint: Option<u32>,
    viewport_width: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub camera: CameraSettings,
    pub detection: DetectionSettings,
    pub presentation: PresentationSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    /// Minimum interval between inferences. An explicit, testable rate
    /// rather than an implicit scheduling artifact.
    pub throttle: Duration,
    pub score_threshold: f32,
    /// None means uncapped; cardinality is bounded only by the engine.
    pub max_results: Option<usize>,
    pub base_architecture: BaseArchitecture,
}

#[derive(Debug, Clone)]
pub struct PresentationSettings {
    /// Viewport widths at or below this classify as mobile.
    pub mobile_breakpoint: u32,
    /// Initial viewport width; updated at runtime via resize signals.
    pub viewport_width: u32,
}

impl OverlayConfig {
    /// Load from the optional JSON file named by `OVERLAY_CONFIG`, then
    /// apply env overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("OVERLAY_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: OverlayConfigFile) -> Self {
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|c| c.device.clone())
                .unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
            width: file
                .camera
                .as_ref()
                .and_then(|c| c.width)
                .unwrap_or(DEFAULT_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|c| c.height)
                .unwrap_or(DEFAULT_HEIGHT),
        };
        let detection = DetectionSettings {
            throttle: Duration::from_millis(
                file.detection
                    .as_ref()
                    .and_then(|d| d.throttle_ms)
                    .unwrap_or(DEFAULT_THROTTLE_MS),
            ),
            score_threshold: file
                .detection
                .as_ref()
                .and_then(|d| d.score_threshold)
                .unwrap_or(DEFAULT_SCORE_THRESHOLD),
            max_results: file.detection.as_ref().and_then(|d| d.max_results),
            base_architecture: file
                .detection
                .as_ref()
                .and_then(|d| d.base_architecture.as_deref())
                .and_then(BaseArchitecture::parse)
                .unwrap_or_default(),
        };
        let presentation = PresentationSettings {
            mobile_breakpoint: file
                .presentation
                .as_ref()
                .and_then(|p| p.mobile_breakpoint)
                .unwrap_or(DEFAULT_MOBILE_BREAKPOINT),
            viewport_width: file
                .presentation
                .as_ref()
                .and_then(|p| p.viewport_width)
                .unwrap_or(DEFAULT_VIEWPORT_WIDTH),
        };
        Self {
            camera,
            detection,
            presentation,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("OVERLAY_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(throttle) = std::env::var("OVERLAY_THROTTLE_MS") {
            let ms: u64 = throttle
                .parse()
                .map_err(|_| anyhow!("OVERLAY_THROTTLE_MS must be an integer number of ms"))?;
            self.detection.throttle = Duration::from_millis(ms);
        }
        if let Ok(threshold) = std::env::var("OVERLAY_SCORE_THRESHOLD") {
            let value: f32 = threshold
                .parse()
                .map_err(|_| anyhow!("OVERLAY_SCORE_THRESHOLD must be a float"))?;
            self.detection.score_threshold = value;
        }
        if let Ok(base) = std::env::var("OVERLAY_BASE_ARCH") {
            self.detection.base_architecture = BaseArchitecture::parse(&base)
                .ok_or_else(|| anyhow!("OVERLAY_BASE_ARCH must be fast, balanced, or accurate"))?;
        }
        if let Ok(width) = std::env::var("OVERLAY_VIEWPORT_WIDTH") {
            let value: u32 = width
                .parse()
                .map_err(|_| anyhow!("OVERLAY_VIEWPORT_WIDTH must be an integer"))?;
            self.presentation.viewport_width = value;
        }
        if let Ok(breakpoint) = std::env::var("OVERLAY_MOBILE_BREAKPOINT") {
            let value: u32 = breakpoint
                .parse()
                .map_err(|_| anyhow!("OVERLAY_MOBILE_BREAKPOINT must be an integer"))?;
            self.presentation.mobile_breakpoint = value;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection.score_threshold) {
            return Err(anyhow!(
                "score threshold must be within [0, 1], got {}",
                self.detection.score_threshold
            ));
        }
        if self.detection.throttle.is_zero() {
            return Err(anyhow!("throttle interval must be greater than zero"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera dimensions must be non-zero"));
        }
        if self.presentation.mobile_breakpoint == 0 {
            return Err(anyhow!("mobile breakpoint must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::from_file(OverlayConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<OverlayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
