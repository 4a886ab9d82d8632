//! Synthetic camera backend.
//!
//! Device strings select behavior so tests can script the source:
//! `stub://name?warmup=N` reports not-ready for the first N readiness
//! checks after acquisition; `stub://name?deny=1` refuses acquisition as a
//! permission failure.

use crate::error::OverlayError;
use crate::frame::Frame;
use crate::source::{SourceStats, StreamConstraints, StreamSession};

/// Frames between synthetic scene changes. The stub engine keys off frame
/// content, so a scene change downstream becomes a detection.
const SCENE_CHANGE_INTERVAL: u64 = 25;

pub struct SyntheticCamera {
    device: String,
    deny_permission: bool,
    warmup_checks: u32,
    warmup_remaining: u32,
    width: u32,
    height: u32,
    open: bool,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticCamera {
    /// Parse a `stub://` device string.
    pub fn parse(device: &str) -> Self {
        let mut warmup = 0u32;
        let mut deny = false;
        if let Some((_, query)) = device.split_once('?') {
            for pair in query.split('&') {
                match pair.split_once('=') {
                    Some(("warmup", value)) => warmup = value.parse().unwrap_or(0),
                    Some(("deny", value)) => deny = value == "1",
                    _ => {}
                }
            }
        }
        Self {
            device: device.to_string(),
            deny_permission: deny,
            warmup_checks: warmup,
            warmup_remaining: 0,
            width: 0,
            height: 0,
            open: false,
            frame_count: 0,
            scene_state: 0,
        }
    }

    pub fn open(&mut self, constraints: &StreamConstraints) -> Result<StreamSession, OverlayError> {
        if self.deny_permission {
            return Err(OverlayError::PermissionDenied(format!(
                "{} refused by policy",
                self.device
            )));
        }
        self.width = constraints.ideal_width;
        self.height = constraints.ideal_height;
        self.open = true;
        self.warmup_remaining = self.warmup_checks;
        Ok(StreamSession {
            width: self.width,
            height: self.height,
        })
    }

    /// Readiness poll. Simulates a device that delivers first data only
    /// after a few checks when a warmup was configured.
    pub fn frame_ready(&mut self) -> bool {
        if !self.open {
            return false;
        }
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return false;
        }
        self.width > 0 && self.height > 0
    }

    pub fn grab(&mut self) -> Result<Frame, OverlayError> {
        if !self.open {
            return Err(OverlayError::DeviceUnavailable(
                "synthetic camera not open".to_string(),
            ));
        }
        self.frame_count += 1;
        if self.frame_count % SCENE_CHANGE_INTERVAL == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        Ok(Frame::new(
            self.generate_pixels(),
            self.width,
            self.height,
        ))
    }

    /// Pixels depend only on scene state, so consecutive frames are
    /// identical until the scene flips.
    fn generate_pixels(&self) -> Vec<u8> {
        let pixel_count = (self.width * self.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.scene_state as u64 * 31) % 256) as u8;
        }
        pixels
    }

    pub fn close(&mut self) {
        self.open = false;
        self.width = 0;
        self.height = 0;
    }

    pub fn is_healthy(&self) -> bool {
        true
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            device: self.device.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_frames_identical_until_scene_change() {
        let mut camera = SyntheticCamera::parse("stub://scene");
        camera.open(&StreamConstraints::default()).unwrap();

        let a = camera.grab().unwrap();
        let b = camera.grab().unwrap();
        assert_eq!(a.pixels, b.pixels);

        // Advance past a scene boundary.
        for _ in 0..SCENE_CHANGE_INTERVAL {
            camera.grab().unwrap();
        }
        let c = camera.grab().unwrap();
        assert_ne!(a.pixels, c.pixels);
    }

    #[test]
    fn closed_camera_refuses_grab() {
        let mut camera = SyntheticCamera::parse("stub://x");
        camera.open(&StreamConstraints::default()).unwrap();
        camera.close();
        assert!(camera.grab().is_err());
        assert!(!camera.frame_ready());
    }
}
