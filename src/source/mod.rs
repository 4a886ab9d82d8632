//! Frame sources.
//!
//! A `CameraSource` owns the media stream and exposes readiness and current
//! frame dimensions. Backends:
//! - synthetic stub (`stub://` device paths), always compiled, used by
//!   tests and the demo binary;
//! - real V4L2 device (feature: source-v4l2).
//!
//! Acquisition is exclusive per source: a second `acquire` while a session
//! is active is rejected until `release`. `release` is idempotent and must
//! drop the underlying capture stream, or the camera stays on.

mod stub;
#[cfg(feature = "source-v4l2")]
mod v4l2;

use crate::error::OverlayError;
use crate::frame::Frame;

pub use stub::SyntheticCamera;
#[cfg(feature = "source-v4l2")]
pub use v4l2::V4l2Camera;

/// Camera facing preference, part of the acquisition request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    /// Rear/world-facing camera.
    #[default]
    Environment,
    /// Front/user-facing camera.
    User,
}

/// Acquisition request. Video only; audio is never requested.
#[derive(Clone, Copy, Debug)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::Environment,
            ideal_width: 640,
            ideal_height: 480,
        }
    }
}

/// An active stream. Created on successful acquisition, destroyed on
/// release. At most one per source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamSession {
    /// Negotiated frame width; may differ from the requested ideal.
    pub width: u32,
    pub height: u32,
}

/// Source statistics for the daemon's periodic health log.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub device: String,
}

/// Frame source over a camera device.
pub struct CameraSource {
    backend: CameraBackend,
    session: Option<StreamSession>,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "source-v4l2")]
    Device(V4l2Camera),
}

impl CameraSource {
    /// Open a source for a device path. `stub://` paths get the synthetic
    /// backend; anything else needs the `source-v4l2` feature.
    pub fn new(device: &str) -> Result<Self, OverlayError> {
        if device.starts_with("stub://") {
            return Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::parse(device)),
                session: None,
            });
        }
        Self::device_source(device)
    }

    #[cfg(feature = "source-v4l2")]
    fn device_source(device: &str) -> Result<Self, OverlayError> {
        Ok(Self {
            backend: CameraBackend::Device(V4l2Camera::new(device)),
            session: None,
        })
    }

    #[cfg(not(feature = "source-v4l2"))]
    fn device_source(device: &str) -> Result<Self, OverlayError> {
        Err(OverlayError::DeviceUnavailable(format!(
            "device {} requires the source-v4l2 feature",
            device
        )))
    }

    /// Acquire the camera. Opens the underlying resource exclusively; a
    /// second acquire while a session is active is rejected.
    pub fn acquire(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<StreamSession, OverlayError> {
        if self.session.is_some() {
            return Err(OverlayError::DeviceUnavailable(
                "stream already acquired; release it first".to_string(),
            ));
        }

        let session = match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.open(constraints)?,
            #[cfg(feature = "source-v4l2")]
            CameraBackend::Device(camera) => camera.open(constraints)?,
        };
        self.session = Some(session);
        log::info!(
            "CameraSource: acquired {} ({}x{})",
            self.stats().device,
            session.width,
            session.height
        );
        Ok(session)
    }

    pub fn session(&self) -> Option<&StreamSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the next captured frame has valid, non-zero dimensions.
    /// Guards against reading a frame before the device has delivered
    /// first data.
    pub fn frame_ready(&mut self) -> bool {
        if self.session.is_none() {
            return false;
        }
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.frame_ready(),
            #[cfg(feature = "source-v4l2")]
            CameraBackend::Device(camera) => camera.frame_ready(),
        }
    }

    /// Capture the next frame for inference.
    pub fn grab(&mut self) -> Result<Frame, OverlayError> {
        if self.session.is_none() {
            return Err(OverlayError::DeviceUnavailable(
                "no active stream".to_string(),
            ));
        }
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.grab(),
            #[cfg(feature = "source-v4l2")]
            CameraBackend::Device(camera) => camera.grab(),
        }
    }

    /// Release the camera. Idempotent: releasing an already-released source
    /// is a no-op. Stops the underlying capture stream.
    pub fn release(&mut self) {
        if self.session.take().is_none() {
            return;
        }
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.close(),
            #[cfg(feature = "source-v4l2")]
            CameraBackend::Device(camera) => camera.close(),
        }
        log::info!("CameraSource: released {}", self.stats().device);
    }

    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.is_healthy(),
            #[cfg(feature = "source-v4l2")]
            CameraBackend::Device(camera) => camera.is_healthy(),
        }
    }

    pub fn stats(&self) -> SourceStats {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.stats(),
            #[cfg(feature = "source-v4l2")]
            CameraBackend::Device(camera) => camera.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_grab_release_roundtrip() {
        let mut source = CameraSource::new("stub://front").unwrap();
        let session = source.acquire(&StreamConstraints::default()).unwrap();
        assert_eq!(session.width, 640);
        assert_eq!(session.height, 480);
        assert!(source.is_active());

        assert!(source.frame_ready());
        let frame = source.grab().unwrap();
        assert_eq!(frame.width, 640);
        assert!(frame.is_valid());

        source.release();
        assert!(!source.is_active());
    }

    #[test]
    fn concurrent_acquire_is_rejected_until_release() {
        let mut source = CameraSource::new("stub://front").unwrap();
        source.acquire(&StreamConstraints::default()).unwrap();

        let err = source.acquire(&StreamConstraints::default()).unwrap_err();
        assert!(matches!(err, OverlayError::DeviceUnavailable(_)));

        source.release();
        assert!(source.acquire(&StreamConstraints::default()).is_ok());
    }

    #[test]
    fn release_is_idempotent() {
        let mut source = CameraSource::new("stub://front").unwrap();
        source.acquire(&StreamConstraints::default()).unwrap();

        source.release();
        let stats_once = source.stats();
        source.release();
        let stats_twice = source.stats();

        assert!(!source.is_active());
        assert_eq!(stats_once.frames_captured, stats_twice.frames_captured);
    }

    #[test]
    fn not_ready_before_acquire_and_during_warmup() {
        let mut source = CameraSource::new("stub://front?warmup=2").unwrap();
        assert!(!source.frame_ready());

        source.acquire(&StreamConstraints::default()).unwrap();
        assert!(!source.frame_ready());
        assert!(!source.frame_ready());
        assert!(source.frame_ready());
    }

    #[test]
    fn grab_without_session_is_device_unavailable() {
        let mut source = CameraSource::new("stub://front").unwrap();
        assert!(matches!(
            source.grab(),
            Err(OverlayError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn stub_permission_denial_is_surfaced() {
        let mut source = CameraSource::new("stub://front?deny=1").unwrap();
        let err = source.acquire(&StreamConstraints::default()).unwrap_err();
        assert!(matches!(err, OverlayError::PermissionDenied(_)));
    }
}
