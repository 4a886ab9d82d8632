//! V4L2 camera backend (feature: source-v4l2).

use ouroboros::self_referencing;
use std::time::{Duration, Instant};

use crate::error::OverlayError;
use crate::frame::Frame;
use crate::source::{SourceStats, StreamConstraints, StreamSession};

pub struct V4l2Camera {
    device_path: String,
    state: Option<CaptureState>,
    negotiated: Option<StreamSession>,
    frame_count: u64,
    last_frame_at: Option<Instant>,
    last_error: Option<String>,
}

#[self_referencing]
struct CaptureState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Camera {
    pub fn new(device_path: &str) -> Self {
        Self {
            device_path: device_path.to_string(),
            state: None,
            negotiated: None,
            frame_count: 0,
            last_frame_at: None,
            last_error: None,
        }
    }

    pub fn open(&mut self, constraints: &StreamConstraints) -> Result<StreamSession, OverlayError> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.device_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::PermissionDenied {
                OverlayError::PermissionDenied(format!("{}: {}", self.device_path, err))
            } else {
                OverlayError::DeviceUnavailable(format!("{}: {}", self.device_path, err))
            }
        })?;

        let mut format = device
            .format()
            .map_err(|err| self.unavailable("read format", err))?;
        format.width = constraints.ideal_width;
        format.height = constraints.ideal_height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        // The driver may refuse the requested format; fall back to whatever
        // it actually negotiated and report that in the session.
        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Camera: set_format on {} failed: {}",
                    self.device_path,
                    err
                );
                device
                    .format()
                    .map_err(|err| self.unavailable("read format after set failure", err))?
            }
        };

        let state = CaptureStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
            },
        }
        .try_build()
        .map_err(|err| self.unavailable("create capture stream", err))?;

        let session = StreamSession {
            width: format.width,
            height: format.height,
        };
        self.state = Some(state);
        self.negotiated = Some(session);
        self.last_error = None;
        self.last_frame_at = None;
        Ok(session)
    }

    /// Ready once the stream exists with non-zero negotiated dimensions.
    pub fn frame_ready(&mut self) -> bool {
        self.state.is_some()
            && self
                .negotiated
                .map(|s| s.width > 0 && s.height > 0)
                .unwrap_or(false)
    }

    pub fn grab(&mut self) -> Result<Frame, OverlayError> {
        use v4l::io::traits::CaptureStream;

        let session = self
            .negotiated
            .ok_or_else(|| OverlayError::DeviceUnavailable("device not open".to_string()))?;
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| OverlayError::DeviceUnavailable("device not open".to_string()))?;

        let captured = state.with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()));
        let pixels = match captured {
            Ok(pixels) => pixels,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(OverlayError::DeviceUnavailable(format!(
                    "capture failed: {}",
                    err
                )));
            }
        };

        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());
        Ok(Frame::new(pixels, session.width, session.height))
    }

    /// Drop the stream and device handles, which stops capture and turns
    /// the hardware off.
    pub fn close(&mut self) {
        self.state = None;
        self.negotiated = None;
    }

    pub fn is_healthy(&self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        match self.last_frame_at {
            Some(at) => at.elapsed() <= Duration::from_secs(2),
            None => true,
        }
    }

    pub fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            device: self.device_path.clone(),
        }
    }

    fn unavailable(&mut self, what: &str, err: impl std::fmt::Display) -> OverlayError {
        let message = format!("{} on {}: {}", what, self.device_path, err);
        self.last_error = Some(message.clone());
        OverlayError::DeviceUnavailable(message)
    }
}
