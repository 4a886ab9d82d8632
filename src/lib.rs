//! Real-time visual detection overlay.
//!
//! Captures a live camera feed, runs an object-detection model over it, and
//! renders bounding boxes, labels, and a textual log synchronized to video
//! coordinates.
//!
//! # Architecture
//!
//! Four cooperating components, leaves first:
//!
//! - `source`: owns the media stream, exposes frame dimensions and readiness
//! - `detect`: wraps the external inference engine with a stable adapter and
//!   threshold policy
//! - `overlay`: converts model-space boxes into presentation-space
//!   (mirroring, scaling) and draws them
//! - `controller`: the state machine orchestrating the other three once per
//!   scheduled tick
//!
//! Model-space boxes (origin top-left, unmirrored) meet a possibly mirrored
//! presentation; the single coordinate mapper in `overlay` is the only place
//! that reconciliation happens.
//!
//! Everything runs on one logical thread of control: one tick is in flight
//! at a time, and cancellation is a cooperative flag checked at tick
//! boundaries.

pub mod config;
pub mod controller;
pub mod detect;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod source;
pub mod ui;

pub use config::OverlayConfig;
pub use controller::{CancelHandle, DetectionLoopController, LoopState, TickOutcome};
pub use detect::{
    BaseArchitecture, BoundingBox, Detection, DetectorAdapter, InferenceEngine, ModelOptions,
    StubEngine,
};
pub use error::OverlayError;
pub use frame::Frame;
pub use overlay::{
    map_box, ConsoleSurface, DetectionLog, FormFactor, OverlayRenderer, PresentationTransform,
    RecordingSurface, Surface, SurfaceOp,
};
pub use source::{CameraSource, Facing, StreamConstraints, StreamSession};
