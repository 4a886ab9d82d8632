//! Detection loop controller.
//!
//! The state machine that drives the other three components once per tick:
//! frame-source readiness check, adapter inference, coordinate mapping,
//! overlay draw. The controller owns the loop state, the camera source,
//! and the drawing surface exclusively; no other component transitions
//! state or draws.
//!
//! Scheduling belongs to the host: the daemon (or a display-synchronized
//! host loop) calls `tick` repeatedly, and the controller throttles
//! inference internally to the configured interval. Only one tick is ever
//! in flight; the controller never blocks between ticks.
//!
//! Cancellation is cooperative. `stop()` and any `CancelHandle` set a
//! shared flag that is honored at the top of the next tick and again when
//! an in-flight inference delivers its result, so a stop racing an
//! inference discards the stale result instead of drawing over a cleared
//! overlay. No timeout is imposed on a hung engine call; such a call
//! stalls the loop until it resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::OverlayConfig;
use crate::detect::{Detection, DetectorAdapter, InferenceEngine, ModelOptions};
use crate::error::OverlayError;
use crate::overlay::{
    DetectionLog, FormFactor, OverlayRenderer, PresentationTransform, Surface,
};
use crate::source::{CameraSource, StreamConstraints};

/// Loop lifecycle state. Exactly one per controller, mutated only here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    ModelLoading,
    Ready,
    Streaming,
    Stopped,
    Error,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopState::Idle => "idle",
            LoopState::ModelLoading => "model-loading",
            LoopState::Ready => "ready",
            LoopState::Streaming => "streaming",
            LoopState::Stopped => "stopped",
            LoopState::Error => "error",
        }
    }
}

/// What one `tick` call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Loop is not streaming; nothing happened.
    NotStreaming,
    /// Previous inference ran too recently; tick skipped.
    Throttled,
    /// Source has no valid frame yet; no detection, draw, or log entry.
    SkippedNotReady,
    /// A requested stop was honored; any in-flight result was discarded.
    Cancelled,
    /// Form-factor flip forced a session restart; detections discarded.
    Restarted,
    /// Full tick: inference ran and the overlay was drawn.
    Rendered { detections: usize },
}

/// Shared cancellation flag. Cloneable into signal handlers and engine
/// callbacks; setting it stops the loop at the next checkpoint.
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type StateCallback = Box<dyn FnMut(LoopState)>;
type DetectionsCallback = Box<dyn FnMut(&[Detection])>;

pub struct DetectionLoopController<E: InferenceEngine, S: Surface> {
    state: LoopState,
    source: CameraSource,
    adapter: DetectorAdapter<E>,
    surface: S,
    renderer: OverlayRenderer,
    log: DetectionLog,
    constraints: StreamConstraints,
    throttle: std::time::Duration,
    score_threshold: f32,
    max_results: Option<usize>,
    mobile_breakpoint: u32,
    viewport_width: u32,
    form_factor: FormFactor,
    transform: PresentationTransform,
    last_inference_at: Option<Instant>,
    stop_requested: Arc<AtomicBool>,
    on_state_change: Option<StateCallback>,
    on_detections: Option<DetectionsCallback>,
}

impl<E: InferenceEngine, S: Surface> DetectionLoopController<E, S> {
    pub fn new(source: CameraSource, engine: E, surface: S, config: &OverlayConfig) -> Self {
        let form_factor = FormFactor::classify(
            config.presentation.viewport_width,
            config.presentation.mobile_breakpoint,
        );
        Self {
            state: LoopState::Idle,
            source,
            adapter: DetectorAdapter::new(engine),
            surface,
            renderer: OverlayRenderer::new(),
            log: DetectionLog::new(),
            constraints: StreamConstraints {
                ideal_width: config.camera.width,
                ideal_height: config.camera.height,
                ..StreamConstraints::default()
            },
            throttle: config.detection.throttle,
            score_threshold: config.detection.score_threshold,
            max_results: config.detection.max_results,
            mobile_breakpoint: config.presentation.mobile_breakpoint,
            viewport_width: config.presentation.viewport_width,
            form_factor,
            transform: PresentationTransform::for_form_factor(form_factor),
            last_inference_at: None,
            stop_requested: Arc::new(AtomicBool::new(false)),
            on_state_change: None,
            on_detections: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn log(&self) -> &DetectionLog {
        &self.log
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn transform(&self) -> PresentationTransform {
        self.transform
    }

    pub fn source(&self) -> &CameraSource {
        &self.source
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.stop_requested.clone())
    }

    pub fn set_on_state_change(&mut self, callback: impl FnMut(LoopState) + 'static) {
        self.on_state_change = Some(Box::new(callback));
    }

    pub fn set_on_detections(&mut self, callback: impl FnMut(&[Detection]) + 'static) {
        self.on_detections = Some(Box::new(callback));
    }

    fn transition(&mut self, next: LoopState) {
        if self.state == next {
            return;
        }
        log::info!("loop state: {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
        if let Some(callback) = self.on_state_change.as_mut() {
            callback(next);
        }
    }

    /// Load the detection model. `Idle -> ModelLoading -> Ready`, or
    /// `Error` on failure (terminal for the session; retry is another
    /// user-initiated `load`).
    pub fn load(&mut self, options: &ModelOptions) -> Result<(), OverlayError> {
        if self.state == LoopState::Streaming {
            return Err(OverlayError::InvalidState {
                operation: "load",
                state: self.state.as_str(),
            });
        }
        self.transition(LoopState::ModelLoading);
        match self.adapter.load(options) {
            Ok(()) => {
                self.transition(LoopState::Ready);
                Ok(())
            }
            Err(e) => {
                log::error!("model load failed: {}", e);
                self.transition(LoopState::Error);
                Err(e)
            }
        }
    }

    /// Start streaming. Requires a loaded model (`Ready` or `Stopped`).
    /// A no-op while already `Streaming`. On acquisition failure the state
    /// stays put and the error is returned to the caller.
    pub fn start(&mut self) -> Result<(), OverlayError> {
        match self.state {
            LoopState::Streaming => {
                log::debug!("start ignored: already streaming");
                return Ok(());
            }
            LoopState::Ready | LoopState::Stopped => {}
            _ => {
                return Err(OverlayError::InvalidState {
                    operation: "start",
                    state: self.state.as_str(),
                });
            }
        }

        self.stop_requested.store(false, Ordering::SeqCst);
        let session = self.source.acquire(&self.constraints)?;
        self.surface.set_size(session.width, session.height);
        self.refresh_transform();
        self.transition(LoopState::Streaming);
        Ok(())
    }

    /// Stop streaming. A no-op outside `Streaming`. The loaded model
    /// survives; `start` re-enters streaming.
    pub fn stop(&mut self) {
        if self.state != LoopState::Streaming {
            log::debug!("stop ignored in state {}", self.state.as_str());
            return;
        }
        // Flag first so an in-flight inference result is discarded even if
        // this stop races a tick.
        self.stop_requested.store(true, Ordering::SeqCst);
        self.finish_stop();
    }

    /// Fatal error escape hatch: any state to `Error`.
    pub fn fatal(&mut self, reason: &str) {
        log::error!("fatal: {}", reason);
        if self.state == LoopState::Streaming {
            self.source.release();
        }
        self.transition(LoopState::Error);
    }

    /// Viewport resize / orientation-change signal. Records the new width;
    /// while streaming, re-syncs the surface to the session dimensions.
    /// A mirroring flip is picked up by the next tick's form-factor check.
    pub fn handle_resize(&mut self, viewport_width: u32) {
        self.viewport_width = viewport_width;
        if self.state == LoopState::Streaming {
            if let Some(session) = self.source.session() {
                self.surface.set_size(session.width, session.height);
            }
        }
    }

    /// One iteration of the detection/render loop. `now` is injected so
    /// hosts pass `Instant::now()` and tests pass synthetic instants.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.state != LoopState::Streaming {
            return TickOutcome::NotStreaming;
        }
        if self.stop_requested.load(Ordering::SeqCst) {
            self.finish_stop();
            return TickOutcome::Cancelled;
        }

        // Throttle: bound inference rate, not tick rate. The host may call
        // at display rate; inferences run at most once per interval.
        if let Some(last) = self.last_inference_at {
            if now.duration_since(last) < self.throttle {
                return TickOutcome::Throttled;
            }
        }

        // Stale/black-frame guard: skip entirely, no draw and no log entry.
        if !self.source.frame_ready() {
            log::debug!("frame not ready, skipping tick");
            return TickOutcome::SkippedNotReady;
        }

        let frame = match self.source.grab() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("frame capture failed, skipping tick: {}", e);
                return TickOutcome::SkippedNotReady;
            }
        };

        self.last_inference_at = Some(now);
        let detections = self
            .adapter
            .infer(&frame, self.max_results, self.score_threshold);

        // A stop requested while inference was in flight discards the
        // result: no draw, no log entry, no callback.
        if self.stop_requested.load(Ordering::SeqCst) {
            self.finish_stop();
            return TickOutcome::Cancelled;
        }

        // Re-evaluate form factor from the live viewport width. A mirroring
        // flip mid-stream restarts the session instead of drawing with the
        // stale transform; recoverable, not fatal.
        let form_factor = FormFactor::classify(self.viewport_width, self.mobile_breakpoint);
        if form_factor != self.form_factor {
            log::info!(
                "form factor changed ({:?} -> {:?}), restarting session",
                self.form_factor,
                form_factor
            );
            return self.restart_session();
        }

        self.renderer
            .render(&mut self.surface, &detections, &self.transform, &mut self.log);
        if let Some(callback) = self.on_detections.as_mut() {
            callback(&detections);
        }
        TickOutcome::Rendered {
            detections: detections.len(),
        }
    }

    fn refresh_transform(&mut self) {
        self.form_factor = FormFactor::classify(self.viewport_width, self.mobile_breakpoint);
        self.transform = PresentationTransform::for_form_factor(self.form_factor);
    }

    fn restart_session(&mut self) -> TickOutcome {
        self.source.release();
        match self.source.acquire(&self.constraints) {
            Ok(session) => {
                self.surface.set_size(session.width, session.height);
                self.refresh_transform();
                TickOutcome::Restarted
            }
            Err(e) => {
                log::error!("session restart failed: {}", e);
                self.finish_stop();
                TickOutcome::Cancelled
            }
        }
    }

    fn finish_stop(&mut self) {
        self.source.release();
        let (w, h) = (self.surface.width() as f32, self.surface.height() as f32);
        self.surface.clear_rect(0.0, 0.0, w, h);
        self.log.clear();
        self.stop_requested.store(false, Ordering::SeqCst);
        self.transition(LoopState::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubEngine;
    use crate::overlay::RecordingSurface;

    fn controller() -> DetectionLoopController<StubEngine, RecordingSurface> {
        let config = OverlayConfig::default();
        let source = CameraSource::new("stub://test").unwrap();
        DetectionLoopController::new(source, StubEngine::new(), RecordingSurface::new(0, 0), &config)
    }

    #[test]
    fn load_moves_idle_to_ready() {
        let mut ctl = controller();
        assert_eq!(ctl.state(), LoopState::Idle);
        ctl.load(&ModelOptions::default()).unwrap();
        assert_eq!(ctl.state(), LoopState::Ready);
    }

    #[test]
    fn start_requires_a_loaded_model() {
        let mut ctl = controller();
        let err = ctl.start().unwrap_err();
        assert!(matches!(err, OverlayError::InvalidState { .. }));
        assert_eq!(ctl.state(), LoopState::Idle);
    }

    #[test]
    fn start_is_a_no_op_while_streaming() {
        let mut ctl = controller();
        ctl.load(&ModelOptions::default()).unwrap();
        ctl.start().unwrap();
        assert_eq!(ctl.state(), LoopState::Streaming);

        // Second start must not tear down or duplicate the session.
        ctl.start().unwrap();
        assert_eq!(ctl.state(), LoopState::Streaming);
        assert!(ctl.source().is_active());
    }

    #[test]
    fn stop_is_a_no_op_when_idle_or_ready() {
        let mut ctl = controller();
        ctl.stop();
        assert_eq!(ctl.state(), LoopState::Idle);

        ctl.load(&ModelOptions::default()).unwrap();
        ctl.stop();
        assert_eq!(ctl.state(), LoopState::Ready);
    }

    #[test]
    fn stop_and_restart_keep_the_loaded_model() {
        let mut ctl = controller();
        ctl.load(&ModelOptions::default()).unwrap();
        ctl.start().unwrap();
        ctl.stop();
        assert_eq!(ctl.state(), LoopState::Stopped);
        assert!(!ctl.source().is_active());

        ctl.start().unwrap();
        assert_eq!(ctl.state(), LoopState::Streaming);
    }

    #[test]
    fn tick_outside_streaming_does_nothing() {
        let mut ctl = controller();
        assert_eq!(ctl.tick(Instant::now()), TickOutcome::NotStreaming);
        ctl.load(&ModelOptions::default()).unwrap();
        assert_eq!(ctl.tick(Instant::now()), TickOutcome::NotStreaming);
    }

    #[test]
    fn state_change_callback_fires_per_transition() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut ctl = controller();
        ctl.set_on_state_change(move |state| sink.borrow_mut().push(state));

        ctl.load(&ModelOptions::default()).unwrap();
        ctl.start().unwrap();
        ctl.stop();

        assert_eq!(
            *seen.borrow(),
            vec![
                LoopState::ModelLoading,
                LoopState::Ready,
                LoopState::Streaming,
                LoopState::Stopped,
            ]
        );
    }

    #[test]
    fn load_failure_lands_in_error_state() {
        struct FailingEngine;
        impl InferenceEngine for FailingEngine {
            fn name(&self) -> &'static str {
                "failing"
            }
            fn load(&mut self, _: &ModelOptions) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("no weights"))
            }
            fn infer(
                &mut self,
                _: &crate::frame::Frame,
                _: Option<usize>,
                _: f32,
            ) -> anyhow::Result<Vec<Detection>> {
                Ok(vec![])
            }
        }

        let config = OverlayConfig::default();
        let source = CameraSource::new("stub://test").unwrap();
        let mut ctl = DetectionLoopController::new(
            source,
            FailingEngine,
            RecordingSurface::new(0, 0),
            &config,
        );
        let err = ctl.load(&ModelOptions::default()).unwrap_err();
        assert!(matches!(err, OverlayError::ModelLoadFailure(_)));
        assert_eq!(ctl.state(), LoopState::Error);
    }

    #[test]
    fn acquisition_failure_keeps_ready_state() {
        let config = OverlayConfig::default();
        let source = CameraSource::new("stub://test?deny=1").unwrap();
        let mut ctl = DetectionLoopController::new(
            source,
            StubEngine::new(),
            RecordingSurface::new(0, 0),
            &config,
        );
        ctl.load(&ModelOptions::default()).unwrap();

        let err = ctl.start().unwrap_err();
        assert!(matches!(err, OverlayError::PermissionDenied(_)));
        assert_eq!(ctl.state(), LoopState::Ready);
    }

    #[test]
    fn fatal_reaches_error_from_any_state() {
        let mut ctl = controller();
        ctl.load(&ModelOptions::default()).unwrap();
        ctl.start().unwrap();
        ctl.fatal("engine wedged");
        assert_eq!(ctl.state(), LoopState::Error);
        assert!(!ctl.source().is_active());
    }
}
