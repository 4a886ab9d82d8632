//! Detector adapter.
//!
//! Wraps the external inference engine with the loop-facing policy:
//! - `infer` before `load` completes yields an empty list, never an error,
//!   so the detection loop can run defensively;
//! - engine failures on a single frame are caught and logged, degrading to
//!   "no detections this tick" rather than halting the session;
//! - score thresholds are clamped into [0, 1] before reaching the engine.

use crate::detect::engine::{InferenceEngine, ModelOptions};
use crate::detect::result::Detection;
use crate::error::OverlayError;
use crate::frame::Frame;

pub struct DetectorAdapter<E: InferenceEngine> {
    engine: E,
    loaded: bool,
}

impl<E: InferenceEngine> DetectorAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            loaded: false,
        }
    }

    /// Load the model. Maps engine failure into the overlay taxonomy.
    ///
    /// Reloading is permitted but expensive; callers are expected to load
    /// once per process in the common path.
    pub fn load(&mut self, options: &ModelOptions) -> Result<(), OverlayError> {
        if self.loaded {
            log::warn!(
                "DetectorAdapter: reloading {} model (base={})",
                self.engine.name(),
                options.base.as_str()
            );
        }
        self.engine.load(options).map_err(|e| {
            self.loaded = false;
            OverlayError::ModelLoadFailure(e.to_string())
        })?;
        self.loaded = true;
        log::info!(
            "DetectorAdapter: {} model loaded (base={})",
            self.engine.name(),
            options.base.as_str()
        );
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Run inference. Never fails: returns an empty list before `load`
    /// completes and when the engine errors on this frame.
    pub fn infer(
        &mut self,
        frame: &Frame,
        max_results: Option<usize>,
        score_threshold: f32,
    ) -> Vec<Detection> {
        if !self.loaded {
            return Vec::new();
        }
        let threshold = score_threshold.clamp(0.0, 1.0);
        if threshold != score_threshold {
            log::warn!(
                "DetectorAdapter: score threshold {} out of range, clamped to {}",
                score_threshold,
                threshold
            );
        }
        match self.engine.infer(frame, max_results, threshold) {
            Ok(detections) => detections,
            Err(e) => {
                log::warn!("DetectorAdapter: inference error, skipping frame: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;
    use anyhow::anyhow;

    /// Scripted engine for fixing the adapter contract.
    struct ScriptedEngine {
        fail_load: bool,
        fail_infer: bool,
        output: Vec<Detection>,
    }

    impl InferenceEngine for ScriptedEngine {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn load(&mut self, _options: &ModelOptions) -> anyhow::Result<()> {
            if self.fail_load {
                Err(anyhow!("weights missing"))
            } else {
                Ok(())
            }
        }

        fn infer(
            &mut self,
            _frame: &Frame,
            _max_results: Option<usize>,
            _score_threshold: f32,
        ) -> anyhow::Result<Vec<Detection>> {
            if self.fail_infer {
                Err(anyhow!("bad frame"))
            } else {
                Ok(self.output.clone())
            }
        }
    }

    fn person() -> Detection {
        Detection::new("person", 0.9, BoundingBox::new(1.0, 2.0, 3.0, 4.0))
    }

    fn test_frame() -> Frame {
        Frame::new(vec![0u8; 12], 2, 2)
    }

    #[test]
    fn infer_before_load_is_silently_empty() {
        let mut adapter = DetectorAdapter::new(ScriptedEngine {
            fail_load: false,
            fail_infer: false,
            output: vec![person()],
        });
        assert!(adapter.infer(&test_frame(), None, 0.5).is_empty());
        assert!(!adapter.is_loaded());
    }

    #[test]
    fn load_failure_maps_to_model_load_failure() {
        let mut adapter = DetectorAdapter::new(ScriptedEngine {
            fail_load: true,
            fail_infer: false,
            output: vec![],
        });
        let err = adapter.load(&ModelOptions::default()).unwrap_err();
        assert!(matches!(err, OverlayError::ModelLoadFailure(_)));
        assert!(!adapter.is_loaded());
    }

    #[test]
    fn engine_error_degrades_to_empty_list() {
        let mut adapter = DetectorAdapter::new(ScriptedEngine {
            fail_load: false,
            fail_infer: true,
            output: vec![],
        });
        adapter.load(&ModelOptions::default()).unwrap();
        assert!(adapter.infer(&test_frame(), None, 0.5).is_empty());
    }

    #[test]
    fn loaded_adapter_passes_detections_through_in_engine_order() {
        let first = Detection::new("person", 0.9, BoundingBox::new(1.0, 2.0, 3.0, 4.0));
        let second = Detection::new("dog", 0.6, BoundingBox::new(5.0, 6.0, 7.0, 8.0));
        let mut adapter = DetectorAdapter::new(ScriptedEngine {
            fail_load: false,
            fail_infer: false,
            output: vec![first, second],
        });
        adapter.load(&ModelOptions::default()).unwrap();

        // The adapter imposes no ordering of its own; the engine's ranking
        // comes through untouched.
        let out = adapter.infer(&test_frame(), None, 0.5);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].class_label, "person");
        assert_eq!(out[1].class_label, "dog");
    }
}
