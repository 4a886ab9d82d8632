use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Base model architecture, trading latency for accuracy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BaseArchitecture {
    Fast,
    #[default]
    Balanced,
    Accurate,
}

impl BaseArchitecture {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fast" => Some(Self::Fast),
            "balanced" => Some(Self::Balanced),
            "accurate" => Some(Self::Accurate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Accurate => "accurate",
        }
    }
}

/// Model load configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModelOptions {
    pub base: BaseArchitecture,
}

/// Inference engine trait.
///
/// This is the seam to the external detection model. The engine, not the
/// adapter, is responsible for excluding detections scoring below the
/// threshold, and for the ordering of its output (typically
/// confidence-descending; no ordering is required of implementors).
///
/// Implementations must not block indefinitely in `load`; a hung `infer`
/// call stalls the detection loop until it resolves (known limitation,
/// no timeout is imposed at this layer).
pub trait InferenceEngine {
    /// Engine identifier for logs.
    fn name(&self) -> &'static str;

    /// Load the model. Expensive; called once in the common path.
    fn load(&mut self, options: &ModelOptions) -> Result<()>;

    /// Run detection on a frame.
    ///
    /// `max_results` of `None` means uncapped; cardinality is bounded only
    /// by the engine itself.
    fn infer(
        &mut self,
        frame: &Frame,
        max_results: Option<usize>,
        score_threshold: f32,
    ) -> Result<Vec<Detection>>;
}
