//! Presentation transform and form-factor classification.
//!
//! Desktop presentations mirror the preview (selfie-style), so drawn boxes
//! must be flipped to match; mobile presentations show the raw feed. The
//! classification is re-evaluated continuously from the live viewport width,
//! never cached at startup.

/// Device form factor, classified from viewport width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormFactor {
    Mobile,
    Desktop,
}

impl FormFactor {
    /// Classify a viewport width against the mobile breakpoint (inclusive).
    pub fn classify(viewport_width: u32, mobile_breakpoint: u32) -> Self {
        if viewport_width <= mobile_breakpoint {
            FormFactor::Mobile
        } else {
            FormFactor::Desktop
        }
    }
}

/// Visual transform currently applied to the presented video.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresentationTransform {
    /// Whether the presentation is horizontally mirrored.
    pub mirrored: bool,
    /// Uniform scale from canvas units to presentation units.
    pub scale: f32,
}

impl PresentationTransform {
    pub fn identity() -> Self {
        Self {
            mirrored: false,
            scale: 1.0,
        }
    }

    /// Transform for a form factor: desktop mirrors, mobile does not.
    pub fn for_form_factor(form_factor: FormFactor) -> Self {
        Self {
            mirrored: form_factor == FormFactor::Desktop,
            scale: 1.0,
        }
    }
}
