/// Axis-aligned bounding box in pixel units, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One model output: class label, confidence score, bounding box.
///
/// Boxes are model-space: the coordinate system of the raw, unmirrored
/// video frame as the engine saw it. The overlay mapper converts them to
/// presentation-space before drawing.
#[derive(Clone, Debug)]
pub struct Detection {
    pub class_label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_label: class_label.into(),
            confidence,
            bbox,
        }
    }

    /// Display label in the overlay's "class (NN%)" form.
    pub fn label(&self) -> String {
        format!(
            "{} ({}%)",
            self.class_label,
            (self.confidence * 100.0).round() as u32
        )
    }
}
