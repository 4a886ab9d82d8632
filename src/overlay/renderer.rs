//! Overlay renderer and textual detection log.
//!
//! One renderer draws boxes and labels for every form factor; mirroring is
//! handled entirely by the coordinate mapper, driven by a single
//! `PresentationTransform`. The renderer never mutates the surface's affine
//! transform stack for mirroring — combining a stack flip with pre-flipped
//! coordinates is how boxes end up double-mirrored.

use crate::detect::Detection;
use crate::overlay::mapper::map_box;
use crate::overlay::surface::Surface;
use crate::overlay::transform::PresentationTransform;

const EMPTY_LOG_MESSAGE: &str = "No entities detected";
const LABEL_PAD_X: f32 = 5.0;
const LABEL_HEIGHT: f32 = 25.0;
const LABEL_BASELINE_OFFSET: f32 = 7.0;

// ----------------------------------------------------------------------------
// Detection log
// ----------------------------------------------------------------------------

/// One line of the textual detection log.
#[derive(Clone, Debug)]
pub struct LogEntry {
    /// Wall-clock time, captured at draw time (presentation-only latency).
    pub timestamp: String,
    pub class_label: String,
    pub confidence: f32,
}

/// Textual log shown next to the video. Reflects the most recent rendered
/// tick: entries are replaced per tick, and an empty tick shows a
/// placeholder message instead.
#[derive(Debug, Default)]
pub struct DetectionLog {
    entries: Vec<LogEntry>,
}

impl DetectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Message to display when there are no entries.
    pub fn placeholder(&self) -> &'static str {
        EMPTY_LOG_MESSAGE
    }

    /// Render the log as display lines, one per entry.
    pub fn lines(&self) -> Vec<String> {
        if self.entries.is_empty() {
            return vec![EMPTY_LOG_MESSAGE.to_string()];
        }
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "{}: {} ({}% confidence)",
                    entry.timestamp,
                    entry.class_label,
                    (entry.confidence * 100.0).round() as u32
                )
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn begin_tick(&mut self) {
        self.entries.clear();
    }

    fn append(&mut self, detection: &Detection) {
        self.entries.push(LogEntry {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            class_label: detection.class_label.clone(),
            confidence: detection.confidence,
        });
    }
}

// ----------------------------------------------------------------------------
// Renderer
// ----------------------------------------------------------------------------

/// Draws bounding boxes and labels onto a surface.
pub struct OverlayRenderer {
    pub stroke_style: String,
    pub line_width: f32,
    pub font: String,
    pub label_background: String,
    pub label_text: String,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            stroke_style: "#00FFFF".to_string(),
            line_width: 3.0,
            font: "18px Arial".to_string(),
            label_background: "rgba(0, 0, 0, 0.6)".to_string(),
            label_text: "#FFFFFF".to_string(),
        }
    }
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the overlay and draw one tick's detections.
    ///
    /// Boxes are mapped through the coordinate mapper against the surface's
    /// width *as read here*, so a surface resized since the last tick maps
    /// against its current width. Log entries are appended at draw time.
    pub fn render<S: Surface>(
        &self,
        surface: &mut S,
        detections: &[Detection],
        transform: &PresentationTransform,
        log: &mut DetectionLog,
    ) {
        let (w, h) = (surface.width() as f32, surface.height() as f32);
        surface.clear_rect(0.0, 0.0, w, h);

        log.begin_tick();
        if detections.is_empty() {
            return;
        }

        surface.save();
        surface.set_stroke_style(&self.stroke_style);
        surface.set_line_width(self.line_width);
        surface.set_font(&self.font);

        for detection in detections {
            let canvas_width = surface.width() as f32;
            let bbox = map_box(&detection.bbox, transform, canvas_width);
            surface.stroke_rect(bbox.x, bbox.y, bbox.width, bbox.height);

            let label = detection.label();
            let text_width = surface.measure_text(&label);
            surface.set_fill_style(&self.label_background);
            surface.fill_rect(
                bbox.x,
                bbox.y - LABEL_HEIGHT,
                text_width + 2.0 * LABEL_PAD_X,
                LABEL_HEIGHT,
            );
            surface.set_fill_style(&self.label_text);
            surface.fill_text(&label, bbox.x + LABEL_PAD_X, bbox.y - LABEL_BASELINE_OFFSET);

            log.append(detection);
        }

        surface.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;
    use crate::overlay::surface::{RecordingSurface, SurfaceOp};
    use crate::overlay::transform::FormFactor;

    fn person() -> Detection {
        Detection::new("person", 0.92, BoundingBox::new(10.0, 20.0, 100.0, 200.0))
    }

    #[test]
    fn mirrored_box_is_drawn_at_flipped_x() {
        let renderer = OverlayRenderer::new();
        let mut surface = RecordingSurface::new(640, 480);
        let mut log = DetectionLog::new();
        let transform = PresentationTransform::for_form_factor(FormFactor::Desktop);

        renderer.render(&mut surface, &[person()], &transform, &mut log);

        assert_eq!(surface.stroked_rects(), vec![(530.0, 20.0, 100.0, 200.0)]);
        assert!(surface.ops().iter().any(|op| matches!(
            op,
            SurfaceOp::FillText { text, .. } if text == "person (92%)"
        )));
    }

    #[test]
    fn mirroring_never_touches_the_transform_stack() {
        // Regression guard for the double-flip bug: mirroring must come from
        // mapped coordinates alone, not a scale/translate on the surface.
        let renderer = OverlayRenderer::new();
        let mut surface = RecordingSurface::new(640, 480);
        let mut log = DetectionLog::new();
        let transform = PresentationTransform::for_form_factor(FormFactor::Desktop);

        renderer.render(&mut surface, &[person()], &transform, &mut log);

        assert!(!surface.transform_stack_touched());
    }

    #[test]
    fn empty_tick_clears_and_shows_placeholder() {
        let renderer = OverlayRenderer::new();
        let mut surface = RecordingSurface::new(640, 480);
        let mut log = DetectionLog::new();

        renderer.render(
            &mut surface,
            &[],
            &PresentationTransform::identity(),
            &mut log,
        );

        assert_eq!(surface.stroked_rects(), Vec::<(f32, f32, f32, f32)>::new());
        assert_eq!(
            surface.ops(),
            &[SurfaceOp::ClearRect {
                x: 0.0,
                y: 0.0,
                w: 640.0,
                h: 480.0
            }]
        );
        assert_eq!(log.lines(), vec!["No entities detected".to_string()]);
    }

    #[test]
    fn log_reflects_the_latest_tick_only() {
        let renderer = OverlayRenderer::new();
        let mut surface = RecordingSurface::new(640, 480);
        let mut log = DetectionLog::new();
        let transform = PresentationTransform::identity();

        renderer.render(&mut surface, &[person()], &transform, &mut log);
        assert_eq!(log.entries().len(), 1);

        renderer.render(&mut surface, &[person(), person()], &transform, &mut log);
        assert_eq!(log.entries().len(), 2);
        assert!(log.lines()[0].contains("person (92% confidence)"));
    }

    #[test]
    fn label_background_sized_from_measured_text() {
        let renderer = OverlayRenderer::new();
        let mut surface = RecordingSurface::new(640, 480);
        let mut log = DetectionLog::new();
        let expected_width = surface.measure_text("person (92%)") + 10.0;

        renderer.render(
            &mut surface,
            &[person()],
            &PresentationTransform::identity(),
            &mut log,
        );

        assert!(surface.ops().iter().any(|op| matches!(
            op,
            SurfaceOp::FillRect { x, y, w, h }
                if *x == 10.0 && *y == -5.0 && *w == expected_width && *h == 25.0
        )));
    }
}
