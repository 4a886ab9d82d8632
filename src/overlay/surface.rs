//! Presentation surface abstraction.
//!
//! The raw drawing primitive is an external collaborator: a 2-D
//! immediate-mode context with clear/stroke/fill/text calls and an affine
//! transform stack. The controller and renderer draw only through this
//! trait; nothing else in the crate touches the surface.

/// 2-D immediate-mode drawing surface.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resize the drawable area to match the video dimensions.
    fn set_size(&mut self, width: u32, height: u32);

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32);

    /// Rendered width of `text` in the current font, for label backgrounds.
    fn measure_text(&self, text: &str) -> f32;

    fn set_stroke_style(&mut self, style: &str);
    fn set_fill_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f32);
    fn set_font(&mut self, font: &str);

    // Affine transform stack. The renderer deliberately does not use
    // scale/translate for mirroring (see overlay::mapper); they are part of
    // the collaborator contract and available to hosts.
    fn save(&mut self);
    fn restore(&mut self);
    fn scale(&mut self, sx: f32, sy: f32);
    fn translate(&mut self, tx: f32, ty: f32);
}

// ----------------------------------------------------------------------------
// Recording surface (tests and op inspection)
// ----------------------------------------------------------------------------

/// One recorded drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    ClearRect { x: f32, y: f32, w: f32, h: f32 },
    StrokeRect { x: f32, y: f32, w: f32, h: f32 },
    FillRect { x: f32, y: f32, w: f32, h: f32 },
    FillText { text: String, x: f32, y: f32 },
    SetStrokeStyle(String),
    SetFillStyle(String),
    SetLineWidth(f32),
    SetFont(String),
    Save,
    Restore,
    Scale { sx: f32, sy: f32 },
    Translate { tx: f32, ty: f32 },
}

/// Surface that records every operation. Used by tests to assert exactly
/// what was drawn.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn stroked_rects(&self) -> Vec<(f32, f32, f32, f32)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::StrokeRect { x, y, w, h } => Some((*x, *y, *w, *h)),
                _ => None,
            })
            .collect()
    }

    /// True when any transform-stack mutation was recorded.
    pub fn transform_stack_touched(&self) -> bool {
        self.ops.iter().any(|op| {
            matches!(
                op,
                SurfaceOp::Scale { .. } | SurfaceOp::Translate { .. }
            )
        })
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(SurfaceOp::ClearRect { x, y, w, h });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(SurfaceOp::StrokeRect { x, y, w, h });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(SurfaceOp::FillRect { x, y, w, h });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.ops.push(SurfaceOp::FillText {
            text: text.to_string(),
            x,
            y,
        });
    }

    fn measure_text(&self, text: &str) -> f32 {
        // Fixed-advance approximation, close enough for layout assertions.
        text.chars().count() as f32 * 9.0
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.ops.push(SurfaceOp::SetStrokeStyle(style.to_string()));
    }

    fn set_fill_style(&mut self, style: &str) {
        self.ops.push(SurfaceOp::SetFillStyle(style.to_string()));
    }

    fn set_line_width(&mut self, width: f32) {
        self.ops.push(SurfaceOp::SetLineWidth(width));
    }

    fn set_font(&mut self, font: &str) {
        self.ops.push(SurfaceOp::SetFont(font.to_string()));
    }

    fn save(&mut self) {
        self.ops.push(SurfaceOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(SurfaceOp::Restore);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.ops.push(SurfaceOp::Scale { sx, sy });
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.ops.push(SurfaceOp::Translate { tx, ty });
    }
}

// ----------------------------------------------------------------------------
// Console surface (daemon)
// ----------------------------------------------------------------------------

/// Headless surface for `overlayd`: box and label draws become debug log
/// lines. Keeps the daemon honest about what a real canvas would receive.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    width: u32,
    height: u32,
}

impl ConsoleSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Surface for ConsoleSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn clear_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32) {}

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        log::debug!("surface: box ({:.0},{:.0}) {:.0}x{:.0}", x, y, w, h);
    }

    fn fill_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32) {}

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        log::debug!("surface: text {:?} at ({:.0},{:.0})", text, x, y);
    }

    fn measure_text(&self, text: &str) -> f32 {
        text.chars().count() as f32 * 9.0
    }

    fn set_stroke_style(&mut self, _style: &str) {}
    fn set_fill_style(&mut self, _style: &str) {}
    fn set_line_width(&mut self, _width: f32) {}
    fn set_font(&mut self, _font: &str) {}
    fn save(&mut self) {}
    fn restore(&mut self) {}
    fn scale(&mut self, _sx: f32, _sy: f32) {}
    fn translate(&mut self, _tx: f32, _ty: f32) {}
}
