//! Coordinate mapper: model-space boxes to presentation-space boxes.
//!
//! This is a pure, stateless function on purpose. Double-applied mirror
//! flips and stale canvas widths are the classic failure mode of overlay
//! drawing; isolating the flip here, with the canvas width taken as a
//! call-time argument rather than cached state, keeps the drawn boxes and
//! the presented frame in the same coordinate space even across a late
//! resize.

use crate::detect::BoundingBox;
use crate::overlay::transform::PresentationTransform;

/// Map a model-space box into presentation-space.
///
/// `canvas_width` must be the surface's width *at call time*.
///
/// - not mirrored: identity on x.
/// - mirrored: horizontal flip about the canvas width,
///   `x' = canvas_width - x - width`. y and height are never affected by
///   mirroring.
///
/// The transform's scale multiplies all four components after the flip.
pub fn map_box(
    bbox: &BoundingBox,
    transform: &PresentationTransform,
    canvas_width: f32,
) -> BoundingBox {
    let x = if transform.mirrored {
        canvas_width - bbox.x - bbox.width
    } else {
        bbox.x
    };
    let s = transform.scale;
    BoundingBox::new(x * s, bbox.y * s, bbox.width * s, bbox.height * s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::transform::FormFactor;

    fn unmirrored() -> PresentationTransform {
        PresentationTransform::identity()
    }

    fn mirrored() -> PresentationTransform {
        PresentationTransform::for_form_factor(FormFactor::Desktop)
    }

    #[test]
    fn unmirrored_is_identity() {
        let boxes = [
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(10.0, 20.0, 100.0, 200.0),
            BoundingBox::new(630.0, 470.0, 10.0, 10.0),
        ];
        for bbox in boxes {
            assert_eq!(map_box(&bbox, &unmirrored(), 640.0), bbox);
        }
    }

    #[test]
    fn mirrored_flips_x_about_canvas_width() {
        let bbox = BoundingBox::new(10.0, 20.0, 100.0, 200.0);
        let mapped = map_box(&bbox, &mirrored(), 640.0);
        assert_eq!(mapped.x, 640.0 - 10.0 - 100.0);
        assert_eq!(mapped.y, 20.0);
        assert_eq!(mapped.width, 100.0);
        assert_eq!(mapped.height, 200.0);
    }

    #[test]
    fn mirroring_twice_restores_the_original() {
        let bbox = BoundingBox::new(42.0, 7.0, 64.0, 48.0);
        let once = map_box(&bbox, &mirrored(), 640.0);
        let twice = map_box(&once, &mirrored(), 640.0);
        assert_eq!(twice, bbox);
    }

    #[test]
    fn mirroring_uses_the_width_passed_at_call_time() {
        // A late resize changes the canvas width; the same box must map
        // against whatever width is current, not a remembered one.
        let bbox = BoundingBox::new(10.0, 0.0, 100.0, 50.0);
        assert_eq!(map_box(&bbox, &mirrored(), 640.0).x, 530.0);
        assert_eq!(map_box(&bbox, &mirrored(), 1280.0).x, 1170.0);
    }

    #[test]
    fn scale_multiplies_all_components_after_the_flip() {
        let bbox = BoundingBox::new(10.0, 20.0, 100.0, 200.0);
        let transform = PresentationTransform {
            mirrored: true,
            scale: 0.5,
        };
        let mapped = map_box(&bbox, &transform, 640.0);
        assert_eq!(mapped.x, 530.0 * 0.5);
        assert_eq!(mapped.y, 10.0);
        assert_eq!(mapped.width, 50.0);
        assert_eq!(mapped.height, 100.0);
    }
}
