//! Captured frame container.
//!
//! A `Frame` is ephemeral: produced by the frame source, handed to the
//! detector adapter within the same tick, then dropped. Nothing in the
//! crate retains frames across ticks.

/// One captured RGB frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Packed RGB pixel data, row-major.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }

    /// A frame is usable for inference only once the device has delivered
    /// real data: non-zero dimensions and a non-empty pixel buffer.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.pixels.is_empty()
    }
}
