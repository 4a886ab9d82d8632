mod mapper;
mod renderer;
mod surface;
mod transform;

pub use mapper::map_box;
pub use renderer::{DetectionLog, LogEntry, OverlayRenderer};
pub use surface::{ConsoleSurface, RecordingSurface, Surface, SurfaceOp};
pub use transform::{FormFactor, PresentationTransform};
