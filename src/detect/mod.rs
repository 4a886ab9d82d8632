mod adapter;
mod engine;
mod result;
mod stub;

pub use adapter::DetectorAdapter;
pub use engine::{BaseArchitecture, InferenceEngine, ModelOptions};
pub use result::{BoundingBox, Detection};
pub use stub::StubEngine;
