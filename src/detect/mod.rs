mod backend;
mod backends;
mod registry;
mod result;

pub use backend::DetectorBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use backends::{ScriptedBackend, StubBackend};
pub use registry::BackendRegistry;
pub use result::{coco_class_name, DetectionResult, RawDetection, COCO_CLASSES};
