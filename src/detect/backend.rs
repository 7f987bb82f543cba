use anyhow::Result;

use crate::detect::result::DetectionResult;

/// External detector backend.
///
/// The narrative pipeline only consumes the class/confidence/box tuples a backend
/// returns. A backend error is never fatal: the caller substitutes an empty
/// snapshot for that frame.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on an RGB8 frame.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
