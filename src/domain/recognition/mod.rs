//! Plate resolution
//!
//! The recognizer seam turning a gate image into plate text, plus the pure
//! helpers used to clean and check what it returns.

mod plate;

pub use plate::{
    is_valid_plate, normalize_plate, select_plate_text, PlateDetection, TextDetection, TextKind,
};

use async_trait::async_trait;

use crate::domain::DomainResult;

/// Optical plate reader. Implementations wrap a camera OCR service; errors
/// should be reported as `DomainError::Upstream`.
#[async_trait]
pub trait PlateRecognizer: Send + Sync {
    async fn detect(&self, image: &[u8]) -> DomainResult<PlateDetection>;
}
