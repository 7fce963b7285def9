//! Plate recognizers that need no camera

use async_trait::async_trait;

use crate::domain::{DomainError, DomainResult, PlateDetection, PlateRecognizer};

/// Treats the image payload as the plate text typed in by an operator.
pub struct ManualPlateReader;

#[async_trait]
impl PlateRecognizer for ManualPlateReader {
    async fn detect(&self, image: &[u8]) -> DomainResult<PlateDetection> {
        let text = std::str::from_utf8(image)
            .map_err(|e| DomainError::Upstream(format!("plate payload is not UTF-8: {e}")))?
            .trim();
        if text.is_empty() {
            return Err(DomainError::Upstream("no plate text supplied".into()));
        }
        Ok(PlateDetection {
            text: text.to_string(),
            confidence: 100.0,
        })
    }
}
