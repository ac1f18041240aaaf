//! Mock converter implementation for development and tests.

use super::{ConvertError, PdfConverter};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock PDF converter: treats the uploaded bytes as UTF-8 text, which lets
/// callers control character counts precisely.
pub struct MockConverter {
    enabled: bool,
    calls: AtomicUsize,
}

impl MockConverter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of conversions performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfConverter for MockConverter {
    async fn convert(&self, file_bytes: &[u8], _file_name: &str) -> Result<String, ConvertError> {
        if !self.enabled {
            return Err(ConvertError::NotConfigured(
                "Mock converter not enabled".to_string(),
            ));
        }

        self.calls.fetch_add(1, Ordering::SeqCst);

        if file_bytes.is_empty() {
            return Err(ConvertError::EmptyResult(
                "No text extracted from PDF".to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(file_bytes).into_owned())
    }

    async fn health_check(&self) -> Result<(), ConvertError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ConvertError::NotConfigured(
                "Mock converter not enabled".to_string(),
            ))
        }
    }
}
