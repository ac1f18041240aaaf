//! PDF-to-text conversion abstractions and implementations.
//!
//! This module provides a trait-based abstraction for the external
//! conversion service, allowing easy swapping between backends
//! (ConvertAPI, mock).

pub mod convertapi;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for conversion operations. Display strings are user-facing:
/// `ApiError` carries the upstream response body verbatim.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Conversion service not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to convert PDF: {0}")]
    ApiError(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("Failed to decode extracted text: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Trait for PDF-to-text converters.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Convert a PDF into plain text.
    async fn convert(&self, file_bytes: &[u8], file_name: &str) -> Result<String, ConvertError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ConvertError>;
}
