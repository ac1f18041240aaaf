//! ConvertAPI PDF-to-text client.
//!
//! Posts the raw file as multipart and decodes the base64 payload the
//! conversion endpoint wraps in its JSON envelope.

use super::{ConvertError, PdfConverter};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;

/// ConvertAPI client configuration.
#[derive(Debug, Clone)]
pub struct ConvertApiConfig {
    pub base_url: String,
    pub secret: String,
}

pub struct ConvertApiClient {
    config: ConvertApiConfig,
    client: Client,
}

impl ConvertApiClient {
    pub fn new(config: ConvertApiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/convert/pdf/to/txt?Secret={}",
            self.config.base_url, self.config.secret
        )
    }
}

#[async_trait]
impl PdfConverter for ConvertApiClient {
    async fn convert(&self, file_bytes: &[u8], file_name: &str) -> Result<String, ConvertError> {
        if self.config.secret.is_empty() {
            return Err(ConvertError::NotConfigured(
                "Conversion API secret not configured".to_string(),
            ));
        }

        let part = reqwest::multipart::Part::bytes(file_bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ConvertError::ApiError(format!("Invalid upload part: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("File", part);

        tracing::debug!(
            file_name = %file_name,
            size = file_bytes.len(),
            "Sending file to conversion service"
        );

        let response = self
            .client
            .post(self.api_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConvertError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ConvertError::ApiError(error_text));
        }

        let envelope: ConvertResponse = response
            .json()
            .await
            .map_err(|e| ConvertError::ApiError(format!("Failed to parse response: {}", e)))?;

        let file = envelope
            .files
            .into_iter()
            .next()
            .ok_or_else(|| ConvertError::EmptyResult("No text extracted from PDF".to_string()))?;

        let file_data = file
            .file_data
            .ok_or_else(|| ConvertError::EmptyResult("No text data in response".to_string()))?;

        let decoded = BASE64
            .decode(file_data.as_bytes())
            .map_err(|e| ConvertError::Decode(e.to_string()))?;

        String::from_utf8(decoded).map_err(|e| ConvertError::Decode(e.to_string()))
    }

    async fn health_check(&self) -> Result<(), ConvertError> {
        if self.config.secret.is_empty() {
            Err(ConvertError::NotConfigured(
                "Conversion API secret not configured".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// ConvertAPI Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertResponse {
    #[serde(default)]
    files: Vec<ConvertedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConvertedFile {
    file_data: Option<String>,
    #[allow(dead_code)]
    file_name: Option<String>,
    #[allow(dead_code)]
    file_size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_pascal_case_payload() {
        let envelope: ConvertResponse = serde_json::from_str(
            r#"{
                "ConversionCost": 1,
                "Files": [
                    { "FileName": "acord.txt", "FileSize": 12, "FileData": "SW5zdXJlZDogQWNtZQ==" }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(envelope.files.len(), 1);
        let data = envelope.files[0].file_data.as_deref().unwrap();
        let decoded = BASE64.decode(data.as_bytes()).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Insured: Acme");
    }

    #[test]
    fn envelope_tolerates_missing_file_list() {
        let envelope: ConvertResponse = serde_json::from_str("{}").unwrap();
        assert!(envelope.files.is_empty());
    }
}
