use crate::models::{EmailContent, ExtractedData};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request for `POST /draft`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDraftRequest {
    #[validate(length(min = 1, message = "No extracted text provided"))]
    pub text: String,
    #[serde(default)]
    pub file_name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    #[serde(rename = "extractedData")]
    pub extracted_data: ExtractedData,
    #[serde(rename = "emailContent")]
    pub email_content: EmailContent,
}

/// Request for `POST /save-draft`. Fields are optional on the wire so a
/// missing one maps to the validation taxonomy instead of a decode failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    pub document_id: Option<Uuid>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub extracted_data: Option<ExtractedData>,
}
