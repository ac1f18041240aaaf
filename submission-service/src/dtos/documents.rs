use crate::models::{Document, EmailContent, ExtractedData, ExtractedPage, ExtractedText};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for `POST /process`: the pagination structure plus the id of the
/// persisted document, absent when the metadata insert was tolerated-failed.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub pages_total: i32,
    pub characters_total: i64,
    pub pages: Vec<ExtractedPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
}

impl ProcessResponse {
    pub fn new(extracted_text: ExtractedText, document_id: Option<Uuid>) -> Self {
        Self {
            pages_total: extracted_text.pages_total,
            characters_total: extracted_text.characters_total,
            pages: extracted_text.pages,
            document_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub page_count: i32,
    pub character_count: i64,
    pub draft_cached: bool,
    pub created_at: String,
}

impl From<Document> for DocumentSummary {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            file_name: doc.file_name.clone(),
            file_size: doc.file_size,
            page_count: doc.page_count,
            character_count: doc.character_count,
            draft_cached: doc.draft_cached(),
            created_at: doc.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: usize,
}

/// Full document record, returned by `POST /save-draft`.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub file_size: i64,
    pub page_count: i32,
    pub character_count: i64,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub extracted_data: Option<ExtractedData>,
    pub email_generated_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            user_id: doc.user_id,
            file_name: doc.file_name,
            storage_path: doc.storage_path,
            file_size: doc.file_size,
            page_count: doc.page_count,
            character_count: doc.character_count,
            email_subject: doc.email_subject,
            email_body: doc.email_body,
            extracted_data: doc.extracted_data.map(|d| d.0),
            email_generated_at: doc.email_generated_at.map(|t| t.to_rfc3339()),
            created_at: doc.created_at.to_rfc3339(),
            updated_at: doc.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub signature: Option<String>,
    pub expires: Option<i64>,
}

/// Review triple for one document, with a time-limited signed PDF URL.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub document_id: Uuid,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "pdfUrl")]
    pub pdf_url: String,
    #[serde(rename = "extractedData")]
    pub extracted_data: ExtractedData,
    #[serde(rename = "emailContent")]
    pub email_content: EmailContent,
}
