//! Ingestion orchestrator: quota gate, conversion, blob upload, metadata
//! insert. Strictly sequential; blob and metadata failures degrade rather
//! than abort once the text has been extracted.

use crate::models::{Document, ExtractedText};
use crate::services::convert::PdfConverter;
use crate::services::{DocumentStore, Storage};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use service_core::error::AppError;
use uuid::Uuid;

/// Fixed cap on documents per owner, checked before any external call.
pub const MAX_DOCUMENTS_PER_USER: i64 = 20;

/// Upload size cap.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug)]
pub struct IngestOutcome {
    pub extracted_text: ExtractedText,
    /// Absent when the metadata insert failed; the caller still gets the
    /// extracted text but cannot save drafts against this upload later.
    pub document_id: Option<Uuid>,
}

#[derive(Debug)]
enum Compensation {
    RemoveBlob { key: String },
}

/// Compensating actions recorded after each successful side effect and run
/// best-effort in reverse order when a later step fails fatally.
#[derive(Debug, Default)]
struct Compensations {
    actions: Vec<Compensation>,
}

impl Compensations {
    fn record_blob(&mut self, key: &str) {
        self.actions.push(Compensation::RemoveBlob {
            key: key.to_string(),
        });
    }

    async fn run(&self, storage: &dyn Storage) {
        for action in self.actions.iter().rev() {
            match action {
                Compensation::RemoveBlob { key } => match storage.delete(key).await {
                    Ok(()) => tracing::info!(storage_key = %key, "Cleaned up file after error"),
                    Err(e) => {
                        tracing::error!(storage_key = %key, error = %e, "Cleanup failed")
                    }
                },
            }
        }
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Blob key namespaced by owner, with a timestamp + random suffix to avoid
/// collisions: `{user_id}/{timestamp}-{random}-{sanitized_name}`.
fn build_storage_key(user_id: Uuid, file_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!(
        "{}/{}-{}-{}",
        user_id,
        Utc::now().timestamp_millis(),
        suffix.to_lowercase(),
        sanitize_file_name(file_name)
    )
}

pub async fn ingest(
    store: &dyn DocumentStore,
    storage: &dyn Storage,
    converter: &dyn PdfConverter,
    user_id: Uuid,
    file_bytes: &[u8],
    file_name: &str,
) -> Result<IngestOutcome, AppError> {
    let mut compensations = Compensations::default();

    match run(
        store,
        storage,
        converter,
        user_id,
        file_bytes,
        file_name,
        &mut compensations,
    )
    .await
    {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            compensations.run(storage).await;
            Err(err)
        }
    }
}

async fn run(
    store: &dyn DocumentStore,
    storage: &dyn Storage,
    converter: &dyn PdfConverter,
    user_id: Uuid,
    file_bytes: &[u8],
    file_name: &str,
    compensations: &mut Compensations,
) -> Result<IngestOutcome, AppError> {
    // 1. Quota gate, before any external call.
    let count = store.count_for_user(user_id).await?;
    if count >= MAX_DOCUMENTS_PER_USER {
        return Err(AppError::QuotaExceeded(anyhow::anyhow!(
            "Maximum of {} documents reached. Please delete some documents first.",
            MAX_DOCUMENTS_PER_USER
        )));
    }

    // 2. Convert the PDF to text. Conversion failures abort with the
    // upstream message; nothing has been written yet.
    let text = converter
        .convert(file_bytes, file_name)
        .await
        .map_err(|e| AppError::UpstreamConversionFailed(e.to_string()))?;

    // 3. Page count is estimated from character count, not real boundaries.
    let extracted_text = ExtractedText::single_page(text);

    tracing::info!(
        user_id = %user_id,
        file_name = %file_name,
        pages = extracted_text.pages_total,
        characters = extracted_text.characters_total,
        "PDF converted"
    );

    // 4. Store the original bytes. A failed upload degrades the document
    // (unviewable later) but the pipeline continues with the text.
    let storage_path = build_storage_key(user_id, file_name);
    match storage.upload(&storage_path, file_bytes.to_vec()).await {
        Ok(()) => compensations.record_blob(&storage_path),
        Err(e) => {
            tracing::error!(
                storage_key = %storage_path,
                error = %e,
                "Failed to upload file to storage; continuing with extracted text"
            );
        }
    }

    // 5. Persist metadata. A failed insert means the caller gets the text
    // but no document id to save drafts against.
    let document = Document::new(
        user_id,
        file_name.to_string(),
        storage_path,
        file_bytes.len() as i64,
        extracted_text.clone(),
    );

    let document_id = match store.insert(&document).await {
        Ok(()) => {
            tracing::info!(document_id = %document.id, "Document saved");
            Some(document.id)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to insert document into database");
            tracing::warn!("Document metadata was not saved");
            None
        }
    };

    Ok(IngestOutcome {
        extracted_text,
        document_id,
    })
}
