use crate::dtos::{
    DocumentListResponse, DocumentSummary, DownloadParams, ProcessResponse, SubmissionResponse,
};
use crate::middleware::AuthUser;
use crate::pipeline;
use crate::pipeline::ingest::MAX_UPLOAD_BYTES;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use service_core::utils::signature;
use uuid::Uuid;

/// `POST /process` — upload one ACORD PDF and run the ingestion pipeline.
pub async fn process_document(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file provided")))?;

    let file_name = field.file_name().unwrap_or("unnamed.pdf").to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e)))?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "File too large (max 20MB)"
        )));
    }

    tracing::info!(
        user_id = %user.user_id,
        file_name = %file_name,
        size = data.len(),
        "Document processing started"
    );

    let outcome = pipeline::ingest(
        state.store.as_ref(),
        state.storage.as_ref(),
        state.converter.as_ref(),
        user.user_id,
        &data,
        &file_name,
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(ProcessResponse::new(
            outcome.extracted_text,
            outcome.document_id,
        )),
    ))
}

/// `GET /documents` — the caller's documents, newest first.
pub async fn list_documents(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let documents = state.store.list_for_user(user.user_id).await?;

    let summaries: Vec<DocumentSummary> =
        documents.into_iter().map(DocumentSummary::from).collect();

    Ok(Json(DocumentListResponse {
        total: summaries.len(),
        documents: summaries,
    }))
}

/// `GET /documents/:id/submission` — cache-aware review triple.
///
/// A fully cached record replays with zero completion calls; otherwise the
/// drafting pipeline runs exactly once and the result is written back.
pub async fn view_submission(
    State(state): State<AppState>,
    user: AuthUser,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Fetch document and check ownership.
    let document = state
        .store
        .find_by_id(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;

    if document.user_id != user.user_id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You do not own this document"
        )));
    }

    // 2. Replay or fill the draft cache.
    let outcome = pipeline::draft_for_document(
        state.store.as_ref(),
        state.completion.as_ref(),
        &document,
    )
    .await?;

    // 3. Time-limited signed URL for the PDF pane.
    let expires = Utc::now().timestamp() + state.config.signature.url_ttl_seconds;
    let sig = signature::generate_document_signature(
        &state.config.signature.signing_secret,
        &document.id.to_string(),
        expires,
    )
    .map_err(AppError::InternalError)?;

    let pdf_url = format!(
        "/documents/{}/download?signature={}&expires={}",
        document.id, sig, expires
    );

    Ok(Json(SubmissionResponse {
        document_id: document.id,
        file_name: document.file_name,
        pdf_url,
        extracted_data: outcome.extracted_data,
        email_content: outcome.email_content,
    }))
}

/// `GET /documents/:id/download` — raw PDF bytes, authorized either by a
/// valid signature pair or by the owning user's bearer token.
pub async fn download_document(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(document_id): Path<Uuid>,
    Query(params): Query<DownloadParams>,
) -> Result<impl IntoResponse, AppError> {
    // Validate signature if provided, otherwise require ownership.
    let signed = if let (Some(sig), Some(expires)) = (&params.signature, &params.expires) {
        signature::validate_document_signature(
            &document_id.to_string(),
            sig,
            *expires,
            &state.config.signature.signing_secret,
        )?;
        true
    } else {
        false
    };

    let document = state
        .store
        .find_by_id(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;

    if !signed {
        let user = user.ok_or_else(|| {
            AppError::Unauthenticated(anyhow::anyhow!("Missing signature or bearer token"))
        })?;
        if document.user_id != user.user_id {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "You do not own this document"
            )));
        }
    }

    let file_data = state
        .storage
        .download(&document.storage_path)
        .await
        .map_err(|e| {
            tracing::error!(
                document_id = %document_id,
                storage_key = %document.storage_path,
                error = %e,
                "Failed to download file"
            );
            // A degraded document has metadata but no blob.
            AppError::NotFound(anyhow::anyhow!("Document file is not available"))
        })?;

    tracing::info!(
        document_id = %document_id,
        size = file_data.len(),
        "Document download completed"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", document.file_name),
            ),
        ],
        file_data,
    ))
}

/// `DELETE /documents/:id` — remove the record and its backing blob.
pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(document_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = state
        .store
        .find_by_id(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;

    if document.user_id != user.user_id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "You do not own this document"
        )));
    }

    // Blob removal is best-effort; the metadata row is authoritative.
    if let Err(e) = state.storage.delete(&document.storage_path).await {
        tracing::error!(
            document_id = %document_id,
            storage_key = %document.storage_path,
            error = %e,
            "Failed to delete blob"
        );
    }

    state.store.delete(document_id).await?;

    tracing::info!(document_id = %document_id, "Document deleted");

    Ok(StatusCode::NO_CONTENT)
}
