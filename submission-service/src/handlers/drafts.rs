use crate::dtos::{DocumentResponse, DraftResponse, GenerateDraftRequest, SaveDraftRequest};
use crate::middleware::AuthUser;
use crate::pipeline;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;
use validator::Validate;

/// `POST /draft` — run the two-step drafting pipeline over raw text.
pub async fn generate_draft(
    State(state): State<AppState>,
    Json(request): Json<GenerateDraftRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    let outcome = pipeline::draft(
        state.completion.as_ref(),
        &request.text,
        &request.file_name,
        request.notes.as_deref(),
    )
    .await?;

    Ok(Json(DraftResponse {
        extracted_data: outcome.extracted_data,
        email_content: outcome.email_content,
    }))
}

/// `POST /save-draft` — overwrite the cached draft on an owned document.
pub async fn save_draft(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SaveDraftRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. All three of document id, subject and body must be present.
    let (Some(document_id), Some(subject), Some(body)) =
        (request.document_id, request.subject, request.body)
    else {
        return Err(AppError::ValidationFailed(anyhow::anyhow!(
            "Missing required fields"
        )));
    };

    if subject.trim().is_empty() || body.trim().is_empty() {
        return Err(AppError::ValidationFailed(anyhow::anyhow!(
            "Missing required fields"
        )));
    }

    // 2. Single conditional update scoped to the owner; no row is touched
    // when the caller does not own the document.
    let updated = state
        .store
        .update_draft(
            document_id,
            user.user_id,
            &subject,
            &body,
            request.extracted_data.as_ref(),
        )
        .await?;

    match updated {
        Some(document) => {
            tracing::info!(document_id = %document_id, "Draft saved");
            Ok(Json(DocumentResponse::from(document)))
        }
        // Nothing matched: read once to pick the right error.
        None => match state.store.find_by_id(document_id).await? {
            Some(_) => Err(AppError::Forbidden(anyhow::anyhow!(
                "You do not own this document"
            ))),
            None => Err(AppError::NotFound(anyhow::anyhow!("Document not found"))),
        },
    }
}
