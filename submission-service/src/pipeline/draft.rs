//! Drafting orchestrator: two strictly sequential completion calls, first
//! extracting structured fields from the document text, then generating the
//! submission email from the extraction. Either step failing aborts the
//! whole operation; there is no partial success and no retry.

use crate::models::{Document, EmailContent, ExtractedData};
use crate::services::completion::{ChatMessage, CompletionProvider, CompletionRequest};
use crate::services::DocumentStore;
use service_core::error::AppError;

/// Extraction samples cold; the contract demands evidence-only output.
const EXTRACTION_TEMPERATURE: f32 = 0.1;
const EXTRACTION_MAX_TOKENS: u32 = 2000;

/// Email generation samples warmer for variety in phrasing.
const EMAIL_TEMPERATURE: f32 = 0.7;

const EXTRACTION_SYSTEM_PROMPT: &str = "You are a precise document data extractor. Your ONLY job is to extract information that is ACTUALLY VISIBLE in the document. DO NOT make assumptions, guesses, or create information. If information is not visible in the document, return \"Not found\" or empty values. Be extremely conservative - only extract what you can clearly see.";

const EMAIL_SYSTEM_PROMPT: &str = "You are a professional insurance broker. Write compelling submission emails that highlight key information and make a strong case for the submission.";

#[derive(Debug, Clone, PartialEq)]
pub struct DraftOutcome {
    pub extracted_data: ExtractedData,
    pub email_content: EmailContent,
}

fn build_extraction_prompt(raw_text: &str, file_name: &str, notes: Option<&str>) -> String {
    let notes_block = notes
        .filter(|n| !n.trim().is_empty())
        .map(|n| format!("ADDITIONAL NOTES FROM USER: {}\n\n", n))
        .unwrap_or_default();

    format!(
        r#"You are an expert at processing insurance ACORD forms.

CRITICAL INSTRUCTIONS:
- ONLY extract information that is ACTUALLY VISIBLE in the document
- DO NOT make assumptions, guesses, or fill in missing information
- If a field is not found in the document, use "Not found" or an empty value
- Be extremely precise and only use exact text from the document
- Do not infer or create information that isn't explicitly stated

{notes_block}Extract ONLY the following information that you can actually see in the document:
- Insured name/company (exact text from the form)
- Lines of coverage (only if explicitly listed: General Liability, Property, Workers' Compensation, etc.)
- Policy limits (exact numbers and text as shown)
- Effective date (exact date format as shown)
- Locations (only addresses/locations explicitly listed)
- DESCRIPTION OF OPERATIONS / LOCATIONS / VEHICLES section (ACORD 101, Additional Remarks Schedule) - Extract the EXACT text from this section if present

--- DOCUMENT TEXT (extracted from PDF: {file_name}) ---

{raw_text}

--- END OF DOCUMENT TEXT ---

Now extract the information from the text above.

Return the extracted information in JSON format. Use "Not found" for any field that is not present in the document:
{{
  "insured": "exact company name from document or 'Not found'",
  "lines": ["only coverage types explicitly listed or empty array []"],
  "limits": "exact limits as shown or 'Not found'",
  "effectiveDate": "exact date as shown or 'Not found'",
  "locations": ["only locations explicitly listed or empty array []"],
  "additionalInfo": "EXACT text from DESCRIPTION OF OPERATIONS / LOCATIONS / VEHICLES section if present, otherwise 'Not found'. Copy the text verbatim, do not summarize or rephrase."
}}"#
    )
}

fn build_email_prompt(extracted_data: &ExtractedData) -> Result<String, AppError> {
    let extraction_json = serde_json::to_string_pretty(extracted_data)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;

    Ok(format!(
        r#"Generate a professional insurance submission email based on the following extracted data:

{extraction_json}

Create a professional email with:
- A clear, compelling subject line
- Professional greeting
- Summary of the submission with key highlights
- Organized presentation of coverage details, limits, and locations
- Professional closing

Return JSON with "subject" and "body" fields. The body should be formatted as plain text (not HTML) with proper line breaks (use \n for line breaks)."#
    ))
}

pub async fn draft(
    provider: &dyn CompletionProvider,
    raw_text: &str,
    file_name: &str,
    notes: Option<&str>,
) -> Result<DraftOutcome, AppError> {
    // Step 1: structured field extraction.
    let extraction_request = CompletionRequest {
        messages: vec![
            ChatMessage::system(EXTRACTION_SYSTEM_PROMPT),
            ChatMessage::user(build_extraction_prompt(raw_text, file_name, notes)),
        ],
        temperature: EXTRACTION_TEMPERATURE,
        max_tokens: Some(EXTRACTION_MAX_TOKENS),
        json_response: true,
    };

    let extraction_content = provider
        .complete(&extraction_request)
        .await
        .map_err(|e| AppError::UpstreamGenerationFailed(anyhow::anyhow!(e)))?;

    let extracted_data: ExtractedData =
        serde_json::from_str(&extraction_content).map_err(|e| {
            AppError::ValidationFailed(anyhow::anyhow!(
                "Completion service returned malformed extraction data: {}",
                e
            ))
        })?;

    tracing::info!(
        file_name = %file_name,
        insured = %extracted_data.insured,
        lines = extracted_data.lines.len(),
        "Structured fields extracted"
    );

    // Step 2: email generation, strictly after step 1's output is available.
    let email_request = CompletionRequest {
        messages: vec![
            ChatMessage::system(EMAIL_SYSTEM_PROMPT),
            ChatMessage::user(build_email_prompt(&extracted_data)?),
        ],
        temperature: EMAIL_TEMPERATURE,
        max_tokens: None,
        json_response: true,
    };

    let email_content_raw = provider
        .complete(&email_request)
        .await
        .map_err(|e| AppError::UpstreamGenerationFailed(anyhow::anyhow!(e)))?;

    let email_content: EmailContent = serde_json::from_str(&email_content_raw).map_err(|e| {
        AppError::ValidationFailed(anyhow::anyhow!(
            "Completion service returned malformed email content: {}",
            e
        ))
    })?;

    if email_content.subject.is_empty() || email_content.body.is_empty() {
        return Err(AppError::ValidationFailed(anyhow::anyhow!(
            "Completion service returned an empty email"
        )));
    }

    tracing::info!(subject = %email_content.subject, "Submission email generated");

    Ok(DraftOutcome {
        extracted_data,
        email_content,
    })
}

/// Cache-aware drafting for a persisted document.
///
/// When the email fields and the extraction cache are all present the draft
/// is replayed from the record with zero completion calls; otherwise the
/// drafting pipeline runs exactly once and the result is written back.
pub async fn draft_for_document(
    store: &dyn DocumentStore,
    provider: &dyn CompletionProvider,
    document: &Document,
) -> Result<DraftOutcome, AppError> {
    if let (Some(subject), Some(body), Some(extracted)) = (
        &document.email_subject,
        &document.email_body,
        &document.extracted_data,
    ) {
        tracing::info!(document_id = %document.id, "Using cached draft");
        return Ok(DraftOutcome {
            extracted_data: extracted.0.clone(),
            email_content: EmailContent {
                subject: subject.clone(),
                body: body.clone(),
            },
        });
    }

    let outcome = draft(
        provider,
        &document.extracted_text.full_text(),
        &document.file_name,
        None,
    )
    .await?;

    // Cache fill. A failed write-back costs a regeneration later, nothing
    // else, so it is logged and tolerated.
    match store
        .update_draft(
            document.id,
            document.user_id,
            &outcome.email_content.subject,
            &outcome.email_content.body,
            Some(&outcome.extracted_data),
        )
        .await
    {
        Ok(Some(_)) => {
            tracing::info!(document_id = %document.id, "Draft cached on document")
        }
        Ok(None) => {
            tracing::warn!(document_id = %document.id, "Draft cache write matched no record")
        }
        Err(e) => {
            tracing::error!(document_id = %document.id, error = %e, "Failed to cache draft")
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedText, NOT_FOUND_SENTINEL};
    use crate::services::completion::mock::{MockCompletionProvider, MOCK_EXTRACTION_JSON};
    use crate::services::completion::ProviderError;
    use crate::services::InMemoryDocumentStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Replays scripted responses and records every user prompt it saw.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
            let user_prompt = request
                .messages
                .iter()
                .rev()
                .find(|m| matches!(m.role, crate::services::completion::Role::User))
                .map(|m| m.content.clone())
                .unwrap_or_default();
            self.prompts.lock().unwrap().push(user_prompt);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::EmptyResponse))
        }

        async fn health_check(&self) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    const EMAIL_JSON: &str = r#"{"subject":"Submission: Acme Co","body":"Dear Underwriter,\n\nDetails attached.\n\nRegards"}"#;

    #[tokio::test]
    async fn extraction_strictly_precedes_email_generation() {
        let provider = ScriptedProvider::new(vec![
            Ok(MOCK_EXTRACTION_JSON.to_string()),
            Ok(EMAIL_JSON.to_string()),
        ]);

        let outcome = draft(&provider, "Insured: Acme", "acord.pdf", None)
            .await
            .unwrap();

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        // First call carries the document text, second carries the
        // extraction result as context.
        assert!(prompts[0].contains("--- DOCUMENT TEXT (extracted from PDF: acord.pdf) ---"));
        assert!(prompts[0].contains(NOT_FOUND_SENTINEL));
        assert!(prompts[1].contains("Acme Manufacturing Co"));
        assert_eq!(outcome.email_content.subject, "Submission: Acme Co");
    }

    #[tokio::test]
    async fn extraction_failure_aborts_before_email_call() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::ApiError(
            "server exploded".to_string(),
        ))]);

        let err = draft(&provider, "text", "acord.pdf", None).await.unwrap_err();

        assert!(matches!(err, AppError::UpstreamGenerationFailed(_)));
        assert_eq!(provider.prompts().len(), 1);
    }

    #[tokio::test]
    async fn malformed_extraction_fails_validation_without_email_call() {
        let provider = ScriptedProvider::new(vec![Ok("not json at all".to_string())]);

        let err = draft(&provider, "text", "acord.pdf", None).await.unwrap_err();

        assert!(matches!(err, AppError::ValidationFailed(_)));
        assert_eq!(provider.prompts().len(), 1);
    }

    #[tokio::test]
    async fn email_failure_aborts_whole_operation() {
        let provider = ScriptedProvider::new(vec![
            Ok(MOCK_EXTRACTION_JSON.to_string()),
            Err(ProviderError::RateLimited),
        ]);

        let err = draft(&provider, "text", "acord.pdf", None).await.unwrap_err();

        assert!(matches!(err, AppError::UpstreamGenerationFailed(_)));
        assert_eq!(provider.prompts().len(), 2);
    }

    #[tokio::test]
    async fn empty_email_fields_fail_validation() {
        let provider = ScriptedProvider::new(vec![
            Ok(MOCK_EXTRACTION_JSON.to_string()),
            Ok(r#"{"subject":"","body":""}"#.to_string()),
        ]);

        let err = draft(&provider, "text", "acord.pdf", None).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationFailed(_)));
    }

    #[test]
    fn notes_are_threaded_into_the_extraction_prompt() {
        let prompt = build_extraction_prompt("text", "acord.pdf", Some("Renewal account"));
        assert!(prompt.contains("ADDITIONAL NOTES FROM USER: Renewal account"));

        let without = build_extraction_prompt("text", "acord.pdf", None);
        assert!(!without.contains("ADDITIONAL NOTES FROM USER"));
    }

    #[tokio::test]
    async fn cached_document_replays_without_completion_calls() {
        let store = InMemoryDocumentStore::new();
        let provider = MockCompletionProvider::new(true);

        let mut document = Document::new(
            Uuid::new_v4(),
            "acord.pdf".to_string(),
            "u/acord.pdf".to_string(),
            64,
            ExtractedText::single_page("Insured: Acme".to_string()),
        );
        document.email_subject = Some("Cached subject".to_string());
        document.email_body = Some("Cached body".to_string());
        document.extracted_data = Some(sqlx::types::Json(
            serde_json::from_str(MOCK_EXTRACTION_JSON).unwrap(),
        ));
        store.insert(&document).await.unwrap();

        let outcome = draft_for_document(&store, &provider, &document)
            .await
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert_eq!(outcome.email_content.subject, "Cached subject");
    }

    #[tokio::test]
    async fn uncached_document_drafts_once_and_fills_cache() {
        let store = InMemoryDocumentStore::new();
        let provider = MockCompletionProvider::new(true);

        let document = Document::new(
            Uuid::new_v4(),
            "acord.pdf".to_string(),
            "u/acord.pdf".to_string(),
            64,
            ExtractedText::single_page("Insured: Acme".to_string()),
        );
        store.insert(&document).await.unwrap();

        let outcome = draft_for_document(&store, &provider, &document)
            .await
            .unwrap();

        // One extraction call plus one email call.
        assert_eq!(provider.calls(), 2);
        assert!(!outcome.email_content.subject.is_empty());

        let stored = store.find_by_id(document.id).await.unwrap().unwrap();
        assert!(stored.draft_cached());

        // Second view is a cache hit.
        let replay = draft_for_document(&store, &provider, &stored)
            .await
            .unwrap();
        assert_eq!(provider.calls(), 2);
        assert_eq!(replay.email_content.subject, outcome.email_content.subject);
    }
}
