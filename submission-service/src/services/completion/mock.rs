//! Mock completion provider for development and tests.

use super::{CompletionProvider, CompletionRequest, ProviderError, Role};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned extraction payload with the full six-key shape.
pub const MOCK_EXTRACTION_JSON: &str = r#"{
    "insured": "Acme Manufacturing Co",
    "lines": ["General Liability", "Property"],
    "limits": "$1,000,000 per occurrence / $2,000,000 aggregate",
    "effectiveDate": "01/01/2025",
    "locations": ["123 Main St, Springfield, IL 62701"],
    "additionalInfo": "Not found"
}"#;

/// Canned email payload.
pub const MOCK_EMAIL_JSON: &str = r#"{
    "subject": "Submission: Acme Manufacturing Co - General Liability & Property",
    "body": "Dear Underwriter,\n\nPlease find attached our submission for Acme Manufacturing Co.\n\nCoverage requested: General Liability, Property\nLimits: $1,000,000 per occurrence / $2,000,000 aggregate\nEffective date: 01/01/2025\nLocation: 123 Main St, Springfield, IL 62701\n\nWe appreciate your consideration.\n\nBest regards"
}"#;

/// Mock completion provider. Answers the email-generation prompt with a
/// canned email and everything else with a canned extraction payload.
pub struct MockCompletionProvider {
    enabled: bool,
    calls: AtomicUsize,
}

impl MockCompletionProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completions performed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock completion provider not enabled".to_string(),
            ));
        }

        self.calls.fetch_add(1, Ordering::SeqCst);

        // The email prompt asks for {"subject", "body"}; the extraction
        // prompt asks for the six-key document shape.
        let wants_email = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.contains("\"subject\""))
            .unwrap_or(false);

        if wants_email {
            Ok(MOCK_EMAIL_JSON.to_string())
        } else {
            Ok(MOCK_EXTRACTION_JSON.to_string())
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock completion provider not enabled".to_string(),
            ))
        }
    }
}
