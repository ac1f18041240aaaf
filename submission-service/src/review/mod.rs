//! Review/edit surface state machine.
//!
//! Models the client-side flow over one (PDF reference, extracted data,
//! email content) triple: `Idle → Uploading → Converting → Drafting →
//! Reviewing → (Editing ⇄ Saving) → Reviewing`, with `back` returning to
//! `Idle` and discarding edits that were never saved. The session holds at
//! most one triple; presenting another replaces it wholesale.

use crate::models::{EmailContent, ExtractedData};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Idle,
    Uploading,
    Converting,
    Drafting,
    Reviewing,
    Editing,
    Saving,
}

/// The triple under review.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub document_id: Option<Uuid>,
    pub file_name: String,
    pub pdf_url: String,
    pub extracted_data: ExtractedData,
    pub email_content: EmailContent,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} while {from:?}")]
    Invalid {
        from: ReviewState,
        action: &'static str,
    },
}

#[derive(Debug)]
pub struct ReviewSession {
    state: ReviewState,
    submission: Option<Submission>,
    draft_subject: String,
    draft_body: String,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            state: ReviewState::Idle,
            submission: None,
            draft_subject: String::new(),
            draft_body: String::new(),
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    pub fn draft_subject(&self) -> &str {
        &self.draft_subject
    }

    pub fn draft_body(&self) -> &str {
        &self.draft_body
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::Invalid {
            from: self.state,
            action,
        }
    }

    pub fn begin_upload(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Idle => {
                self.state = ReviewState::Uploading;
                Ok(())
            }
            _ => Err(self.invalid("begin upload")),
        }
    }

    pub fn conversion_started(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Uploading => {
                self.state = ReviewState::Converting;
                Ok(())
            }
            _ => Err(self.invalid("start conversion")),
        }
    }

    pub fn drafting_started(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Converting => {
                self.state = ReviewState::Drafting;
                Ok(())
            }
            _ => Err(self.invalid("start drafting")),
        }
    }

    /// Present a submission for review. Allowed after drafting, from `Idle`
    /// (cache-hit replay of a previous upload), and from `Reviewing`
    /// (switching documents replaces the triple wholesale).
    pub fn present(&mut self, submission: Submission) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Idle | ReviewState::Drafting | ReviewState::Reviewing => {
                self.draft_subject = submission.email_content.subject.clone();
                self.draft_body = submission.email_content.body.clone();
                self.submission = Some(submission);
                self.state = ReviewState::Reviewing;
                Ok(())
            }
            _ => Err(self.invalid("present submission")),
        }
    }

    pub fn begin_edit(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Reviewing => {
                self.state = ReviewState::Editing;
                Ok(())
            }
            _ => Err(self.invalid("edit")),
        }
    }

    /// Mutate the in-memory subject. Only legal while editing; nothing is
    /// persisted until a save completes.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Editing => {
                self.draft_subject = subject.into();
                Ok(())
            }
            _ => Err(self.invalid("set subject")),
        }
    }

    pub fn set_body(&mut self, body: impl Into<String>) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Editing => {
                self.draft_body = body.into();
                Ok(())
            }
            _ => Err(self.invalid("set body")),
        }
    }

    pub fn begin_save(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Editing => {
                self.state = ReviewState::Saving;
                Ok(())
            }
            _ => Err(self.invalid("save")),
        }
    }

    /// Commit the edited subject/body into the held triple.
    pub fn save_complete(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Saving => {
                if let Some(submission) = self.submission.as_mut() {
                    submission.email_content.subject = self.draft_subject.clone();
                    submission.email_content.body = self.draft_body.clone();
                }
                self.state = ReviewState::Reviewing;
                Ok(())
            }
            _ => Err(self.invalid("complete save")),
        }
    }

    /// A failed save returns to editing with the pending edits intact.
    pub fn save_failed(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Saving => {
                self.state = ReviewState::Editing;
                Ok(())
            }
            _ => Err(self.invalid("fail save")),
        }
    }

    /// Return to `Idle`, dropping the triple and any edits not yet saved.
    pub fn back(&mut self) -> Result<(), TransitionError> {
        match self.state {
            ReviewState::Reviewing | ReviewState::Editing => {
                self.submission = None;
                self.draft_subject.clear();
                self.draft_body.clear();
                self.state = ReviewState::Idle;
                Ok(())
            }
            _ => Err(self.invalid("go back")),
        }
    }

    /// Clipboard export: subject and body separated by a blank line.
    pub fn clipboard_export(&self) -> Option<String> {
        match self.state {
            ReviewState::Reviewing | ReviewState::Editing => Some(format!(
                "Subject: {}\n\n{}",
                self.draft_subject, self.draft_body
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_FOUND_SENTINEL;

    fn sample_submission(file_name: &str, subject: &str) -> Submission {
        Submission {
            document_id: Some(Uuid::new_v4()),
            file_name: file_name.to_string(),
            pdf_url: format!("/documents/x/download?file={}", file_name),
            extracted_data: ExtractedData {
                insured: "Acme Co".to_string(),
                lines: vec!["General Liability".to_string()],
                limits: NOT_FOUND_SENTINEL.to_string(),
                effective_date: NOT_FOUND_SENTINEL.to_string(),
                locations: vec![],
                additional_info: NOT_FOUND_SENTINEL.to_string(),
            },
            email_content: EmailContent {
                subject: subject.to_string(),
                body: "Dear Underwriter,\n\nDetails attached.".to_string(),
            },
        }
    }

    #[test]
    fn full_upload_flow_reaches_reviewing() {
        let mut session = ReviewSession::new();
        session.begin_upload().unwrap();
        session.conversion_started().unwrap();
        session.drafting_started().unwrap();
        session.present(sample_submission("acord.pdf", "Subject")).unwrap();

        assert_eq!(session.state(), ReviewState::Reviewing);
        assert_eq!(session.draft_subject(), "Subject");
    }

    #[test]
    fn cached_replay_presents_directly_from_idle() {
        let mut session = ReviewSession::new();
        session.present(sample_submission("acord.pdf", "Cached")).unwrap();
        assert_eq!(session.state(), ReviewState::Reviewing);
    }

    #[test]
    fn switching_documents_replaces_triple_wholesale() {
        let mut session = ReviewSession::new();
        session.present(sample_submission("first.pdf", "First")).unwrap();
        session.present(sample_submission("second.pdf", "Second")).unwrap();

        let submission = session.submission().unwrap();
        assert_eq!(submission.file_name, "second.pdf");
        assert_eq!(session.draft_subject(), "Second");
    }

    #[test]
    fn edits_require_editing_state() {
        let mut session = ReviewSession::new();
        session.present(sample_submission("acord.pdf", "Subject")).unwrap();

        assert!(session.set_subject("nope").is_err());

        session.begin_edit().unwrap();
        session.set_subject("Edited subject").unwrap();
        session.set_body("Edited body").unwrap();
        assert_eq!(session.draft_subject(), "Edited subject");
    }

    #[test]
    fn save_commits_edits_into_submission() {
        let mut session = ReviewSession::new();
        session.present(sample_submission("acord.pdf", "Subject")).unwrap();
        session.begin_edit().unwrap();
        session.set_subject("Edited subject").unwrap();
        session.begin_save().unwrap();
        session.save_complete().unwrap();

        assert_eq!(session.state(), ReviewState::Reviewing);
        assert_eq!(
            session.submission().unwrap().email_content.subject,
            "Edited subject"
        );
    }

    #[test]
    fn failed_save_returns_to_editing_with_edits_intact() {
        let mut session = ReviewSession::new();
        session.present(sample_submission("acord.pdf", "Subject")).unwrap();
        session.begin_edit().unwrap();
        session.set_body("Pending body").unwrap();
        session.begin_save().unwrap();
        session.save_failed().unwrap();

        assert_eq!(session.state(), ReviewState::Editing);
        assert_eq!(session.draft_body(), "Pending body");
        // The held triple still has the original body.
        assert_ne!(
            session.submission().unwrap().email_content.body,
            "Pending body"
        );
    }

    #[test]
    fn back_discards_unsaved_edits() {
        let mut session = ReviewSession::new();
        session.present(sample_submission("acord.pdf", "Subject")).unwrap();
        session.begin_edit().unwrap();
        session.set_subject("Never saved").unwrap();
        session.back().unwrap();

        assert_eq!(session.state(), ReviewState::Idle);
        assert!(session.submission().is_none());
        assert_eq!(session.draft_subject(), "");
    }

    #[test]
    fn clipboard_export_joins_subject_and_body_with_blank_line() {
        let mut session = ReviewSession::new();
        assert!(session.clipboard_export().is_none());

        session.present(sample_submission("acord.pdf", "Subject")).unwrap();
        assert_eq!(
            session.clipboard_export().unwrap(),
            "Subject: Subject\n\nDear Underwriter,\n\nDetails attached."
        );
    }

    #[test]
    fn invalid_transitions_are_typed_errors() {
        let mut session = ReviewSession::new();
        let err = session.conversion_started().unwrap_err();
        assert_eq!(
            err,
            TransitionError::Invalid {
                from: ReviewState::Idle,
                action: "start conversion"
            }
        );

        session.begin_upload().unwrap();
        assert!(session.begin_upload().is_err());
        assert!(session.back().is_err());
    }
}
