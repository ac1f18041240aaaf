mod documents;
mod drafts;

pub use documents::{
    DocumentListResponse, DocumentResponse, DocumentSummary, DownloadParams, ProcessResponse,
    SubmissionResponse,
};
pub use drafts::{DraftResponse, GenerateDraftRequest, SaveDraftRequest};
