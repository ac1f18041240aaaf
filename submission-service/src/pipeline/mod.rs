pub mod draft;
pub mod ingest;

pub use draft::{draft, draft_for_document, DraftOutcome};
pub use ingest::{ingest, IngestOutcome, MAX_DOCUMENTS_PER_USER};
