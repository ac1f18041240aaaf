mod documents;
mod drafts;
mod health;

pub use documents::{
    delete_document, download_document, list_documents, process_document, view_submission,
};
pub use drafts::{generate_draft, save_draft};
pub use health::health_check;
