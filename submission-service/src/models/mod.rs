mod document;

pub use document::{
    estimate_page_count, Document, EmailContent, ExtractedData, ExtractedPage, ExtractedText,
    NOT_FOUND_SENTINEL,
};
