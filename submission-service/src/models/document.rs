use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Literal sentinel the extraction model must use for absent scalar fields.
pub const NOT_FOUND_SENTINEL: &str = "Not found";

/// Characters assumed per page when estimating page counts. The conversion
/// service returns a single text stream without page boundaries, so the page
/// count is a heuristic, never exact.
const CHARS_PER_PAGE: i64 = 3000;

/// Estimate page count from character count: ceil(chars / 3000), floor of 1.
pub fn estimate_page_count(character_count: i64) -> i32 {
    let pages = (character_count + CHARS_PER_PAGE - 1) / CHARS_PER_PAGE;
    pages.max(1) as i32
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedPage {
    pub page: i32,
    pub characters: i64,
    pub content: String,
}

/// Paginated text payload stored with every document. Conversion produces one
/// page entry holding the whole text; `pages_total` is the heuristic estimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedText {
    pub pages_total: i32,
    pub characters_total: i64,
    pub pages: Vec<ExtractedPage>,
}

impl ExtractedText {
    pub fn single_page(text: String) -> Self {
        let characters_total = text.chars().count() as i64;
        Self {
            pages_total: estimate_page_count(characters_total),
            characters_total,
            pages: vec![ExtractedPage {
                page: 1,
                characters: characters_total,
                content: text,
            }],
        }
    }

    /// Join all page contents into the single text blob fed to the drafting
    /// pipeline.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn not_found() -> String {
    NOT_FOUND_SENTINEL.to_string()
}

/// Structured fields extracted from an ACORD form by the completion service.
///
/// Every value is an opaque "as seen in the document" string, trusted
/// verbatim. Absent scalars are the `"Not found"` sentinel, absent
/// collections are empty. Five keys are required on the wire; a payload
/// missing any of them is rejected at the boundary. `additionalInfo` defaults
/// to the sentinel when the model omits it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    pub insured: String,
    pub lines: Vec<String>,
    pub limits: String,
    pub effective_date: String,
    pub locations: Vec<String>,
    #[serde(default = "not_found")]
    pub additional_info: String,
}

/// Drafted submission email. Body is plain text with `\n` line breaks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

/// One uploaded ACORD form with its derived text and optional cached draft.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub file_size: i64,
    pub page_count: i32,
    pub character_count: i64,
    pub extracted_text: Json<ExtractedText>,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub extracted_data: Option<Json<ExtractedData>>,
    pub email_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        user_id: Uuid,
        file_name: String,
        storage_path: String,
        file_size: i64,
        extracted_text: ExtractedText,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            file_name,
            storage_path,
            file_size,
            page_count: extracted_text.pages_total,
            character_count: extracted_text.characters_total,
            extracted_text: Json(extracted_text),
            email_subject: None,
            email_body: None,
            extracted_data: None,
            email_generated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A draft replay is possible only when the email fields and the
    /// extraction cache are all present.
    pub fn draft_cached(&self) -> bool {
        self.email_subject.is_some() && self.email_body.is_some() && self.extracted_data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_has_floor_of_one() {
        assert_eq!(estimate_page_count(0), 1);
        assert_eq!(estimate_page_count(1), 1);
        assert_eq!(estimate_page_count(3000), 1);
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(estimate_page_count(3001), 2);
        assert_eq!(estimate_page_count(9000), 3);
        assert_eq!(estimate_page_count(9001), 4);
    }

    #[test]
    fn single_page_wraps_whole_text() {
        let extracted = ExtractedText::single_page("a".repeat(9000));
        assert_eq!(extracted.pages_total, 3);
        assert_eq!(extracted.characters_total, 9000);
        assert_eq!(extracted.pages.len(), 1);
        assert_eq!(extracted.pages[0].page, 1);
        assert_eq!(extracted.pages[0].characters, 9000);
    }

    #[test]
    fn full_text_joins_pages_with_blank_lines() {
        let extracted = ExtractedText {
            pages_total: 2,
            characters_total: 10,
            pages: vec![
                ExtractedPage {
                    page: 1,
                    characters: 5,
                    content: "first".to_string(),
                },
                ExtractedPage {
                    page: 2,
                    characters: 5,
                    content: "second".to_string(),
                },
            ],
        };
        assert_eq!(extracted.full_text(), "first\n\nsecond");
    }

    #[test]
    fn extracted_data_serializes_exactly_six_keys() {
        let data = ExtractedData {
            insured: NOT_FOUND_SENTINEL.to_string(),
            lines: vec![],
            limits: NOT_FOUND_SENTINEL.to_string(),
            effective_date: NOT_FOUND_SENTINEL.to_string(),
            locations: vec![],
            additional_info: NOT_FOUND_SENTINEL.to_string(),
        };
        let value = serde_json::to_value(&data).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        for key in [
            "insured",
            "lines",
            "limits",
            "effectiveDate",
            "locations",
            "additionalInfo",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
            assert!(!obj[key].is_null(), "key {} must never be null", key);
        }
        assert_eq!(obj["lines"], serde_json::json!([]));
    }

    #[test]
    fn extracted_data_defaults_additional_info_to_sentinel() {
        let data: ExtractedData = serde_json::from_str(
            r#"{
                "insured": "Acme Co",
                "lines": ["General Liability"],
                "limits": "$1,000,000",
                "effectiveDate": "01/01/2025",
                "locations": []
            }"#,
        )
        .unwrap();
        assert_eq!(data.additional_info, NOT_FOUND_SENTINEL);
    }

    #[test]
    fn extracted_data_rejects_missing_required_key() {
        let result = serde_json::from_str::<ExtractedData>(
            r#"{
                "lines": [],
                "limits": "Not found",
                "effectiveDate": "Not found",
                "locations": []
            }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn draft_cache_requires_all_three_fields() {
        let mut doc = Document::new(
            Uuid::new_v4(),
            "acord.pdf".to_string(),
            "u/acord.pdf".to_string(),
            128,
            ExtractedText::single_page("text".to_string()),
        );
        assert!(!doc.draft_cached());

        doc.email_subject = Some("Subject".to_string());
        doc.email_body = Some("Body".to_string());
        assert!(!doc.draft_cached());

        doc.extracted_data = Some(Json(ExtractedData {
            insured: "Acme Co".to_string(),
            lines: vec![],
            limits: NOT_FOUND_SENTINEL.to_string(),
            effective_date: NOT_FOUND_SENTINEL.to_string(),
            locations: vec![],
            additional_info: NOT_FOUND_SENTINEL.to_string(),
        }));
        assert!(doc.draft_cached());
    }
}
