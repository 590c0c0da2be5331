use mygrade_common::grades::value_to_text;
use serde::Serialize;

use crate::store::Document;

pub const COURSE_CODE_KEY: &str = "courseCode";
pub const SUBJECT_NAME_KEY: &str = "subjectName";
pub const YEAR_SECTION_KEY: &str = "yearSection";
pub const CREATED_AT_KEY: &str = "createdAt";
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// A class as listed on the roster
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    pub id: String,
    pub course_code: String,
    pub subject_name: String,
    pub year_section: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ClassRecord {
    pub fn from_document(document: &Document) -> Self {
        let text = |key: &str| document.data.get(key).map(value_to_text).unwrap_or_default();
        let timestamp = |key: &str| document.text(key).map(str::to_string);

        Self {
            id: document.id.clone(),
            course_code: text(COURSE_CODE_KEY),
            subject_name: text(SUBJECT_NAME_KEY),
            year_section: text(YEAR_SECTION_KEY),
            created_at: timestamp(CREATED_AT_KEY),
            updated_at: timestamp(UPDATED_AT_KEY),
        }
    }

    /// `courseCode - yearSection`
    pub fn header(&self) -> String {
        format!("{} - {}", self.course_code, self.year_section)
    }

    /// Case-insensitive substring match on the three text fields.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.trim().to_lowercase();
        [&self.course_code, &self.subject_name, &self.year_section]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Project stored class documents, keeping those matching `search`.
pub fn filter_classes(documents: &[Document], search: Option<&str>) -> Vec<ClassRecord> {
    documents
        .iter()
        .map(ClassRecord::from_document)
        .filter(|record| search.map_or(true, |search| record.matches(search)))
        .collect()
}
