//! Public student lookup
//!
//! A student proves who they are with their first name, last name and ID
//! number. The ID selects `students/{idNumber}`; both names must match the
//! stored names case-insensitively. A wrong ID and a wrong name are
//! reported with the same status so the lookup cannot be used to probe
//! which IDs exist.

use mygrade_common::{
    grades::{value_to_text, GradeStanding, CELEBRATION_THRESHOLD, FIRST_NAME_KEY, LAST_NAME_KEY},
    student::StudentSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::features::shared::validation::{
    require_fields, RequiredFieldsError, COMPLETE_ALL_FIELDS,
};
use crate::store::{CollectionPath, DocumentStore, StoreError};

/// Length of the celebratory effect on a good lookup result
pub const LOOKUP_CELEBRATION_MS: u64 = 4_000;

/// Where the saved record can be viewed
pub const RECORD_PATH: &str = "/viewrecord";

/// Lookup form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindStudentQuery {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub id_number: String,
}

/// Celebratory effect attached to a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Celebration {
    pub duration_ms: u64,
}

/// The midterm grade as shown next to the lookup form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBadge {
    /// Two decimals, e.g. "2.50"
    pub value: String,
    pub standing: GradeStanding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celebration: Option<Celebration>,
}

impl GradeBadge {
    pub fn for_lookup(grade: f64) -> Self {
        Self {
            value: format!("{:.2}", grade),
            standing: GradeStanding::from_grade(grade),
            celebration: (grade <= CELEBRATION_THRESHOLD).then_some(Celebration {
                duration_ms: LOOKUP_CELEBRATION_MS,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindStudentResponse {
    pub student: StudentSnapshot,
    pub grade: GradeBadge,
    pub record_url: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum FindStudentError {
    #[error(transparent)]
    Validation(#[from] RequiredFieldsError),

    #[error("Student record not found.")]
    NotFound,

    #[error("Invalid name or ID number.")]
    Mismatch,

    #[error("Database error.")]
    Store(#[from] StoreError),
}

impl FindStudentQuery {
    pub fn validate(&self) -> Result<(), FindStudentError> {
        require_fields(
            &[
                ("firstName", &self.first_name),
                ("lastName", &self.last_name),
                ("idNumber", &self.id_number),
            ],
            COMPLETE_ALL_FIELDS,
        )?;
        Ok(())
    }
}

#[tracing::instrument(skip(store, query), fields(id_number = %query.id_number.trim()))]
pub async fn handle(
    store: &dyn DocumentStore,
    query: FindStudentQuery,
) -> Result<FindStudentResponse, FindStudentError> {
    query.validate()?;

    let id_number = query.id_number.trim();
    let document = match store.get(&CollectionPath::students(), id_number).await {
        Ok(Some(document)) => document,
        Ok(None) | Err(StoreError::InvalidPath(_)) => {
            tracing::debug!("No student document for lookup");
            return Err(FindStudentError::NotFound);
        },
        Err(e) => return Err(e.into()),
    };

    let stored_name = |key: &str| {
        document
            .data
            .get(key)
            .map(value_to_text)
            .unwrap_or_default()
            .to_lowercase()
    };

    if stored_name(FIRST_NAME_KEY) != query.first_name.trim().to_lowercase()
        || stored_name(LAST_NAME_KEY) != query.last_name.trim().to_lowercase()
    {
        tracing::debug!("Lookup names do not match the stored record");
        return Err(FindStudentError::Mismatch);
    }

    let student = StudentSnapshot::from_document(&document.id, &document.data);
    let grade = GradeBadge::for_lookup(student.midterm_grade());

    tracing::info!(standing = ?grade.standing, "Student record found");

    Ok(FindStudentResponse {
        student,
        grade,
        record_url: RECORD_PATH,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{fields, FaultyStore};
    use crate::store::MemoryStore;
    use mygrade_common::grades::GradeField;
    use serde_json::json;

    async fn store_with_student() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .set_merge(
                &CollectionPath::students(),
                "2022123456",
                fields(json!({
                    "idNumber": "2022123456",
                    "firstName": "John",
                    "lastName": "Doe",
                    "quiz1": -1,
                    "quiz2": "",
                    "midtermGrade": 2.5,
                    "classId": "c1",
                })),
            )
            .await
            .unwrap();
        store
    }

    fn query(first: &str, last: &str, id: &str) -> FindStudentQuery {
        FindStudentQuery {
            first_name: first.to_string(),
            last_name: last.to_string(),
            id_number: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_lookup_success_normalizes_grades() {
        let store = store_with_student().await;
        let response = handle(&store, query(" john ", "DOE", " 2022123456 "))
            .await
            .unwrap();

        assert_eq!(response.student.id_number, "2022123456");
        assert_eq!(response.student.grade(GradeField::Quiz1), -1.0);
        assert_eq!(response.student.grade(GradeField::Quiz2), 0.0);
        assert_eq!(response.grade.value, "2.50");
        assert_eq!(response.grade.standing, GradeStanding::Passing);
        assert_eq!(
            response.grade.celebration,
            Some(Celebration { duration_ms: 4_000 })
        );
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let store = store_with_student().await;
        let err = handle(&store, query("John", "  ", "2022123456")).await.unwrap_err();
        assert_eq!(err.to_string(), "Please complete all fields.");
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = store_with_student().await;
        let err = handle(&store, query("John", "Doe", "999")).await.unwrap_err();
        assert!(matches!(err, FindStudentError::NotFound));
        assert_eq!(err.to_string(), "Student record not found.");
    }

    #[tokio::test]
    async fn test_name_mismatch() {
        let store = store_with_student().await;
        let err = handle(&store, query("Jane", "Doe", "2022123456")).await.unwrap_err();
        assert!(matches!(err, FindStudentError::Mismatch));
        assert_eq!(err.to_string(), "Invalid name or ID number.");
    }

    #[tokio::test]
    async fn test_id_with_slash_is_not_found() {
        let store = store_with_student().await;
        let err = handle(&store, query("John", "Doe", "20/22")).await.unwrap_err();
        assert!(matches!(err, FindStudentError::NotFound));
    }

    #[test]
    fn test_badge_thresholds() {
        let failing = GradeBadge::for_lookup(3.25);
        assert_eq!(failing.standing, GradeStanding::Failing);
        assert!(failing.celebration.is_none());

        let passing_quietly = GradeBadge::for_lookup(3.1);
        assert_eq!(passing_quietly.standing, GradeStanding::Passing);
        assert!(passing_quietly.celebration.is_none());

        assert!(GradeBadge::for_lookup(3.0).celebration.is_some());
        assert_eq!(GradeBadge::for_lookup(1.0).value, "1.00");
    }

    #[tokio::test]
    async fn test_reads_never_write() {
        // every write would fail; a lookup must not need one
        let store = FaultyStore::failing_at_write(0);
        store
            .inner()
            .set_merge(
                &CollectionPath::students(),
                "1",
                fields(json!({ "firstName": "A", "lastName": "B", "midtermGrade": 4.0 })),
            )
            .await
            .unwrap();

        let response = handle(&store, query("a", "b", "1")).await.unwrap();
        assert_eq!(response.grade.standing, GradeStanding::Failing);
    }
}
