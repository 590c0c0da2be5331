//! Cleanup of uploaded grade rows
//!
//! Every spreadsheet row passes through [`sanitize_row`] before it is
//! written. The result is a document body ready for a merge write: the ID is
//! trimmed text, names are trimmed, and every recognized grade component
//! that was left blank holds [`MISSED_SENTINEL`]. Columns the sanitizer does
//! not recognize are carried through untouched.
//!
//! Inline grid edits use [`sanitize_edit`], which only marks the grade cells
//! the edit actually carried, so a merge leaves the rest of the stored row
//! alone.

use serde_json::{Map, Value};

use crate::grades::{
    is_blank, value_to_text, GradeField, FIRST_NAME_KEY, ID_NUMBER_KEY, LAST_NAME_KEY,
    MISSED_SENTINEL,
};

/// One parsed row, keyed by header name
pub type RawRow = Map<String, Value>;

/// A row that passed sanitization
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedRow {
    /// Trimmed student ID; also the document key
    pub id_number: String,
    /// Document body, including `idNumber`
    pub fields: Map<String, Value>,
}

/// Sanitize one row.
///
/// Returns `None` for rows without a usable student ID: a missing, `null`,
/// `false`, zero or blank `idNumber` cell.
pub fn sanitize_row(row: RawRow) -> Option<SanitizedRow> {
    clean(row, GradeFill::EveryField)
}

/// Sanitize a partial row from an inline edit.
///
/// Grade cells that were sent blank become [`MISSED_SENTINEL`]; grade
/// fields missing from the row stay missing.
pub fn sanitize_edit(row: RawRow) -> Option<SanitizedRow> {
    clean(row, GradeFill::SentFields)
}

#[derive(Clone, Copy, PartialEq)]
enum GradeFill {
    EveryField,
    SentFields,
}

fn clean(mut row: RawRow, fill: GradeFill) -> Option<SanitizedRow> {
    let id_number = row.get(ID_NUMBER_KEY).and_then(id_text)?;
    row.insert(ID_NUMBER_KEY.to_string(), Value::String(id_number.clone()));

    for key in [FIRST_NAME_KEY, LAST_NAME_KEY] {
        match row.get(key) {
            None => {},
            Some(Value::Null) => {
                row.remove(key);
            },
            Some(value) => {
                let trimmed = value_to_text(value).trim().to_string();
                row.insert(key.to_string(), Value::String(trimmed));
            },
        }
    }

    for field in GradeField::ALL {
        let cell = row.get(field.key());
        if fill == GradeFill::SentFields && cell.is_none() {
            continue;
        }
        if is_blank(cell) {
            row.insert(field.key().to_string(), Value::from(MISSED_SENTINEL));
        }
    }

    Some(SanitizedRow {
        id_number,
        fields: row,
    })
}

fn id_text(value: &Value) -> Option<String> {
    let present = match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    };
    if !present {
        return None;
    }

    let text = value_to_text(value).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_rows_without_id_are_skipped() {
        assert!(sanitize_row(row(json!({ "firstName": "John" }))).is_none());
        assert!(sanitize_row(row(json!({ "idNumber": "" }))).is_none());
        assert!(sanitize_row(row(json!({ "idNumber": "   " }))).is_none());
        assert!(sanitize_row(row(json!({ "idNumber": null }))).is_none());
        assert!(sanitize_row(row(json!({ "idNumber": 0 }))).is_none());
    }

    #[test]
    fn test_id_and_names_are_trimmed() {
        let sanitized = sanitize_row(row(json!({
            "idNumber": " 2022123456 ",
            "firstName": "  John ",
            "lastName": "Doe  ",
        })))
        .unwrap();

        assert_eq!(sanitized.id_number, "2022123456");
        assert_eq!(sanitized.fields["idNumber"], json!("2022123456"));
        assert_eq!(sanitized.fields["firstName"], json!("John"));
        assert_eq!(sanitized.fields["lastName"], json!("Doe"));
    }

    #[test]
    fn test_numeric_id_is_keyed_as_integer_text() {
        let sanitized = sanitize_row(row(json!({ "idNumber": 2022123456.0 }))).unwrap();
        assert_eq!(sanitized.id_number, "2022123456");
    }

    #[test]
    fn test_blank_grades_become_sentinel() {
        let sanitized = sanitize_row(row(json!({
            "idNumber": "2022123456",
            "quiz1": "",
            "quiz2": null,
            "midtermGrade": 2.5,
        })))
        .unwrap();

        for field in GradeField::ALL {
            let expected = if field == GradeField::MidtermGrade {
                json!(2.5)
            } else {
                json!(-1.0)
            };
            assert_eq!(sanitized.fields[field.key()], expected, "field {}", field);
        }
    }

    #[test]
    fn test_recorded_values_pass_through() {
        let sanitized = sanitize_row(row(json!({
            "idNumber": "1",
            "attendance": 0,
            "quiz3": 17,
            "prelim": "45",
            "remarks": "late enrollee",
        })))
        .unwrap();

        assert_eq!(sanitized.fields["attendance"], json!(0));
        assert_eq!(sanitized.fields["quiz3"], json!(17));
        assert_eq!(sanitized.fields["prelim"], json!("45"));
        assert_eq!(sanitized.fields["remarks"], json!("late enrollee"));
    }

    #[test]
    fn test_missing_names_are_not_invented() {
        let sanitized = sanitize_row(row(json!({ "idNumber": "7", "firstName": null }))).unwrap();
        assert!(!sanitized.fields.contains_key("firstName"));
        assert!(!sanitized.fields.contains_key("lastName"));
    }

    #[test]
    fn test_edit_marks_only_sent_grades() {
        let sanitized = sanitize_edit(row(json!({
            "idNumber": "1",
            "firstName": " Ana ",
            "quiz1": "",
            "midtermGrade": null,
            "attendance": 5,
        })))
        .unwrap();

        assert_eq!(sanitized.fields["firstName"], json!("Ana"));
        assert_eq!(sanitized.fields["quiz1"], json!(-1.0));
        assert_eq!(sanitized.fields["midtermGrade"], json!(-1.0));
        assert_eq!(sanitized.fields["attendance"], json!(5));
        for key in ["quiz2", "quiz4", "prelim", "assignment1", "activity1"] {
            assert!(!sanitized.fields.contains_key(key), "{} was filled", key);
        }
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_row(row(json!({
            "idNumber": " 42 ",
            "firstName": " Ana ",
            "quiz1": "",
            "midtermGrade": 1.75,
        })))
        .unwrap();
        let twice = sanitize_row(once.fields.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
