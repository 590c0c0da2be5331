//! Grade-component fields, numeric coercion and display rules
//!
//! Grade documents are schemaless, so every value read back from storage is
//! a `serde_json::Value` that may be a number, a numeric string, blank, or
//! missing altogether. The helpers here turn those values into numbers and
//! into the strings shown to students and administrators.
//!
//! The grading scale is inverted: lower is better. A midterm grade below
//! [`PASSING_THRESHOLD`] passes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stored in place of any grade component that was not recorded.
pub const MISSED_SENTINEL: f64 = -1.0;

/// Midterm grades strictly below this value pass.
pub const PASSING_THRESHOLD: f64 = 3.25;

/// Lookup results at or below this value get the celebratory effect.
pub const CELEBRATION_THRESHOLD: f64 = 3.0;

/// Document key of the student ID number.
pub const ID_NUMBER_KEY: &str = "idNumber";

/// Document key of the student's first name.
pub const FIRST_NAME_KEY: &str = "firstName";

/// Document key of the student's last name.
pub const LAST_NAME_KEY: &str = "lastName";

/// Document key of the owning class on flat student records.
pub const CLASS_ID_KEY: &str = "classId";

/// A recognized grade-component column.
///
/// Two sheet layouts exist in practice: the lecture layout (quiz 1-4,
/// assignment and activity) and the laboratory layout (quiz 1-3, PIT and
/// three laboratory activities). Both share attendance, prelim, the midterm
/// exams and the midterm grade. The union is recognized everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeField {
    #[serde(rename = "attendance")]
    Attendance,
    #[serde(rename = "quiz1")]
    Quiz1,
    #[serde(rename = "quiz2")]
    Quiz2,
    #[serde(rename = "quiz3")]
    Quiz3,
    #[serde(rename = "quiz4")]
    Quiz4,
    #[serde(rename = "prelim")]
    Prelim,
    #[serde(rename = "PIT")]
    Pit,
    #[serde(rename = "midtermwrittenexam")]
    MidtermWrittenExam,
    #[serde(rename = "assignment1")]
    Assignment1,
    #[serde(rename = "activity1")]
    Activity1,
    #[serde(rename = "laboratoryactivity1")]
    LaboratoryActivity1,
    #[serde(rename = "laboratoryactivity2")]
    LaboratoryActivity2,
    #[serde(rename = "laboratoryactivity3")]
    LaboratoryActivity3,
    #[serde(rename = "midtermlabexam")]
    MidtermLabExam,
    #[serde(rename = "midtermGrade")]
    MidtermGrade,
}

impl GradeField {
    /// Every recognized grade component, in sheet order.
    pub const ALL: [GradeField; 15] = [
        GradeField::Attendance,
        GradeField::Quiz1,
        GradeField::Quiz2,
        GradeField::Quiz3,
        GradeField::Quiz4,
        GradeField::Prelim,
        GradeField::Pit,
        GradeField::MidtermWrittenExam,
        GradeField::Assignment1,
        GradeField::Activity1,
        GradeField::LaboratoryActivity1,
        GradeField::LaboratoryActivity2,
        GradeField::LaboratoryActivity3,
        GradeField::MidtermLabExam,
        GradeField::MidtermGrade,
    ];

    /// Document key / spreadsheet header for this component
    pub fn key(self) -> &'static str {
        match self {
            GradeField::Attendance => "attendance",
            GradeField::Quiz1 => "quiz1",
            GradeField::Quiz2 => "quiz2",
            GradeField::Quiz3 => "quiz3",
            GradeField::Quiz4 => "quiz4",
            GradeField::Prelim => "prelim",
            GradeField::Pit => "PIT",
            GradeField::MidtermWrittenExam => "midtermwrittenexam",
            GradeField::Assignment1 => "assignment1",
            GradeField::Activity1 => "activity1",
            GradeField::LaboratoryActivity1 => "laboratoryactivity1",
            GradeField::LaboratoryActivity2 => "laboratoryactivity2",
            GradeField::LaboratoryActivity3 => "laboratoryactivity3",
            GradeField::MidtermLabExam => "midtermlabexam",
            GradeField::MidtermGrade => "midtermGrade",
        }
    }

    /// Human-readable column header
    pub fn label(self) -> &'static str {
        match self {
            GradeField::Attendance => "Attendance",
            GradeField::Quiz1 => "Quiz 1",
            GradeField::Quiz2 => "Quiz 2",
            GradeField::Quiz3 => "Quiz 3",
            GradeField::Quiz4 => "Quiz 4",
            GradeField::Prelim => "Prelim",
            GradeField::Pit => "PIT",
            GradeField::MidtermWrittenExam => "Midterm Written",
            GradeField::Assignment1 => "Assignment 1",
            GradeField::Activity1 => "Activity 1",
            GradeField::LaboratoryActivity1 => "Lab Activity 1",
            GradeField::LaboratoryActivity2 => "Lab Activity 2",
            GradeField::LaboratoryActivity3 => "Lab Activity 3",
            GradeField::MidtermLabExam => "Midterm Lab Exam",
            GradeField::MidtermGrade => "Midterm Grade",
        }
    }

    /// Look a component up by its document key (case-sensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }
}

impl fmt::Display for GradeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Numeric coercion of a stored value.
///
/// Follows the loose conversion the original data was written with:
/// a missing value has no number, `null` and blank strings are zero,
/// booleans are 0/1, numeric strings are parsed after trimming, and
/// anything else has no number.
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Null => Some(0.0),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
        },
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric coercion with a zero fallback for values that have no number.
pub fn number_or_zero(value: Option<&Value>) -> f64 {
    coerce_number(value).unwrap_or(0.0)
}

/// Whether a value counts as "not provided" on upload.
///
/// Only missing, `null`, and the empty string qualify; whitespace and zero
/// are real values.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Pass/fail classification of a midterm grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStanding {
    Passing,
    Failing,
}

impl GradeStanding {
    pub fn from_grade(grade: f64) -> Self {
        if grade < PASSING_THRESHOLD {
            GradeStanding::Passing
        } else {
            GradeStanding::Failing
        }
    }

    pub fn is_passing(self) -> bool {
        matches!(self, GradeStanding::Passing)
    }
}

/// How a single grade component is shown
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreDisplay {
    /// The component holds the "not recorded" sentinel
    Missed,
    Score(f64),
}

impl ScoreDisplay {
    pub fn from_score(score: f64) -> Self {
        if score == MISSED_SENTINEL {
            ScoreDisplay::Missed
        } else {
            ScoreDisplay::Score(score)
        }
    }

    pub fn is_missed(self) -> bool {
        matches!(self, ScoreDisplay::Missed)
    }
}

impl fmt::Display for ScoreDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreDisplay::Missed => f.write_str("Missed"),
            ScoreDisplay::Score(score) => write!(f, "{}", score),
        }
    }
}

/// Text form of a cell value used as a document key.
///
/// Integral numbers print without a fractional part so that an ID typed into
/// a numeric spreadsheet cell (`2022123456.0`) keys the same document as the
/// same ID typed as text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => match number.as_f64() {
            Some(n) if number.is_f64() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", n as i64)
            },
            _ => number.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_keys_round_trip() {
        for field in GradeField::ALL {
            assert_eq!(GradeField::from_key(field.key()), Some(field));
        }
        assert_eq!(GradeField::from_key("pit"), None);
        assert_eq!(GradeField::from_key("idNumber"), None);
    }

    #[test]
    fn test_field_serde_uses_document_keys() {
        assert_eq!(serde_json::to_value(GradeField::Pit).unwrap(), json!("PIT"));
        assert_eq!(
            serde_json::from_value::<GradeField>(json!("midtermGrade")).unwrap(),
            GradeField::MidtermGrade
        );
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(None), None);
        assert_eq!(coerce_number(Some(&json!(null))), Some(0.0));
        assert_eq!(coerce_number(Some(&json!(""))), Some(0.0));
        assert_eq!(coerce_number(Some(&json!(" 2.5 "))), Some(2.5));
        assert_eq!(coerce_number(Some(&json!(-1))), Some(-1.0));
        assert_eq!(coerce_number(Some(&json!(true))), Some(1.0));
        assert_eq!(coerce_number(Some(&json!("absent"))), None);
        assert_eq!(coerce_number(Some(&json!([1]))), None);
    }

    #[test]
    fn test_number_or_zero_keeps_sentinel() {
        assert_eq!(number_or_zero(Some(&json!(-1))), -1.0);
        assert_eq!(number_or_zero(Some(&json!("n/a"))), 0.0);
        assert_eq!(number_or_zero(None), 0.0);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!(null))));
        assert!(is_blank(Some(&json!(""))));
        assert!(!is_blank(Some(&json!(" "))));
        assert!(!is_blank(Some(&json!(0))));
    }

    #[test]
    fn test_standing_threshold() {
        assert_eq!(GradeStanding::from_grade(3.0), GradeStanding::Passing);
        assert_eq!(GradeStanding::from_grade(3.24), GradeStanding::Passing);
        assert_eq!(GradeStanding::from_grade(3.25), GradeStanding::Failing);
        assert_eq!(GradeStanding::from_grade(5.0), GradeStanding::Failing);
    }

    #[test]
    fn test_score_display() {
        assert_eq!(ScoreDisplay::from_score(-1.0).to_string(), "Missed");
        assert_eq!(ScoreDisplay::from_score(85.0).to_string(), "85");
        assert_eq!(ScoreDisplay::from_score(2.5).to_string(), "2.5");
        assert_eq!(ScoreDisplay::from_score(0.0).to_string(), "0");
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!(2022123456.0)), "2022123456");
        assert_eq!(value_to_text(&json!(2022123456)), "2022123456");
        assert_eq!(value_to_text(&json!(12.5)), "12.5");
        assert_eq!(value_to_text(&json!(" 2022-0001 ")), " 2022-0001 ");
        assert_eq!(value_to_text(&json!(true)), "true");
    }
}
