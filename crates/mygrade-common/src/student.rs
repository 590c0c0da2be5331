//! Student snapshot kept in the browser session after a lookup
//!
//! The snapshot is a denormalized copy of one student document with every
//! grade component already coerced to a number. It is independent of the
//! backend once written: the detail view renders from it and never
//! re-fetches.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{MyGradeError, Result};
use crate::grades::{
    number_or_zero, value_to_text, GradeField, CLASS_ID_KEY, FIRST_NAME_KEY, ID_NUMBER_KEY,
    LAST_NAME_KEY,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSnapshot {
    pub id_number: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(flatten)]
    pub grades: BTreeMap<GradeField, f64>,
}

impl StudentSnapshot {
    /// Build a snapshot from a stored student document.
    ///
    /// `id_number` is the document key; names come from the document as
    /// stored. Grade components are coerced with a zero fallback.
    pub fn from_document(id_number: &str, data: &Map<String, Value>) -> Self {
        Self {
            id_number: id_number.to_string(),
            first_name: data.get(FIRST_NAME_KEY).map(value_to_text).unwrap_or_default(),
            last_name: data.get(LAST_NAME_KEY).map(value_to_text).unwrap_or_default(),
            class_id: data
                .get(CLASS_ID_KEY)
                .map(value_to_text)
                .filter(|class_id| !class_id.is_empty()),
            grades: normalized_grades(data),
        }
    }

    /// Rebuild a snapshot read back from session storage.
    ///
    /// # Errors
    ///
    /// Returns [`MyGradeError::InvalidSnapshot`] when the value is not an
    /// object or lacks a non-empty ID number, first name or last name.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| MyGradeError::InvalidSnapshot("snapshot is not an object".into()))?;

        let required = |key: &str| -> Result<String> {
            object
                .get(key)
                .filter(|value| is_truthy(value))
                .map(value_to_text)
                .ok_or_else(|| MyGradeError::InvalidSnapshot(format!("missing {}", key)))
        };

        Ok(Self {
            id_number: required(ID_NUMBER_KEY)?,
            first_name: required(FIRST_NAME_KEY)?,
            last_name: required(LAST_NAME_KEY)?,
            class_id: object
                .get(CLASS_ID_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
            grades: normalized_grades(object),
        })
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Numeric value of one grade component (zero when absent)
    pub fn grade(&self, field: GradeField) -> f64 {
        self.grades.get(&field).copied().unwrap_or(0.0)
    }

    pub fn midterm_grade(&self) -> f64 {
        self.grade(GradeField::MidtermGrade)
    }

    /// `LASTNAME, FIRSTNAME`
    pub fn display_name(&self) -> String {
        format!(
            "{}, {}",
            self.last_name.to_uppercase(),
            self.first_name.to_uppercase()
        )
    }
}

fn normalized_grades(data: &Map<String, Value>) -> BTreeMap<GradeField, f64> {
    GradeField::ALL
        .iter()
        .map(|field| (*field, number_or_zero(data.get(field.key()))))
        .collect()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}
