//! Weighted breakdown of a saved student record
//!
//! The weights are printed labels; nothing is computed from them.

use mygrade_common::{
    grades::{GradeField, GradeStanding, ScoreDisplay},
    student::StudentSnapshot,
};
use serde::Serialize;

use crate::features::lookup::Celebration;

/// Length of the celebratory effect on a passing record
pub const RECORD_CELEBRATION_MS: u64 = 10_000;

type Layout = &'static [(&'static str, &'static [(GradeField, &'static str)])];

const LECTURE: Layout = &[
    ("20%", &[(GradeField::Attendance, "Attendance")]),
    (
        "40%",
        &[
            (GradeField::Quiz1, "Quiz 1"),
            (GradeField::Quiz2, "Quiz 2"),
            (GradeField::Quiz3, "Quiz 3"),
            (GradeField::Quiz4, "Quiz 4"),
            (GradeField::Prelim, "Prelim"),
        ],
    ),
    ("40%", &[(GradeField::MidtermWrittenExam, "Midterm Exam")]),
];

const LABORATORY: Layout = &[
    ("30%", &[(GradeField::Assignment1, "Assignment 1")]),
    ("30%", &[(GradeField::Activity1, "Activity 1")]),
    ("40%", &[(GradeField::MidtermLabExam, "Midterm Lab Exam")]),
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScore {
    pub field: GradeField,
    pub label: &'static str,
    /// "Missed" or the score as stored
    pub display: String,
    pub missed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightGroup {
    pub weight: &'static str,
    pub components: Vec<ComponentScore>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownCategory {
    pub name: &'static str,
    pub weight: &'static str,
    pub groups: Vec<WeightGroup>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    /// `LASTNAME, FIRSTNAME`
    pub display_name: String,
    pub id_number: String,
    pub midterm_grade: String,
    pub standing: GradeStanding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub celebration: Option<Celebration>,
    pub categories: Vec<BreakdownCategory>,
}

impl RecordView {
    pub fn from_snapshot(snapshot: &StudentSnapshot) -> Self {
        let grade = snapshot.midterm_grade();
        let standing = GradeStanding::from_grade(grade);

        Self {
            display_name: snapshot.display_name(),
            id_number: snapshot.id_number.clone(),
            midterm_grade: format!("{:.2}", grade),
            standing,
            celebration: standing.is_passing().then_some(Celebration {
                duration_ms: RECORD_CELEBRATION_MS,
            }),
            categories: vec![
                category("Lecture", "67%", LECTURE, snapshot),
                category("Laboratory", "33%", LABORATORY, snapshot),
            ],
        }
    }
}

fn category(
    name: &'static str,
    weight: &'static str,
    layout: Layout,
    snapshot: &StudentSnapshot,
) -> BreakdownCategory {
    let groups = layout
        .iter()
        .map(|&(weight, components)| WeightGroup {
            weight,
            components: components
                .iter()
                .map(|&(field, label)| {
                    let score = ScoreDisplay::from_score(snapshot.grade(field));
                    ComponentScore {
                        field,
                        label,
                        display: score.to_string(),
                        missed: score.is_missed(),
                    }
                })
                .collect(),
        })
        .collect();

    BreakdownCategory {
        name,
        weight,
        groups,
    }
}
