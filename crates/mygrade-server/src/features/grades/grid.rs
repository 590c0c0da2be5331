//! Grade grid state: search, sort, paging and column groups
//!
//! The grid lives in the URL query. Every admin grid view is rebuilt from a
//! [`GridQuery`] and the current class sheet, so links and live updates
//! always agree on what is shown.

use mygrade_common::grades::{value_to_text, FIRST_NAME_KEY, ID_NUMBER_KEY, LAST_NAME_KEY};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::api::response::PaginationMeta;
use crate::store::{Document, Fields};

pub const ROWS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    IdNumber,
    LastName,
    FirstName,
}

impl SortKey {
    pub fn key(self) -> &'static str {
        match self {
            SortKey::IdNumber => ID_NUMBER_KEY,
            SortKey::LastName => LAST_NAME_KEY,
            SortKey::FirstName => FIRST_NAME_KEY,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        [SortKey::IdNumber, SortKey::LastName, SortKey::FirstName]
            .into_iter()
            .find(|sort| sort.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnGroup {
    Base,
    Assessment,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridColumn {
    pub key: &'static str,
    pub header: &'static str,
    pub sortable: bool,
    pub group: ColumnGroup,
}

const fn column(key: &'static str, header: &'static str, group: ColumnGroup) -> GridColumn {
    GridColumn {
        key,
        header,
        sortable: false,
        group,
    }
}

const fn sortable(key: &'static str, header: &'static str) -> GridColumn {
    GridColumn {
        key,
        header,
        sortable: true,
        group: ColumnGroup::Base,
    }
}

pub const BASE_COLUMNS: [GridColumn; 4] = [
    sortable(ID_NUMBER_KEY, "ID Number"),
    sortable(LAST_NAME_KEY, "Last Name"),
    sortable(FIRST_NAME_KEY, "First Name"),
    column("attendance", "Attendance", ColumnGroup::Base),
];

pub const ASSESSMENT_COLUMNS: [GridColumn; 8] = [
    column("quiz1", "Quiz 1", ColumnGroup::Assessment),
    column("quiz2", "Quiz 2", ColumnGroup::Assessment),
    column("quiz3", "Quiz 3", ColumnGroup::Assessment),
    column("prelim", "Prelim", ColumnGroup::Assessment),
    column("PIT", "PIT", ColumnGroup::Assessment),
    column("laboratoryactivity1", "Lab Activity 1", ColumnGroup::Assessment),
    column("laboratoryactivity2", "Lab Activity 2", ColumnGroup::Assessment),
    column("laboratoryactivity3", "Lab Activity 3", ColumnGroup::Assessment),
];

pub const FINAL_COLUMNS: [GridColumn; 3] = [
    column("midtermwrittenexam", "Midterm Written", ColumnGroup::Final),
    column("midtermlabexam", "Midterm Lab Exam", ColumnGroup::Final),
    column("midtermGrade", "Midterm Grade", ColumnGroup::Final),
];

/// Grid state as carried in the query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridQuery {
    pub search: Option<String>,
    pub sort: Option<SortKey>,
    pub order: SortOrder,
    /// 1-based
    pub page: Option<usize>,
    /// Show the assessment column group
    pub assessments: bool,
}

impl GridQuery {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Clear search and sort; the column toggle is kept.
    pub fn reset(&self) -> Self {
        Self {
            assessments: self.assessments,
            ..Self::default()
        }
    }

    /// State after clicking the header of `sort`
    pub fn sorted_by(&self, sort: SortKey) -> Self {
        let order = match self.sort {
            Some(current) if current == sort => self.order.flipped(),
            _ => SortOrder::Asc,
        };
        Self {
            sort: Some(sort),
            order,
            page: None,
            ..self.clone()
        }
    }

    pub fn toggled_assessments(&self) -> Self {
        Self {
            assessments: !self.assessments,
            ..self.clone()
        }
    }

    pub fn at_page(&self, page: usize) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }

    pub fn columns(&self) -> Vec<GridColumn> {
        let mut columns = BASE_COLUMNS.to_vec();
        if self.assessments {
            columns.extend(ASSESSMENT_COLUMNS);
        }
        columns.extend(FINAL_COLUMNS);
        columns
    }

    /// URL query encoding, without the leading `?`
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(search) = self.search_term() {
            parts.push(format!("search={}", encode(search)));
        }
        if let Some(sort) = self.sort {
            parts.push(format!("sort={}", sort.key()));
            parts.push(format!("order={}", self.order.as_str()));
        }
        if let Some(page) = self.page.filter(|page| *page > 1) {
            parts.push(format!("page={}", page));
        }
        if self.assessments {
            parts.push("assessments=true".to_string());
        }
        parts.join("&")
    }
}

/// Minimal percent-encoding for query values
fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            },
            b' ' => "+".to_string(),
            other => format!("%{:02X}", other),
        })
        .collect()
}

/// One student row of the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub id_number: String,
    pub values: Fields,
}

impl GridRow {
    pub fn from_document(document: &Document) -> Self {
        Self {
            id_number: document.id.clone(),
            values: document.data.clone(),
        }
    }

    /// Text of a cell as stored; the key of the document stands in for a
    /// missing `idNumber`.
    pub fn cell(&self, key: &str) -> String {
        if key == ID_NUMBER_KEY {
            return self.id_number.clone();
        }
        self.values.get(key).map(value_to_text).unwrap_or_default()
    }

    fn matches(&self, needle: &str) -> bool {
        [ID_NUMBER_KEY, LAST_NAME_KEY, FIRST_NAME_KEY]
            .iter()
            .any(|key| self.cell(key).to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub columns: Vec<GridColumn>,
    pub rows: Vec<GridRow>,
    pub pagination: PaginationMeta,
    pub query: GridQuery,
}

/// Apply search, sort and paging to a class sheet.
pub fn build_grid(documents: &[Document], query: &GridQuery) -> GridView {
    let mut rows: Vec<GridRow> = documents.iter().map(GridRow::from_document).collect();

    if let Some(search) = query.search_term() {
        let needle = search.to_lowercase();
        rows.retain(|row| row.matches(&needle));
    }

    if let Some(sort) = query.sort {
        rows.sort_by(|a, b| {
            let ordering = compare_text(&a.cell(sort.key()), &b.cell(sort.key()));
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    let total = rows.len();
    let pages = total.div_ceil(ROWS_PER_PAGE).max(1);
    let page = query.page.unwrap_or(1).clamp(1, pages);
    let rows = rows
        .into_iter()
        .skip((page - 1) * ROWS_PER_PAGE)
        .take(ROWS_PER_PAGE)
        .collect();

    GridView {
        columns: query.columns(),
        rows,
        pagination: PaginationMeta::new(page, ROWS_PER_PAGE, total),
        query: query.clone(),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}
