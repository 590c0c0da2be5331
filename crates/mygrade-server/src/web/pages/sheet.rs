//! `/admin/classrecord/:class_id`: one class's grade sheet
//!
//! The grid state (search, sort, page, assessment columns) travels in the
//! query string so every link and form keeps it. `?edit=` opens a row for
//! inline editing and `?delete=` asks for confirmation.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use maud::{html, Markup};
use mygrade_common::grades::{GradeField, ID_NUMBER_KEY};
use mygrade_common::sanitize::RawRow;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tower_sessions::Session;

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::features::grades::commands::{
    delete_row, edit_row, upload, DeleteRowCommand, DeleteRowError, EditRowCommand, EditRowError,
    UploadGradesCommand, UploadGradesError,
};
use crate::features::grades::grid::{ColumnGroup, GridColumn, GridQuery, GridView, SortKey, SortOrder};
use crate::features::grades::queries::{list_rows, ListRowsError, ListRowsQuery, ListRowsResponse};
use crate::features::grades::routes::read_file_field;
use crate::features::shared::ConfirmParams;
use crate::session;
use crate::web::layout::{confirm_dialog, message, page, PageOptions};
use crate::web::pages::classes::ROSTER_PATH;

#[derive(Debug, Default, Deserialize)]
pub struct SheetParams {
    pub edit: Option<String>,
    pub delete: Option<String>,
}

fn sheet_path(class_id: &str) -> String {
    format!("{}/{}", ROSTER_PATH, class_id)
}

fn sheet_url(class_id: &str, grid: &GridQuery, extra: Option<(&str, &str)>) -> String {
    let mut query = grid.to_query_string();
    if let Some((key, value)) = extra {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&format!("{}={}", key, value));
    }
    if query.is_empty() {
        sheet_path(class_id)
    } else {
        format!("{}?{}", sheet_path(class_id), query)
    }
}

fn list_error(err: ListRowsError) -> AppError {
    match err {
        ListRowsError::ClassNotFound(id) => AppError::NotFound(format!("Class '{}' not found", id)),
        ListRowsError::Store(e) => AppError::Store(e),
    }
}

#[tracing::instrument(skip(state, session, grid, params), fields(class_id = %class_id))]
pub async fn sheet_page(
    State(state): State<AppState>,
    session: Session,
    Path(class_id): Path<String>,
    Query(grid): Query<GridQuery>,
    Query(params): Query<SheetParams>,
) -> AppResult<Markup> {
    let notice = session::take_notice(&session).await?;

    let prompt = match &params.delete {
        Some(id_number) => delete_prompt(&state, &class_id, id_number).await?,
        None => None,
    };

    render_sheet(&state, &class_id, grid, &params, notice, None, prompt).await
}

/// The confirmation text for deleting a row, or `None` when the row is gone
async fn delete_prompt(
    state: &AppState,
    class_id: &str,
    id_number: &str,
) -> AppResult<Option<String>> {
    let command = DeleteRowCommand {
        class_id: class_id.to_string(),
        id_number: id_number.to_string(),
        confirmed: false,
    };
    match delete_row::handle(state.store.as_ref(), command).await {
        Err(DeleteRowError::ConfirmationRequired { prompt }) => Ok(Some(prompt)),
        Err(DeleteRowError::NotFound(_)) => Ok(None),
        Err(DeleteRowError::Store(e)) => Err(e.into()),
        Ok(_) => Ok(None),
    }
}

async fn render_sheet(
    state: &AppState,
    class_id: &str,
    grid: GridQuery,
    params: &SheetParams,
    notice: Option<String>,
    error: Option<String>,
    prompt: Option<String>,
) -> AppResult<Markup> {
    let query = ListRowsQuery {
        class_id: class_id.to_string(),
        grid,
    };
    let sheet = list_rows::handle(state.store.as_ref(), query)
        .await
        .map_err(list_error)?;

    let live = format!(
        "/api/v1/classes/{}/students/live?{}",
        class_id,
        sheet.grid.query.to_query_string()
    );
    let options = PageOptions {
        inactivity: Some(state.activity.timeout()),
        live: Some(live),
        admin_nav: true,
        ..PageOptions::default()
    };

    Ok(page(
        &sheet.header,
        &options,
        html! {
            p { a href=(ROSTER_PATH) { "← Class Records" } }
            h1 { (sheet.header) }
            p { (sheet.class.subject_name) }
            (message(notice.as_deref(), "success"))
            (message(error.as_deref(), "error"))

            @if let (Some(id_number), Some(prompt)) = (&params.delete, &prompt) {
                (confirm_dialog(
                    prompt,
                    &format!("{}/rows/{}/delete", sheet_path(class_id), id_number),
                    &sheet_url(class_id, &sheet.grid.query, None),
                ))
            }

            form.toolbar method="post" action={ (sheet_path(class_id)) "/upload" } enctype="multipart/form-data" {
                input type="file" name="file" accept=".xlsx,.xls,.ods";
                button type="submit" { "Upload Grades" }
            }

            (toolbar(class_id, &sheet.grid.query))
            (grid_table(class_id, &sheet, params.edit.as_deref()))
            (pager(class_id, &sheet.grid))
        },
    ))
}

fn toolbar(class_id: &str, grid: &GridQuery) -> Markup {
    let toggle_label = if grid.assessments {
        "Hide Assessments"
    } else {
        "Show Assessments"
    };

    html! {
        form.toolbar method="get" action=(sheet_path(class_id)) {
            input type="search" name="search" placeholder="Search ID or name" value=(grid.search.clone().unwrap_or_default());
            @if let Some(sort) = grid.sort {
                input type="hidden" name="sort" value=(sort.key());
                input type="hidden" name="order" value=(grid.order.as_str());
            }
            @if grid.assessments {
                input type="hidden" name="assessments" value="true";
            }
            button.secondary type="submit" { "Search" }
            a.button.secondary href=(sheet_url(class_id, &grid.reset(), None)) { "Reset" }
            a.button.secondary href=(sheet_url(class_id, &grid.toggled_assessments(), None)) { (toggle_label) }
        }
    }
}

fn group_spans(columns: &[GridColumn]) -> Vec<(&'static str, usize)> {
    let mut spans: Vec<(ColumnGroup, usize)> = Vec::new();
    for column in columns {
        match spans.last_mut() {
            Some((group, count)) if *group == column.group => *count += 1,
            _ => spans.push((column.group, 1)),
        }
    }
    spans
        .into_iter()
        .map(|(group, count)| {
            let label = match group {
                ColumnGroup::Base => "Student",
                ColumnGroup::Assessment => "Assessments",
                ColumnGroup::Final => "Midterm",
            };
            (label, count)
        })
        .collect()
}

fn header_cell(class_id: &str, grid: &GridQuery, column: &GridColumn) -> Markup {
    let sort = SortKey::from_key(column.key).filter(|_| column.sortable);
    html! {
        th {
            @if let Some(sort) = sort {
                a href=(sheet_url(class_id, &grid.sorted_by(sort), None)) {
                    (column.header)
                    @if grid.sort == Some(sort) {
                        @match grid.order {
                            SortOrder::Asc => { " ▲" }
                            SortOrder::Desc => { " ▼" }
                        }
                    }
                }
            } @else {
                (column.header)
            }
        }
    }
}

fn grid_table(class_id: &str, sheet: &ListRowsResponse, editing: Option<&str>) -> Markup {
    let grid = &sheet.grid;
    let row_form = |id_number: &str| format!("row-{}", id_number);

    html! {
        table {
            thead {
                tr {
                    @for (label, span) in group_spans(&grid.columns) {
                        th.group colspan=(span) { (label) }
                    }
                    th.group rowspan="2" { "Actions" }
                }
                tr {
                    @for column in &grid.columns {
                        (header_cell(class_id, &grid.query, column))
                    }
                }
            }
            tbody {
                @if grid.rows.is_empty() {
                    tr { td colspan=(grid.columns.len() + 1) { "No students found." } }
                }
                @for row in &grid.rows {
                    @if editing == Some(row.id_number.as_str()) {
                        tr data-editing {
                            @for column in &grid.columns {
                                td {
                                    @if column.key == ID_NUMBER_KEY {
                                        (row.id_number)
                                    } @else {
                                        input type="text" name=(column.key) form=(row_form(&row.id_number)) value=(row.cell(column.key));
                                    }
                                }
                            }
                            td {
                                form id=(row_form(&row.id_number)) method="post"
                                    action={ (sheet_path(class_id)) "/rows/" (row.id_number) "?" (grid.query.to_query_string()) } {
                                    button type="submit" { "Save" }
                                    " "
                                    a.button.secondary href=(sheet_url(class_id, &grid.query, None)) { "Cancel" }
                                }
                            }
                        }
                    } @else {
                        tr {
                            @for column in &grid.columns {
                                td { (row.cell(column.key)) }
                            }
                            td {
                                a.button.secondary href=(sheet_url(class_id, &grid.query, Some(("edit", &row.id_number)))) { "Edit" }
                                " "
                                a.button.secondary href=(sheet_url(class_id, &grid.query, Some(("delete", &row.id_number)))) { "Delete" }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn pager(class_id: &str, grid: &GridView) -> Markup {
    let pagination = &grid.pagination;
    html! {
        div.pager {
            @if pagination.has_prev {
                a.button.secondary href=(sheet_url(class_id, &grid.query.at_page(pagination.page - 1), None)) { "Previous" }
            }
            span { "Page " (pagination.page) " of " (pagination.pages.max(1)) " (" (pagination.total) " students)" }
            @if pagination.has_next {
                a.button.secondary href=(sheet_url(class_id, &grid.query.at_page(pagination.page + 1), None)) { "Next" }
            }
        }
    }
}

#[tracing::instrument(skip(state, session, multipart), fields(class_id = %class_id))]
pub async fn upload_sheet(
    State(state): State<AppState>,
    session: Session,
    Path(class_id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let (file_name, bytes) = match read_file_field(&mut multipart).await {
        Ok(file) => file.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Unreadable multipart upload: {}", e);
            return upload_failed(&state, &class_id, "Could not read the uploaded file.").await;
        },
    };

    let command = UploadGradesCommand {
        class_id: class_id.clone(),
        file_name,
        bytes,
    };

    match upload::handle(state.store.as_ref(), command).await {
        Ok(response) => {
            session::set_notice(&session, &response.message).await?;
            Ok(Redirect::to(&sheet_path(&class_id)).into_response())
        },
        Err(UploadGradesError::ClassNotFound(id)) => {
            Err(AppError::NotFound(format!("Class '{}' not found", id)))
        },
        Err(UploadGradesError::Store { source, uploaded }) => {
            tracing::error!(uploaded, "Grade upload aborted part-way: {}", source);
            upload_failed(&state, &class_id, "Database error.").await
        },
        Err(e) => upload_failed(&state, &class_id, &e.to_string()).await,
    }
}

async fn upload_failed(state: &AppState, class_id: &str, error: &str) -> AppResult<Response> {
    let markup = render_sheet(
        state,
        class_id,
        GridQuery::default(),
        &SheetParams::default(),
        None,
        Some(error.to_string()),
        None,
    )
    .await?;
    Ok(markup.into_response())
}

/// Form values of an edited row; finite numeric grade entries are stored as
/// numbers, anything else as the text that was typed.
fn form_row(form: HashMap<String, String>) -> RawRow {
    form.into_iter()
        .map(|(key, text)| {
            let number = GradeField::from_key(&key)
                .and_then(|_| text.trim().parse::<f64>().ok())
                .filter(|number| number.is_finite());
            let value = match number {
                Some(number) => Value::from(number),
                None => Value::String(text),
            };
            (key, value)
        })
        .collect()
}

#[tracing::instrument(skip(state, session, grid, form), fields(class_id = %class_id, id_number = %id_number))]
pub async fn edit_sheet_row(
    State(state): State<AppState>,
    session: Session,
    Path((class_id, id_number)): Path<(String, String)>,
    Query(grid): Query<GridQuery>,
    Form(form): Form<HashMap<String, String>>,
) -> AppResult<Redirect> {
    let command = EditRowCommand {
        class_id: class_id.clone(),
        id_number,
        fields: form_row(form),
    };

    match edit_row::handle(state.store.as_ref(), command).await {
        Ok(_) => session::set_notice(&session, "Row saved.").await?,
        Err(EditRowError::MissingId) => {
            return Err(AppError::Validation("Student ID is required.".to_string()))
        },
        Err(EditRowError::Store(e)) => return Err(e.into()),
    }

    Ok(Redirect::to(&sheet_url(&class_id, &grid, None)))
}

#[tracing::instrument(skip(state, session, params), fields(class_id = %class_id, id_number = %id_number))]
pub async fn delete_sheet_row(
    State(state): State<AppState>,
    session: Session,
    Path((class_id, id_number)): Path<(String, String)>,
    Form(params): Form<ConfirmParams>,
) -> AppResult<Redirect> {
    let command = DeleteRowCommand {
        class_id: class_id.clone(),
        id_number: id_number.clone(),
        confirmed: params.confirm,
    };

    match delete_row::handle(state.store.as_ref(), command).await {
        Ok(_) => session::set_notice(&session, "Row deleted.").await?,
        Err(DeleteRowError::ConfirmationRequired { .. }) => {
            return Ok(Redirect::to(&format!("{}?delete={}", sheet_path(&class_id), id_number)))
        },
        Err(DeleteRowError::NotFound(id)) => {
            return Err(AppError::NotFound(format!("Student '{}' not found in this class", id)))
        },
        Err(DeleteRowError::Store(e)) => return Err(e.into()),
    }

    Ok(Redirect::to(&sheet_path(&class_id)))
}
