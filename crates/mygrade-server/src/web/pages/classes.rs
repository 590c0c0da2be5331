//! `/admin/classrecord`: the class roster

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use maud::{html, Markup};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::features::classes::commands::{
    create, delete, update, CreateClassCommand, CreateClassError, DeleteClassCommand,
    DeleteClassError, UpdateClassCommand, UpdateClassError, DELETE_CLASS_PROMPT,
};
use crate::features::classes::queries::{list, ListClassesError, ListClassesQuery};
use crate::features::classes::ClassRecord;
use crate::features::shared::ConfirmParams;
use crate::session;
use crate::web::layout::{confirm_dialog, message, page, PageOptions};

pub const ROSTER_PATH: &str = "/admin/classrecord";

#[derive(Debug, Default, Deserialize)]
pub struct RosterParams {
    pub search: Option<String>,
    /// Class shown as an inline edit form
    pub edit: Option<String>,
    /// Class awaiting delete confirmation
    pub delete: Option<String>,
}

/// What the page shows besides the list itself
#[derive(Default)]
struct RosterState<'a> {
    draft: Option<&'a CreateClassCommand>,
    edit_draft: Option<&'a UpdateClassCommand>,
    error: Option<String>,
    notice: Option<String>,
}

fn list_error(err: ListClassesError) -> AppError {
    match err {
        ListClassesError::Store(e) => AppError::Store(e),
    }
}

#[tracing::instrument(skip(state, session, params))]
pub async fn roster_page(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<RosterParams>,
) -> AppResult<Markup> {
    let notice = session::take_notice(&session).await?;
    render_roster(
        &state,
        &params,
        RosterState {
            notice,
            ..RosterState::default()
        },
    )
    .await
}

async fn render_roster(
    state: &AppState,
    params: &RosterParams,
    view: RosterState<'_>,
) -> AppResult<Markup> {
    let query = ListClassesQuery {
        search: params.search.clone(),
    };
    let response = list::handle(state.store.as_ref(), query)
        .await
        .map_err(list_error)?;

    let options = PageOptions {
        inactivity: Some(state.activity.timeout()),
        live: Some("/api/v1/classes/live".to_string()),
        admin_nav: true,
        ..PageOptions::default()
    };
    let draft = view.draft.cloned().unwrap_or_default();
    let search = params.search.clone().unwrap_or_default();

    Ok(page(
        "Class Records",
        &options,
        html! {
            h1 { "Class Records" }
            (message(view.notice.as_deref(), "success"))

            @if let Some(class_id) = &params.delete {
                (confirm_dialog(
                    DELETE_CLASS_PROMPT,
                    &format!("{}/{}/delete", ROSTER_PATH, class_id),
                    ROSTER_PATH,
                ))
            }

            h2 { "Add Class" }
            form.toolbar method="post" action=(ROSTER_PATH) {
                input type="text" name="courseCode" placeholder="Course code" value=(draft.course_code);
                input type="text" name="subjectName" placeholder="Subject name" value=(draft.subject_name);
                input type="text" name="yearSection" placeholder="Year & section" value=(draft.year_section);
                button type="submit" { "Add" }
            }
            (message(view.error.as_deref(), "error"))

            form.toolbar method="get" action=(ROSTER_PATH) {
                input type="search" name="search" placeholder="Search classes" value=(search);
                button.secondary type="submit" { "Search" }
            }

            table {
                thead {
                    tr { th { "Course Code" } th { "Subject" } th { "Year & Section" } th { "Actions" } }
                }
                tbody {
                    @if response.classes.is_empty() {
                        tr { td colspan="4" { "No classes found." } }
                    }
                    @for class in &response.classes {
                        @if params.edit.as_deref() == Some(class.id.as_str()) {
                            (edit_row(class, view.edit_draft))
                        } @else {
                            tr {
                                td { (class.course_code) }
                                td { (class.subject_name) }
                                td { (class.year_section) }
                                td {
                                    a.button href={ (ROSTER_PATH) "/" (class.id) } { "Open" }
                                    " "
                                    a.button.secondary href={ (ROSTER_PATH) "?edit=" (class.id) } { "Edit" }
                                    " "
                                    a.button.secondary href={ (ROSTER_PATH) "?delete=" (class.id) } { "Delete" }
                                }
                            }
                        }
                    }
                }
            }
            p { (response.total) " class(es)" }
        },
    ))
}

fn edit_row(class: &ClassRecord, draft: Option<&UpdateClassCommand>) -> Markup {
    let (course_code, subject_name, year_section) = match draft {
        Some(draft) => (&draft.course_code, &draft.subject_name, &draft.year_section),
        None => (&class.course_code, &class.subject_name, &class.year_section),
    };
    let form_id = format!("edit-{}", class.id);

    html! {
        tr data-editing {
            td { input type="text" name="courseCode" form=(form_id) value=(course_code); }
            td { input type="text" name="subjectName" form=(form_id) value=(subject_name); }
            td { input type="text" name="yearSection" form=(form_id) value=(year_section); }
            td {
                form id=(form_id) method="post" action={ (ROSTER_PATH) "/" (class.id) "/edit" } {
                    button type="submit" { "Save" }
                    " "
                    a.button.secondary href=(ROSTER_PATH) { "Cancel" }
                }
            }
        }
    }
}

#[tracing::instrument(skip(state, session, command))]
pub async fn create_class(
    State(state): State<AppState>,
    session: Session,
    Form(command): Form<CreateClassCommand>,
) -> AppResult<Response> {
    match create::handle(state.store.as_ref(), command.clone()).await {
        Ok(_) => {
            session::set_notice(&session, "Class added.").await?;
            Ok(Redirect::to(ROSTER_PATH).into_response())
        },
        Err(CreateClassError::Validation(e)) => {
            let view = RosterState {
                draft: Some(&command),
                error: Some(e.to_string()),
                ..RosterState::default()
            };
            Ok(render_roster(&state, &RosterParams::default(), view)
                .await?
                .into_response())
        },
        Err(CreateClassError::Store(e)) => Err(e.into()),
    }
}

#[tracing::instrument(skip(state, session, command), fields(class_id = %class_id))]
pub async fn update_class(
    State(state): State<AppState>,
    session: Session,
    Path(class_id): Path<String>,
    Form(mut command): Form<UpdateClassCommand>,
) -> AppResult<Response> {
    command.class_id = class_id.clone();

    match update::handle(state.store.as_ref(), command.clone()).await {
        Ok(_) => {
            session::set_notice(&session, "Class updated.").await?;
            Ok(Redirect::to(ROSTER_PATH).into_response())
        },
        Err(UpdateClassError::Validation(e)) => {
            let params = RosterParams {
                edit: Some(class_id),
                ..RosterParams::default()
            };
            let view = RosterState {
                edit_draft: Some(&command),
                error: Some(e.to_string()),
                ..RosterState::default()
            };
            Ok(render_roster(&state, &params, view).await?.into_response())
        },
        Err(UpdateClassError::NotFound(id)) => {
            Err(AppError::NotFound(format!("Class '{}' not found", id)))
        },
        Err(UpdateClassError::Store(e)) => Err(e.into()),
    }
}

#[tracing::instrument(skip(state, session), fields(class_id = %class_id))]
pub async fn delete_class(
    State(state): State<AppState>,
    session: Session,
    Path(class_id): Path<String>,
    Form(params): Form<ConfirmParams>,
) -> AppResult<Response> {
    let command = DeleteClassCommand {
        class_id: class_id.clone(),
        confirmed: params.confirm,
    };

    match delete::handle(state.store.as_ref(), command).await {
        Ok(response) => {
            tracing::info!(students_deleted = response.students_deleted, "Class deleted");
            session::set_notice(&session, "Class deleted.").await?;
            Ok(Redirect::to(ROSTER_PATH).into_response())
        },
        Err(DeleteClassError::ConfirmationRequired) => {
            Ok(Redirect::to(&format!("{}?delete={}", ROSTER_PATH, class_id)).into_response())
        },
        Err(DeleteClassError::NotFound(id)) => {
            Err(AppError::NotFound(format!("Class '{}' not found", id)))
        },
        Err(DeleteClassError::Store(e)) => Err(e.into()),
    }
}
