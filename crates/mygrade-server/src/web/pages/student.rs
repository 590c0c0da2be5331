//! Public pages: the lookup form and the saved record view

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use maud::{html, Markup};
use tower_sessions::Session;

use crate::api::AppState;
use crate::error::AppResult;
use crate::features::lookup::queries::find_student::{
    self, FindStudentError, FindStudentQuery, FindStudentResponse, RECORD_PATH,
};
use crate::features::record::{viewer, RecordView, LOOKUP_PATH};
use crate::session::ActivityKind;
use crate::web::layout::{message, page, PageOptions};

pub async fn lookup_page() -> Markup {
    render_lookup(&FindStudentQuery::default(), None, None)
}

#[tracing::instrument(skip(state, session, form), fields(id_number = %form.id_number.trim()))]
pub async fn lookup_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<FindStudentQuery>,
) -> AppResult<Markup> {
    match find_student::handle(state.store.as_ref(), form.clone()).await {
        Ok(found) => {
            viewer::open(&state, &session, &found.student).await?;
            Ok(render_lookup(&form, Some(&found), None))
        },
        Err(e) => {
            if let FindStudentError::Store(ref source) = e {
                tracing::error!("Database error during lookup: {}", source);
            }
            Ok(render_lookup(&form, None, Some(&e.to_string())))
        },
    }
}

fn render_lookup(
    form: &FindStudentQuery,
    found: Option<&FindStudentResponse>,
    error: Option<&str>,
) -> Markup {
    let options = PageOptions {
        celebration: found.and_then(|found| found.grade.celebration),
        ..PageOptions::default()
    };

    page(
        "Grade Lookup",
        &options,
        html! {
            h1 { "MyGrade" }
            p { "Enter your name and student ID to see your midterm grade." }
            form.stack method="post" action="/" {
                input type="text" name="firstName" placeholder="First name" value=(form.first_name);
                input type="text" name="lastName" placeholder="Last name" value=(form.last_name);
                input type="text" name="idNumber" placeholder="ID number" value=(form.id_number);
                button type="submit" { "Check Grade" }
            }
            (message(error, "error"))
            @if let Some(found) = found {
                section.result {
                    h2 { (found.student.display_name()) }
                    p.grade.passing[found.grade.standing.is_passing()].failing[!found.grade.standing.is_passing()] {
                        (found.grade.value)
                    }
                    a.button href=(found.record_url) { "View Record" }
                }
            }
        },
    )
}

/// `/viewrecord`: the breakdown of the saved snapshot, or back to the
/// lookup form when there is none.
#[tracing::instrument(skip(state, session))]
pub async fn record_page(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let Some(snapshot) = viewer::current(&state, &session, ActivityKind::Click).await? else {
        return Ok(Redirect::to(LOOKUP_PATH).into_response());
    };

    let view = RecordView::from_snapshot(&snapshot);
    let options = PageOptions {
        inactivity: Some(state.activity.timeout()),
        celebration: view.celebration,
        ..PageOptions::default()
    };

    Ok(page("Student Record", &options, render_record(&view)).into_response())
}

fn render_record(view: &RecordView) -> Markup {
    html! {
        h1 { (view.display_name) }
        p { "ID Number: " strong { (view.id_number) } }
        p.grade.passing[view.standing.is_passing()].failing[!view.standing.is_passing()] {
            (view.midterm_grade)
        }
        @for category in &view.categories {
            h2 { (category.name) " (" (category.weight) ")" }
            table {
                thead {
                    tr { th { "Weight" } th { "Component" } th { "Score" } }
                }
                tbody {
                    @for group in &category.groups {
                        @for (index, component) in group.components.iter().enumerate() {
                            tr {
                                @if index == 0 {
                                    td rowspan=(group.components.len()) { (group.weight) }
                                }
                                td { (component.label) }
                                td.missed[component.missed] { (component.display) }
                            }
                        }
                    }
                }
            }
        }
        form method="post" action={ (RECORD_PATH) "/back" } {
            button.secondary type="submit" { "Back" }
        }
    }
}

/// "Back" on the record view
pub async fn leave_record(State(state): State<AppState>, session: Session) -> AppResult<Redirect> {
    viewer::close(&state, &session).await?;
    Ok(Redirect::to(LOOKUP_PATH))
}
