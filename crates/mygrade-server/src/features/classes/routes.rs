use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};

use super::{
    commands::{
        CreateClassCommand, CreateClassError, DeleteClassCommand, DeleteClassError,
        UpdateClassCommand, UpdateClassError, DELETE_CLASS_PROMPT,
    },
    queries::{GetClassError, GetClassQuery, ListClassesError, ListClassesQuery},
    types::filter_classes,
};
use crate::api::{
    response::{ApiResponse, ErrorResponse},
    AppState,
};
use crate::features::auth::CurrentAdmin;
use crate::features::shared::{
    confirmation_required,
    live::{admin_sse, collection_events},
    ConfirmParams,
};
use crate::store::{CollectionPath, Subscription};

pub fn classes_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route("/live", get(live_classes))
        .route(
            "/:class_id",
            get(get_class).put(update_class).delete(delete_class),
        )
}

#[tracing::instrument(skip(state, command))]
async fn create_class(
    State(state): State<AppState>,
    Json(command): Json<CreateClassCommand>,
) -> Result<Response, ClassApiError> {
    let response = super::commands::create::handle(state.store.as_ref(), command).await?;

    tracing::info!(class_id = %response.id, "Class created via API");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, command), fields(class_id = %class_id))]
async fn update_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Json(mut command): Json<UpdateClassCommand>,
) -> Result<Response, ClassApiError> {
    command.class_id = class_id;

    let response = super::commands::update::handle(state.store.as_ref(), command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state), fields(class_id = %class_id))]
async fn delete_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Query(params): Query<ConfirmParams>,
) -> Result<Response, ClassApiError> {
    let command = DeleteClassCommand {
        class_id,
        confirmed: params.confirm,
    };

    let response = super::commands::delete::handle(state.store.as_ref(), command).await?;

    tracing::info!(
        class_id = %response.class_id,
        students_deleted = response.students_deleted,
        "Class deleted via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state), fields(class_id = %class_id))]
async fn get_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Result<Response, ClassApiError> {
    let response =
        super::queries::get::handle(state.store.as_ref(), GetClassQuery { class_id }).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, query), fields(search = ?query.search))]
async fn list_classes(
    State(state): State<AppState>,
    Query(query): Query<ListClassesQuery>,
) -> Result<Response, ClassApiError> {
    let response = super::queries::list::handle(state.store.as_ref(), query).await?;

    tracing::debug!(count = response.total, "Classes listed via API");

    Ok((StatusCode::OK, Json(ApiResponse::success(response.classes))).into_response())
}

/// Live class roster
///
/// # Endpoint
/// `GET /classes/live?search=...`
///
/// # Response
/// Server-sent events; each `snapshot` event carries the full filtered list.
/// The stream ends when the administrator signs out.
#[tracing::instrument(skip(state, admin, query))]
async fn live_classes(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentAdmin>,
    Query(query): Query<ListClassesQuery>,
) -> impl IntoResponse {
    let search = query.term().map(str::to_string);
    let subscription = Subscription::open(state.store.clone(), CollectionPath::classes());
    let events = collection_events(subscription, move |documents| {
        filter_classes(&documents, search.as_deref())
    });

    admin_sse(events, admin.auth)
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum ClassApiError {
    Create(CreateClassError),
    Update(UpdateClassError),
    Delete(DeleteClassError),
    Get(GetClassError),
    List(ListClassesError),
}

impl From<CreateClassError> for ClassApiError {
    fn from(err: CreateClassError) -> Self {
        Self::Create(err)
    }
}

impl From<UpdateClassError> for ClassApiError {
    fn from(err: UpdateClassError) -> Self {
        Self::Update(err)
    }
}

impl From<DeleteClassError> for ClassApiError {
    fn from(err: DeleteClassError) -> Self {
        Self::Delete(err)
    }
}

impl From<GetClassError> for ClassApiError {
    fn from(err: GetClassError) -> Self {
        Self::Get(err)
    }
}

impl From<ListClassesError> for ClassApiError {
    fn from(err: ListClassesError) -> Self {
        Self::List(err)
    }
}

fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!("Database error during {}: {}", context, err);
    ErrorResponse::new("INTERNAL_ERROR", "Database error.")
        .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ClassApiError {
    fn into_response(self) -> Response {
        match self {
            ClassApiError::Create(CreateClassError::Validation(e))
            | ClassApiError::Update(UpdateClassError::Validation(e)) => {
                ErrorResponse::new("VALIDATION_ERROR", e.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            ClassApiError::Update(e @ UpdateClassError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", e.to_string())
                    .into_response_with(StatusCode::NOT_FOUND)
            },
            ClassApiError::Delete(e @ DeleteClassError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", e.to_string())
                    .into_response_with(StatusCode::NOT_FOUND)
            },
            ClassApiError::Get(e @ GetClassError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", e.to_string())
                    .into_response_with(StatusCode::NOT_FOUND)
            },
            ClassApiError::Delete(DeleteClassError::ConfirmationRequired) => {
                confirmation_required(DELETE_CLASS_PROMPT)
            },
            ClassApiError::Create(CreateClassError::Store(e)) => internal_error("class creation", &e),
            ClassApiError::Update(UpdateClassError::Store(e)) => internal_error("class update", &e),
            ClassApiError::Delete(DeleteClassError::Store(e)) => internal_error("class deletion", &e),
            ClassApiError::Get(GetClassError::Store(e)) => internal_error("class retrieval", &e),
            ClassApiError::List(ListClassesError::Store(e)) => internal_error("class listing", &e),
        }
    }
}
