use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Extension, Json, Router,
};

use super::{
    commands::{
        upload::UPLOAD_BODY_LIMIT, DeleteRowCommand, DeleteRowError, EditRowCommand, EditRowError,
        UploadGradesCommand, UploadGradesError,
    },
    grid::{build_grid, GridQuery},
    queries::{ListRowsError, ListRowsQuery},
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

/// Grade routes, nested under `/classes`
pub fn grades_routes() -> Router<AppState> {
    Router::new()
        .route("/:class_id/students", get(list_rows))
        .route("/:class_id/students/live", get(live_rows))
        .route(
            "/:class_id/students/upload",
            post(upload_grades)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/:class_id/students/:id_number",
            put(edit_row).delete(delete_row),
        )
}

/// The `file` part of a multipart form, with its file name
pub(crate) async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<Option<(Option<String>, Vec<u8>)>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await?;
            return Ok(Some((file_name, data.to_vec())));
        }
    }
    Ok(None)
}

/// Import a grade spreadsheet into a class
///
/// # Endpoint
/// `POST /classes/:class_id/students/upload` (multipart, field `file`)
///
/// # Response
/// - 200: `{ "uploaded": N, "skipped": M, "message": "N records uploaded." }`
/// - 422: "Invalid Excel file."; nothing was written
/// - 500: a write failed; rows before it stay written
#[tracing::instrument(skip(state, multipart), fields(class_id = %class_id))]
async fn upload_grades(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, GradeApiError> {
    let (file_name, bytes) = read_file_field(&mut multipart)
        .await
        .map_err(GradeApiError::Multipart)?
        .unwrap_or_default();

    let command = UploadGradesCommand {
        class_id,
        file_name,
        bytes,
    };
    let response = super::commands::upload::handle(state.store.as_ref(), command).await?;

    tracing::info!(
        uploaded = response.uploaded,
        skipped = response.skipped,
        "Grades uploaded via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, command), fields(class_id = %class_id, id_number = %id_number))]
async fn edit_row(
    State(state): State<AppState>,
    Path((class_id, id_number)): Path<(String, String)>,
    Json(mut command): Json<EditRowCommand>,
) -> Result<Response, GradeApiError> {
    command.class_id = class_id;
    command.id_number = id_number;

    let response = super::commands::edit_row::handle(state.store.as_ref(), command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state), fields(class_id = %class_id, id_number = %id_number))]
async fn delete_row(
    State(state): State<AppState>,
    Path((class_id, id_number)): Path<(String, String)>,
    Query(params): Query<ConfirmParams>,
) -> Result<Response, GradeApiError> {
    let command = DeleteRowCommand {
        class_id,
        id_number,
        confirmed: params.confirm,
    };

    let response = super::commands::delete_row::handle(state.store.as_ref(), command).await?;

    tracing::info!(id_number = %response.id_number, "Grade row deleted via API");

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(state, grid), fields(class_id = %class_id))]
async fn list_rows(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Query(grid): Query<GridQuery>,
) -> Result<Response, GradeApiError> {
    let response =
        super::queries::list_rows::handle(state.store.as_ref(), ListRowsQuery { class_id, grid })
            .await?;

    tracing::debug!(
        total = response.grid.pagination.total,
        page = response.grid.pagination.page,
        "Grade rows listed via API"
    );

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// Live grade grid of one class
///
/// # Endpoint
/// `GET /classes/:class_id/students/live` with the grid query parameters
///
/// # Response
/// Server-sent events; every change to the class sheet pushes the grid page
/// for the same search, sort and page.
#[tracing::instrument(skip(state, admin, grid), fields(class_id = %class_id))]
async fn live_rows(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentAdmin>,
    Path(class_id): Path<String>,
    Query(grid): Query<GridQuery>,
) -> Result<Response, GradeApiError> {
    super::queries::list_rows::load_class(state.store.as_ref(), &class_id).await?;
    let roster = CollectionPath::class_students(&class_id)
        .map_err(|e| GradeApiError::List(e.into()))?;

    let subscription = Subscription::open(state.store.clone(), roster);
    let events = collection_events(subscription, move |documents| build_grid(&documents, &grid));

    Ok(admin_sse(events, admin.auth).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum GradeApiError {
    Multipart(MultipartError),
    Upload(UploadGradesError),
    Edit(EditRowError),
    Delete(DeleteRowError),
    List(ListRowsError),
}

impl From<UploadGradesError> for GradeApiError {
    fn from(err: UploadGradesError) -> Self {
        Self::Upload(err)
    }
}

impl From<EditRowError> for GradeApiError {
    fn from(err: EditRowError) -> Self {
        Self::Edit(err)
    }
}

impl From<DeleteRowError> for GradeApiError {
    fn from(err: DeleteRowError) -> Self {
        Self::Delete(err)
    }
}

impl From<ListRowsError> for GradeApiError {
    fn from(err: ListRowsError) -> Self {
        Self::List(err)
    }
}

fn not_found(message: String) -> Response {
    ErrorResponse::new("NOT_FOUND", message).into_response_with(StatusCode::NOT_FOUND)
}

fn database_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!("Database error during {}: {}", context, err);
    ErrorResponse::new("INTERNAL_ERROR", "Database error.")
        .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for GradeApiError {
    fn into_response(self) -> Response {
        match self {
            GradeApiError::Multipart(e) => {
                tracing::warn!("Unreadable multipart upload: {}", e);
                ErrorResponse::new("VALIDATION_ERROR", "Could not read the uploaded file.")
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            GradeApiError::Upload(e @ (UploadGradesError::MissingFile | UploadGradesError::TooLarge)) => {
                ErrorResponse::new("VALIDATION_ERROR", e.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            GradeApiError::Upload(e @ UploadGradesError::ClassNotFound(_)) => not_found(e.to_string()),
            GradeApiError::Upload(UploadGradesError::Parse(e)) => {
                ErrorResponse::new("PARSE_ERROR", e.to_string())
                    .into_response_with(StatusCode::UNPROCESSABLE_ENTITY)
            },
            GradeApiError::Upload(UploadGradesError::Store { source, uploaded }) => {
                tracing::error!(uploaded, "Grade upload aborted part-way");
                database_error("grade upload", &source)
            },
            GradeApiError::Edit(e @ EditRowError::MissingId) => {
                ErrorResponse::new("VALIDATION_ERROR", e.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            GradeApiError::Edit(EditRowError::Store(e)) => database_error("grade row update", &e),
            GradeApiError::Delete(DeleteRowError::ConfirmationRequired { prompt }) => {
                confirmation_required(&prompt)
            },
            GradeApiError::Delete(e @ DeleteRowError::NotFound(_)) => not_found(e.to_string()),
            GradeApiError::Delete(DeleteRowError::Store(e)) => database_error("grade row deletion", &e),
            GradeApiError::List(e @ ListRowsError::ClassNotFound(_)) => not_found(e.to_string()),
            GradeApiError::List(ListRowsError::Store(e)) => database_error("grade listing", &e),
        }
    }
}
