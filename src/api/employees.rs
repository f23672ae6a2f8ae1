//! Employee list, detail, create and edit endpoints.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    response::Redirect,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::db::{
    self, Attachments, Employee, EmployeeListQuery, EmployeeListResponse, EmployeeOption,
};
use crate::storage::UploadStore;
use crate::AppState;

use super::error::ApiError;
use super::upload::{read_employee_submission, EmployeeSubmission};
use super::validation::check_employee;

const EMPLOYEES_PATH: &str = "/employees";

/// List employees with search, department filter, sorting and pagination
///
/// GET /employees?search=&department=&sort=&order=&page=
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmployeeListQuery>,
) -> Result<Json<EmployeeListResponse>, ApiError> {
    let result = db::list_employees(&state.db, &query).await?;
    Ok(Json(result))
}

/// Employee picker entries for the timesheet form
///
/// GET /employees/options
pub async fn employee_options(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EmployeeOption>>, ApiError> {
    let options = db::list_employee_options(&state.db).await?;
    Ok(Json(options))
}

/// GET /employees/:id
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Employee>, ApiError> {
    let employee = db::get_employee(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    Ok(Json(employee))
}

/// Create an employee from a multipart form
///
/// POST /employees
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, ApiError> {
    let submission = read_employee_submission(multipart).await?;
    let input = validate(&state, &submission)?;

    let attachments = store_attachments(&state.uploads, &submission).await?;
    let id = db::insert_employee(&state.db, &input, &attachments)
        .await
        .map_err(|e| {
            warn_orphaned(&attachments);
            ApiError::from(e)
        })?;

    info!(employee_id = id, name = %input.full_name, "Employee created");
    Ok(Redirect::to(EMPLOYEES_PATH))
}

/// Replace an employee's fields; files that are not re-uploaded are kept
///
/// POST /employees/:id
pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, ApiError> {
    let existing = db::get_employee(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let submission = read_employee_submission(multipart).await?;
    let input = validate(&state, &submission)?;

    let uploaded = store_attachments(&state.uploads, &submission).await?;
    let attachments = uploaded.clone().merge_over(&existing.attachments());
    db::update_employee(&state.db, id, &input, &attachments)
        .await
        .map_err(|e| {
            warn_orphaned(&uploaded);
            ApiError::from(e)
        })?;

    info!(
        employee_id = id,
        photo_replaced = uploaded.photo_path.is_some(),
        document_replaced = uploaded.document_path.is_some(),
        "Employee updated"
    );
    Ok(Redirect::to(EMPLOYEES_PATH))
}

fn validate(state: &AppState, submission: &EmployeeSubmission) -> Result<db::EmployeeInput, ApiError> {
    let today = chrono::Local::now().date_naive();
    check_employee(&submission.form, &state.config.validation, today).map_err(|errors| {
        debug!(fields = ?errors, "Employee submission rejected");
        ApiError::validation(errors).with_values(&submission.form)
    })
}

/// Write the submitted files, returning the paths of the ones that were stored
async fn store_attachments(
    store: &UploadStore,
    submission: &EmployeeSubmission,
) -> Result<Attachments, ApiError> {
    let photo_path = match &submission.photo {
        Some(file) => Some(store.save(file).await?),
        None => None,
    };
    let document_path = match &submission.document {
        Some(file) => match store.save(file).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn_orphaned(&Attachments {
                    photo_path,
                    document_path: None,
                });
                return Err(e.into());
            }
        },
        None => None,
    };

    Ok(Attachments {
        photo_path,
        document_path,
    })
}

/// Stored files are not rolled back when a later step fails
fn warn_orphaned(attachments: &Attachments) {
    for path in [&attachments.photo_path, &attachments.document_path]
        .into_iter()
        .flatten()
    {
        warn!(path = %path, "Uploaded file left without a record");
    }
}
