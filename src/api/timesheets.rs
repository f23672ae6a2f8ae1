//! Timesheet list, detail, create and edit endpoints.

use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    response::Redirect,
    Form, Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{self, Timesheet, TimesheetForm, TimesheetInput, TimesheetListQuery, TimesheetListResponse};
use crate::AppState;

use super::error::ApiError;
use super::validation::{check_timesheet, timesheet_employee_id};

const TIMESHEETS_PATH: &str = "/timesheets";

/// List timesheets with search, employee filter, sorting and pagination
///
/// GET /timesheets?search=&employee=&sort=&order=&page=
pub async fn list_timesheets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimesheetListQuery>,
) -> Result<Json<TimesheetListResponse>, ApiError> {
    let result = db::list_timesheets(&state.db, &query).await?;
    Ok(Json(result))
}

/// GET /timesheets/:id
pub async fn get_timesheet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Timesheet>, ApiError> {
    let timesheet = db::get_timesheet(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Timesheet not found"))?;
    Ok(Json(timesheet))
}

/// POST /timesheets
pub async fn create_timesheet(
    State(state): State<Arc<AppState>>,
    form: Result<Form<TimesheetForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let Form(form) = form.map_err(malformed)?;
    let input = validate(&state, &form).await?;

    let id = db::insert_timesheet(&state.db, &input).await?;

    info!(timesheet_id = id, employee_id = input.employee_id, "Timesheet created");
    Ok(Redirect::to(TIMESHEETS_PATH))
}

/// POST /timesheets/:id
pub async fn update_timesheet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    form: Result<Form<TimesheetForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    if db::get_timesheet(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found("Timesheet not found"));
    }

    let Form(form) = form.map_err(malformed)?;
    let input = validate(&state, &form).await?;

    db::update_timesheet(&state.db, id, &input).await?;

    info!(timesheet_id = id, employee_id = input.employee_id, "Timesheet updated");
    Ok(Redirect::to(TIMESHEETS_PATH))
}

fn malformed(rejection: FormRejection) -> ApiError {
    ApiError::bad_request(format!("Invalid timesheet form: {}", rejection.body_text()))
}

async fn validate(state: &AppState, form: &TimesheetForm) -> Result<TimesheetInput, ApiError> {
    let exists = match timesheet_employee_id(form) {
        Some(employee_id) => db::employee_exists(&state.db, employee_id).await?,
        None => false,
    };

    check_timesheet(form, |_| exists).map_err(|errors| {
        debug!(fields = ?errors, "Timesheet submission rejected");
        ApiError::validation(errors).with_values(form)
    })
}
