mod employees;
pub mod error;
mod timesheets;
mod upload;
pub mod validation;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(state.uploads.root());

    Router::new()
        .route("/health", get(health_check))
        // Employees
        .route("/employees", get(employees::list_employees))
        .route("/employees", post(employees::create_employee))
        .route("/employees/options", get(employees::employee_options))
        .route("/employees/:id", get(employees::get_employee))
        .route("/employees/:id", post(employees::update_employee))
        // Timesheets
        .route("/timesheets", get(timesheets::list_timesheets))
        .route("/timesheets", post(timesheets::create_timesheet))
        .route("/timesheets/:id", get(timesheets::get_timesheet))
        .route("/timesheets/:id", post(timesheets::update_timesheet))
        // Stored photos and documents
        .nest_service(state.uploads.url_prefix(), uploads)
        .layer(DefaultBodyLimit::max(state.config.uploads.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
