//! Multipart parsing for file-bearing employee submissions.

use axum::extract::multipart::{Multipart, MultipartRejection};

use super::error::ApiError;
use crate::db::EmployeeForm;
use crate::storage::{AttachmentKind, UploadedFile};

/// An employee form plus the files that came with it
#[derive(Debug, Default)]
pub struct EmployeeSubmission {
    pub form: EmployeeForm,
    pub photo: Option<UploadedFile>,
    pub document: Option<UploadedFile>,
}

/// Read every part of a multipart employee submission into memory.
///
/// File parts without content (an untouched file input) count as absent.
/// Unknown text parts are ignored.
pub async fn read_employee_submission(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<EmployeeSubmission, ApiError> {
    let mut multipart =
        multipart.map_err(|_| ApiError::bad_request("Form must be multipart/form-data"))?;
    let mut submission = EmployeeSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(kind) = AttachmentKind::from_field(&name) {
            let file_name = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file data: {}", e)))?;

            let upload = UploadedFile {
                kind,
                file_name,
                content_type,
                data,
            };
            if upload.is_empty() {
                continue;
            }
            match kind {
                AttachmentKind::Photo => submission.photo = Some(upload),
                AttachmentKind::Document => submission.document = Some(upload),
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("Invalid form field {}: {}", name, e)))?;
            submission.form.set(&name, value);
        }
    }

    Ok(submission)
}
