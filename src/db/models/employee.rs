//! Employee models, list view and persistence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::Page;
use crate::db::query::{fetch_page, FilterKind, ListRequest, Listing, SortOrder};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: String,
    pub job_title: String,
    pub department: String,
    pub salary: f64,
    pub start_date: String,
    pub end_date: Option<String>,
    pub photo_path: Option<String>,
    pub document_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Employee {
    pub fn attachments(&self) -> Attachments {
        Attachments {
            photo_path: self.photo_path.clone(),
            document_path: self.document_path.clone(),
        }
    }
}

/// Raw employee submission, exactly as the form sent it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub job_title: String,
    pub department: String,
    pub salary: String,
    pub start_date: String,
    pub end_date: String,
}

impl EmployeeForm {
    /// Assign a form field by name. Returns false for unknown fields.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "full_name" => &mut self.full_name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "date_of_birth" => &mut self.date_of_birth,
            "job_title" => &mut self.job_title,
            "department" => &mut self.department,
            "salary" => &mut self.salary,
            "start_date" => &mut self.start_date,
            "end_date" => &mut self.end_date,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Validated employee fields, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeInput {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: NaiveDate,
    pub job_title: String,
    pub department: String,
    pub salary: f64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Stored file references of an employee
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attachments {
    pub photo_path: Option<String>,
    pub document_path: Option<String>,
}

impl Attachments {
    /// Keep each previously stored path unless a replacement was uploaded.
    pub fn merge_over(self, previous: &Attachments) -> Attachments {
        Attachments {
            photo_path: self.photo_path.or_else(|| previous.photo_path.clone()),
            document_path: self.document_path.or_else(|| previous.document_path.clone()),
        }
    }
}

/// Row of the employee list view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployeeSummary {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub job_title: String,
    pub department: String,
    pub salary: f64,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// Entry of the employee picker
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployeeOption {
    pub id: i64,
    pub full_name: String,
}

/// Query parameters of the employee list view
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeListQuery {
    pub search: Option<String>,
    pub department: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
}

impl From<&EmployeeListQuery> for ListRequest {
    fn from(q: &EmployeeListQuery) -> Self {
        ListRequest {
            search: q.search.clone(),
            filter: q.department.clone(),
            sort: q.sort.clone(),
            order: q.order.clone(),
            page: q.page.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeListResponse {
    #[serde(flatten)]
    pub page: Page<EmployeeSummary>,
    pub search: String,
    pub department: String,
    pub sort: String,
    pub order: SortOrder,
    /// Distinct departments, for the filter dropdown
    pub departments: Vec<String>,
}

pub const EMPLOYEE_PAGE_SIZE: i64 = 3;

pub const EMPLOYEE_LISTING: Listing = Listing {
    from: "employees",
    columns: "id, full_name, email, job_title, department, salary, start_date, end_date",
    id_column: "id",
    search_columns: &["full_name", "email", "job_title", "department"],
    filter_column: "department",
    filter_kind: FilterKind::Text,
    sortable: &[
        ("full_name", "full_name"),
        ("email", "email"),
        ("job_title", "job_title"),
        ("department", "department"),
        ("salary", "salary"),
        ("start_date", "start_date"),
        ("end_date", "end_date"),
    ],
    default_sort: "full_name",
    page_size: EMPLOYEE_PAGE_SIZE,
};

pub async fn get_employee(db: &SqlitePool, id: i64) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn employee_exists(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

pub async fn list_employees(
    db: &SqlitePool,
    query: &EmployeeListQuery,
) -> Result<EmployeeListResponse, sqlx::Error> {
    list_employees_in(db, &EMPLOYEE_LISTING, query).await
}

pub(crate) async fn list_employees_in(
    db: &SqlitePool,
    listing: &Listing,
    query: &EmployeeListQuery,
) -> Result<EmployeeListResponse, sqlx::Error> {
    let built = listing.build(&ListRequest::from(query));
    let (items, total) = fetch_page::<EmployeeSummary>(db, &built).await?;
    let departments = list_departments(db).await?;

    Ok(EmployeeListResponse {
        page: Page::new(items, total, &built),
        search: query.search.clone().unwrap_or_default(),
        department: query.department.clone().unwrap_or_default(),
        sort: built.sort.to_string(),
        order: built.order,
        departments,
    })
}

pub async fn list_departments(db: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT DISTINCT department FROM employees ORDER BY department")
        .fetch_all(db)
        .await
}

pub async fn list_employee_options(db: &SqlitePool) -> Result<Vec<EmployeeOption>, sqlx::Error> {
    sqlx::query_as::<_, EmployeeOption>("SELECT id, full_name FROM employees ORDER BY full_name, id")
        .fetch_all(db)
        .await
}

/// Insert a new employee and return its id
pub async fn insert_employee(
    db: &SqlitePool,
    input: &EmployeeInput,
    attachments: &Attachments,
) -> Result<i64, sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO employees (
            full_name, email, phone, date_of_birth, job_title, department, salary,
            start_date, end_date, photo_path, document_path, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.date_of_birth.to_string())
    .bind(&input.job_title)
    .bind(&input.department)
    .bind(input.salary)
    .bind(input.start_date.to_string())
    .bind(input.end_date.map(|d| d.to_string()))
    .bind(&attachments.photo_path)
    .bind(&attachments.document_path)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Replace every field of an existing employee.
///
/// `attachments` must already be merged with the stored paths; see
/// [`Attachments::merge_over`]. Fails with `RowNotFound` for unknown ids.
pub async fn update_employee(
    db: &SqlitePool,
    id: i64,
    input: &EmployeeInput,
    attachments: &Attachments,
) -> Result<i64, sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        UPDATE employees SET
            full_name = ?, email = ?, phone = ?, date_of_birth = ?, job_title = ?,
            department = ?, salary = ?, start_date = ?, end_date = ?,
            photo_path = ?, document_path = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(input.date_of_birth.to_string())
    .bind(&input.job_title)
    .bind(&input.department)
    .bind(input.salary)
    .bind(input.start_date.to_string())
    .bind(input.end_date.map(|d| d.to_string()))
    .bind(&attachments.photo_path)
    .bind(&attachments.document_path)
    .bind(&now)
    .bind(id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    Ok(id)
}
