//! Timesheet models, list view and persistence.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::Page;
use crate::db::query::{fetch_page, FilterKind, ListRequest, Listing, SortOrder};

/// Storage format of timesheet timestamps; sorts lexically in time order
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timesheet joined with its employee's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Timesheet {
    pub id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub start_time: String,
    pub end_time: String,
    pub work_summary: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw timesheet submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetForm {
    pub employee_id: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(alias = "summary")]
    pub work_summary: String,
}

/// Validated timesheet fields
#[derive(Debug, Clone, PartialEq)]
pub struct TimesheetInput {
    pub employee_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub work_summary: Option<String>,
}

/// Query parameters of the timesheet list view
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimesheetListQuery {
    pub search: Option<String>,
    pub employee: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
}

impl From<&TimesheetListQuery> for ListRequest {
    fn from(q: &TimesheetListQuery) -> Self {
        ListRequest {
            search: q.search.clone(),
            filter: q.employee.clone(),
            sort: q.sort.clone(),
            order: q.order.clone(),
            page: q.page.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimesheetListResponse {
    #[serde(flatten)]
    pub page: Page<Timesheet>,
    pub search: String,
    pub employee: String,
    pub sort: String,
    pub order: SortOrder,
}

pub const TIMESHEET_PAGE_SIZE: i64 = 10;

const TIMESHEET_COLUMNS: &str = "t.id, t.employee_id, e.full_name AS employee_name, t.start_time, t.end_time, t.work_summary, t.created_at, t.updated_at";

pub const TIMESHEET_LISTING: Listing = Listing {
    from: "timesheets t JOIN employees e ON t.employee_id = e.id",
    columns: TIMESHEET_COLUMNS,
    id_column: "t.id",
    search_columns: &["t.work_summary", "e.full_name"],
    filter_column: "t.employee_id",
    filter_kind: FilterKind::Integer,
    sortable: &[
        ("start_time", "t.start_time"),
        ("end_time", "t.end_time"),
        ("employee_name", "e.full_name"),
    ],
    default_sort: "start_time",
    page_size: TIMESHEET_PAGE_SIZE,
};

pub async fn get_timesheet(db: &SqlitePool, id: i64) -> Result<Option<Timesheet>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM timesheets t JOIN employees e ON t.employee_id = e.id WHERE t.id = ?",
        TIMESHEET_COLUMNS
    );
    sqlx::query_as::<_, Timesheet>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_timesheets(
    db: &SqlitePool,
    query: &TimesheetListQuery,
) -> Result<TimesheetListResponse, sqlx::Error> {
    let built = TIMESHEET_LISTING.build(&ListRequest::from(query));
    let (items, total) = fetch_page::<Timesheet>(db, &built).await?;

    Ok(TimesheetListResponse {
        page: Page::new(items, total, &built),
        search: query.search.clone().unwrap_or_default(),
        employee: query.employee.clone().unwrap_or_default(),
        sort: built.sort.to_string(),
        order: built.order,
    })
}

/// Insert a new timesheet and return its id
pub async fn insert_timesheet(db: &SqlitePool, input: &TimesheetInput) -> Result<i64, sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO timesheets (employee_id, start_time, end_time, work_summary, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.employee_id)
    .bind(input.start_time.format(TIMESTAMP_FORMAT).to_string())
    .bind(input.end_time.format(TIMESTAMP_FORMAT).to_string())
    .bind(&input.work_summary)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Replace every field of an existing timesheet; `RowNotFound` for unknown ids
pub async fn update_timesheet(
    db: &SqlitePool,
    id: i64,
    input: &TimesheetInput,
) -> Result<i64, sqlx::Error> {
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        UPDATE timesheets SET employee_id = ?, start_time = ?, end_time = ?, work_summary = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(input.employee_id)
    .bind(input.start_time.format(TIMESTAMP_FORMAT).to_string())
    .bind(input.end_time.format(TIMESTAMP_FORMAT).to_string())
    .bind(&input.work_summary)
    .bind(&now)
    .bind(id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::employee::fixtures::employee_input;
    use crate::db::{init_memory, insert_employee, Attachments};

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn input(employee_id: i64, start: &str, end: &str, summary: Option<&str>) -> TimesheetInput {
        TimesheetInput {
            employee_id,
            start_time: at(start),
            end_time: at(end),
            work_summary: summary.map(String::from),
        }
    }

    async fn employee(db: &SqlitePool, name: &str) -> i64 {
        insert_employee(db, &employee_input(name, "Engineering"), &Attachments::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_with_employee_name() {
        let db = init_memory().await.unwrap();
        let john = employee(&db, "John Doe").await;

        let id = insert_timesheet(
            &db,
            &input(john, "2024-02-01 09:00:00", "2024-02-01 17:00:00", Some("Developed feature X")),
        )
        .await
        .unwrap();

        let ts = get_timesheet(&db, id).await.unwrap().unwrap();
        assert_eq!(ts.employee_id, john);
        assert_eq!(ts.employee_name, "John Doe");
        assert_eq!(ts.start_time, "2024-02-01 09:00:00");
        assert_eq!(ts.work_summary.as_deref(), Some("Developed feature X"));
    }

    #[tokio::test]
    async fn test_insert_with_unknown_employee_fails() {
        let db = init_memory().await.unwrap();
        let err = insert_timesheet(&db, &input(5, "2024-02-01 09:00:00", "2024-02-01 17:00:00", None))
            .await
            .unwrap_err();
        assert!(matches!(err, sqlx::Error::Database(_)));
    }

    #[tokio::test]
    async fn test_update() {
        let db = init_memory().await.unwrap();
        let john = employee(&db, "John Doe").await;
        let jane = employee(&db, "Jane Smith").await;
        let id = insert_timesheet(&db, &input(john, "2024-02-01 09:00:00", "2024-02-01 17:00:00", None))
            .await
            .unwrap();

        update_timesheet(
            &db,
            id,
            &input(jane, "2024-02-02 08:30:00", "2024-02-02 16:30:00", Some("Interviews")),
        )
        .await
        .unwrap();

        let ts = get_timesheet(&db, id).await.unwrap().unwrap();
        assert_eq!(ts.employee_name, "Jane Smith");
        assert_eq!(ts.end_time, "2024-02-02 16:30:00");

        let err = update_timesheet(&db, id + 1, &input(jane, "2024-02-02 08:30:00", "2024-02-02 16:30:00", None))
            .await
            .unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn test_list_search_filter_and_sort() {
        let db = init_memory().await.unwrap();
        let john = employee(&db, "John Doe").await;
        let jane = employee(&db, "Jane Smith").await;
        for (who, start, end, summary) in [
            (john, "2024-02-01 09:00:00", "2024-02-01 17:00:00", "Feature work"),
            (jane, "2024-02-02 08:30:00", "2024-02-02 16:30:00", "Onboarding"),
            (john, "2024-02-03 09:00:00", "2024-02-03 12:00:00", "Code review"),
        ] {
            insert_timesheet(&db, &input(who, start, end, Some(summary))).await.unwrap();
        }

        let all = list_timesheets(&db, &TimesheetListQuery::default()).await.unwrap();
        assert_eq!(all.page.total, 3);
        assert_eq!(all.page.total_pages, 1);
        assert_eq!(all.sort, "start_time");
        assert_eq!(all.page.items[0].start_time, "2024-02-01 09:00:00");

        let by_john = TimesheetListQuery {
            employee: Some(john.to_string()),
            order: Some("desc".to_string()),
            ..Default::default()
        };
        let result = list_timesheets(&db, &by_john).await.unwrap();
        let starts: Vec<_> = result.page.items.iter().map(|t| t.start_time.as_str()).collect();
        assert_eq!(starts, vec!["2024-02-03 09:00:00", "2024-02-01 09:00:00"]);

        let by_name = TimesheetListQuery {
            search: Some("jane".to_string()),
            ..Default::default()
        };
        let result = list_timesheets(&db, &by_name).await.unwrap();
        assert_eq!(result.page.total, 1);
        assert_eq!(result.page.items[0].work_summary.as_deref(), Some("Onboarding"));

        let by_summary = TimesheetListQuery {
            search: Some("REVIEW".to_string()),
            ..Default::default()
        };
        let result = list_timesheets(&db, &by_summary).await.unwrap();
        assert_eq!(result.page.total, 1);
        assert_eq!(result.page.items[0].employee_name, "John Doe");
    }

    #[test]
    fn test_form_accepts_summary_alias() {
        let form: TimesheetForm =
            serde_json::from_str(r#"{"employee_id": "1", "summary": "Standup"}"#).unwrap();
        assert_eq!(form.work_summary, "Standup");
        assert_eq!(form.start_time, "");
    }
}
