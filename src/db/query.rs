//! Parameterized list queries with search, filter, sort and pagination.
//!
//! A [`Listing`] describes one list view: which table expression to read,
//! which columns a search matches, which column the equality filter applies
//! to, and which sort keys are allowed. [`Listing::build`] turns the raw query
//! parameters of a request into a page query, a matching count query, and the
//! positional arguments for both. Only column expressions taken from the
//! listing's allow-list are ever interpolated into SQL.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};

/// A positional query argument
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse a user-supplied order; anything but "desc" sorts ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// How the listing's filter value is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Text,
    Integer,
}

/// Static description of a list view
#[derive(Debug, Clone, Copy)]
pub struct Listing {
    /// Table expression, including joins
    pub from: &'static str,
    /// Selected columns
    pub columns: &'static str,
    /// Stable tie-breaker appended to every ORDER BY
    pub id_column: &'static str,
    /// Columns matched by the search text (OR-combined)
    pub search_columns: &'static [&'static str],
    /// Column compared for equality against the filter value
    pub filter_column: &'static str,
    pub filter_kind: FilterKind,
    /// Allowed sort keys and the column expression each one maps to
    pub sortable: &'static [(&'static str, &'static str)],
    /// Sort key used when the requested one is missing or not allowed
    pub default_sort: &'static str,
    pub page_size: i64,
}

/// Raw list parameters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRequest {
    pub search: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
}

/// Page and count queries sharing one WHERE clause
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub count_sql: String,
    /// Arguments of the WHERE clause; LIMIT and OFFSET are bound after them
    pub args: Vec<SqlArg>,
    pub page: i64,
    pub page_size: i64,
    pub offset: i64,
    pub sort: &'static str,
    pub order: SortOrder,
}

impl Listing {
    /// Resolve a requested sort key against the allow-list.
    ///
    /// Returns the accepted key and its column expression, falling back to the
    /// default sort key for unknown input.
    pub fn sort_column(&self, requested: Option<&str>) -> (&'static str, &'static str) {
        let requested = requested.map(str::trim).unwrap_or_default();
        self.sortable
            .iter()
            .find(|(key, _)| *key == requested)
            .or_else(|| self.sortable.iter().find(|(key, _)| *key == self.default_sort))
            .copied()
            .unwrap_or((self.default_sort, self.id_column))
    }

    pub fn build(&self, req: &ListRequest) -> BuiltQuery {
        let page = parse_page(req.page.as_deref());
        let offset = (page - 1).saturating_mul(self.page_size);

        let mut conditions = Vec::new();
        let mut args = Vec::new();

        if let Some(search) = non_empty(req.search.as_deref()) {
            if !self.search_columns.is_empty() {
                let pattern = like_pattern(search);
                let clauses: Vec<String> = self
                    .search_columns
                    .iter()
                    .map(|col| format!("LOWER({}) LIKE ? ESCAPE '\\'", col))
                    .collect();
                conditions.push(format!("({})", clauses.join(" OR ")));
                for _ in self.search_columns {
                    args.push(SqlArg::Text(pattern.clone()));
                }
            }
        }

        if let Some(filter) = non_empty(req.filter.as_deref()) {
            match self.filter_kind {
                FilterKind::Text => {
                    conditions.push(format!("{} = ?", self.filter_column));
                    args.push(SqlArg::Text(filter.to_string()));
                }
                FilterKind::Integer => {
                    // Non-numeric ids can't match anything meaningful; ignore them.
                    if let Ok(id) = filter.parse::<i64>() {
                        conditions.push(format!("{} = ?", self.filter_column));
                        args.push(SqlArg::Int(id));
                    }
                }
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let (sort, sort_column) = self.sort_column(req.sort.as_deref());
        let order = SortOrder::parse(req.order.as_deref());

        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} {}, {} ASC LIMIT ? OFFSET ?",
            self.columns,
            self.from,
            where_clause,
            sort_column,
            order.as_sql(),
            self.id_column
        );
        let count_sql = format!("SELECT COUNT(*) FROM {}{}", self.from, where_clause);

        BuiltQuery {
            sql,
            count_sql,
            args,
            page,
            page_size: self.page_size,
            offset,
            sort,
            order,
        }
    }
}

/// Number of pages needed for `total` rows
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 || total <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

fn parse_page(value: Option<&str>) -> i64 {
    value
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(1)
        .max(1)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Lowercased substring pattern with LIKE wildcards escaped
fn like_pattern(search: &str) -> String {
    let escaped = search
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Run the page and count queries of a [`BuiltQuery`]
pub async fn fetch_page<T>(db: &SqlitePool, query: &BuiltQuery) -> Result<(Vec<T>, i64), sqlx::Error>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut count_query = sqlx::query_scalar::<_, i64>(&query.count_sql);
    for arg in &query.args {
        count_query = match arg {
            SqlArg::Text(s) => count_query.bind(s.clone()),
            SqlArg::Int(i) => count_query.bind(*i),
        };
    }
    let total = count_query.fetch_one(db).await?;

    let mut rows_query = sqlx::query_as::<_, T>(&query.sql);
    for arg in &query.args {
        rows_query = match arg {
            SqlArg::Text(s) => rows_query.bind(s.clone()),
            SqlArg::Int(i) => rows_query.bind(*i),
        };
    }
    let rows = rows_query
        .bind(query.page_size)
        .bind(query.offset)
        .fetch_all(db)
        .await?;

    Ok((rows, total))
}
