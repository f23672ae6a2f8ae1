//! Common types shared across models.

use serde::{Deserialize, Serialize};

use crate::db::query::{total_pages, BuiltQuery};

/// One page of a list view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, query: &BuiltQuery) -> Self {
        Self {
            items,
            total,
            page: query.page,
            per_page: query.page_size,
            total_pages: total_pages(total, query.page_size),
        }
    }
}

/// Treat blank form values as absent
pub fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
