use serde::Serialize;

use crate::{
    error::AppResult,
    validation::{FieldError, Validator},
};

pub const MAX_LIMIT: i64 = 50;

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn resolve(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(default_limit);
        let mut v = Validator::new();
        if page < 1 {
            v.push(FieldError::new("page", "Page must be a positive integer"));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            v.push(FieldError::new(
                "limit",
                format!("Limit must be between 1 and {MAX_LIMIT}"),
            ));
        }
        v.finish()?;
        Ok(Self { page, limit })
    }

    /// Clamps at `i64::MAX`; a page that far out is simply empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(req: PageRequest, total_items: i64) -> Self {
        let total_pages = (total_items + req.limit - 1) / req.limit;
        Self {
            current_page: req.page,
            total_pages,
            total_items,
            has_next: req.page < total_pages,
            has_prev: req.page > 1,
        }
    }
}

/// Applies a page window to an already ordered in-memory sequence.
#[cfg(test)]
pub fn slice_page<T: Clone>(items: &[T], req: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip(req.offset() as usize)
        .take(req.limit as usize)
        .cloned()
        .collect()
}
