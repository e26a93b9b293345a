use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// A validated page window. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Missing, zero or negative values fall back to page 1 / the default limit;
    /// oversized limits are clamped to the configured maximum.
    pub fn from_query(page: Option<i64>, limit: Option<i64>, config: &PaginationConfig) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(1).min(u32::MAX as i64) as u32;
        let limit = limit
            .filter(|l| *l > 0)
            .map(|l| l.min(config.max_limit as i64) as u32)
            .unwrap_or(config.default_limit);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub pages: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let limit = request.limit.max(1) as i64;
        let pages = (total.max(0) + limit - 1) / limit;
        Self {
            items,
            page: request.page,
            pages: pages as u32,
            total,
        }
    }
}
