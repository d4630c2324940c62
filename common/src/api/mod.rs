mod callback;
mod payment;

pub mod daemon;

pub use callback::*;
pub use payment::*;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_LIMIT;

/// Resolved page request, `page` is 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Missing or zero limits fall back to the default, then the limit is capped
    pub fn new(page: Option<u32>, limit: Option<u32>, max_limit: u32) -> Self {
        let limit = match limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_PAGE_LIMIT,
        };

        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.min(max_limit),
        }
    }

    pub fn skip(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }

    /// Cut one page out of an already filtered and sorted list
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items: Vec<T> = items
            .into_iter()
            .skip(self.skip())
            .take(self.limit as usize)
            .collect();
        let has_more = self.skip().saturating_add(items.len()) < total;

        Page {
            items,
            total: total as u64,
            page: self.page,
            limit: self.limit,
            has_more,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_USER_PAGE_LIMIT;

    #[test]
    fn test_pagination_defaults() {
        let pagination = Pagination::new(None, None, MAX_USER_PAGE_LIMIT);
        assert_eq!(pagination, Pagination { page: 1, limit: 50 });

        let pagination = Pagination::new(Some(0), Some(0), MAX_USER_PAGE_LIMIT);
        assert_eq!(pagination, Pagination { page: 1, limit: 50 });

        let pagination = Pagination::new(Some(3), Some(500), MAX_USER_PAGE_LIMIT);
        assert_eq!(pagination, Pagination { page: 3, limit: 100 });
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (0..25).collect();

        let page = Pagination::new(Some(1), Some(10), 100).paginate(items.clone());
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
        assert_eq!(page.total, 25);
        assert!(page.has_more);

        let page = Pagination::new(Some(3), Some(10), 100).paginate(items.clone());
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert!(!page.has_more);

        let page = Pagination::new(Some(9), Some(10), 100).paginate(items);
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }
}
