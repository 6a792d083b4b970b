use rocket::{FromForm, UriDisplayQuery};
use serde::{Deserialize, Serialize};

/// Pagination query parameters, e.g. `?page_num=2&page_size=20`.
#[derive(Debug, Clone, Copy, FromForm, UriDisplayQuery)]
pub struct PaginationRequest {
    #[field(default = 1)]
    pub page_num: u32,
    #[field(default = 50)]
    pub page_size: u32,
}

impl PaginationRequest {
    /// How many items precede the requested page.
    pub fn skip(&self) -> u32 {
        self.page_num.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Package one page of items with its pagination metadata.
    pub fn to_paginated<T>(self, total: u64, items: Vec<T>) -> Paginated<T> {
        Paginated {
            pagination: PaginationResult {
                page_num: self.page_num,
                page_size: self.page_size,
                total,
            },
            items,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub pagination: PaginationResult,
    pub items: Vec<T>,
}

/// Where a page of results sits within the whole.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationResult {
    pub page_num: u32,
    pub page_size: u32,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_counts_preceding_items() {
        let pagination = PaginationRequest {
            page_num: 3,
            page_size: 20,
        };
        assert_eq!(pagination.skip(), 40);
    }

    #[test]
    fn first_page_skips_nothing() {
        let pagination = PaginationRequest {
            page_num: 1,
            page_size: 50,
        };
        assert_eq!(pagination.skip(), 0);

        // Degenerate page numbers don't underflow.
        let pagination = PaginationRequest {
            page_num: 0,
            page_size: 50,
        };
        assert_eq!(pagination.skip(), 0);
    }
}
