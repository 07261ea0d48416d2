//! Business logic for managing principals and notices.
//!
//! Command functions run inside a caller-supplied unit of work; each opens an
//! autocommit scope so it owns the transaction when called standalone but
//! composes into a caller's larger transaction unchanged. Query functions go
//! straight to the readonly pool.

pub mod admin_service;
pub mod email_service;
pub mod notice_service;
pub mod user_service;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Code, ServiceError, ServiceResult};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// One-based page selector used by every list query.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn limit(&self) -> i64 {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        // page comes straight from the query string, so keep the arithmetic
        // saturating instead of trusting it to stay in range.
        self.page.max(1).saturating_sub(1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<T>,
}

impl<T> PageResponse<T> {
    pub fn new(request: &PageRequest, total: i64, items: Vec<T>) -> Self {
        PageResponse {
            total,
            page: request.page.max(1),
            page_size: request.limit(),
            items,
        }
    }
}

/// Maps declarative payload validation onto the parameter error code.
pub(crate) fn validated<T: Validate>(data: &T) -> ServiceResult<()> {
    data.validate()
        .map_err(|_| ServiceError::bad_request(Code::InvalidParameter))
}
