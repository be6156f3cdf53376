//! Cursor pagination types for list operations.
//!
//! Page tokens are opaque to callers. They encode the offset into the
//! filtered, sorted result set and are only valid for the same query.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: usize = 25;
/// Maximum page size.
pub const MAX_PAGE_SIZE: usize = 100;

const TOKEN_PREFIX: &str = "offset:";

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Number of items per page.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Cursor returned by the previous page.
    #[serde(default)]
    pub page_token: Option<String>,
}

impl PageRequest {
    /// Create a new page request. The limit is clamped to `1..=100`.
    pub fn new(limit: usize, page_token: Option<String>) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            page_token,
        }
    }

    /// Request the first page with the given limit.
    pub fn first(limit: usize) -> Self {
        Self::new(limit, None)
    }

    /// Effective limit after clamping.
    pub fn limit(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Decode the page token into an offset.
    pub fn offset(&self) -> AppResult<usize> {
        match self.page_token.as_deref() {
            None | Some("") => Ok(0),
            Some(token) => decode_token(token),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            page_token: None,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T: Serialize> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Cursor for the next page, `None` on the last page.
    pub next_page_token: Option<String>,
    /// Total number of items matching the query.
    pub total_items: u64,
}

impl<T: Serialize> PageResponse<T> {
    /// Slice one page out of a fully filtered and sorted result set.
    pub fn paginate(all: Vec<T>, request: &PageRequest) -> AppResult<Self> {
        let total = all.len();
        let offset = request.offset()?;
        let limit = request.limit();

        let items: Vec<T> = all.into_iter().skip(offset).take(limit).collect();
        let end = offset.saturating_add(items.len());
        let next_page_token = if end < total {
            Some(encode_token(end))
        } else {
            None
        };

        Ok(Self {
            items,
            next_page_token,
            total_items: total as u64,
        })
    }

    /// Create an empty response.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_page_token: None,
            total_items: 0,
        }
    }

    /// Transform the items while keeping the cursor.
    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> PageResponse<U> {
        PageResponse {
            items: self.items.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
            total_items: self.total_items,
        }
    }
}

fn encode_token(offset: usize) -> String {
    URL_SAFE_NO_PAD.encode(format!("{TOKEN_PREFIX}{offset}"))
}

fn decode_token(token: &str) -> AppResult<usize> {
    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| AppError::validation("Malformed page token"))?;
    let text = String::from_utf8(raw).map_err(|_| AppError::validation("Malformed page token"))?;
    text.strip_prefix(TOKEN_PREFIX)
        .and_then(|n| n.parse::<usize>().ok())
        .ok_or_else(|| AppError::validation("Malformed page token"))
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}
