//! # Pagination
//!
//! Two modes coexist:
//!
//! - [`Mode::Custom`] runs a `COUNT` query and an `OFFSET`/`LIMIT` query and
//!   returns a [`PageResult`]:
//!   ```json
//!   { "data": [...], "pagination": { "total": 23, "currentPage": 3, "perPage": 10,
//!     "totalPages": 3, "prevPage": 2, "nextPage": null } }
//!   ```
//! - [`Mode::Standard`] delegates to sea-orm's own paginator and returns its
//!   envelope as a [`NativePage`].
//!
//! The count and the page are fetched in two separate round-trips without a
//! shared snapshot, so rows written in between can make `total` and `data`
//! disagree slightly. Wrap the connection in a transaction if that matters.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use sea_orm::{
    ConnectionTrait, EntityTrait, ItemsAndPagesNumber, PaginatorTrait, QuerySelect, Select,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::errors::{DataTableError, Result};

/// Which pagination strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// sea-orm's native paginator.
    Standard,
    /// Separate count and offset/limit queries with a [`Pagination`] block.
    #[default]
    Custom,
}

/// 1-based page number and page size, both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Missing or zero values fall back to page 1 and `default_size`.
    #[must_use]
    pub fn new(page_number: Option<u64>, page_size: Option<u64>, default_size: u64) -> Self {
        let default_size = default_size.max(1);
        Self {
            page_number: page_number.filter(|&n| n > 0).unwrap_or(1),
            page_size: page_size.filter(|&n| n > 0).unwrap_or(default_size),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }
}

/// Page metadata of a custom-mode result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub prev_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl Pagination {
    #[must_use]
    pub fn new(total: u64, page: PageRequest) -> Self {
        let total_pages = total.div_ceil(page.page_size);
        let current_page = page.page_number;
        Self {
            total,
            current_page,
            per_page: page.page_size,
            total_pages,
            prev_page: (current_page > 1).then(|| current_page - 1),
            next_page: (current_page < total_pages).then(|| current_page + 1),
        }
    }
}

/// Custom-mode envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Standard-mode envelope, as produced by sea-orm's paginator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativePage<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub number_of_items: u64,
    pub number_of_pages: u64,
}

/// Either envelope; serializes to exactly one of the two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResponse<T> {
    Custom(PageResult<T>),
    Standard(NativePage<T>),
}

fn rows_to_json<T: Serialize>(rows: Vec<T>) -> Result<Vec<serde_json::Value>> {
    rows.into_iter()
        .map(|row| serde_json::to_value(row).map_err(Into::into))
        .collect()
}

impl<T: Serialize> PageResult<T> {
    /// Turn every row into a JSON value, e.g. before merging related records.
    ///
    /// # Errors
    ///
    /// Fails if a row cannot be serialized.
    pub fn into_json(self) -> Result<PageResult<serde_json::Value>> {
        Ok(PageResult {
            data: rows_to_json(self.data)?,
            pagination: self.pagination,
        })
    }
}

impl<T: Serialize> PageResponse<T> {
    /// See [`PageResult::into_json`].
    ///
    /// # Errors
    ///
    /// Fails if a row cannot be serialized.
    pub fn into_json(self) -> Result<PageResponse<serde_json::Value>> {
        Ok(match self {
            Self::Custom(page) => PageResponse::Custom(page.into_json()?),
            Self::Standard(page) => PageResponse::Standard(NativePage {
                data: rows_to_json(page.data)?,
                page: page.page,
                per_page: page.per_page,
                number_of_items: page.number_of_items,
                number_of_pages: page.number_of_pages,
            }),
        })
    }
}

impl<T> PageResponse<T> {
    #[must_use]
    pub fn data(&self) -> &[T] {
        match self {
            Self::Custom(page) => &page.data,
            Self::Standard(page) => &page.data,
        }
    }
}

impl<T: Serialize> IntoResponse for PageResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> IntoResponse for PageResult<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Executes an assembled query one page at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator {
    mode: Mode,
}

impl Paginator {
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Fetch one page in the configured mode.
    ///
    /// # Errors
    ///
    /// Returns a database error if either query fails.
    pub async fn paginate<C, E>(
        &self,
        db: &C,
        query: Select<E>,
        page: PageRequest,
    ) -> Result<PageResponse<E::Model>>
    where
        C: ConnectionTrait,
        E: EntityTrait,
        E::Model: Sync,
    {
        match self.mode {
            Mode::Custom => Ok(PageResponse::Custom(fetch_custom(db, query, page).await?)),
            Mode::Standard => Ok(PageResponse::Standard(fetch_standard(db, query, page).await?)),
        }
    }
}

/// Count, then fetch `page_size` rows starting at `(page_number - 1) * page_size`.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn fetch_custom<C, E>(
    db: &C,
    query: Select<E>,
    page: PageRequest,
) -> Result<PageResult<E::Model>>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
{
    let total = query.clone().count(db).await?;
    let data = query
        .offset(page.offset())
        .limit(page.page_size)
        .all(db)
        .await?;

    tracing::debug!(
        total,
        page = page.page_number,
        per_page = page.page_size,
        rows = data.len(),
        "Fetched custom page"
    );

    Ok(PageResult {
        data,
        pagination: Pagination::new(total, page),
    })
}

/// Delegate to sea-orm's paginator.
///
/// # Errors
///
/// Returns `InvalidInput` when the page's row offset does not fit in a
/// `u64`, or a database error if either query fails.
pub async fn fetch_standard<C, E>(
    db: &C,
    query: Select<E>,
    page: PageRequest,
) -> Result<NativePage<E::Model>>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
{
    let page_index = page.page_number.saturating_sub(1);
    if page_index.checked_mul(page.page_size).is_none() {
        return Err(DataTableError::invalid_input(format!(
            "Page {} is out of range for {} rows per page",
            page.page_number, page.page_size
        )));
    }

    let paginator = query.paginate(db, page.page_size);
    let ItemsAndPagesNumber {
        number_of_items,
        number_of_pages,
    } = paginator.num_items_and_pages().await?;
    let data = paginator.fetch_page(page_index).await?;

    tracing::debug!(
        number_of_items,
        page = page.page_number,
        rows = data.len(),
        "Fetched native page"
    );

    Ok(NativePage {
        data,
        page: page.page_number,
        per_page: page.page_size,
        number_of_items,
        number_of_pages,
    })
}
