use serde::Deserialize;
use serde_json::json;
use serde_with::{NoneAsEmptyString, serde_as};
use utoipa::IntoParams;

use crate::errors::Result;
use crate::filtering::FilterMap;
use crate::pagination::PageRequest;

/// Query parameters of a data-table request.
///
/// # Search
/// `search_query` is split into terms on whitespace; every term must match a
/// searchable column for a row to be returned.
///
/// # Filtering
/// `filters` is a JSON object keyed by column, for example:
/// ```json
/// {
///   "name": {"value": "ann", "matchMode": "startsWith"},
///   "status": {"operator": "or", "constraints": [
///     {"value": "active", "matchMode": "equals"},
///     {"value": "pending", "matchMode": "equals"}
///   ]}
/// }
/// ```
///
/// # Sorting
/// `field` and `direction` (`asc` or `desc`) must both be present, otherwise
/// the default sort applies.
///
/// # Pagination
/// `pageNumber`/`pageSize` drive the custom envelope, `page`/`per_page` the
/// native one. Empty values are treated as absent.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DataTableParams {
    /// Page size for native pagination.
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    #[param(example = 25, value_type = Option<u64>)]
    pub per_page: Option<u64>,
    /// 1-based page for native pagination.
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    #[param(example = 1, value_type = Option<u64>)]
    pub page: Option<u64>,
    /// Free-text search.
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    #[param(example = "ann lee", value_type = Option<String>)]
    pub search_query: Option<String>,
    /// Column to sort by.
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    #[param(example = "created_at", value_type = Option<String>)]
    pub field: Option<String>,
    /// `asc` or `desc`.
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    #[param(example = "desc", value_type = Option<String>)]
    pub direction: Option<String>,
    /// JSON-encoded per-column filters.
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    #[param(example = json!({"name": {"value": "ann", "matchMode": "startsWith"}}), value_type = Option<String>)]
    pub filters: Option<String>,
    /// 1-based page for the custom envelope.
    #[serde(default, rename = "pageNumber")]
    #[serde_as(as = "NoneAsEmptyString")]
    #[param(example = 1, value_type = Option<u64>)]
    pub page_number: Option<u64>,
    /// Page size for the custom envelope.
    #[serde(default, rename = "pageSize")]
    #[serde_as(as = "NoneAsEmptyString")]
    #[param(example = 25, value_type = Option<u64>)]
    pub page_size: Option<u64>,
}

impl DataTableParams {
    /// Parse the `filters` parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed JSON or filter shapes.
    pub fn filter_map(&self) -> Result<FilterMap> {
        FilterMap::from_param(self.filters.as_deref())
    }

    /// Page of the custom envelope.
    #[must_use]
    pub fn custom_page(&self, default_size: u64) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size, default_size)
    }

    /// Page of the native envelope.
    #[must_use]
    pub fn native_page(&self, default_size: u64) -> PageRequest {
        PageRequest::new(self.page, self.per_page, default_size)
    }
}
