//! Per-endpoint configuration for data-table queries.

use sea_orm::{DatabaseBackend, Order};
use std::time::Duration;

use crate::filtering::search::{SearchColumn, SearchOperator};
use crate::pagination::Mode;

pub const DEFAULT_PAGE_SIZE: u64 = 25;
pub const DEFAULT_SORT_COLUMN: &str = "id";
pub const DEFAULT_RESULT_KEY: &str = "sub_query";
pub const DEFAULT_REMOTE_KEY: &str = "user_id";
const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// How predicates are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    /// Plain `LIKE` and `=` against the column, usable on any dialect.
    #[default]
    Legacy,
    /// Casts columns to text and uses the dialect's case-insensitive matching.
    Safe,
}

/// Configuration shared by every request served through one [`crate::DataTable`].
#[derive(Debug, Clone)]
pub struct DataTableConfig {
    pub profile: Profile,
    pub backend: DatabaseBackend,
    pub search_columns: Vec<SearchColumn>,
    /// Extra literal delimiters for splitting search input, on top of whitespace.
    pub search_delimiters: Vec<String>,
    pub default_sort_column: String,
    pub default_sort_order: Order,
    pub mode: Mode,
    pub default_page_size: u64,
}

impl Default for DataTableConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Legacy,
            backend: DatabaseBackend::Sqlite,
            search_columns: Vec::new(),
            search_delimiters: Vec::new(),
            default_sort_column: DEFAULT_SORT_COLUMN.to_string(),
            default_sort_order: Order::Desc,
            mode: Mode::Custom,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DataTableConfig {
    #[must_use]
    pub fn new(backend: DatabaseBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Searchable columns for the legacy profile: every column uses `contains`.
    #[must_use]
    pub fn with_search_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_columns = columns
            .into_iter()
            .map(|column| SearchColumn::new(column, SearchOperator::Contains))
            .collect();
        self
    }

    /// Searchable columns with an explicit operator per column.
    #[must_use]
    pub fn with_search_config(mut self, columns: Vec<SearchColumn>) -> Self {
        self.search_columns = columns;
        self
    }

    #[must_use]
    pub fn with_search_delimiters<I, S>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_delimiters = delimiters.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_default_sort(mut self, column: impl Into<String>, order: Order) -> Self {
        self.default_sort_column = column.into();
        self.default_sort_order = order;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Page size used when the request leaves it out. Zero is ignored.
    #[must_use]
    pub fn with_default_page_size(mut self, page_size: u64) -> Self {
        if page_size > 0 {
            self.default_page_size = page_size;
        }
        self
    }
}

/// Where and how to fetch related records for the Result Merger.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub endpoint: String,
    /// Row field whose values are sent to the remote endpoint.
    pub local_key: String,
    /// Key under which the matched remote record is attached to each row.
    pub result_key: String,
    /// Field of the remote records used to match them to rows.
    pub remote_key: String,
    pub timeout: Duration,
}

impl EnrichmentConfig {
    pub fn new(endpoint: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            local_key: local_key.into(),
            result_key: DEFAULT_RESULT_KEY.to_string(),
            remote_key: DEFAULT_REMOTE_KEY.to_string(),
            timeout: DEFAULT_ENRICHMENT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_result_key(mut self, result_key: impl Into<String>) -> Self {
        self.result_key = result_key.into();
        self
    }

    #[must_use]
    pub fn with_remote_key(mut self, remote_key: impl Into<String>) -> Self {
        self.remote_key = remote_key.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
