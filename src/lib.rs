//! Server-side data tables for sea-orm.
//!
//! Turns the query-string parameters of a data-table widget (free-text search,
//! per-column filters, sorting and paging) into a parameterized sea-orm query,
//! runs it, and returns one page of rows. Rows can optionally be enriched with
//! records fetched from another HTTP service.
//!
//! ```rust,ignore
//! use datatable::{DataTable, DataTableConfig, DataTableParams, PageResponse, Profile};
//!
//! async fn list_users(
//!     State(db): State<DatabaseConnection>,
//!     Query(params): Query<DataTableParams>,
//! ) -> Result<PageResponse<users::Model>, DataTableError> {
//!     let table = DataTable::new(
//!         DataTableConfig::new(db.get_database_backend())
//!             .with_profile(Profile::Safe)
//!             .with_search_columns(["name", "email"]),
//!     );
//!     table.get_data(&db, &params, users::Entity).await
//! }
//! ```

pub mod config;
pub mod datatable;
pub mod errors;
pub mod filtering;
pub mod merge;
pub mod models;
pub mod pagination;
pub mod query;

pub use config::{DataTableConfig, EnrichmentConfig, Profile};
pub use datatable::DataTable;
pub use errors::{DataTableError, Result};
pub use filtering::{
    FilterMap, MatchMode, PredicateBuilder, SearchColumn, SearchOperator, SortSpec, tokenize,
};
pub use merge::{EnrichmentTransport, HttpTransport, merge_page_response, merge_response_data};
pub use models::DataTableParams;
pub use pagination::{
    Mode, NativePage, PageRequest, PageResponse, PageResult, Pagination, Paginator,
};
pub use query::{IntoBaseQuery, assemble};
