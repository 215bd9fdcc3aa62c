use sea_orm::{ConnectionTrait, EntityTrait, Select};
use serde::Serialize;
use serde_json::Value;

use crate::config::{DataTableConfig, EnrichmentConfig};
use crate::errors::Result;
use crate::filtering::{SortSpec, tokenize};
use crate::merge::{EnrichmentTransport, merge_page_response};
use crate::models::DataTableParams;
use crate::pagination::{Mode, PageRequest, PageResponse, Paginator};
use crate::query::{IntoBaseQuery, assemble_with_config};

/// Serves data-table requests for one listing.
///
/// ```rust,ignore
/// let table = DataTable::new(
///     DataTableConfig::new(DatabaseBackend::Postgres)
///         .with_profile(Profile::Safe)
///         .with_search_columns(["name", "email"]),
/// );
/// let page = table.get_data(&db, &params, users::Entity).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    config: DataTableConfig,
}

impl DataTable {
    #[must_use]
    pub const fn new(config: DataTableConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &DataTableConfig {
        &self.config
    }

    #[must_use]
    pub fn default_sort(&self) -> SortSpec {
        SortSpec::new(
            self.config.default_sort_column.clone(),
            self.config.default_sort_order.clone(),
        )
    }

    /// Apply search, sort and filters from `params` to `base`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed filter JSON or unparseable dates.
    pub fn build_query<E, Q>(&self, params: &DataTableParams, base: Q) -> Result<Select<E>>
    where
        E: EntityTrait,
        Q: IntoBaseQuery<E>,
    {
        let terms = tokenize(params.search_query.as_deref(), &self.config.search_delimiters);
        let sort = SortSpec::resolve(
            params.field.as_deref(),
            params.direction.as_deref(),
            &self.default_sort(),
        );
        let filters = params.filter_map()?;

        tracing::debug!(
            terms = terms.len(),
            filters = filters.len(),
            sort = %sort.field,
            "Assembling data table query"
        );

        assemble_with_config(base.into_base_query(), &self.config, &terms, &sort, &filters)
    }

    /// The page requested, read from the parameters of the configured mode.
    #[must_use]
    pub fn page_request(&self, params: &DataTableParams) -> PageRequest {
        match self.config.mode {
            Mode::Custom => params.custom_page(self.config.default_page_size),
            Mode::Standard => params.native_page(self.config.default_page_size),
        }
    }

    /// Build the query and fetch one page of it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for bad filter input and `Database` if a query
    /// fails.
    pub async fn get_data<C, E, Q>(
        &self,
        db: &C,
        params: &DataTableParams,
        base: Q,
    ) -> Result<PageResponse<E::Model>>
    where
        C: ConnectionTrait,
        E: EntityTrait,
        E::Model: Sync,
        Q: IntoBaseQuery<E>,
    {
        let query = self.build_query(params, base)?;
        Paginator::new(self.config.mode)
            .paginate(db, query, self.page_request(params))
            .await
    }

    /// [`get_data`](Self::get_data) followed by the Result Merger.
    ///
    /// # Errors
    ///
    /// Same as [`get_data`](Self::get_data); enrichment failures never error.
    pub async fn get_data_enriched<C, E, Q, T>(
        &self,
        db: &C,
        params: &DataTableParams,
        base: Q,
        transport: &T,
        enrichment: &EnrichmentConfig,
    ) -> Result<PageResponse<Value>>
    where
        C: ConnectionTrait,
        E: EntityTrait,
        E::Model: Sync + Serialize,
        Q: IntoBaseQuery<E>,
        T: EnrichmentTransport + ?Sized,
    {
        let page = self.get_data(db, params, base).await?.into_json()?;
        Ok(merge_page_response(page, transport, enrichment).await)
    }
}
