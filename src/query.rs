//! Query assembly: base query + search + sort + filters.

use sea_orm::{
    Condition, EntityTrait, QueryFilter, QueryOrder, Select, sea_query::SimpleExpr,
};

use crate::config::DataTableConfig;
use crate::errors::Result;
use crate::filtering::{
    Filter, FilterMap, GroupOperator, PredicateBuilder, SearchColumn, SortSpec,
    build_search_condition, is_valid_identifier,
};

/// Anything a data-table query can start from.
///
/// Implemented for entity types (`users::Entity`) and for already narrowed
/// `Select<E>` queries (`users::Entity::find().filter(...)`).
pub trait IntoBaseQuery<E: EntityTrait> {
    fn into_base_query(self) -> Select<E>;
}

impl<E: EntityTrait> IntoBaseQuery<E> for Select<E> {
    fn into_base_query(self) -> Select<E> {
        self
    }
}

impl<E: EntityTrait> IntoBaseQuery<E> for E {
    fn into_base_query(self) -> Select<E> {
        E::find()
    }
}

/// Combine one filter's constraints into a single group.
///
/// The first predicate that is produced is always AND'ed; `or` only takes
/// effect from the second constraint onwards. Falsy constraints and
/// unsupported operators are left out. Returns `None` if nothing remains.
///
/// # Errors
///
/// Propagates `InvalidInput` from unparseable date values.
pub fn build_filter_group(
    builder: &PredicateBuilder,
    column: &str,
    filter: &Filter,
) -> Result<Option<Condition>> {
    let (operator, constraints) = filter.constraints();

    let mut predicates: Vec<SimpleExpr> = Vec::new();
    for constraint in constraints {
        if constraint.value.is_falsy() {
            continue;
        }
        if let Some(predicate) = builder.build(column, &constraint.match_mode, &constraint.value)? {
            predicates.push(predicate);
        }
    }

    if predicates.is_empty() {
        return Ok(None);
    }

    // The first predicate starts the group, so it is AND'ed onto the query
    // even in an `or` group; a single survivor is never OR'ed with anything.
    let group = if operator == GroupOperator::Or && predicates.len() > 1 {
        Condition::any()
    } else {
        Condition::all()
    };
    Ok(Some(
        predicates
            .into_iter()
            .fold(group, |group, predicate| group.add(predicate)),
    ))
}

/// Non-empty filter groups, in request order.
fn filter_groups(builder: &PredicateBuilder, filters: &FilterMap) -> Result<Vec<Condition>> {
    let mut groups = Vec::with_capacity(filters.len());
    for (column, filter) in filters.iter() {
        if !is_valid_identifier(column) {
            tracing::debug!(column, "Skipping filter on invalid column name");
            continue;
        }
        if let Some(group) = build_filter_group(builder, column, filter)? {
            groups.push(group);
        }
    }
    Ok(groups)
}

/// Build the combined condition for every filter, in request order.
///
/// # Errors
///
/// Propagates `InvalidInput` from unparseable date values.
pub fn build_filter_condition(builder: &PredicateBuilder, filters: &FilterMap) -> Result<Condition> {
    Ok(filter_groups(builder, filters)?
        .into_iter()
        .fold(Condition::all(), Condition::add))
}

/// Assemble the executable query.
///
/// 1. AND the search group (if any terms and columns) onto the base query
/// 2. apply exactly one sort clause
/// 3. AND each non-empty filter group, in request order
///
/// # Errors
///
/// Returns `InvalidInput` when a date filter cannot be parsed.
pub fn assemble<E: EntityTrait>(
    base: Select<E>,
    builder: &PredicateBuilder,
    search_columns: &[SearchColumn],
    search_terms: &[String],
    sort: &SortSpec,
    filters: &FilterMap,
) -> Result<Select<E>> {
    let mut query = base;

    if let Some(search) = build_search_condition(builder, search_columns, search_terms) {
        query = query.filter(search);
    }

    query = query.order_by(sort.column(), sort.direction.clone());

    for group in filter_groups(builder, filters)? {
        query = query.filter(group);
    }

    Ok(query)
}

/// Shorthand for [`assemble`] driven by a [`DataTableConfig`].
///
/// # Errors
///
/// See [`assemble`].
pub fn assemble_with_config<E: EntityTrait>(
    base: Select<E>,
    config: &DataTableConfig,
    search_terms: &[String],
    sort: &SortSpec,
    filters: &FilterMap,
) -> Result<Select<E>> {
    let builder = PredicateBuilder::new(config.profile, config.backend);
    assemble(base, &builder, &config.search_columns, search_terms, sort, filters)
}
