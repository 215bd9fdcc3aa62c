//! # Filtering, Search & Sorting
//!
//! Translates the loosely-typed parameters of a data-table request into
//! parameterized sea-query predicates.
//!
//! ## Main Components
//!
//! - [`FilterMap`]: the `filters` JSON parameter parsed into an ordered tree of
//!   [`Filter::Simple`] and [`Filter::Grouped`] entries
//! - [`PredicateBuilder`]: one `(column, matchMode, value)` triple to one
//!   predicate, rendered according to the configured [`Profile`](crate::Profile)
//! - [`tokenize`] and [`build_search_condition`]: free-text search across the
//!   configured columns
//! - [`SortSpec`]: the single `ORDER BY` clause
//!
//! ## Supported operators
//!
//! | `matchMode`   | predicate                                   |
//! |---------------|---------------------------------------------|
//! | `startsWith`  | `col LIKE 'v%'`                             |
//! | `endsWith`    | `col LIKE '%v'`                             |
//! | `contains`    | `col LIKE '%v%'`                            |
//! | `notContains` | `col NOT LIKE '%v%'`                        |
//! | `equals`      | `col = v`                                   |
//! | `notEquals`   | `col <> v`                                  |
//! | `in`          | `col IN (v1, v2, ...)`                      |
//! | `lt` `lte` `gt` `gte` | `col < v` and friends               |
//! | `dateAfter`   | `col > date`                                |
//! | `dateBefore`  | `col < date`                                |
//! | `dateIs`      | `col >= date AND col < date + 1 day`        |
//! | `dateIsNot`   | `col < date OR col >= date + 1 day`         |
//!
//! Any other operator is skipped. Every value is a bound parameter.

pub mod conditions;
pub mod filters;
pub mod operators;
pub mod search;
pub mod sort;

pub use conditions::{LikePattern, PredicateBuilder, column_expr, is_valid_identifier};
pub use filters::{Constraint, Filter, FilterMap, FilterValue};
pub use operators::{GroupOperator, MatchMode};
pub use search::{SearchColumn, SearchOperator, build_search_condition, tokenize};
pub use sort::SortSpec;
