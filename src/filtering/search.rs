use regex::Regex;
use sea_orm::Condition;
use std::str::FromStr;
use std::sync::LazyLock;

use super::conditions::{LikePattern, PredicateBuilder, is_valid_identifier};
use crate::errors::DataTableError;

// Basic safety limit
const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--.*?-->|<[^>]*>?").expect("tag pattern is a valid regex")
});

/// Operator applied to a searchable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOperator {
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    Equals,
}

impl FromStr for SearchOperator {
    type Err = DataTableError;

    /// Accepts the long names and the `cn`/`sw`/`ew`/`eq` short codes, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cn" | "contains" => Ok(Self::Contains),
            "sw" | "startswith" => Ok(Self::StartsWith),
            "ew" | "endswith" => Ok(Self::EndsWith),
            "eq" | "equals" => Ok(Self::Equals),
            _ => Err(DataTableError::unknown_operator(s)),
        }
    }
}

/// A column that free-text search looks into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchColumn {
    pub column: String,
    pub operator: SearchOperator,
}

impl SearchColumn {
    pub fn new(column: impl Into<String>, operator: SearchOperator) -> Self {
        Self {
            column: column.into(),
            operator,
        }
    }

    /// Build from a `(column, operator)` pair as found in configuration files.
    ///
    /// Unknown operators yield `None` so that the column is left out of search.
    pub fn parse(column: impl Into<String>, operator: &str) -> Option<Self> {
        let column = column.into();
        match operator.parse() {
            Ok(operator) => Some(Self { column, operator }),
            Err(err) => {
                tracing::debug!(column, error = %err, "Ignoring search column with unsupported operator");
                None
            }
        }
    }
}

/// Strip markup-like tags, the way a form sanitizer would.
fn strip_tags(input: &str) -> String {
    TAG_PATTERN.replace_all(input, "").into_owned()
}

/// Split raw search input into terms.
///
/// The input is trimmed and stripped of tags, then split on whitespace runs
/// and on every extra delimiter (matched literally). Empty fragments are
/// dropped, so blank input yields no terms at all.
#[must_use]
pub fn tokenize<S: AsRef<str>>(raw: Option<&str>, extra_delimiters: &[S]) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let raw = &raw[..floor_char_boundary(raw, MAX_SEARCH_QUERY_LENGTH)];
    let cleaned = strip_tags(raw.trim());
    if cleaned.trim().is_empty() {
        return Vec::new();
    }

    let mut alternatives: Vec<String> = extra_delimiters
        .iter()
        .map(|d| d.as_ref())
        .filter(|d| !d.is_empty())
        .map(regex::escape)
        .collect();
    alternatives.push(r"\s+".to_string());

    match Regex::new(&alternatives.join("|")) {
        Ok(splitter) => splitter
            .split(&cleaned)
            .filter(|term| !term.is_empty())
            .map(ToString::to_string)
            .collect(),
        Err(err) => {
            tracing::debug!(error = %err, "Invalid search delimiters, splitting on whitespace only");
            cleaned.split_whitespace().map(ToString::to_string).collect()
        }
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// `OR over columns ( AND over terms ( predicate(column, term) ) )`.
///
/// Returns `None` when there is nothing to search for or no usable column.
#[must_use]
pub fn build_search_condition(
    builder: &PredicateBuilder,
    columns: &[SearchColumn],
    terms: &[String],
) -> Option<Condition> {
    if terms.is_empty() || columns.is_empty() {
        return None;
    }

    let mut any_column = Condition::any();
    let mut added = 0;
    for SearchColumn { column, operator } in columns {
        if !is_valid_identifier(column) {
            tracing::debug!(column = %column, "Skipping search column with invalid name");
            continue;
        }
        let mut all_terms = Condition::all();
        for term in terms {
            let predicate = match operator {
                SearchOperator::Contains => builder.search_match(column, LikePattern::Contains, term),
                SearchOperator::StartsWith => {
                    builder.search_match(column, LikePattern::StartsWith, term)
                }
                SearchOperator::EndsWith => builder.search_match(column, LikePattern::EndsWith, term),
                SearchOperator::Equals => builder.search_equals(column, term),
            };
            all_terms = all_terms.add(predicate);
        }
        any_column = any_column.add(all_terms);
        added += 1;
    }

    (added > 0).then_some(any_column)
}
