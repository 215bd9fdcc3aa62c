use chrono::{Days, NaiveDate, NaiveTime};
use sea_orm::{
    DatabaseBackend,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr, extension::postgres::PgExpr},
};

use super::filters::FilterValue;
use super::operators::MatchMode;
use crate::config::Profile;
use crate::errors::{DataTableError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_IDENTIFIER_LENGTH: usize = 100;

/// Accepts `column` or `table.column`, each segment matching `[A-Za-z_][A-Za-z0-9_]*`.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_IDENTIFIER_LENGTH || name.matches('.').count() > 1 {
        return false;
    }
    name.split('.').all(|segment| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Quoted column reference; `table.column` is quoted per segment.
#[must_use]
pub fn column_expr(name: &str) -> Expr {
    match name.split_once('.') {
        Some((table, column)) => Expr::col((Alias::new(table), Alias::new(column))),
        None => Expr::col(Alias::new(name)),
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Where the search text must appear inside the column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikePattern {
    StartsWith,
    EndsWith,
    Contains,
}

impl LikePattern {
    #[must_use]
    pub fn render(self, value: &str) -> String {
        let escaped = escape_like_wildcards(value);
        match self {
            Self::StartsWith => format!("{escaped}%"),
            Self::EndsWith => format!("%{escaped}"),
            Self::Contains => format!("%{escaped}%"),
        }
    }
}

fn like_expr(pattern: String) -> LikeExpr {
    LikeExpr::new(pattern).escape('\\')
}

fn parse_date(value: &FilterValue) -> Result<NaiveDate> {
    let FilterValue::Text(text) = value else {
        return Err(DataTableError::invalid_input(
            "Date filters expect a YYYY-MM-DD string",
        ));
    };
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| DataTableError::invalid_input(format!("Invalid date '{text}', expected YYYY-MM-DD")))
}

/// `[day, day + 1)`, the half-open range covering one whole calendar day.
fn day_bounds(value: &FilterValue) -> Result<(NaiveDate, NaiveDate)> {
    let from = parse_date(value)?;
    let to = from
        .checked_add_days(Days::new(1))
        .ok_or_else(|| DataTableError::invalid_input("Date out of range"))?;
    Ok((from, to))
}

/// Translates `(column, operator, value)` triples into parameterized predicates.
///
/// Every value is bound as a query parameter; nothing from the request is
/// spliced into the SQL text except quoted identifiers.
#[derive(Debug, Clone, Copy)]
pub struct PredicateBuilder {
    profile: Profile,
    backend: DatabaseBackend,
}

impl PredicateBuilder {
    #[must_use]
    pub const fn new(profile: Profile, backend: DatabaseBackend) -> Self {
        Self { profile, backend }
    }

    #[must_use]
    pub const fn profile(&self) -> Profile {
        self.profile
    }

    /// Build the predicate for one filter constraint.
    ///
    /// Returns `Ok(None)` when the operator is unknown or the value cannot be
    /// used with it; the clause is then simply left out.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when a date operator receives a value that is
    /// not a `YYYY-MM-DD` date.
    pub fn build(
        &self,
        column: &str,
        operator: &str,
        value: &FilterValue,
    ) -> Result<Option<SimpleExpr>> {
        let mode = match operator.parse::<MatchMode>() {
            Ok(mode) => mode,
            Err(err) => {
                tracing::debug!(column, error = %err, "Skipping filter with unsupported operator");
                return Ok(None);
            }
        };
        self.build_mode(column, mode, value)
    }

    /// Same as [`PredicateBuilder::build`] for an already parsed operator.
    ///
    /// # Errors
    ///
    /// See [`PredicateBuilder::build`].
    pub fn build_mode(
        &self,
        column: &str,
        mode: MatchMode,
        value: &FilterValue,
    ) -> Result<Option<SimpleExpr>> {
        let col = || column_expr(column);

        let predicate = match mode {
            MatchMode::StartsWith => value
                .as_text()
                .map(|text| self.text_match(column, LikePattern::StartsWith, &text, false)),
            MatchMode::EndsWith => value
                .as_text()
                .map(|text| self.text_match(column, LikePattern::EndsWith, &text, false)),
            MatchMode::Contains => value
                .as_text()
                .map(|text| self.text_match(column, LikePattern::Contains, &text, false)),
            MatchMode::NotContains => value
                .as_text()
                .map(|text| self.text_match(column, LikePattern::Contains, &text, true)),
            MatchMode::Equals => value.to_sql_value().map(|v| self.equality(column, v, false)),
            MatchMode::NotEquals => value.to_sql_value().map(|v| self.equality(column, v, true)),
            MatchMode::In => {
                let values = value.to_sql_values();
                (!values.is_empty()).then(|| col().is_in(values))
            }
            MatchMode::Lt => value.to_sql_value().map(|v| col().lt(v)),
            MatchMode::Lte => value.to_sql_value().map(|v| col().lte(v)),
            MatchMode::Gt => value.to_sql_value().map(|v| col().gt(v)),
            MatchMode::Gte => value.to_sql_value().map(|v| col().gte(v)),
            MatchMode::DateAfter => {
                Some(self.date_operand(column).gt(self.date_value(parse_date(value)?)))
            }
            MatchMode::DateBefore => {
                Some(self.date_operand(column).lt(self.date_value(parse_date(value)?)))
            }
            MatchMode::DateIs => {
                let (from, to) = day_bounds(value)?;
                Some(
                    self.date_operand(column)
                        .gte(self.date_value(from))
                        .and(self.date_operand(column).lt(self.date_value(to))),
                )
            }
            MatchMode::DateIsNot => {
                let (from, to) = day_bounds(value)?;
                Some(
                    self.date_operand(column)
                        .lt(self.date_value(from))
                        .or(self.date_operand(column).gte(self.date_value(to))),
                )
            }
        };

        if predicate.is_none() {
            tracing::debug!(column, operator = %mode, "Skipping filter whose value does not fit the operator");
        }
        Ok(predicate)
    }

    /// Case-insensitive pattern match used by free-text search.
    ///
    /// The legacy profile lowercases both sides of a plain `LIKE`; the safe
    /// profile behaves as it does for filters.
    #[must_use]
    pub fn search_match(&self, column: &str, pattern: LikePattern, term: &str) -> SimpleExpr {
        match self.profile {
            Profile::Legacy => Expr::expr(Func::lower(column_expr(column)))
                .like(like_expr(pattern.render(&term.to_lowercase()))),
            Profile::Safe => self.text_match(column, pattern, term, false),
        }
    }

    /// Equality used by free-text search with the `equals` operator.
    #[must_use]
    pub fn search_equals(&self, column: &str, term: &str) -> SimpleExpr {
        self.equality(column, term.into(), false)
    }

    fn text_match(&self, column: &str, pattern: LikePattern, text: &str, negate: bool) -> SimpleExpr {
        match self.profile {
            Profile::Legacy => {
                let like = like_expr(pattern.render(text));
                if negate {
                    column_expr(column).not_like(like)
                } else {
                    column_expr(column).like(like)
                }
            }
            Profile::Safe => {
                let target = self.as_text(column);
                if self.backend == DatabaseBackend::Postgres {
                    let like = like_expr(pattern.render(text));
                    if negate {
                        Expr::expr(target).not_ilike(like)
                    } else {
                        Expr::expr(target).ilike(like)
                    }
                } else {
                    let like = like_expr(pattern.render(&text.to_lowercase()));
                    let lowered = Expr::expr(Func::lower(target));
                    if negate {
                        lowered.not_like(like)
                    } else {
                        lowered.like(like)
                    }
                }
            }
        }
    }

    fn equality(&self, column: &str, value: sea_orm::Value, negate: bool) -> SimpleExpr {
        match self.profile {
            Profile::Legacy => {
                if negate {
                    column_expr(column).ne(value)
                } else {
                    column_expr(column).eq(value)
                }
            }
            Profile::Safe => {
                let lhs = Expr::expr(Func::lower(self.as_text(column)));
                let rhs = Func::lower(Expr::val(value));
                if negate { lhs.ne(rhs) } else { lhs.eq(rhs) }
            }
        }
    }

    /// SQLite stores dates and timestamps as text, so both sides are brought
    /// to `YYYY-MM-DD HH:MM:SS` before comparing.
    fn date_operand(&self, column: &str) -> Expr {
        match self.backend {
            DatabaseBackend::Sqlite => {
                Expr::expr(Func::cust(Alias::new("datetime")).arg(column_expr(column)))
            }
            _ => column_expr(column),
        }
    }

    fn date_value(&self, day: NaiveDate) -> sea_orm::Value {
        match self.backend {
            DatabaseBackend::Sqlite => day.and_time(NaiveTime::MIN).into(),
            _ => day.into(),
        }
    }

    fn as_text(&self, column: &str) -> SimpleExpr {
        let text_type = match self.backend {
            DatabaseBackend::MySql => "CHAR",
            _ => "TEXT",
        };
        column_expr(column).cast_as(Alias::new(text_type))
    }
}
