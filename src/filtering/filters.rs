//! Filter tree parsed from the `filters` request parameter.
//!
//! The parameter is a JSON object keyed by column, in the shape emitted by
//! PrimeReact/PrimeVue data tables:
//!
//! ```json
//! {
//!   "name":   { "value": "ann", "matchMode": "startsWith" },
//!   "status": { "operator": "or", "constraints": [
//!       { "value": "active",  "matchMode": "equals" },
//!       { "value": "pending", "matchMode": "equals" }
//!   ] }
//! }
//! ```
//!
//! Key order is preserved, since later filters are AND'ed onto earlier ones.

use sea_orm::Value;
use serde::Deserialize;

use super::operators::GroupOperator;
use crate::errors::{DataTableError, Result};

/// `0`, `0.0` and `-0.0`.
#[allow(clippy::float_cmp)]
pub(crate) fn is_zero(n: &serde_json::Number) -> bool {
    n.as_f64().is_some_and(|f| f == 0.0)
}

/// A scalar or list value attached to a filter constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Falsy values make a constraint be skipped instead of matching "empty".
    ///
    /// Numeric zero and the string `"0"` count as falsy, like `""` and `[]`.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) => true,
            Self::Text(s) => s.is_empty() || s == "0",
            Self::Number(n) => is_zero(n),
            Self::List(items) => items.is_empty(),
            Self::Bool(true) => false,
        }
    }

    /// Textual form used to build LIKE patterns. Lists have none.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Null | Self::List(_) => None,
        }
    }

    /// Bound parameter for a scalar value, keeping its native SQL type.
    #[must_use]
    pub fn to_sql_value(&self) -> Option<Value> {
        match self {
            Self::Text(s) => Some(Value::from(s.clone())),
            Self::Bool(b) => Some(Value::from(*b)),
            Self::Number(n) => n
                .as_i64()
                .map(Value::from)
                .or_else(|| n.as_f64().map(Value::from)),
            Self::Null | Self::List(_) => None,
        }
    }

    /// Bound parameters for `IN`: every scalar of a list, or the scalar itself.
    #[must_use]
    pub fn to_sql_values(&self) -> Vec<Value> {
        match self {
            Self::List(items) => items.iter().filter_map(Self::to_sql_value).collect(),
            other => other.to_sql_value().into_iter().collect(),
        }
    }
}

impl TryFrom<serde_json::Value> for FilterValue {
    type Error = DataTableError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Ok(match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
                            DataTableError::invalid_input("Filter lists may only contain scalars"),
                        ),
                        scalar => Self::try_from(scalar),
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_json::Value::Object(_) => {
                return Err(DataTableError::invalid_input(
                    "Filter values must be scalars or lists",
                ));
            }
        })
    }
}

/// One `(matchMode, value)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Raw operator name; unsupported names are skipped when building predicates.
    pub match_mode: String,
    pub value: FilterValue,
}

/// A single filter entry for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Simple(Constraint),
    Grouped {
        operator: GroupOperator,
        constraints: Vec<Constraint>,
    },
}

impl Filter {
    /// Constraints in evaluation order together with the group operator.
    ///
    /// A simple filter behaves as a group of one.
    #[must_use]
    pub fn constraints(&self) -> (GroupOperator, &[Constraint]) {
        match self {
            Self::Simple(constraint) => (GroupOperator::And, std::slice::from_ref(constraint)),
            Self::Grouped {
                operator,
                constraints,
            } => (*operator, constraints),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConstraint {
    match_mode: Option<String>,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilter {
    match_mode: Option<String>,
    #[serde(default)]
    value: serde_json::Value,
    operator: Option<String>,
    constraints: Option<Vec<RawConstraint>>,
}

impl TryFrom<RawConstraint> for Constraint {
    type Error = DataTableError;

    fn try_from(raw: RawConstraint) -> Result<Self> {
        Ok(Self {
            match_mode: raw.match_mode.unwrap_or_default(),
            value: FilterValue::try_from(raw.value)?,
        })
    }
}

impl TryFrom<RawFilter> for Filter {
    type Error = DataTableError;

    fn try_from(raw: RawFilter) -> Result<Self> {
        match raw.constraints {
            Some(constraints) if !constraints.is_empty() => Ok(Self::Grouped {
                operator: GroupOperator::parse(raw.operator.as_deref()),
                constraints: constraints
                    .into_iter()
                    .map(Constraint::try_from)
                    .collect::<Result<_>>()?,
            }),
            _ => Ok(Self::Simple(Constraint {
                match_mode: raw.match_mode.unwrap_or_default(),
                value: FilterValue::try_from(raw.value)?,
            })),
        }
    }
}

/// Ordered `column -> filter` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterMap {
    entries: Vec<(String, Filter)>,
}

impl FilterMap {
    /// Parse the JSON-encoded `filters` parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the string is not a JSON object of filter
    /// objects.
    pub fn parse(json: &str) -> Result<Self> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let entries = object
            .into_iter()
            .map(|(column, value)| {
                if !value.is_object() {
                    return Err(DataTableError::invalid_input(format!(
                        "Filter for '{column}' must be an object"
                    )));
                }
                let raw: RawFilter = serde_json::from_value(value)?;
                Ok((column, Filter::try_from(raw)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Parse an optional parameter; absent or blank means no filters.
    ///
    /// # Errors
    ///
    /// See [`FilterMap::parse`].
    pub fn from_param(param: Option<&str>) -> Result<Self> {
        match param.map(str::trim) {
            Some(json) if !json.is_empty() => Self::parse(json),
            _ => Ok(Self::default()),
        }
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, filter: Filter) -> Self {
        self.entries.push((column.into(), filter));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.entries.iter().map(|(column, filter)| (column.as_str(), filter))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_filter() {
        let filters =
            FilterMap::parse(r#"{"name": {"value": "ann", "matchMode": "startsWith"}}"#).unwrap();
        let (column, filter) = filters.iter().next().unwrap();
        assert_eq!(column, "name");
        assert_eq!(
            filter,
            &Filter::Simple(Constraint {
                match_mode: "startsWith".to_string(),
                value: FilterValue::Text("ann".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_grouped_filter() {
        let filters = FilterMap::parse(
            r#"{"status": {"operator": "or", "constraints": [
                {"value": "A", "matchMode": "equals"},
                {"value": "B", "matchMode": "equals"}
            ]}}"#,
        )
        .unwrap();
        let (_, filter) = filters.iter().next().unwrap();
        let (operator, constraints) = filter.constraints();
        assert_eq!(operator, GroupOperator::Or);
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[1].value, FilterValue::Text("B".to_string()));
    }

    #[test]
    fn test_grouped_filter_ignores_top_level_value() {
        let filters = FilterMap::parse(
            r#"{"status": {"value": "ignored", "matchMode": "equals", "operator": "and",
                "constraints": [{"value": "A", "matchMode": "equals"}]}}"#,
        )
        .unwrap();
        let (_, filter) = filters.iter().next().unwrap();
        let (_, constraints) = filter.constraints();
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].value, FilterValue::Text("A".to_string()));
    }

    #[test]
    fn test_empty_constraints_fall_back_to_own_value() {
        let filters = FilterMap::parse(
            r#"{"status": {"value": "A", "matchMode": "equals", "constraints": []}}"#,
        )
        .unwrap();
        let (_, filter) = filters.iter().next().unwrap();
        assert!(matches!(filter, Filter::Simple(_)));
    }

    #[test]
    fn test_key_order_is_preserved() {
        let filters = FilterMap::parse(
            r#"{"zeta": {"value": "1", "matchMode": "equals"},
                "alpha": {"value": "2", "matchMode": "equals"},
                "mid": {"value": "3", "matchMode": "equals"}}"#,
        )
        .unwrap();
        let columns: Vec<&str> = filters.iter().map(|(column, _)| column).collect();
        assert_eq!(columns, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_malformed_json_is_invalid_input() {
        let err = FilterMap::parse("{not json").unwrap_err();
        assert!(matches!(err, DataTableError::InvalidInput { .. }));

        let err = FilterMap::parse(r#"["name"]"#).unwrap_err();
        assert!(matches!(err, DataTableError::InvalidInput { .. }));

        let err = FilterMap::parse(r#"{"name": "ann"}"#).unwrap_err();
        assert!(matches!(err, DataTableError::InvalidInput { .. }));
    }

    #[test]
    fn test_object_value_is_invalid_input() {
        let err =
            FilterMap::parse(r#"{"name": {"value": {"nested": 1}, "matchMode": "equals"}}"#)
                .unwrap_err();
        assert!(matches!(err, DataTableError::InvalidInput { .. }));
    }

    #[test]
    fn test_blank_param_means_no_filters() {
        assert!(FilterMap::from_param(None).unwrap().is_empty());
        assert!(FilterMap::from_param(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_falsy_values() {
        assert!(FilterValue::Null.is_falsy());
        assert!(FilterValue::Bool(false).is_falsy());
        assert!(FilterValue::Text(String::new()).is_falsy());
        assert!(FilterValue::List(vec![]).is_falsy());
        assert!(FilterValue::Text("0".to_string()).is_falsy());
        assert!(FilterValue::Number(0.into()).is_falsy());
        assert!(FilterValue::Number(serde_json::Number::from_f64(0.0).unwrap()).is_falsy());

        assert!(!FilterValue::Text("0.0".to_string()).is_falsy());
        assert!(!FilterValue::Text(" ".to_string()).is_falsy());
        assert!(!FilterValue::Number(10.into()).is_falsy());
        assert!(!FilterValue::Bool(true).is_falsy());
    }

    #[test]
    fn test_sql_values_keep_native_types() {
        assert_eq!(
            FilterValue::Number(42.into()).to_sql_value(),
            Some(Value::from(42_i64))
        );
        assert_eq!(FilterValue::Bool(true).to_sql_value(), Some(Value::from(true)));
        assert_eq!(FilterValue::Null.to_sql_value(), None);

        let list = FilterValue::List(vec![
            FilterValue::Text("a".to_string()),
            FilterValue::Number(2.into()),
        ]);
        assert_eq!(
            list.to_sql_values(),
            vec![Value::from("a".to_string()), Value::from(2_i64)]
        );
    }

    #[test]
    fn test_missing_value_is_null() {
        let filters = FilterMap::parse(r#"{"name": {"matchMode": "contains"}}"#).unwrap();
        let (_, filter) = filters.iter().next().unwrap();
        let (_, constraints) = filter.constraints();
        assert_eq!(constraints[0].value, FilterValue::Null);
    }
}
