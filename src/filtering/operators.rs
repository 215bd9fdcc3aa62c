use std::fmt;
use std::str::FromStr;

use crate::errors::DataTableError;

/// Comparison operators accepted in the `matchMode` of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
    Equals,
    NotEquals,
    In,
    Lt,
    Lte,
    Gt,
    Gte,
    DateAfter,
    DateBefore,
    DateIs,
    DateIsNot,
}

impl MatchMode {
    pub const ALL: [Self; 15] = [
        Self::StartsWith,
        Self::EndsWith,
        Self::Contains,
        Self::NotContains,
        Self::Equals,
        Self::NotEquals,
        Self::In,
        Self::Lt,
        Self::Lte,
        Self::Gt,
        Self::Gte,
        Self::DateAfter,
        Self::DateBefore,
        Self::DateIs,
        Self::DateIsNot,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Contains => "contains",
            Self::NotContains => "notContains",
            Self::Equals => "equals",
            Self::NotEquals => "notEquals",
            Self::In => "in",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::DateAfter => "dateAfter",
            Self::DateBefore => "dateBefore",
            Self::DateIs => "dateIs",
            Self::DateIsNot => "dateIsNot",
        }
    }

    /// Operators whose value must be a `YYYY-MM-DD` date.
    #[must_use]
    pub const fn is_date(self) -> bool {
        matches!(
            self,
            Self::DateAfter | Self::DateBefore | Self::DateIs | Self::DateIsNot
        )
    }
}

impl FromStr for MatchMode {
    type Err = DataTableError;

    /// Operator names are matched exactly, as sent by the client.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| DataTableError::unknown_operator(s))
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the constraints of a grouped filter are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOperator {
    #[default]
    And,
    Or,
}

impl GroupOperator {
    /// Only the exact literal `"or"` selects [`GroupOperator::Or`].
    #[must_use]
    pub fn parse(operator: Option<&str>) -> Self {
        match operator {
            Some("or") => Self::Or,
            _ => Self::And,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mode_round_trips_through_its_name() {
        for mode in MatchMode::ALL {
            assert_eq!(mode.as_str().parse::<MatchMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let err = "between".parse::<MatchMode>().unwrap_err();
        assert!(matches!(err, DataTableError::UnknownOperator { ref operator } if operator == "between"));
    }

    #[test]
    fn test_operator_names_are_case_sensitive() {
        assert!("STARTSWITH".parse::<MatchMode>().is_err());
        assert!("Equals".parse::<MatchMode>().is_err());
    }

    #[test]
    fn test_date_modes() {
        assert!(MatchMode::DateIs.is_date());
        assert!(MatchMode::DateIsNot.is_date());
        assert!(!MatchMode::Gte.is_date());
    }

    #[test]
    fn test_group_operator_requires_exact_or() {
        assert_eq!(GroupOperator::parse(Some("or")), GroupOperator::Or);
        assert_eq!(GroupOperator::parse(Some("OR")), GroupOperator::And);
        assert_eq!(GroupOperator::parse(Some("and")), GroupOperator::And);
        assert_eq!(GroupOperator::parse(None), GroupOperator::And);
    }
}
