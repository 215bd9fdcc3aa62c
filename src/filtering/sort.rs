use sea_orm::{Order, sea_query::SimpleExpr};

use super::conditions::{column_expr, is_valid_identifier};

/// Convert a direction literal to `Order`; only `asc` and `desc` are accepted.
fn parse_direction(direction: &str) -> Option<Order> {
    match direction.to_ascii_lowercase().as_str() {
        "asc" => Some(Order::Asc),
        "desc" => Some(Order::Desc),
        _ => None,
    }
}

/// A single `ORDER BY` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub direction: Order,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: Order) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Resolve the requested sort, falling back to `default` unless both the
    /// field and a valid direction were given.
    #[must_use]
    pub fn resolve(field: Option<&str>, direction: Option<&str>, default: &SortSpec) -> SortSpec {
        let field = field.map(str::trim).filter(|f| !f.is_empty());
        let direction = direction.map(str::trim).filter(|d| !d.is_empty());

        let (Some(field), Some(direction)) = (field, direction) else {
            return default.clone();
        };

        let Some(order) = parse_direction(direction) else {
            tracing::debug!(field, direction, "Unsupported sort direction, using default sort");
            return default.clone();
        };

        if !is_valid_identifier(field) {
            tracing::debug!(field, "Invalid sort field, using default sort");
            return default.clone();
        }

        SortSpec::new(field, order)
    }

    #[must_use]
    pub fn column(&self) -> SimpleExpr {
        column_expr(&self.field).into()
    }
}
