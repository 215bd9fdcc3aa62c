//! # Error Handling
//!
//! Only [`DataTableError::InvalidInput`] and database failures ever abort a
//! request. Unknown operators and failed enrichment calls are reported through
//! this type internally, logged, and then swallowed so that the caller still
//! receives a reduced but valid result.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use datatable::{DataTable, DataTableError, DataTableParams};
//!
//! async fn list_users(
//!     Query(params): Query<DataTableParams>,
//!     State(db): State<DatabaseConnection>,
//! ) -> Result<PageResponse<serde_json::Value>, DataTableError> {
//!     let page = DataTable::new(config()).get_data(&db, &params, users::Entity).await?;
//!     Ok(page.into_json()?)
//! }
//! ```
//!
//! Responses never carry database details; those are logged with `tracing`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Errors raised while translating a data-table request into a query.
#[derive(Debug)]
pub enum DataTableError {
    /// 400 Bad Request - malformed filter JSON, unparseable date, bad filter shape
    InvalidInput {
        /// User-facing error message
        message: String,
    },

    /// Filter or search operator outside the supported set.
    ///
    /// Callers skip the offending clause; this only reaches a response if a
    /// caller chooses to propagate it.
    UnknownOperator {
        /// The operator as it appeared in the request
        operator: String,
    },

    /// The enrichment transport failed or returned an unusable body.
    RemoteEnrichment {
        /// Internal details (logged, not sent to user)
        details: String,
    },

    /// 500 Internal Server Error - database error (details logged, not exposed)
    Database {
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },
}

impl DataTableError {
    /// Create an `InvalidInput` error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unknown_operator(operator: impl Into<String>) -> Self {
        Self::UnknownOperator {
            operator: operator.into(),
        }
    }

    pub fn remote_enrichment(details: impl Into<String>) -> Self {
        Self::RemoteEnrichment {
            details: details.into(),
        }
    }

    /// Wrap a database error. The details are logged but never sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database { internal: err }
    }

    /// Whether this error aborts the request, as opposed to degrading it.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::Database { .. })
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } | Self::UnknownOperator { .. } => StatusCode::BAD_REQUEST,
            Self::RemoteEnrichment { .. } => StatusCode::BAD_GATEWAY,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { message } => message.clone(),
            Self::UnknownOperator { operator } => format!("Unsupported operator '{operator}'"),
            Self::RemoteEnrichment { .. } => "Failed to load related records".to_string(),
            Self::Database { .. } => "A database error occurred".to_string(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::RemoteEnrichment { details } => {
                tracing::error!(details = %details, "Remote enrichment error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "Data table request rejected"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for DataTableError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for DataTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoteEnrichment { details } => write!(f, "remote enrichment failed: {details}"),
            Self::Database { internal } => write!(f, "database error: {internal}"),
            _ => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for DataTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database { internal } => Some(internal),
            _ => None,
        }
    }
}

impl From<DbErr> for DataTableError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}

impl From<serde_json::Error> for DataTableError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_input(format!("Malformed JSON: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, DataTableError>;
