//! Error types with HTTP status code mapping.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::access::Entity;
use crate::model::{ListId, NamespaceId, TaskId};
use crate::permission::Right;

/// Error type for trellis operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Authorization errors
    #[error("Forbidden: {need} access required on {entity}")]
    Forbidden { entity: Entity, need: Right },

    #[error("{0} is archived")]
    ListArchived(ListId),

    #[error("{0} is archived")]
    NamespaceArchived(NamespaceId),

    #[error("Link sharing is disabled")]
    LinkSharingDisabled,

    // Lookup errors
    #[error("{0} does not exist")]
    NamespaceNotFound(NamespaceId),

    #[error("{0} does not exist")]
    ListNotFound(ListId),

    #[error("{0} does not exist")]
    TaskNotFound(TaskId),

    #[error("Invalid link share")]
    InvalidLinkShare,

    // Data errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // System errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for the "no such entity" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NamespaceNotFound(_)
                | Error::ListNotFound(_)
                | Error::TaskNotFound(_)
                | Error::InvalidLinkShare
        )
    }

    /// True when the entity or its parent is archived.
    pub fn is_archived(&self) -> bool {
        matches!(self, Error::ListArchived(_) | Error::NamespaceArchived(_))
    }

    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Forbidden { .. } | Error::LinkSharingDisabled => StatusCode::FORBIDDEN,

            // Archived entities refuse mutation until unarchived
            Error::ListArchived(_) | Error::NamespaceArchived(_) => {
                StatusCode::PRECONDITION_FAILED
            }

            Error::NamespaceNotFound(_)
            | Error::ListNotFound(_)
            | Error::TaskNotFound(_)
            | Error::InvalidLinkShare => StatusCode::NOT_FOUND,

            Error::BadRequest(_) => StatusCode::BAD_REQUEST,

            // Config errors -> 500 (shouldn't happen at runtime)
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Error::Io(_) | Error::Json(_) | Error::Database(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert error into HTTP response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!("Internal error: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = serde_json::json!({
            "error": message
        });

        let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// Result type alias using trellis's Error.
pub type Result<T> = std::result::Result<T, Error>;
