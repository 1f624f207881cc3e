//! Response envelope shared by every operation.
//!
//! Every response carries a success flag and a human-readable message;
//! successes carry the data payload (plus pagination on listings), failures
//! carry the error taxonomy instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::query::{Paginated, Pagination};
use crate::service::ServiceError;

/// Failure taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Forbidden,
    NotFound,
    ValidationFailed,
    ReferenceError,
    PersistenceFailure,
}

/// Generic message for store failures; the underlying cause is logged, never
/// exposed.
pub const STORE_FAILURE_MESSAGE: &str = "A storage error occurred while processing the request";

/// Operation response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Field-keyed violation messages, present on validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: None,
            error: None,
            errors: None,
        }
    }

    /// Success envelope with no data payload (e.g. delete confirmations).
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            pagination: None,
            error: None,
            errors: None,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            pagination: None,
            error: Some(kind),
            errors: None,
        }
    }

    /// Convert a service failure into its envelope.
    pub fn from_error(err: ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(message) => Self::failure(ErrorKind::Forbidden, message),
            ServiceError::NotFound => {
                Self::failure(ErrorKind::NotFound, "Treatment record not found")
            }
            ServiceError::Validation(report) => Self {
                errors: Some(report.into_errors()),
                ..Self::failure(ErrorKind::ValidationFailed, "Validation failed")
            },
            ServiceError::Reference(message) => Self::failure(ErrorKind::ReferenceError, message),
            ServiceError::Database(_) => {
                Self::failure(ErrorKind::PersistenceFailure, STORE_FAILURE_MESSAGE)
            }
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Success envelope for a paginated listing.
    pub fn ok_page(message: impl Into<String>, page: Paginated<T>) -> Self {
        Self {
            pagination: Some(page.pagination),
            ..Self::ok(message, page.items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Pagination;
    use crate::validate::ValidationReport;

    #[test]
    fn test_ok_envelope() {
        let resp = ApiResponse::ok("Done", 42);
        assert!(resp.success);
        assert_eq!(resp.data, Some(42));
        assert!(resp.error.is_none());

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(!json.contains("pagination"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_ok_page_carries_pagination() {
        let page = Paginated {
            items: vec![1, 2, 3],
            pagination: Pagination::new(1, 3),
        };
        let resp = ApiResponse::ok_page("Listed", page);
        assert_eq!(resp.pagination.as_ref().map(|p| p.total), Some(3));
        assert_eq!(resp.data.as_deref(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn test_ok_empty_has_no_data_key() {
        let resp: ApiResponse<()> = ApiResponse::ok_empty("Deleted");
        assert!(resp.success);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("data"));
    }

    #[test]
    fn test_validation_failure_carries_field_errors() {
        let mut report = ValidationReport::new();
        report.add("complaint", "is required");

        let resp: ApiResponse<()> = ApiResponse::from_error(ServiceError::Validation(report));
        assert!(!resp.success);
        assert_eq!(resp.error, Some(ErrorKind::ValidationFailed));
        assert!(resp.errors.unwrap().contains_key("complaint"));
    }

    #[test]
    fn test_persistence_failure_is_generic() {
        let cause = crate::db::DbError::Constraint("secret internals".into());
        let resp: ApiResponse<()> = ApiResponse::from_error(ServiceError::Database(cause));
        assert_eq!(resp.error, Some(ErrorKind::PersistenceFailure));
        assert_eq!(resp.message, STORE_FAILURE_MESSAGE);
        assert!(!resp.message.contains("secret"));
    }

    #[test]
    fn test_error_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::ValidationFailed).unwrap(),
            "\"validation_failed\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::NotFound).unwrap(),
            "\"not_found\""
        );
    }
}
