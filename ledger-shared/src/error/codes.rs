//! Unified error codes for the GL/scheduler service
//!
//! Codes are grouped by range so the category can be derived arithmetically
//! (see [`super::category`]):
//!
//! - 0xxx: General
//! - 1xxx: Validation
//! - 2xxx: POS vendor integration
//! - 3xxx: Aggregation / invariant violations
//! - 4xxx: Storage (Postgres / Redis)
//! - 5xxx: Scheduler / job
//! - 9xxx: System

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    Success = 0,
    Unknown = 1,
    NotFound = 3,
    InvalidRequest = 5,

    // ==================== 1xxx: Validation ====================
    ValidationFailed = 1001,
    RequiredField = 1002,
    ValueOutOfRange = 1003,

    // ==================== 2xxx: POS vendor ====================
    /// HTTP 5xx, timeout, connection reset. One retry already attempted.
    PosNetworkTransient = 2001,
    /// HTTP 4xx other than 429.
    PosNetworkPermanent = 2002,
    /// Malformed JSON/CSV response body.
    PosParseError = 2003,

    // ==================== 3xxx: Aggregation ====================
    /// Debits and credits failed to balance before overage reconciliation.
    InvariantViolation = 3001,
    /// A CSV/JSON import row was missing a recognized column.
    UnrecognizedColumn = 3002,
    /// A dashboard location name could not be mapped to a known store.
    UnknownStoreAlias = 3003,

    // ==================== 4xxx: Storage ====================
    StorageUnavailable = 4001,
    DatabaseError = 4002,
    CacheError = 4003,

    // ==================== 5xxx: Scheduler ====================
    UnknownQueue = 5001,
    JobFailed = 5002,
    ConfigMissing = 5003,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl ErrorCode {
    pub fn code(&self) -> u16 {
        *self as u16
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "OK",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::RequiredField => "Required field missing",
            ErrorCode::ValueOutOfRange => "Value out of range",
            ErrorCode::PosNetworkTransient => "POS vendor request failed after retry",
            ErrorCode::PosNetworkPermanent => "POS vendor rejected the request",
            ErrorCode::PosParseError => "POS vendor response could not be parsed",
            ErrorCode::InvariantViolation => "GL aggregation produced unbalanced totals",
            ErrorCode::UnrecognizedColumn => "No recognized column mapping found",
            ErrorCode::UnknownStoreAlias => "Location name does not map to a known store",
            ErrorCode::StorageUnavailable => "Storage backend unavailable",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::CacheError => "Cache error",
            ErrorCode::UnknownQueue => "Unknown queue name",
            ErrorCode::JobFailed => "Job failed",
            ErrorCode::ConfigMissing => "Required configuration is missing",
            ErrorCode::InternalError => "Internal error",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::Success => StatusCode::OK,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidRequest
            | ErrorCode::ValidationFailed
            | ErrorCode::RequiredField
            | ErrorCode::ValueOutOfRange
            | ErrorCode::UnrecognizedColumn
            | ErrorCode::UnknownStoreAlias => StatusCode::BAD_REQUEST,
            ErrorCode::UnknownQueue => StatusCode::NOT_FOUND,
            ErrorCode::PosNetworkPermanent => StatusCode::BAD_GATEWAY,
            ErrorCode::PosNetworkTransient | ErrorCode::StorageUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorCode::ConfigMissing => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            3 => ErrorCode::NotFound,
            5 => ErrorCode::InvalidRequest,
            1001 => ErrorCode::ValidationFailed,
            1002 => ErrorCode::RequiredField,
            1003 => ErrorCode::ValueOutOfRange,
            2001 => ErrorCode::PosNetworkTransient,
            2002 => ErrorCode::PosNetworkPermanent,
            2003 => ErrorCode::PosParseError,
            3001 => ErrorCode::InvariantViolation,
            3002 => ErrorCode::UnrecognizedColumn,
            3003 => ErrorCode::UnknownStoreAlias,
            4001 => ErrorCode::StorageUnavailable,
            4002 => ErrorCode::DatabaseError,
            4003 => ErrorCode::CacheError,
            5001 => ErrorCode::UnknownQueue,
            5002 => ErrorCode::JobFailed,
            5003 => ErrorCode::ConfigMissing,
            9001 => ErrorCode::InternalError,
            other => return Err(InvalidErrorCode(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_u16() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::PosNetworkTransient,
            ErrorCode::InvariantViolation,
            ErrorCode::ConfigMissing,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw).unwrap(), code);
        }
    }

    #[test]
    fn category_ranges_match_code_prefix() {
        use super::super::category::ErrorCategory;
        assert_eq!(ErrorCode::ValidationFailed.category(), ErrorCategory::Validation);
        assert_eq!(ErrorCode::PosParseError.category(), ErrorCategory::Pos);
        assert_eq!(ErrorCode::InvariantViolation.category(), ErrorCategory::Aggregation);
        assert_eq!(ErrorCode::StorageUnavailable.category(), ErrorCategory::Storage);
        assert_eq!(ErrorCode::ConfigMissing.category(), ErrorCategory::Scheduler);
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::System);
    }
}
