//! Error taxonomy shared by DA backends and proxies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by [`DataAvailability`](crate::DataAvailability) operations.
///
/// The domain kinds (everything with an [`ErrorCode`]) survive a trip through a
/// proxy unchanged. The remaining variants describe failures that have no wire
/// representation and reach the caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DaError {
    #[error("blob: not found")]
    BlobNotFound,
    #[error("blob: over size limit")]
    BlobSizeOverLimit,
    #[error("timed out waiting for tx to be included in a block")]
    TxTimedOut,
    #[error("tx already in mempool")]
    TxAlreadyInMempool,
    #[error("incorrect account sequence")]
    TxIncorrectAccountSequence,
    #[error("tx too large")]
    TxTooLarge,
    #[error("context deadline")]
    DeadlineExceeded,
    #[error("given height is from the future")]
    FutureHeight,
    #[error("invalid ID")]
    InvalidId,
    #[error("number of IDs doesn't equal to number of proofs")]
    LengthMismatch,

    /// A wire error that carried no recognizable detail.
    #[error("JSON-RPC error: code={code}, message={message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Uncategorized backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl DaError {
    /// Wire code for this error, if it belongs to the closed set of domain kinds.
    pub fn code(&self) -> Option<ErrorCode> {
        let code = match self {
            Self::BlobNotFound => ErrorCode::BlobNotFound,
            Self::BlobSizeOverLimit => ErrorCode::BlobSizeOverLimit,
            Self::TxTimedOut => ErrorCode::TxTimedOut,
            Self::TxAlreadyInMempool => ErrorCode::TxAlreadyInMempool,
            Self::TxIncorrectAccountSequence => ErrorCode::TxIncorrectAccountSequence,
            Self::TxTooLarge => ErrorCode::TxTooLarge,
            Self::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            Self::FutureHeight => ErrorCode::FutureHeight,
            Self::InvalidId => ErrorCode::InvalidId,
            Self::LengthMismatch => ErrorCode::LengthMismatch,
            Self::Rpc { .. } | Self::Transport(_) | Self::InvalidResponse(_) | Self::Backend(_) => {
                return None
            }
        };
        Some(code)
    }

    /// Structured detail to attach to a wire error.
    pub fn details(&self) -> Option<ErrorDetails> {
        self.code().map(|code| ErrorDetails {
            code,
            message: self.to_string(),
        })
    }
}

/// Machine-readable error kinds carried across the proxy boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BlobNotFound,
    BlobSizeOverLimit,
    TxTimedOut,
    TxAlreadyInMempool,
    TxIncorrectAccountSequence,
    TxTooLarge,
    DeadlineExceeded,
    FutureHeight,
    InvalidId,
    LengthMismatch,
}

impl ErrorCode {
    /// All known codes.
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::BlobNotFound,
        ErrorCode::BlobSizeOverLimit,
        ErrorCode::TxTimedOut,
        ErrorCode::TxAlreadyInMempool,
        ErrorCode::TxIncorrectAccountSequence,
        ErrorCode::TxTooLarge,
        ErrorCode::DeadlineExceeded,
        ErrorCode::FutureHeight,
        ErrorCode::InvalidId,
        ErrorCode::LengthMismatch,
    ];

    /// Numeric code used as the JSON-RPC error code.
    pub fn as_i64(self) -> i64 {
        match self {
            Self::BlobNotFound => 32001,
            Self::BlobSizeOverLimit => 32002,
            Self::TxTimedOut => 32003,
            Self::TxAlreadyInMempool => 32004,
            Self::TxIncorrectAccountSequence => 32005,
            Self::TxTooLarge => 32006,
            Self::DeadlineExceeded => 32007,
            Self::FutureHeight => 32008,
            Self::InvalidId => 32009,
            Self::LengthMismatch => 32010,
        }
    }

    /// Inverse of [`ErrorCode::as_i64`].
    pub fn from_i64(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_i64() == code)
    }
}

impl From<ErrorCode> for DaError {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::BlobNotFound => Self::BlobNotFound,
            ErrorCode::BlobSizeOverLimit => Self::BlobSizeOverLimit,
            ErrorCode::TxTimedOut => Self::TxTimedOut,
            ErrorCode::TxAlreadyInMempool => Self::TxAlreadyInMempool,
            ErrorCode::TxIncorrectAccountSequence => Self::TxIncorrectAccountSequence,
            ErrorCode::TxTooLarge => Self::TxTooLarge,
            ErrorCode::DeadlineExceeded => Self::DeadlineExceeded,
            ErrorCode::FutureHeight => Self::FutureHeight,
            ErrorCode::InvalidId => Self::InvalidId,
            ErrorCode::LengthMismatch => Self::LengthMismatch,
        }
    }
}

/// Detail payload attached to a wire error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in ErrorCode::ALL {
            let err = DaError::from(code);
            assert_eq!(err.code(), Some(code));
            assert_eq!(ErrorCode::from_i64(code.as_i64()), Some(code));
        }
    }

    #[test]
    fn test_opaque_errors_have_no_code() {
        assert_eq!(DaError::Backend("boom".into()).code(), None);
        assert_eq!(DaError::Transport("refused".into()).details(), None);
        assert_eq!(
            DaError::Rpc {
                code: -32000,
                message: "x".into()
            }
            .code(),
            None
        );
        assert_eq!(ErrorCode::from_i64(-32000), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(DaError::BlobNotFound.to_string(), "blob: not found");
        assert_eq!(DaError::DeadlineExceeded.to_string(), "context deadline");
        assert_eq!(
            DaError::DeadlineExceeded.details().unwrap().message,
            "context deadline"
        );
    }

    #[test]
    fn test_details_serialization() {
        let details = DaError::FutureHeight.details().unwrap();
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["code"], "future_height");
        assert_eq!(json["message"], "given height is from the future");

        let parsed: ErrorDetails = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, details);
    }

    #[test]
    fn test_unknown_detail_code_rejected() {
        let json = serde_json::json!({ "code": "out_of_gas", "message": "?" });
        assert!(serde_json::from_value::<ErrorDetails>(json).is_err());
    }
}
