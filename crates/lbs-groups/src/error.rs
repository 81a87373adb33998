//! Error types for the group layer
//!
//! Provides error handling for:
//! - Storage reads and writes of the persisted configuration blob
//! - Encoding/decoding of that blob
//! - Store operations addressing groups that do not exist

use lbs_model::GroupType;

/// Errors raised by a storage backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Backend refused or failed the read
    #[error("read of '{key}' failed: {message}")]
    ReadFailed {
        /// Storage key being read
        key: String,
        /// Backend message
        message: String,
    },

    /// Backend refused or failed the write
    #[error("write of '{key}' failed: {message}")]
    WriteFailed {
        /// Storage key being written
        key: String,
        /// Backend message
        message: String,
    },

    /// Backend has no room left
    #[error("storage quota exceeded while writing '{0}'")]
    QuotaExceeded(String),
}

impl StorageError {
    /// Create read failure for key
    pub fn read_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create write failure for key
    pub fn write_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors while encoding or decoding the configuration blob
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Blob is not valid JSON for a group configuration
    #[error("malformed group configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors from store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No group at the given position
    #[error("no {group_type} group at index {index}")]
    GroupNotFound {
        /// Group list addressed
        group_type: GroupType,
        /// Requested position
        index: usize,
    },

    /// Removing this group would leave its type empty where one is required
    #[error("the last {0} group cannot be removed")]
    LastRequiredGroup(GroupType),

    /// Persisting the current state failed
    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

impl StoreError {
    /// Create not-found error
    #[inline]
    pub fn not_found(group_type: GroupType, index: usize) -> Self {
        Self::GroupNotFound { group_type, index }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
