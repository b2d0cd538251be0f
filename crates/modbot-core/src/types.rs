//! ============================================================================
//! Core Types for Modbot Memory
//! ============================================================================
//! Error taxonomy shared by the storage adapters and the memory tiers.
//! Read paths degrade these errors to empty results; only archive saves
//! hand them back to the caller.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Error types for the memory subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum MemoryError {
    /// The adapter could not be reached, refused the write, or ran out of space
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored payload could not be decoded
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// An import payload was not a list of conversations
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    /// A value could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MemoryError {
    pub fn storage(msg: impl Into<String>) -> Self {
        MemoryError::StorageUnavailable(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        MemoryError::MalformedData(msg.into())
    }

    /// True for failures that mean "nothing usable is stored" rather than
    /// "storage could not be consulted".
    pub fn is_malformed(&self) -> bool {
        matches!(self, MemoryError::MalformedData(_))
    }
}

pub type MemoryResult<T> = Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoryError::storage("quota exceeded");
        assert_eq!(err.to_string(), "Storage unavailable: quota exceeded");

        let err = MemoryError::InvalidImport("expected an array".to_string());
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn test_is_malformed() {
        assert!(MemoryError::malformed("bad json").is_malformed());
        assert!(!MemoryError::storage("offline").is_malformed());
    }
}
