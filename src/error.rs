//! Error taxonomy for the settings store
//!
//! Only a store-wide failure is an error in the usual sense. A missing or
//! malformed individual key is an expected condition: the codec keeps the
//! compiled default and carries on.

use thiserror::Error;

/// The backing store could not be read or written at all.
///
/// When this surfaces from a load, the in-memory state (compiled defaults or
/// the last successful load) remains authoritative. The caller decides
/// whether to retry; nothing in this crate retries automatically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings store unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("settings store is not a valid JSON document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Outcome of a single typed read from the store.
///
/// `Absent` and `TypeMismatch` are both resolved by falling back to the
/// field's default; they are distinct so the codec can log mismatches
/// (a foreign or corrupt value) without logging every fresh install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("key not present")]
    Absent,

    #[error("stored value has the wrong shape")]
    TypeMismatch,
}
