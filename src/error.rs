//! Error types for the vfscache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by cache operations. `NotFound` is the
//!   documented miss signal of `get`; `AsyncFailure` surfaces worker-side
//!   failures through task handles.
//! - [`ConfigError`]: Returned when cache configuration parameters are
//!   invalid (e.g. a zero-sized worker pool).
//!
//! ## Example Usage
//!
//! ```
//! use vfscache::error::CacheError;
//! use vfscache::policy::lru::LruCore;
//! use vfscache::traits::PolicyCache;
//!
//! let mut cache: LruCore<&str, i32> = LruCore::new(4);
//! assert_eq!(cache.get(&"missing"), Err(CacheError::NotFound));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache operations.
///
/// `NotFound` is retryable by the caller: reload from the source of truth and
/// optionally re-populate via `put`. It is a typed miss signal, not a
/// control-flow mechanism; callers that only need existence should use
/// `contains`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `get` on an absent key.
    NotFound,
    /// Operation rejected because the cache was configured with capacity 0.
    ///
    /// The engine itself treats zero capacity as a documented silent no-op
    /// (`put`/`prefetch` store nothing, `get` misses); this kind is for
    /// callers that want to reject such configurations up front.
    CapacityZero,
    /// An asynchronous task failed before producing a result. Carries a
    /// description of the underlying cause.
    AsyncFailure(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotFound => f.write_str("key not found in cache"),
            CacheError::CapacityZero => f.write_str("cache capacity is zero"),
            CacheError::AsyncFailure(cause) => write!(f, "async operation failed: {cause}"),
        }
    }
}

impl std::error::Error for CacheError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible builder methods such as
/// [`CacheBuilder::try_build_concurrent`](crate::builder::CacheBuilder::try_build_concurrent).
/// Carries a human-readable description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
