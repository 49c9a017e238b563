pub use super::errors::{ErrorKind, FetchError};

/// Result used by method that can failed.
pub type FetchResult<T> = Result<T, FetchError>;
