use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Store failure classes, mirroring the backends we talk to.
///
/// The variant decides retryability: quota, network, and unknown failures are
/// assumed transient; auth, permission, document, and collection failures are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    AuthFailed,
    PermissionDenied,
    QuotaExceeded,
    NetworkError,
    InvalidDocument,
    CollectionNotFound,
    Unknown,
}

impl StoreErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreErrorKind::QuotaExceeded | StoreErrorKind::NetworkError | StoreErrorKind::Unknown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreErrorKind::AuthFailed => "AUTH_FAILED",
            StoreErrorKind::PermissionDenied => "PERMISSION_DENIED",
            StoreErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            StoreErrorKind::NetworkError => "NETWORK_ERROR",
            StoreErrorKind::InvalidDocument => "INVALID_DOCUMENT",
            StoreErrorKind::CollectionNotFound => "COLLECTION_NOT_FOUND",
            StoreErrorKind::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connector error taxonomy.
///
/// Every failure raised inside the sync core is classified into exactly one
/// of these variants at its origin; retry decisions are made from the
/// classification alone, never from ad hoc inspection further up the stack.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    /// The source API answered with a non-success HTTP status.
    #[error("source API error: HTTP {status}")]
    SourceApi {
        status: u16,
        /// Seconds from a Retry-After header, when the source sent one.
        retry_after: Option<u64>,
    },

    /// Source failure with no usable HTTP status (connect error, malformed
    /// body). Treated as terminal: an upstream we cannot classify is assumed
    /// broken, not busy.
    #[error("source unavailable: {message}")]
    SourceUnavailable { message: String },

    /// Document store failure, classified by kind.
    #[error("store error [{kind}]: {message}")]
    Store { kind: StoreErrorKind, message: String },

    /// A record (or call argument) failed validation. Never retried.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Pipeline-level failure. Retryable only when no validation errors are
    /// attached, i.e. the failure was incidental rather than a rejection.
    #[error("sync failed: {message}")]
    Orchestration {
        message: String,
        validation_errors: Vec<String>,
    },

    /// Configuration loading or validation failure. Raised before a sync run
    /// starts, never inside the retry machinery.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ConnectorError {
    /// Stable machine-readable code for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            ConnectorError::SourceApi { .. } => "SOURCE_API_ERROR",
            ConnectorError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            ConnectorError::Store { .. } => "STORE_ERROR",
            ConnectorError::Validation { .. } => "VALIDATION_ERROR",
            ConnectorError::Orchestration { .. } => "SYNC_FAILED",
            ConnectorError::Config { .. } => "CONFIG_ERROR",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ConnectorError::Validation {
            message: message.into(),
        }
    }

    pub fn store(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        ConnectorError::Store {
            kind,
            message: message.into(),
        }
    }

    /// Classify a source HTTP status into the taxonomy.
    pub fn from_source_status(status: u16, retry_after: Option<u64>) -> Self {
        ConnectorError::SourceApi {
            status,
            retry_after,
        }
    }

    /// Classify a raw store failure message by sniffing for well-known
    /// substrings. Anything unrecognized lands in `Unknown` (retryable).
    pub fn from_store_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = classify_store_message(&message);
        ConnectorError::Store { kind, message }
    }
}

/// Retryability classification, implemented by every error the retry engine
/// can see.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ConnectorError {
    fn is_retryable(&self) -> bool {
        match self {
            // 429 and server-side failures are worth another attempt; every
            // other status is a terminal answer.
            ConnectorError::SourceApi { status, .. } => *status == 429 || *status >= 500,
            ConnectorError::SourceUnavailable { .. } => false,
            ConnectorError::Store { kind, .. } => kind.is_retryable(),
            ConnectorError::Validation { .. } => false,
            ConnectorError::Orchestration {
                validation_errors, ..
            } => validation_errors.is_empty(),
            ConnectorError::Config { .. } => false,
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ConnectorError::from_source_status(status.as_u16(), None),
            None => ConnectorError::SourceUnavailable {
                message: err.to_string(),
            },
        }
    }
}

fn classify_store_message(message: &str) -> StoreErrorKind {
    let lowered = message.to_lowercase();
    if lowered.contains("unauthenticated") || lowered.contains("auth") {
        StoreErrorKind::AuthFailed
    } else if lowered.contains("permission denied") || lowered.contains("forbidden") {
        StoreErrorKind::PermissionDenied
    } else if lowered.contains("quota") || lowered.contains("resource exhausted") {
        StoreErrorKind::QuotaExceeded
    } else if lowered.contains("network")
        || lowered.contains("connection")
        || lowered.contains("timeout")
        || lowered.contains("unavailable")
    {
        StoreErrorKind::NetworkError
    } else if lowered.contains("invalid document") || lowered.contains("invalid argument") {
        StoreErrorKind::InvalidDocument
    } else if lowered.contains("collection") && lowered.contains("not found") {
        StoreErrorKind::CollectionNotFound
    } else {
        StoreErrorKind::Unknown
    }
}

/// Map an io error kind onto the store taxonomy. Used by file-backed stores.
pub fn classify_io_error(err: &std::io::Error) -> StoreErrorKind {
    use std::io::ErrorKind;
    match err.kind() {
        ErrorKind::PermissionDenied => StoreErrorKind::PermissionDenied,
        ErrorKind::NotFound => StoreErrorKind::CollectionNotFound,
        ErrorKind::TimedOut
        | ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe => StoreErrorKind::NetworkError,
        _ => StoreErrorKind::Unknown,
    }
}
