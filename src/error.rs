//! Error taxonomy shared by the builder, renderer, and executor.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Convenience alias for fallible query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors surfaced while building, rendering, or executing a query.
///
/// Construction errors fail fast, render errors fail before any network
/// activity, and fetch/decode errors only ever surface while rows are pulled.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Bad construction input, such as an empty table name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Predicate contains a node the query grammar cannot express.
    #[error("unsupported expression: {kind}")]
    UnsupportedExpression {
        /// Kind of the offending node.
        kind: &'static str,
    },
    /// Projection element is not a direct field reference.
    #[error("unsupported projection at position {position}: {kind}")]
    UnsupportedProjection {
        /// Zero-based position of the element in the projection.
        position: usize,
        /// Kind of the offending node.
        kind: &'static str,
    },
    /// Projection selects no fields.
    #[error("projection must select at least one field")]
    EmptyProjection,
    /// Two projection elements produce the same result field.
    #[error("projection produces result field '{name}' more than once")]
    DuplicateProjection {
        /// Result field name produced twice.
        name: String,
    },
    /// Field reference does not resolve against the source record shape.
    #[error("field '{field}' is not declared by record shape '{shape}'")]
    UnknownField {
        /// Referenced field name.
        field: String,
        /// Name of the record shape that was consulted.
        shape: &'static str,
    },
    /// Predicate text could not be parsed.
    #[error("invalid predicate at byte {position}: {message}")]
    InvalidPredicate {
        /// Byte offset into the predicate text.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },
    /// Transport failed before a response was received.
    #[error("fetch of {url} failed: {source}")]
    FetchFailed {
        /// Request target that was being fetched.
        url: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// Remote endpoint answered with a non-2xx status.
    #[error("request rejected with status {status}: {body}")]
    RequestRejected {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded and truncated.
        body: String,
    },
    /// Response payload did not match the expected shape.
    #[error("decode failed: expected {expected}, found {actual}")]
    DecodeFailed {
        /// Shape the decoder expected.
        expected: String,
        /// Shape actually found in the payload.
        actual: String,
    },
    /// Source configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Discriminant of a [`QueryError`], used by the executor state machine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// See [`QueryError::InvalidArgument`].
    InvalidArgument,
    /// See [`QueryError::UnsupportedExpression`].
    UnsupportedExpression,
    /// See [`QueryError::UnsupportedProjection`].
    UnsupportedProjection,
    /// See [`QueryError::EmptyProjection`].
    EmptyProjection,
    /// See [`QueryError::DuplicateProjection`].
    DuplicateProjection,
    /// See [`QueryError::UnknownField`].
    UnknownField,
    /// See [`QueryError::InvalidPredicate`].
    InvalidPredicate,
    /// See [`QueryError::FetchFailed`].
    FetchFailed,
    /// See [`QueryError::RequestRejected`].
    RequestRejected,
    /// See [`QueryError::DecodeFailed`].
    DecodeFailed,
    /// See [`QueryError::Config`].
    Config,
}

impl ErrorKind {
    /// Returns a machine-readable code for the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::UnsupportedExpression => "UnsupportedExpression",
            ErrorKind::UnsupportedProjection => "UnsupportedProjection",
            ErrorKind::EmptyProjection => "EmptyProjection",
            ErrorKind::DuplicateProjection => "DuplicateProjection",
            ErrorKind::UnknownField => "UnknownField",
            ErrorKind::InvalidPredicate => "InvalidPredicate",
            ErrorKind::FetchFailed => "FetchFailed",
            ErrorKind::RequestRejected => "RequestRejected",
            ErrorKind::DecodeFailed => "DecodeFailed",
            ErrorKind::Config => "Config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueryError {
    /// Returns the discriminant of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            QueryError::UnsupportedExpression { .. } => ErrorKind::UnsupportedExpression,
            QueryError::UnsupportedProjection { .. } => ErrorKind::UnsupportedProjection,
            QueryError::EmptyProjection => ErrorKind::EmptyProjection,
            QueryError::DuplicateProjection { .. } => ErrorKind::DuplicateProjection,
            QueryError::UnknownField { .. } => ErrorKind::UnknownField,
            QueryError::InvalidPredicate { .. } => ErrorKind::InvalidPredicate,
            QueryError::FetchFailed { .. } => ErrorKind::FetchFailed,
            QueryError::RequestRejected { .. } => ErrorKind::RequestRejected,
            QueryError::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            QueryError::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Builds a [`QueryError::DecodeFailed`] from anything printable.
    pub fn decode_failed(expected: impl Into<String>, actual: impl fmt::Display) -> Self {
        QueryError::DecodeFailed {
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }
}

/// Convenience wrapper that formats query errors with their codes.
pub struct QueryErrorWithCode<'a>(pub &'a QueryError);

impl fmt::Display for QueryErrorWithCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.0.code(), self.0)
    }
}
