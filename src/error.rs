//! Error types of the crate.

use http::StatusCode;
use thiserror::Error;

/// Result type of all methods of this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible error types.
///
/// Every error is fatal to the operation that produced it: handshake
/// errors end the connection attempt, payload errors end that payload.
/// Nothing here is retried internally; the caller decides teardown.
#[derive(Error, Debug)]
pub enum Error {
    /// Opening-handshake verification failed. The connection must be
    /// closed.
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[from] HandshakeError),
    /// A text payload was not well-formed UTF-8.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] Utf8Error),
    /// The target URL is unusable for a WebSocket connection.
    #[error("URL error: {0}")]
    Url(#[from] UrlError),
    /// HTTP format error.
    #[error("HTTP error: {0}")]
    HttpFormat(#[from] http::Error),
    /// Error while parsing the server's HTTP response.
    #[error("error during HTTP parsing: {0}")]
    HttpParse(#[from] httparse::Error),
    /// The transport delivered an HTTP response although the connection
    /// is already upgraded.
    #[error("unexpected HTTP response after the connection is open (status: {0})")]
    UnexpectedHttpResponse(StatusCode),
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::HttpFormat(err.into())
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::HttpFormat(err.into())
    }
}

impl From<http::status::InvalidStatusCode> for Error {
    fn from(err: http::status::InvalidStatusCode) -> Self {
        Error::HttpFormat(err.into())
    }
}

/// Opening-handshake verification errors.
///
/// Each variant carries the offending status or header value for
/// diagnostics. All of them mark the attempt as failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// The status line was not `101 Switching Protocols`.
    #[error("invalid handshake response status: {0}")]
    UnexpectedStatus(StatusCode),
    /// The `Upgrade` header was missing or not exactly `websocket`.
    #[error("invalid handshake response upgrade: {0:?}")]
    InvalidUpgradeHeader(Option<String>),
    /// The `Connection` header was missing or not exactly `Upgrade`.
    #[error("invalid handshake response connection: {0:?}")]
    InvalidConnectionHeader(Option<String>),
    /// The `Sec-WebSocket-Accept` header did not echo the expected
    /// accept value.
    #[error("invalid challenge response. actual: {actual:?}, expected: {expected}")]
    ChallengeMismatch {
        /// The accept value the server sent, if any.
        actual: Option<String>,
        /// The accept value derived from the request key.
        expected: String,
    },
    /// `complete` was called while no handshake was awaiting a response.
    #[error("no handshake awaiting a response")]
    NotInProgress,
    /// The response did not use HTTP/1.1.
    #[error("unsupported HTTP version in handshake response")]
    UnsupportedHttpVersion,
}

/// Text-payload validation errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Error {
    /// A byte drove the validator into its reject state.
    #[error("bytes are not UTF-8")]
    InvalidUtf8,
    /// The payload ended in the middle of a multi-byte sequence.
    #[error("payload ended inside a multi-byte UTF-8 sequence")]
    IncompleteSequence,
}

/// Errors in the target URL.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlError {
    /// The URL does not include a host name.
    #[error("no host name in the URL")]
    NoHostName,
    /// The URL contains an empty host name.
    #[error("URL contains empty host name")]
    EmptyHostName,
    /// The URL scheme is neither `ws` nor `wss`.
    #[error("URL scheme not supported")]
    UnsupportedUrlScheme,
    /// The URL has no path or query to request.
    #[error("no path/query in URL")]
    NoPathOrQuery,
}
