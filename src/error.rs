//! Unified error type for board and store operations.

/// Things that can go wrong when using the board.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad or missing client input. Carries the wire code (`text_required`, ...).
    Validation(String),
    /// No record with the given id.
    NotFound(String),
    /// Mutation action not in the action table.
    UnknownAction(String),
    /// Neither replica could be read.
    ReadFailure(String),
    /// Neither replica accepted the write.
    WriteFailure(String),
    /// File system problem (read, write, rename).
    Io(String),
    /// Transport problem or non-success status from a remote replica.
    Http(String),
    /// Failed to serialize a document to bytes.
    Serialize(String),
    /// Failed to deserialize bytes back into a document.
    Deserialize(String),
    /// Bad configuration (invalid url, address, replica kind).
    Config(String),
    /// Catch-all for anything else.
    Server(String),
}

impl Error {
    /// Short machine-readable code sent to clients in `{"error": ...}` bodies.
    ///
    /// Storage-side failures all collapse into `server_error`.
    pub fn code(&self) -> &str {
        match self {
            Error::Validation(code) => code.as_str(),
            Error::NotFound(_) => "not_found",
            Error::UnknownAction(_) => "unknown_action",
            _ => "server_error",
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(code) => write!(f, "validation error: {code}"),
            Error::NotFound(id) => write!(f, "no record with id {id}"),
            Error::UnknownAction(action) => write!(f, "unknown action: {action}"),
            Error::ReadFailure(msg) => write!(f, "all replicas failed to read: {msg}"),
            Error::WriteFailure(msg) => write!(f, "all replicas failed to write: {msg}"),
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Http(msg) => write!(f, "http error: {msg}"),
            Error::Serialize(msg) => write!(f, "serialization error: {msg}"),
            Error::Deserialize(msg) => write!(f, "deserialization error: {msg}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Server(msg) => write!(f, "server error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.to_string())
        } else if err.is_syntax() || err.is_eof() {
            Error::Deserialize(err.to_string())
        } else {
            Error::Serialize(err.to_string())
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
