//! Error types for cgpt.
//!
//! Every failure in the tool is one of these variants. Nothing is recovered
//! locally: errors travel up to the binary, which logs them and exits non-zero.

use std::error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::Utf8Error;
use std::sync::Arc;

/// The main error type for cgpt.
#[derive(Clone, Debug)]
pub enum Error {
    /// A file that was expected to exist is missing.
    NotFound {
        /// Human-readable error message.
        message: String,
        /// The path that was looked up.
        path: PathBuf,
    },

    /// A file exists but does not parse into the expected record.
    Corrupt {
        /// Human-readable error message.
        message: String,
        /// The offending file.
        path: PathBuf,
        /// The underlying parse error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// The completion endpoint failed or answered with something unusable.
    Upstream {
        /// Human-readable error message.
        message: String,
        /// HTTP status code, when the endpoint answered at all.
        status_code: Option<u16>,
        /// Request ID for debugging and support.
        request_id: Option<String>,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Identifier generation failed.
    RandomSource {
        /// Human-readable error message.
        message: String,
    },

    /// No credential was available for the completion endpoint.
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Error during validation of user input.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// Error while encoding a record for display.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },

    /// An interactive prompt was cancelled by the user.
    Abort {
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Error::NotFound {
            message: message.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates a new corrupt-file error.
    pub fn corrupt(
        message: impl Into<String>,
        path: impl AsRef<Path>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Corrupt {
            message: message.into(),
            path: path.as_ref().to_path_buf(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new upstream error.
    pub fn upstream(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Upstream {
            message: message.into(),
            status_code: None,
            request_id: None,
            source: source.map(Arc::from),
        }
    }

    /// Creates a new upstream error for an HTTP status returned by the endpoint.
    pub fn upstream_status(
        status_code: u16,
        message: impl Into<String>,
        request_id: Option<String>,
    ) -> Self {
        Error::Upstream {
            message: message.into(),
            status_code: Some(status_code),
            request_id,
            source: None,
        }
    }

    /// Creates a new random source error.
    pub fn random_source(message: impl Into<String>) -> Self {
        Error::RandomSource {
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Creates a new abort error.
    pub fn abort(message: impl Into<String>) -> Self {
        Error::Abort {
            message: message.into(),
        }
    }

    /// Returns true if this error is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns true if this error reports a file that failed to parse.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt { .. })
    }

    /// Returns true if this error is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }

    /// Returns true if this error came from the completion endpoint.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. })
    }

    /// Returns true if this error is related to authentication.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns true if this error is an abort.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Abort { .. })
    }

    /// Returns the path associated with this error, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::NotFound { path, .. } => Some(path),
            Error::Corrupt { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the request ID associated with this error, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Error::Upstream { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Upstream { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { message, path } => {
                write!(f, "Not found: {message} ({})", path.display())
            }
            Error::Corrupt { message, path, .. } => {
                write!(f, "Corrupt file {}: {message}", path.display())
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::Upstream {
                message,
                status_code,
                request_id,
                ..
            } => {
                match status_code {
                    Some(status_code) => write!(f, "Upstream error ({status_code}): {message}")?,
                    None => write!(f, "Upstream error: {message}")?,
                }
                if let Some(request_id) = request_id {
                    write!(f, " (Request ID: {request_id})")?;
                }
                Ok(())
            }
            Error::RandomSource { message } => {
                write!(f, "Random source error: {message}")
            }
            Error::Authentication { message } => {
                write!(f, "Authentication error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
            Error::Abort { message } => {
                write!(f, "Aborted: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Corrupt { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Upstream { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

impl From<Utf8Error> for Error {
    fn from(err: Utf8Error) -> Self {
        Error::upstream(format!("UTF-8 error: {err}"), Some(Box::new(err)))
    }
}

/// A specialized Result type for cgpt operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_path() {
        let err = Error::not_found("conversation file does not exist", "/tmp/x/abc.json");
        assert!(err.is_not_found());
        assert_eq!(err.path(), Some(Path::new("/tmp/x/abc.json")));
        assert!(err.to_string().contains("/tmp/x/abc.json"));
    }

    #[test]
    fn upstream_display_includes_status_and_request_id() {
        let err = Error::upstream_status(429, "slow down", Some("req_123".to_string()));
        assert!(err.is_upstream());
        assert_eq!(err.status_code(), Some(429));
        assert_eq!(err.request_id(), Some("req_123"));
        assert_eq!(
            err.to_string(),
            "Upstream error (429): slow down (Request ID: req_123)"
        );
    }

    #[test]
    fn io_error_keeps_source() {
        let err: Error = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(err.is_io());
        assert!(error::Error::source(&err).is_some());
    }
}
