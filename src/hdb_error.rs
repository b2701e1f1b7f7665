use crate::protocol::parts::{ExecutionResults, ServerError};
use thiserror::Error;

/// HANA rejects wrong credentials with this error code.
pub(crate) const ERRCODE_AUTHENTICATION_FAILED: i32 = 10;

/// The error type of this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HdbError {
    /// Authentication failed.
    #[error("Authentication failed")]
    Authentication {
        /// The causing Error.
        source: Box<HdbError>,
    },

    /// A client certificate did not pass the local checks that are done
    /// before an X509 logon attempt is sent to the server.
    #[error("Client certificate rejected: {}", _0)]
    CertValidation(String),

    /// Some error occured while decoding CESU-8. This indicates a server issue!
    #[error("Some error occured while decoding CESU-8")]
    Cesu8,

    /// Decoding CESU-8 failed, original bytes are available.
    #[error("Some error occured while decoding CESU-8")]
    Cesu8AsBytes {
        /// The problematic bytes.
        bytes: Vec<u8>,
    },

    /// Erroneous connection parameters.
    #[error("Erroneous connection parameters")]
    ConnParams {
        /// The causing Error.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The connection is broken and must not be used anymore.
    ///
    /// Raised by transport failures, framing inconsistencies, cancellation,
    /// and fatal server errors.
    #[error("Connection is broken")]
    ConnectionBroken {
        /// The causing Error, if any.
        source: Option<Box<HdbError>>,
    },

    /// The database server responded with an error;
    /// the contained `ServerError` describes the concrete reason.
    #[error("Database server responded with an error")]
    DbError {
        /// The causing Error.
        #[from]
        source: ServerError,
    },

    /// The database server responded with at least one error;
    /// the successful parts of e.g. a bulk execution are contained as well.
    #[error("Database server responded with at least one error: \n{0}")]
    ExecutionResults(ExecutionResults),

    /// Implementation error - a protocol inconsistency was detected.
    #[error("Implementation error: {}", _0)]
    Impl(&'static str),

    /// Implementation error - a protocol inconsistency was detected.
    #[error("Implementation error: {}", _0)]
    ImplDetailed(String),

    /// Error occured in communication with the database.
    #[error(transparent)]
    Io {
        /// The causing Error.
        #[from]
        source: std::io::Error,
    },

    /// Error occured in thread synchronization.
    #[error("Error occured in thread synchronization")]
    Poison,

    /// An error occurred on the server that requires the session to be terminated.
    #[error("An error occurred on the server that requires the session to be terminated")]
    SessionClosingTransactionError,

    /// TLS setup failed because the server name was not valid.
    #[error("TLS setup failed because the server name was not valid")]
    TlsInvalidDnsName {
        /// The causing Error.
        #[from]
        source: rustls::client::InvalidDnsNameError,
    },

    /// TLS initialization error.
    #[error("Connection setup failed due to failing TLS initialization")]
    TlsInit {
        /// The causing Error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// TLS protocol error.
    #[error("TLS setup failed after the TCP connection was established")]
    TlsProtocol {
        /// The causing Error.
        #[from]
        source: rustls::Error,
    },

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    Usage(&'static str),

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    UsageDetailed(String),
}

/// Abbreviation of `Result<T, HdbError>`.
pub type HdbResult<T> = std::result::Result<T, HdbError>;

impl HdbError {
    /// Returns the contained `ServerError`, if any.
    ///
    /// Helps in case you need programmatic access to e.g. the error code.
    #[must_use]
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Self::DbError {
                source: server_error,
            } => Some(server_error),
            Self::Authentication { source } => source.server_error(),
            Self::ConnectionBroken {
                source: Some(source),
            } => source.server_error(),
            _ => None,
        }
    }

    /// Returns true if the connection must be discarded.
    #[must_use]
    pub fn is_connection_broken(&self) -> bool {
        matches!(self, Self::ConnectionBroken { .. })
    }

    pub(crate) fn is_authentication_failure(&self) -> bool {
        self.server_error()
            .map(ServerError::code)
            .is_some_and(|code| code == ERRCODE_AUTHENTICATION_FAILED)
    }

    pub(crate) fn break_connection(self) -> Self {
        match self {
            e @ (Self::DbError { .. }
            | Self::ExecutionResults(_)
            | Self::Usage(_)
            | Self::UsageDetailed(_)
            | Self::Authentication { .. }
            | Self::ConnectionBroken { .. }) => e,
            e => Self::ConnectionBroken {
                source: Some(Box::new(e)),
            },
        }
    }

    pub(crate) fn conn_params(error: Box<dyn std::error::Error + Send + Sync + 'static>) -> Self {
        Self::ConnParams { source: error }
    }
}

impl<G> From<std::sync::PoisonError<G>> for HdbError {
    fn from(_error: std::sync::PoisonError<G>) -> Self {
        Self::Poison
    }
}

/// Produces an `HdbError::ImplDetailed` from a format string.
macro_rules! impl_err {
    ($($arg:tt)*) => {
        $crate::HdbError::ImplDetailed(format!($($arg)*))
    };
}
pub(crate) use impl_err;

/// Produces an `HdbError::UsageDetailed` from a format string.
macro_rules! usage_err {
    ($($arg:tt)*) => {
        $crate::HdbError::UsageDetailed(format!($($arg)*))
    };
}
pub(crate) use usage_err;
