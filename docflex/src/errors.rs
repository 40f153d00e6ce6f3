use backtrace::Backtrace;
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for docflex operations.
///
/// Usage errors (an unregistered connection label, an update naming a field
/// the model does not declare) have their own kinds so callers can match on
/// them. Anything raised by the underlying database client is reported as
/// [`ErrorKind::ClientError`] with the original error kept as the source.
///
/// # Examples
///
/// ```rust,ignore
/// use docflex::errors::{DocFlexError, ErrorKind, DocFlexResult};
///
/// fn example() -> DocFlexResult<()> {
///     Err(DocFlexError::new("No connection named reports", ErrorKind::NotConnected))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// No client is registered under the requested label
    NotConnected,
    /// An update named a field that the model does not declare
    UnknownField,
    /// A document lacks a field the model requires
    MissingRequiredField,
    /// A value could not be mapped to or from a document
    ObjectMappingError,
    /// The connection address is malformed or uses an unsupported scheme
    InvalidAddress,
    /// No database name could be resolved for a model
    NoDatabase,
    /// A model declaration is inconsistent
    InvalidDeclaration,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Error raised by the underlying database client
    ClientError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotConnected => write!(f, "Not connected"),
            ErrorKind::UnknownField => write!(f, "Unknown field"),
            ErrorKind::MissingRequiredField => write!(f, "Missing required field"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::InvalidAddress => write!(f, "Invalid address"),
            ErrorKind::NoDatabase => write!(f, "No database"),
            ErrorKind::InvalidDeclaration => write!(f, "Invalid declaration"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::ClientError => write!(f, "Client error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom docflex error type.
///
/// `DocFlexError` carries a message, a kind, an optional docflex cause and,
/// for client failures, the untouched error of the underlying driver. The
/// backtrace is captured unresolved and only symbolized when the error is
/// debug-printed.
///
/// # Examples
///
/// ```rust,ignore
/// use docflex::errors::{DocFlexError, ErrorKind};
///
/// let err = DocFlexError::new("Key views not allowed", ErrorKind::UnknownField);
///
/// let cause = DocFlexError::new("bad value", ErrorKind::ObjectMappingError);
/// let err = DocFlexError::new_with_cause("update rejected", ErrorKind::InvalidOperation, cause);
/// ```
#[derive(Clone)]
pub struct DocFlexError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocFlexError>>,
    client_error: Option<Arc<dyn Error + Send + Sync + 'static>>,
    backtrace: Arc<Mutex<Backtrace>>,
}

impl DocFlexError {
    /// Creates a new `DocFlexError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocFlexError {
            message: message.to_string(),
            error_kind,
            cause: None,
            client_error: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new `DocFlexError` caused by another docflex error.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocFlexError) -> Self {
        DocFlexError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            client_error: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Wraps an error raised by the underlying database client.
    ///
    /// The message is the client's own message and the client error is
    /// returned unchanged from [`DocFlexError::client_error`] and
    /// [`Error::source`].
    pub fn from_client<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        DocFlexError {
            message: err.to_string(),
            error_kind: ErrorKind::ClientError,
            cause: None,
            client_error: Some(Arc::new(err)),
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocFlexError> {
        self.cause.as_deref()
    }

    /// The original error of the underlying client, if this error came from it.
    pub fn client_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.client_error.as_deref()
    }
}

impl Display for DocFlexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocFlexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = self.backtrace.lock();
                backtrace.resolve();
                write!(f, "{} ({})\n{:?}", self.message, self.error_kind, *backtrace)
            }
        }
    }
}

impl Error for DocFlexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Some(cause) = &self.cause {
            return Some(cause.as_ref());
        }
        match &self.client_error {
            Some(err) => Some(err.as_ref() as &(dyn Error + 'static)),
            None => None,
        }
    }
}

/// A result type alias for docflex operations.
pub type DocFlexResult<T> = Result<T, DocFlexError>;

impl From<bson::ser::Error> for DocFlexError {
    fn from(err: bson::ser::Error) -> Self {
        DocFlexError::new(
            &format!("Failed to serialize value: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

impl From<bson::de::Error> for DocFlexError {
    fn from(err: bson::de::Error) -> Self {
        DocFlexError::new(
            &format!("Failed to deserialize document: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

impl From<bson::document::ValueAccessError> for DocFlexError {
    fn from(err: bson::document::ValueAccessError) -> Self {
        DocFlexError::new(
            &format!("Invalid document value: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for DocFlexError {
    fn from(err: mongodb::error::Error) -> Self {
        DocFlexError::from_client(err)
    }
}

impl From<String> for DocFlexError {
    fn from(msg: String) -> Self {
        DocFlexError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for DocFlexError {
    fn from(msg: &str) -> Self {
        DocFlexError::new(msg, ErrorKind::InternalError)
    }
}
