use std::fmt;

#[derive(Debug)]
pub enum ErrorKind {
    Io,
    Parse,
    Internal,
    /// Malformed input, raised before anything is persisted
    Validation,
    NotFound,
    /// An ID outside a collection's partition
    Range,
    /// A dataset get/put/remove failed
    Storage,
    /// Per-item failures of a batch operation; successful items stay applied
    Aggregate(Vec<ItemFailure>),
}

#[derive(Debug)]
pub struct ItemFailure {
    pub index: usize,
    pub key: Option<String>,
    pub error: Error,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn validation(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Validation, context.into())
    }

    pub fn not_found(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotFound, context.into())
    }

    pub fn range(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Range, context.into())
    }

    /// Wraps a backend failure with the dataset, operation and key involved
    pub fn storage(dataset: &str, op: &str, key: &str, cause: impl fmt::Display) -> Self {
        Error::new(
            ErrorKind::Storage,
            format!("{} {}({}): {}", dataset, op, key, cause),
        )
    }

    pub fn aggregate(context: impl Into<String>, failures: Vec<ItemFailure>) -> Self {
        Error::new(ErrorKind::Aggregate(failures), context.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.kind, ErrorKind::Validation)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound)
    }

    pub fn is_range(&self) -> bool {
        matches!(self.kind, ErrorKind::Range)
    }

    pub fn is_storage(&self) -> bool {
        matches!(self.kind, ErrorKind::Storage)
    }

    /// Failures carried by an aggregate error, empty for every other kind
    pub fn failures(&self) -> &[ItemFailure] {
        match &self.kind {
            ErrorKind::Aggregate(failures) => failures,
            _ => &[],
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Io => write!(f, "Io"),
            ErrorKind::Parse => write!(f, "Parse"),
            ErrorKind::Internal => write!(f, "Internal"),
            ErrorKind::Validation => write!(f, "Validation"),
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::Range => write!(f, "Range"),
            ErrorKind::Storage => write!(f, "Storage"),
            ErrorKind::Aggregate(failures) => write!(f, "Aggregate({} failed)", failures.len()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.context)?;
        for failure in self.failures() {
            match &failure.key {
                Some(key) => write!(f, "; [{}] {}: {}", failure.index, key, failure.error)?,
                None => write!(f, "; [{}] {}", failure.index, failure.error)?,
            }
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: format!("JSON error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
