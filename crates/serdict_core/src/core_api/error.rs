use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Schema,
    Data,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    UnsupportedKeyKind,
    ShapeMismatch,
    MissingField,
    UnknownField,
    TypeMismatch,
    InvalidKey,
    EmptyDictionary,
    DuplicateKey,
    NonFiniteFloat,
    Io,
    Json,
}

impl CoreErrorCode {
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::UnsupportedKeyKind
            | Self::ShapeMismatch
            | Self::MissingField
            | Self::UnknownField
            | Self::TypeMismatch => ErrorCategory::Schema,
            Self::InvalidKey | Self::EmptyDictionary | Self::DuplicateKey | Self::NonFiniteFloat => {
                ErrorCategory::Data
            }
            Self::Io | Self::Json => ErrorCategory::Io,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Prefixes the message with where the error happened, e.g. the key.
    pub fn with_context(mut self, context: impl fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        Self::new(CoreErrorCode::Io, e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Self::new(CoreErrorCode::Io, e.to_string())
        } else {
            Self::new(CoreErrorCode::Json, e.to_string())
        }
    }
}
