use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    /// Attribute configuration that makes encoding impossible, e.g. a numeric
    /// attribute without an upper bound.
    pub fn config(attribute: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Config {
                attribute: attribute.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn index_out_of_bounds(index: usize, len: usize) -> Error {
        Error(ErrorKind::IndexOutOfBounds { index, len }.into())
    }

    pub fn is_config(&self) -> bool {
        matches!(self.kind(), ErrorKind::Config { .. })
    }

    pub fn is_index_out_of_bounds(&self) -> bool {
        matches!(self.kind(), ErrorKind::IndexOutOfBounds { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid configuration for attribute '{attribute}': {message}")]
    Config { attribute: String, message: String },

    #[error("bit index {index} out of range (len: {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid encoded format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("JSON error: {source}")]
    Json { source: serde_json::Error },

    #[error("base64 error: {source}")]
    Base64 { source: base64::DecodeError },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        ErrorKind::Json { source: e }.into()
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        ErrorKind::Base64 { source: e }.into()
    }
}
