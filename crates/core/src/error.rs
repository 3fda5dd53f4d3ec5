use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no element with id `{0}`")]
    MissingElement(String),
    #[error("surface `{id}`: logical height {height} must be positive and finite")]
    InvalidHeight { id: String, height: f64 },
    #[error("surface `{0}` is already registered")]
    DuplicateSurface(String),
    #[error("{field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigurationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ThemeError {
    #[error("{variable}: unparseable color `{value}`")]
    UnparseableColor {
        variable: &'static str,
        value: String,
    },
}
