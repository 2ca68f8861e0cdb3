use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

impl FilterError {
    /// Query parameter the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            FilterError::InvalidLimit(_) => "limite",
            FilterError::InvalidOffset(_) => "desde",
            FilterError::InvalidRange(_) => "minYears",
            FilterError::InvalidOrder(_) => "order",
        }
    }
}
