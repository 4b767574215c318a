use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unable to parse date '{0}' with any known format")]
    DateFormat(String),

    #[error("Unable to parse amount '{0}'")]
    AmountParse(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("{0}")]
    Validation(String),
}

impl TallyError {
    /// Row-scoped errors are logged and skipped during import; anything else
    /// aborts the batch.
    pub fn is_row_scoped(&self) -> bool {
        matches!(
            self,
            TallyError::DateFormat(_) | TallyError::AmountParse(_) | TallyError::MissingColumn(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TallyError>;
