use thiserror::Error;

/// Error type that captures ledger storage and mutation failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing file is held exclusively by another program.
    #[error("ledger file is locked by another program ({0}); close it and try again")]
    ResourceLocked(String),
    #[error("nothing to undo: no entry was added in this session")]
    NothingToUndo,
    #[error("entry at row {0} no longer exists")]
    StaleReference(usize),
    #[error("entry at row {index} belongs to {author}")]
    NotOwner { index: usize, author: String },
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Whether a retry after a short pause could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::ResourceLocked(_))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => LedgerError::ResourceLocked(err.to_string()),
            _ => LedgerError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures that end a console session.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] LedgerError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rustyline::error::ReadlineError> for CliError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn permission_denied_maps_to_resource_locked() {
        let err = LedgerError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(err, LedgerError::ResourceLocked(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn other_io_errors_stay_io() {
        let err = LedgerError::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(matches!(err, LedgerError::Io(_)));
        assert!(!err.is_transient());
    }
}
