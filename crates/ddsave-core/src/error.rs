use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SavError {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("name too long: {len} characters (max {max})", max = crate::sav::MAX_NAME_LENGTH)]
    NameTooLong { len: usize },

    #[error("payload too large: {size} bytes do not fit the save file")]
    PayloadTooLarge { size: usize },

    #[error("missing node: {0}")]
    MissingNode(String),

    #[error("invalid path expression: {0}")]
    InvalidPath(String),

    #[error("backup failed: {0}")]
    Backup(String),
}

impl SavError {
    /// True for failures caused by the input file itself rather than the environment.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            SavError::CorruptPayload(_) | SavError::MalformedDocument(_) | SavError::MissingNode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SavError>;
