use thiserror::Error;

/// Failures raised by a [`PdfBackend`](crate::backend::PdfBackend).
///
/// Backends know nothing about where a document sits in the upload list;
/// [`Merger`](crate::merge::Merger) attaches the input index when it turns
/// these into a [`MergeError`].
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0}")]
    Malformed(String),

    #[error("document is encrypted")]
    Encrypted,

    #[error("invalid page tree: {0}")]
    InvalidStructure(String),

    #[error("{0}")]
    Serialize(String),
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Please upload at least {required} PDF files.")]
    TooFewFiles { found: usize, required: usize },

    #[error("Failed to parse document {index}: {reason}")]
    ParseError { index: usize, reason: String },

    #[error("Document {index} is encrypted")]
    EncryptedDocument { index: usize },

    #[error("Failed to save merged PDF: {0}")]
    SerializationError(String),
}

/// Rejected edits to a [`StagedFiles`](crate::staging::StagedFiles) list.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StagingError {
    #[error("Invalid order: expected {expected} indices, got {found}")]
    WrongLength { expected: usize, found: usize },

    #[error("Invalid order: index {0} out of bounds")]
    IndexOutOfBounds(usize),

    #[error("Invalid order: duplicate index {0}")]
    DuplicateIndex(usize),
}

impl MergeError {
    /// Attribute a load or page-copy failure to the input at `index`.
    pub fn at_input(index: usize, err: BackendError) -> Self {
        match err {
            BackendError::Encrypted => MergeError::EncryptedDocument { index },
            BackendError::Malformed(reason) | BackendError::InvalidStructure(reason) => {
                MergeError::ParseError { index, reason }
            }
            BackendError::Serialize(reason) => MergeError::SerializationError(reason),
        }
    }

    /// True for failures caused by what the client sent rather than by its content.
    pub fn is_validation(&self) -> bool {
        matches!(self, MergeError::TooFewFiles { .. })
    }
}
