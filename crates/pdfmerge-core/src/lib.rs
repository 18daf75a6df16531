//! PDF merge service core
//!
//! Everything the merge endpoint does besides HTTP:
//! - `upload`: pick the ordered file parts out of a multipart form and enforce the minimum count
//! - `merge`: append every page of every input, in order, into one document
//! - `backend`: the narrow PDF-library interface the merge runs on, with a lopdf implementation
//! - `staging`: the client-side staged file list that decides upload order

pub mod backend;
pub mod error;
pub mod merge;
pub mod staging;
pub mod upload;

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;


pub use backend::{LopdfBackend, PdfBackend};
pub use error::{BackendError, MergeError, StagingError};
pub use merge::{merge_documents, MergeOutput, MergeStatistics, Merger};
pub use staging::{format_file_size, AddOutcome, AddSummary, StagedFile, StagedFiles};
pub use upload::{FormPart, UploadPolicy, UploadedFile, DEFAULT_FIELD_NAME, MIN_FILES};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<usize, MergeError> {
    let backend = LopdfBackend::new();
    let doc = backend
        .load(bytes)
        .map_err(|e| MergeError::at_input(0, e))?;
    Ok(backend.page_count(&doc))
}
