//! PDF Merge algorithm
//!
//! Combines multiple PDFs into a single document, all-or-nothing.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::backend::{LopdfBackend, PdfBackend};
use crate::error::MergeError;
use crate::upload::MIN_FILES;

/// Statistics about a merge operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStatistics {
    /// Number of input documents merged.
    pub files_merged: usize,

    /// Page count of each input, in input order.
    pub pages_per_input: Vec<usize>,

    /// Total number of pages in the merged document.
    pub total_pages: usize,

    /// Combined size of all inputs.
    pub input_size_bytes: usize,

    /// Size of the serialized output.
    pub output_size_bytes: usize,

    /// Wall-clock time for load, copy and save.
    pub elapsed: Duration,
}

/// Result of a merge operation.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// The serialized merged PDF.
    pub bytes: Vec<u8>,

    pub statistics: MergeStatistics,
}

/// Merges an ordered list of PDFs on top of a [`PdfBackend`].
#[derive(Debug, Clone)]
pub struct Merger<B = LopdfBackend> {
    backend: B,
    min_documents: usize,
}

impl Merger<LopdfBackend> {
    pub fn new() -> Self {
        Self::with_backend(LopdfBackend::new())
    }
}

impl Default for Merger<LopdfBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: PdfBackend> Merger<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            min_documents: MIN_FILES,
        }
    }

    /// Override the minimum number of inputs a merge accepts.
    pub fn min_documents(mut self, min_documents: usize) -> Self {
        self.min_documents = min_documents;
        self
    }

    /// Merge `documents` in order.
    ///
    /// The algorithm:
    /// 1. Reject the call if there are fewer than the minimum inputs
    /// 2. Create an empty destination document
    /// 3. For each input, in order: parse it and append all of its pages
    /// 4. Serialize the destination
    ///
    /// Any parse or copy failure aborts the whole merge; the partially
    /// built destination is dropped and never serialized.
    pub fn merge<D: AsRef<[u8]>>(&self, documents: &[D]) -> Result<MergeOutput, MergeError> {
        if documents.len() < self.min_documents {
            return Err(MergeError::TooFewFiles {
                found: documents.len(),
                required: self.min_documents,
            });
        }

        let start = Instant::now();
        let mut dest = self.backend.create();
        let mut pages_per_input = Vec::with_capacity(documents.len());
        let mut input_size_bytes = 0;

        for (index, document) in documents.iter().enumerate() {
            let bytes = document.as_ref();
            input_size_bytes += bytes.len();

            let source = self
                .backend
                .load(bytes)
                .map_err(|e| MergeError::at_input(index, e))?;
            let appended = self
                .backend
                .append_pages(&mut dest, source)
                .map_err(|e| MergeError::at_input(index, e))?;

            debug!("Appended {} pages from document {}", appended, index);
            pages_per_input.push(appended);
        }

        let total_pages = self.backend.page_count(&dest);
        let bytes = self
            .backend
            .save(dest)
            .map_err(|e| MergeError::SerializationError(e.to_string()))?;

        let statistics = MergeStatistics {
            files_merged: documents.len(),
            pages_per_input,
            total_pages,
            input_size_bytes,
            output_size_bytes: bytes.len(),
            elapsed: start.elapsed(),
        };

        Ok(MergeOutput { bytes, statistics })
    }
}

/// Merge PDFs with the default lopdf backend and return the merged bytes.
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, MergeError> {
    Merger::new().merge(&documents).map(|output| output.bytes)
}
