//! Staged file list
//!
//! The ordered list of files a user has picked before asking for a merge.
//! Front ends hold one of these; its order is the order the files are sent
//! in, and therefore the page order of the result.

use crate::error::StagingError;
use crate::upload::FormPart;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// What happened to a file handed to [`StagedFiles::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Declared content type is not `application/pdf`.
    RejectedType,
    /// A file with the same name and size is already staged.
    Duplicate,
}

/// Tally of a batch add, for user notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddSummary {
    pub added: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StagedFiles {
    files: Vec<StagedFile>,
    suppress_duplicates: bool,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip files whose name and size match one already staged.
    pub fn suppressing_duplicates() -> Self {
        Self {
            files: Vec::new(),
            suppress_duplicates: true,
        }
    }

    pub fn add(&mut self, file: StagedFile) -> AddOutcome {
        if file.content_type != PDF_CONTENT_TYPE {
            return AddOutcome::RejectedType;
        }

        if self.suppress_duplicates
            && self
                .files
                .iter()
                .any(|f| f.name == file.name && f.size() == file.size())
        {
            return AddOutcome::Duplicate;
        }

        self.files.push(file);
        AddOutcome::Added
    }

    pub fn add_all<I>(&mut self, files: I) -> AddSummary
    where
        I: IntoIterator<Item = StagedFile>,
    {
        let mut summary = AddSummary::default();
        for file in files {
            match self.add(file) {
                AddOutcome::Added => summary.added += 1,
                AddOutcome::RejectedType => summary.rejected += 1,
                AddOutcome::Duplicate => summary.duplicates += 1,
            }
        }
        summary
    }

    /// Remove the file at `index`, returning it if the index was valid.
    pub fn remove(&mut self, index: usize) -> Option<StagedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    /// Reorder by a permutation of current indices.
    ///
    /// `new_order[i]` is the current index of the file that should end up at `i`.
    pub fn reorder(&mut self, new_order: &[usize]) -> Result<(), StagingError> {
        if new_order.len() != self.files.len() {
            return Err(StagingError::WrongLength {
                expected: self.files.len(),
                found: new_order.len(),
            });
        }

        let mut seen = vec![false; self.files.len()];
        for &idx in new_order {
            if idx >= self.files.len() {
                return Err(StagingError::IndexOutOfBounds(idx));
            }
            if seen[idx] {
                return Err(StagingError::DuplicateIndex(idx));
            }
            seen[idx] = true;
        }

        let mut slots: Vec<Option<StagedFile>> = self.files.drain(..).map(Some).collect();
        self.files = new_order
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .collect();

        Ok(())
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.files.iter().map(StagedFile::size).sum()
    }

    /// A merge needs at least `min_files` staged files.
    pub fn can_merge(&self, min_files: usize) -> bool {
        self.files.len() >= min_files
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedFile> {
        self.files.iter()
    }

    /// Form parts for a merge request, in staged order.
    pub fn to_form_parts(&self, field_name: &str) -> Vec<FormPart> {
        self.files
            .iter()
            .map(|f| FormPart::file(field_name, f.name.clone(), f.content_type.clone(), f.data.clone()))
            .collect()
    }
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
///
/// Base 1024, at most two decimals, trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
