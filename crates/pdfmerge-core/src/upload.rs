//! Upload receiver
//!
//! Turns the ordered parts of a multipart form into the ordered list of files
//! to merge. The HTTP layer only has to produce [`FormPart`]s; the selection
//! and minimum-count rules live here.

use tracing::debug;

use crate::error::MergeError;

/// Canonical form field carrying the PDFs.
pub const DEFAULT_FIELD_NAME: &str = "files";

/// Fewest files a merge request may carry.
pub const MIN_FILES: usize = 2;

/// One part of a multipart body, in the order it was sent.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FormPart {
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        }
    }
}

/// A file accepted for merging.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Which form field holds the files and how many are required.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub field_name: String,
    pub min_files: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            field_name: DEFAULT_FIELD_NAME.to_string(),
            min_files: MIN_FILES,
        }
    }
}

impl UploadPolicy {
    pub fn new(field_name: impl Into<String>, min_files: usize) -> Self {
        Self {
            field_name: field_name.into(),
            min_files,
        }
    }

    /// Keep the file parts sent under the policy's field name, in arrival order.
    ///
    /// A part is a file part when it carries a filename; plain text fields
    /// under the same name are skipped and do not count toward the minimum.
    /// Content types are not checked; a non-PDF payload fails later, at parse time.
    pub fn collect<I>(&self, parts: I) -> Result<Vec<UploadedFile>, MergeError>
    where
        I: IntoIterator<Item = FormPart>,
    {
        let files: Vec<UploadedFile> = parts
            .into_iter()
            .filter_map(|part| {
                if part.name != self.field_name {
                    debug!("Ignoring form field '{}'", part.name);
                    return None;
                }
                let Some(file_name) = part.file_name else {
                    debug!("Ignoring non-file part under '{}'", part.name);
                    return None;
                };
                Some(UploadedFile {
                    file_name,
                    content_type: part.content_type,
                    data: part.data,
                })
            })
            .collect();

        if files.len() < self.min_files {
            return Err(MergeError::TooFewFiles {
                found: files.len(),
                required: self.min_files,
            });
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pdf_part(name: &str, file_name: &str) -> FormPart {
        FormPart::file(name, file_name, "application/pdf", file_name.as_bytes().to_vec())
    }

    #[test]
    fn test_collect_preserves_order() {
        let policy = UploadPolicy::default();
        let parts = vec![
            pdf_part("files", "c.pdf"),
            pdf_part("files", "a.pdf"),
            pdf_part("files", "b.pdf"),
        ];

        let files = policy.collect(parts).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["c.pdf", "a.pdf", "b.pdf"]);
        assert_eq!(files[0].data, b"c.pdf".to_vec());
    }

    #[test]
    fn test_collect_ignores_other_fields() {
        let policy = UploadPolicy::default();
        let parts = vec![
            pdf_part("files", "a.pdf"),
            pdf_part("pdfs", "stray.pdf"),
            FormPart {
                name: "note".into(),
                file_name: None,
                content_type: None,
                data: b"hello".to_vec(),
            },
            pdf_part("files", "b.pdf"),
        ];

        let files = policy.collect(parts).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_collect_rejects_zero_files() {
        let result = UploadPolicy::default().collect(Vec::new());
        assert!(matches!(
            result,
            Err(MergeError::TooFewFiles {
                found: 0,
                required: 2
            })
        ));
    }

    #[test]
    fn test_collect_rejects_one_file() {
        let result = UploadPolicy::default().collect(vec![pdf_part("files", "only.pdf")]);
        assert!(matches!(
            result,
            Err(MergeError::TooFewFiles {
                found: 1,
                required: 2
            })
        ));
    }

    #[test]
    fn test_collect_counts_only_matching_field() {
        let parts = vec![pdf_part("files", "a.pdf"), pdf_part("pdfs", "b.pdf")];
        let result = UploadPolicy::default().collect(parts);
        assert!(matches!(result, Err(MergeError::TooFewFiles { found: 1, .. })));
    }

    #[test]
    fn test_custom_field_name() {
        let policy = UploadPolicy::new("pdfs", 2);
        let parts = vec![pdf_part("pdfs", "a.pdf"), pdf_part("pdfs", "b.pdf")];
        assert_eq!(policy.collect(parts).unwrap().len(), 2);
    }

    fn text_part(name: &str, value: &str) -> FormPart {
        FormPart {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_text_parts_under_file_field_are_not_files() {
        let parts = vec![text_part("files", "hello"), text_part("files", "world")];
        let result = UploadPolicy::default().collect(parts);
        assert!(matches!(
            result,
            Err(MergeError::TooFewFiles {
                found: 0,
                required: 2
            })
        ));
    }

    #[test]
    fn test_text_part_does_not_make_up_the_minimum() {
        let parts = vec![pdf_part("files", "a.pdf"), text_part("files", "not a file")];
        let result = UploadPolicy::default().collect(parts);
        assert!(matches!(result, Err(MergeError::TooFewFiles { found: 1, .. })));
    }

    #[test]
    fn test_text_parts_are_skipped_between_files() {
        let parts = vec![
            pdf_part("files", "a.pdf"),
            text_part("files", "caption"),
            pdf_part("files", "b.pdf"),
        ];
        let files = UploadPolicy::default().collect(parts).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }
}
