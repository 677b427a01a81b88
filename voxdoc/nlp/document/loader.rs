use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Startup failures while turning the reference document into text.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("reading document {path:?}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// PDF text extraction failed.
    #[error("extracting text from PDF {path:?}: {message}")]
    Pdf {
        /// Offending path.
        path: PathBuf,
        /// Extractor message.
        message: String,
    },
    /// The document produced no sentences.
    #[error("document {0} contains no sentences")]
    Empty(String),
}

/// Source of the raw reference document text.
pub trait DocumentLoader: Send + Sync {
    /// Loads the full text at `path`.
    fn load_text(&self, path: &Path) -> Result<String, DocumentError>;
}

/// Reads UTF-8 text files, and PDFs (by `.pdf` extension) through text
/// extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDocumentLoader;

impl DocumentLoader for FileDocumentLoader {
    fn load_text(&self, path: &Path) -> Result<String, DocumentError> {
        let bytes = fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if is_pdf(path) {
            return pdf_extract::extract_text_from_mem(&bytes).map_err(|err| DocumentError::Pdf {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }
        String::from_utf8(bytes).map_err(|err| DocumentError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, err),
        })
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loader_reads_plain_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blueprint.txt");
        fs::write(&path, "Digital government improves public services.").unwrap();
        let text = FileDocumentLoader.load_text(&path).unwrap();
        assert!(text.starts_with("Digital government"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = FileDocumentLoader
            .load_text(&dir.path().join("absent.txt"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }

    #[test]
    fn garbage_pdf_is_a_pdf_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.PDF");
        fs::write(&path, b"definitely not a pdf").unwrap();
        let err = FileDocumentLoader.load_text(&path).unwrap_err();
        assert!(matches!(err, DocumentError::Pdf { .. }));
    }
}
