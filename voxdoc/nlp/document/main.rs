//! Reference document loading and the startup-built sentence cache.

/// Sentence cache built once per process.
pub mod cache;
/// Document text loaders.
pub mod loader;

pub use cache::{CachedSentence, DocumentCache};
pub use loader::{DocumentError, DocumentLoader, FileDocumentLoader};
