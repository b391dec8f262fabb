use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Records the text of a parsed input so diagnostics can point back into
/// it.
///
/// The stored text is newline-normalized, matching the byte offsets the
/// parser reports.
#[derive(Clone)]
pub struct SourceFile {
    pub(crate) path: PathBuf,
    pub(crate) source_text: String,
    pub(crate) source: OnceLock<ariadne::Source<String>>,
}

impl SourceFile {
    pub(crate) fn new(path: PathBuf, source_text: String) -> Self {
        Self {
            path,
            source_text,
            source: OnceLock::new(),
        }
    }

    /// The filesystem path (or arbitrary display string) given at parse
    /// time to identify this input in diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The normalized source text.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub(crate) fn ariadne(&self) -> &ariadne::Source<String> {
        self.source
            .get_or_init(|| ariadne::Source::from(self.source_text.clone()))
    }

    /// Translate a byte offset into a char offset for use with ariadne.
    pub(crate) fn map_index(&self, byte: usize) -> usize {
        let byte = byte.min(self.source_text.len());
        self.source_text[..byte].chars().count()
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("source_text", &self.source_text)
            .finish()
    }
}
