/// Controls schema document loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum bytes read from a schema document.
    pub max_document_size: usize,
    /// Reject unknown raw keys even when the document does not ask for it.
    pub strict_mode: bool,
    /// Let object fields hold instances of descendant entities.
    pub allow_subtypes: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_document_size: 1024 * 1024,
            strict_mode: false,
            allow_subtypes: true,
        }
    }
}
