/// Controls JSON Schema export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportConfig {
    /// When true, exported objects reject properties no field declares.
    pub strict_mode: bool,
    /// When true, field descriptions are copied into the exported document.
    pub include_descriptions: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            include_descriptions: true,
        }
    }
}
