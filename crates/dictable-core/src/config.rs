/// Controls conversion behavior for every entity in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, raw mappings reject keys that no field declares.
    pub strict_mode: bool,
    /// When true, object fields accept instances of descendant entities.
    pub allow_subtypes: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            allow_subtypes: true,
        }
    }
}

/// How an entity renders back into a raw mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Every declared field, nulls included.
    #[default]
    Full,
    /// Skip fields that are null and optional.
    Compact,
}
