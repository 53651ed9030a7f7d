/// Controls catalog loading and decoding behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    /// When true, payload bytes left over after the schema is exhausted are
    /// ignored instead of failing with `SchemaError::TrailingBytes`.
    pub allow_trailing_bytes: bool,
    /// Maximum bytes allowed for a catalog file loaded from disk.
    pub max_catalog_file_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            allow_trailing_bytes: false,
            max_catalog_file_size: 4 * 1024 * 1024,
        }
    }
}
