//! Resource loading utilities
//!
//! Reads schema documents from disk under the configured [`Limits`] and
//! resolves `schemaLocation` references relative to the including document.

use crate::error::{Error, Result, SchemaError};
use crate::limits::Limits;
use std::fs;
use std::path::{Path, PathBuf};

/// Resource loader for schema documents
#[derive(Debug, Clone)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
    /// Directory used to resolve locations of in-memory schemas
    base_dir: Option<PathBuf>,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            base_dir: None,
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the directory that relative locations of in-memory schemas resolve against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Get the limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Get the base directory
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Load a schema document as a string
    pub fn load(&self, path: &Path) -> Result<String> {
        let metadata = fs::metadata(path).map_err(|e| {
            SchemaError::new(format!("cannot read schema document: {}", e))
                .with_location(path.display().to_string())
        })?;

        // Check size limits before reading the whole file
        self.limits.check_schema_size(metadata.len() as usize)?;

        fs::read_to_string(path).map_err(|e| {
            Error::Schema(
                SchemaError::new(format!("cannot read schema document: {}", e))
                    .with_location(path.display().to_string()),
            )
        })
    }

    /// Resolve a `schemaLocation` against the document that references it
    ///
    /// `referrer` is `None` for schemas loaded from memory; those resolve
    /// against the configured base directory, or the working directory.
    pub fn resolve(&self, location: &str, referrer: Option<&Path>) -> PathBuf {
        let location = Path::new(location);
        if location.is_absolute() {
            return location.to_path_buf();
        }

        let base = referrer
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .or_else(|| self.base_dir.clone())
            .unwrap_or_default();

        base.join(location)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<root>test</root>").unwrap();

        let loader = Loader::new();
        let content = loader.load(file.path()).unwrap();

        assert!(content.contains("<root>test</root>"));
    }

    #[test]
    fn test_missing_file_is_schema_error() {
        let loader = Loader::new();
        let result = loader.load(Path::new("/nonexistent/BuildingSync.xsd"));
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(11 * 1024 * 1024); // 11 MB
        write!(file, "{}", large_content).unwrap();

        let loader = Loader::new().with_limits(Limits::strict());
        let result = loader.load(file.path());

        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_resolve_relative_to_referrer() {
        let loader = Loader::new().with_base_dir("/ignored");
        let resolved = loader.resolve("types.xsd", Some(Path::new("/schemas/main.xsd")));
        assert_eq!(resolved, PathBuf::from("/schemas/types.xsd"));
    }

    #[test]
    fn test_resolve_in_memory_uses_base_dir() {
        let loader = Loader::new().with_base_dir("/schemas");
        assert_eq!(loader.resolve("types.xsd", None), PathBuf::from("/schemas/types.xsd"));
        assert_eq!(loader.resolve("/abs/t.xsd", None), PathBuf::from("/abs/t.xsd"));
    }
}
