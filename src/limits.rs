//! Limits for schema loading
//!
//! Bounds the work a single generation pass may do, so a hostile or broken
//! schema bundle (huge files, runaway include chains) fails instead of
//! exhausting memory.

use crate::error::{Error, Result};

/// Resource limits applied by the schema loader
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum size of one schema document in bytes
    pub max_schema_size: usize,

    /// Maximum depth of nested `xs:include` / `xs:import`
    pub max_include_depth: usize,

    /// Maximum number of top-level declarations across all documents
    pub max_declarations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_schema_size: 50 * 1024 * 1024, // 50 MB
            max_include_depth: 32,
            max_declarations: 100_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_schema_size: 10 * 1024 * 1024, // 10 MB
            max_include_depth: 8,
            max_declarations: 20_000,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_schema_size: 1024 * 1024 * 1024, // 1 GB
            max_include_depth: 256,
            max_declarations: 10_000_000,
        }
    }

    /// Check if a schema document size is within limits
    pub fn check_schema_size(&self, size: usize) -> Result<()> {
        if size > self.max_schema_size {
            Err(Error::LimitExceeded(format!(
                "schema size {} bytes exceeds maximum {} bytes",
                size, self.max_schema_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if include nesting is within limits
    pub fn check_include_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_include_depth {
            Err(Error::LimitExceeded(format!(
                "include depth {} exceeds maximum {}",
                depth, self.max_include_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of declarations is within limits
    pub fn check_declarations(&self, count: usize) -> Result<()> {
        if count > self.max_declarations {
            Err(Error::LimitExceeded(format!(
                "declaration count {} exceeds maximum {}",
                count, self.max_declarations
            )))
        } else {
            Ok(())
        }
    }
}
