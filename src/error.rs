//! Error types for bsync
//!
//! Generation failures (a malformed or unresolvable schema) are reported as
//! [`SchemaError`] and abort the whole pass. The three runtime errors
//! ([`UnknownAttributeError`], [`ValueDomainError`], [`StructureError`]) are
//! raised while building a document tree and never leave a node half-mutated.

use std::fmt;
use thiserror::Error;

/// Result type alias using bsync Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bsync operations
#[derive(Error, Debug)]
pub enum Error {
    /// The schema is malformed, has unresolved references, or a cyclic base chain
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// An attribute name is not declared for the class
    #[error("unknown attribute: {0}")]
    UnknownAttribute(#[from] UnknownAttributeError),

    /// A value is outside its declared enumeration, pattern or built-in domain
    #[error("value domain error: {0}")]
    ValueDomain(#[from] ValueDomainError),

    /// A child does not fit the content model of its parent
    #[error("structure error: {0}")]
    Structure(#[from] StructureError),

    /// No class is registered under the requested name
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing or writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Metadata (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the caller can correct the input and reissue the call.
    ///
    /// Runtime tree-building errors are recoverable; everything raised while
    /// loading a schema or generating classes is not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnknownAttribute(_) | Error::ValueDomain(_) | Error::Structure(_) | Error::Name(_)
        )
    }
}

/// The schema itself is unusable
#[derive(Debug, Clone)]
pub struct SchemaError {
    /// Error message
    pub message: String,
    /// Schema document the error was found in
    pub location: Option<String>,
    /// Schema component that caused the error
    pub component: Option<String>,
}

impl SchemaError {
    /// Create a new schema error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            component: None,
        }
    }

    /// Set the schema document location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the schema component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref component) = self.component {
            write!(f, " (in '{}')", component)?;
        }

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// An attribute name absent from the class's resolved attribute set
#[derive(Debug, Clone)]
pub struct UnknownAttributeError {
    /// Class the attribute was set on
    pub class_name: String,
    /// The rejected attribute name
    pub attribute: String,
    /// Attribute names the class accepts
    pub allowed: Vec<String>,
}

impl UnknownAttributeError {
    /// Create a new unknown attribute error
    pub fn new(class_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            attribute: attribute.into(),
            allowed: Vec::new(),
        }
    }

    /// Set the accepted attribute names
    pub fn with_allowed(mut self, allowed: Vec<String>) -> Self {
        self.allowed = allowed;
        self
    }
}

impl fmt::Display for UnknownAttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' has no attribute '{}'",
            self.class_name, self.attribute
        )?;

        if self.allowed.is_empty() {
            write!(f, "; it declares no attributes")?;
        } else {
            write!(f, "; expected one of: {}", self.allowed.join(", "))?;
        }

        Ok(())
    }
}

impl std::error::Error for UnknownAttributeError {}

/// A value outside its declared domain
#[derive(Debug, Clone)]
pub struct ValueDomainError {
    /// Error message
    pub message: String,
    /// The rejected value
    pub value: String,
    /// Attribute or class whose domain was violated
    pub target: Option<String>,
    /// Why the value was rejected
    pub reason: Option<String>,
}

impl ValueDomainError {
    /// Create a new value domain error
    pub fn new(message: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value: value.into(),
            target: None,
            reason: None,
        }
    }

    /// Set the attribute or class whose domain was violated
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ValueDomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: '{}'", self.message, self.value)?;

        if let Some(ref target) = self.target {
            write!(f, " for '{}'", target)?;
        }

        if let Some(ref reason) = self.reason {
            write!(f, "\n\nReason: {}", reason)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValueDomainError {}

/// A child that does not fit its parent's content model
#[derive(Debug, Clone)]
pub struct StructureError {
    /// Error message
    pub message: String,
    /// Class of the parent node
    pub parent: Option<String>,
    /// Class of the offending child
    pub child: Option<String>,
    /// Slot names that would have been acceptable
    pub expected: Vec<String>,
}

impl StructureError {
    /// Create a new structure error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            parent: None,
            child: None,
            expected: Vec::new(),
        }
    }

    /// Set the parent class
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the offending child class
    pub fn with_child(mut self, child: impl Into<String>) -> Self {
        self.child = Some(child.into());
        self
    }

    /// Set the expected slots
    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = expected;
        self
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref child) = self.child {
            write!(f, "\n\nChild: {}", child)?;
        }

        if let Some(ref parent) = self.parent {
            write!(f, "\n\nParent: {}", parent)?;
        }

        if !self.expected.is_empty() {
            write!(f, "\n\nExpected one of: {}", self.expected.join(", "))?;
        }

        Ok(())
    }
}

impl std::error::Error for StructureError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::new("cyclic extension chain")
            .with_component("AType")
            .with_location("BuildingSync.xsd");

        let msg = format!("{}", err);
        assert!(msg.contains("cyclic extension chain"));
        assert!(msg.contains("AType"));
        assert!(msg.contains("Location:"));
    }

    #[test]
    fn test_unknown_attribute_display() {
        let err = UnknownAttributeError::new("Facility", "Foo")
            .with_allowed(vec!["ID".to_string()]);

        let msg = format!("{}", err);
        assert!(msg.contains("'Facility' has no attribute 'Foo'"));
        assert!(msg.contains("expected one of: ID"));
    }

    #[test]
    fn test_structure_error_display() {
        let err = StructureError::new("no slot accepts this child")
            .with_parent("Facilities")
            .with_child("Site")
            .with_expected(vec!["Facility".to_string()]);

        let msg = format!("{}", err);
        assert!(msg.contains("Child: Site"));
        assert!(msg.contains("Parent: Facilities"));
        assert!(msg.contains("Expected one of: Facility"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ValueDomainError::new("not in enumeration", "Purple").into();
        assert!(matches!(err, Error::ValueDomain(_)));
        assert!(err.is_recoverable());

        let err: Error = SchemaError::new("bad").into();
        assert!(!err.is_recoverable());
    }
}
