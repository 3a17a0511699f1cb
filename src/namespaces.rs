//! XML namespace handling
//!
//! Schema documents refer to other components through prefixed names
//! (`auc:FacilityType`, `xs:string`). This module resolves those prefixes
//! against the declarations in scope and classifies the result as either an
//! XSD built-in or a component declared by the schema bundle.

use crate::error::{Result, SchemaError};
use crate::names::split_qname;
use std::collections::HashMap;
use std::fmt;

/// XSD 1.0 namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Whether this name lives in the XSD namespace
    pub fn is_xsd(&self) -> bool {
        self.namespace.as_deref() == Some(XSD_NAMESPACE)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// A resolved reference from one schema component to another
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// An XSD built-in type such as `xs:string`
    Builtin(String),
    /// A component declared somewhere in the loaded bundle
    Component(String),
}

impl Reference {
    /// The local name of the referenced component
    pub fn local_name(&self) -> &str {
        match self {
            Reference::Builtin(name) | Reference::Component(name) => name,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Builtin(name) => write!(f, "xs:{}", name),
            Reference::Component(name) => write!(f, "{}", name),
        }
    }
}

/// Namespace context for resolving prefixes
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self {
            prefixes: HashMap::new(),
            default_namespace: None,
        }
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Iterate over the prefix mappings
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// Merge another context into this one; existing prefixes win
    pub fn inherit(&mut self, parent: &NamespaceContext) {
        for (prefix, ns) in parent.iter() {
            self.prefixes
                .entry(prefix.to_string())
                .or_insert_with(|| ns.to_string());
        }
        if self.default_namespace.is_none() {
            self.default_namespace = parent.default_namespace.clone();
        }
    }

    /// Resolve a prefixed name to a QName
    pub fn resolve(&self, prefixed_name: &str) -> Result<QName> {
        if let (Some(prefix), local) = split_qname(prefixed_name) {
            let namespace = self.get_namespace(prefix).ok_or_else(|| {
                SchemaError::new(format!("unknown namespace prefix '{}'", prefix))
                    .with_component(prefixed_name)
            })?;
            Ok(QName::new(Some(namespace), local))
        } else {
            Ok(QName::new(self.default_namespace.clone(), prefixed_name))
        }
    }

    /// Resolve a prefixed name and classify it as built-in or bundle component
    pub fn resolve_reference(&self, prefixed_name: &str) -> Result<Reference> {
        let qname = self.resolve(prefixed_name)?;
        if qname.is_xsd() {
            Ok(Reference::Builtin(qname.local_name))
        } else {
            Ok(Reference::Component(qname.local_name))
        }
    }
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new()
    }
}
