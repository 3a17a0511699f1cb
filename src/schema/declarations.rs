//! Normalized schema declarations
//!
//! The loader flattens every document of a schema bundle into one
//! [`DeclarationTable`]. Declarations keep references to other components as
//! unresolved names; the type graph builder resolves them.

use super::facets::Facets;
use super::particles::Occurs;
use crate::error::{Result, SchemaError};
use crate::namespaces::Reference;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Compositor of a model group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// xs:sequence
    Sequence,
    /// xs:choice
    Choice,
    /// xs:all
    All,
}

impl GroupKind {
    /// Parse a compositor from its XSD local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "sequence" => Some(GroupKind::Sequence),
            "choice" => Some(GroupKind::Choice),
            "all" => Some(GroupKind::All),
            _ => None,
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKind::Sequence => write!(f, "sequence"),
            GroupKind::Choice => write!(f, "choice"),
            GroupKind::All => write!(f, "all"),
        }
    }
}

/// Reference to a simple type, by name or declared inline
#[derive(Debug, Clone)]
pub enum SimpleTypeRef {
    /// A named type (built-in or declared)
    Named(Reference),
    /// An anonymous xs:simpleType child
    Inline(Box<SimpleTypeDecl>),
}

/// Variety of a simple type
#[derive(Debug, Clone)]
pub enum SimpleVariety {
    /// xs:restriction of a base type
    Restriction {
        /// Base type
        base: SimpleTypeRef,
        /// Facets declared by this step
        facets: Facets,
    },
    /// xs:list of an item type
    List {
        /// Item type
        item: SimpleTypeRef,
    },
    /// xs:union of member types
    Union {
        /// Member types, `memberTypes` first, then inline members
        members: Vec<SimpleTypeRef>,
    },
}

/// An xs:simpleType declaration
#[derive(Debug, Clone)]
pub struct SimpleTypeDecl {
    /// Name (None for anonymous types)
    pub name: Option<String>,
    /// Variety and its components
    pub variety: SimpleVariety,
    /// Annotation text
    pub documentation: Option<String>,
}

/// How an attribute may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeUse {
    /// use="optional" (default)
    #[default]
    Optional,
    /// use="required"
    Required,
    /// use="prohibited"
    Prohibited,
}

impl AttributeUse {
    /// Parse the `use` attribute value
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("optional") => Some(AttributeUse::Optional),
            Some("required") => Some(AttributeUse::Required),
            Some("prohibited") => Some(AttributeUse::Prohibited),
            Some(_) => None,
        }
    }
}

/// An xs:attribute declaration
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    /// Attribute name
    pub name: String,
    /// Value type (None means xs:anySimpleType)
    pub type_ref: Option<SimpleTypeRef>,
    /// Use
    pub use_: AttributeUse,
    /// Default value
    pub default: Option<String>,
    /// Fixed value
    pub fixed: Option<String>,
    /// Annotation text
    pub documentation: Option<String>,
}

/// One entry of a type's or attribute group's attribute list
#[derive(Debug, Clone)]
pub enum AttributeUseDecl {
    /// A locally declared attribute
    Local(AttributeDecl),
    /// A reference to a global attribute
    Ref {
        /// Referenced attribute name
        name: String,
        /// Use at this point
        use_: AttributeUse,
    },
    /// A reference to an attribute group
    GroupRef(String),
}

/// Type of an element declaration
#[derive(Debug, Clone)]
pub enum ElementType {
    /// `type="..."`
    Named(Reference),
    /// Anonymous complex type
    Complex(Box<ComplexTypeDecl>),
    /// Anonymous simple type
    Simple(Box<SimpleTypeDecl>),
    /// No type given (xs:anyType)
    Untyped,
}

/// An xs:element declaration, global or local
#[derive(Debug, Clone)]
pub struct ElementDecl {
    /// Element name
    pub name: String,
    /// Element type
    pub type_ref: ElementType,
    /// Head of the substitution group this element belongs to
    pub substitution_group: Option<String>,
    /// Whether the element is abstract
    pub is_abstract: bool,
    /// Annotation text
    pub documentation: Option<String>,
}

/// A particle of a content model
#[derive(Debug, Clone)]
pub enum Particle {
    /// Local element declaration
    Element {
        /// The declaration
        decl: ElementDecl,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// `<xs:element ref="..."/>`
    ElementRef {
        /// Referenced global element
        name: String,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Nested sequence, choice or all
    Group(ModelGroup),
    /// `<xs:group ref="..."/>`
    GroupRef {
        /// Referenced model group
        name: String,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// xs:any wildcard
    Any {
        /// Occurrence bounds
        occurs: Occurs,
    },
}

/// A sequence, choice or all group
#[derive(Debug, Clone)]
pub struct ModelGroup {
    /// Compositor
    pub kind: GroupKind,
    /// Occurrence bounds of the group itself
    pub occurs: Occurs,
    /// Member particles in declaration order
    pub particles: Vec<Particle>,
}

impl ModelGroup {
    /// Create an empty group
    pub fn new(kind: GroupKind, occurs: Occurs) -> Self {
        Self {
            kind,
            occurs,
            particles: Vec::new(),
        }
    }
}

/// Content of a complex type
#[derive(Debug, Clone)]
pub enum ContentDecl {
    /// No children
    Empty,
    /// A model group directly under xs:complexType
    Model(ModelGroup),
    /// complexContent/extension
    Extension {
        /// Base type
        base: Reference,
        /// Additional content appended to the base's
        model: Option<ModelGroup>,
    },
    /// complexContent/restriction
    Restriction {
        /// Base type
        base: Reference,
        /// Content replacing the base's
        model: Option<ModelGroup>,
    },
    /// simpleContent/extension
    SimpleExtension {
        /// Base type (simple, or complex with simple content)
        base: Reference,
    },
    /// simpleContent/restriction
    SimpleRestriction {
        /// Base type
        base: Reference,
        /// Facets narrowing the base's text domain
        facets: Facets,
    },
}

impl ContentDecl {
    /// The derivation base, if any
    pub fn base(&self) -> Option<&Reference> {
        match self {
            ContentDecl::Extension { base, .. }
            | ContentDecl::Restriction { base, .. }
            | ContentDecl::SimpleExtension { base }
            | ContentDecl::SimpleRestriction { base, .. } => Some(base),
            ContentDecl::Empty | ContentDecl::Model(_) => None,
        }
    }
}

/// An xs:complexType declaration
#[derive(Debug, Clone)]
pub struct ComplexTypeDecl {
    /// Name (None for anonymous types)
    pub name: Option<String>,
    /// Whether the type is abstract
    pub is_abstract: bool,
    /// Whether text may be interleaved with children
    pub mixed: bool,
    /// Content model
    pub content: ContentDecl,
    /// Attribute list, including those under complexContent/simpleContent
    pub attributes: Vec<AttributeUseDecl>,
    /// Annotation text
    pub documentation: Option<String>,
}

/// A named xs:attributeGroup
#[derive(Debug, Clone)]
pub struct AttributeGroupDecl {
    /// Group name
    pub name: String,
    /// Member attributes and nested group references
    pub attributes: Vec<AttributeUseDecl>,
}

/// A named xs:group
#[derive(Debug, Clone)]
pub struct GroupDecl {
    /// Group name
    pub name: String,
    /// The group's model
    pub model: ModelGroup,
}

/// All global declarations of a schema bundle, keyed by local name
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    /// Target namespace of the root document
    pub target_namespace: Option<String>,
    /// Global elements
    pub elements: IndexMap<String, ElementDecl>,
    /// Named complex types
    pub complex_types: IndexMap<String, ComplexTypeDecl>,
    /// Named simple types
    pub simple_types: IndexMap<String, SimpleTypeDecl>,
    /// Global attributes
    pub attributes: IndexMap<String, AttributeDecl>,
    /// Attribute groups
    pub attribute_groups: IndexMap<String, AttributeGroupDecl>,
    /// Model groups
    pub groups: IndexMap<String, GroupDecl>,
    /// Documents merged into this table, in load order
    pub documents: Vec<String>,
}

/// Insert into a symbol space, rejecting a second declaration of the same name
fn insert_unique<T>(
    map: &mut IndexMap<String, T>,
    kind: &str,
    name: String,
    decl: T,
    location: &str,
) -> Result<()> {
    if map.contains_key(&name) {
        return Err(SchemaError::new(format!("duplicate {} declaration", kind))
            .with_component(name)
            .with_location(location)
            .into());
    }
    debug!(kind, name = name.as_str(), "registered declaration");
    map.insert(name, decl);
    Ok(())
}

impl DeclarationTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of global declarations
    pub fn len(&self) -> usize {
        self.elements.len()
            + self.complex_types.len()
            + self.simple_types.len()
            + self.attributes.len()
            + self.attribute_groups.len()
            + self.groups.len()
    }

    /// Whether the table has no declarations
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a global element
    pub fn add_element(&mut self, decl: ElementDecl, location: &str) -> Result<()> {
        insert_unique(&mut self.elements, "element", decl.name.clone(), decl, location)
    }

    /// Register a named complex type
    ///
    /// Complex and simple types share one symbol space.
    pub fn add_complex_type(&mut self, decl: ComplexTypeDecl, location: &str) -> Result<()> {
        let name = decl
            .name
            .clone()
            .ok_or_else(|| SchemaError::new("global complexType without a name").with_location(location))?;
        if self.simple_types.contains_key(&name) {
            return Err(duplicate_type(name, location));
        }
        insert_unique(&mut self.complex_types, "type", name, decl, location)
    }

    /// Register a named simple type
    pub fn add_simple_type(&mut self, decl: SimpleTypeDecl, location: &str) -> Result<()> {
        let name = decl
            .name
            .clone()
            .ok_or_else(|| SchemaError::new("global simpleType without a name").with_location(location))?;
        if self.complex_types.contains_key(&name) {
            return Err(duplicate_type(name, location));
        }
        insert_unique(&mut self.simple_types, "type", name, decl, location)
    }

    /// Register a global attribute
    pub fn add_attribute(&mut self, decl: AttributeDecl, location: &str) -> Result<()> {
        insert_unique(&mut self.attributes, "attribute", decl.name.clone(), decl, location)
    }

    /// Register an attribute group
    pub fn add_attribute_group(&mut self, decl: AttributeGroupDecl, location: &str) -> Result<()> {
        insert_unique(
            &mut self.attribute_groups,
            "attributeGroup",
            decl.name.clone(),
            decl,
            location,
        )
    }

    /// Register a model group
    pub fn add_group(&mut self, decl: GroupDecl, location: &str) -> Result<()> {
        insert_unique(&mut self.groups, "group", decl.name.clone(), decl, location)
    }

    /// Whether a named type (complex or simple) is declared
    pub fn has_type(&self, name: &str) -> bool {
        self.complex_types.contains_key(name) || self.simple_types.contains_key(name)
    }
}

fn duplicate_type(name: String, location: &str) -> crate::error::Error {
    SchemaError::new("duplicate type declaration")
        .with_component(name)
        .with_location(location)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn element(name: &str) -> ElementDecl {
        ElementDecl {
            name: name.to_string(),
            type_ref: ElementType::Untyped,
            substitution_group: None,
            is_abstract: false,
            documentation: None,
        }
    }

    fn simple(name: &str) -> SimpleTypeDecl {
        SimpleTypeDecl {
            name: Some(name.to_string()),
            variety: SimpleVariety::Restriction {
                base: SimpleTypeRef::Named(Reference::Builtin("string".to_string())),
                facets: Facets::default(),
            },
            documentation: None,
        }
    }

    fn complex(name: &str) -> ComplexTypeDecl {
        ComplexTypeDecl {
            name: Some(name.to_string()),
            is_abstract: false,
            mixed: false,
            content: ContentDecl::Empty,
            attributes: Vec::new(),
            documentation: None,
        }
    }

    #[test]
    fn test_duplicate_element_fails() {
        let mut table = DeclarationTable::new();
        table.add_element(element("Facility"), "a.xsd").unwrap();
        let err = table.add_element(element("Facility"), "b.xsd").unwrap_err();
        match err {
            Error::Schema(e) => {
                assert_eq!(e.component.as_deref(), Some("Facility"));
                assert_eq!(e.location.as_deref(), Some("b.xsd"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_types_share_symbol_space() {
        let mut table = DeclarationTable::new();
        table.add_simple_type(simple("Measurement"), "a.xsd").unwrap();
        assert!(table.add_complex_type(complex("Measurement"), "b.xsd").is_err());
        assert!(table.has_type("Measurement"));
    }

    #[test]
    fn test_elements_and_types_are_separate() {
        let mut table = DeclarationTable::new();
        table.add_element(element("Site"), "a.xsd").unwrap();
        table.add_complex_type(complex("Site"), "a.xsd").unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_attribute_use_parse() {
        assert_eq!(AttributeUse::parse(None), Some(AttributeUse::Optional));
        assert_eq!(AttributeUse::parse(Some("required")), Some(AttributeUse::Required));
        assert_eq!(AttributeUse::parse(Some("sometimes")), None);
    }
}
