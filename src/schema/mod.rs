//! Schema Loader
//!
//! Reads an XSD bundle into a normalized [`DeclarationTable`]:
//!
//! - [`parsing`]: document traversal, include/import worklist
//! - [`declarations`]: the declaration data model
//! - [`builtins`]: XSD built-in types and their lexical spaces
//! - [`facets`]: enumeration/pattern/length facets and value domains
//! - [`particles`]: occurrence bounds

pub mod builtins;
pub mod declarations;
pub mod facets;
pub mod parsing;
pub mod particles;

pub use builtins::{BuiltinType, ValueFamily};
pub use declarations::{
    AttributeDecl, AttributeGroupDecl, AttributeUse, AttributeUseDecl, ComplexTypeDecl,
    ContentDecl, DeclarationTable, ElementDecl, ElementType, GroupDecl, GroupKind, ModelGroup,
    Particle, SimpleTypeDecl, SimpleTypeRef, SimpleVariety,
};
pub use facets::{Facets, Pattern, ValueDomain};
pub use parsing::SchemaLoader;
pub use particles::Occurs;
