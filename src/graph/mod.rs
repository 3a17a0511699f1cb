//! Type Graph Builder
//!
//! Resolves the declarations of a schema bundle into one canonical
//! [`TypeDef`] per class, with inheritance, model groups, attribute groups
//! and substitution groups expanded.

pub mod builder;
pub mod types;

pub use builder::{build_graph, GraphBuilder, TypeGraph};
pub use types::{AttributeDef, ChildSlot, ChoiceMembership, DefKind, Derivation, TypeDef};
