//! Runtime Node Model
//!
//! Document trees are built from [`Node`]s, each an instance of a
//! [`SynthesizedClass`](crate::synthesis::SynthesizedClass). Attributes,
//! children and text are validated against the class metadata as they are
//! set; serialization goes through [`crate::documents`].

pub mod node;
pub mod value;

pub use node::Node;
pub use value::Value;
