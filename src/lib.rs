//! # bsync
//!
//! Generates a validated object model for BuildingSync documents from the
//! BuildingSync XML Schema.
//!
//! Generation runs in three stages:
//!
//! - [`schema`]: load the XSD bundle (following includes and imports) into a
//!   normalized declaration table
//! - [`graph`]: resolve every complex type, simple type and element into a
//!   [`TypeDef`](graph::TypeDef) with inheritance applied and content models
//!   flattened into ordered child slots
//! - [`synthesis`]: emit one class per definition, bases first, into a
//!   [`ClassRegistry`]
//!
//! Documents are then built from [`Node`]s. Every mutation is checked against
//! the class metadata, and a rejected call leaves the node unchanged.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bsync::{Generator, WriteOptions};
//!
//! let registry = Generator::new("BuildingSync").generate_file("BuildingSync.xsd")?;
//!
//! let facility = registry.new_node("Facilities.Facility")?.with_attribute("ID", "Facility-1")?;
//! let facilities = registry.new_node("Facilities")?.add_child(facility)?;
//! let doc = registry
//!     .new_root()?
//!     .with_attribute("version", "2.4.0")?
//!     .add_child(facilities)?;
//!
//! println!("{}", doc.to_xml_string(&WriteOptions::pretty())?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Utilities
pub mod names;
pub mod namespaces;

// Resource loading and XML documents
pub mod documents;
pub mod loaders;

// Generation pipeline
pub mod graph;
pub mod schema;
pub mod synthesis;

// Runtime node model
pub mod runtime;

// Re-exports for convenience
pub use documents::WriteOptions;
pub use error::{Error, Result};
pub use graph::{build_graph, TypeDef, TypeGraph};
pub use limits::Limits;
pub use runtime::{Node, Value};
pub use schema::SchemaLoader;
pub use synthesis::{ClassRegistry, Generator, SynthesizedClass};

/// Version of the bsync library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// BuildingSync target namespace
pub const BUILDINGSYNC_NAMESPACE: &str = "http://buildingsync.net/schemas/bedes-auc/2019";
