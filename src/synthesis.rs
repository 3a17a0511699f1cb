//! Class Synthesizer
//!
//! Walks a [`TypeGraph`] bases-first and emits one [`SynthesizedClass`] per
//! definition into a [`ClassRegistry`], the generated module. The registry
//! is built once and only read afterwards; every [`Node`] shares its class
//! through an `Arc`.
//!
//! The registry serializes to JSON, so generation can run as an offline step
//! and the runtime can load the result without the schema:
//!
//! ```no_run
//! use bsync::synthesis::{ClassRegistry, Generator};
//!
//! let registry = Generator::new("BuildingSync").generate_file("BuildingSync.xsd")?;
//! std::fs::write("bsync.json", registry.to_json()?)?;
//!
//! let loaded = ClassRegistry::from_json(&std::fs::read_to_string("bsync.json")?)?;
//! let root = loaded.new_root()?;
//! # Ok::<(), bsync::Error>(())
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result, SchemaError};
use crate::graph::{build_graph, ChildSlot, DefKind, TypeDef, TypeGraph};
use crate::names::is_valid_class_path;
use crate::runtime::Node;
use crate::schema::SchemaLoader;

/// The runtime counterpart of a [`TypeDef`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedClass {
    /// Resolved metadata, shared read-only by all instances
    def: Arc<TypeDef>,
    /// This class followed by its bases, nearest first
    lineage: Vec<String>,
    /// Shortest dotted suffix of the name no other class shares
    alias: String,
}

impl SynthesizedClass {
    /// Full class name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Shortest unambiguous name
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// XML element name of a standalone instance
    pub fn element_name(&self) -> &str {
        &self.def.element_name
    }

    /// The resolved type definition
    pub fn def(&self) -> &TypeDef {
        &self.def
    }

    /// Base class name
    pub fn base(&self) -> Option<&str> {
        self.def.base.as_deref()
    }

    /// This class and its bases, nearest first
    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    /// Whether this class is, or derives from, the named class
    pub fn is_a(&self, name: &str) -> bool {
        self.lineage.iter().any(|n| n == name)
    }

    /// Whether instances may be created
    pub fn is_abstract(&self) -> bool {
        self.def.is_abstract
    }

    /// Annotation text
    pub fn documentation(&self) -> Option<&str> {
        self.def.documentation.as_deref()
    }

    /// Child slots, inherited ones first
    pub fn slots(&self) -> &[ChildSlot] {
        &self.def.children
    }

    /// Indices of the slots accepting an instance of `child`, in declaration order
    pub fn accepting_slots(&self, child: &SynthesizedClass) -> Vec<usize> {
        self.def
            .children
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                child.is_a(&slot.type_name)
                    || slot.declared_type.as_deref().map_or(false, |t| child.is_a(t))
                    || slot.alternatives.iter().any(|a| child.is_a(a))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Element name for an instance of `child` placed in slot `index`
    ///
    /// Substitution group members keep their own name; everything else is
    /// written under the slot's name.
    pub fn child_element_name<'a>(&'a self, index: usize, child: &'a SynthesizedClass) -> &'a str {
        match self.def.children.get(index) {
            Some(slot)
                if child.is_a(&slot.type_name)
                    || slot.declared_type.as_deref().map_or(false, |t| child.is_a(t)) =>
            {
                &slot.name
            }
            _ => child.element_name(),
        }
    }
}

impl fmt::Display for SynthesizedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.def.name)?;
        if let Some(base) = &self.def.base {
            write!(f, "({})", base)?;
        }
        Ok(())
    }
}

/// The generated module: every synthesized class plus the document root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRegistry {
    /// Target namespace of the schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_namespace: Option<String>,
    /// Root element class name
    root: String,
    /// Classes in emission order, bases before derivatives
    classes: IndexMap<String, Arc<SynthesizedClass>>,
    /// Alias to full name
    #[serde(skip)]
    aliases: HashMap<String, String>,
}

impl ClassRegistry {
    /// Look up a class by full name, falling back to its alias
    pub fn get(&self, name: &str) -> Result<Arc<SynthesizedClass>> {
        self.class(name)
            .cloned()
            .ok_or_else(|| Error::Name(format!("no class named '{}'", name)))
    }

    /// Look up a class without failing
    pub fn class(&self, name: &str) -> Option<&Arc<SynthesizedClass>> {
        self.classes
            .get(name)
            .or_else(|| self.aliases.get(name).and_then(|full| self.classes.get(full)))
    }

    /// Whether a class name or alias is known
    pub fn contains(&self, name: &str) -> bool {
        self.class(name).is_some()
    }

    /// All classes, bases before derivatives
    pub fn classes(&self) -> impl Iterator<Item = &Arc<SynthesizedClass>> {
        self.classes.values()
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Root element class name
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Target namespace of the schema
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Create an empty node of a class
    pub fn new_node(&self, name: &str) -> Result<Node> {
        Node::new(self.get(name)?)
    }

    /// Create an empty root element node
    pub fn new_root(&self) -> Result<Node> {
        self.new_node(&self.root)
    }

    /// Construct a node with initial children and attributes
    pub fn construct<C, A, K, V>(&self, name: &str, children: C, attributes: A) -> Result<Node>
    where
        C: IntoIterator<Item = Node>,
        A: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Node::construct(self.get(name)?, children, attributes)
    }

    /// Serialize the registry as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a registry written by [`ClassRegistry::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let mut registry: ClassRegistry = serde_json::from_str(json)?;
        registry.check_consistency()?;
        registry.aliases = index_aliases(&registry.classes);
        Ok(registry)
    }

    /// Every referenced class must be present
    fn check_consistency(&self) -> Result<()> {
        let missing = |name: &str, referrer: &str| -> Error {
            SchemaError::new(format!("metadata references unknown class '{}'", name))
                .with_component(referrer)
                .into()
        };

        match self.classes.get(&self.root) {
            Some(class) if class.def.kind == DefKind::GlobalElement => {}
            _ => return Err(missing(&self.root, "root")),
        }
        for (key, class) in &self.classes {
            if key != class.name() || !is_valid_class_path(key) {
                return Err(SchemaError::new(format!("invalid class name '{}'", key)).into());
            }
            for name in class.lineage.iter().chain(class.def.base.iter()) {
                if !self.classes.contains_key(name) {
                    return Err(missing(name, class.name()));
                }
            }
            for slot in &class.def.children {
                let referenced = std::iter::once(&slot.type_name)
                    .chain(slot.declared_type.iter())
                    .chain(slot.alternatives.iter());
                for name in referenced {
                    if !self.classes.contains_key(name) {
                        return Err(missing(name, class.name()));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Emission order: every definition after its base
fn topological_order(graph: &TypeGraph) -> Result<Vec<&TypeDef>> {
    for def in graph.defs() {
        if let Some(base) = &def.base {
            if !graph.contains(base) {
                return Err(SchemaError::new(format!("unresolved base class '{}'", base))
                    .with_component(def.name.clone())
                    .into());
            }
        }
    }

    let mut pending: Vec<&TypeDef> = graph.defs().collect();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut order = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let (ready, blocked): (Vec<&TypeDef>, Vec<&TypeDef>) = pending
            .into_iter()
            .partition(|def| def.base.as_deref().map_or(true, |b| emitted.contains(b)));

        if ready.is_empty() {
            let names: Vec<&str> = blocked.iter().map(|d| d.name.as_str()).collect();
            return Err(SchemaError::new(format!(
                "cyclic base chain among: {}",
                names.join(", ")
            ))
            .into());
        }

        for def in ready {
            emitted.insert(def.name.as_str());
            order.push(def);
        }
        pending = blocked;
    }

    Ok(order)
}

/// Shortest dotted suffix of each name that no other name shares
fn shortest_aliases<'a>(names: &[&'a str]) -> HashMap<&'a str, String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in names {
        for suffix in suffixes(name) {
            *counts.entry(suffix).or_default() += 1;
        }
    }

    names
        .iter()
        .map(|&name| {
            let alias = suffixes(name)
                .into_iter()
                .find(|s| counts.get(s) == Some(&1))
                .unwrap_or_else(|| name.to_string());
            (name, alias)
        })
        .collect()
}

fn suffixes(name: &str) -> Vec<String> {
    let segments: Vec<&str> = name.split('.').collect();
    (1..=segments.len())
        .map(|n| segments[segments.len() - n..].join("."))
        .collect()
}

fn index_aliases(classes: &IndexMap<String, Arc<SynthesizedClass>>) -> HashMap<String, String> {
    classes
        .values()
        .filter(|c| c.alias != c.def.name && !classes.contains_key(&c.alias))
        .map(|c| (c.alias.clone(), c.def.name.clone()))
        .collect()
}

/// Synthesize the classes of a type graph
pub fn synthesize(graph: TypeGraph, root: &str) -> Result<ClassRegistry> {
    match graph.get(root) {
        Some(def) if def.kind == DefKind::GlobalElement => {}
        Some(def) => {
            return Err(SchemaError::new(format!(
                "root '{}' is a {}, not a global element",
                root, def.kind
            ))
            .into())
        }
        None => {
            return Err(SchemaError::new(format!("root element '{}' is not declared", root)).into())
        }
    }

    let order = topological_order(&graph)?;
    let names: Vec<&str> = graph.defs().map(|d| d.name.as_str()).collect();
    let aliases = shortest_aliases(&names);

    let mut classes: IndexMap<String, Arc<SynthesizedClass>> = IndexMap::with_capacity(order.len());
    for def in order {
        let mut lineage = vec![def.name.clone()];
        if let Some(base) = def.base.as_ref().and_then(|b| classes.get(b)) {
            lineage.extend(base.lineage.iter().cloned());
        }
        let alias = aliases
            .get(def.name.as_str())
            .cloned()
            .unwrap_or_else(|| def.name.clone());

        debug!(class = def.name.as_str(), alias = alias.as_str(), depth = lineage.len(), "synthesized class");
        let class = SynthesizedClass {
            def: Arc::new(def.clone()),
            lineage,
            alias,
        };
        classes.insert(def.name.clone(), Arc::new(class));
    }

    info!(classes = classes.len(), root, "synthesized class registry");
    let aliases = index_aliases(&classes);
    Ok(ClassRegistry {
        target_namespace: graph.target_namespace().map(str::to_string),
        root: root.to_string(),
        classes,
        aliases,
    })
}

/// Drives a whole generation pass: load, build, synthesize
#[derive(Debug, Clone)]
pub struct Generator {
    root: String,
    loader: SchemaLoader,
}

impl Generator {
    /// Create a generator for the given document root element
    pub fn new(root_element: impl Into<String>) -> Self {
        Self {
            root: root_element.into(),
            loader: SchemaLoader::new(),
        }
    }

    /// Use a configured schema loader
    pub fn with_loader(mut self, loader: SchemaLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Root element name
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Generate from a schema file
    pub fn generate_file(&self, path: impl AsRef<Path>) -> Result<ClassRegistry> {
        let table = self.loader.load_file(path)?;
        let graph = build_graph(&table)?;
        synthesize(graph, &self.root)
    }

    /// Generate from an in-memory schema document
    pub fn generate_str(&self, xsd: &str) -> Result<ClassRegistry> {
        let table = self.loader.load_str(xsd)?;
        let graph = build_graph(&table)?;
        synthesize(graph, &self.root)
    }
}
