//! XSD document parsing
//!
//! Reads a schema bundle into a [`DeclarationTable`]. Includes and imports
//! are processed iteratively from a worklist so deep include chains cannot
//! exhaust the stack, and each document is loaded at most once.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::declarations::{
    AttributeDecl, AttributeGroupDecl, AttributeUse, AttributeUseDecl, ComplexTypeDecl,
    ContentDecl, DeclarationTable, ElementDecl, ElementType, GroupDecl, GroupKind, ModelGroup,
    Particle, SimpleTypeDecl, SimpleTypeRef, SimpleVariety,
};
use super::facets::{Facets, Pattern};
use super::particles::Occurs;
use crate::documents::{Document, Element};
use crate::error::{Result, SchemaError};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::namespaces::{Reference, XML_NAMESPACE, XSD_NAMESPACE};
use crate::names::validate_ncname;

/// XSD element local names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ATTRIBUTE_GROUP: &str = "attributeGroup";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const GROUP: &str = "group";
    pub const ANY: &str = "any";
    pub const ANNOTATION: &str = "annotation";
    pub const DOCUMENTATION: &str = "documentation";
    pub const IMPORT: &str = "import";
    pub const INCLUDE: &str = "include";
    pub const RESTRICTION: &str = "restriction";
    pub const EXTENSION: &str = "extension";
    pub const LIST: &str = "list";
    pub const UNION: &str = "union";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    // Facets
    pub const ENUMERATION: &str = "enumeration";
    pub const PATTERN: &str = "pattern";
    pub const LENGTH: &str = "length";
    pub const MIN_LENGTH: &str = "minLength";
    pub const MAX_LENGTH: &str = "maxLength";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const BASE: &str = "base";
    pub const VALUE: &str = "value";
    pub const USE: &str = "use";
    pub const DEFAULT: &str = "default";
    pub const FIXED: &str = "fixed";
    pub const MIXED: &str = "mixed";
    pub const ABSTRACT: &str = "abstract";
    pub const SUBSTITUTION_GROUP: &str = "substitutionGroup";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const NAMESPACE: &str = "namespace";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
    pub const ITEM_TYPE: &str = "itemType";
    pub const MEMBER_TYPES: &str = "memberTypes";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
}

/// Why a document is being loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inclusion {
    Root,
    Include,
    Import,
}

/// Pending schema document for iterative processing
struct PendingDocument {
    /// Resolved path of the document
    path: PathBuf,
    /// Include/import nesting depth
    depth: usize,
    /// How the document was reached
    inclusion: Inclusion,
    /// Target namespace of the including document
    parent_namespace: Option<String>,
}

/// Loads XSD documents into a normalized declaration table
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader {
    loader: Loader,
}

impl SchemaLoader {
    /// Create a loader with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.loader = self.loader.with_limits(limits);
        self
    }

    /// Set the directory that includes of in-memory schemas resolve against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.loader = self.loader.with_base_dir(base_dir);
        self
    }

    /// The underlying resource loader
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Load a schema bundle starting from a file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DeclarationTable> {
        let path = path.as_ref();
        let content = self.loader.load(path)?;
        self.load_bundle(&content, Some(path))
    }

    /// Load a schema bundle from an in-memory root document
    pub fn load_str(&self, xsd: &str) -> Result<DeclarationTable> {
        self.loader.limits().check_schema_size(xsd.len())?;
        self.load_bundle(xsd, None)
    }

    fn load_bundle(&self, root_content: &str, root_path: Option<&Path>) -> Result<DeclarationTable> {
        let mut table = DeclarationTable::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut pending: VecDeque<PendingDocument> = VecDeque::new();

        if let Some(path) = root_path {
            if let Ok(canonical) = path.canonicalize() {
                visited.insert(canonical);
            }
        }

        let root_location = root_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        let mut parser = DocumentParser {
            table: &mut table,
            location: root_location,
            referrer: root_path.map(Path::to_path_buf),
            loader: &self.loader,
            pending: &mut pending,
            depth: 0,
        };
        parser.parse(root_content, Inclusion::Root, None)?;

        while let Some(work) = pending.pop_front() {
            self.loader.limits().check_include_depth(work.depth)?;

            match work.path.canonicalize() {
                Ok(canonical) => {
                    if !visited.insert(canonical) {
                        debug!(path = %work.path.display(), "document already loaded");
                        continue;
                    }
                }
                Err(e) => {
                    let kind = match work.inclusion {
                        Inclusion::Import => "import",
                        _ => "include",
                    };
                    return Err(SchemaError::new(format!("cannot resolve {}: {}", kind, e))
                        .with_location(work.path.display().to_string())
                        .into());
                }
            }

            let content = self.loader.load(&work.path)?;
            let mut parser = DocumentParser {
                table: &mut table,
                location: work.path.display().to_string(),
                referrer: Some(work.path.clone()),
                loader: &self.loader,
                pending: &mut pending,
                depth: work.depth,
            };
            parser.parse(&content, work.inclusion, work.parent_namespace.as_deref())?;
            self.loader.limits().check_declarations(table.len())?;
        }

        self.loader.limits().check_declarations(table.len())?;
        info!(
            declarations = table.len(),
            documents = table.documents.len(),
            "loaded schema bundle"
        );
        Ok(table)
    }
}

/// Parses one schema document into the shared table
struct DocumentParser<'a> {
    table: &'a mut DeclarationTable,
    location: String,
    referrer: Option<PathBuf>,
    loader: &'a Loader,
    pending: &'a mut VecDeque<PendingDocument>,
    depth: usize,
}

impl<'a> DocumentParser<'a> {
    fn error(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::new(message).with_location(self.location.clone())
    }

    fn parse(&mut self, content: &str, inclusion: Inclusion, parent_namespace: Option<&str>) -> Result<()> {
        let doc = Document::from_string(content).map_err(|e| self.error(e.to_string()))?;
        let root = doc.root().ok_or_else(|| self.error("empty schema document"))?;

        if root.local_name() != xsd_elements::SCHEMA || !is_xsd(root) {
            return Err(self
                .error(format!("expected xs:schema root element, got {}", root.name))
                .into());
        }

        let target_namespace = root.get_attribute(xsd_attrs::TARGET_NAMESPACE).map(str::to_string);
        match inclusion {
            Inclusion::Root => self.table.target_namespace = target_namespace.clone(),
            Inclusion::Include => {
                // An included document without a target namespace adopts the includer's
                if let (Some(own), Some(parent)) = (target_namespace.as_deref(), parent_namespace) {
                    if own != parent {
                        return Err(self
                            .error(format!(
                                "included schema has targetNamespace '{}', expected '{}'",
                                own, parent
                            ))
                            .into());
                    }
                }
            }
            Inclusion::Import => {}
        }
        let namespace = target_namespace.or_else(|| parent_namespace.map(str::to_string));

        debug!(location = self.location.as_str(), "parsing schema document");
        self.table.documents.push(self.location.clone());

        for child in &root.children {
            self.parse_schema_child(child, namespace.as_deref())?;
        }
        Ok(())
    }

    fn parse_schema_child(&mut self, elem: &Element, namespace: Option<&str>) -> Result<()> {
        let location = self.location.clone();
        match elem.local_name() {
            xsd_elements::ELEMENT => {
                let decl = self.parse_element(elem)?;
                self.table.add_element(decl, &location)
            }
            xsd_elements::COMPLEX_TYPE => {
                let name = self.required_name(elem)?;
                let decl = self.parse_complex_type(elem, Some(name))?;
                self.table.add_complex_type(decl, &location)
            }
            xsd_elements::SIMPLE_TYPE => {
                let name = self.required_name(elem)?;
                let decl = self.parse_simple_type(elem, Some(name))?;
                self.table.add_simple_type(decl, &location)
            }
            xsd_elements::ATTRIBUTE => {
                let decl = self.parse_attribute_decl(elem)?;
                self.table.add_attribute(decl, &location)
            }
            xsd_elements::ATTRIBUTE_GROUP => {
                let name = self.required_name(elem)?;
                let attributes = self.parse_attribute_list(elem)?;
                self.table
                    .add_attribute_group(AttributeGroupDecl { name, attributes }, &location)
            }
            xsd_elements::GROUP => {
                let name = self.required_name(elem)?;
                let model = elem
                    .children
                    .iter()
                    .find_map(|c| GroupKind::from_local_name(c.local_name()).map(|k| (c, k)))
                    .map(|(c, kind)| self.parse_model_group(c, kind))
                    .transpose()?
                    .ok_or_else(|| self.error("model group has no sequence, choice or all").with_component(name.clone()))?;
                self.table.add_group(GroupDecl { name, model }, &location)
            }
            xsd_elements::INCLUDE => {
                let schema_location = elem
                    .get_attribute(xsd_attrs::SCHEMA_LOCATION)
                    .ok_or_else(|| self.error("xs:include without schemaLocation"))?;
                self.enqueue(schema_location, Inclusion::Include, namespace);
                Ok(())
            }
            xsd_elements::IMPORT => self.parse_import(elem, namespace),
            xsd_elements::ANNOTATION => Ok(()),
            other => {
                warn!(
                    element = other,
                    location = self.location.as_str(),
                    "skipping unsupported schema child"
                );
                Ok(())
            }
        }
    }

    fn enqueue(&mut self, schema_location: &str, inclusion: Inclusion, namespace: Option<&str>) {
        let path = self.loader.resolve(schema_location, self.referrer.as_deref());
        debug!(path = %path.display(), ?inclusion, "queued schema document");
        self.pending.push_back(PendingDocument {
            path,
            depth: self.depth + 1,
            inclusion,
            parent_namespace: namespace.map(str::to_string),
        });
    }

    fn parse_import(&mut self, elem: &Element, namespace: Option<&str>) -> Result<()> {
        let imported = elem.get_attribute(xsd_attrs::NAMESPACE);
        if imported.is_some() && imported == namespace {
            return Err(self
                .error("xs:import cannot import the schema's own targetNamespace")
                .into());
        }

        match elem.get_attribute(xsd_attrs::SCHEMA_LOCATION) {
            Some(schema_location) => {
                self.enqueue(schema_location, Inclusion::Import, imported);
                Ok(())
            }
            None => match imported {
                Some(ns) if ns == XSD_NAMESPACE || ns == XML_NAMESPACE => {
                    warn!(namespace = ns, "import of a well-known namespace is not loaded");
                    Ok(())
                }
                Some(ns) => Err(self
                    .error(format!("cannot resolve import of namespace '{}' without schemaLocation", ns))
                    .into()),
                None => Err(self.error("cannot resolve import without namespace or schemaLocation").into()),
            },
        }
    }

    fn required_name(&self, elem: &Element) -> Result<String> {
        let name = elem
            .get_attribute(xsd_attrs::NAME)
            .ok_or_else(|| self.error(format!("{} missing 'name' attribute", elem.name)))?;
        validate_ncname(name).map_err(|_| self.error(format!("invalid name '{}'", name)))?;
        Ok(name.to_string())
    }

    fn reference(&self, elem: &Element, value: &str) -> Result<Reference> {
        elem.namespaces
            .resolve_reference(value.trim())
            .map_err(|e| match e {
                crate::error::Error::Schema(inner) => inner.with_location(self.location.clone()).into(),
                other => other,
            })
    }

    fn occurs(&self, elem: &Element) -> Result<Occurs> {
        let min = elem.get_attribute(xsd_attrs::MIN_OCCURS);
        let max = elem.get_attribute(xsd_attrs::MAX_OCCURS);
        Occurs::parse(min, max).ok_or_else(|| {
            self.error(format!(
                "invalid occurrence bounds minOccurs={:?} maxOccurs={:?}",
                min, max
            ))
            .into()
        })
    }

    /// Parse an xs:element, global or local
    fn parse_element(&mut self, elem: &Element) -> Result<ElementDecl> {
        let name = self.required_name(elem)?;

        let type_ref = if let Some(type_name) = elem.get_attribute(xsd_attrs::TYPE) {
            ElementType::Named(self.reference(elem, type_name)?)
        } else if let Some(ct) = child(elem, xsd_elements::COMPLEX_TYPE) {
            ElementType::Complex(Box::new(self.parse_complex_type(ct, None)?))
        } else if let Some(st) = child(elem, xsd_elements::SIMPLE_TYPE) {
            ElementType::Simple(Box::new(self.parse_simple_type(st, None)?))
        } else {
            ElementType::Untyped
        };

        let substitution_group = elem
            .get_attribute(xsd_attrs::SUBSTITUTION_GROUP)
            .map(|head| self.reference(elem, head).map(|r| r.local_name().to_string()))
            .transpose()?;

        Ok(ElementDecl {
            name,
            type_ref,
            substitution_group,
            is_abstract: flag(elem, xsd_attrs::ABSTRACT),
            documentation: documentation(elem),
        })
    }

    /// Parse an xs:complexType, named or anonymous
    fn parse_complex_type(&mut self, elem: &Element, name: Option<String>) -> Result<ComplexTypeDecl> {
        let mut content = ContentDecl::Empty;
        let mut attributes = self.parse_attribute_list(elem)?;

        for c in &elem.children {
            if let Some(kind) = GroupKind::from_local_name(c.local_name()) {
                content = ContentDecl::Model(self.parse_model_group(c, kind)?);
                continue;
            }
            match c.local_name() {
                xsd_elements::GROUP => {
                    let mut model = ModelGroup::new(GroupKind::Sequence, Occurs::once());
                    model.particles.push(self.parse_group_ref(c)?);
                    content = ContentDecl::Model(model);
                }
                xsd_elements::COMPLEX_CONTENT => {
                    let (derived, attrs) = self.parse_complex_content(c)?;
                    content = derived;
                    attributes.extend(attrs);
                }
                xsd_elements::SIMPLE_CONTENT => {
                    let (derived, attrs) = self.parse_simple_content(c)?;
                    content = derived;
                    attributes.extend(attrs);
                }
                _ => {}
            }
        }

        Ok(ComplexTypeDecl {
            name,
            is_abstract: flag(elem, xsd_attrs::ABSTRACT),
            mixed: flag(elem, xsd_attrs::MIXED),
            content,
            attributes,
            documentation: documentation(elem),
        })
    }

    fn derivation<'e>(&self, elem: &'e Element) -> Result<(&'e Element, Reference)> {
        let derivation = elem
            .children
            .iter()
            .find(|c| matches!(c.local_name(), xsd_elements::EXTENSION | xsd_elements::RESTRICTION))
            .ok_or_else(|| self.error(format!("{} without extension or restriction", elem.name)))?;
        let base = derivation
            .get_attribute(xsd_attrs::BASE)
            .ok_or_else(|| self.error(format!("{} missing 'base' attribute", derivation.name)))?;
        Ok((derivation, self.reference(derivation, base)?))
    }

    fn parse_complex_content(&mut self, elem: &Element) -> Result<(ContentDecl, Vec<AttributeUseDecl>)> {
        let (derivation, base) = self.derivation(elem)?;

        let mut model = None;
        for c in &derivation.children {
            if let Some(kind) = GroupKind::from_local_name(c.local_name()) {
                model = Some(self.parse_model_group(c, kind)?);
            } else if c.local_name() == xsd_elements::GROUP {
                let mut group = ModelGroup::new(GroupKind::Sequence, Occurs::once());
                group.particles.push(self.parse_group_ref(c)?);
                model = Some(group);
            }
        }
        let attributes = self.parse_attribute_list(derivation)?;

        let content = if derivation.local_name() == xsd_elements::EXTENSION {
            ContentDecl::Extension { base, model }
        } else {
            ContentDecl::Restriction { base, model }
        };
        Ok((content, attributes))
    }

    fn parse_simple_content(&mut self, elem: &Element) -> Result<(ContentDecl, Vec<AttributeUseDecl>)> {
        let (derivation, base) = self.derivation(elem)?;
        let attributes = self.parse_attribute_list(derivation)?;

        let content = if derivation.local_name() == xsd_elements::EXTENSION {
            ContentDecl::SimpleExtension { base }
        } else {
            ContentDecl::SimpleRestriction {
                base,
                facets: self.parse_facets(derivation)?,
            }
        };
        Ok((content, attributes))
    }

    /// Parse xs:sequence, xs:choice or xs:all
    fn parse_model_group(&mut self, elem: &Element, kind: GroupKind) -> Result<ModelGroup> {
        let mut group = ModelGroup::new(kind, self.occurs(elem)?);

        for c in &elem.children {
            let particle = match c.local_name() {
                xsd_elements::ELEMENT => {
                    let occurs = self.occurs(c)?;
                    match c.get_attribute(xsd_attrs::REF) {
                        Some(r) => Particle::ElementRef {
                            name: self.reference(c, r)?.local_name().to_string(),
                            occurs,
                        },
                        None => Particle::Element {
                            decl: self.parse_element(c)?,
                            occurs,
                        },
                    }
                }
                xsd_elements::GROUP => self.parse_group_ref(c)?,
                xsd_elements::ANY => Particle::Any { occurs: self.occurs(c)? },
                local => match GroupKind::from_local_name(local) {
                    Some(nested) => Particle::Group(self.parse_model_group(c, nested)?),
                    None => {
                        if local != xsd_elements::ANNOTATION {
                            warn!(element = local, "skipping unsupported model group member");
                        }
                        continue;
                    }
                },
            };
            group.particles.push(particle);
        }

        Ok(group)
    }

    fn parse_group_ref(&self, elem: &Element) -> Result<Particle> {
        let r = elem
            .get_attribute(xsd_attrs::REF)
            .ok_or_else(|| self.error("local xs:group without 'ref'"))?;
        Ok(Particle::GroupRef {
            name: self.reference(elem, r)?.local_name().to_string(),
            occurs: self.occurs(elem)?,
        })
    }

    /// Collect xs:attribute and xs:attributeGroup children
    fn parse_attribute_list(&mut self, elem: &Element) -> Result<Vec<AttributeUseDecl>> {
        let mut attributes = Vec::new();
        for c in &elem.children {
            match c.local_name() {
                xsd_elements::ATTRIBUTE => {
                    let use_ = self.attribute_use(c)?;
                    match c.get_attribute(xsd_attrs::REF) {
                        Some(r) => attributes.push(AttributeUseDecl::Ref {
                            name: self.reference(c, r)?.local_name().to_string(),
                            use_,
                        }),
                        None => attributes.push(AttributeUseDecl::Local(self.parse_attribute_decl(c)?)),
                    }
                }
                xsd_elements::ATTRIBUTE_GROUP => {
                    let r = c
                        .get_attribute(xsd_attrs::REF)
                        .ok_or_else(|| self.error("local xs:attributeGroup without 'ref'"))?;
                    attributes.push(AttributeUseDecl::GroupRef(
                        self.reference(c, r)?.local_name().to_string(),
                    ));
                }
                xsd_elements::ANY_ATTRIBUTE => {
                    debug!(location = self.location.as_str(), "ignoring xs:anyAttribute");
                }
                _ => {}
            }
        }
        Ok(attributes)
    }

    fn attribute_use(&self, elem: &Element) -> Result<AttributeUse> {
        let value = elem.get_attribute(xsd_attrs::USE);
        AttributeUse::parse(value)
            .ok_or_else(|| self.error(format!("invalid attribute use {:?}", value)).into())
    }

    fn parse_attribute_decl(&mut self, elem: &Element) -> Result<AttributeDecl> {
        let name = self.required_name(elem)?;
        let type_ref = if let Some(type_name) = elem.get_attribute(xsd_attrs::TYPE) {
            Some(SimpleTypeRef::Named(self.reference(elem, type_name)?))
        } else if let Some(st) = child(elem, xsd_elements::SIMPLE_TYPE) {
            Some(SimpleTypeRef::Inline(Box::new(self.parse_simple_type(st, None)?)))
        } else {
            None
        };

        Ok(AttributeDecl {
            name,
            type_ref,
            use_: self.attribute_use(elem)?,
            default: elem.get_attribute(xsd_attrs::DEFAULT).map(str::to_string),
            fixed: elem.get_attribute(xsd_attrs::FIXED).map(str::to_string),
            documentation: documentation(elem),
        })
    }

    /// Parse an xs:simpleType, named or anonymous
    fn parse_simple_type(&mut self, elem: &Element, name: Option<String>) -> Result<SimpleTypeDecl> {
        let variety = if let Some(restriction) = child(elem, xsd_elements::RESTRICTION) {
            let base = match restriction.get_attribute(xsd_attrs::BASE) {
                Some(base) => SimpleTypeRef::Named(self.reference(restriction, base)?),
                None => {
                    let inline = child(restriction, xsd_elements::SIMPLE_TYPE)
                        .ok_or_else(|| self.error("xs:restriction without base"))?;
                    SimpleTypeRef::Inline(Box::new(self.parse_simple_type(inline, None)?))
                }
            };
            SimpleVariety::Restriction {
                base,
                facets: self.parse_facets(restriction)?,
            }
        } else if let Some(list) = child(elem, xsd_elements::LIST) {
            let item = match list.get_attribute(xsd_attrs::ITEM_TYPE) {
                Some(item) => SimpleTypeRef::Named(self.reference(list, item)?),
                None => {
                    let inline = child(list, xsd_elements::SIMPLE_TYPE)
                        .ok_or_else(|| self.error("xs:list without itemType"))?;
                    SimpleTypeRef::Inline(Box::new(self.parse_simple_type(inline, None)?))
                }
            };
            SimpleVariety::List { item }
        } else if let Some(union) = child(elem, xsd_elements::UNION) {
            let mut members = Vec::new();
            if let Some(member_types) = union.get_attribute(xsd_attrs::MEMBER_TYPES) {
                for member in member_types.split_whitespace() {
                    members.push(SimpleTypeRef::Named(self.reference(union, member)?));
                }
            }
            for inline in union.find_children(xsd_elements::SIMPLE_TYPE) {
                members.push(SimpleTypeRef::Inline(Box::new(self.parse_simple_type(inline, None)?)));
            }
            if members.is_empty() {
                return Err(self.error("xs:union without member types").into());
            }
            SimpleVariety::Union { members }
        } else {
            return Err(self
                .error("xs:simpleType without restriction, list or union")
                .with_component(name.unwrap_or_default())
                .into());
        };

        Ok(SimpleTypeDecl {
            name,
            variety,
            documentation: documentation(elem),
        })
    }

    fn parse_facets(&self, elem: &Element) -> Result<Facets> {
        let mut facets = Facets::default();
        let mut patterns = Vec::new();

        for c in &elem.children {
            let value = c.get_attribute(xsd_attrs::VALUE);
            match (c.local_name(), value) {
                (xsd_elements::ENUMERATION, Some(v)) => facets.enumeration.push(v.to_string()),
                (xsd_elements::PATTERN, Some(v)) => patterns.push(v.to_string()),
                (xsd_elements::LENGTH, Some(v)) => {
                    let n = self.length(v)?;
                    facets.min_length = Some(n);
                    facets.max_length = Some(n);
                }
                (xsd_elements::MIN_LENGTH, Some(v)) => facets.min_length = Some(self.length(v)?),
                (xsd_elements::MAX_LENGTH, Some(v)) => facets.max_length = Some(self.length(v)?),
                _ => {}
            }
        }

        match patterns.len() {
            0 => {}
            1 => facets.patterns.push(Pattern::new(patterns.remove(0)).map_err(|e| self.relocate(e))?),
            _ => facets.patterns.push(Pattern::any_of(&patterns).map_err(|e| self.relocate(e))?),
        }
        Ok(facets)
    }

    fn length(&self, value: &str) -> Result<usize> {
        value
            .trim()
            .parse::<usize>()
            .map_err(|_| self.error(format!("invalid length facet '{}'", value)).into())
    }

    fn relocate(&self, error: crate::error::Error) -> crate::error::Error {
        match error {
            crate::error::Error::Schema(e) => e.with_location(self.location.clone()).into(),
            other => other,
        }
    }
}

/// Whether an element is in the XSD namespace
fn is_xsd(elem: &Element) -> bool {
    let namespace = match elem.prefix() {
        Some(prefix) => elem.namespaces.get_namespace(prefix),
        None => elem.namespaces.get_default_namespace(),
    };
    namespace == Some(XSD_NAMESPACE)
}

fn child<'e>(elem: &'e Element, local_name: &str) -> Option<&'e Element> {
    elem.children.iter().find(|c| c.local_name() == local_name)
}

fn flag(elem: &Element, name: &str) -> bool {
    matches!(elem.get_attribute(name).map(str::trim), Some("true") | Some("1"))
}

/// Text of `xs:annotation/xs:documentation`, joined by blank lines
fn documentation(elem: &Element) -> Option<String> {
    let annotation = child(elem, xsd_elements::ANNOTATION)?;
    let texts: Vec<&str> = annotation
        .find_children(xsd_elements::DOCUMENTATION)
        .into_iter()
        .filter_map(|d| d.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns:auc="http://buildingsync.net/schemas/bedes-auc/2019"
        targetNamespace="http://buildingsync.net/schemas/bedes-auc/2019"
        elementFormDefault="qualified">"#;

    fn schema(body: &str) -> String {
        format!("{}{}</xs:schema>", HEADER, body)
    }

    #[test]
    fn test_parse_global_element_with_inline_type() {
        let xsd = schema(
            r#"<xs:element name="Facilities">
                 <xs:annotation><xs:documentation>All facilities.</xs:documentation></xs:annotation>
                 <xs:complexType>
                   <xs:sequence>
                     <xs:element name="Facility" maxOccurs="unbounded">
                       <xs:complexType>
                         <xs:attribute name="ID" type="xs:ID"/>
                       </xs:complexType>
                     </xs:element>
                   </xs:sequence>
                 </xs:complexType>
               </xs:element>"#,
        );
        let table = SchemaLoader::new().load_str(&xsd).unwrap();
        let facilities = &table.elements["Facilities"];
        assert_eq!(facilities.documentation.as_deref(), Some("All facilities."));

        let ElementType::Complex(ct) = &facilities.type_ref else {
            panic!("expected inline complex type");
        };
        let ContentDecl::Model(model) = &ct.content else {
            panic!("expected model group");
        };
        assert_eq!(model.kind, GroupKind::Sequence);
        match &model.particles[0] {
            Particle::Element { decl, occurs } => {
                assert_eq!(decl.name, "Facility");
                assert_eq!(occurs.max, None);
            }
            other => panic!("unexpected particle {:?}", other),
        }
    }

    #[test]
    fn test_parse_extension_and_enumeration() {
        let xsd = schema(
            r#"<xs:complexType name="BaseType">
                 <xs:attribute name="ID" type="xs:ID" use="required"/>
               </xs:complexType>
               <xs:complexType name="SiteType">
                 <xs:complexContent>
                   <xs:extension base="auc:BaseType">
                     <xs:choice>
                       <xs:element name="Address" type="xs:string"/>
                       <xs:element name="Coordinates" type="xs:string"/>
                     </xs:choice>
                     <xs:attribute name="Status">
                       <xs:simpleType>
                         <xs:restriction base="xs:string">
                           <xs:enumeration value="Active"/>
                           <xs:enumeration value="Inactive"/>
                         </xs:restriction>
                       </xs:simpleType>
                     </xs:attribute>
                   </xs:extension>
                 </xs:complexContent>
               </xs:complexType>"#,
        );
        let table = SchemaLoader::new().load_str(&xsd).unwrap();
        let site = &table.complex_types["SiteType"];
        match &site.content {
            ContentDecl::Extension { base, model } => {
                assert_eq!(base, &Reference::Component("BaseType".to_string()));
                assert_eq!(model.as_ref().unwrap().kind, GroupKind::Choice);
            }
            other => panic!("unexpected content {:?}", other),
        }
        assert_eq!(site.attributes.len(), 1);
    }

    #[test]
    fn test_parse_simple_types() {
        let xsd = schema(
            r#"<xs:simpleType name="Year">
                 <xs:restriction base="xs:string"><xs:pattern value="\d{4}"/></xs:restriction>
               </xs:simpleType>
               <xs:simpleType name="YearOrUnknown">
                 <xs:union memberTypes="auc:Year">
                   <xs:simpleType>
                     <xs:restriction base="xs:string"><xs:enumeration value="Unknown"/></xs:restriction>
                   </xs:simpleType>
                 </xs:union>
               </xs:simpleType>"#,
        );
        let table = SchemaLoader::new().load_str(&xsd).unwrap();
        match &table.simple_types["Year"].variety {
            SimpleVariety::Restriction { facets, .. } => {
                assert_eq!(facets.patterns[0].as_str(), r"\d{4}");
            }
            other => panic!("unexpected variety {:?}", other),
        }
        match &table.simple_types["YearOrUnknown"].variety {
            SimpleVariety::Union { members } => assert_eq!(members.len(), 2),
            other => panic!("unexpected variety {:?}", other),
        }
    }

    #[test]
    fn test_not_a_schema() {
        let result = SchemaLoader::new().load_str("<root/>");
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_invalid_occurs_is_schema_error() {
        let xsd = schema(
            r#"<xs:complexType name="T"><xs:sequence>
                 <xs:element name="A" minOccurs="2" maxOccurs="1"/>
               </xs:sequence></xs:complexType>"#,
        );
        assert!(matches!(SchemaLoader::new().load_str(&xsd), Err(Error::Schema(_))));
    }

    #[test]
    fn test_include_merges_and_tolerates_cycles() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("main.xsd"),
            schema(r#"<xs:include schemaLocation="types.xsd"/><xs:element name="Site" type="auc:SiteType"/>"#),
        )
        .unwrap();
        fs::write(
            dir.path().join("types.xsd"),
            schema(r#"<xs:include schemaLocation="main.xsd"/><xs:complexType name="SiteType"/>"#),
        )
        .unwrap();

        let table = SchemaLoader::new().load_file(dir.path().join("main.xsd")).unwrap();
        assert!(table.elements.contains_key("Site"));
        assert!(table.complex_types.contains_key("SiteType"));
        assert_eq!(table.documents.len(), 2);
    }

    #[test]
    fn test_duplicate_across_include_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("main.xsd"),
            schema(r#"<xs:include schemaLocation="types.xsd"/><xs:complexType name="SiteType"/>"#),
        )
        .unwrap();
        fs::write(dir.path().join("types.xsd"), schema(r#"<xs:complexType name="SiteType"/>"#)).unwrap();

        let result = SchemaLoader::new().load_file(dir.path().join("main.xsd"));
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_unresolvable_import_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("main.xsd"),
            schema(r#"<xs:import namespace="urn:gbxml" schemaLocation="missing.xsd"/>"#),
        )
        .unwrap();

        let result = SchemaLoader::new().load_file(dir.path().join("main.xsd"));
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_import_without_location() {
        let xml_import = schema(r#"<xs:import namespace="http://www.w3.org/XML/1998/namespace"/>"#);
        assert!(SchemaLoader::new().load_str(&xml_import).is_ok());

        let other = schema(r#"<xs:import namespace="urn:gbxml"/>"#);
        assert!(matches!(SchemaLoader::new().load_str(&other), Err(Error::Schema(_))));
    }

    #[test]
    fn test_include_depth_limit() {
        let dir = TempDir::new().unwrap();
        for i in 0..4 {
            fs::write(
                dir.path().join(format!("s{}.xsd", i)),
                schema(&format!(r#"<xs:include schemaLocation="s{}.xsd"/>"#, i + 1)),
            )
            .unwrap();
        }
        fs::write(dir.path().join("s4.xsd"), schema("")).unwrap();

        let limits = Limits {
            max_include_depth: 2,
            ..Limits::default()
        };
        let result = SchemaLoader::new()
            .with_limits(limits)
            .load_file(dir.path().join("s0.xsd"));
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }
}
