//! Type graph builder
//!
//! Turns a [`DeclarationTable`] into one [`TypeDef`] per class in two passes:
//! every class name is registered first so forward references resolve, then
//! each definition is resolved on demand, bases before derivatives. Only the
//! derivation chain is followed eagerly; child slots name their classes and
//! are never expanded, so mutually containing types are fine.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::types::{AttributeDef, ChildSlot, ChoiceMembership, DefKind, Derivation, TypeDef};
use crate::error::{Error, Result, SchemaError};
use crate::names::join_path;
use crate::namespaces::Reference;
use crate::schema::{
    AttributeDecl, AttributeUse, AttributeUseDecl, BuiltinType, ComplexTypeDecl, ContentDecl,
    DeclarationTable, ElementDecl, ElementType, Facets, GroupKind, ModelGroup, Occurs, Particle,
    SimpleTypeDecl, SimpleTypeRef, SimpleVariety, ValueDomain,
};

/// The declaration a class name was registered from
#[derive(Debug, Clone, Copy)]
enum Source<'t> {
    ComplexType(&'t ComplexTypeDecl),
    SimpleType(&'t SimpleTypeDecl),
    Element { decl: &'t ElementDecl, global: bool },
}

impl Source<'_> {
    fn describe(&self) -> &'static str {
        match self {
            Source::ComplexType(_) => "complex type",
            Source::SimpleType(_) => "simple type",
            Source::Element { global: true, .. } => "element",
            Source::Element { global: false, .. } => "local element",
        }
    }
}

/// Components currently being resolved, for circular reference detection
#[derive(Debug, Default)]
struct BuildStack {
    stack: Vec<String>,
}

impl BuildStack {
    fn push(&mut self, what: &str, name: &str) -> Result<()> {
        if let Some(pos) = self.stack.iter().position(|n| n == name) {
            let mut chain = self.stack[pos..].to_vec();
            chain.push(name.to_string());
            return Err(SchemaError::new(format!("cyclic {}: {}", what, chain.join(" -> ")))
                .with_component(name)
                .into());
        }
        self.stack.push(name.to_string());
        Ok(())
    }

    fn pop(&mut self) {
        self.stack.pop();
    }
}

/// An attribute entry after references and groups are expanded
#[derive(Debug, Clone)]
enum AttributeEntry {
    Def(AttributeDef),
    Prohibited(String),
}

fn unresolved(kind: &str, name: &str, referrer: &str) -> Error {
    SchemaError::new(format!("unresolved {} reference '{}'", kind, name))
        .with_component(referrer)
        .into()
}

/// The resolved type graph of a schema bundle
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    defs: IndexMap<String, TypeDef>,
    simple_domains: IndexMap<String, ValueDomain>,
    substitutions: IndexMap<String, Vec<String>>,
    target_namespace: Option<String>,
}

impl TypeGraph {
    /// Look up a definition by class name
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    /// Whether a class name is defined
    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// All definitions, in registration order
    pub fn defs(&self) -> impl Iterator<Item = &TypeDef> {
        self.defs.values()
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Global element definitions
    pub fn global_elements(&self) -> impl Iterator<Item = &TypeDef> {
        self.defs.values().filter(|d| d.kind == DefKind::GlobalElement)
    }

    /// The value domain of a named simple type
    pub fn simple_domain(&self, name: &str) -> Option<&ValueDomain> {
        self.simple_domains.get(name)
    }

    /// Transitive substitution group members of a head element
    pub fn substitution_members(&self, head: &str) -> &[String] {
        self.substitutions.get(head).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Target namespace of the root schema document
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }
}

/// Build the type graph of a declaration table
pub fn build_graph(table: &DeclarationTable) -> Result<TypeGraph> {
    GraphBuilder::new(table).build()
}

/// Resolves declarations into type definitions
pub struct GraphBuilder<'t> {
    table: &'t DeclarationTable,
    sources: IndexMap<String, Source<'t>>,
    resolved: HashMap<String, TypeDef>,
    domains: HashMap<String, ValueDomain>,
    substitutions: IndexMap<String, Vec<String>>,
    types: BuildStack,
    simple_types: BuildStack,
    groups: BuildStack,
    attribute_groups: BuildStack,
    next_choice: u32,
}

impl<'t> GraphBuilder<'t> {
    /// Create a builder over a declaration table
    pub fn new(table: &'t DeclarationTable) -> Self {
        Self {
            table,
            sources: IndexMap::new(),
            resolved: HashMap::new(),
            domains: HashMap::new(),
            substitutions: IndexMap::new(),
            types: BuildStack::default(),
            simple_types: BuildStack::default(),
            groups: BuildStack::default(),
            attribute_groups: BuildStack::default(),
            next_choice: 0,
        }
    }

    /// Resolve every registered class
    pub fn build(mut self) -> Result<TypeGraph> {
        self.register()?;
        self.collect_substitutions()?;

        let names: Vec<String> = self.sources.keys().cloned().collect();
        let mut defs = IndexMap::with_capacity(names.len());
        for name in names {
            let def = self.resolve(&name)?;
            defs.insert(name, def);
        }

        let table = self.table;
        let mut simple_domains = IndexMap::new();
        for name in table.simple_types.keys() {
            simple_domains.insert(name.clone(), self.named_domain(name, name)?);
        }

        info!(
            types = defs.len(),
            simple_types = simple_domains.len(),
            substitution_groups = self.substitutions.len(),
            "built type graph"
        );

        Ok(TypeGraph {
            defs,
            simple_domains,
            substitutions: self.substitutions,
            target_namespace: table.target_namespace.clone(),
        })
    }

    // Pass 1: names

    fn register(&mut self) -> Result<()> {
        let table = self.table;
        for (name, decl) in &table.simple_types {
            self.register_name(name.clone(), Source::SimpleType(decl))?;
        }
        for (name, decl) in &table.complex_types {
            self.register_name(name.clone(), Source::ComplexType(decl))?;
            self.register_complex(decl, name)?;
        }
        for (name, decl) in &table.elements {
            self.register_name(name.clone(), Source::Element { decl, global: true })?;
            self.register_element_type(decl, name)?;
        }
        for (name, group) in &table.groups {
            self.register_model(&group.model, name)?;
        }
        debug!(classes = self.sources.len(), "registered class names");
        Ok(())
    }

    fn register_name(&mut self, name: String, source: Source<'t>) -> Result<()> {
        if let Some(existing) = self.sources.get(&name) {
            // The same local element may appear more than once in one content model
            if let (Source::Element { global: false, .. }, Source::Element { global: false, .. }) =
                (existing, &source)
            {
                return Ok(());
            }
            return Err(SchemaError::new(format!(
                "class name declared twice, as {} and as {}",
                existing.describe(),
                source.describe()
            ))
            .with_component(name)
            .into());
        }
        self.sources.insert(name, source);
        Ok(())
    }

    fn register_element_type(&mut self, decl: &'t ElementDecl, path: &str) -> Result<()> {
        if let ElementType::Complex(ct) = &decl.type_ref {
            self.register_complex(ct, path)?;
        }
        Ok(())
    }

    fn register_complex(&mut self, decl: &'t ComplexTypeDecl, path: &str) -> Result<()> {
        match &decl.content {
            ContentDecl::Model(group)
            | ContentDecl::Extension { model: Some(group), .. }
            | ContentDecl::Restriction { model: Some(group), .. } => self.register_model(group, path),
            _ => Ok(()),
        }
    }

    fn register_model(&mut self, group: &'t ModelGroup, path: &str) -> Result<()> {
        for particle in &group.particles {
            match particle {
                Particle::Element { decl, .. } => {
                    let local = join_path(path, &decl.name);
                    self.register_name(local.clone(), Source::Element { decl, global: false })?;
                    self.register_element_type(decl, &local)?;
                }
                Particle::Group(inner) => self.register_model(inner, path)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn collect_substitutions(&mut self) -> Result<()> {
        let table = self.table;
        let mut direct: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for (name, decl) in &table.elements {
            if let Some(head) = &decl.substitution_group {
                if !table.elements.contains_key(head) {
                    return Err(unresolved("substitution group head", head, name));
                }
                direct.entry(head.as_str()).or_default().push(name.as_str());
            }
        }

        for head in direct.keys() {
            let mut members = Vec::new();
            let mut seen: HashSet<&str> = HashSet::new();
            let mut queue: VecDeque<&str> = direct[head].iter().copied().collect();
            while let Some(member) = queue.pop_front() {
                if member == *head {
                    return Err(SchemaError::new("cyclic substitution group")
                        .with_component(*head)
                        .into());
                }
                if !seen.insert(member) {
                    continue;
                }
                members.push(member.to_string());
                if let Some(next) = direct.get(member) {
                    queue.extend(next.iter().copied());
                }
            }
            debug!(head = *head, members = members.len(), "resolved substitution group");
            self.substitutions.insert(head.to_string(), members);
        }
        Ok(())
    }

    // Pass 2: structure

    fn resolve(&mut self, name: &str) -> Result<TypeDef> {
        if let Some(def) = self.resolved.get(name) {
            return Ok(def.clone());
        }
        let source = *self
            .sources
            .get(name)
            .ok_or_else(|| unresolved("type", name, name))?;

        self.types.push("base chain", name)?;
        let result = match source {
            Source::ComplexType(decl) => self.resolve_complex(name, DefKind::ComplexType, decl),
            Source::SimpleType(decl) => self.resolve_simple_type(name, decl),
            Source::Element { decl, global } => self.resolve_element(name, decl, global),
        };
        self.types.pop();

        let def = result?;
        debug!(
            class = name,
            base = def.base.as_deref().unwrap_or(""),
            slots = def.children.len(),
            attributes = def.attributes.len(),
            "resolved type"
        );
        self.resolved.insert(name.to_string(), def.clone());
        Ok(def)
    }

    /// Resolve the base of a derivation, which must be a named type
    fn resolve_base(&mut self, base: &str, derived: &str) -> Result<TypeDef> {
        if !self.table.has_type(base) {
            return Err(unresolved("base type", base, derived));
        }
        self.resolve(base)
    }

    fn resolve_simple_type(&mut self, name: &str, decl: &'t SimpleTypeDecl) -> Result<TypeDef> {
        let mut def = TypeDef::new(name, DefKind::SimpleType);
        def.text = Some(self.named_domain(name, name)?);
        def.documentation = decl.documentation.clone();

        if let SimpleVariety::Restriction {
            base: SimpleTypeRef::Named(Reference::Component(base)),
            ..
        } = &decl.variety
        {
            if self.table.simple_types.contains_key(base) {
                def.base = Some(base.clone());
                def.derivation = Some(Derivation::Restriction);
            }
        }
        Ok(def)
    }

    fn resolve_element(&mut self, name: &str, decl: &'t ElementDecl, global: bool) -> Result<TypeDef> {
        let kind = if global {
            DefKind::GlobalElement
        } else {
            DefKind::LocalElement
        };

        let mut def = match &decl.type_ref {
            ElementType::Named(Reference::Builtin(builtin)) => {
                let mut def = TypeDef::new(name, kind);
                def.text = Some(ValueDomain::builtin(self.builtin(builtin, name)?));
                def
            }
            ElementType::Named(Reference::Component(type_name)) => {
                if !self.table.has_type(type_name) {
                    return Err(unresolved("type", type_name, name));
                }
                let type_def = self.resolve(type_name)?;
                TypeDef {
                    name: name.to_string(),
                    kind,
                    base: Some(type_name.clone()),
                    derivation: Some(Derivation::Extension),
                    ..type_def
                }
            }
            ElementType::Complex(ct) => self.resolve_complex(name, kind, ct)?,
            ElementType::Simple(st) => {
                let mut def = TypeDef::new(name, kind);
                def.text = Some(self.simple_decl_domain(st, name)?);
                def
            }
            ElementType::Untyped => {
                let mut def = TypeDef::new(name, kind);
                def.text = Some(ValueDomain::builtin(BuiltinType::AnySimpleType));
                def
            }
        };

        def.element_name = decl.name.clone();
        def.is_abstract = decl.is_abstract;
        if decl.documentation.is_some() {
            def.documentation = decl.documentation.clone();
        }
        Ok(def)
    }

    fn resolve_complex(&mut self, name: &str, kind: DefKind, decl: &'t ComplexTypeDecl) -> Result<TypeDef> {
        let mut def = TypeDef::new(name, kind);
        def.is_abstract = decl.is_abstract;
        def.mixed = decl.mixed;
        def.documentation = decl.documentation.clone();

        let own = self.attribute_entries(&decl.attributes, name)?;

        match &decl.content {
            ContentDecl::Empty => add_attributes(&mut def, own)?,
            ContentDecl::Model(group) => {
                def.children = self.flatten_root(group, name)?;
                add_attributes(&mut def, own)?;
            }
            ContentDecl::Extension { base, model } => {
                if let Reference::Component(base) = base {
                    let base_def = self.resolve_base(base, name)?;
                    def.base = Some(base.clone());
                    def.derivation = Some(Derivation::Extension);
                    def.children = base_def.children;
                    def.attributes = base_def.attributes;
                    def.text = base_def.text;
                    def.mixed |= base_def.mixed;
                }
                if let Some(group) = model {
                    let slots = self.flatten_root(group, name)?;
                    def.children.extend(slots);
                }
                add_attributes(&mut def, own)?;
            }
            ContentDecl::Restriction { base, model } => {
                let inherited = match base {
                    Reference::Component(base) => {
                        let base_def = self.resolve_base(base, name)?;
                        def.base = Some(base.clone());
                        def.derivation = Some(Derivation::Restriction);
                        base_def.attributes
                    }
                    Reference::Builtin(_) => Vec::new(),
                };
                if let Some(group) = model {
                    def.children = self.flatten_root(group, name)?;
                }
                def.attributes = restrict_attributes(inherited, own, name)?;
            }
            ContentDecl::SimpleExtension { base } => {
                match base {
                    Reference::Builtin(builtin) => {
                        def.text = Some(ValueDomain::builtin(self.builtin(builtin, name)?));
                    }
                    Reference::Component(base) => {
                        let base_def = self.resolve_base(base, name)?;
                        def.text = Some(simple_content(&base_def, name)?);
                        def.attributes = base_def.attributes;
                        def.base = Some(base.clone());
                        def.derivation = Some(Derivation::Extension);
                    }
                }
                add_attributes(&mut def, own)?;
            }
            ContentDecl::SimpleRestriction { base, facets } => {
                let (text, inherited) = match base {
                    Reference::Builtin(builtin) => {
                        (ValueDomain::builtin(self.builtin(builtin, name)?), Vec::new())
                    }
                    Reference::Component(base) => {
                        let base_def = self.resolve_base(base, name)?;
                        def.base = Some(base.clone());
                        def.derivation = Some(Derivation::Restriction);
                        (simple_content(&base_def, name)?, base_def.attributes)
                    }
                };
                def.text = Some(text.restricted(facets.clone()));
                def.attributes = restrict_attributes(inherited, own, name)?;
            }
        }

        Ok(def)
    }

    // Content models

    fn flatten_root(&mut self, group: &'t ModelGroup, path: &str) -> Result<Vec<ChildSlot>> {
        let mut slots = Vec::new();
        self.flatten(group, path, Occurs::once(), &[], &mut slots)?;
        Ok(slots)
    }

    /// Flatten a model group into slots, scaling occurrences by the enclosing groups
    fn flatten(
        &mut self,
        group: &'t ModelGroup,
        path: &str,
        outer: Occurs,
        choices: &[ChoiceMembership],
        slots: &mut Vec<ChildSlot>,
    ) -> Result<()> {
        let effective = group.occurs.scaled_by(&outer);

        // Members of a choice are individually optional; the choice's own
        // minimum is carried on the membership instead.
        let (member_outer, choice) = match group.kind {
            GroupKind::Choice => {
                let id = self.next_choice;
                self.next_choice += 1;
                (Occurs::new(0, effective.max), Some(id))
            }
            GroupKind::Sequence | GroupKind::All => (effective, None),
        };

        // Enclosing branches require this group's minimum, except through a
        // nested choice, whose members the outer branch never requires.
        let branch_factor = match group.kind {
            GroupKind::Choice => 0,
            GroupKind::Sequence | GroupKind::All => group.occurs.min,
        };
        let inherited: Vec<ChoiceMembership> = choices.iter().map(|c| c.within(branch_factor)).collect();

        for (index, particle) in group.particles.iter().enumerate() {
            let mut scope = inherited.clone();
            if let Some(id) = choice {
                scope.push(ChoiceMembership {
                    group: id,
                    alternative: index as u32,
                    repeatable: effective.is_multiple(),
                    min: effective.min,
                    branch_min: 1,
                });
            }

            match particle {
                Particle::Element { decl, occurs } => {
                    let declared_type = match &decl.type_ref {
                        ElementType::Named(Reference::Component(t)) => Some(t.clone()),
                        _ => None,
                    };
                    slots.push(ChildSlot {
                        name: decl.name.clone(),
                        type_name: join_path(path, &decl.name),
                        declared_type,
                        occurs: occurs.scaled_by(&member_outer),
                        group_kind: group.kind,
                        choices: scope.iter().map(|c| c.within(occurs.min)).collect(),
                        alternatives: Vec::new(),
                    });
                }
                Particle::ElementRef { name, occurs } => {
                    if !self.table.elements.contains_key(name) {
                        return Err(unresolved("element", name, path));
                    }
                    slots.push(ChildSlot {
                        name: name.clone(),
                        type_name: name.clone(),
                        declared_type: None,
                        occurs: occurs.scaled_by(&member_outer),
                        group_kind: group.kind,
                        choices: scope.iter().map(|c| c.within(occurs.min)).collect(),
                        alternatives: self.substitutions.get(name).cloned().unwrap_or_default(),
                    });
                }
                Particle::Group(inner) => self.flatten(inner, path, member_outer, &scope, slots)?,
                Particle::GroupRef { name, occurs } => {
                    let table = self.table;
                    let decl = table
                        .groups
                        .get(name)
                        .ok_or_else(|| unresolved("model group", name, path))?;
                    self.groups.push("model group reference", name)?;
                    let scope: Vec<ChoiceMembership> = scope.iter().map(|c| c.within(occurs.min)).collect();
                    let result = self.flatten(
                        &decl.model,
                        name,
                        occurs.scaled_by(&member_outer),
                        &scope,
                        slots,
                    );
                    self.groups.pop();
                    result?;
                }
                Particle::Any { .. } => {
                    warn!(path, "xs:any wildcard has no class and is skipped");
                }
            }
        }
        Ok(())
    }

    // Attributes

    fn attribute_entries(&mut self, uses: &'t [AttributeUseDecl], owner: &str) -> Result<Vec<AttributeEntry>> {
        let table = self.table;
        let mut entries = Vec::new();

        for attribute in uses {
            match attribute {
                AttributeUseDecl::Local(decl) => entries.push(self.attribute_entry(decl, decl.use_, owner)?),
                AttributeUseDecl::Ref { name, use_ } => {
                    let decl = table
                        .attributes
                        .get(name)
                        .ok_or_else(|| unresolved("attribute", name, owner))?;
                    entries.push(self.attribute_entry(decl, *use_, owner)?);
                }
                AttributeUseDecl::GroupRef(name) => {
                    let group = table
                        .attribute_groups
                        .get(name)
                        .ok_or_else(|| unresolved("attribute group", name, owner))?;
                    self.attribute_groups.push("attribute group reference", name)?;
                    let nested = self.attribute_entries(&group.attributes, owner);
                    self.attribute_groups.pop();
                    entries.extend(nested?);
                }
            }
        }
        Ok(entries)
    }

    fn attribute_entry(&mut self, decl: &'t AttributeDecl, use_: AttributeUse, owner: &str) -> Result<AttributeEntry> {
        if use_ == AttributeUse::Prohibited {
            return Ok(AttributeEntry::Prohibited(decl.name.clone()));
        }

        let context = format!("{}@{}", owner, decl.name);
        let value_domain = match &decl.type_ref {
            Some(type_ref) => self.simple_ref_domain(type_ref, &context)?,
            None => ValueDomain::builtin(BuiltinType::AnySimpleType),
        };

        for value in decl.default.iter().chain(decl.fixed.iter()) {
            if let Err(reason) = value_domain.check(value)? {
                return Err(SchemaError::new(format!(
                    "default or fixed value '{}' is outside the attribute's domain: {}",
                    value, reason
                ))
                .with_component(context)
                .into());
            }
        }

        Ok(AttributeEntry::Def(AttributeDef {
            name: decl.name.clone(),
            value_domain,
            required: use_ == AttributeUse::Required,
            default: decl.default.clone(),
            fixed: decl.fixed.clone(),
            documentation: decl.documentation.clone(),
        }))
    }

    // Simple types

    fn builtin(&self, name: &str, referrer: &str) -> Result<BuiltinType> {
        BuiltinType::from_name(name).ok_or_else(|| {
            SchemaError::new(format!("unknown built-in type 'xs:{}'", name))
                .with_component(referrer)
                .into()
        })
    }

    fn simple_ref_domain(&mut self, type_ref: &'t SimpleTypeRef, referrer: &str) -> Result<ValueDomain> {
        match type_ref {
            SimpleTypeRef::Named(Reference::Builtin(name)) => {
                Ok(ValueDomain::builtin(self.builtin(name, referrer)?))
            }
            SimpleTypeRef::Named(Reference::Component(name)) => self.named_domain(name, referrer),
            SimpleTypeRef::Inline(decl) => self.simple_decl_domain(decl, referrer),
        }
    }

    fn named_domain(&mut self, name: &str, referrer: &str) -> Result<ValueDomain> {
        if let Some(domain) = self.domains.get(name) {
            return Ok(domain.clone());
        }

        let table = self.table;
        let domain = if let Some(decl) = table.simple_types.get(name) {
            self.simple_types.push("simple type derivation", name)?;
            let result = self.simple_decl_domain(decl, name);
            self.simple_types.pop();
            result?
        } else if table.complex_types.contains_key(name) {
            let def = self.resolve(name)?;
            simple_content(&def, referrer)?
        } else {
            return Err(unresolved("type", name, referrer));
        };

        self.domains.insert(name.to_string(), domain.clone());
        Ok(domain)
    }

    fn simple_decl_domain(&mut self, decl: &'t SimpleTypeDecl, referrer: &str) -> Result<ValueDomain> {
        match &decl.variety {
            SimpleVariety::Restriction { base, facets } => {
                Ok(self.simple_ref_domain(base, referrer)?.restricted(facets.clone()))
            }
            SimpleVariety::List { item } => Ok(ValueDomain::List {
                item: Box::new(self.simple_ref_domain(item, referrer)?),
                facets: Facets::default(),
            }),
            SimpleVariety::Union { members } => {
                let mut domains = Vec::with_capacity(members.len());
                for member in members {
                    domains.push(self.simple_ref_domain(member, referrer)?);
                }
                Ok(ValueDomain::Union { members: domains })
            }
        }
    }
}

/// The text domain of a base used for simple content
fn simple_content(base: &TypeDef, referrer: &str) -> Result<ValueDomain> {
    base.text.clone().ok_or_else(|| {
        SchemaError::new(format!("base type '{}' has no simple content", base.name))
            .with_component(referrer)
            .into()
    })
}

/// Append attributes, rejecting names already present
fn add_attributes(def: &mut TypeDef, entries: Vec<AttributeEntry>) -> Result<()> {
    for entry in entries {
        match entry {
            AttributeEntry::Def(attribute) => {
                if def.attribute(&attribute.name).is_some() {
                    return Err(SchemaError::new(format!(
                        "duplicate attribute '{}' (declared twice or already inherited)",
                        attribute.name
                    ))
                    .with_component(def.name.clone())
                    .into());
                }
                def.attributes.push(attribute);
            }
            AttributeEntry::Prohibited(name) => {
                debug!(class = def.name.as_str(), attribute = name.as_str(), "prohibited attribute outside a restriction");
            }
        }
    }
    Ok(())
}

/// Narrow inherited attributes to those the restriction redeclares
///
/// The result is the intersection of the base and declared attributes, with
/// the declared (narrowed) domains. A restriction declaring no attributes
/// therefore has none. Prohibited attributes are always removed.
fn restrict_attributes(inherited: Vec<AttributeDef>, own: Vec<AttributeEntry>, owner: &str) -> Result<Vec<AttributeDef>> {
    let mut prohibited = HashSet::new();
    let mut declared: IndexMap<String, AttributeDef> = IndexMap::new();
    for entry in own {
        match entry {
            AttributeEntry::Def(attribute) => {
                if declared.contains_key(&attribute.name) {
                    return Err(SchemaError::new(format!("duplicate attribute '{}'", attribute.name))
                        .with_component(owner)
                        .into());
                }
                declared.insert(attribute.name.clone(), attribute);
            }
            AttributeEntry::Prohibited(name) => {
                prohibited.insert(name);
            }
        }
    }

    let mut result = Vec::new();
    for attribute in inherited {
        if prohibited.contains(&attribute.name) {
            continue;
        }
        if let Some(narrowed) = declared.shift_remove(&attribute.name) {
            result.push(narrowed);
        }
    }
    for name in declared.keys() {
        warn!(class = owner, attribute = name.as_str(), "restriction declares an attribute its base lacks; dropped");
    }
    Ok(result)
}
