//! Runtime element instances
//!
//! A [`Node`] is one element of a document being built. Every mutator
//! validates first and only then changes the node, so a rejected call
//! leaves it exactly as it was.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::documents::{Element, WriteOptions};
use crate::error::{Result, StructureError, UnknownAttributeError, ValueDomainError};
use crate::runtime::Value;
use crate::synthesis::SynthesizedClass;

/// An instance of a synthesized class
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    class: Arc<SynthesizedClass>,
    attributes: IndexMap<String, String>,
    /// Children tagged with their slot index, kept sorted by slot
    children: Vec<(usize, Node)>,
    text: Option<String>,
}

impl Node {
    /// Create an empty instance
    pub fn new(class: Arc<SynthesizedClass>) -> Result<Self> {
        if class.is_abstract() {
            return Err(StructureError::new("cannot instantiate an abstract class")
                .with_child(class.name())
                .into());
        }
        Ok(Self {
            class,
            attributes: IndexMap::new(),
            children: Vec::new(),
            text: None,
        })
    }

    /// Create an instance with initial children and attributes
    pub fn construct<C, A, K, V>(class: Arc<SynthesizedClass>, children: C, attributes: A) -> Result<Self>
    where
        C: IntoIterator<Item = Node>,
        A: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut node = Node::new(class)?;
        for (name, value) in attributes {
            node.set_attribute(name.as_ref(), value.as_ref())?;
        }
        for child in children {
            node.append_child(child)?;
        }
        Ok(node)
    }

    /// The class of this node
    pub fn class(&self) -> &Arc<SynthesizedClass> {
        &self.class
    }

    /// Full class name
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.check_attribute(name, &value)?;
        trace!(class = self.class_name(), attribute = name, "set attribute");
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Builder form of [`Node::set_attribute`]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Result<Self> {
        self.set_attribute(name, value)?;
        Ok(self)
    }

    /// Current value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attributes in the order they were first set
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Remove an attribute, returning its value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Append a child into the first slot that accepts it
    ///
    /// The child lands after every child already in the same or an earlier
    /// slot, so output follows declaration order regardless of call order.
    /// When no free slot fits, children already present may move to another
    /// slot of the same name, e.g. to the other branch of a choice whose
    /// branches share a leading element.
    pub fn append_child(&mut self, child: Node) -> Result<()> {
        let slot = match self.select_slot(&child) {
            Ok(slot) => slot,
            Err(err) => {
                let Some(slots) = self.reassign(&child) else {
                    return Err(err);
                };
                trace!(class = self.class_name(), child = child.class_name(), "reassigned child slots");
                self.apply_slots(slots, child);
                return Ok(());
            }
        };
        let position = self
            .children
            .iter()
            .position(|(i, _)| *i > slot)
            .unwrap_or(self.children.len());
        trace!(
            class = self.class_name(),
            child = child.class_name(),
            slot = self.class.slots()[slot].name.as_str(),
            "append child"
        );
        self.children.insert(position, (slot, child));
        Ok(())
    }

    /// Builder form of [`Node::append_child`]
    pub fn add_child(mut self, child: Node) -> Result<Self> {
        self.append_child(child)?;
        Ok(self)
    }

    /// Set the text content
    pub fn set_text(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let target = self.class_name().to_string();
        let domain = self.class.def().text.as_ref().ok_or_else(|| {
            StructureError::new("class has element-only content and takes no text").with_parent(&target)
        })?;

        let lexical = value.lexical();
        if !domain.accepts_family(value.family()) {
            return Err(ValueDomainError::new("value type does not fit the text domain", lexical)
                .with_target(target)
                .with_reason(format!("expected {}", domain))
                .into());
        }
        if let Err(reason) = domain.check(&lexical)? {
            return Err(ValueDomainError::new("text outside its domain", lexical)
                .with_target(target)
                .with_reason(reason)
                .into());
        }
        self.text = Some(lexical);
        Ok(())
    }

    /// Builder form of [`Node::set_text`]
    pub fn with_text(mut self, value: impl Into<Value>) -> Result<Self> {
        self.set_text(value)?;
        Ok(self)
    }

    /// Text content, in lexical form
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// All children in output order
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().map(|(_, c)| c)
    }

    /// Number of children
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Children serialized under the given element name
    pub fn children_named(&self, name: &str) -> Vec<&Node> {
        self.children
            .iter()
            .filter(|(slot, child)| self.class.child_element_name(*slot, &child.class) == name)
            .map(|(_, c)| c)
            .collect()
    }

    /// Check required attributes and minimum occurrences, recursively
    pub fn check_complete(&self) -> Result<()> {
        let def = self.class.def();
        let missing: Vec<String> = def
            .attributes
            .iter()
            .filter(|a| a.required && !self.attributes.contains_key(&a.name))
            .map(|a| a.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(StructureError::new("missing required attributes")
                .with_parent(self.class_name())
                .with_expected(missing)
                .into());
        }

        for (index, slot) in def.children.iter().enumerate() {
            let count = self.slot_count(index);
            if count < slot.min_occurs() {
                return Err(StructureError::new(format!(
                    "expected at least {} '{}' children, found {}",
                    slot.min_occurs(),
                    slot.name,
                    count
                ))
                .with_parent(self.class_name())
                .with_expected(vec![slot.name.clone()])
                .into());
            }
        }

        // A branch that was taken must be complete
        let mut taken = Vec::new();
        for (slot_index, _) in &self.children {
            for choice in &def.children[*slot_index].choices {
                let branch = (choice.group, choice.alternative);
                if taken.contains(&branch) {
                    continue;
                }
                taken.push(branch);
                for index in def.branch_slots(choice.group, choice.alternative) {
                    let slot = &def.children[index];
                    let required = slot
                        .choices
                        .iter()
                        .find(|c| c.group == choice.group)
                        .map_or(0, |c| c.branch_min);
                    let count = self.slot_count(index);
                    if count < required {
                        return Err(StructureError::new(format!(
                            "choice branch taken by '{}' needs at least {} '{}' children, found {}",
                            def.children[*slot_index].name, required, slot.name, count
                        ))
                        .with_parent(self.class_name())
                        .with_expected(vec![slot.name.clone()])
                        .into());
                    }
                }
            }
        }

        // Required choices: some branch must be populated
        let mut checked = Vec::new();
        for slot in &def.children {
            for choice in &slot.choices {
                if choice.min == 0 || checked.contains(&choice.group) {
                    continue;
                }
                checked.push(choice.group);
                let branches: Vec<usize> = def
                    .children
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.choices.iter().any(|c| c.group == choice.group))
                    .map(|(i, _)| i)
                    .collect();
                if !self.children.iter().any(|(i, _)| branches.contains(i)) {
                    let expected = branches.iter().map(|i| def.children[*i].name.clone()).collect();
                    return Err(StructureError::new("a required choice has no branch populated")
                        .with_parent(self.class_name())
                        .with_expected(expected)
                        .into());
                }
            }
        }

        for child in self.children() {
            child.check_complete()?;
        }
        Ok(())
    }

    /// Build the XML element tree for this node
    pub fn to_xml(&self) -> Element {
        self.to_element(self.class.element_name())
    }

    /// Serialize this node and its descendants
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        self.to_xml().to_xml_string(options)
    }

    fn to_element(&self, name: &str) -> Element {
        let mut element = Element::new(name);
        for (key, value) in &self.attributes {
            element.set_attribute(key.as_str(), value.as_str());
        }
        if let Some(text) = &self.text {
            element.set_text(text.as_str());
        }
        for (slot, child) in &self.children {
            let child_name = self.class.child_element_name(*slot, &child.class);
            element.add_child(child.to_element(child_name));
        }
        element
    }

    fn slot_count(&self, index: usize) -> u32 {
        self.children.iter().filter(|(i, _)| *i == index).count() as u32
    }

    fn check_attribute(&self, name: &str, value: &str) -> Result<()> {
        let def = self.class.def();
        let attribute = def.attribute(name).ok_or_else(|| {
            UnknownAttributeError::new(self.class_name(), name).with_allowed(def.attribute_names())
        })?;
        let target = format!("{}@{}", self.class_name(), name);

        if let Some(fixed) = &attribute.fixed {
            if value != fixed {
                return Err(ValueDomainError::new("attribute has a fixed value", value)
                    .with_target(target)
                    .with_reason(format!("fixed to '{}'", fixed))
                    .into());
            }
        }
        if let Err(reason) = attribute.value_domain.check(value)? {
            return Err(ValueDomainError::new("attribute value outside its domain", value)
                .with_target(target)
                .with_reason(reason)
                .into());
        }
        Ok(())
    }

    /// Find slots for every present child plus `child`, moving children if needed
    ///
    /// Returns one slot per child in current order, then the new child's.
    fn reassign(&self, child: &Node) -> Option<Vec<usize>> {
        let mut options: Vec<Vec<usize>> = self
            .children
            .iter()
            .map(|(current, node)| {
                let mut slots = self.class.accepting_slots(&node.class);
                slots.retain(|s| s != current);
                slots.insert(0, *current);
                slots
            })
            .collect();
        options.push(self.class.accepting_slots(&child.class));
        if options.last().map_or(true, Vec::is_empty) {
            return None;
        }

        let mut counts = vec![0u32; self.class.slots().len()];
        let mut assigned = Vec::with_capacity(options.len());
        self.assign(&options, &mut counts, &mut assigned).then_some(assigned)
    }

    fn assign(&self, options: &[Vec<usize>], counts: &mut [u32], assigned: &mut Vec<usize>) -> bool {
        let Some(candidates) = options.get(assigned.len()) else {
            return true;
        };
        let slots = self.class.slots();
        for &index in candidates {
            let slot = &slots[index];
            if slot.occurs.is_over(counts[index]) || assigned.iter().any(|i| slot.excludes(&slots[*i])) {
                continue;
            }
            counts[index] += 1;
            assigned.push(index);
            if self.assign(options, counts, assigned) {
                return true;
            }
            assigned.pop();
            counts[index] -= 1;
        }
        false
    }

    fn apply_slots(&mut self, slots: Vec<usize>, child: Node) {
        let mut nodes: Vec<Node> = std::mem::take(&mut self.children)
            .into_iter()
            .map(|(_, node)| node)
            .collect();
        nodes.push(child);
        let mut children: Vec<(usize, Node)> = slots.into_iter().zip(nodes).collect();
        // stable, so each slot keeps append order
        children.sort_by_key(|(slot, _)| *slot);
        self.children = children;
    }

    fn select_slot(&self, child: &Node) -> Result<usize> {
        let def = self.class.def();
        let candidates = self.class.accepting_slots(&child.class);
        if candidates.is_empty() {
            return Err(StructureError::new("no child slot accepts this class")
                .with_parent(self.class_name())
                .with_child(child.class_name())
                .with_expected(def.slot_names())
                .into());
        }

        let mut rejection = None;
        for index in candidates {
            let slot = &def.children[index];
            if slot.occurs.is_over(self.slot_count(index)) {
                rejection = Some(
                    StructureError::new(format!(
                        "'{}' already holds its maximum of {} children",
                        slot.name,
                        slot.max_occurs().unwrap_or_default()
                    ))
                    .with_parent(self.class_name())
                    .with_child(child.class_name()),
                );
                continue;
            }
            if let Some((other, _)) = self.children.iter().find(|(i, _)| slot.excludes(&def.children[*i])) {
                rejection = Some(
                    StructureError::new(format!(
                        "choice already taken by '{}'",
                        def.children[*other].name
                    ))
                    .with_parent(self.class_name())
                    .with_child(child.class_name())
                    .with_expected(vec![def.children[*other].name.clone()]),
                );
                continue;
            }
            return Ok(index);
        }

        Err(rejection
            .unwrap_or_else(|| StructureError::new("no child slot accepts this class"))
            .into())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = WriteOptions::pretty().with_declaration(false);
        let xml = self.to_xml_string(&options).map_err(|_| fmt::Error)?;
        write!(f, "{}", xml.trim_end())
    }
}
