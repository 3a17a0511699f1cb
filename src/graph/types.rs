//! Resolved type definitions
//!
//! A [`TypeDef`] is the canonical, fully inherited shape of one class: its
//! ordered child slots, its attribute set and, for simple content, the domain
//! of its text. Child slots refer to other classes by name only, so types
//! that contain each other need no structural copying.

use crate::schema::{GroupKind, Occurs, ValueDomain};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a type definition comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefKind {
    /// A named xs:complexType
    ComplexType,
    /// A named xs:simpleType
    SimpleType,
    /// A global xs:element
    GlobalElement,
    /// An xs:element declared inside a type, element or group
    LocalElement,
}

impl DefKind {
    /// Whether the definition comes from an element declaration
    pub fn is_element(&self) -> bool {
        matches!(self, DefKind::GlobalElement | DefKind::LocalElement)
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DefKind::ComplexType => "complex type",
            DefKind::SimpleType => "simple type",
            DefKind::GlobalElement => "element",
            DefKind::LocalElement => "local element",
        };
        write!(f, "{}", s)
    }
}

/// How a definition derives from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Derivation {
    /// Base content plus own additions
    Extension,
    /// Own content replacing the base's
    Restriction,
}

/// Membership of a slot in a choice group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMembership {
    /// Choice group id, unique within the owning type
    pub group: u32,
    /// Index of the branch of the choice this slot sits in
    pub alternative: u32,
    /// Whether the choice itself may repeat, letting branches mix
    pub repeatable: bool,
    /// Minimum number of times some branch must be taken
    pub min: u32,
    /// Minimum occurrences of the slot once its branch is taken
    #[serde(default)]
    pub branch_min: u32,
}

impl ChoiceMembership {
    /// Scale the branch minimum by the minimum of a nested particle
    pub fn within(self, min: u32) -> Self {
        Self {
            branch_min: self.branch_min.saturating_mul(min),
            ..self
        }
    }
}

/// One position in a type's content model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSlot {
    /// XML element name of the slot
    pub name: String,
    /// Class accepted in this slot
    pub type_name: String,
    /// Named schema type of a local element, whose instances are also accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    /// Occurrence bounds, scaled by the enclosing groups
    pub occurs: Occurs,
    /// Compositor of the innermost enclosing group
    pub group_kind: GroupKind,
    /// Choice groups enclosing the slot, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceMembership>,
    /// Substitution group members accepted in place of the head
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

impl ChildSlot {
    /// Minimum occurrences
    pub fn min_occurs(&self) -> u32 {
        self.occurs.min
    }

    /// Maximum occurrences (None is unbounded)
    pub fn max_occurs(&self) -> Option<u32> {
        self.occurs.max
    }

    /// Whether two slots are in different branches of a shared, non-repeating choice
    pub fn excludes(&self, other: &ChildSlot) -> bool {
        self.choices.iter().any(|mine| {
            !mine.repeatable
                && other
                    .choices
                    .iter()
                    .any(|theirs| theirs.group == mine.group && theirs.alternative != mine.alternative)
        })
    }
}

/// An attribute of a type, own or inherited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute name
    pub name: String,
    /// Legal values
    pub value_domain: ValueDomain,
    /// Whether the attribute must be present
    pub required: bool,
    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Fixed value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
    /// Annotation text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl AttributeDef {
    /// An optional free-text attribute
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_domain: ValueDomain::free_text(),
            required: false,
            default: None,
            fixed: None,
            documentation: None,
        }
    }

    /// Set the value domain
    pub fn with_domain(mut self, value_domain: ValueDomain) -> Self {
        self.value_domain = value_domain;
        self
    }

    /// Mark the attribute required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The resolved definition of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Class name: type name, global element name or dotted local path
    pub name: String,
    /// XML element name used when the class is serialized on its own
    pub element_name: String,
    /// Declaration the definition comes from
    pub kind: DefKind,
    /// Base class, if the definition derives from another type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// How the definition derives from its base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<Derivation>,
    /// Ordered child slots including inherited ones
    #[serde(default)]
    pub children: Vec<ChildSlot>,
    /// Attributes including inherited ones, names unique
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
    /// Domain of the text content, for simple content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<ValueDomain>,
    /// Whether instances may not be created
    #[serde(default)]
    pub is_abstract: bool,
    /// Whether text may be mixed with children
    #[serde(default)]
    pub mixed: bool,
    /// Annotation text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl TypeDef {
    /// Create an empty definition
    pub fn new(name: impl Into<String>, kind: DefKind) -> Self {
        let name = name.into();
        Self {
            element_name: crate::names::last_segment(&name).to_string(),
            name,
            kind,
            base: None,
            derivation: None,
            children: Vec::new(),
            attributes: Vec::new(),
            text: None,
            is_abstract: false,
            mixed: false,
            documentation: None,
        }
    }

    /// Look up an attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Names of all attributes, in declaration order
    pub fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|a| a.name.clone()).collect()
    }

    /// Indices of the slots carrying the given element name
    pub fn slots_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.children
            .iter()
            .enumerate()
            .filter(move |(_, slot)| slot.name == name)
            .map(|(i, _)| i)
    }

    /// Distinct slot names, in declaration order
    pub fn slot_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for slot in &self.children {
            if !names.contains(&slot.name) {
                names.push(slot.name.clone());
            }
        }
        names
    }

    /// Whether the definition carries text rather than (only) children
    pub fn has_simple_content(&self) -> bool {
        self.text.is_some()
    }

    /// Indices of the slots in one branch of a choice group
    pub fn branch_slots(&self, group: u32, alternative: u32) -> impl Iterator<Item = usize> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter(move |(_, slot)| {
                slot.choices
                    .iter()
                    .any(|c| c.group == group && c.alternative == alternative)
            })
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(name: &str, choices: Vec<ChoiceMembership>) -> ChildSlot {
        ChildSlot {
            name: name.to_string(),
            type_name: name.to_string(),
            declared_type: None,
            occurs: Occurs::optional(),
            group_kind: GroupKind::Choice,
            choices,
            alternatives: Vec::new(),
        }
    }

    fn member(group: u32, alternative: u32, repeatable: bool) -> ChoiceMembership {
        ChoiceMembership {
            group,
            alternative,
            repeatable,
            min: 1,
            branch_min: 1,
        }
    }

    #[test]
    fn test_excludes_other_branch() {
        let a = slot("A", vec![member(0, 0, false)]);
        let b = slot("B", vec![member(0, 1, false)]);
        assert!(a.excludes(&b));
        assert!(b.excludes(&a));
        assert!(!a.excludes(&a));
    }

    #[test]
    fn test_repeatable_choice_mixes() {
        let a = slot("A", vec![member(0, 0, true)]);
        let b = slot("B", vec![member(0, 1, true)]);
        assert!(!a.excludes(&b));
    }

    #[test]
    fn test_different_groups_do_not_exclude() {
        let a = slot("A", vec![member(0, 0, false)]);
        let b = slot("B", vec![member(1, 1, false)]);
        assert!(!a.excludes(&b));
    }

    #[test]
    fn test_branch_min_scales() {
        let m = member(0, 0, false);
        assert_eq!(m.within(2).branch_min, 2);
        assert_eq!(m.within(0).branch_min, 0);
    }

    #[test]
    fn test_branch_slots() {
        let mut def = TypeDef::new("T", DefKind::ComplexType);
        def.children = vec![
            slot("A", vec![member(0, 0, false)]),
            slot("B", vec![member(0, 1, false)]),
            slot("C", vec![member(0, 1, false)]),
        ];
        assert!(!def.has_simple_content());
        assert_eq!(def.branch_slots(0, 1).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(def.branch_slots(0, 0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(def.branch_slots(1, 0).count(), 0);
    }

    #[test]
    fn test_element_name_is_last_segment() {
        let def = TypeDef::new("Facilities.Facility", DefKind::LocalElement);
        assert_eq!(def.element_name, "Facility");
    }

    #[test]
    fn test_slot_names_are_distinct() {
        let mut def = TypeDef::new("T", DefKind::ComplexType);
        def.children = vec![slot("A", vec![]), slot("B", vec![]), slot("A", vec![])];
        assert_eq!(def.slot_names(), vec!["A", "B"]);
        assert_eq!(def.slots_named("A").collect::<Vec<_>>(), vec![0, 2]);
    }
}
