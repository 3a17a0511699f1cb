//! Simple type facets and value domains
//!
//! A [`ValueDomain`] is the resolved set of legal lexical values of a simple
//! type: a built-in base narrowed by enumeration, pattern and length facets,
//! a whitespace-separated list of another domain, or a union of domains.

use super::builtins::{BuiltinType, ValueFamily};
use crate::error::{Result, SchemaError};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A pattern facet
///
/// XSD patterns are implicitly anchored; the compiled regex is built lazily
/// so deserialized metadata pays for it only on first use.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern {
    source: String,
    #[serde(skip)]
    compiled: OnceCell<Regex>,
}

impl Pattern {
    /// Create a pattern, compiling it once to reject malformed expressions
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let pattern = Self {
            source: source.into(),
            compiled: OnceCell::new(),
        };
        pattern.regex()?;
        Ok(pattern)
    }

    /// Create a pattern matching any of the given expressions
    ///
    /// Several pattern facets in one restriction step are alternatives.
    pub fn any_of(sources: &[String]) -> Result<Self> {
        let joined = sources
            .iter()
            .map(|s| format!("(?:{})", s))
            .collect::<Vec<_>>()
            .join("|");
        Self::new(joined)
    }

    /// The pattern as written in the schema
    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn regex(&self) -> Result<&Regex> {
        self.compiled.get_or_try_init(|| {
            Regex::new(&format!("^(?:{})$", translate_pattern(&self.source))).map_err(|e| {
                SchemaError::new(format!("invalid pattern facet: {}", e))
                    .with_component(self.source.clone())
                    .into()
            })
        })
    }

    /// Test a value against the pattern
    pub fn is_match(&self, value: &str) -> Result<bool> {
        Ok(self.regex()?.is_match(value))
    }
}

/// Translate the XSD-only escapes (`\i`, `\c` and their negations) to classes
fn translate_pattern(source: &str) -> String {
    const INITIAL: &str = r"A-Za-z_:\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\u{37F}-\u{1FFF}";
    const NAME: &str = r"\-.0-9\u{B7}\u{300}-\u{36F}\u{203F}-\u{2040}";

    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('i') => out.push_str(&format!("[{}]", INITIAL)),
            Some('I') => out.push_str(&format!("[^{}]", INITIAL)),
            Some('c') => out.push_str(&format!("[{}{}]", INITIAL, NAME)),
            Some('C') => out.push_str(&format!("[^{}{}]", INITIAL, NAME)),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            compiled: self.compiled.clone(),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Constraining facets accumulated along a restriction chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    /// Allowed literals (empty means unrestricted)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<String>,
    /// One pattern per restriction step; a value must match all of them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<Pattern>,
    /// Minimum length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl Facets {
    /// Whether no facet is set
    pub fn is_empty(&self) -> bool {
        self.enumeration.is_empty()
            && self.patterns.is_empty()
            && self.min_length.is_none()
            && self.max_length.is_none()
    }

    /// Narrow these facets by those of a derived restriction step
    ///
    /// A derived enumeration replaces the inherited one, patterns accumulate
    /// and length bounds keep the tighter value.
    pub fn narrow(&mut self, derived: Facets) {
        if !derived.enumeration.is_empty() {
            self.enumeration = derived.enumeration;
        }
        self.patterns.extend(derived.patterns);
        self.min_length = match (self.min_length, derived.min_length) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.max_length = match (self.max_length, derived.max_length) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    fn check(&self, value: &str) -> Result<std::result::Result<(), String>> {
        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|e| e == value) {
            return Ok(Err(format!(
                "expected one of: {}",
                self.enumeration.join(", ")
            )));
        }
        for pattern in &self.patterns {
            if !pattern.is_match(value)? {
                return Ok(Err(format!("does not match pattern '{}'", pattern.as_str())));
            }
        }
        let length = value.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                return Ok(Err(format!("shorter than the minimum length {}", min)));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Ok(Err(format!("longer than the maximum length {}", max)));
            }
        }
        Ok(Ok(()))
    }
}

/// The legal values of a simple type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variety", rename_all = "snake_case")]
pub enum ValueDomain {
    /// A built-in narrowed by facets
    Atomic {
        /// Built-in base type
        base: BuiltinType,
        /// Accumulated facets
        #[serde(default, skip_serializing_if = "Facets::is_empty")]
        facets: Facets,
    },
    /// Whitespace-separated items of another domain
    List {
        /// Domain of each item
        item: Box<ValueDomain>,
        /// Facets on the list itself (length counts items)
        #[serde(default, skip_serializing_if = "Facets::is_empty")]
        facets: Facets,
    },
    /// Any value accepted by one of the members
    Union {
        /// Member domains, in declaration order
        members: Vec<ValueDomain>,
    },
}

impl ValueDomain {
    /// Unconstrained domain of a built-in
    pub fn builtin(base: BuiltinType) -> Self {
        ValueDomain::Atomic {
            base,
            facets: Facets::default(),
        }
    }

    /// Free text (`xs:string`)
    pub fn free_text() -> Self {
        Self::builtin(BuiltinType::String)
    }

    /// An enumerated string domain
    pub fn enumerated<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueDomain::Atomic {
            base: BuiltinType::String,
            facets: Facets {
                enumeration: literals.into_iter().map(Into::into).collect(),
                ..Facets::default()
            },
        }
    }

    /// Derive a narrower domain by applying a restriction step
    pub fn restricted(&self, derived: Facets) -> Self {
        match self {
            ValueDomain::Atomic { base, facets } => {
                let mut facets = facets.clone();
                facets.narrow(derived);
                ValueDomain::Atomic { base: *base, facets }
            }
            ValueDomain::List { item, facets } => {
                let mut facets = facets.clone();
                facets.narrow(derived);
                ValueDomain::List {
                    item: item.clone(),
                    facets,
                }
            }
            // Facets on a union restriction apply to every member
            ValueDomain::Union { members } => ValueDomain::Union {
                members: members
                    .iter()
                    .map(|m| m.restricted(derived.clone()))
                    .collect(),
            },
        }
    }

    /// Enumerated literals, if the domain is a plain enumeration
    pub fn enumeration(&self) -> Option<&[String]> {
        match self {
            ValueDomain::Atomic { facets, .. } if !facets.enumeration.is_empty() => {
                Some(&facets.enumeration)
            }
            _ => None,
        }
    }

    /// The built-in base of an atomic domain
    pub fn base(&self) -> Option<BuiltinType> {
        match self {
            ValueDomain::Atomic { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// Whether a typed value of the given family can belong to this domain
    pub fn accepts_family(&self, family: ValueFamily) -> bool {
        match self {
            ValueDomain::Atomic { base, .. } => {
                let own = base.family();
                own == family
                    || family == ValueFamily::Text
                    || (own == ValueFamily::Decimal && family == ValueFamily::Integer)
                    || (own == ValueFamily::GYear && family == ValueFamily::Integer)
                    || (own == ValueFamily::Float
                        && matches!(family, ValueFamily::Integer | ValueFamily::Decimal))
            }
            ValueDomain::List { .. } => family == ValueFamily::Text,
            ValueDomain::Union { members } => members.iter().any(|m| m.accepts_family(family)),
        }
    }

    /// Check a lexical value, returning the reason on rejection
    ///
    /// The outer `Result` only fails when a stored pattern cannot be compiled.
    pub fn check(&self, value: &str) -> Result<std::result::Result<(), String>> {
        match self {
            ValueDomain::Atomic { base, facets } => {
                let normalized = normalize(*base, value);
                if let Err(reason) = base.check_lexical(&normalized) {
                    return Ok(Err(reason));
                }
                facets.check(&normalized)
            }
            ValueDomain::List { item, facets } => {
                let items: Vec<&str> = value.split_whitespace().collect();
                for it in &items {
                    if let Err(reason) = item.check(it)? {
                        return Ok(Err(format!("list item '{}': {}", it, reason)));
                    }
                }
                if let Some(min) = facets.min_length {
                    if items.len() < min {
                        return Ok(Err(format!("fewer than {} list items", min)));
                    }
                }
                if let Some(max) = facets.max_length {
                    if items.len() > max {
                        return Ok(Err(format!("more than {} list items", max)));
                    }
                }
                let joined = items.join(" ");
                if !facets.enumeration.is_empty() && !facets.enumeration.contains(&joined) {
                    return Ok(Err(format!(
                        "expected one of: {}",
                        facets.enumeration.join(", ")
                    )));
                }
                Ok(Ok(()))
            }
            ValueDomain::Union { members } => {
                let mut reasons = Vec::new();
                for member in members {
                    match member.check(value)? {
                        Ok(()) => return Ok(Ok(())),
                        Err(reason) => reasons.push(reason),
                    }
                }
                Ok(Err(format!("no union member accepts it ({})", reasons.join("; "))))
            }
        }
    }
}

impl Default for ValueDomain {
    fn default() -> Self {
        Self::free_text()
    }
}

/// Apply the whiteSpace normalization of a built-in
fn normalize(base: BuiltinType, value: &str) -> String {
    if base.preserves_whitespace() {
        value.to_string()
    } else {
        value.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueDomain::Atomic { base, facets } => {
                if !facets.enumeration.is_empty() {
                    write!(f, "{} in {{{}}}", base, facets.enumeration.join(", "))
                } else if let Some(pattern) = facets.patterns.last() {
                    write!(f, "{} /{}/", base, pattern.as_str())
                } else {
                    write!(f, "{}", base)
                }
            }
            ValueDomain::List { item, .. } => write!(f, "list of {}", item),
            ValueDomain::Union { members } => {
                let names: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "union of ({})", names.join(" | "))
            }
        }
    }
}
