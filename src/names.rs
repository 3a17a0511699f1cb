//! Name validation for schema components and generated classes
//!
//! Element, type and attribute names must be NCNames. Generated class names
//! are dotted paths of NCNames (`Facilities.Facility`).

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\-\.0-9\u{B7}]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    !name.is_empty() && NCNAME.is_match(name)
}

/// Check if a string is a valid dotted class path
///
/// Segments may not be empty, so `Facilities..Facility` and `.Facility` fail.
pub fn is_valid_class_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .split('.')
            .all(|segment| !segment.is_empty() && is_valid_ncname(segment))
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("invalid NCName: '{}'", name)))
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Last segment of a dotted class path
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Join a parent class path and a local name
pub fn join_path(parent: &str, local: &str) -> String {
    if parent.is_empty() {
        local.to_string()
    } else {
        format!("{}.{}", parent, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("Facility"));
        assert!(is_valid_ncname("my-element"));
        assert!(is_valid_ncname("_element"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("auc:Facility"));
        assert!(!is_valid_ncname("123element"));
    }

    #[test]
    fn test_is_valid_class_path() {
        assert!(is_valid_class_path("Facility"));
        assert!(is_valid_class_path("Facilities.Facility"));

        assert!(!is_valid_class_path(""));
        assert!(!is_valid_class_path("Facilities..Facility"));
        assert!(!is_valid_class_path(".Facility"));
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("Facility"), (None, "Facility"));
        assert_eq!(split_qname("auc:Facility"), (Some("auc"), "Facility"));
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(last_segment("Facilities.Facility"), "Facility");
        assert_eq!(last_segment("Facility"), "Facility");
        assert_eq!(join_path("", "Sites"), "Sites");
        assert_eq!(join_path("Sites", "Site"), "Sites.Site");
    }
}
