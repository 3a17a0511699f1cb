//! Generation pass tests
//!
//! Load schema bundles from disk, build the type graph and synthesize the
//! class registry, including the metadata module round trip.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use bsync::{ClassRegistry, Error, Generator, Limits, SchemaLoader, WriteOptions};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn fixture_registry() -> ClassRegistry {
    Generator::new("BuildingSync")
        .generate_file(fixtures_dir().join("BuildingSync.xsd"))
        .unwrap()
}

fn write_schema(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let xsd = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           xmlns:t="urn:test" targetNamespace="urn:test">
{}
</xs:schema>"#,
        body
    );
    fs::write(&path, xsd).unwrap();
    path
}

// ============================================================================
// Fixture bundle
// ============================================================================

#[test]
fn test_fixture_bundle_generates() {
    let registry = fixture_registry();
    assert_eq!(registry.root(), "BuildingSync");
    assert_eq!(
        registry.target_namespace(),
        Some(bsync::BUILDINGSYNC_NAMESPACE)
    );
    assert!(registry.contains("Facilities.Facility"));
    assert!(registry.contains("Sections.Section.Story"));
    assert_eq!(
        registry.get("BuildingSync").unwrap().documentation(),
        Some("Root element of a BuildingSync document.")
    );
}

#[test]
fn test_included_declarations_are_visible() {
    let registry = fixture_registry();
    assert!(registry.contains("PremisesType"));
    assert!(registry.contains("LightingMeasureType"));
    assert!(registry.get("PremisesType").unwrap().is_abstract());
}

#[test]
fn test_bases_precede_derived_classes() {
    let registry = fixture_registry();
    let mut seen = HashSet::new();
    for class in registry.classes() {
        if let Some(base) = class.base() {
            assert!(seen.contains(base), "{} emitted before its base {}", class.name(), base);
        }
        seen.insert(class.name().to_string());
    }
}

#[test]
fn test_alias_lookup() {
    let registry = fixture_registry();
    assert_eq!(registry.get("Facility").unwrap().name(), "Facilities.Facility");
    assert_eq!(registry.get("Story").unwrap().name(), "Sections.Section.Story");
    // a full class name wins over a local element sharing its leaf name
    assert_eq!(
        registry.get("OccupancyClassification").unwrap().name(),
        "OccupancyClassification"
    );
    assert!(matches!(registry.get("Skyscraper"), Err(Error::Name(_))));
}

#[test]
fn test_root_must_be_declared() {
    let result = Generator::new("Campus").generate_file(fixtures_dir().join("BuildingSync.xsd"));
    assert!(matches!(result, Err(Error::Schema(_))));
}

// ============================================================================
// Schema errors
// ============================================================================

#[test]
fn test_cyclic_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_schema(
        dir.path(),
        "cyclic.xsd",
        r#"
  <xs:element name="Root" type="t:A"/>
  <xs:complexType name="A"><xs:complexContent><xs:extension base="t:B"/></xs:complexContent></xs:complexType>
  <xs:complexType name="B"><xs:complexContent><xs:extension base="t:A"/></xs:complexContent></xs:complexType>
"#,
    );

    match Generator::new("Root").generate_file(&path) {
        Err(Error::Schema(e)) => assert!(e.message.contains("cyclic"), "{}", e),
        other => panic!("expected a schema error, got {:?}", other),
    }
}

#[test]
fn test_mutual_composition_is_legal() {
    let dir = TempDir::new().unwrap();
    let path = write_schema(
        dir.path(),
        "nested.xsd",
        r#"
  <xs:element name="Root" type="t:Zone"/>
  <xs:complexType name="Zone">
    <xs:sequence><xs:element name="Space" type="t:Space" minOccurs="0"/></xs:sequence>
  </xs:complexType>
  <xs:complexType name="Space">
    <xs:sequence><xs:element name="Zone" type="t:Zone" minOccurs="0"/></xs:sequence>
  </xs:complexType>
"#,
    );

    let registry = Generator::new("Root").generate_file(&path).unwrap();
    let inner = registry.new_node("Zone.Space").unwrap();
    let zone = registry.new_node("Space.Zone").unwrap().add_child(inner).unwrap();
    let space = registry.new_node("Zone.Space").unwrap().add_child(zone).unwrap();
    let root = registry.new_root().unwrap().add_child(space).unwrap();

    assert_eq!(
        root.to_xml_string(&WriteOptions::compact()).unwrap(),
        "<Root><Space><Zone><Space/></Zone></Space></Root>"
    );
}

#[test]
fn test_unresolved_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_schema(dir.path(), "broken.xsd", r#"<xs:element name="Root" type="t:Missing"/>"#);
    assert!(matches!(Generator::new("Root").generate_file(&path), Err(Error::Schema(_))));
}

#[test]
fn test_missing_include_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_schema(
        dir.path(),
        "main.xsd",
        r#"<xs:include schemaLocation="nowhere.xsd"/><xs:element name="Root"/>"#,
    );
    let err = Generator::new("Root").generate_file(&path).unwrap_err();
    assert!(matches!(err, Error::Schema(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn test_mutual_includes_load_once() {
    let dir = TempDir::new().unwrap();
    write_schema(
        dir.path(),
        "a.xsd",
        r#"<xs:include schemaLocation="b.xsd"/><xs:element name="Root" type="t:FromB"/>"#,
    );
    write_schema(
        dir.path(),
        "b.xsd",
        r#"<xs:include schemaLocation="a.xsd"/><xs:complexType name="FromB"/>"#,
    );

    let registry = Generator::new("Root").generate_file(dir.path().join("a.xsd")).unwrap();
    assert_eq!(registry.get("Root").unwrap().base(), Some("FromB"));
}

#[test]
fn test_schema_size_limit() {
    let limits = Limits {
        max_schema_size: 64,
        ..Limits::default()
    };
    let generator = Generator::new("BuildingSync").with_loader(SchemaLoader::new().with_limits(limits));
    let result = generator.generate_file(fixtures_dir().join("BuildingSync.xsd"));
    assert!(matches!(result, Err(Error::LimitExceeded(_))));
}

// ============================================================================
// Metadata module
// ============================================================================

#[test]
fn test_metadata_module_round_trip() {
    let registry = fixture_registry();
    let dir = TempDir::new().unwrap();
    let module = dir.path().join("bsync.json");
    fs::write(&module, registry.to_json().unwrap()).unwrap();

    let loaded = ClassRegistry::from_json(&fs::read_to_string(&module).unwrap()).unwrap();
    assert_eq!(loaded.len(), registry.len());

    let build = |r: &ClassRegistry| {
        let facility = r.new_node("Facility").unwrap().with_attribute("ID", "F-1").unwrap();
        r.new_root()
            .unwrap()
            .with_attribute("version", "2.4.0")
            .unwrap()
            .add_child(r.new_node("Facilities").unwrap().add_child(facility).unwrap())
            .unwrap()
            .to_xml_string(&WriteOptions::compact())
            .unwrap()
    };
    assert_eq!(build(&loaded), build(&registry));

    // validation metadata survives the round trip
    let mut facility = loaded.new_node("Facility").unwrap();
    assert!(matches!(facility.set_attribute("Color", "red"), Err(Error::UnknownAttribute(_))));
}

#[test]
fn test_malformed_metadata_module() {
    assert!(matches!(ClassRegistry::from_json("{\"root\": 3}"), Err(Error::Json(_))));
}
