//! Document building tests
//!
//! These tests build BuildingSync documents against the fixture schema and
//! check both the validation errors and the serialized XML.

use std::path::PathBuf;
use std::sync::OnceLock;

use bsync::{ClassRegistry, Error, Generator, Node, Value, WriteOptions};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn registry() -> &'static ClassRegistry {
    static REGISTRY: OnceLock<ClassRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        Generator::new("BuildingSync")
            .generate_file(fixtures_dir().join("BuildingSync.xsd"))
            .expect("fixture schema should generate")
    })
}

fn node(name: &str) -> Node {
    registry().new_node(name).unwrap()
}

fn compact(node: &Node) -> String {
    node.to_xml_string(&WriteOptions::compact()).unwrap()
}

fn facility_document(ids: &[&str]) -> Node {
    let mut facilities = node("Facilities");
    for id in ids {
        facilities
            .append_child(node("Facilities.Facility").with_attribute("ID", *id).unwrap())
            .unwrap();
    }
    registry()
        .new_root()
        .unwrap()
        .with_attribute("version", "2.4.0")
        .unwrap()
        .add_child(facilities)
        .unwrap()
}

// ============================================================================
// Tree building and serialization
// ============================================================================

#[test]
fn test_facility_document() {
    let doc = facility_document(&["Facility-1"]);
    assert_eq!(
        compact(&doc),
        r#"<BuildingSync version="2.4.0"><Facilities><Facility ID="Facility-1"/></Facilities></BuildingSync>"#
    );
    doc.check_complete().unwrap();
}

#[test]
fn test_weather_data_station_id() {
    let station = node("WeatherDataStationID").with_attribute("IDref", "an-id").unwrap();
    let buildings = registry()
        .construct("Buildings", vec![node("Building").add_child(station).unwrap()], Vec::<(&str, &str)>::new())
        .unwrap();
    assert_eq!(
        compact(&buildings),
        r#"<Buildings><Building><WeatherDataStationID IDref="an-id"/></Building></Buildings>"#
    );
}

#[test]
fn test_weather_station_name() {
    let name = node("WeatherStationName").with_text("A weather station").unwrap();
    let sites = node("Sites").add_child(node("Site").add_child(name).unwrap()).unwrap();
    assert_eq!(
        compact(&sites),
        "<Sites><Site><WeatherStationName>A weather station</WeatherStationName></Site></Sites>"
    );
}

#[test]
fn test_typed_text_values() {
    let date = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();

    let ts = node("StartTimestamp").with_text(date.and_hms_opt(0, 0, 0).unwrap()).unwrap();
    assert_eq!(compact(&ts), "<StartTimestamp>2019-01-01T00:00:00</StartTimestamp>");

    let rcx = node("RetrocommissioningDate").with_text(date).unwrap();
    assert_eq!(compact(&rcx), "<RetrocommissioningDate>2019-01-01</RetrocommissioningDate>");

    let start = node("DayStartTime")
        .with_text(chrono::NaiveTime::from_hms_opt(0, 0, 0).unwrap())
        .unwrap();
    assert_eq!(compact(&start), "<DayStartTime>00:00:00</DayStartTime>");

    let end = node("ApplicableEndDateForDemandRate")
        .with_text(Value::g_month_day(1, 1).unwrap())
        .unwrap();
    assert_eq!(
        compact(&end),
        "<ApplicableEndDateForDemandRate>--01-01</ApplicableEndDateForDemandRate>"
    );

    let story = node("Sections.Section.Story").with_text(1).unwrap();
    assert_eq!(compact(&story), "<Story>1</Story>");

    let year = node("YearOfConstruction").with_text(Value::GYear(1990)).unwrap();
    assert_eq!(year.text(), Some("1990"));
}

#[test]
fn test_mistyped_text_is_rejected() {
    let mut story = node("Story");
    assert!(matches!(story.set_text(1.5), Err(Error::ValueDomain(_))));
    assert!(matches!(story.set_text("first"), Err(Error::ValueDomain(_))));

    let mut floors = node("FloorsAboveGrade");
    assert!(matches!(floors.set_text(-1), Err(Error::ValueDomain(_))));
    floors.set_text(4).unwrap();
}

#[test]
fn test_children_are_written_in_declaration_order() {
    let mut building = node("Building");
    building.append_child(node("YearOfConstruction").with_text(1990).unwrap()).unwrap();
    building
        .append_child(node("WeatherDataStationID").with_attribute("IDref", "ws").unwrap())
        .unwrap();
    building.append_child(node("PremisesName").with_text("HQ").unwrap()).unwrap();

    assert_eq!(
        compact(&building),
        concat!(
            "<Building><PremisesName>HQ</PremisesName>",
            "<WeatherDataStationID IDref=\"ws\"/>",
            "<YearOfConstruction>1990</YearOfConstruction></Building>"
        )
    );
}

#[test]
fn test_inherited_attributes() {
    let mut building = node("Building");
    building.set_attribute("ID", "Building-1").unwrap();
    building.set_attribute("Status", "Existing").unwrap();
    assert!(matches!(building.set_attribute("Status", "Razed"), Err(Error::ValueDomain(_))));
    assert_eq!(building.attribute("Status"), Some("Existing"));

    let class = building.class();
    assert_eq!(class.lineage(), ["Buildings.Building", "BuildingType", "PremisesType"]);
    assert_eq!(class.documentation(), Some("A building on a site."));
}

#[test]
fn test_substitution_group_member() {
    let lighting = node("LightingMeasure")
        .with_attribute("ID", "Measure-1")
        .unwrap()
        .add_child(node("LampType").with_text("LED").unwrap())
        .unwrap();
    let measures = node("Measures").add_child(lighting).unwrap();
    assert_eq!(
        compact(&measures),
        r#"<Measures><LightingMeasure ID="Measure-1"><LampType>LED</LampType></LightingMeasure></Measures>"#
    );
    assert!(matches!(registry().new_node("Measure"), Err(Error::Structure(_))));
}

// ============================================================================
// Validation errors
// ============================================================================

#[test]
fn test_unknown_attribute() {
    let mut facility = node("Facility");
    match facility.set_attribute("Color", "red") {
        Err(Error::UnknownAttribute(e)) => {
            assert_eq!(e.class_name, "Facilities.Facility");
            assert_eq!(e.allowed, vec!["ID".to_string()]);
        }
        other => panic!("expected UnknownAttribute, got {:?}", other),
    }
    assert_eq!(facility.attributes().count(), 0);
}

#[test]
fn test_version_pattern() {
    let mut root = registry().new_root().unwrap();
    root.set_attribute("version", "2.5.0-pr1").unwrap();
    assert!(matches!(root.set_attribute("version", "two"), Err(Error::ValueDomain(_))));
    assert_eq!(root.attribute("version"), Some("2.5.0-pr1"));
}

#[test]
fn test_invalid_id_is_rejected() {
    let mut facility = node("Facility");
    assert!(matches!(facility.set_attribute("ID", "1 bad"), Err(Error::ValueDomain(_))));
}

#[test]
fn test_choice_exclusivity() {
    let mut site = node("Site");
    site.append_child(node("SiteType.OccupancyClassification").with_text("Office").unwrap())
        .unwrap();
    let before = site.clone();

    let other = node("OtherOccupancyClassification").with_text("Lab").unwrap();
    assert!(matches!(site.append_child(other), Err(Error::Structure(_))));
    assert_eq!(site, before);
}

#[test]
fn test_child_outside_content_model() {
    let mut facilities = node("Facilities");
    let err = facilities.append_child(node("Sites")).unwrap_err();
    match err {
        Error::Structure(e) => assert_eq!(e.expected, vec!["Facility".to_string()]),
        other => panic!("expected Structure, got {:?}", other),
    }
    assert_eq!(facilities.child_count(), 0);
}

#[test]
fn test_check_complete() {
    let mut root = registry().new_root().unwrap();
    assert!(matches!(root.check_complete(), Err(Error::Structure(_))));

    root.set_attribute("version", "2.4.0").unwrap();
    let facilities = node("Facilities");
    root.append_child(facilities).unwrap();
    // Facilities requires at least one Facility
    assert!(matches!(root.check_complete(), Err(Error::Structure(_))));

    let complete = facility_document(&["F1", "F2"]);
    complete.check_complete().unwrap();
    assert_eq!(complete.children_named("Facilities")[0].children_named("Facility").len(), 2);
}

#[test]
fn test_errors_are_recoverable() {
    let mut facility = node("Facility");
    let err = facility.set_attribute("Nope", "x").unwrap_err();
    assert!(err.is_recoverable());
    facility.set_attribute("ID", "Facility-9").unwrap();
}

// ============================================================================
// Round trip through an independent parser
// ============================================================================

#[test]
fn test_round_trip_through_roxmltree() {
    let name = node("WeatherStationName").with_text("Airport & Field").unwrap();
    let site = node("Site").with_attribute("ID", "Site-1").unwrap().add_child(name).unwrap();
    let facility = node("Facility")
        .with_attribute("ID", "Facility-1")
        .unwrap()
        .add_child(node("Sites").add_child(site).unwrap())
        .unwrap();
    let doc = registry()
        .new_root()
        .unwrap()
        .with_attribute("version", "2.4.0")
        .unwrap()
        .add_child(node("Facilities").add_child(facility).unwrap())
        .unwrap();

    let xml = doc
        .to_xml_string(&WriteOptions::pretty().with_declaration(true))
        .unwrap();
    let parsed = roxmltree::Document::parse(&xml).unwrap();
    let root = parsed.root_element();

    assert_eq!(root.tag_name().name(), "BuildingSync");
    assert_eq!(root.attribute("version"), Some("2.4.0"));

    let station = root
        .descendants()
        .find(|n| n.has_tag_name("WeatherStationName"))
        .unwrap();
    assert_eq!(station.text(), Some("Airport & Field"));

    let path: Vec<&str> = station
        .ancestors()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name())
        .collect();
    assert_eq!(
        path,
        vec!["WeatherStationName", "Site", "Sites", "Facility", "Facilities", "BuildingSync"]
    );
}

proptest! {
    #[test]
    fn prop_enumeration_members_are_accepted(value in prop::sample::select(vec!["Office", "Retail", "Warehouse"])) {
        let mut class = node("OccupancyClassification");
        prop_assert!(class.set_text(value).is_ok());
        prop_assert_eq!(class.text(), Some(value));
    }

    #[test]
    fn prop_non_members_are_rejected(value in "[a-z]{1,12}") {
        let mut class = node("OccupancyClassification");
        let result = class.set_text(value.as_str());
        prop_assert!(matches!(result, Err(Error::ValueDomain(_))));
        prop_assert_eq!(class.text(), None);
    }

    #[test]
    fn prop_serialization_is_idempotent(ids in prop::collection::vec("[A-Za-z][A-Za-z0-9-]{0,10}", 1..6)) {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        let doc = facility_document(&ids);

        let first = compact(&doc);
        let second = compact(&doc);
        prop_assert_eq!(&first, &second);

        let parsed = roxmltree::Document::parse(&first).unwrap();
        let written: Vec<&str> = parsed
            .descendants()
            .filter(|n| n.has_tag_name("Facility"))
            .filter_map(|n| n.attribute("ID"))
            .collect();
        prop_assert_eq!(written, ids);
    }
}
