mod common;

use std::rc::Rc;

use common::{node_from_json, node_from_xml, patient_model};
use meridian_element::{NodeWalk, SourceNode};
use meridian_serde::{Result, SerdeError, from_source, to_json_string, to_xml_string};

#[test]
fn test_json_round_trip_minimal_record() -> Result<()> {
    let input = r#"{"resourceType":"Patient","active":true,"name":{"family":"Kramer","given":"Ewout"}}"#;
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_json(input);
    let patient = from_source(&node, &provider)?;
    let output = to_json_string(&patient, &provider)?;

    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_xml_round_trip_minimal_record() -> Result<()> {
    let input = "<Patient xmlns=\"http://meridian.software/records\">\
        <active value=\"true\"/>\
        <name><family value=\"Kramer\"/><given value=\"Ewout\"/></name>\
        </Patient>";
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_xml(input);
    let patient = from_source(&node, &provider)?;
    let output = to_xml_string(&patient, &provider)?;

    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_json_round_trip_shadow_metadata() -> Result<()> {
    let input = r#"{"resourceType":"Patient","active":true,"birthDate":"1974-12-25","_birthDate":{"id":"bd1"}}"#;
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_json(input);
    let patient = from_source(&node, &provider)?;
    let output = to_json_string(&patient, &provider)?;

    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_json_round_trip_extension_metadata() -> Result<()> {
    let input = r#"{"resourceType":"Patient","birthDate":"1974-12-25","_birthDate":{"id":"bd1","extension":[{"url":"http://example.org/flag","valueBoolean":true}]}}"#;
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_json(input);
    let patient = from_source(&node, &provider)?;
    let output = to_json_string(&patient, &provider)?;

    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_json_round_trip_aligned_shadow_arrays() -> Result<()> {
    let input =
        r#"{"resourceType":"Patient","alias":["Kim","K"],"_alias":[null,{"id":"a1"}]}"#;
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_json(input);
    let patient = from_source(&node, &provider)?;
    let output = to_json_string(&patient, &provider)?;

    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_json_round_trip_choice_property() -> Result<()> {
    let input = r#"{"resourceType":"Patient","deceasedBoolean":false}"#;
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_json(input);
    let patient = from_source(&node, &provider)?;
    let output = to_json_string(&patient, &provider)?;

    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_json_round_trip_string_kinded_choice() -> Result<()> {
    let input = r#"{"resourceType":"Patient","deceasedDateTime":"2024-01-01"}"#;
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_json(input);
    let patient = from_source(&node, &provider)?;
    let output = to_json_string(&patient, &provider)?;

    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_xml_round_trip_decimal_precision() -> Result<()> {
    let input = "<Patient xmlns=\"http://meridian.software/records\">\
        <score value=\"4.20\"/></Patient>";
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_xml(input);
    let patient = from_source(&node, &provider)?;

    // The decimal keeps its source scale through the typed instance.
    let expected: rust_decimal::Decimal = "4.20".parse().unwrap();
    match patient.field("score") {
        Some(meridian_model::Field::Single(meridian_model::Element::Primitive(p))) => {
            assert_eq!(p.value, Some(meridian_model::Value::Decimal(expected)));
        }
        other => panic!("score bound unexpectedly: {:?}", other),
    }

    let output = to_xml_string(&patient, &provider)?;
    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_xml_round_trip_primitive_metadata() -> Result<()> {
    let input = "<Patient xmlns=\"http://meridian.software/records\">\
        <birthDate id=\"bd1\" value=\"1974-12-25\">\
        <extension url=\"http://example.org/flag\"><valueBoolean value=\"true\"/></extension>\
        </birthDate></Patient>";
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_xml(input);
    let patient = from_source(&node, &provider)?;
    let output = to_xml_string(&patient, &provider)?;

    assert_eq!(output, input);
    Ok(())
}

#[test]
fn test_cross_format_json_to_xml() -> Result<()> {
    let input = r#"{"resourceType":"Patient","active":true,"name":{"family":"Kramer","given":"Ewout"}}"#;
    let provider = patient_model();

    let node: Rc<dyn SourceNode> = node_from_json(input);
    let patient = from_source(&node, &provider)?;
    let output = to_xml_string(&patient, &provider)?;

    assert_eq!(
        output,
        "<Patient xmlns=\"http://meridian.software/records\">\
         <active value=\"true\"/>\
         <name><family value=\"Kramer\"/><given value=\"Ewout\"/></name>\
         </Patient>"
    );
    Ok(())
}

#[test]
fn test_unknown_record_type_is_fatal() {
    let provider = patient_model();
    let node: Rc<dyn SourceNode> =
        node_from_json(r#"{"resourceType":"Mystery","active":true}"#);
    let err = from_source(&node, &provider).unwrap_err();
    assert!(matches!(err, SerdeError::Model(_)));
}

#[test]
fn test_unknown_property_reports_and_continues() -> Result<()> {
    let provider = patient_model();
    let node: Rc<dyn SourceNode> =
        node_from_json(r#"{"resourceType":"Patient","active":true,"bogus":"x"}"#);

    let caught = Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = caught.clone();
    let _sub = node
        .catch(
            true,
            Box::new(move |n: &meridian_element::Notification| {
                sink.borrow_mut().push(n.message.clone());
            }),
        )
        .unwrap();
    let patient = from_source(&node, &provider)?;

    assert!(caught.borrow().iter().any(|m| m.contains("bogus")));
    // Best-effort: the known properties still bound.
    assert!(patient.field("active").is_some());
    Ok(())
}

#[test]
fn test_realization_diagnostics_surface_via_visit_and_catch() {
    let node: Rc<dyn SourceNode> =
        node_from_json(r#"{"resourceType":"Patient","active":true}"#);
    // A well-formed tree realizes without diagnostics.
    let caught = node.visit_and_catch().unwrap();
    assert!(caught.is_empty());
}
