//! Shared fixtures: the test record model and minimal format readers.
//!
//! The readers stand in for the external tokenizers that produce document
//! trees in production; the engines under test consume the trees purely
//! through the `SourceNode` contract.
#![allow(dead_code)]

use std::rc::Rc;

use meridian_element::{DocumentNode, ValueKind};
use meridian_model::{PropertyDescriptor, StaticModelProvider};

/// The record model used across the integration suites.
pub fn patient_model() -> StaticModelProvider {
    StaticModelProvider::new()
        .register(
            "Patient",
            vec![
                PropertyDescriptor::primitive("active", "boolean"),
                PropertyDescriptor::complex("name", "HumanName"),
                PropertyDescriptor::primitive("gender", "code"),
                PropertyDescriptor::primitive("birthDate", "date"),
                PropertyDescriptor::primitive("alias", "string").repeating(),
                PropertyDescriptor::primitive("score", "decimal"),
                PropertyDescriptor::choice("deceased[x]", &["boolean", "dateTime"]),
            ],
        )
        .register(
            "HumanName",
            vec![
                PropertyDescriptor::primitive("family", "string"),
                PropertyDescriptor::primitive("given", "string"),
            ],
        )
}

/// Parses a JSON record into a document tree, merging `_name` shadow
/// members into their primitive nodes the way a production reader does.
pub fn node_from_json(json: &str) -> Rc<DocumentNode> {
    let value: serde_json::Value = serde_json::from_str(json).expect("test fixture parses");
    let object = value.as_object().expect("record document is an object");
    let type_name = object
        .get("resourceType")
        .and_then(|v| v.as_str())
        .expect("record document carries resourceType");
    let root = DocumentNode::root(type_name);
    populate_object(&root, object);
    root
}

fn populate_object(node: &Rc<DocumentNode>, object: &serde_json::Map<String, serde_json::Value>) {
    for (key, value) in object {
        if key == "resourceType" || key.starts_with('_') {
            continue;
        }
        let shadow = object.get(&format!("_{}", key));
        match value {
            serde_json::Value::Array(items) => {
                let shadows = shadow.and_then(|s| s.as_array());
                for (i, item) in items.iter().enumerate() {
                    append_member(node, key, item, shadows.and_then(|s| s.get(i)));
                }
            }
            _ => append_member(node, key, value, shadow),
        }
    }
    // Metadata-only members: a shadow with no value sibling.
    for (key, value) in object {
        if let Some(stem) = key.strip_prefix('_') {
            if !object.contains_key(stem) {
                append_member(node, stem, &serde_json::Value::Null, Some(value));
            }
        }
    }
}

fn append_member(
    parent: &Rc<DocumentNode>,
    name: &str,
    value: &serde_json::Value,
    meta: Option<&serde_json::Value>,
) {
    let child = match value {
        serde_json::Value::Object(map) => {
            let child = parent.append(name);
            populate_object(&child, map);
            child
        }
        serde_json::Value::Null => parent.append(name),
        serde_json::Value::Bool(b) => {
            parent.append_value(name, if *b { "true" } else { "false" }, ValueKind::Boolean)
        }
        serde_json::Value::Number(n) => {
            let kind = if n.is_i64() || n.is_u64() {
                ValueKind::Integer
            } else {
                ValueKind::Decimal
            };
            parent.append_value(name, &n.to_string(), kind)
        }
        serde_json::Value::String(s) => parent.append_value(name, s, ValueKind::String),
        serde_json::Value::Array(_) => unreachable!("nested arrays handled by caller"),
    };
    if let Some(serde_json::Value::Object(meta_map)) = meta {
        if let Some(id) = meta_map.get("id").and_then(|v| v.as_str()) {
            child.append_value("id", id, ValueKind::String);
        }
        if let Some(serde_json::Value::Array(extensions)) = meta_map.get("extension") {
            for extension in extensions {
                if let serde_json::Value::Object(ext_map) = extension {
                    let ext_node = child.append("extension");
                    populate_object(&ext_node, ext_map);
                }
            }
        }
    }
}

/// Parses an XML record into a document tree: `value` attributes become the
/// node's scalar, any other attribute becomes a child value node.
pub fn node_from_xml(xml: &str) -> Rc<DocumentNode> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_str(xml);
    let mut stack: Vec<Rc<DocumentNode>> = Vec::new();
    let mut root: Option<Rc<DocumentNode>> = None;

    loop {
        match reader.read_event().expect("test fixture parses") {
            Event::Start(e) => {
                let node = open_element(&stack, &mut root, &e);
                stack.push(node);
            }
            Event::Empty(e) => {
                open_element(&stack, &mut root, &e);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    root.expect("document has a root element")
}

fn open_element(
    stack: &[Rc<DocumentNode>],
    root: &mut Option<Rc<DocumentNode>>,
    e: &quick_xml::events::BytesStart<'_>,
) -> Rc<DocumentNode> {
    let name = String::from_utf8(e.name().as_ref().to_vec()).expect("element name is UTF-8");
    let mut value: Option<String> = None;
    let mut attrs: Vec<(String, String)> = Vec::new();
    for attr in e.attributes() {
        let attr = attr.expect("attribute parses");
        let key = String::from_utf8(attr.key.as_ref().to_vec()).expect("key is UTF-8");
        let text = attr
            .unescape_value()
            .expect("attribute value unescapes")
            .into_owned();
        if key == "value" {
            value = Some(text);
        } else if key != "xmlns" {
            attrs.push((key, text));
        }
    }

    let node = match stack.last() {
        Some(parent) => match &value {
            Some(v) => parent.append_value(&name, v, ValueKind::String),
            None => parent.append(&name),
        },
        None => {
            let r = DocumentNode::root(&name);
            *root = Some(r.clone());
            r
        }
    };
    for (key, text) in attrs {
        node.append_value(&key, &text, ValueKind::String);
    }
    node
}
