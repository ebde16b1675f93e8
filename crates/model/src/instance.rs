//! In-memory typed instances of record types.

use meridian_element::{Annotations, ValueKind};
use rust_decimal::Decimal;

use crate::error::ModelError;

/// A primitive scalar value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(String),
}

impl Value {
    /// Parses wire text according to the expected lexical kind.
    pub fn parse(kind: ValueKind, raw: &str) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidValue {
            raw: raw.to_string(),
            kind,
        };
        match kind {
            ValueKind::Boolean => match raw {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(invalid()),
            },
            ValueKind::Integer => raw.parse().map(Value::Integer).map_err(|_| invalid()),
            ValueKind::Decimal => raw.parse().map(Value::Decimal).map_err(|_| invalid()),
            ValueKind::String => Ok(Value::String(raw.to_string())),
        }
    }

    /// The lexical wire form of the value.
    pub fn as_wire_text(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::String(s) => s.clone(),
        }
    }

    /// The primitive type name the value realizes, used to resolve choice
    /// properties against their admissible types.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
        }
    }

    /// The lexical kind the value belongs to. Several wire type names map
    /// onto one kind (`code`, `date`, `string` are all string-kinded).
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::String(_) => ValueKind::String,
        }
    }

    pub fn is_quoted_on_wire(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Capitalized type suffix used in resolved choice names
    /// (`value[x]` realizing a boolean → `valueBoolean`).
    pub fn choice_suffix(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Decimal(_) => "Decimal",
            Value::String(_) => "String",
        }
    }
}

/// Id/extension metadata carried by a primitive, and the extension element
/// shape itself (extensions nest).
#[derive(Clone, Debug, Default)]
pub struct Extension {
    pub url: String,
    pub id: Option<String>,
    /// The extension's `value[x]` primitive, if any.
    pub value: Option<Value>,
    /// Nested extensions.
    pub extensions: Vec<Extension>,
}

impl Extension {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_nested(mut self, nested: Extension) -> Self {
        self.extensions.push(nested);
        self
    }

    /// The wire member name of the extension's value, e.g. `valueBoolean`.
    pub fn value_member_name(&self) -> Option<String> {
        self.value
            .as_ref()
            .map(|v| format!("value{}", v.choice_suffix()))
    }
}

/// A primitive element: an optional scalar plus id/extension metadata.
///
/// Metadata-only primitives (no value, but an id or extensions) are legal;
/// they surface on the wire as a shadow member (JSON) or an element with no
/// value attribute (XML).
#[derive(Debug, Default)]
pub struct Primitive {
    pub value: Option<Value>,
    pub id: Option<String>,
    pub extensions: Vec<Extension>,
}

impl Primitive {
    pub fn new(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// True when the primitive carries id/extension metadata beyond its
    /// bare value.
    pub fn has_metadata(&self) -> bool {
        self.id.is_some() || !self.extensions.is_empty()
    }
}

impl From<Value> for Primitive {
    fn from(value: Value) -> Self {
        Primitive::new(value)
    }
}

/// One element of a field: primitive- or complex-valued, never both.
#[derive(Debug)]
pub enum Element {
    Primitive(Primitive),
    Complex(Complex),
}

impl Element {
    /// The concrete type this element realizes, for choice resolution.
    pub fn concrete_type(&self) -> Option<&str> {
        match self {
            Element::Primitive(p) => p.value.as_ref().map(Value::type_name),
            Element::Complex(c) => Some(&c.type_name),
        }
    }
}

/// A bound property value: scalar or repeating.
#[derive(Debug)]
pub enum Field {
    Single(Element),
    Many(Vec<Element>),
}

impl Field {
    pub fn elements(&self) -> Vec<&Element> {
        match self {
            Field::Single(e) => vec![e],
            Field::Many(es) => es.iter().collect(),
        }
    }
}

/// A structured instance: named fields in insertion order plus an
/// annotation store for side-channel payloads attached by hooks.
#[derive(Debug)]
pub struct Complex {
    pub type_name: String,
    fields: Vec<(String, Field)>,
    pub annotations: Annotations,
}

impl Complex {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    /// Sets a field under its declared stem name, replacing any previous
    /// binding.
    pub fn set(&mut self, name: &str, field: Field) {
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| n == name) {
            slot.1 = field;
        } else {
            self.fields.push((name.to_string(), field));
        }
    }

    pub fn set_single(&mut self, name: &str, element: Element) {
        self.set(name, Field::Single(element));
    }

    /// Appends an element, promoting the field to repeating as needed.
    pub fn push(&mut self, name: &str, element: Element) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, Field::Many(existing))) => existing.push(element),
            Some(slot) => {
                let prior = std::mem::replace(&mut slot.1, Field::Many(Vec::new()));
                if let (Field::Many(items), Field::Single(first)) = (&mut slot.1, prior) {
                    items.push(first);
                    items.push(element);
                }
            }
            None => self.fields.push((name.to_string(), Field::Many(vec![element]))),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_value_parse_and_wire_text() {
        assert_eq!(
            Value::parse(ValueKind::Boolean, "true").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            Value::parse(ValueKind::Integer, "-7").unwrap(),
            Value::Integer(-7)
        );
        assert_eq!(
            Value::parse(ValueKind::Decimal, "4.20").unwrap(),
            Value::Decimal(dec!(4.20))
        );
        assert!(Value::parse(ValueKind::Boolean, "yes").is_err());

        assert_eq!(Value::Decimal(dec!(4.20)).as_wire_text(), "4.20");
        assert_eq!(Value::Boolean(false).as_wire_text(), "false");
    }

    #[test]
    fn test_push_promotes_to_repeating() {
        let mut name = Complex::new("HumanName");
        name.push(
            "given",
            Element::Primitive(Value::String("Ewout".into()).into()),
        );
        name.push(
            "given",
            Element::Primitive(Value::String("E.".into()).into()),
        );
        match name.field("given").unwrap() {
            Field::Many(items) => assert_eq!(items.len(), 2),
            Field::Single(_) => panic!("expected repeating field"),
        }
    }

    #[test]
    fn test_instance_annotations() {
        let patient = Complex::new("Patient");
        patient.annotations.attach(4i64);
        assert_eq!(*patient.annotations.first::<i64>().unwrap(), 4);
    }

    #[test]
    fn test_primitive_metadata_flag() {
        let bare = Primitive::new(Value::Boolean(true));
        assert!(!bare.has_metadata());
        let with_id = Primitive::new(Value::Boolean(true)).with_id("a1");
        assert!(with_id.has_metadata());
    }
}
