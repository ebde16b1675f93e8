//! Property metadata: descriptors and the external provider interface.
//!
//! The schema system that derives a type's ordered property list from a
//! specification document is an external collaborator; this module defines
//! only the lookup contract plus an in-memory provider for hosts and tests.

use meridian_element::ValueKind;

/// Where a primitive lands on the XML wire (JSON ignores placement).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Representation {
    /// A child element named after the property, carrying its scalar in a
    /// `value` attribute. The default for record primitives.
    Element,
    /// An attribute named after the property on the enclosing element
    /// (`url`/`id`-style properties).
    Attribute,
    /// Character data of the enclosing element (narrative-style content).
    Text,
}

/// Admissible repetition range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cardinality {
    pub min: u32,
    /// `None` means unbounded.
    pub max: Option<u32>,
}

impl Cardinality {
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    pub fn required() -> Self {
        Self { min: 1, max: Some(1) }
    }

    pub fn repeating() -> Self {
        Self { min: 0, max: None }
    }

    pub fn is_repeating(&self) -> bool {
        self.max.map(|m| m > 1).unwrap_or(true)
    }
}

/// One declared property of a complex type, in metadata order.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDescriptor {
    /// Declared name; choice properties use an `[x]` stem, e.g. `value[x]`.
    pub name: String,
    /// Admissible type names. More than one only for choice properties.
    pub types: Vec<String>,
    pub cardinality: Cardinality,
    pub is_primitive: bool,
    pub representation: Representation,
}

impl PropertyDescriptor {
    /// A scalar-valued property.
    pub fn primitive(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            types: vec![type_name.to_string()],
            cardinality: Cardinality::optional(),
            is_primitive: true,
            representation: Representation::Element,
        }
    }

    /// A structured-valued property.
    pub fn complex(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            types: vec![type_name.to_string()],
            cardinality: Cardinality::optional(),
            is_primitive: false,
            representation: Representation::Element,
        }
    }

    /// A choice property declared with an `[x]` stem and its alternatives.
    pub fn choice(name: &str, types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            cardinality: Cardinality::optional(),
            is_primitive: true,
            representation: Representation::Element,
        }
    }

    pub fn repeating(mut self) -> Self {
        self.cardinality = Cardinality::repeating();
        self
    }

    pub fn required(mut self) -> Self {
        self.cardinality = Cardinality::required();
        self
    }

    pub fn attribute(mut self) -> Self {
        self.representation = Representation::Attribute;
        self
    }

    pub fn text(mut self) -> Self {
        self.representation = Representation::Text;
        self
    }

    pub fn is_choice(&self) -> bool {
        self.name.ends_with("[x]")
    }

    /// Declared name without the choice suffix.
    pub fn stem(&self) -> &str {
        self.name.strip_suffix("[x]").unwrap_or(&self.name)
    }

    /// Wire name once the concrete type is known: the stem followed by the
    /// capitalized type name for choices, the declared name otherwise.
    pub fn resolved_name(&self, concrete_type: &str) -> String {
        if self.is_choice() {
            format!("{}{}", self.stem(), capitalize(concrete_type))
        } else {
            self.name.clone()
        }
    }

    /// Matches a source child name against this descriptor, resolving the
    /// concrete type it carries.
    ///
    /// Non-choice properties match their declared name exactly; choice
    /// properties match `stem` + capitalized admissible type
    /// (`value[x]` matches `valueBoolean` as `boolean`).
    pub fn match_node_name(&self, node_name: &str) -> Option<String> {
        if !self.is_choice() {
            return (node_name == self.name).then(|| self.types[0].clone());
        }
        let suffix = node_name.strip_prefix(self.stem())?;
        self.types
            .iter()
            .find(|t| capitalize(t) == suffix)
            .cloned()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Lookup interface onto the external metadata system.
pub trait ModelProvider {
    /// The ordered property list of a complex type, if the type is known.
    fn properties(&self, type_name: &str) -> Option<&[PropertyDescriptor]>;

    /// The lexical kind of a primitive type name.
    fn primitive_kind(&self, type_name: &str) -> Option<ValueKind> {
        match type_name {
            "boolean" => Some(ValueKind::Boolean),
            "integer" | "positiveInt" | "unsignedInt" => Some(ValueKind::Integer),
            "decimal" => Some(ValueKind::Decimal),
            "string" | "code" | "id" | "uri" | "date" | "dateTime" => Some(ValueKind::String),
            _ => None,
        }
    }
}

/// In-memory [`ModelProvider`] backed by registered type definitions.
#[derive(Default)]
pub struct StaticModelProvider {
    types: std::collections::HashMap<String, Vec<PropertyDescriptor>>,
}

impl StaticModelProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        type_name: &str,
        properties: Vec<PropertyDescriptor>,
    ) -> Self {
        self.types.insert(type_name.to_string(), properties);
        self
    }
}

impl ModelProvider for StaticModelProvider {
    fn properties(&self, type_name: &str) -> Option<&[PropertyDescriptor]> {
        self.types.get(type_name).map(Vec::as_slice)
    }
}
