//! The deserialization engine: walks a document tree directly, matching
//! child names against metadata descriptors and binding typed instances.
//!
//! There is no structural writer-stack analog on the read side; the node
//! tree already carries the nesting. Unknown child names are reported
//! through the tree's notification channel and skipped (best-effort read);
//! unknown *types* from metadata are fatal.

use std::rc::Rc;

use meridian_element::{Notification, Severity, SourceNode, ValueKind};
use meridian_model::{
    Complex, Element, Extension, ModelError, ModelProvider, Primitive, PropertyDescriptor, Value,
};
use tracing::debug;

use crate::error::Result;
use crate::ser::{DeserializationHooks, NoCustomization};

/// Deserialize a document tree into a typed instance with no customization
/// configured.
pub fn from_source(
    node: &Rc<dyn SourceNode>,
    provider: &dyn ModelProvider,
) -> Result<Complex> {
    Deserializer::new(provider, &NoCustomization).deserialize(node)
}

/// Metadata-driven deserializer over a realized document tree.
pub struct Deserializer<'a> {
    provider: &'a dyn ModelProvider,
    hooks: &'a dyn DeserializationHooks,
}

impl<'a> Deserializer<'a> {
    pub fn new(provider: &'a dyn ModelProvider, hooks: &'a dyn DeserializationHooks) -> Self {
        Self { provider, hooks }
    }

    /// Binds the tree rooted at `node`; the root node's name is the record
    /// type.
    pub fn deserialize(&self, node: &Rc<dyn SourceNode>) -> Result<Complex> {
        debug!(record = %node.name(), "deserializing record");
        let type_name = node.name().to_string();
        self.read_complex(node, &type_name)
    }

    fn read_complex(&self, node: &Rc<dyn SourceNode>, type_name: &str) -> Result<Complex> {
        let descriptors = self
            .provider
            .properties(type_name)
            .ok_or_else(|| ModelError::UnknownType(type_name.to_string()))?;

        let mut instance = Complex::new(type_name);
        for child in node.children() {
            let child_name = child.name().to_string();
            if self
                .hooks
                .on_before_deserialize_property(&child_name, &mut instance, &child)?
            {
                continue;
            }

            let Some((descriptor, concrete_type)) = match_child(descriptors, &child_name) else {
                report(
                    &child,
                    format!("unknown property '{}' of '{}'", child_name, type_name),
                );
                continue;
            };

            let element = if self.provider.primitive_kind(&concrete_type).is_some() {
                Element::Primitive(self.read_primitive(&child, &concrete_type)?)
            } else {
                Element::Complex(self.read_complex(&child, &concrete_type)?)
            };

            if descriptor.cardinality.is_repeating() {
                instance.push(descriptor.stem(), element);
            } else {
                instance.set_single(descriptor.stem(), element);
            }
        }
        Ok(instance)
    }

    fn read_primitive(&self, node: &Rc<dyn SourceNode>, type_name: &str) -> Result<Primitive> {
        let kind = self
            .provider
            .primitive_kind(type_name)
            .ok_or_else(|| ModelError::UnknownType(type_name.to_string()))?;

        let mut primitive = Primitive::default();
        if let Some(text) = node.text() {
            match Value::parse(kind, &text) {
                Ok(value) => primitive.value = Some(value),
                // Malformed scalars were already flagged during lazy
                // realization; binding stays best-effort with no value.
                Err(err) => report(node, err.to_string()),
            }
        }
        for meta in node.children() {
            match meta.name() {
                "id" => primitive.id = meta.text(),
                "extension" => primitive.extensions.push(self.read_extension(&meta)),
                other => report(
                    &meta,
                    format!("unexpected child '{}' on primitive '{}'", other, node.name()),
                ),
            }
        }
        Ok(primitive)
    }

    fn read_extension(&self, node: &Rc<dyn SourceNode>) -> Extension {
        let mut extension = Extension::default();
        for child in node.children() {
            match child.name() {
                "url" => extension.url = child.text().unwrap_or_default(),
                "id" => extension.id = child.text(),
                "extension" => extension.extensions.push(self.read_extension(&child)),
                name if name.starts_with("value") => {
                    let Some(kind) = choice_suffix_kind(&name["value".len()..]) else {
                        report(&child, format!("unknown extension value type '{}'", name));
                        continue;
                    };
                    match child.text().map(|t| Value::parse(kind, &t)) {
                        Some(Ok(value)) => extension.value = Some(value),
                        Some(Err(err)) => report(&child, err.to_string()),
                        None => {}
                    }
                }
                other => report(&child, format!("unexpected extension child '{}'", other)),
            }
        }
        extension
    }
}

/// Finds the descriptor a source child name binds to, resolving choice
/// suffixes, in metadata order.
fn match_child<'d>(
    descriptors: &'d [PropertyDescriptor],
    child_name: &str,
) -> Option<(&'d PropertyDescriptor, String)> {
    descriptors
        .iter()
        .find_map(|d| d.match_node_name(child_name).map(|t| (d, t)))
}

fn choice_suffix_kind(suffix: &str) -> Option<ValueKind> {
    match suffix {
        "Boolean" => Some(ValueKind::Boolean),
        "Integer" => Some(ValueKind::Integer),
        "Decimal" => Some(ValueKind::Decimal),
        "String" => Some(ValueKind::String),
        _ => None,
    }
}

/// Delivers a structural diagnostic through the node's channel, when it has
/// one; nodes without the capability drop it, matching unsubscribed trees.
fn report(node: &Rc<dyn SourceNode>, message: String) {
    if let Some(channel) = node.diagnostics() {
        channel.raise(Notification {
            severity: Severity::Warning,
            message,
            path: node.path(),
            location: node.location(),
        });
    }
}
