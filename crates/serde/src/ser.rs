//! The serialization engine: walks an instance's typed properties in
//! metadata order, driving a [`RecordWriter`] and the customization hooks
//! in lock-step.

use meridian_model::{Complex, Element, Field, ModelProvider, Representation, TypedProperty, TypedView};
use tracing::{debug, trace};

use crate::error::{Result, SerdeError};
use crate::writer::{RecordWriter, WriteHint};

/// Host-supplied interception points for serialization.
///
/// Every hook defaults to a no-op; an implementation overriding nothing is
/// byte-identical to [`NoCustomization`]. A hook returning an error aborts
/// the whole document.
pub trait SerializationHooks {
    /// Called when a complex instance begins, before any of its declared
    /// properties; may emit extra properties through `writer` (on the XML
    /// wire, attribute-hinted primitives written here land as attributes on
    /// the instance's still-pending element).
    fn on_before_serialize_complex_type(
        &self,
        _instance: &Complex,
        _writer: &mut dyn RecordWriter,
    ) -> Result<()> {
        Ok(())
    }

    /// Called per declared, present property, before default emission.
    ///
    /// Returning `true` means the hook owns this property: the engine emits
    /// nothing for it at all. Returning `false` lets default emission
    /// proceed.
    fn on_before_serialize_property(
        &self,
        _name: &str,
        _field: &Field,
        _writer: &mut dyn RecordWriter,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Called after all declared properties of a complex instance; may
    /// append ad-hoc properties unconnected to any declared one.
    fn on_after_serialize_complex_type(
        &self,
        _instance: &Complex,
        _writer: &mut dyn RecordWriter,
    ) -> Result<()> {
        Ok(())
    }
}

/// Host-supplied interception point for deserialization.
pub trait DeserializationHooks {
    /// Called per source child before default binding. Returning `true`
    /// means the hook fully handled the property (typically by attaching
    /// data to `parent`'s annotation store); `false` falls through to
    /// default metadata-driven binding.
    fn on_before_deserialize_property(
        &self,
        _name: &str,
        _parent: &mut Complex,
        _node: &std::rc::Rc<dyn meridian_element::SourceNode>,
    ) -> Result<bool> {
        Ok(false)
    }
}

/// The explicit "no customization configured" value.
///
/// Passing this to an engine is the canonical default; there is no ambient
/// or global customization state.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCustomization;

impl SerializationHooks for NoCustomization {}
impl DeserializationHooks for NoCustomization {}

/// Metadata-driven serializer for one or more documents.
///
/// The engine holds no per-document state; each [`serialize`] call drives
/// one writer from start to finish and fails fatally, with no partial
/// output guarantee, on hook errors, protocol violations, or unresolvable
/// metadata.
///
/// [`serialize`]: Serializer::serialize
pub struct Serializer<'a> {
    provider: &'a dyn ModelProvider,
    hooks: &'a dyn SerializationHooks,
}

impl<'a> Serializer<'a> {
    pub fn new(provider: &'a dyn ModelProvider, hooks: &'a dyn SerializationHooks) -> Self {
        Self { provider, hooks }
    }

    /// Serializes `instance` as a complete document through `writer`,
    /// returning the rendered bytes.
    pub fn serialize(
        &self,
        instance: &Complex,
        writer: &mut dyn RecordWriter,
    ) -> Result<Vec<u8>> {
        debug!(record = %instance.type_name, "serializing record");
        writer.start_record(&instance.type_name)?;
        self.write_complex(instance, writer)?;
        writer.end_record()?;
        writer.finish()
    }

    fn write_complex(&self, instance: &Complex, writer: &mut dyn RecordWriter) -> Result<()> {
        self.hooks
            .on_before_serialize_complex_type(instance, writer)?;

        let view = TypedView::new(instance, self.provider)?;
        for property in view.properties()? {
            let Some(field) = property.field else {
                continue;
            };
            if self
                .hooks
                .on_before_serialize_property(&property.resolved_name, field, writer)?
            {
                trace!(property = %property.resolved_name, "emission owned by hook");
                continue;
            }
            self.write_property(&property, field, writer)?;
        }

        self.hooks
            .on_after_serialize_complex_type(instance, writer)
    }

    fn write_property(
        &self,
        property: &TypedProperty<'_>,
        field: &Field,
        writer: &mut dyn RecordWriter,
    ) -> Result<()> {
        trace!(property = %property.resolved_name, "default emission");
        writer.start_property(&property.resolved_name)?;
        let hint = hint_for(property.descriptor.representation);
        if property.descriptor.cardinality.is_repeating() {
            writer.start_array()?;
            for element in field.elements() {
                self.write_element(element, hint, writer)?;
            }
            writer.end_array()?;
        } else {
            let elements = field.elements();
            if elements.len() > 1 {
                return Err(SerdeError::Custom(format!(
                    "property '{}' is not repeating but holds {} values",
                    property.resolved_name,
                    elements.len()
                )));
            }
            for element in elements {
                self.write_element(element, hint, writer)?;
            }
        }
        writer.end_property()
    }

    fn write_element(
        &self,
        element: &Element,
        hint: WriteHint,
        writer: &mut dyn RecordWriter,
    ) -> Result<()> {
        match element {
            Element::Primitive(primitive) => writer.write_primitive(primitive, hint),
            Element::Complex(complex) => {
                writer.start_complex_content()?;
                self.write_complex(complex, writer)?;
                writer.end_complex_content()
            }
        }
    }
}

fn hint_for(representation: Representation) -> WriteHint {
    match representation {
        Representation::Element => WriteHint::None,
        Representation::Attribute => WriteHint::Attribute,
        Representation::Text => WriteHint::Text,
    }
}
