//! The typed property adapter: binds an instance to its metadata.

use crate::descriptor::{ModelProvider, PropertyDescriptor};
use crate::error::ModelError;
use crate::instance::{Complex, Field};

/// One property of a typed instance, in metadata-declared order, with its
/// choice type resolved against the runtime value.
#[derive(Debug)]
pub struct TypedProperty<'a> {
    /// Wire name after choice resolution (`value[x]` → `valueBoolean`).
    pub resolved_name: String,
    pub descriptor: PropertyDescriptor,
    /// The bound field; `None` for declared-but-absent properties.
    pub field: Option<&'a Field>,
}

/// Binds a [`Complex`] instance to schema metadata, yielding its ordered,
/// typed properties.
pub struct TypedView<'a> {
    instance: &'a Complex,
    provider: Option<&'a dyn ModelProvider>,
}

impl<'a> TypedView<'a> {
    /// Binds `instance` against `provider`'s metadata.
    ///
    /// Fails immediately when the provider does not know the instance's
    /// type; an adapter over an unknown type can never emit correctly.
    pub fn new(instance: &'a Complex, provider: &'a dyn ModelProvider) -> Result<Self, ModelError> {
        if provider.properties(&instance.type_name).is_none() {
            return Err(ModelError::UnknownType(instance.type_name.clone()));
        }
        Ok(Self {
            instance,
            provider: Some(provider),
        })
    }

    /// Degraded bridging mode: no metadata, every present field surfaces in
    /// insertion order with a descriptor synthesized from its runtime shape.
    /// Choice resolution and declared ordering are unavailable.
    #[deprecated(
        note = "type-information-free view; bind a ModelProvider with TypedView::new instead"
    )]
    pub fn without_model(instance: &'a Complex) -> Self {
        Self {
            instance,
            provider: None,
        }
    }

    /// The instance's properties in metadata-declared order.
    pub fn properties(&self) -> Result<Vec<TypedProperty<'a>>, ModelError> {
        let Some(provider) = self.provider else {
            return Ok(self.untyped_properties());
        };

        let descriptors = provider
            .properties(&self.instance.type_name)
            .ok_or_else(|| ModelError::UnknownType(self.instance.type_name.clone()))?;

        let mut properties = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let field = self.instance.field(descriptor.stem());
            let resolved_name = match field {
                Some(field) if descriptor.is_choice() => {
                    let concrete =
                        resolve_choice(&self.instance.type_name, descriptor, field, provider)?;
                    descriptor.resolved_name(&concrete)
                }
                _ => descriptor.resolved_name(descriptor.types[0].as_str()),
            };
            properties.push(TypedProperty {
                resolved_name,
                descriptor: descriptor.clone(),
                field,
            });
        }
        Ok(properties)
    }

    fn untyped_properties(&self) -> Vec<TypedProperty<'a>> {
        self.instance
            .fields()
            .map(|(name, field)| {
                let is_primitive = field
                    .elements()
                    .first()
                    .is_some_and(|e| matches!(e, crate::instance::Element::Primitive(_)));
                let descriptor = if is_primitive {
                    PropertyDescriptor::primitive(name, "string")
                } else {
                    PropertyDescriptor::complex(name, "Element")
                };
                TypedProperty {
                    resolved_name: name.to_string(),
                    descriptor,
                    field: Some(field),
                }
            })
            .collect()
    }
}

/// Resolves the concrete type a choice field realizes and checks it against
/// the admissible set.
///
/// A primitive value that does not name an admissible type directly (many
/// wire type names share one lexical kind) resolves to the first admissible
/// type of the same kind.
fn resolve_choice(
    type_name: &str,
    descriptor: &PropertyDescriptor,
    field: &Field,
    provider: &dyn ModelProvider,
) -> Result<String, ModelError> {
    let Some(element) = field.elements().first().copied() else {
        return Ok(descriptor.types[0].clone());
    };
    // A metadata-only choice primitive has no value to inspect; fall back
    // to the first admissible alternative.
    let Some(concrete) = element.concrete_type() else {
        return Ok(descriptor.types[0].clone());
    };
    if descriptor.types.iter().any(|t| t == concrete) {
        return Ok(concrete.to_string());
    }
    if let crate::instance::Element::Primitive(primitive) = element {
        if let Some(value) = &primitive.value {
            if let Some(admissible) = descriptor
                .types
                .iter()
                .find(|t| provider.primitive_kind(t) == Some(value.kind()))
            {
                return Ok(admissible.clone());
            }
        }
    }
    Err(ModelError::TypeNotAdmissible {
        type_name: type_name.to_string(),
        property: descriptor.name.clone(),
        actual: concrete.to_string(),
    })
}
