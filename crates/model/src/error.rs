use meridian_element::ValueKind;

/// Errors raised while binding values against property metadata.
///
/// All of these are fatal to the operation that encountered them; malformed
/// but recoverable source content is reported through the document tree's
/// notification channel instead.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The metadata provider has no definition for the requested type.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// A runtime value's concrete type is not among the property's
    /// admissible types.
    #[error("property '{property}' of '{type_name}' does not admit type '{actual}'")]
    TypeNotAdmissible {
        type_name: String,
        property: String,
        actual: String,
    },

    /// A scalar could not be parsed as the declared primitive kind.
    #[error("value '{raw}' is not a valid {kind:?}")]
    InvalidValue { raw: String, kind: ValueKind },
}

pub type Result<T> = std::result::Result<T, ModelError>;
