/// Error types for record serialization and deserialization.
///
/// Every variant is fatal to the document being written or read: the engine
/// aborts with no partial-output guarantee and never retries. Recoverable
/// structural problems in source documents travel through the document
/// tree's notification channel instead and never appear here.
#[derive(Debug)]
pub enum SerdeError {
    /// JSON serialization or deserialization error
    Json(serde_json::Error),

    /// XML serialization or deserialization error
    Xml(quick_xml::Error),

    /// IO error during serialization/deserialization
    Io(std::io::Error),

    /// Writer protocol nesting violation
    Protocol(String),

    /// Unresolvable or inadmissible type metadata
    Model(meridian_model::ModelError),

    /// Invalid argument or absent capability on a document tree entry point
    Element(meridian_element::ElementError),

    /// Error propagated out of a host customization hook
    Hook(String),

    /// Custom error message
    Custom(String),
}

impl std::fmt::Display for SerdeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerdeError::Json(e) => write!(f, "JSON error: {}", e),
            SerdeError::Xml(e) => write!(f, "XML error: {}", e),
            SerdeError::Io(e) => write!(f, "IO error: {}", e),
            SerdeError::Protocol(msg) => write!(f, "writer protocol violation: {}", msg),
            SerdeError::Model(e) => write!(f, "metadata error: {}", e),
            SerdeError::Element(e) => write!(f, "document tree error: {}", e),
            SerdeError::Hook(msg) => write!(f, "customization hook failed: {}", msg),
            SerdeError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SerdeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SerdeError::Json(e) => Some(e),
            SerdeError::Xml(e) => Some(e),
            SerdeError::Io(e) => Some(e),
            SerdeError::Model(e) => Some(e),
            SerdeError::Element(e) => Some(e),
            SerdeError::Protocol(_) | SerdeError::Hook(_) | SerdeError::Custom(_) => None,
        }
    }
}

impl From<serde_json::Error> for SerdeError {
    fn from(err: serde_json::Error) -> Self {
        SerdeError::Json(err)
    }
}

impl From<quick_xml::Error> for SerdeError {
    fn from(err: quick_xml::Error) -> Self {
        SerdeError::Xml(err)
    }
}

impl From<std::io::Error> for SerdeError {
    fn from(err: std::io::Error) -> Self {
        SerdeError::Io(err)
    }
}

impl From<meridian_model::ModelError> for SerdeError {
    fn from(err: meridian_model::ModelError) -> Self {
        SerdeError::Model(err)
    }
}

impl From<meridian_element::ElementError> for SerdeError {
    fn from(err: meridian_element::ElementError) -> Self {
        SerdeError::Element(err)
    }
}

impl From<String> for SerdeError {
    fn from(msg: String) -> Self {
        SerdeError::Custom(msg)
    }
}

impl From<&str> for SerdeError {
    fn from(msg: &str) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}

/// Result type alias for record serialization operations
pub type Result<T> = std::result::Result<T, SerdeError>;
