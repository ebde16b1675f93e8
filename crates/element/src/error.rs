/// Error types raised by the document tree's public entry points.
///
/// Structural problems discovered while a node realizes its value are *not*
/// errors: they are delivered as [`Notification`](crate::Notification)s
/// through the tree's channel and never abort a traversal.
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    /// A required argument was missing or malformed (for example an empty
    /// child-name filter).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The node does not implement the requested optional capability.
    #[error("node '{node}' does not support {capability}")]
    CapabilityNotSupported {
        node: String,
        capability: &'static str,
    },
}

/// Result type alias for document tree operations.
pub type Result<T> = std::result::Result<T, ElementError>;
