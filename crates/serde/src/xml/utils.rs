//! Utility functions and constants for XML serialization.

/// Meridian record namespace URI.
///
/// This namespace is added to the root record element in XML documents.
pub const RECORD_NAMESPACE: &str = "http://meridian.software/records";

/// Checks if an element name represents a record root.
///
/// Record types are identified by having an uppercase first letter.
pub fn is_record_name(name: &str) -> bool {
    name.chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
}

/// Converts a Rust boolean to its wire string representation.
pub fn bool_to_string(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}
