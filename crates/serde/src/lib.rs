//! # Meridian Record Serialization Module
//!
//! This crate provides format-agnostic JSON and XML serialization for
//! structured healthcare records, driven by a property-oriented writer
//! protocol and host customization hooks.
//!
//! ## Architecture
//!
//! - **Writer protocol**: [`RecordWriter`] is the output contract; a shared
//!   [`FrameStack`] enforces its nesting grammar identically for every
//!   backend, so a protocol violation is caught the same way whether the
//!   target is JSON or XML.
//! - **Backends**: [`JsonRecordWriter`] streams members in
//!   metadata-declared order, encoding the `_name` shadow-member convention
//!   for primitive id/extension metadata; [`XmlRecordWriter`] streams
//!   quick-xml events with pending-element buffering so attribute-hinted
//!   primitives land as attributes on the enclosing element.
//! - **Engine**: [`Serializer`] walks an instance's typed property view in
//!   metadata order, invoking [`SerializationHooks`] in lock-step;
//!   [`Deserializer`] mirrors it over a realized document tree with
//!   [`DeserializationHooks`].
//!
//! ## Customization
//!
//! The hook contract is explicit: a serializer is always constructed with a
//! hooks value, and [`NoCustomization`] is the named default. A
//! customization whose hooks are all no-ops yields output byte-identical to
//! [`NoCustomization`]; anything else is a defect.
//!
//! ## Failure semantics
//!
//! Hook errors, writer-protocol nesting violations, and unresolvable type
//! metadata are all fatal: the document write or read aborts with no
//! partial-output guarantee and is never retried. Recoverable structural
//! problems in source documents travel through the document tree's
//! notification channel instead.

pub mod de;
pub mod error;
pub mod json;
pub mod ser;
pub mod writer;
pub mod xml;

// Re-export common types and functions
pub use error::{Result, SerdeError};

pub use de::{Deserializer, from_source};
pub use json::{JsonRecordWriter, to_json_string, to_json_vec};
pub use ser::{DeserializationHooks, NoCustomization, SerializationHooks, Serializer};
pub use writer::{FrameStack, RecordWriter, WriteHint};
pub use xml::{XmlRecordWriter, to_xml_string, to_xml_vec};
