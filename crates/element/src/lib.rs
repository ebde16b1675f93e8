//! # Meridian Document Element Model
//!
//! Format-agnostic document tree for structured healthcare records.
//!
//! A record parsed from JSON or XML is realized by an external reader into a
//! tree of [`SourceNode`]s exposing name, an optional scalar value, and
//! ordered children. The tree is read-only, lazily realized, and
//! best-effort: malformed values are reported through the tree's
//! [`NotificationChannel`] as the values are realized, never thrown from
//! traversal machinery.
//!
//! ## Capabilities
//!
//! Two node capabilities are optional and declared per variant:
//!
//! - **Annotations** — a side-channel [`Annotations`] store of opaque typed
//!   payloads. Querying a variant without the capability yields an empty
//!   result.
//! - **Diagnostics** — registration of notification handlers via
//!   [`SourceNode::catch`]. Registering on a variant without the capability
//!   fails with [`ElementError::CapabilityNotSupported`].
//!
//! [`DocumentNode`] carries both; [`ValueNode`] carries neither.
//!
//! ## Threading
//!
//! Execution is single-threaded and synchronous. A realized tree has no
//! mutation API, but annotation attachment and handler registration use
//! unsynchronized interior mutability; callers sharing a tree across
//! threads must synchronize externally.

pub mod annotations;
pub mod channel;
pub mod error;
pub mod node;
pub mod traverse;

pub use annotations::Annotations;
pub use channel::{Notification, NotificationChannel, Severity, Subscription};
pub use error::{ElementError, Result};
pub use node::{DocumentNode, Location, SourceNode, ValueKind, ValueNode};
pub use traverse::{Descendants, NodeWalk};
