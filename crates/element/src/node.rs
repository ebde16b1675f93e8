//! Document nodes: positions in a format-agnostic parsed record tree.
//!
//! A tree is produced once by an external reader and is read-only
//! afterwards; equivalent subtrees may be structurally shared. Nodes expose
//! name, an optional scalar value, and ordered children. Value realization
//! is lazy: a [`DocumentNode`] keeps the raw source text and re-validates it
//! against its expected kind on every access, delivering any structural
//! diagnostic through the tree's [`NotificationChannel`] and still returning
//! the raw text so the tree stays best-effort usable.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::annotations::Annotations;
use crate::channel::{Notification, NotificationChannel, Severity, Subscription};
use crate::error::ElementError;

/// Line/column position in the source document, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

/// The lexical shape a primitive value is expected to have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Decimal,
    String,
}

impl ValueKind {
    /// Checks `raw` against this kind's lexical rules.
    pub fn accepts(&self, raw: &str) -> bool {
        match self {
            ValueKind::Boolean => raw == "true" || raw == "false",
            ValueKind::Integer => {
                let digits = raw.strip_prefix('-').unwrap_or(raw);
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            }
            ValueKind::Decimal => {
                let unsigned = raw.strip_prefix('-').unwrap_or(raw);
                let (int, frac) = match unsigned.split_once('.') {
                    Some((i, f)) => (i, Some(f)),
                    None => (unsigned, None),
                };
                let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
                all_digits(int) && frac.map(all_digits).unwrap_or(true)
            }
            ValueKind::String => true,
        }
    }
}

/// A position in a parsed record tree.
///
/// Children of the same name are kept as siblings in document order, never
/// collapsed. Annotation access and diagnostics registration are optional
/// capabilities: a variant that lacks them answers with a definite empty /
/// absent result rather than an implicit type probe.
pub trait SourceNode {
    fn name(&self) -> &str;

    /// The realized scalar value, if any.
    ///
    /// Realization may perform deferred validation work and deliver
    /// structural diagnostics through the tree's channel; it never fails.
    fn text(&self) -> Option<String>;

    fn location(&self) -> Option<Location>;

    /// Dotted, positionally indexed path, e.g. `Patient.name[0].given[1]`.
    fn path(&self) -> String;

    /// Immediate children in document order.
    fn children(&self) -> Vec<Rc<dyn SourceNode>>;

    /// Immediate children carrying `name`, in document order.
    ///
    /// An empty filter name is rejected as an invalid argument.
    fn children_named(&self, name: &str) -> Result<Vec<Rc<dyn SourceNode>>, ElementError> {
        if name.is_empty() {
            return Err(ElementError::InvalidArgument(
                "child name filter must not be empty".to_string(),
            ));
        }
        Ok(self
            .children()
            .into_iter()
            .filter(|c| c.name() == name)
            .collect())
    }

    /// The node's annotation store, when the variant supports one.
    fn annotations(&self) -> Option<&Annotations> {
        None
    }

    /// The tree's diagnostics channel, when the variant supports one.
    fn diagnostics(&self) -> Option<NotificationChannel> {
        None
    }

    /// Converts a concretely-typed shared node into the trait-object form
    /// the traversal machinery works over.
    fn to_shared(self: Rc<Self>) -> Rc<dyn SourceNode>
    where
        Self: Sized + 'static,
    {
        self
    }

    /// Registers `handler` for diagnostics raised at or below this node.
    ///
    /// Fails with a capability error on variants without a diagnostics
    /// channel.
    fn catch(
        &self,
        forward: bool,
        handler: Box<dyn Fn(&Notification)>,
    ) -> Result<Subscription, ElementError> {
        match self.diagnostics() {
            Some(channel) => Ok(channel.catch(&self.path(), forward, handler)),
            None => Err(ElementError::CapabilityNotSupported {
                node: self.name().to_string(),
                capability: "diagnostics subscription",
            }),
        }
    }
}

impl std::fmt::Debug for dyn SourceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceNode")
            .field("name", &self.name())
            .field("path", &self.path())
            .finish()
    }
}

/// Full-capability tree node produced by a format reader.
pub struct DocumentNode {
    name: String,
    raw: Option<String>,
    kind: Option<ValueKind>,
    location: Cell<Option<Location>>,
    path: String,
    children: RefCell<Vec<Rc<DocumentNode>>>,
    annotations: Annotations,
    channel: NotificationChannel,
}

impl DocumentNode {
    /// Creates the root of a fresh tree with its own notification channel.
    pub fn root(name: impl Into<String>) -> Rc<Self> {
        let name = name.into();
        Rc::new(Self {
            path: name.clone(),
            name,
            raw: None,
            kind: None,
            location: Cell::new(None),
            children: RefCell::new(Vec::new()),
            annotations: Annotations::new(),
            channel: NotificationChannel::new(),
        })
    }

    /// Appends a valueless (complex) child and returns it.
    pub fn append(self: &Rc<Self>, name: &str) -> Rc<Self> {
        self.append_node(name, None, None)
    }

    /// Appends a child holding raw source text of the expected kind.
    pub fn append_value(self: &Rc<Self>, name: &str, raw: &str, kind: ValueKind) -> Rc<Self> {
        self.append_node(name, Some(raw.to_string()), Some(kind))
    }

    fn append_node(
        self: &Rc<Self>,
        name: &str,
        raw: Option<String>,
        kind: Option<ValueKind>,
    ) -> Rc<Self> {
        let index = self
            .children
            .borrow()
            .iter()
            .filter(|c| c.name == name)
            .count();
        let child = Rc::new(Self {
            name: name.to_string(),
            raw,
            kind,
            location: Cell::new(None),
            path: format!("{}.{}[{}]", self.path, name, index),
            children: RefCell::new(Vec::new()),
            annotations: Annotations::new(),
            channel: self.channel.clone(),
        });
        self.children.borrow_mut().push(child.clone());
        child
    }

    /// Records the node's source position and hands the node back, so
    /// readers can chain it onto an `append_*` call.
    pub fn locate(self: &Rc<Self>, line: u32, col: u32) -> Rc<Self> {
        self.location.set(Some(Location { line, col }));
        self.clone()
    }

    /// The expected value kind, if the reader declared one.
    pub fn kind(&self) -> Option<ValueKind> {
        self.kind
    }
}

impl SourceNode for DocumentNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn text(&self) -> Option<String> {
        let raw = self.raw.as_ref()?;
        // Re-validated on every realization, never cached: each traversal
        // reports its diagnostics anew.
        if let Some(kind) = self.kind {
            if !kind.accepts(raw) {
                self.channel.raise(Notification {
                    severity: Severity::Error,
                    message: format!("value '{}' is not a valid {:?}", raw, kind),
                    path: self.path.clone(),
                    location: self.location.get(),
                });
            }
        }
        Some(raw.clone())
    }

    fn location(&self) -> Option<Location> {
        self.location.get()
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn children(&self) -> Vec<Rc<dyn SourceNode>> {
        self.children
            .borrow()
            .iter()
            .map(|c| c.clone() as Rc<dyn SourceNode>)
            .collect()
    }

    fn annotations(&self) -> Option<&Annotations> {
        Some(&self.annotations)
    }

    fn diagnostics(&self) -> Option<NotificationChannel> {
        Some(self.channel.clone())
    }
}

/// Minimal eager node without annotation or diagnostics capabilities.
///
/// Used for detached values, hook-built fragments, and anywhere a tree
/// position is needed without a backing source document.
pub struct ValueNode {
    name: String,
    value: Option<String>,
    children: Vec<Rc<dyn SourceNode>>,
}

impl ValueNode {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Rc<dyn SourceNode>>) -> Self {
        self.children = children;
        self
    }
}

impl SourceNode for ValueNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn text(&self) -> Option<String> {
        self.value.clone()
    }

    fn location(&self) -> Option<Location> {
        None
    }

    fn path(&self) -> String {
        self.name.clone()
    }

    fn children(&self) -> Vec<Rc<dyn SourceNode>> {
        self.children.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_lexical_rules() {
        assert!(ValueKind::Boolean.accepts("true"));
        assert!(!ValueKind::Boolean.accepts("True"));
        assert!(ValueKind::Integer.accepts("-42"));
        assert!(!ValueKind::Integer.accepts("4.2"));
        assert!(ValueKind::Decimal.accepts("4.2"));
        assert!(ValueKind::Decimal.accepts("-0.5"));
        assert!(!ValueKind::Decimal.accepts("4."));
        assert!(!ValueKind::Decimal.accepts(""));
        assert!(ValueKind::String.accepts("anything"));
    }

    #[test]
    fn test_paths_index_same_named_siblings() {
        let root = DocumentNode::root("Patient");
        let name = root.append("name");
        name.append_value("given", "Ewout", ValueKind::String);
        name.append_value("given", "E.", ValueKind::String);

        let given = name.children_named("given").unwrap();
        assert_eq!(given.len(), 2);
        assert_eq!(given[0].path(), "Patient.name[0].given[0]");
        assert_eq!(given[1].path(), "Patient.name[0].given[1]");
    }

    #[test]
    fn test_empty_filter_name_is_invalid() {
        let root = DocumentNode::root("Patient");
        let err = root.children_named("").unwrap_err();
        assert!(matches!(err, ElementError::InvalidArgument(_)));
    }

    #[test]
    fn test_lazy_realization_reports_per_access() {
        let root = DocumentNode::root("Patient");
        let active = root
            .append_value("active", "yes", ValueKind::Boolean)
            .locate(3, 14);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = root
            .catch(
                true,
                Box::new(move |n: &Notification| sink.borrow_mut().push(n.clone())),
            )
            .unwrap();

        // Best-effort: the raw text still comes back.
        assert_eq!(active.text().as_deref(), Some("yes"));
        assert_eq!(active.text().as_deref(), Some("yes"));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].path, "Patient.active[0]");
        assert_eq!(seen[0].location, Some(Location { line: 3, col: 14 }));
    }

    #[test]
    fn test_value_node_lacks_capabilities() {
        let node = ValueNode::new("detached", Some("x"));
        assert!(node.annotations().is_none());
        assert!(node.diagnostics().is_none());
        let err = node.catch(true, Box::new(|_| {})).unwrap_err();
        assert!(matches!(err, ElementError::CapabilityNotSupported { .. }));
    }

    #[test]
    fn test_document_node_annotation_capability() {
        let root = DocumentNode::root("Patient");
        root.annotations().unwrap().attach(4u32);
        assert_eq!(*root.annotations().unwrap().first::<u32>().unwrap(), 4);
    }
}
