//! Tree traversal: lazy descendant enumeration and pre-order visits.

use std::cell::RefCell;
use std::rc::Rc;

use crate::channel::Notification;
use crate::error::ElementError;
use crate::node::SourceNode;

/// Lazy pre-order iterator over a subtree.
///
/// Each call to [`NodeWalk::descendants`] produces a fresh traversal; the
/// sequence is never cached, so a source that reports diagnostics during
/// realization reports them anew per traversal.
pub struct Descendants {
    stack: Vec<Rc<dyn SourceNode>>,
}

impl Iterator for Descendants {
    type Item = Rc<dyn SourceNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut children = node.children();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

/// Traversal entry points available on any shared node.
pub trait NodeWalk {
    /// Every node strictly below this one, depth-first, document order.
    fn descendants(&self) -> Descendants;

    /// This node first, then [`NodeWalk::descendants`].
    fn descendants_and_self(&self) -> Descendants;

    /// Pre-order walk calling `visitor(depth, node)` exactly once per node;
    /// this node has depth 0.
    fn visit(&self, visitor: &mut dyn FnMut(usize, &Rc<dyn SourceNode>));

    /// Walks the whole subtree forcing value realization on every node,
    /// discarding results. Any deferred diagnostics fire as a side effect.
    fn visit_all(&self);

    /// [`NodeWalk::visit_all`] with a temporary diagnostics collector
    /// subscribed for the duration of the walk; returns what it caught.
    ///
    /// The collector is released on every exit path, including unwinding.
    /// Fails on node variants without a diagnostics channel.
    fn visit_and_catch(&self) -> Result<Vec<Notification>, ElementError>;
}

impl NodeWalk for Rc<dyn SourceNode> {
    fn descendants(&self) -> Descendants {
        let mut children = self.children();
        children.reverse();
        Descendants { stack: children }
    }

    fn descendants_and_self(&self) -> Descendants {
        Descendants {
            stack: vec![self.clone()],
        }
    }

    fn visit(&self, visitor: &mut dyn FnMut(usize, &Rc<dyn SourceNode>)) {
        fn walk(
            node: &Rc<dyn SourceNode>,
            depth: usize,
            visitor: &mut dyn FnMut(usize, &Rc<dyn SourceNode>),
        ) {
            visitor(depth, node);
            for child in node.children() {
                walk(&child, depth + 1, visitor);
            }
        }
        walk(self, 0, visitor);
    }

    fn visit_all(&self) {
        self.visit(&mut |_, node| {
            let _ = node.text();
        });
    }

    fn visit_and_catch(&self) -> Result<Vec<Notification>, ElementError> {
        let caught = Rc::new(RefCell::new(Vec::new()));
        let sink = caught.clone();
        // The subscription guard deregisters on drop, also when the walk
        // unwinds.
        let _sub = self.catch(
            true,
            Box::new(move |n: &Notification| sink.borrow_mut().push(n.clone())),
        )?;
        self.visit_all();
        drop(_sub);
        Ok(Rc::try_unwrap(caught)
            .expect("collector subscription released")
            .into_inner())
    }
}

impl<T: SourceNode + 'static> NodeWalk for Rc<T> {
    fn descendants(&self) -> Descendants {
        self.clone().to_shared().descendants()
    }

    fn descendants_and_self(&self) -> Descendants {
        self.clone().to_shared().descendants_and_self()
    }

    fn visit(&self, visitor: &mut dyn FnMut(usize, &Rc<dyn SourceNode>)) {
        self.clone().to_shared().visit(visitor)
    }

    fn visit_all(&self) {
        self.clone().to_shared().visit_all()
    }

    fn visit_and_catch(&self) -> Result<Vec<Notification>, ElementError> {
        self.clone().to_shared().visit_and_catch()
    }
}
