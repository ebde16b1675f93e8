//! Observer-pattern diagnostics channel for document trees.
//!
//! Structural problems discovered while a node lazily realizes its value are
//! *delivered* through this channel rather than thrown: traversal machinery
//! never aborts on a malformed value. Whatever handlers are subscribed at
//! the moment of realization receive the notification; with no subscribers
//! it is silently dropped, so callers wanting guaranteed capture must
//! subscribe before triggering realization (see
//! [`visit_and_catch`](crate::NodeWalk::visit_and_catch)).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::node::Location;

/// How serious a structural diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A non-fatal structural diagnostic raised during lazy value realization.
#[derive(Clone, Debug)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    /// Path of the originating node, e.g. `Patient.name[0].family[0]`.
    pub path: String,
    pub location: Option<Location>,
}

type Handler = Rc<dyn Fn(&Notification)>;

struct Registration {
    id: u64,
    scope: String,
    forward: bool,
    handler: Handler,
}

#[derive(Default)]
struct ChannelState {
    next_id: u64,
    registrations: Vec<Registration>,
}

/// The per-tree notification channel.
///
/// Handles are cheap clones of one shared channel; every node of a tree
/// holds the same channel and subscribes with its own path as scope.
/// Registration is not synchronized for cross-thread use.
#[derive(Clone, Default)]
pub struct NotificationChannel {
    inner: Rc<RefCell<ChannelState>>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every notification raised at or below
    /// `scope`, returning a [`Subscription`] that deregisters it on drop.
    ///
    /// `forward = true` lets delivery continue to outer handlers after this
    /// one runs; `forward = false` consumes the notification here.
    pub fn catch(
        &self,
        scope: &str,
        forward: bool,
        handler: impl Fn(&Notification) + 'static,
    ) -> Subscription {
        let mut state = self.inner.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.registrations.push(Registration {
            id,
            scope: scope.to_string(),
            forward,
            handler: Rc::new(handler),
        });
        Subscription {
            channel: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// Delivers `notification` to the subscribed handlers covering its path.
    ///
    /// Delivery order is innermost scope first; among handlers on the same
    /// scope, the most recently registered runs first. After a handler with
    /// `forward = false` runs, delivery stops.
    pub fn raise(&self, notification: Notification) {
        // Snapshot matching handlers so delivery runs without holding the
        // registration borrow (handlers may subscribe or drop subscriptions).
        let mut matching: Vec<(usize, u64, bool, Handler)> = self
            .inner
            .borrow()
            .registrations
            .iter()
            .filter(|r| scope_covers(&r.scope, &notification.path))
            .map(|r| (r.scope.len(), r.id, r.forward, r.handler.clone()))
            .collect();
        matching.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

        tracing::trace!(
            path = %notification.path,
            handlers = matching.len(),
            "delivering notification"
        );
        for (_, _, forward, handler) in matching {
            handler(&notification);
            if !forward {
                break;
            }
        }
    }

    pub fn has_subscribers(&self) -> bool {
        !self.inner.borrow().registrations.is_empty()
    }
}

impl std::fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("subscribers", &self.inner.borrow().registrations.len())
            .finish()
    }
}

fn scope_covers(scope: &str, path: &str) -> bool {
    path == scope
        || path
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// A scoped registration handle.
///
/// Dropping the subscription deregisters its handler; the drop runs on
/// every exit path from the subscribing scope, including unwinding.
#[derive(Debug)]
pub struct Subscription {
    channel: Weak<RefCell<ChannelState>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.channel.upgrade() {
            state.borrow_mut().registrations.retain(|r| r.id != self.id);
        }
    }
}
