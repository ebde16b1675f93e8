//! Side-channel annotation storage for nodes and instances.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// An attachment-ordered registry of opaque typed payloads.
///
/// A node (or a deserialized instance) may carry zero or more annotations of
/// the same or different types; there is no uniqueness constraint. Lookup is
/// by exact payload type. The store uses interior mutability and is not
/// meant to be mutated from multiple threads.
#[derive(Default)]
pub struct Annotations {
    items: RefCell<Vec<Rc<dyn Any>>>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a payload. Attachment order is preserved.
    pub fn attach<T: 'static>(&self, payload: T) {
        self.items.borrow_mut().push(Rc::new(payload));
    }

    /// Returns every payload of type `T`, in attachment order.
    pub fn of<T: 'static>(&self) -> Vec<Rc<T>> {
        self.items
            .borrow()
            .iter()
            .filter_map(|item| item.clone().downcast::<T>().ok())
            .collect()
    }

    /// Returns the first payload of type `T`, if any.
    pub fn first<T: 'static>(&self) -> Option<Rc<T>> {
        self.items
            .borrow()
            .iter()
            .find_map(|item| item.clone().downcast::<T>().ok())
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }
}

impl std::fmt::Debug for Annotations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotations")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_query_by_type() {
        let store = Annotations::new();
        store.attach(4u32);
        store.attach("note".to_string());
        store.attach(7u32);

        let numbers = store.of::<u32>();
        assert_eq!(numbers.len(), 2);
        assert_eq!(*numbers[0], 4);
        assert_eq!(*numbers[1], 7);

        assert_eq!(*store.first::<String>().unwrap(), "note");
        assert!(store.first::<i64>().is_none());
        assert!(store.of::<i64>().is_empty());
    }

    #[test]
    fn test_duplicates_allowed() {
        let store = Annotations::new();
        store.attach(1u8);
        store.attach(1u8);
        assert_eq!(store.of::<u8>().len(), 2);
        assert_eq!(store.len(), 2);
    }
}
