//! Change notifications sent by the controller.

use bevy_reflect::prelude::*;

/// Signals emitted by the controller. None carry a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ControlEvent {
    /// The camera moved. Hosts usually redraw on this.
    Change,
    /// An interaction began.
    Start,
    /// An interaction ended.
    End,
}

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    event: ControlEvent,
    callback: Box<dyn FnMut()>,
}

/// Callbacks registered per [`ControlEvent`].
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

impl Listeners {
    /// Call `callback` every time `event` is emitted.
    pub fn subscribe(&mut self, event: ControlEvent, callback: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            event,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Call every listener of `event`, in subscription order.
    pub fn notify(&mut self, event: ControlEvent) {
        self.listeners
            .iter_mut()
            .filter(|listener| listener.event == event)
            .for_each(|listener| (listener.callback)());
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Are there no listeners?
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[test]
    fn notifies_matching_listeners_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();
        for (event, tag) in [
            (ControlEvent::Start, "start a"),
            (ControlEvent::Change, "change"),
            (ControlEvent::Start, "start b"),
        ] {
            let log = log.clone();
            listeners.subscribe(event, move || log.borrow_mut().push(tag));
        }

        listeners.notify(ControlEvent::Start);
        listeners.notify(ControlEvent::End);
        assert_eq!(*log.borrow(), ["start a", "start b"]);
    }

    #[test]
    fn unsubscribe_by_handle() {
        let count = Rc::new(RefCell::new(0));
        let mut listeners = Listeners::default();
        let id = {
            let count = count.clone();
            listeners.subscribe(ControlEvent::Change, move || *count.borrow_mut() += 1)
        };
        listeners.notify(ControlEvent::Change);
        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.notify(ControlEvent::Change);
        assert_eq!(*count.borrow(), 1);
        assert!(listeners.is_empty());
    }
}
