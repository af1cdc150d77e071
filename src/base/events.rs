//! Event emitter for observer notifications.
//!
//! Subscribers are closures invoked with the event and mutable access to the
//! owning object. Owners emit via the take/emit pattern so a subscriber can
//! freely mutate the owner without aliasing the subscriber list:
//!
//! ```ignore
//! let emitter = std::mem::take(&mut self.events);
//! self.events = emitter.emit(event, self);
//! ```

type Subscriber<E, O> = Box<dyn Fn(&E, &mut O)>;

/// Holds subscribers for events of type `E` on an owner of type `O`.
pub struct EventEmitter<E, O> {
    subscribers: Vec<Subscriber<E, O>>,
}

impl<E, O> EventEmitter<E, O> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a subscriber. Subscribers run in registration order.
    pub fn subscribe(&mut self, subscriber: impl Fn(&E, &mut O) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Deliver an event to every subscriber, returning the emitter so the
    /// owner can store it back after a `std::mem::take`.
    pub fn emit(self, event: E, owner: &mut O) -> Self {
        for subscriber in &self.subscribers {
            subscriber(&event, owner);
        }
        self
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<E, O> Default for EventEmitter<E, O> {
    fn default() -> Self {
        Self::new()
    }
}
