// crates/core/src/bus.rs
//! In-process publish/subscribe for notifications between components.
//!
//! Handlers are removed when their [`Subscription`] is dropped or
//! explicitly unsubscribed, so a component's lifetime bounds its listeners.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Notifications exchanged between front-end components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Open the thesaurus editor pre-filled with `text` as a new original.
    OpenThesaurus { text: String },
    ThesaurusChanged,
    HistoryChanged,
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    handlers: Vec<(u64, Handler<E>)>,
}

pub struct EventBus<E> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

fn lock<E>(registry: &Mutex<Registry<E>>) -> MutexGuard<'_, Registry<E>> {
    // A panicking handler never runs under the lock, so poisoning is benign.
    registry.lock().unwrap_or_else(|e| e.into_inner())
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut reg = lock(&self.registry);
        let id = reg.next_id;
        reg.next_id += 1;
        reg.handlers.push((id, Arc::new(handler)));

        let weak: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    lock(&registry).handlers.retain(|(h, _)| *h != id);
                }
            })),
        }
    }

    /// Deliver `event` to every current subscriber, in subscription order.
    /// Returns the number of handlers called.
    pub fn publish(&self, event: &E) -> usize {
        // Snapshot so handlers may subscribe or unsubscribe re-entrantly.
        let handlers: Vec<Handler<E>> = lock(&self.registry)
            .handlers
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).handlers.len()
    }
}

/// Handle returned by [`EventBus::subscribe`].
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_subscribers_until_dropped() {
        let bus = EventBus::<AppEvent>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let sub = bus.subscribe(move |e: &AppEvent| {
            if let AppEvent::OpenThesaurus { text } = e {
                sink.lock().unwrap().push(text.clone());
            }
        });

        assert_eq!(bus.publish(&AppEvent::OpenThesaurus { text: "登陆".into() }), 1);
        drop(sub);
        assert_eq!(bus.publish(&AppEvent::OpenThesaurus { text: "帐号".into() }), 0);
        assert_eq!(*seen.lock().unwrap(), vec!["登陆".to_string()]);
    }

    #[test]
    fn test_explicit_unsubscribe_only_removes_own_handler() {
        let bus = EventBus::<AppEvent>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let (c1, c2) = (Arc::clone(&count), Arc::clone(&count));
        let a = bus.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let _b = bus.subscribe(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        a.unsubscribe();
        assert_eq!(bus.subscriber_count(), 1);
        bus.publish(&AppEvent::HistoryChanged);
        assert_eq!(count.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_subscription_outliving_bus_is_harmless() {
        let bus = EventBus::<AppEvent>::new();
        let sub = bus.subscribe(|_| {});
        drop(bus);
        drop(sub);
    }

    #[test]
    fn test_reentrant_publish() {
        let bus = EventBus::<AppEvent>::new();
        let inner = bus.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let _sub = bus.subscribe(move |e| {
            h.fetch_add(1, Ordering::SeqCst);
            if *e == AppEvent::ThesaurusChanged {
                inner.publish(&AppEvent::HistoryChanged);
            }
        });
        bus.publish(&AppEvent::ThesaurusChanged);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
