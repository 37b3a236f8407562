use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_graphql::Value;
use slab::Slab;

pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

pub type SharedEventSource = Arc<dyn EventSource>;

/// Identifies a registered listener, returned by [`EventSource::register_listener`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerToken {
    topic: String,
    key: usize,
}

impl ListenerToken {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// The side channel `subscribe` resolvers register with to receive later updates.
///
/// The resolvers in this crate never own an event source. Callers attach one to the request
/// data, usually as a [`SharedEventSource`], and `subscribe` resolvers pick it up from the
/// resolver context.
pub trait EventSource: Send + Sync {
    fn register_listener(&self, topic: &str, listener: Listener) -> ListenerToken;

    /// Returns whether the listener was still registered.
    fn unregister(&self, token: &ListenerToken) -> bool;
}

/// Process local [`EventSource`], delivering published values synchronously to the listeners
/// of a topic.
#[derive(Default)]
pub struct InMemoryEventSource {
    topics: Mutex<HashMap<String, Slab<Listener>>>,
}

impl InMemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands `value` to every listener of `topic` and returns how many there were.
    pub fn publish(&self, topic: &str, value: Value) -> usize {
        // Listeners run outside of the lock, they may register or unregister themselves.
        let listeners = self.with_topics(|topics| {
            topics
                .get(topic)
                .map(|listeners| listeners.iter().map(|(_, listener)| listener.clone()).collect::<Vec<_>>())
                .unwrap_or_default()
        });

        tracing::trace!(topic, listeners = listeners.len(), "publishing event");

        for listener in &listeners {
            listener(&value);
        }

        listeners.len()
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        self.with_topics(|topics| topics.get(topic).map_or(0, Slab::len))
    }

    fn with_topics<R>(&self, f: impl FnOnce(&mut HashMap<String, Slab<Listener>>) -> R) -> R {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut topics)
    }
}

impl EventSource for InMemoryEventSource {
    fn register_listener(&self, topic: &str, listener: Listener) -> ListenerToken {
        let key = self.with_topics(|topics| topics.entry(topic.to_owned()).or_default().insert(listener));
        let token = ListenerToken {
            topic: topic.to_owned(),
            key,
        };

        tracing::trace!(topic, key, "registered listener");
        token
    }

    fn unregister(&self, token: &ListenerToken) -> bool {
        self.with_topics(|topics| {
            let Some(listeners) = topics.get_mut(&token.topic) else {
                return false;
            };

            // Keys of removed listeners get reused by later registrations on the same topic.
            let removed = listeners.try_remove(token.key).is_some();

            if listeners.is_empty() {
                topics.remove(&token.topic);
            }

            removed
        })
    }
}
