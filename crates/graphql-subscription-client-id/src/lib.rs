//! Subscription fields carrying a client supplied correlation id, the `clientSubscriptionId`,
//! for async-graphql dynamic schemas.
//!
//! A field is described by a [`SubscriptionFieldSpec`]: a `subscribe` resolver establishing the
//! initial value (and registering with whatever delivers later ones), and an optional
//! `get_payload` transform shaping that value. [`subscription_with_client_id`] turns it into the
//! input type, payload type and root field to register in a schema, and the
//! [`SubscriptionExecutor`] runs a document once to produce its initial payload.

mod config;
mod definition;
mod error;
mod event_source;
mod executor;
mod field;
mod payload;

pub use config::SchemaConfig;
pub use definition::{InputField, OutputField, PayloadFuture, SubscriptionFieldSpec, SubscriptionInput};
pub use error::{ConfigError, ConfigurationError, FieldSide};
pub use event_source::{EventSource, InMemoryEventSource, Listener, ListenerToken, SharedEventSource};
pub use executor::{graphql, graphql_subscribe, SubscriptionExecutor, SubscriptionRequest};
pub use field::{subscription_with_client_id, FieldConfig};
pub use payload::{merge_payload, payload_object};

/// Name of the correlation id field, on both the input and the payload.
pub const CLIENT_SUBSCRIPTION_ID: &str = "clientSubscriptionId";
