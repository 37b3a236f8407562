#![allow(clippy::panic)]

mod schema_shape;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

use async_graphql::{
    dynamic::{Field, FieldFuture, Object, Schema, SchemaBuilder, Subscription, TypeRef},
    Value,
};
use graphql_subscription_client_id::FieldConfig;
use tokio::runtime::Runtime;

#[ctor::ctor]
fn setup_logging() {
    let filter = tracing_subscriber::filter::EnvFilter::builder()
        .parse(std::env::var("RUST_LOG").unwrap_or("graphql_subscription_client_id=debug".to_string()))
        .unwrap();
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .without_time()
        .init();
}

pub fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    })
}

/// Counts calls, handed to resolvers through the request data.
#[derive(Clone, Default)]
pub struct Spy(Arc<AtomicUsize>);

impl Spy {
    pub fn call(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Distinguishes the `get_payload` spy from the `subscribe` one in the request data.
#[derive(Clone, Default)]
pub struct PayloadSpy(pub Spy);

pub fn string() -> TypeRef {
    TypeRef::named(TypeRef::STRING)
}

pub fn query() -> Object {
    Object::new("Query").field(Field::new("dummy", string(), |_| {
        FieldFuture::new(async { Ok(None::<Value>) })
    }))
}

pub fn schema_builder(fields: Vec<(&str, FieldConfig)>) -> SchemaBuilder {
    let subscription = fields
        .iter()
        .fold(Subscription::new("Subscription"), |subscription, (name, config)| {
            subscription.field(config.field(*name))
        });

    fields.into_iter().fold(
        Schema::build("Query", None, Some("Subscription"))
            .register(query())
            .register(subscription),
        |builder, (_, config)| config.register(builder),
    )
}

pub fn schema(fields: Vec<(&str, FieldConfig)>) -> Schema {
    schema_builder(fields).finish().unwrap()
}
