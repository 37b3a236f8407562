use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use async_graphql::{
    dynamic::{ResolverContext, TypeRef},
    Name, Value,
};
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::CLIENT_SUBSCRIPTION_ID;

pub(crate) type SubscribeFn =
    dyn for<'a, 'b> Fn(SubscriptionInput, &'a ResolverContext<'b>) -> PayloadFuture<'a> + Send + Sync;

pub(crate) type GetPayloadFn =
    dyn for<'a, 'b> Fn(Value, &'a SubscriptionInput, &'a ResolverContext<'b>) -> PayloadFuture<'a> + Send + Sync;

/// The deferred value produced by a `subscribe` or `get_payload` resolver.
///
/// `Ok(None)` and `Ok(Some(Value::Null))` are both treated as null.
pub struct PayloadFuture<'a>(BoxFuture<'a, async_graphql::Result<Option<Value>>>);

impl<'a> PayloadFuture<'a> {
    pub fn new<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = async_graphql::Result<Option<Value>>> + Send + 'a,
    {
        Self(Box::pin(future))
    }

    /// A payload that is already known.
    pub fn from_value(value: Option<Value>) -> Self {
        Self::new(std::future::ready(Ok(value)))
    }
}

impl Future for PayloadFuture<'_> {
    type Output = async_graphql::Result<Option<Value>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

/// A lazily evaluated list of field definitions.
///
/// Evaluated exactly once, when the field gets built, so types can reference each other
/// before all of them exist.
pub(crate) struct Thunk<T>(Box<dyn FnOnce() -> T + Send>);

impl<T: Send + 'static> Thunk<T> {
    pub(crate) fn new(f: impl FnOnce() -> T + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub(crate) fn ready(value: T) -> Self {
        Self::new(move || value)
    }

    pub(crate) fn force(self) -> T {
        (self.0)()
    }
}

/// A field of the generated `<name>Input` type.
#[derive(Debug, Clone)]
pub struct InputField {
    pub(crate) name: String,
    pub(crate) ty: TypeRef,
    pub(crate) description: Option<String>,
    pub(crate) default_value: Option<Value>,
}

impl InputField {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: None,
            default_value: None,
        }
    }

    #[must_use]
    pub fn description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        Self {
            default_value: Some(value.into()),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A field of the generated `<name>Payload` type. It resolves by reading the key of the same
/// name from the payload object.
#[derive(Debug, Clone)]
pub struct OutputField {
    pub(crate) name: String,
    pub(crate) ty: TypeRef,
    pub(crate) description: Option<String>,
    pub(crate) deprecation: Option<String>,
}

impl OutputField {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            description: None,
            deprecation: None,
        }
    }

    #[must_use]
    pub fn description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn deprecation(self, reason: impl Into<String>) -> Self {
        Self {
            deprecation: Some(reason.into()),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The `input` argument of a client id subscription, as handed to its resolvers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionInput {
    fields: IndexMap<Name, Value>,
}

impl SubscriptionInput {
    pub(crate) fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields: fields.clone() },
            _ => Self::default(),
        }
    }

    /// The correlation token sent by the client, if any.
    pub fn client_subscription_id(&self) -> Option<&str> {
        match self.fields.get(CLIENT_SUBSCRIPTION_ID) {
            Some(Value::String(id)) => Some(id),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, async_graphql::DeserializerError> {
        async_graphql::from_value(Value::Object(self.fields.clone()))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Declarative description of a client id subscription field.
///
/// ```ignore
/// let spec = SubscriptionFieldSpec::new("FooSubscription")
///     .output_fields(vec![OutputField::new("value", TypeRef::named(TypeRef::STRING))])
///     .subscribe(|input, _ctx| PayloadFuture::from_value(Some(input.into_value())));
/// ```
pub struct SubscriptionFieldSpec {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) deprecation_reason: Option<String>,
    pub(crate) input_fields: Thunk<Vec<InputField>>,
    pub(crate) output_fields: Option<Thunk<Vec<OutputField>>>,
    pub(crate) subscribe: Option<Arc<SubscribeFn>>,
    pub(crate) get_payload: Option<Arc<GetPayloadFn>>,
}

impl SubscriptionFieldSpec {
    /// `name` is the base of the generated `<name>Input` and `<name>Payload` type names.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation_reason: None,
            input_fields: Thunk::ready(Vec::new()),
            output_fields: None,
            subscribe: None,
            get_payload: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecation_reason(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn input_fields(mut self, fields: Vec<InputField>) -> Self {
        self.input_fields = Thunk::ready(fields);
        self
    }

    #[must_use]
    pub fn input_fields_with<F>(mut self, fields: F) -> Self
    where
        F: FnOnce() -> Vec<InputField> + Send + 'static,
    {
        self.input_fields = Thunk::new(fields);
        self
    }

    #[must_use]
    pub fn output_fields(mut self, fields: Vec<OutputField>) -> Self {
        self.output_fields = Some(Thunk::ready(fields));
        self
    }

    #[must_use]
    pub fn output_fields_with<F>(mut self, fields: F) -> Self
    where
        F: FnOnce() -> Vec<OutputField> + Send + 'static,
    {
        self.output_fields = Some(Thunk::new(fields));
        self
    }

    /// Establishes the initial value of the subscription, and registers with whatever source
    /// delivers the later ones.
    #[must_use]
    pub fn subscribe<F>(mut self, subscribe: F) -> Self
    where
        F: for<'a, 'b> Fn(SubscriptionInput, &'a ResolverContext<'b>) -> PayloadFuture<'a> + Send + Sync + 'static,
    {
        self.subscribe = Some(Arc::new(subscribe));
        self
    }

    /// Maps the non-null value produced by `subscribe` into the payload shape.
    #[must_use]
    pub fn get_payload<F>(mut self, get_payload: F) -> Self
    where
        F: for<'a, 'b> Fn(Value, &'a SubscriptionInput, &'a ResolverContext<'b>) -> PayloadFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.get_payload = Some(Arc::new(get_payload));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SubscriptionFieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionFieldSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("deprecation_reason", &self.deprecation_reason)
            .field("has_output_fields", &self.output_fields.is_some())
            .field("has_subscribe", &self.subscribe.is_some())
            .field("has_get_payload", &self.get_payload.is_some())
            .finish_non_exhaustive()
    }
}
