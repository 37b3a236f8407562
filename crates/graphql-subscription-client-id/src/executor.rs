use std::{
    any::Any,
    sync::{Arc, Mutex, PoisonError},
};

use async_graphql::{
    dynamic::{DynamicRequest, DynamicRequestExt, FieldValue, Schema},
    Name, Request, Response, ServerError, Value, Variables,
};
use futures_util::StreamExt;

/// Request data marking an execution started by [`SubscriptionExecutor::subscribe`].
///
/// Client id subscription fields only call their `subscribe` resolver when it is present.
pub(crate) struct SubscribePhase;

/// Response keys of the client id root fields whose resolution failed during one execution.
///
/// The engine drops the whole `data` of a subscription response when its root field fails,
/// although client id fields are nullable. These keys are used to put them back as `null`.
#[derive(Default)]
pub(crate) struct RootFieldFailures(Mutex<Vec<String>>);

impl RootFieldFailures {
    pub(crate) fn record(&self, response_key: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(response_key.to_owned());
    }

    fn restore_nulls(&self, mut response: Response) -> Response {
        let failed = std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner));

        if !failed.is_empty() && response.data == Value::Null {
            tracing::debug!(fields = ?failed, "client id root fields failed");
            response.data = Value::Object(failed.into_iter().map(|key| (Name::new(key), Value::Null)).collect());
        }

        response
    }
}

/// A document to run once against a schema, with its variables, caller data and root value.
pub struct SubscriptionRequest {
    request: Request,
    root_value: Option<Value>,
}

impl SubscriptionRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            request: Request::new(query),
            root_value: None,
        }
    }

    #[must_use]
    pub fn variables(self, variables: serde_json::Value) -> Self {
        Self {
            request: self.request.variables(Variables::from_json(variables)),
            ..self
        }
    }

    #[must_use]
    pub fn operation_name(self, name: impl Into<String>) -> Self {
        Self {
            request: self.request.operation_name(name),
            ..self
        }
    }

    /// Attaches caller data, reachable from resolvers with `ctx.data::<D>()`.
    #[must_use]
    pub fn data<D: Any + Send + Sync>(self, data: D) -> Self {
        Self {
            request: self.request.data(data),
            ..self
        }
    }

    /// The value root fields resolve against.
    #[must_use]
    pub fn root_value(self, value: impl Into<Value>) -> Self {
        Self {
            root_value: Some(value.into()),
            ..self
        }
    }

    fn into_dynamic(self) -> DynamicRequest {
        match self.root_value {
            Some(root_value) => self.request.root_value(FieldValue::value(root_value)),
            None => self.request.into(),
        }
    }
}

impl From<Request> for SubscriptionRequest {
    fn from(request: Request) -> Self {
        Self {
            request,
            root_value: None,
        }
    }
}

impl From<&str> for SubscriptionRequest {
    fn from(query: &str) -> Self {
        Self::new(query)
    }
}

impl From<String> for SubscriptionRequest {
    fn from(query: String) -> Self {
        Self::new(query)
    }
}

/// Runs documents once against a dynamic schema.
///
/// Parsing, validation and field scheduling are left to async-graphql. Only the first response
/// of an execution is kept: the initial payload of a subscription, or the single response of a
/// query or mutation. Nothing keeps streaming afterwards; later values are the business of
/// whatever the `subscribe` resolvers registered with.
#[derive(Clone)]
pub struct SubscriptionExecutor {
    schema: Schema,
}

impl SubscriptionExecutor {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Produces the initial payload of the subscription fields of the document.
    ///
    /// Client id subscription fields call their `subscribe`, then `get_payload` resolvers.
    pub async fn subscribe(&self, request: impl Into<SubscriptionRequest>) -> Response {
        let request: SubscriptionRequest = request.into();
        let request = request.data(SubscribePhase);
        tracing::debug!("executing document for its initial payload");
        execute_once(&self.schema, request).await
    }

    /// Ordinary execution of the document.
    ///
    /// Client id subscription fields don't call `subscribe`. They resolve against the root value
    /// of the request instead, which is how an update received from an event source gets
    /// rendered with the selection of the original document.
    pub async fn resolve(&self, request: impl Into<SubscriptionRequest>) -> Response {
        execute_once(&self.schema, request.into()).await
    }
}

/// Shorthand for [`SubscriptionExecutor::subscribe`].
pub async fn graphql_subscribe(schema: &Schema, request: impl Into<SubscriptionRequest>) -> Response {
    SubscriptionExecutor::new(schema.clone()).subscribe(request).await
}

/// Shorthand for [`SubscriptionExecutor::resolve`].
pub async fn graphql(schema: &Schema, request: impl Into<SubscriptionRequest>) -> Response {
    SubscriptionExecutor::new(schema.clone()).resolve(request).await
}

async fn execute_once(schema: &Schema, request: SubscriptionRequest) -> Response {
    let failures = Arc::new(RootFieldFailures::default());
    let request = request.data(failures.clone());

    // The stream entry point is the only one accepting subscription operations. It yields a
    // single response for queries and mutations.
    let mut responses = std::pin::pin!(schema.execute_stream(request.into_dynamic()));

    let response = match responses.next().await {
        Some(response) => response,
        None => Response::from_errors(vec![ServerError::new("The operation did not produce any response", None)]),
    };

    failures.restore_nulls(response)
}
