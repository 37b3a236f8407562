use std::{collections::HashSet, sync::Arc};

use async_graphql::{
    dynamic::{
        FieldValue, InputObject, InputValue, Object, ResolverContext, SchemaBuilder, SubscriptionField,
        SubscriptionFieldFuture, TypeRef,
    },
    Value,
};
use tracing::Instrument;

use crate::{
    definition::{GetPayloadFn, SubscribeFn},
    error::FieldSide,
    executor::{RootFieldFailures, SubscribePhase},
    payload::{merge_payload, payload_object},
    ConfigurationError, InputField, OutputField, SubscriptionFieldSpec, SubscriptionInput, CLIENT_SUBSCRIPTION_ID,
};

const INPUT_ARGUMENT: &str = "input";

/// The schema pieces generated for a client id subscription.
///
/// The input and payload types must be registered with [`FieldConfig::register`], and the
/// root field obtained with [`FieldConfig::field`] added to the subscription type.
pub struct FieldConfig {
    input: InputObject,
    payload: Object,
    resolver: Arc<ClientIdResolver>,
}

impl std::fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldConfig")
            .field("name", &self.resolver.name)
            .field("input_type", &self.resolver.input_type)
            .field("payload_type", &self.resolver.payload_type)
            .finish_non_exhaustive()
    }
}

impl FieldConfig {
    pub fn name(&self) -> &str {
        &self.resolver.name
    }

    pub fn input_type_name(&self) -> &str {
        &self.resolver.input_type
    }

    pub fn payload_type_name(&self) -> &str {
        &self.resolver.payload_type
    }

    /// The field to add to the subscription root type, under `field_name`.
    pub fn field(&self, field_name: impl Into<String>) -> SubscriptionField {
        let resolver = self.resolver.clone();

        let mut field = SubscriptionField::new(field_name, TypeRef::named(&resolver.payload_type), move |ctx| {
            let resolver = resolver.clone();
            SubscriptionFieldFuture::new(async move {
                // One value per execution: later updates are delivered by whatever `subscribe`
                // registered with, not by this stream.
                let payload = match resolver.resolve(&ctx).await {
                    Ok(payload) => Ok(payload.map_or(FieldValue::NULL, FieldValue::value)),
                    Err(error) => {
                        if let Some(failures) = ctx.ctx.data_opt::<Arc<RootFieldFailures>>() {
                            let field = ctx.ctx.field();
                            failures.record(field.alias().unwrap_or(field.name()));
                        }
                        Err(error)
                    }
                };
                Ok(futures_util::stream::once(std::future::ready(payload)))
            })
        })
        .argument(InputValue::new(
            INPUT_ARGUMENT,
            TypeRef::named_nn(&self.resolver.input_type),
        ));

        if let Some(description) = &self.resolver.description {
            field = field.description(description);
        }

        if let Some(reason) = &self.resolver.deprecation_reason {
            field = field.deprecation(Some(reason.as_str()));
        }

        field
    }

    /// Registers the `<name>Input` and `<name>Payload` types.
    pub fn register(self, builder: SchemaBuilder) -> SchemaBuilder {
        builder.register(self.input).register(self.payload)
    }
}

struct ClientIdResolver {
    name: String,
    input_type: String,
    payload_type: String,
    description: Option<String>,
    deprecation_reason: Option<String>,
    subscribe: Arc<SubscribeFn>,
    get_payload: Option<Arc<GetPayloadFn>>,
}

impl ClientIdResolver {
    /// The merged payload, `None` when the field resolves to null.
    async fn resolve(&self, ctx: &ResolverContext<'_>) -> async_graphql::Result<Option<Value>> {
        let input = SubscriptionInput::from_value(ctx.args.try_get(INPUT_ARGUMENT)?.as_value());
        let client_subscription_id = input.client_subscription_id().map(str::to_owned);

        let payload = if ctx.ctx.data_opt::<SubscribePhase>().is_some() {
            let span = tracing::debug_span!(
                "subscribe",
                subscription = %self.name,
                client_subscription_id = client_subscription_id.as_deref(),
            );
            self.run_subscribe(&input, ctx).instrument(span).await?
        } else {
            // Outside of the subscribe phase the payload is whatever the execution was started with.
            non_null(ctx.parent_value.as_value().cloned())
        };

        Ok(payload.map(|payload| merge_payload(payload, client_subscription_id.as_deref())))
    }

    async fn run_subscribe(
        &self,
        input: &SubscriptionInput,
        ctx: &ResolverContext<'_>,
    ) -> async_graphql::Result<Option<Value>> {
        let Some(raw) = non_null((self.subscribe)(input.clone(), ctx).await?) else {
            tracing::debug!("subscribe produced no initial value");
            return Ok(None);
        };

        match &self.get_payload {
            Some(get_payload) => Ok(non_null(get_payload(raw, input, ctx).await?)),
            None => Ok(Some(raw)),
        }
    }
}

fn non_null(value: Option<Value>) -> Option<Value> {
    value.filter(|value| !matches!(value, Value::Null))
}

/// Builds a subscription field whose input and payload carry a `clientSubscriptionId`.
///
/// The input and output field thunks are evaluated here, exactly once.
pub fn subscription_with_client_id(spec: SubscriptionFieldSpec) -> Result<FieldConfig, ConfigurationError> {
    let SubscriptionFieldSpec {
        name,
        description,
        deprecation_reason,
        input_fields,
        output_fields,
        subscribe,
        get_payload,
    } = spec;

    if name.trim().is_empty() {
        return Err(ConfigurationError::MissingName);
    }

    let Some(output_fields) = output_fields else {
        return Err(ConfigurationError::MissingOutputFields { name });
    };

    let Some(subscribe) = subscribe else {
        return Err(ConfigurationError::MissingSubscribe { name });
    };

    let input_fields = input_fields.force();
    let output_fields = output_fields.force();

    check_field_names(&name, input_fields.iter().map(InputField::name), FieldSide::Input)?;
    check_field_names(&name, output_fields.iter().map(OutputField::name), FieldSide::Output)?;

    let input_type = format!("{name}Input");
    let payload_type = format!("{name}Payload");

    let input = input_fields
        .into_iter()
        .fold(InputObject::new(&input_type), |object, field| {
            object.field(input_value(field))
        })
        .field(InputValue::new(
            CLIENT_SUBSCRIPTION_ID,
            TypeRef::named(TypeRef::STRING),
        ));

    let payload = payload_object(
        &payload_type,
        output_fields.into_iter().chain(std::iter::once(OutputField::new(
            CLIENT_SUBSCRIPTION_ID,
            TypeRef::named(TypeRef::STRING),
        ))),
    );

    tracing::trace!(subscription = %name, %input_type, %payload_type, "built client id subscription");

    Ok(FieldConfig {
        input,
        payload,
        resolver: Arc::new(ClientIdResolver {
            name,
            input_type,
            payload_type,
            description,
            deprecation_reason,
            subscribe,
            get_payload,
        }),
    })
}

fn input_value(field: InputField) -> InputValue {
    let InputField {
        name,
        ty,
        description,
        default_value,
    } = field;

    let mut value = InputValue::new(name, ty);

    if let Some(description) = description {
        value = value.description(description);
    }

    if let Some(default_value) = default_value {
        value = value.default_value(default_value);
    }

    value
}

fn check_field_names<'a>(
    name: &str,
    fields: impl IntoIterator<Item = &'a str>,
    side: FieldSide,
) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();

    for field in fields {
        if field == CLIENT_SUBSCRIPTION_ID {
            return Err(ConfigurationError::ReservedFieldName {
                name: name.to_owned(),
                field: CLIENT_SUBSCRIPTION_ID,
                side,
            });
        }

        if !seen.insert(field) {
            return Err(ConfigurationError::DuplicateField {
                name: name.to_owned(),
                field: field.to_owned(),
                side,
            });
        }
    }

    Ok(())
}
