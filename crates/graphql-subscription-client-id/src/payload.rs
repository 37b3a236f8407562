use async_graphql::{
    dynamic::{Field, FieldFuture, Object, ResolverContext},
    Name, Value,
};
use indexmap::IndexMap;

use crate::{OutputField, CLIENT_SUBSCRIPTION_ID};

/// Combines a resolved payload with the client subscription id of the input.
///
/// Object payloads keep all their fields. Any other non-null payload contributes no field,
/// the same way spreading a scalar into an object does. The `clientSubscriptionId` key is
/// always written last, so a payload can never shadow the echoed id.
pub fn merge_payload(payload: Value, client_subscription_id: Option<&str>) -> Value {
    let mut fields = match payload {
        Value::Object(fields) => fields,
        _ => IndexMap::new(),
    };

    fields.insert(
        Name::new(CLIENT_SUBSCRIPTION_ID),
        client_subscription_id.map_or(Value::Null, |id| Value::String(id.to_owned())),
    );

    Value::Object(fields)
}

/// Builds an object type whose fields resolve by reading the key of the same name from the
/// parent value.
///
/// This is what the `<name>Payload` types use, and it can be used for nested output types
/// returned inside a payload.
pub fn payload_object(type_name: impl Into<String>, fields: impl IntoIterator<Item = OutputField>) -> Object {
    fields
        .into_iter()
        .fold(Object::new(type_name), |object, field| object.field(default_field(field)))
}

pub(crate) fn default_field(field: OutputField) -> Field {
    let OutputField {
        name,
        ty,
        description,
        deprecation,
    } = field;

    let key = name.clone();
    let mut field = Field::new(name, ty, move |ctx| {
        let value = resolve_from_parent(&ctx, &key);
        FieldFuture::new(async move { Ok(value) })
    });

    if let Some(description) = description {
        field = field.description(description);
    }

    if let Some(reason) = deprecation {
        field = field.deprecation(Some(reason.as_str()));
    }

    field
}

fn resolve_from_parent(ctx: &ResolverContext<'_>, key: &str) -> Option<Value> {
    match ctx.parent_value.as_value()? {
        Value::Object(fields) => fields.get(key).filter(|value| !matches!(value, Value::Null)).cloned(),
        _ => None,
    }
}
