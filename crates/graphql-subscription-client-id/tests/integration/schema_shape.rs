use async_graphql::dynamic::{Schema, TypeRef};
use graphql_subscription_client_id::{
    graphql, subscription_with_client_id, InputField, OutputField, PayloadFuture, SchemaConfig,
    SubscriptionFieldSpec, SubscriptionRequest,
};
use indoc::indoc;

use crate::{runtime, schema, schema_builder, string};

fn foo_spec() -> SubscriptionFieldSpec {
    SubscriptionFieldSpec::new("FooSubscription")
        .description("Follows the races of a given track")
        .deprecation_reason("Use raceUpdates")
        .input_fields(vec![
            InputField::new("arg", string()).description("Track of the race"),
            InputField::new("limit", TypeRef::named(TypeRef::INT)).default_value(10),
        ])
        .output_fields(vec![
            OutputField::new("value", string()),
            OutputField::new("arg", string()).deprecation("Read it from the input"),
        ])
        .subscribe(|_, _| PayloadFuture::from_value(None))
}

fn foo_schema() -> Schema {
    schema(vec![("foo", subscription_with_client_id(foo_spec()).unwrap())])
}

fn introspect(schema: &Schema, query: &str) -> async_graphql::Value {
    let response = runtime().block_on(graphql(schema, SubscriptionRequest::new(query)));
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data
}

#[test]
fn input_type_gains_an_optional_client_subscription_id() {
    let data = introspect(
        &foo_schema(),
        indoc! {r#"
            {
                __type(name: "FooSubscriptionInput") {
                    kind
                    inputFields {
                        name
                        description
                        defaultValue
                        type { kind name }
                    }
                }
            }
        "#},
    );

    insta::assert_json_snapshot!(data, @r###"
    {
      "__type": {
        "kind": "INPUT_OBJECT",
        "inputFields": [
          {
            "name": "arg",
            "description": "Track of the race",
            "defaultValue": null,
            "type": {
              "kind": "SCALAR",
              "name": "String"
            }
          },
          {
            "name": "limit",
            "description": null,
            "defaultValue": "10",
            "type": {
              "kind": "SCALAR",
              "name": "Int"
            }
          },
          {
            "name": "clientSubscriptionId",
            "description": null,
            "defaultValue": null,
            "type": {
              "kind": "SCALAR",
              "name": "String"
            }
          }
        ]
      }
    }
    "###);
}

#[test]
fn payload_type_gains_a_client_subscription_id() {
    let data = introspect(
        &foo_schema(),
        indoc! {r#"
            {
                __type(name: "FooSubscriptionPayload") {
                    kind
                    fields(includeDeprecated: true) {
                        name
                        isDeprecated
                        deprecationReason
                        type { kind name }
                    }
                }
            }
        "#},
    );

    insta::assert_json_snapshot!(data, @r###"
    {
      "__type": {
        "kind": "OBJECT",
        "fields": [
          {
            "name": "value",
            "isDeprecated": false,
            "deprecationReason": null,
            "type": {
              "kind": "SCALAR",
              "name": "String"
            }
          },
          {
            "name": "arg",
            "isDeprecated": true,
            "deprecationReason": "Read it from the input",
            "type": {
              "kind": "SCALAR",
              "name": "String"
            }
          },
          {
            "name": "clientSubscriptionId",
            "isDeprecated": false,
            "deprecationReason": null,
            "type": {
              "kind": "SCALAR",
              "name": "String"
            }
          }
        ]
      }
    }
    "###);
}

#[test]
fn root_field_takes_a_required_input() {
    let data = introspect(
        &foo_schema(),
        indoc! {r"
            {
                __schema {
                    subscriptionType {
                        name
                        fields(includeDeprecated: true) {
                            name
                            description
                            isDeprecated
                            deprecationReason
                            args {
                                name
                                type { kind name ofType { kind name } }
                            }
                            type { kind name }
                        }
                    }
                }
            }
        "},
    );

    insta::assert_json_snapshot!(data, @r###"
    {
      "__schema": {
        "subscriptionType": {
          "name": "Subscription",
          "fields": [
            {
              "name": "foo",
              "description": "Follows the races of a given track",
              "isDeprecated": true,
              "deprecationReason": "Use raceUpdates",
              "args": [
                {
                  "name": "input",
                  "type": {
                    "kind": "NON_NULL",
                    "name": null,
                    "ofType": {
                      "kind": "INPUT_OBJECT",
                      "name": "FooSubscriptionInput"
                    }
                  }
                }
              ],
              "type": {
                "kind": "OBJECT",
                "name": "FooSubscriptionPayload"
              }
            }
          ]
        }
      }
    }
    "###);
}

#[test]
fn fields_without_deprecation_are_not_deprecated() {
    let plain = SubscriptionFieldSpec::new("PlainSubscription")
        .output_fields(vec![OutputField::new("value", string())])
        .subscribe(|_, _| PayloadFuture::from_value(None));
    let schema = schema(vec![("plain", subscription_with_client_id(plain).unwrap())]);

    let data = introspect(
        &schema,
        "{ __schema { subscriptionType { fields { name description isDeprecated } } } }",
    );

    insta::assert_json_snapshot!(data, @r###"
    {
      "__schema": {
        "subscriptionType": {
          "fields": [
            {
              "name": "plain",
              "description": null,
              "isDeprecated": false
            }
          ]
        }
      }
    }
    "###);
}

#[test]
fn introspection_can_be_disabled_by_config() {
    let query = r#"{ __type(name: "FooSubscriptionInput") { name } }"#;
    let found = async_graphql::value!({ "__type": { "name": "FooSubscriptionInput" } });

    assert_eq!(introspect(&foo_schema(), query), found);

    let config = SchemaConfig::from_toml("introspection = false").unwrap();
    let foo = subscription_with_client_id(foo_spec()).unwrap();
    let schema = config.apply(schema_builder(vec![("foo", foo)])).finish().unwrap();

    let response = runtime().block_on(graphql(&schema, SubscriptionRequest::new(query)));
    assert_ne!(response.data, found);
}

#[test]
fn sdl_lists_the_generated_types() {
    let sdl = foo_schema().sdl();

    assert!(sdl.contains("input FooSubscriptionInput {"), "{sdl}");
    assert!(sdl.contains("type FooSubscriptionPayload {"), "{sdl}");
    assert!(sdl.contains("foo(input: FooSubscriptionInput!): FooSubscriptionPayload"), "{sdl}");
}
