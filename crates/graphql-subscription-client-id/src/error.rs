/// Raised by [`subscription_with_client_id`](crate::subscription_with_client_id) before any
/// document gets executed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("A client id subscription requires a non-empty name")]
    MissingName,
    #[error("Subscription '{name}' is missing its output fields")]
    MissingOutputFields { name: String },
    #[error("Subscription '{name}' is missing its subscribe resolver")]
    MissingSubscribe { name: String },
    #[error("Subscription '{name}' declares the reserved field '{field}' on {side}")]
    ReservedFieldName {
        name: String,
        field: &'static str,
        side: FieldSide,
    },
    #[error("Subscription '{name}' declares the field '{field}' more than once on {side}")]
    DuplicateField { name: String, field: String, side: FieldSide },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSide {
    Input,
    Output,
}

impl std::fmt::Display for FieldSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldSide::Input => f.write_str("its input"),
            FieldSide::Output => f.write_str("its output"),
        }
    }
}

/// Invalid [`SchemaConfig`](crate::SchemaConfig) source.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not parse schema configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
