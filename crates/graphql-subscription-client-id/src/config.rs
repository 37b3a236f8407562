use async_graphql::dynamic::SchemaBuilder;

use crate::ConfigError;

/// Engine limits applied to the schema hosting client id subscriptions.
///
/// ```toml
/// introspection = false
/// depth_limit = 16
/// complexity_limit = 500
/// ```
#[derive(Debug, serde::Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub introspection: bool,
    pub depth_limit: Option<usize>,
    pub complexity_limit: Option<usize>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            introspection: true,
            depth_limit: None,
            complexity_limit: None,
        }
    }
}

impl SchemaConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn apply(&self, mut builder: SchemaBuilder) -> SchemaBuilder {
        if !self.introspection {
            builder = builder.disable_introspection();
        }

        if let Some(depth) = self.depth_limit {
            builder = builder.limit_depth(depth);
        }

        if let Some(complexity) = self.complexity_limit {
            builder = builder.limit_complexity(complexity);
        }

        builder
    }
}
