//! Default worker environment and its rendering at spawn time.

use minijinja::Environment;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Environment variables every worker receives unless the model overrides
/// them. Values are templates rendered against a [`SpawnContext`].
pub const DEFAULT_WORKER_ENVS: [(&str, &str); 6] = [
    ("WORKER_SINGLE_USE", "1"),
    ("WORKER_TTL", "{{ ttl }}"),
    ("WORKER_GRAYLOG_HOST", "{{ graylog_host }}"),
    ("WORKER_GRAYLOG_PORT", "{{ graylog_port }}"),
    ("WORKER_GRAYLOG_EXTRA_KEY", "{{ graylog_extra_key }}"),
    ("WORKER_GRAYLOG_EXTRA_VALUE", "{{ graylog_extra_value }}"),
];

/// Adds the default worker variables missing from `envs`.
///
/// Values already present are kept.
pub fn merge_default_envs(envs: &mut BTreeMap<String, String>) {
    for (name, template) in DEFAULT_WORKER_ENVS {
        envs.entry(name.to_owned())
            .or_insert_with(|| template.to_owned());
    }
}

/// Values available to worker environment templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpawnContext {
    /// Worker time-to-live, in minutes.
    pub ttl: u64,
    /// Log collector host.
    pub graylog_host: String,
    /// Log collector port; renders empty when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graylog_port: Option<u16>,
    /// Extra field name attached to every worker log line.
    pub graylog_extra_key: String,
    /// Extra field value attached to every worker log line.
    pub graylog_extra_value: String,
}

impl SpawnContext {
    /// Creates a context for workers living `ttl` minutes.
    #[must_use]
    pub fn new(ttl: u64) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    /// Sets the log collector address.
    #[must_use]
    pub fn with_graylog(mut self, host: impl Into<String>, port: u16) -> Self {
        self.graylog_host = host.into();
        self.graylog_port = Some(port);
        self
    }

    /// Sets the extra log field.
    #[must_use]
    pub fn with_graylog_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.graylog_extra_key = key.into();
        self.graylog_extra_value = value.into();
        self
    }
}

/// Error returned when a worker environment template cannot be rendered.
#[derive(Debug, Error)]
#[error("failed to render worker environment variable '{name}': {reason}")]
pub struct EnvironmentRenderError {
    /// Variable whose template failed.
    pub name: String,
    /// Template engine message.
    pub reason: String,
}

/// Renders every value of `envs` against `context`.
///
/// # Errors
///
/// Returns [`EnvironmentRenderError`] for the first value that is not a
/// valid template.
pub fn render_environment(
    envs: &BTreeMap<String, String>,
    context: &SpawnContext,
) -> Result<BTreeMap<String, String>, EnvironmentRenderError> {
    let environment = Environment::new();
    envs.iter()
        .map(|(name, template)| {
            environment
                .render_str(template, context)
                .map(|rendered| (name.clone(), rendered))
                .map_err(|error| EnvironmentRenderError {
                    name: name.clone(),
                    reason: error.to_string(),
                })
        })
        .collect()
}
