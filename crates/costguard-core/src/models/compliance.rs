//! Tag compliance policy and finding models

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Required tags and the allow-list for the environment tag
///
/// Built once per run and never mutated; evaluation only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompliancePolicy {
    required_tag_keys: BTreeSet<String>,
    environment_tag_key: String,
    allowed_environment_values: BTreeSet<String>,
}

impl CompliancePolicy {
    /// Create a policy
    pub fn new(
        required_tag_keys: impl IntoIterator<Item = impl Into<String>>,
        environment_tag_key: impl Into<String>,
        allowed_environment_values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            required_tag_keys: required_tag_keys.into_iter().map(Into::into).collect(),
            environment_tag_key: environment_tag_key.into(),
            allowed_environment_values: allowed_environment_values
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }

    /// Tags every resource must carry with a non-blank value
    pub fn required_tag_keys(&self) -> &BTreeSet<String> {
        &self.required_tag_keys
    }

    /// The tag holding the environment class
    pub fn environment_tag_key(&self) -> &str {
        &self.environment_tag_key
    }

    /// Values the environment tag may hold
    pub fn allowed_environment_values(&self) -> &BTreeSet<String> {
        &self.allowed_environment_values
    }

    /// Whether `value` is an allowed environment value
    pub fn allows_environment(&self, value: &str) -> bool {
        self.allowed_environment_values.contains(value)
    }
}

/// A resource that violates the compliance policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFinding {
    /// Resource identifier
    #[serde(rename = "arn")]
    pub resource_id: String,

    /// The resource's tags at evaluation time
    pub tags: BTreeMap<String, String>,

    /// Required keys that are absent or blank
    #[serde(rename = "missing")]
    pub missing_keys: BTreeSet<String>,

    /// Environment tag value outside the allow-list
    #[serde(rename = "invalid_environment")]
    pub invalid_environment_value: Option<String>,
}
