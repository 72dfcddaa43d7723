//! Tag compliance evaluation

use std::collections::BTreeSet;

use crate::models::{ComplianceFinding, CompliancePolicy, TaggedResource};

/// Check every resource against the policy
///
/// Findings come back in input order, one per violating resource. Nothing is
/// truncated here.
pub fn evaluate(resources: &[TaggedResource], policy: &CompliancePolicy) -> Vec<ComplianceFinding> {
    resources
        .iter()
        .filter_map(|resource| check_resource(resource, policy))
        .collect()
}

/// Evaluate a single resource, `None` when it complies
pub fn check_resource(
    resource: &TaggedResource,
    policy: &CompliancePolicy,
) -> Option<ComplianceFinding> {
    // Absent and blank are the same violation
    let missing_keys: BTreeSet<String> = policy
        .required_tag_keys()
        .iter()
        .filter(|key| resource.tag(key).map_or(true, |v| v.trim().is_empty()))
        .cloned()
        .collect();

    let invalid_environment_value = resource
        .tag(policy.environment_tag_key())
        .filter(|value| !policy.allows_environment(value))
        .map(str::to_string);

    if missing_keys.is_empty() && invalid_environment_value.is_none() {
        return None;
    }

    Some(ComplianceFinding {
        resource_id: resource.id.clone(),
        tags: resource.tags.clone(),
        missing_keys,
        invalid_environment_value,
    })
}
