//! Tagged resource data model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A cloud resource and its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedResource {
    /// Opaque resource identifier (e.g. an ARN)
    pub id: String,

    /// Tag key to tag value
    pub tags: BTreeMap<String, String>,
}

impl TaggedResource {
    /// Create a resource from an id and key/value pairs
    pub fn new<K, V>(id: impl Into<String>, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id: id.into(),
            tags: tags
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of a tag, if present
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}
