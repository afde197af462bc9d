//! Vendor extension fields (`x-*`)

use crate::error::{CoreError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Open-ended bag of `x-*` values attached to a project, service or deploy section.
///
/// Values stay untyped until a consumer asks for them; each consumption site decodes
/// into its own schema and reports shape mismatches against the extension key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(BTreeMap<String, Value>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The undecoded value, for consumers that pass it through verbatim.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Decode an optional extension into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|e| CoreError::ExtensionDecode {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_missing_is_none() {
        let ext = Extensions::new();
        let value: Option<String> = ext.get("x-aws-vpc").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_get_decodes_typed_value() {
        let ext = Extensions::new().with("x-aws-subnets", json!(["subnet-1", "subnet-2"]));
        let subnets: Vec<String> = ext.get("x-aws-subnets").unwrap().unwrap();
        assert_eq!(subnets, vec!["subnet-1", "subnet-2"]);
    }

    #[test]
    fn test_shape_mismatch_names_the_key() {
        let ext = Extensions::new().with("x-aws-vpc", json!({"id": 1}));
        let err = ext.get::<String>("x-aws-vpc").unwrap_err();
        assert!(matches!(err, CoreError::ExtensionDecode { ref key, .. } if key == "x-aws-vpc"));
    }
}
