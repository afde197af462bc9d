//! The resource graph produced by synthesis

use crate::error::{Result, TemplateError};
use crate::resources::Resource;
use serde::Serialize;
use std::collections::BTreeMap;

pub const FORMAT_VERSION: &str = "2010-09-09";

/// Logical id → resource, plus document metadata.
///
/// Keys are kept in a `BTreeMap` so serialization order never depends on
/// insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Metadata", skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

impl Template {
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            metadata: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    /// Add a resource under a fresh logical id.
    pub fn insert(&mut self, id: impl Into<String>, resource: Resource) -> Result<()> {
        let id = id.into();
        if self.resources.contains_key(&id) {
            return Err(TemplateError::LogicalIdCollision(id));
        }
        self.resources.insert(id, resource);
        Ok(())
    }

    /// Add a resource that several producers may emit identically.
    ///
    /// Re-inserting an equal body is a no-op; a different body under the same id
    /// is still a collision.
    pub fn insert_shared(&mut self, id: impl Into<String>, resource: Resource) -> Result<()> {
        let id = id.into();
        match self.resources.get(&id) {
            Some(existing) if *existing == resource => Ok(()),
            Some(_) => Err(TemplateError::LogicalIdCollision(id)),
            None => {
                self.resources.insert(id, resource);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Logical ids of every resource of the given CloudFormation type.
    pub fn ids_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.type_name() == type_name)
            .map(|(id, _)| id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Cluster, LogGroup};

    fn log_group(name: &str) -> Resource {
        Resource::new(LogGroup {
            log_group_name: name.to_string(),
        })
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut template = Template::new();
        template.insert("LogGroup", log_group("/a")).unwrap();

        let err = template.insert("LogGroup", log_group("/a")).unwrap_err();
        assert!(matches!(err, TemplateError::LogicalIdCollision(id) if id == "LogGroup"));
    }

    #[test]
    fn test_insert_shared_accepts_identical_body() {
        let mut template = Template::new();
        template.insert_shared("Rule", log_group("/a")).unwrap();
        template.insert_shared("Rule", log_group("/a")).unwrap();
        assert_eq!(template.len(), 1);

        assert!(template.insert_shared("Rule", log_group("/b")).is_err());
    }

    #[test]
    fn test_ids_of_type() {
        let mut template = Template::new();
        template.insert("LogGroup", log_group("/a")).unwrap();
        template
            .insert(
                "Cluster",
                Resource::new(Cluster {
                    cluster_name: "demo".to_string(),
                    tags: vec![],
                }),
            )
            .unwrap();

        let ids: Vec<_> = template.ids_of_type("AWS::ECS::Cluster").collect();
        assert_eq!(ids, vec!["Cluster"]);
    }
}
