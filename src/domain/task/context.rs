use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied configuration attached to a task
///
/// Only the named fields are interpreted by the coordinator. Any other key
/// submitted with the task is kept in `extra`, persisted, and handed to the
/// execution capability untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required_capabilities: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub specializations: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub estimated_subtasks: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl TaskContext {
    pub fn with_required_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.required_capabilities = capabilities.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_specializations(mut self, specializations: &[&str]) -> Self {
        self.specializations = specializations.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_estimated_subtasks(mut self, estimated_subtasks: u32) -> Self {
        self.estimated_subtasks = estimated_subtasks;
        self
    }

    /// Flattened key/value view handed to the execution capability
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognized_keys_are_typed() {
        let context: TaskContext = serde_json::from_value(json!({
            "required_capabilities": ["code_generation", "testing"],
            "specializations": ["rust"],
            "estimated_subtasks": 4
        }))
        .unwrap();

        assert_eq!(context.required_capabilities.len(), 2);
        assert!(context.required_capabilities.contains("testing"));
        assert!(context.specializations.contains("rust"));
        assert_eq!(context.estimated_subtasks, 4);
        assert!(context.extra.is_empty());
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let context: TaskContext = serde_json::from_value(json!({
            "required_capabilities": ["web_search"],
            "repository": "https://example.com/repo.git",
            "labels": {"team": "infra"}
        }))
        .unwrap();

        assert_eq!(context.extra.len(), 2);
        assert_eq!(context.extra["repository"], json!("https://example.com/repo.git"));

        let map = context.to_map();
        assert_eq!(map["labels"], json!({"team": "infra"}));
        assert_eq!(map["required_capabilities"], json!(["web_search"]));
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let context: TaskContext = serde_json::from_value(json!({})).unwrap();
        assert_eq!(context, TaskContext::default());
        assert!(context.to_map().is_empty());
    }
}
