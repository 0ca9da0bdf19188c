use serde::{Deserialize, Serialize};

/// Identity and result destinations of the inspector run by this agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectorConfig {
    /// Carried as `author` on every content message.
    #[serde(default = "default_author")]
    pub author: String,

    #[serde(default = "default_content_queue")]
    pub content_queue: String,

    #[serde(default = "default_attribute_queue")]
    pub attribute_queue: String,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            author: default_author(),
            content_queue: default_content_queue(),
            attribute_queue: default_attribute_queue(),
        }
    }
}

/// Alert intake settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Destination of dispatched inspection tasks.
    #[serde(default = "default_task_queue")]
    pub task_queue: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            task_queue: default_task_queue(),
        }
    }
}

fn default_author() -> String {
    "ipInspector".to_string()
}

fn default_content_queue() -> String {
    "content".to_string()
}

fn default_attribute_queue() -> String {
    "attribute".to_string()
}

fn default_task_queue() -> String {
    "task".to_string()
}
