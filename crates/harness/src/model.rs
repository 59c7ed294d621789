//! Payloads exchanged with the todo manager

use serde::{Deserialize, Deserializer, Serialize};

/// A record whose mutable state can be put back after a test
pub trait TrackedRecord {
    /// Fields written back during reconciliation
    type Fields;

    fn id(&self) -> &str;

    fn tracked_fields(&self) -> Self::Fields;
}

/// Link to another resource by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: String,
}

/// A todo as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        rename = "doneStatus",
        default,
        deserialize_with = "bool_or_string"
    )]
    pub done_status: bool,
    /// Projects this todo belongs to; not restored by reconciliation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasksof: Vec<IdRef>,
}

/// Body for creating, amending or replacing a todo. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "doneStatus", skip_serializing_if = "Option::is_none")]
    pub done_status: Option<bool>,
}

impl TodoFields {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        done_status: bool,
    ) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            done_status: Some(done_status),
        }
    }

    pub fn title_only(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

impl TrackedRecord for TodoRecord {
    type Fields = TodoFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn tracked_fields(&self) -> TodoFields {
        TodoFields::new(self.title.clone(), self.description.clone(), self.done_status)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoList {
    #[serde(default)]
    pub todos: Option<Vec<TodoRecord>>,
}

impl TodoList {
    /// An absent list reads as empty
    pub fn into_records(self) -> Vec<TodoRecord> {
        self.todos.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub completed: bool,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<IdRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ProjectFields {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

impl TrackedRecord for ProjectRecord {
    type Fields = ProjectFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn tracked_fields(&self) -> ProjectFields {
        ProjectFields {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            completed: Some(self.completed),
            active: Some(self.active),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Option<Vec<ProjectRecord>>,
}

impl ProjectList {
    pub fn into_records(self) -> Vec<ProjectRecord> {
        self.projects.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorMessages {
    #[serde(rename = "errorMessages", default)]
    pub error_messages: Vec<String>,
}

/// The service renders booleans as `"true"`/`"false"` strings.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got {:?}",
                other
            ))),
        },
    }
}
