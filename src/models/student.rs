use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Server-assigned identifier. The service has handed out both document
/// ids and plain integers, so both are accepted and echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudentId {
    Number(i64),
    Text(String),
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentId::Number(n) => write!(f, "{}", n),
            StudentId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for StudentId {
    fn from(value: i64) -> Self {
        StudentId::Number(value)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        StudentId::Text(value.to_string())
    }
}

impl From<String> for StudentId {
    fn from(value: String) -> Self {
        StudentId::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id", alias = "id")]
    pub id: StudentId,
    pub name: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub attendance: bool,
    /// Fields the client does not interpret; sent back as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Student {
    pub fn new(id: impl Into<StudentId>, name: &str, attendance: bool) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            class: String::new(),
            place: String::new(),
            attendance,
            extra: Map::new(),
        }
    }

    /// Natural key used for duplicate detection.
    pub fn name_key(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudentRequest {
    pub name: String,
    pub class: String,
    pub place: String,
    pub attendance: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateAttendanceRequest<'a> {
    pub formatted_date: &'a str,
    pub students: &'a [Student],
}
