use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Standard datetime type used across all crates
pub type UtcDateTime = chrono::DateTime<chrono::Utc>;

/// Object types that can be imported from a hosted code platform.
///
/// Each variant maps to one adapter in the registry and one membership set in
/// the deduplication cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Label,
    Milestone,
    Release,
    Issue,
    Note,
    PullRequest,
    Review,
    Collaborator,
    ProtectedBranch,
    Attachment,
}

impl ObjectType {
    /// All importable object types, in the order a full project import runs them.
    pub const ALL: [ObjectType; 10] = [
        ObjectType::Label,
        ObjectType::Milestone,
        ObjectType::Release,
        ObjectType::Collaborator,
        ObjectType::ProtectedBranch,
        ObjectType::Issue,
        ObjectType::PullRequest,
        ObjectType::Note,
        ObjectType::Review,
        ObjectType::Attachment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Label => "label",
            ObjectType::Milestone => "milestone",
            ObjectType::Release => "release",
            ObjectType::Issue => "issue",
            ObjectType::Note => "note",
            ObjectType::PullRequest => "pull_request",
            ObjectType::Review => "review",
            ObjectType::Collaborator => "collaborator",
            ObjectType::ProtectedBranch => "protected_branch",
            ObjectType::Attachment => "attachment",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "label" => Ok(ObjectType::Label),
            "milestone" => Ok(ObjectType::Milestone),
            "release" => Ok(ObjectType::Release),
            "issue" => Ok(ObjectType::Issue),
            "note" => Ok(ObjectType::Note),
            "pull_request" => Ok(ObjectType::PullRequest),
            "review" => Ok(ObjectType::Review),
            "collaborator" => Ok(ObjectType::Collaborator),
            "protected_branch" => Ok(ObjectType::ProtectedBranch),
            "attachment" => Ok(ObjectType::Attachment),
            other => Err(format!("Unknown object type: {}", other)),
        }
    }
}

/// Normalized, immutable DTO for one externally-sourced object.
///
/// Built once per fetched raw object, carried inside an import job payload and
/// consumed exactly once by the import task. Never persisted itself; the
/// import task maps it onto entity rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRepresentation {
    /// Id of the object on the external platform, as a string so types keyed
    /// by name (protected branches) fit the same shape.
    pub external_id: String,
    pub object_type: ObjectType,
    /// Raw payload as fetched; adapters deserialize this into their typed
    /// payload struct at import time.
    pub data: Value,
    pub created_at: Option<UtcDateTime>,
    pub updated_at: Option<UtcDateTime>,
}

impl ObjectRepresentation {
    pub fn new(object_type: ObjectType, external_id: impl Into<String>, data: Value) -> Self {
        let created_at = parse_timestamp(&data, "created_at");
        let updated_at = parse_timestamp(&data, "updated_at");
        Self {
            external_id: external_id.into(),
            object_type,
            data,
            created_at,
            updated_at,
        }
    }
}

/// RFC 3339 timestamp field of a raw JSON object, if present and well-formed.
pub fn parse_timestamp(data: &Value, field: &str) -> Option<UtcDateTime> {
    data.get(field)
        .and_then(|v| v.as_str())
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

/// External user identity attached to an authored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUser {
    pub id: i64,
    pub login: String,
}
