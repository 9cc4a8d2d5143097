//! Built-in per-object-type adapters.
//!
//! Each adapter is a thin plugin over the shared machinery: a collection
//! name, a dedup id, a payload schema, and the mapping onto entity rows.
//! Cheap flat types (labels, milestones, releases) persist whole pages
//! through the bulk persister; everything else dispatches one import task per
//! object.

mod attachments;
mod collaborators;
mod issues;
mod labels;
mod milestones;
mod notes;
mod protected_branches;
mod pull_requests;
mod releases;
mod reviews;

pub use attachments::AttachmentAdapter;
pub use collaborators::CollaboratorAdapter;
pub use issues::IssueAdapter;
pub use labels::LabelAdapter;
pub use milestones::MilestoneAdapter;
pub use notes::NoteAdapter;
pub use protected_branches::ProtectedBranchAdapter;
pub use pull_requests::PullRequestAdapter;
pub use releases::ReleaseAdapter;
pub use reviews::ReviewAdapter;

use crate::error::ImportTaskError;
use hublift_core::{ObjectRepresentation, UtcDateTime};
use serde::de::DeserializeOwned;

pub(crate) fn parse_payload<T: DeserializeOwned>(
    representation: &ObjectRepresentation,
) -> Result<T, ImportTaskError> {
    serde_json::from_value(representation.data.clone())
        .map_err(|e| ImportTaskError::InvalidPayload(e.to_string()))
}

pub(crate) fn timestamp_or_now(value: Option<UtcDateTime>) -> UtcDateTime {
    value.unwrap_or_else(chrono::Utc::now)
}
