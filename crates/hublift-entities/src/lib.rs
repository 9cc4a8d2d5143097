//! Sea-ORM entities for imported records.
//!
//! One table per importable object type, plus the placeholder-reference
//! ledger used for deferred identity reconciliation. All imported tables
//! carry the external platform id (or natural key) alongside the local
//! primary key so re-imports can be detected.

pub mod attachments;
pub mod collaborators;
pub mod issues;
pub mod labels;
pub mod milestones;
pub mod notes;
pub mod placeholder_references;
pub mod protected_branches;
pub mod pull_requests;
pub mod releases;
