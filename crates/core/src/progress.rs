//! Progress status state machine.
//!
//! A progress record tracks one user against one step, section, or module.
//! Absence of a record means [`ProgressStatus::NotStarted`]; resetting
//! deletes the record rather than writing `NOT_STARTED` back.
//!
//! ```text
//!  (no record) --start--> IN_PROGRESS --complete--> COMPLETED
//!       |                                               ^
//!       +-------------------complete--------------------+
//!  any --reset--> (no record)
//! ```
//!
//! [`plan`] only decides which write is needed. Timestamps are stamped by
//! the database at write time so concurrent writers resolve last-write-wins.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const STATUS_NOT_STARTED: &str = "NOT_STARTED";
pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// All valid status strings (matches the `CHECK` constraints).
pub const VALID_STATUSES: &[&str] = &[STATUS_NOT_STARTED, STATUS_IN_PROGRESS, STATUS_COMPLETED];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_NOT_STARTED => Ok(Self::NotStarted),
            STATUS_IN_PROGRESS => Ok(Self::InProgress),
            STATUS_COMPLETED => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid progress status '{s}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => STATUS_NOT_STARTED,
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::Completed => STATUS_COMPLETED,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Status of a (user, item) pair given its optional stored record.
pub fn effective_status(stored: Option<ProgressStatus>) -> ProgressStatus {
    stored.unwrap_or(ProgressStatus::NotStarted)
}

/// A requested state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Complete,
    Reset,
}

impl Transition {
    /// Lowercase verb used in log lines and notification payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Reset => "reset",
        }
    }
}

/// The storage write a transition requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressAction {
    /// Insert a new record with the given status.
    Create(ProgressStatus),
    /// Overwrite the existing record's status (and stamp timestamps).
    Update(ProgressStatus),
    /// Remove the record, returning the pair to `NOT_STARTED`.
    Delete,
    /// Leave storage untouched.
    NoOp,
}

/// Decide the write needed to apply `transition` to a pair whose current
/// stored status is `current` (`None` = no record).
///
/// - `Start` creates or promotes to `IN_PROGRESS`; it never demotes a
///   record that is already in progress or completed.
/// - `Complete` is accepted from any state, including no record at all.
///   Completing twice re-stamps the record so the last writer's notes win.
/// - `Reset` deletes whatever exists and is harmless when nothing does.
pub fn plan(current: Option<ProgressStatus>, transition: Transition) -> ProgressAction {
    use ProgressStatus::*;

    match (transition, current) {
        (Transition::Start, None) => ProgressAction::Create(InProgress),
        (Transition::Start, Some(NotStarted)) => ProgressAction::Update(InProgress),
        (Transition::Start, Some(InProgress | Completed)) => ProgressAction::NoOp,

        (Transition::Complete, None) => ProgressAction::Create(Completed),
        (Transition::Complete, Some(_)) => ProgressAction::Update(Completed),

        (Transition::Reset, None) => ProgressAction::NoOp,
        (Transition::Reset, Some(_)) => ProgressAction::Delete,
    }
}

/// The status a pair ends up in after `action` is applied on top of `current`.
pub fn resulting_status(current: Option<ProgressStatus>, action: ProgressAction) -> ProgressStatus {
    match action {
        ProgressAction::Create(s) | ProgressAction::Update(s) => s,
        ProgressAction::Delete => ProgressStatus::NotStarted,
        ProgressAction::NoOp => effective_status(current),
    }
}
