//! Shared plumbing for step and section transitions.
//!
//! Each transition reads the current record, asks
//! [`salesdesk_core::progress::plan`] which write is needed, and applies it
//! through [`ProgressRepo`].

use std::collections::HashMap;

use salesdesk_core::progress::{plan, resulting_status, ProgressAction, ProgressStatus, Transition};
use salesdesk_core::types::{DbId, Timestamp};
use salesdesk_core::validation::validate_notes;
use salesdesk_db::models::progress::{CompleteProgress, ProgressRecord};
use salesdesk_db::models::resource::{LinkedResource, Resource};
use salesdesk_db::repositories::{ProgressRepo, ProgressScope};
use salesdesk_db::DbPool;
use serde::Serialize;

use crate::error::AppResult;

/// Outcome of one transition.
#[derive(Debug)]
pub(crate) struct Applied {
    pub previous: Option<ProgressStatus>,
    /// The stored record after the write, `None` once reset.
    pub record: Option<ProgressRecord>,
}

/// Status and timestamps of one step or section for the caller.
#[derive(Debug, Serialize)]
pub struct ItemProgress {
    pub status: ProgressStatus,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub notes: Option<String>,
}

impl ItemProgress {
    pub(crate) fn from_record(record: Option<&ProgressRecord>) -> AppResult<Self> {
        Ok(match record {
            Some(r) => Self {
                status: r.parsed_status()?,
                started_at: r.started_at,
                completed_at: r.completed_at,
                notes: r.notes.clone(),
            },
            None => Self {
                status: ProgressStatus::NotStarted,
                started_at: None,
                completed_at: None,
                notes: None,
            },
        })
    }
}

/// Validate a `complete` body and return its notes.
pub(crate) fn completion_notes(body: Option<CompleteProgress>) -> AppResult<Option<String>> {
    let body = body.unwrap_or_default();
    validate_notes(body.notes.as_deref())?;
    Ok(body.notes)
}

/// Apply `transition` to the caller's record for `item_id`.
pub(crate) async fn apply_transition(
    pool: &DbPool,
    scope: ProgressScope,
    user_id: DbId,
    item_id: DbId,
    transition: Transition,
    notes: Option<&str>,
) -> AppResult<Applied> {
    let existing = ProgressRepo::find(pool, scope, user_id, item_id).await?;
    let previous = existing
        .as_ref()
        .map(ProgressRecord::parsed_status)
        .transpose()?;
    let action = plan(previous, transition);

    let record = match action {
        ProgressAction::Create(ProgressStatus::Completed)
        | ProgressAction::Update(ProgressStatus::Completed) => {
            Some(ProgressRepo::mark_completed(pool, scope, user_id, item_id, notes).await?)
        }
        ProgressAction::Create(_) | ProgressAction::Update(_) => {
            match ProgressRepo::mark_started(pool, scope, user_id, item_id).await? {
                Some(record) => Some(record),
                // Another writer moved it past NOT_STARTED first.
                None => ProgressRepo::find(pool, scope, user_id, item_id).await?,
            }
        }
        ProgressAction::Delete => {
            ProgressRepo::delete(pool, scope, user_id, item_id).await?;
            None
        }
        ProgressAction::NoOp => existing,
    };

    let status = match &record {
        Some(r) => r.parsed_status()?,
        None => resulting_status(previous, action),
    };

    tracing::info!(
        user_id,
        item_id,
        scope = scope.table(),
        transition = transition.as_str(),
        status = status.as_str(),
        "Progress transition applied"
    );

    Ok(Applied { previous, record })
}

/// Index the caller's records by item id.
pub(crate) fn status_map(records: &[ProgressRecord]) -> AppResult<HashMap<DbId, ProgressStatus>> {
    records
        .iter()
        .map(|r| Ok((r.item_id, r.parsed_status()?)))
        .collect()
}

/// Group linked resources by the step or section they belong to.
pub(crate) fn group_resources(linked: Vec<LinkedResource>) -> HashMap<DbId, Vec<Resource>> {
    let mut grouped: HashMap<DbId, Vec<Resource>> = HashMap::new();
    for link in linked {
        grouped.entry(link.owner_id).or_default().push(link.resource);
    }
    grouped
}
