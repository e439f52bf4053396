//! Track and module selection by position, publish state, and prerequisites.
//!
//! Visibility rule: an empty position set means the content is visible to
//! every position. Every call site goes through [`is_visible_to`]; the
//! repositories never pre-filter on positions.

use std::collections::{HashMap, HashSet};

use crate::error::CoreError;
use crate::positions::Position;
use crate::types::DbId;

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub position: Option<Position>,
    pub is_admin: bool,
}

/// Whether content scoped to `allowed` is visible to `position`.
pub fn is_visible_to(allowed: &[Position], position: Option<Position>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match position {
        Some(p) => allowed.contains(&p),
        None => false,
    }
}

/// Admins see every track; everyone else sees active tracks for their position.
pub fn can_view_track(viewer: &Viewer, is_active: bool, for_positions: &[Position]) -> bool {
    viewer.is_admin || (is_active && is_visible_to(for_positions, viewer.position))
}

/// Admins see every module; everyone else sees published modules for their position.
pub fn can_view_module(viewer: &Viewer, is_published: bool, visible_to: &[Position]) -> bool {
    viewer.is_admin || (is_published && is_visible_to(visible_to, viewer.position))
}

/// Minimal view of a track used to pick a user's assigned track.
#[derive(Debug, Clone)]
pub struct TrackCandidate {
    pub id: DbId,
    pub sort_order: i32,
    pub is_active: bool,
    pub for_positions: Vec<Position>,
}

/// Pick the track that applies to `position`: the first active, visible
/// track by `(sort_order, id)`. Role does not matter here.
pub fn select_track(candidates: &[TrackCandidate], position: Option<Position>) -> Option<DbId> {
    candidates
        .iter()
        .filter(|t| t.is_active && is_visible_to(&t.for_positions, position))
        .min_by_key(|t| (t.sort_order, t.id))
        .map(|t| t.id)
}

/// Whether every prerequisite module is in `completed`.
pub fn prerequisites_met(prerequisite_ids: &[DbId], completed: &HashSet<DbId>) -> bool {
    prerequisite_ids.iter().all(|id| completed.contains(id))
}

/// Validate a prerequisite set before it is written.
///
/// `graph` maps every existing module id to its current prerequisite ids.
/// `module_id` is `None` for a module that does not exist yet (nothing can
/// depend on it, so only self-reference and duplicates are possible).
pub fn validate_prerequisites(
    module_id: Option<DbId>,
    prerequisite_ids: &[DbId],
    graph: &HashMap<DbId, Vec<DbId>>,
) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for id in prerequisite_ids {
        if !seen.insert(*id) {
            return Err(CoreError::Validation(format!(
                "Prerequisite module {id} is listed more than once"
            )));
        }
        if !graph.contains_key(id) {
            return Err(CoreError::NotFound {
                entity: "TrainingModule",
                id: *id,
            });
        }
    }

    let Some(module_id) = module_id else {
        return Ok(());
    };

    if seen.contains(&module_id) {
        return Err(CoreError::Validation(
            "A module cannot be its own prerequisite".to_string(),
        ));
    }

    // The new edges module -> prereq close a cycle iff some prereq already
    // (transitively) requires `module_id`.
    let mut stack: Vec<DbId> = prerequisite_ids.to_vec();
    let mut visited = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == module_id {
            return Err(CoreError::Validation(
                "Prerequisites would create a cycle".to_string(),
            ));
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = graph.get(&current) {
            stack.extend(next.iter().copied());
        }
    }

    Ok(())
}
