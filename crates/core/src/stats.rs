//! Progress statistics for a track's steps or a module's sections.
//!
//! [`compute_stats`] is total: any combination of items and progress rows,
//! including empty inputs, produces a result.

use std::collections::HashMap;

use serde::Serialize;

use crate::progress::{effective_status, ProgressStatus, Transition};
use crate::types::{DbId, Minutes};

/// The fields of a step or section the aggregator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEstimate {
    pub id: DbId,
    /// Estimated minutes to finish; `None` counts as zero.
    pub estimated_duration: Option<Minutes>,
}

/// Derived counters for one user against one ordered set of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct ProgressStats {
    pub total_steps: i64,
    pub completed_steps: i64,
    pub in_progress_steps: i64,
    pub not_started_steps: i64,
    /// Whole percent in `0..=100`.
    pub percent_complete: i32,
    /// Minutes left across every item that is not completed.
    pub estimated_time_remaining: i64,
}

impl ProgressStats {
    pub fn is_complete(&self) -> bool {
        self.total_steps > 0 && self.completed_steps == self.total_steps
    }
}

/// Round `completed / total` to a whole percent.
///
/// Returns 0 when `total` is 0. A partially finished set never reports
/// 100: rounding is capped at 99 until every item is completed.
pub fn percent_complete(completed: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    let completed = completed.clamp(0, total);
    let raw = (completed as f64 / total as f64 * 100.0).round() as i32;
    if completed < total {
        raw.min(99)
    } else {
        100
    }
}

/// Aggregate `statuses` (keyed by item id) over `items`.
///
/// Status entries for ids not present in `items` are ignored.
pub fn compute_stats(
    items: &[StepEstimate],
    statuses: &HashMap<DbId, ProgressStatus>,
) -> ProgressStats {
    let mut stats = ProgressStats {
        total_steps: items.len() as i64,
        ..ProgressStats::default()
    };

    for item in items {
        match effective_status(statuses.get(&item.id).copied()) {
            ProgressStatus::Completed => stats.completed_steps += 1,
            status => {
                if status == ProgressStatus::InProgress {
                    stats.in_progress_steps += 1;
                } else {
                    stats.not_started_steps += 1;
                }
                stats.estimated_time_remaining +=
                    i64::from(item.estimated_duration.unwrap_or(0).max(0));
            }
        }
    }

    stats.percent_complete = percent_complete(stats.completed_steps, stats.total_steps);
    stats
}

/// The first item (in the given order) that is still `NOT_STARTED`.
///
/// Clients disable items after it; items already in progress stay enabled.
/// The server does not enforce ordering.
pub fn next_step(items: &[StepEstimate], statuses: &HashMap<DbId, ProgressStatus>) -> Option<DbId> {
    items
        .iter()
        .find(|item| effective_status(statuses.get(&item.id).copied()) == ProgressStatus::NotStarted)
        .map(|item| item.id)
}

/// Status a module record should hold after one of its sections went
/// through `transition`, given the module's recomputed section `stats`.
///
/// Returns `None` when no module record should be written.
///
/// Finishing every section completes the module. A section reset drops a
/// module back to `IN_PROGRESS`. Starting or completing a section never
/// demotes a module that was completed explicitly.
pub fn module_rollup(
    current: Option<ProgressStatus>,
    stats: &ProgressStats,
    transition: Transition,
) -> Option<ProgressStatus> {
    if stats.is_complete() {
        return Some(ProgressStatus::Completed);
    }
    match (transition, current) {
        (Transition::Reset, None) => None,
        (Transition::Reset, Some(_)) => Some(ProgressStatus::InProgress),
        (_, Some(ProgressStatus::Completed)) => Some(ProgressStatus::Completed),
        (_, _) => Some(ProgressStatus::InProgress),
    }
}

/// Status an existing module record should hold after an admin replaced the
/// module's sections, given the user's recomputed section `stats`.
///
/// Added sections reopen a completed module unless the user has already
/// finished every section. Removing sections can complete a module but
/// never reopens one.
pub fn rollup_after_content_change(
    current: ProgressStatus,
    stats: &ProgressStats,
    sections_added: bool,
) -> ProgressStatus {
    if stats.is_complete() {
        return ProgressStatus::Completed;
    }
    match current {
        ProgressStatus::Completed if sections_added => ProgressStatus::InProgress,
        status => status,
    }
}

/// Stored percent for a module record in `status`.
pub fn module_percent(status: ProgressStatus, stats: &ProgressStats) -> i32 {
    if status.is_completed() {
        100
    } else {
        stats.percent_complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(durations: &[Option<Minutes>]) -> Vec<StepEstimate> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| StepEstimate {
                id: i as DbId + 1,
                estimated_duration: *d,
            })
            .collect()
    }

    #[test]
    fn three_steps_one_completed() {
        let steps = items(&[Some(60), Some(30), Some(0)]);
        let statuses = HashMap::from([(1, ProgressStatus::Completed)]);

        let stats = compute_stats(&steps, &statuses);

        assert_eq!(stats.total_steps, 3);
        assert_eq!(stats.completed_steps, 1);
        assert_eq!(stats.not_started_steps, 2);
        assert_eq!(stats.percent_complete, 33);
        assert_eq!(stats.estimated_time_remaining, 30);
    }

    #[test]
    fn empty_set_is_zero_percent() {
        let stats = compute_stats(&[], &HashMap::new());
        assert_eq!(stats, ProgressStats::default());
        assert!(!stats.is_complete());
    }

    #[test]
    fn missing_duration_counts_as_zero() {
        let steps = items(&[None, Some(15)]);
        let statuses = HashMap::from([(2, ProgressStatus::InProgress)]);
        let stats = compute_stats(&steps, &statuses);
        assert_eq!(stats.in_progress_steps, 1);
        assert_eq!(stats.not_started_steps, 1);
        assert_eq!(stats.estimated_time_remaining, 15);
    }

    #[test]
    fn all_completed_is_one_hundred() {
        let steps = items(&[Some(10), Some(20)]);
        let statuses = HashMap::from([(1, ProgressStatus::Completed), (2, ProgressStatus::Completed)]);
        let stats = compute_stats(&steps, &statuses);
        assert_eq!(stats.percent_complete, 100);
        assert_eq!(stats.estimated_time_remaining, 0);
        assert!(stats.is_complete());
    }

    #[test]
    fn unknown_progress_ids_are_ignored() {
        let steps = items(&[Some(5)]);
        let statuses = HashMap::from([(99, ProgressStatus::Completed)]);
        let stats = compute_stats(&steps, &statuses);
        assert_eq!(stats.completed_steps, 0);
        assert_eq!(stats.percent_complete, 0);
    }

    #[test]
    fn percent_stays_in_range_and_hits_100_only_when_done() {
        for total in 0..=250_i64 {
            for completed in 0..=total {
                let pct = percent_complete(completed, total);
                assert!((0..=100).contains(&pct), "{completed}/{total} -> {pct}");
                assert_eq!(pct == 100, total > 0 && completed == total, "{completed}/{total}");
            }
        }
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(percent_complete(1, 8), 13);
        assert_eq!(percent_complete(2, 3), 67);
    }

    #[test]
    fn next_step_is_first_not_started() {
        let steps = items(&[Some(1), Some(1), Some(1)]);
        let statuses = HashMap::from([(1, ProgressStatus::Completed), (3, ProgressStatus::Completed)]);
        assert_eq!(next_step(&steps, &statuses), Some(2));

        let done = HashMap::from([
            (1, ProgressStatus::Completed),
            (2, ProgressStatus::Completed),
            (3, ProgressStatus::Completed),
        ]);
        assert_eq!(next_step(&steps, &done), None);
    }

    #[test]
    fn next_step_skips_in_progress_items() {
        let steps = items(&[Some(1), Some(1), Some(1)]);
        let statuses = HashMap::from([(1, ProgressStatus::InProgress)]);
        assert_eq!(next_step(&steps, &statuses), Some(2));

        let started = HashMap::from([
            (1, ProgressStatus::Completed),
            (2, ProgressStatus::InProgress),
            (3, ProgressStatus::InProgress),
        ]);
        assert_eq!(next_step(&steps, &started), None);
    }

    #[test]
    fn rollup_completes_module_when_all_sections_done() {
        let steps = items(&[Some(5), Some(5)]);
        let done = HashMap::from([(1, ProgressStatus::Completed), (2, ProgressStatus::Completed)]);
        let stats = compute_stats(&steps, &done);
        assert_eq!(
            module_rollup(Some(ProgressStatus::InProgress), &stats, Transition::Complete),
            Some(ProgressStatus::Completed)
        );
    }

    #[test]
    fn rollup_section_reset_reopens_module() {
        let steps = items(&[Some(5), Some(5)]);
        let half = HashMap::from([(1, ProgressStatus::Completed)]);
        let stats = compute_stats(&steps, &half);
        assert_eq!(
            module_rollup(Some(ProgressStatus::Completed), &stats, Transition::Reset),
            Some(ProgressStatus::InProgress)
        );
        assert_eq!(module_rollup(None, &stats, Transition::Reset), None);
    }

    #[test]
    fn added_section_reopens_completed_module() {
        let steps = items(&[Some(5), Some(5), Some(5)]);
        let two_done = HashMap::from([(1, ProgressStatus::Completed), (2, ProgressStatus::Completed)]);
        let stats = compute_stats(&steps, &two_done);

        let status = rollup_after_content_change(ProgressStatus::Completed, &stats, true);
        assert_eq!(status, ProgressStatus::InProgress);
        assert_eq!(module_percent(status, &stats), 67);
    }

    #[test]
    fn removed_section_never_reopens() {
        let steps = items(&[Some(5), Some(5)]);
        let stats = compute_stats(&steps, &HashMap::from([(1, ProgressStatus::Completed)]));
        assert_eq!(
            rollup_after_content_change(ProgressStatus::Completed, &stats, false),
            ProgressStatus::Completed
        );
        assert_eq!(
            rollup_after_content_change(ProgressStatus::InProgress, &stats, false),
            ProgressStatus::InProgress
        );
    }

    #[test]
    fn content_change_completes_module_when_remaining_sections_done() {
        let steps = items(&[Some(5)]);
        let stats = compute_stats(&steps, &HashMap::from([(1, ProgressStatus::Completed)]));
        let status = rollup_after_content_change(ProgressStatus::InProgress, &stats, false);
        assert_eq!(status, ProgressStatus::Completed);
        assert_eq!(module_percent(status, &stats), 100);
    }

    #[test]
    fn rollup_keeps_explicitly_completed_module() {
        let steps = items(&[Some(5), Some(5)]);
        let stats = compute_stats(&steps, &HashMap::from([(2, ProgressStatus::InProgress)]));
        assert_eq!(
            module_rollup(Some(ProgressStatus::Completed), &stats, Transition::Start),
            Some(ProgressStatus::Completed)
        );
        assert_eq!(
            module_rollup(None, &stats, Transition::Start),
            Some(ProgressStatus::InProgress)
        );
    }
}
