//! Field-level validation shared by the onboarding and training content APIs.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::Minutes;

/// Maximum length of free-text completion notes.
pub const MAX_NOTES_LENGTH: usize = 5000;

/// Maximum length of titles and names.
pub const MAX_TITLE_LENGTH: usize = 200;

pub const RESOURCE_DOCUMENT: &str = "document";
pub const RESOURCE_VIDEO: &str = "video";
pub const RESOURCE_LINK: &str = "link";

/// All valid resource types.
pub const VALID_RESOURCE_TYPES: &[&str] = &[RESOURCE_DOCUMENT, RESOURCE_VIDEO, RESOURCE_LINK];

/// Validate optional completion notes.
pub fn validate_notes(notes: Option<&str>) -> Result<(), CoreError> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LENGTH => Err(CoreError::Validation(format!(
            "Notes must be at most {MAX_NOTES_LENGTH} characters"
        ))),
        _ => Ok(()),
    }
}

/// Validate a required title or name.
pub fn validate_title(label: &str, value: &str) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{label} must not be empty")));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "{label} must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate an optional duration estimate in minutes.
pub fn validate_duration(value: Option<Minutes>) -> Result<(), CoreError> {
    match value {
        Some(m) if m < 0 => Err(CoreError::Validation(
            "Estimated duration must not be negative".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Validate that a list of sibling order values has no duplicates and no
/// negative entries.
pub fn validate_orders(orders: &[i32]) -> Result<(), CoreError> {
    let mut seen = HashSet::new();
    for order in orders {
        if *order < 0 {
            return Err(CoreError::Validation(format!(
                "Order {order} must not be negative"
            )));
        }
        if !seen.insert(*order) {
            return Err(CoreError::Validation(format!(
                "Order {order} is used more than once"
            )));
        }
    }
    Ok(())
}

/// Validate a resource type string.
pub fn validate_resource_type(value: &str) -> Result<(), CoreError> {
    if VALID_RESOURCE_TYPES.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid resource type '{value}'. Must be one of: {}",
            VALID_RESOURCE_TYPES.join(", ")
        )))
    }
}
