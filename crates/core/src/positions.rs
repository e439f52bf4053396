//! Sales positions used to scope content visibility.
//!
//! Positions are stored as `TEXT` in the database (guarded by a `CHECK`
//! constraint) and travel over the wire in SCREAMING_SNAKE_CASE.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const POSITION_JUNIOR_EC: &str = "JUNIOR_EC";
pub const POSITION_ENERGY_CONSULTANT: &str = "ENERGY_CONSULTANT";
pub const POSITION_ENERGY_SPECIALIST: &str = "ENERGY_SPECIALIST";
pub const POSITION_MANAGER: &str = "MANAGER";

/// All valid position strings, in seniority order.
pub const VALID_POSITIONS: &[&str] = &[
    POSITION_JUNIOR_EC,
    POSITION_ENERGY_CONSULTANT,
    POSITION_ENERGY_SPECIALIST,
    POSITION_MANAGER,
];

/// An enumerated job title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    JuniorEc,
    EnergyConsultant,
    EnergySpecialist,
    Manager,
}

impl Position {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            POSITION_JUNIOR_EC => Ok(Self::JuniorEc),
            POSITION_ENERGY_CONSULTANT => Ok(Self::EnergyConsultant),
            POSITION_ENERGY_SPECIALIST => Ok(Self::EnergySpecialist),
            POSITION_MANAGER => Ok(Self::Manager),
            _ => Err(CoreError::Validation(format!(
                "Invalid position '{s}'. Must be one of: {}",
                VALID_POSITIONS.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JuniorEc => POSITION_JUNIOR_EC,
            Self::EnergyConsultant => POSITION_ENERGY_CONSULTANT,
            Self::EnergySpecialist => POSITION_ENERGY_SPECIALIST,
            Self::Manager => POSITION_MANAGER,
        }
    }
}

/// Parse a list of stored position strings.
///
/// Unknown values are a data error and surface as validation failures
/// rather than being silently dropped.
pub fn parse_positions(values: &[String]) -> Result<Vec<Position>, CoreError> {
    values.iter().map(|v| Position::from_str_value(v)).collect()
}

/// Convert positions to their storage strings, removing duplicates while
/// keeping first-seen order.
pub fn to_storage(positions: &[Position]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(positions.len());
    for p in positions {
        let s = p.as_str().to_string();
        if !out.contains(&s) {
            out.push(s);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn every_valid_position_parses_and_round_trips() {
        for value in VALID_POSITIONS {
            let position = Position::from_str_value(value).expect("valid position");
            assert_eq!(position.as_str(), *value);
        }
    }

    #[test]
    fn unknown_position_is_a_validation_error() {
        assert_matches!(
            Position::from_str_value("INTERN"),
            Err(CoreError::Validation(msg)) if msg.contains("JUNIOR_EC")
        );
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&Position::EnergyConsultant).unwrap();
        assert_eq!(json, "\"ENERGY_CONSULTANT\"");
        let back: Position = serde_json::from_str("\"JUNIOR_EC\"").unwrap();
        assert_eq!(back, Position::JuniorEc);
    }

    #[test]
    fn to_storage_deduplicates() {
        let stored = to_storage(&[Position::Manager, Position::JuniorEc, Position::Manager]);
        assert_eq!(stored, vec!["MANAGER".to_string(), "JUNIOR_EC".to_string()]);
    }

    #[test]
    fn parse_positions_rejects_garbage() {
        let values = vec!["MANAGER".to_string(), "nope".to_string()];
        assert!(parse_positions(&values).is_err());
    }
}
