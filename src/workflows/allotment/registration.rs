//! Intake validation for students and rooms before they reach the repository.

use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{Category, InvalidMeritScore, MeritScore, UnknownCategory};
use super::repository::{NewRoom, NewStudent};

const REGISTRATION_ID_MAX: usize = 10;
const NAME_MAX: usize = 100;
const ROOM_NUMBER_MAX: usize = 10;
const LOCATION_MAX: usize = 100;

/// Raw student signup payload as submitted by forms, CSV rows or API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRegistration {
    pub registration_id: String,
    pub name: String,
    pub category: String,
    #[serde(deserialize_with = "string_or_number")]
    pub merit_score: String,
}

/// Raw room registration payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRegistration {
    pub building: String,
    pub block: String,
    pub room_number: String,
    pub total_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error(transparent)]
    Category(#[from] UnknownCategory),
    #[error(transparent)]
    MeritScore(#[from] InvalidMeritScore),
    #[error("room capacity must be at least 1")]
    ZeroCapacity,
}

impl StudentRegistration {
    pub fn validate(self) -> Result<NewStudent, RegistrationError> {
        let registration_id = bounded("registration_id", &self.registration_id, REGISTRATION_ID_MAX)?;
        let name = bounded("name", &self.name, NAME_MAX)?;
        let category: Category = self.category.parse()?;
        let merit_score: MeritScore = self.merit_score.parse()?;

        Ok(NewStudent {
            registration_id,
            name,
            category,
            merit_score,
        })
    }
}

impl RoomRegistration {
    pub fn validate(self) -> Result<NewRoom, RegistrationError> {
        let building = bounded("building", &self.building, LOCATION_MAX)?;
        let block = bounded("block", &self.block, LOCATION_MAX)?;
        let room_number = bounded("room_number", &self.room_number, ROOM_NUMBER_MAX)?;
        if self.total_capacity == 0 {
            return Err(RegistrationError::ZeroCapacity);
        }

        Ok(NewRoom {
            building,
            block,
            room_number,
            total_capacity: self.total_capacity,
        })
    }
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, RegistrationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistrationError::MissingField(field));
    }
    if trimmed.chars().count() > max {
        return Err(RegistrationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
