use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Repository-assigned student identifier. Sequence order doubles as insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub u64);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "student-{:06}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room-{:06}", self.0)
    }
}

/// Reservation category. Declaration order is the category-major processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    General,
    Obc,
    Sc,
    St,
    Vjnt,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::Obc,
        Category::Sc,
        Category::St,
        Category::Vjnt,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Category::General => "GENERAL",
            Category::Obc => "OBC",
            Category::Sc => "SC",
            Category::St => "ST",
            Category::Vjnt => "VJNT",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Obc => "OBC",
            Category::Sc => "SC",
            Category::St => "ST",
            Category::Vjnt => "VJNT",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}' (expected one of GENERAL, OBC, SC, ST, VJNT)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(trimmed.to_string()))
    }
}

/// Merit percentile in hundredths, so 97.25 is stored as 9725.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeritScore(u16);

impl MeritScore {
    pub const MAX_HUNDREDTHS: u16 = 10_000;

    pub fn from_hundredths(hundredths: u16) -> Result<Self, InvalidMeritScore> {
        if hundredths > Self::MAX_HUNDREDTHS {
            return Err(InvalidMeritScore::OutOfRange(format_hundredths(hundredths)));
        }
        Ok(Self(hundredths))
    }

    pub const fn hundredths(self) -> u16 {
        self.0
    }

    fn from_f64(value: f64) -> Result<Self, InvalidMeritScore> {
        let scaled = value * 100.0;
        let rounded = scaled.round();
        if !value.is_finite() || value < 0.0 || rounded > f64::from(Self::MAX_HUNDREDTHS) {
            return Err(InvalidMeritScore::OutOfRange(value.to_string()));
        }
        if (scaled - rounded).abs() > 1e-6 {
            return Err(InvalidMeritScore::Precision(value.to_string()));
        }
        Self::from_hundredths(rounded as u16)
    }
}

fn format_hundredths(hundredths: u16) -> String {
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

impl fmt::Display for MeritScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hundredths(self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMeritScore {
    #[error("merit score '{0}' is not a decimal number")]
    Malformed(String),
    #[error("merit score '{0}' has more than two decimal places")]
    Precision(String),
    #[error("merit score '{0}' must be between 0.00 and 100.00")]
    OutOfRange(String),
}

impl FromStr for MeritScore {
    type Err = InvalidMeritScore;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let malformed = || InvalidMeritScore::Malformed(trimmed.to_string());

        if trimmed.starts_with('-') {
            return Err(InvalidMeritScore::OutOfRange(trimmed.to_string()));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if fraction.len() > 2 {
            return Err(InvalidMeritScore::Precision(trimmed.to_string()));
        }

        let whole: u32 = whole
            .parse()
            .map_err(|_| InvalidMeritScore::OutOfRange(trimmed.to_string()))?;
        let fraction: u32 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u32>().map_err(|_| malformed())? * 10,
            _ => fraction.parse::<u32>().map_err(|_| malformed())?,
        };

        let hundredths = whole
            .checked_mul(100)
            .and_then(|value| value.checked_add(fraction))
            .filter(|value| *value <= u32::from(Self::MAX_HUNDREDTHS))
            .ok_or_else(|| InvalidMeritScore::OutOfRange(trimmed.to_string()))?;

        Self::from_hundredths(hundredths as u16)
    }
}

impl Serialize for MeritScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MeritScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawScore {
            Text(String),
            Number(f64),
        }

        match RawScore::deserialize(deserializer)? {
            RawScore::Text(text) => text.parse().map_err(serde::de::Error::custom),
            RawScore::Number(number) => {
                MeritScore::from_f64(number).map_err(serde::de::Error::custom)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub registration_id: String,
    pub name: String,
    pub category: Category,
    pub merit_score: MeritScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub building: String,
    pub block: String,
    pub room_number: String,
    pub total_capacity: u32,
    pub current_occupancy: u32,
}

impl Room {
    pub fn has_space(&self) -> bool {
        self.current_occupancy < self.total_capacity
    }

    pub fn remaining(&self) -> u32 {
        self.total_capacity.saturating_sub(self.current_occupancy)
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Room {} ({}/{} filled)",
            self.room_number, self.current_occupancy, self.total_capacity
        )
    }
}

/// Durable pairing of one student with one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allotment {
    pub student_id: StudentId,
    pub room_id: RoomId,
    pub allocated_at: DateTime<Utc>,
}
