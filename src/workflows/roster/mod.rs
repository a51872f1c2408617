//! CSV roster intake for students and rooms.
//!
//! Students: `registration_id,name,category,merit_score`.
//! Rooms: `building,block,room_number,total_capacity`.

mod parser;

use crate::workflows::allotment::{
    AllotmentService, AllotmentServiceError, HostelRepository, RoomRegistration,
    StudentRegistration,
};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read roster file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("roster record '{record}' was rejected: {source}")]
    Rejected {
        record: String,
        #[source]
        source: AllotmentServiceError,
    },
}

/// Counts of records registered by [`RosterImporter::seed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub students: usize,
    pub rooms: usize,
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn students_from_path(
        path: impl AsRef<Path>,
    ) -> Result<Vec<StudentRegistration>, RosterImportError> {
        let file = File::open(path)?;
        Self::students_from_reader(file)
    }

    pub fn students_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<StudentRegistration>, RosterImportError> {
        Ok(parser::parse_students(reader)?)
    }

    pub fn rooms_from_path(
        path: impl AsRef<Path>,
    ) -> Result<Vec<RoomRegistration>, RosterImportError> {
        let file = File::open(path)?;
        Self::rooms_from_reader(file)
    }

    pub fn rooms_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<RoomRegistration>, RosterImportError> {
        Ok(parser::parse_rooms(reader)?)
    }

    /// Registers every record through the service. Stops at the first rejected record;
    /// records registered before it stay registered.
    pub fn seed<R>(
        service: &AllotmentService<R>,
        students: Vec<StudentRegistration>,
        rooms: Vec<RoomRegistration>,
    ) -> Result<SeedSummary, RosterImportError>
    where
        R: HostelRepository + 'static,
    {
        let mut summary = SeedSummary::default();

        for registration in students {
            let record = registration.registration_id.clone();
            service
                .register_student(registration)
                .map_err(|source| RosterImportError::Rejected { record, source })?;
            summary.students += 1;
        }
        debug!(students = summary.students, "students imported");

        for registration in rooms {
            let record = registration.room_number.clone();
            service
                .register_room(registration)
                .map_err(|source| RosterImportError::Rejected { record, source })?;
            summary.rooms += 1;
        }

        info!(
            students = summary.students,
            rooms = summary.rooms,
            "roster imported"
        );
        Ok(summary)
    }
}
