use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Allotment, Category, MeritScore, Room, RoomId, Student, StudentId};

/// Validated student registration ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub registration_id: String,
    pub name: String,
    pub category: Category,
    pub merit_score: MeritScore,
}

/// Validated room registration ready to be stored with zero occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    pub building: String,
    pub block: String,
    pub room_number: String,
    pub total_capacity: u32,
}

/// Persistence collaborator consumed by the allotment service.
///
/// Implementations own student, room and allotment records. `create_allotment` must refuse a
/// second allotment for the same student with [`RepositoryError::Conflict`]. The allocator
/// writes through [`HostelRepository::commit_allotment`], so a pairing and its seat land
/// together or not at all.
pub trait HostelRepository: Send + Sync {
    fn list_students(&self) -> Result<Vec<Student>, RepositoryError>;
    fn list_allotments(&self) -> Result<Vec<Allotment>, RepositoryError>;
    fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError>;
    /// Rooms whose occupancy is below capacity, ordered by room number ascending.
    fn list_rooms_with_space(&self) -> Result<Vec<Room>, RepositoryError>;
    fn find_student(&self, registration_id: &str) -> Result<Option<Student>, RepositoryError>;
    fn insert_student(&self, student: NewStudent) -> Result<Student, RepositoryError>;
    fn insert_room(&self, room: NewRoom) -> Result<Room, RepositoryError>;
    fn create_allotment(
        &self,
        student: StudentId,
        room: RoomId,
        allocated_at: DateTime<Utc>,
    ) -> Result<Allotment, RepositoryError>;
    fn update_room_occupancy(&self, room: RoomId, occupancy: u32) -> Result<(), RepositoryError>;
    /// Remove the allotment held by `student`. Only used to undo a pairing whose seat could
    /// not be recorded.
    fn revoke_allotment(&self, student: StudentId) -> Result<(), RepositoryError>;

    /// Store one student-room pairing together with the room's new occupancy.
    ///
    /// The default writes the allotment, then the occupancy, and revokes the allotment when
    /// the occupancy write fails. Stores that can write both under one lock or transaction
    /// should override it.
    fn commit_allotment(
        &self,
        student: StudentId,
        room: RoomId,
        allocated_at: DateTime<Utc>,
        occupancy: u32,
    ) -> Result<Allotment, RepositoryError> {
        let allotment = self.create_allotment(student, room, allocated_at)?;
        if let Err(err) = self.update_room_occupancy(room, occupancy) {
            if let Err(rollback) = self.revoke_allotment(student) {
                return Err(RepositoryError::Unavailable(format!(
                    "{err}; rolling back allotment for student {student} failed: {rollback}"
                )));
            }
            return Err(err);
        }
        Ok(allotment)
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
