use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{Allotment, Room, RoomId, Student, StudentId};
use super::repository::{HostelRepository, NewRoom, NewStudent, RepositoryError};

/// Process-local repository backing the service binary, offline runs and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryHostelRepository {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    students: Vec<Student>,
    rooms: Vec<Room>,
    allotments: Vec<Allotment>,
    next_student: u64,
    next_room: u64,
}

impl InMemoryHostelRepository {
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl HostelRepository for InMemoryHostelRepository {
    fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        Ok(self.lock()?.students.clone())
    }

    fn list_allotments(&self) -> Result<Vec<Allotment>, RepositoryError> {
        Ok(self.lock()?.allotments.clone())
    }

    fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        Ok(self.lock()?.rooms.clone())
    }

    fn list_rooms_with_space(&self) -> Result<Vec<Room>, RepositoryError> {
        let guard = self.lock()?;
        let mut rooms: Vec<Room> = guard
            .rooms
            .iter()
            .filter(|room| room.has_space())
            .cloned()
            .collect();
        rooms.sort_by(|left, right| left.room_number.cmp(&right.room_number));
        Ok(rooms)
    }

    fn find_student(&self, registration_id: &str) -> Result<Option<Student>, RepositoryError> {
        Ok(self
            .lock()?
            .students
            .iter()
            .find(|student| student.registration_id == registration_id)
            .cloned())
    }

    fn insert_student(&self, student: NewStudent) -> Result<Student, RepositoryError> {
        let mut guard = self.lock()?;
        if guard
            .students
            .iter()
            .any(|existing| existing.registration_id == student.registration_id)
        {
            return Err(RepositoryError::Conflict);
        }

        guard.next_student += 1;
        let stored = Student {
            id: StudentId(guard.next_student),
            registration_id: student.registration_id,
            name: student.name,
            category: student.category,
            merit_score: student.merit_score,
        };
        guard.students.push(stored.clone());
        Ok(stored)
    }

    fn insert_room(&self, room: NewRoom) -> Result<Room, RepositoryError> {
        let mut guard = self.lock()?;
        guard.next_room += 1;
        let stored = Room {
            id: RoomId(guard.next_room),
            building: room.building,
            block: room.block,
            room_number: room.room_number,
            total_capacity: room.total_capacity,
            current_occupancy: 0,
        };
        guard.rooms.push(stored.clone());
        Ok(stored)
    }

    fn create_allotment(
        &self,
        student: StudentId,
        room: RoomId,
        allocated_at: DateTime<Utc>,
    ) -> Result<Allotment, RepositoryError> {
        let mut guard = self.lock()?;
        if !guard.students.iter().any(|existing| existing.id == student)
            || !guard.rooms.iter().any(|existing| existing.id == room)
        {
            return Err(RepositoryError::NotFound);
        }
        if guard
            .allotments
            .iter()
            .any(|existing| existing.student_id == student)
        {
            return Err(RepositoryError::Conflict);
        }

        let allotment = Allotment {
            student_id: student,
            room_id: room,
            allocated_at,
        };
        guard.allotments.push(allotment.clone());
        Ok(allotment)
    }

    fn update_room_occupancy(&self, room: RoomId, occupancy: u32) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let stored = guard
            .rooms
            .iter_mut()
            .find(|existing| existing.id == room)
            .ok_or(RepositoryError::NotFound)?;
        if occupancy > stored.total_capacity || occupancy < stored.current_occupancy {
            return Err(RepositoryError::Unavailable(format!(
                "occupancy {occupancy} rejected for room {} ({}/{})",
                stored.room_number, stored.current_occupancy, stored.total_capacity
            )));
        }
        stored.current_occupancy = occupancy;
        Ok(())
    }

    fn revoke_allotment(&self, student: StudentId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let position = guard
            .allotments
            .iter()
            .position(|existing| existing.student_id == student)
            .ok_or(RepositoryError::NotFound)?;
        guard.allotments.remove(position);
        Ok(())
    }

    /// Validates both writes, then applies them under a single lock.
    fn commit_allotment(
        &self,
        student: StudentId,
        room: RoomId,
        allocated_at: DateTime<Utc>,
        occupancy: u32,
    ) -> Result<Allotment, RepositoryError> {
        let mut guard = self.lock()?;
        if !guard.students.iter().any(|existing| existing.id == student) {
            return Err(RepositoryError::NotFound);
        }
        if guard
            .allotments
            .iter()
            .any(|existing| existing.student_id == student)
        {
            return Err(RepositoryError::Conflict);
        }

        let stored = guard
            .rooms
            .iter_mut()
            .find(|existing| existing.id == room)
            .ok_or(RepositoryError::NotFound)?;
        if occupancy > stored.total_capacity || occupancy < stored.current_occupancy {
            return Err(RepositoryError::Unavailable(format!(
                "occupancy {occupancy} rejected for room {} ({}/{})",
                stored.room_number, stored.current_occupancy, stored.total_capacity
            )));
        }
        stored.current_occupancy = occupancy;

        let allotment = Allotment {
            student_id: student,
            room_id: room,
            allocated_at,
        };
        guard.allotments.push(allotment.clone());
        Ok(allotment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::allotment::domain::{Category, MeritScore};

    fn seeded() -> (InMemoryHostelRepository, StudentId, RoomId) {
        let repository = InMemoryHostelRepository::default();
        let student = repository
            .insert_student(NewStudent {
                registration_id: "CET001".to_string(),
                name: "Asha Patil".to_string(),
                category: Category::General,
                merit_score: MeritScore::from_hundredths(9_725).expect("valid score"),
            })
            .expect("student stored");
        let room = repository
            .insert_room(NewRoom {
                building: "Tilak Hostel".to_string(),
                block: "A".to_string(),
                room_number: "101".to_string(),
                total_capacity: 1,
            })
            .expect("room stored");
        (repository, student.id, room.id)
    }

    #[test]
    fn commit_writes_pairing_and_seat_together() {
        let (repository, student, room) = seeded();

        repository
            .commit_allotment(student, room, Utc::now(), 1)
            .expect("pairing committed");

        assert_eq!(repository.list_allotments().expect("listed").len(), 1);
        assert_eq!(repository.list_rooms().expect("listed")[0].current_occupancy, 1);
    }

    #[test]
    fn rejected_occupancy_leaves_no_allotment_behind() {
        let (repository, student, room) = seeded();

        let result = repository.commit_allotment(student, room, Utc::now(), 2);

        assert!(matches!(result, Err(RepositoryError::Unavailable(_))));
        assert!(repository.list_allotments().expect("listed").is_empty());
        assert_eq!(repository.list_rooms().expect("listed")[0].current_occupancy, 0);
    }

    #[test]
    fn revoke_removes_only_the_named_student() {
        let (repository, student, room) = seeded();
        repository
            .create_allotment(student, room, Utc::now())
            .expect("allotment stored");

        repository.revoke_allotment(student).expect("revoked");

        assert!(repository.list_allotments().expect("listed").is_empty());
        assert_eq!(
            repository.revoke_allotment(student),
            Err(RepositoryError::NotFound)
        );
    }
}
