use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::allotment::domain::{Allotment, Room, RoomId, Student, StudentId};
use crate::workflows::allotment::repository::{
    HostelRepository, NewRoom, NewStudent, RepositoryError,
};
use crate::workflows::allotment::{
    AllotmentPolicy, AllotmentService, InMemoryHostelRepository, RoomRegistration,
    StudentRegistration,
};

pub(super) fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn student(registration_id: &str, category: &str, score: &str) -> StudentRegistration {
    StudentRegistration {
        registration_id: registration_id.to_string(),
        name: format!("Student {registration_id}"),
        category: category.to_string(),
        merit_score: score.to_string(),
    }
}

pub(super) fn room(room_number: &str, total_capacity: u32) -> RoomRegistration {
    RoomRegistration {
        building: "Tilak Hostel".to_string(),
        block: "A".to_string(),
        room_number: room_number.to_string(),
        total_capacity,
    }
}

pub(super) fn build_service<R>(repository: Arc<R>) -> AllotmentService<R>
where
    R: HostelRepository + 'static,
{
    AllotmentService::new(repository, AllotmentPolicy::default()).with_clock(fixed_clock)
}

/// Memory-backed service seeded with the given students and rooms, in that insertion order.
pub(super) fn seeded_service(
    students: Vec<StudentRegistration>,
    rooms: Vec<RoomRegistration>,
) -> (
    AllotmentService<InMemoryHostelRepository>,
    Arc<InMemoryHostelRepository>,
) {
    let repository = Arc::new(InMemoryHostelRepository::default());
    let service = build_service(repository.clone());
    for registration in students {
        service
            .register_student(registration)
            .expect("seed student registers");
    }
    for registration in rooms {
        service.register_room(registration).expect("seed room registers");
    }
    (service, repository)
}

/// Scenario A population: one GENERAL category with three descending scores.
pub(super) fn general_trio() -> Vec<StudentRegistration> {
    vec![
        student("S1", "GENERAL", "90.00"),
        student("S2", "GENERAL", "80.00"),
        student("S3", "GENERAL", "70.00"),
    ]
}

pub(super) fn student_id(repository: &InMemoryHostelRepository, registration_id: &str) -> StudentId {
    repository
        .find_student(registration_id)
        .expect("lookup succeeds")
        .expect("student present")
        .id
}

pub(super) fn room_id(repository: &InMemoryHostelRepository, room_number: &str) -> RoomId {
    repository
        .list_rooms()
        .expect("rooms listed")
        .into_iter()
        .find(|room| room.room_number == room_number)
        .expect("room present")
        .id
}

/// (registration id, room number) pairs for every stored allotment, in creation order.
pub(super) fn assignments(repository: &InMemoryHostelRepository) -> Vec<(String, String)> {
    let students = repository.list_students().expect("students listed");
    let rooms = repository.list_rooms().expect("rooms listed");
    repository
        .list_allotments()
        .expect("allotments listed")
        .into_iter()
        .map(|allotment| {
            let student = students
                .iter()
                .find(|student| student.id == allotment.student_id)
                .expect("student exists");
            let room = rooms
                .iter()
                .find(|room| room.id == allotment.room_id)
                .expect("room exists");
            (student.registration_id.clone(), room.room_number.clone())
        })
        .collect()
}

/// Delegates reads to memory but refuses every allotment write as a duplicate.
#[derive(Default)]
pub(super) struct ConflictRepository {
    pub(super) inner: InMemoryHostelRepository,
}

impl HostelRepository for ConflictRepository {
    fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        self.inner.list_students()
    }

    fn list_allotments(&self) -> Result<Vec<Allotment>, RepositoryError> {
        self.inner.list_allotments()
    }

    fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        self.inner.list_rooms()
    }

    fn list_rooms_with_space(&self) -> Result<Vec<Room>, RepositoryError> {
        self.inner.list_rooms_with_space()
    }

    fn find_student(&self, registration_id: &str) -> Result<Option<Student>, RepositoryError> {
        self.inner.find_student(registration_id)
    }

    fn insert_student(&self, student: NewStudent) -> Result<Student, RepositoryError> {
        self.inner.insert_student(student)
    }

    fn insert_room(&self, room: NewRoom) -> Result<Room, RepositoryError> {
        self.inner.insert_room(room)
    }

    fn create_allotment(
        &self,
        _student: StudentId,
        _room: RoomId,
        _allocated_at: DateTime<Utc>,
    ) -> Result<Allotment, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update_room_occupancy(&self, room: RoomId, occupancy: u32) -> Result<(), RepositoryError> {
        self.inner.update_room_occupancy(room, occupancy)
    }

    fn revoke_allotment(&self, student: StudentId) -> Result<(), RepositoryError> {
        self.inner.revoke_allotment(student)
    }
}

/// Delegates to memory but loses every occupancy write, so a pairing must be rolled back.
#[derive(Default)]
pub(super) struct OccupancyFailureRepository {
    pub(super) inner: InMemoryHostelRepository,
}

impl HostelRepository for OccupancyFailureRepository {
    fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        self.inner.list_students()
    }

    fn list_allotments(&self) -> Result<Vec<Allotment>, RepositoryError> {
        self.inner.list_allotments()
    }

    fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        self.inner.list_rooms()
    }

    fn list_rooms_with_space(&self) -> Result<Vec<Room>, RepositoryError> {
        self.inner.list_rooms_with_space()
    }

    fn find_student(&self, registration_id: &str) -> Result<Option<Student>, RepositoryError> {
        self.inner.find_student(registration_id)
    }

    fn insert_student(&self, student: NewStudent) -> Result<Student, RepositoryError> {
        self.inner.insert_student(student)
    }

    fn insert_room(&self, room: NewRoom) -> Result<Room, RepositoryError> {
        self.inner.insert_room(room)
    }

    fn create_allotment(
        &self,
        student: StudentId,
        room: RoomId,
        allocated_at: DateTime<Utc>,
    ) -> Result<Allotment, RepositoryError> {
        self.inner.create_allotment(student, room, allocated_at)
    }

    fn update_room_occupancy(&self, _room: RoomId, _occupancy: u32) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("occupancy write timed out".to_string()))
    }

    fn revoke_allotment(&self, student: StudentId) -> Result<(), RepositoryError> {
        self.inner.revoke_allotment(student)
    }
}

pub(super) struct UnavailableRepository;

impl HostelRepository for UnavailableRepository {
    fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_allotments(&self) -> Result<Vec<Allotment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list_rooms_with_space(&self) -> Result<Vec<Room>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_student(&self, _registration_id: &str) -> Result<Option<Student>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_student(&self, _student: NewStudent) -> Result<Student, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_room(&self, _room: NewRoom) -> Result<Room, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn create_allotment(
        &self,
        _student: StudentId,
        _room: RoomId,
        _allocated_at: DateTime<Utc>,
    ) -> Result<Allotment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_room_occupancy(&self, _room: RoomId, _occupancy: u32) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn revoke_allotment(&self, _student: StudentId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
