use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Allotment, Category, MeritScore, Room, RoomId, Student, StudentId};

/// A student's own allotment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentAllotmentView {
    pub registration_id: String,
    pub name: String,
    pub category: Category,
    pub merit_score: MeritScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<AllottedRoomView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllottedRoomView {
    pub building: String,
    pub block: String,
    pub room_number: String,
    pub allocated_at: DateTime<Utc>,
}

/// Administrative overview: every student with status, plus rooms that still have space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterView {
    pub students: Vec<RosterEntry>,
    pub rooms_with_space: Vec<RoomSpaceView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub registration_id: String,
    pub name: String,
    pub category: Category,
    pub merit_score: MeritScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSpaceView {
    pub building: String,
    pub block: String,
    pub room_number: String,
    pub occupancy: u32,
    pub total_capacity: u32,
}

impl StudentAllotmentView {
    pub(crate) fn build(student: Student, allotment: Option<(&Allotment, &Room)>) -> Self {
        Self {
            registration_id: student.registration_id,
            name: student.name,
            category: student.category,
            merit_score: student.merit_score,
            room: allotment.map(|(allotment, room)| AllottedRoomView {
                building: room.building.clone(),
                block: room.block.clone(),
                room_number: room.room_number.clone(),
                allocated_at: allotment.allocated_at,
            }),
        }
    }
}

impl RosterView {
    pub(crate) fn build(students: Vec<Student>, allotments: &[Allotment], rooms: &[Room]) -> Self {
        let rooms_by_id: HashMap<RoomId, &Room> = rooms.iter().map(|room| (room.id, room)).collect();
        let room_for_student: HashMap<StudentId, &str> = allotments
            .iter()
            .filter_map(|allotment| {
                rooms_by_id
                    .get(&allotment.room_id)
                    .map(|room| (allotment.student_id, room.room_number.as_str()))
            })
            .collect();

        let students = students
            .into_iter()
            .map(|student| RosterEntry {
                room_number: room_for_student.get(&student.id).map(|number| number.to_string()),
                registration_id: student.registration_id,
                name: student.name,
                category: student.category,
                merit_score: student.merit_score,
            })
            .collect();

        let mut rooms_with_space: Vec<RoomSpaceView> = rooms
            .iter()
            .filter(|room| room.has_space())
            .map(|room| RoomSpaceView {
                building: room.building.clone(),
                block: room.block.clone(),
                room_number: room.room_number.clone(),
                occupancy: room.current_occupancy,
                total_capacity: room.total_capacity,
            })
            .collect();
        rooms_with_space.sort_by(|left, right| left.room_number.cmp(&right.room_number));

        Self {
            students,
            rooms_with_space,
        }
    }
}
