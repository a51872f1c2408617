use serde::Deserialize;
use std::io::Read;

use crate::workflows::allotment::{RoomRegistration, StudentRegistration};

/// Scores stay textual so "66.60" reaches the decimal parser untouched.
#[derive(Debug, Deserialize)]
struct StudentRow {
    registration_id: String,
    name: String,
    category: String,
    merit_score: String,
}

#[derive(Debug, Deserialize)]
struct RoomRow {
    building: String,
    block: String,
    room_number: String,
    total_capacity: u32,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub(crate) fn parse_students<R: Read>(reader: R) -> Result<Vec<StudentRegistration>, csv::Error> {
    let mut csv_reader = csv_reader(reader);
    let mut students = Vec::new();

    for record in csv_reader.deserialize::<StudentRow>() {
        let row = record?;
        students.push(StudentRegistration {
            registration_id: row.registration_id,
            name: row.name,
            category: row.category,
            merit_score: row.merit_score,
        });
    }

    Ok(students)
}

pub(crate) fn parse_rooms<R: Read>(reader: R) -> Result<Vec<RoomRegistration>, csv::Error> {
    let mut csv_reader = csv_reader(reader);
    let mut rooms = Vec::new();

    for record in csv_reader.deserialize::<RoomRow>() {
        let row = record?;
        rooms.push(RoomRegistration {
            building: row.building,
            block: row.block,
            room_number: row.room_number,
            total_capacity: row.total_capacity,
        });
    }

    Ok(rooms)
}
