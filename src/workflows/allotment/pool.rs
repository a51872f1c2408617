use std::collections::HashMap;

use tracing::debug;

use super::domain::{Room, RoomId};

/// In-run view of rooms that still have space, consumed front to back.
///
/// Rooms are ordered by room number, then identifier. Because occupancy only grows and the
/// allocator always fills the front room, a full room is retired by advancing a cursor;
/// a retired room is never offered again for the rest of the run.
#[derive(Debug, Clone)]
pub struct RoomPool {
    rooms: Vec<Room>,
    positions: HashMap<RoomId, usize>,
    cursor: usize,
    touched: Vec<bool>,
}

/// Occupancy after a seat was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedOccupancy {
    pub room_id: RoomId,
    pub occupancy: u32,
    pub retired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("room {0} is not part of this run's pool")]
    UnknownRoom(RoomId),
    #[error("room {0} is already full")]
    RoomFull(RoomId),
}

impl RoomPool {
    /// Build a pool from a room snapshot, dropping rooms without spare capacity.
    pub fn new(rooms: impl IntoIterator<Item = Room>) -> Self {
        let mut rooms: Vec<Room> = rooms.into_iter().filter(Room::has_space).collect();
        rooms.sort_by(|left, right| {
            left.room_number
                .cmp(&right.room_number)
                .then(left.id.cmp(&right.id))
        });

        let positions = rooms
            .iter()
            .enumerate()
            .map(|(index, room)| (room.id, index))
            .collect();
        let touched = vec![false; rooms.len()];

        Self {
            rooms,
            positions,
            cursor: 0,
            touched,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_available().is_none()
    }

    /// First room in order with spare capacity.
    pub fn next_available(&self) -> Option<&Room> {
        self.rooms[self.cursor..].iter().find(|room| room.has_space())
    }

    /// Seats left across every room still in the pool.
    pub fn remaining_seats(&self) -> u64 {
        self.rooms[self.cursor..]
            .iter()
            .map(|room| u64::from(room.remaining()))
            .sum()
    }

    /// Take one seat in `room_id`, retiring the room once it is full.
    pub fn record_occupancy(&mut self, room_id: RoomId) -> Result<RecordedOccupancy, PoolError> {
        let index = *self
            .positions
            .get(&room_id)
            .ok_or(PoolError::UnknownRoom(room_id))?;
        let room = &mut self.rooms[index];
        if index < self.cursor || !room.has_space() {
            return Err(PoolError::RoomFull(room_id));
        }

        room.current_occupancy += 1;
        self.touched[index] = true;
        let occupancy = room.current_occupancy;
        let retired = !room.has_space();

        if retired {
            debug!(room = %room.room_number, "room is now full, retiring from pool");
            self.advance_cursor();
        }

        Ok(RecordedOccupancy {
            room_id,
            occupancy,
            retired,
        })
    }

    /// Rooms whose occupancy changed during this run.
    pub fn touched_rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms
            .iter()
            .zip(&self.touched)
            .filter_map(|(room, touched)| touched.then_some(room))
    }

    fn advance_cursor(&mut self) {
        while self
            .rooms
            .get(self.cursor)
            .is_some_and(|room| !room.has_space())
        {
            self.cursor += 1;
        }
    }
}
