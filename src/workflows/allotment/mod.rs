//! Merit-ranked hostel room allotment.
//!
//! A run ranks every student inside its category, keeps the top `category_cutoff` students
//! that do not yet hold a room, and walks them in order against a pool of rooms sorted by
//! room number, giving each student the first room with a free seat. The run halts as soon
//! as the pool runs dry; allotments already written are never rolled back.

pub mod allocator;
pub mod domain;
pub mod eligibility;
pub mod memory;
pub mod pool;
pub mod ranking;
pub mod registration;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use allocator::{
    AllotmentError, AllotmentEvent, AllotmentRunResult, Allocator, Clock, HaltReason, RunState,
    RunWarning,
};
pub use domain::{
    Allotment, Category, InvalidMeritScore, MeritScore, Room, RoomId, Student, StudentId,
    UnknownCategory,
};
pub use eligibility::{
    eligible_students, AllotmentPolicy, EligibilityOrder, DEFAULT_CATEGORY_CUTOFF,
};
pub use memory::InMemoryHostelRepository;
pub use pool::{PoolError, RecordedOccupancy, RoomPool};
pub use ranking::{rank_by_category, RankedStudent};
pub use registration::{RegistrationError, RoomRegistration, StudentRegistration};
pub use repository::{HostelRepository, NewRoom, NewStudent, RepositoryError};
pub use router::allotment_router;
pub use service::{AllotmentService, AllotmentServiceError};
pub use views::{AllottedRoomView, RosterEntry, RosterView, RoomSpaceView, StudentAllotmentView};
