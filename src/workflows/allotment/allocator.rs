use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{Allotment, Category, RoomId, StudentId};
use super::pool::{PoolError, RoomPool};
use super::ranking::RankedStudent;
use super::repository::{HostelRepository, RepositoryError};

/// Timestamp source for new allotments.
pub type Clock = fn() -> DateTime<Utc>;

/// Terminal state of one allocation run. All three are successful returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No room had spare capacity when the run started; nothing was written.
    Aborted,
    /// The run stopped before every eligible student was processed.
    Halted,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    RoomsExhausted,
    Cancelled,
}

/// Diagnostic emitted while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AllotmentEvent {
    Allocated {
        student_id: StudentId,
        registration_id: String,
        student_name: String,
        category: Category,
        room_id: RoomId,
        room_number: String,
    },
    NoRoomsAvailable,
    RunHalted {
        reason: HaltReason,
    },
}

impl AllotmentEvent {
    pub fn message(&self) -> String {
        match self {
            AllotmentEvent::Allocated {
                student_name,
                category,
                room_number,
                ..
            } => format!(
                "{student_name} from {category} category allotted to Room {room_number}."
            ),
            AllotmentEvent::NoRoomsAvailable => RunWarning::NoCapacity.to_string(),
            AllotmentEvent::RunHalted {
                reason: HaltReason::RoomsExhausted,
            } => RunWarning::RoomsExhausted.to_string(),
            AllotmentEvent::RunHalted {
                reason: HaltReason::Cancelled,
            } => RunWarning::Cancelled.to_string(),
        }
    }
}

/// User-facing warnings attached to runs that did not allot every eligible student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RunWarning {
    #[error("No rooms are available for allotment!")]
    NoCapacity,
    #[error("No more rooms available for allotment!")]
    RoomsExhausted,
    #[error("Allotment run was cancelled before every eligible student was processed.")]
    Cancelled,
}

/// Output of a single allocation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllotmentRunResult {
    pub state: RunState,
    pub category_cutoff: usize,
    pub eligible: usize,
    pub new_allotments: Vec<Allotment>,
    pub events: Vec<AllotmentEvent>,
}

impl AllotmentRunResult {
    pub fn warning(&self) -> Option<RunWarning> {
        self.events.iter().find_map(|event| match event {
            AllotmentEvent::NoRoomsAvailable => Some(RunWarning::NoCapacity),
            AllotmentEvent::RunHalted {
                reason: HaltReason::RoomsExhausted,
            } => Some(RunWarning::RoomsExhausted),
            AllotmentEvent::RunHalted {
                reason: HaltReason::Cancelled,
            } => Some(RunWarning::Cancelled),
            AllotmentEvent::Allocated { .. } => None,
        })
    }

    /// Students that were eligible but left without a room by this run.
    pub fn unallotted(&self) -> usize {
        self.eligible.saturating_sub(self.new_allotments.len())
    }
}

/// Faults that end a run early. Allotments committed before the fault are kept.
#[derive(Debug, thiserror::Error)]
pub enum AllotmentError {
    #[error("student {0} already holds an allotment")]
    DuplicateAllotment(StudentId),
    #[error("room pool rejected occupancy update: {0}")]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Repository(RepositoryError),
}

/// Greedy first-fit allocator: students in eligibility order, rooms in pool order.
pub struct Allocator<'a, R: ?Sized> {
    repository: &'a R,
    clock: Clock,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, R> Allocator<'a, R>
where
    R: HostelRepository + ?Sized,
{
    pub fn new(repository: &'a R) -> Self {
        Self {
            repository,
            clock: Utc::now,
            cancel: None,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Checked between students; a raised flag halts the run after the current student.
    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn run(
        &self,
        eligible: Vec<RankedStudent>,
        pool: &mut RoomPool,
        category_cutoff: usize,
    ) -> Result<AllotmentRunResult, AllotmentError> {
        let total = eligible.len();
        let mut result = AllotmentRunResult {
            state: RunState::Completed,
            category_cutoff,
            eligible: total,
            new_allotments: Vec::new(),
            events: Vec::new(),
        };

        if pool.is_exhausted() {
            warn!("no rooms are available for allotment, aborting run");
            result.state = RunState::Aborted;
            result.events.push(AllotmentEvent::NoRoomsAvailable);
            return Ok(result);
        }

        let mut seen: HashSet<StudentId> = HashSet::with_capacity(total);

        for (position, entry) in eligible.into_iter().enumerate() {
            if self.cancellation_requested() {
                warn!(processed = position, total, "allotment run cancelled");
                result.halt(HaltReason::Cancelled);
                break;
            }

            let Some(room) = pool.next_available() else {
                result.halt(HaltReason::RoomsExhausted);
                break;
            };
            let room_id = room.id;
            let room_number = room.room_number.clone();
            let occupancy = room.current_occupancy + 1;

            let student = entry.student;
            debug!(
                student = %student.name,
                category = %student.category,
                rank = entry.rank,
                "processing student"
            );

            if !seen.insert(student.id) {
                return Err(AllotmentError::DuplicateAllotment(student.id));
            }

            let allotment = self
                .repository
                .commit_allotment(student.id, room_id, (self.clock)(), occupancy)
                .map_err(|err| match err {
                    RepositoryError::Conflict => AllotmentError::DuplicateAllotment(student.id),
                    other => AllotmentError::Repository(other),
                })?;
            let recorded = pool.record_occupancy(room_id)?;

            info!(
                student = %student.name,
                category = %student.category,
                room = %room_number,
                occupancy = recorded.occupancy,
                "student allotted"
            );

            result.new_allotments.push(allotment);
            result.events.push(AllotmentEvent::Allocated {
                student_id: student.id,
                registration_id: student.registration_id,
                student_name: student.name,
                category: student.category,
                room_id,
                room_number,
            });

            let students_waiting = position + 1 < total;
            if recorded.retired && students_waiting && pool.is_exhausted() {
                result.halt(HaltReason::RoomsExhausted);
                break;
            }
        }

        if result.state == RunState::Halted {
            warn!(
                allotted = result.new_allotments.len(),
                left_unallotted = result.unallotted(),
                "allotment run halted"
            );
        } else {
            info!(
                allotted = result.new_allotments.len(),
                "allotment run completed"
            );
        }

        Ok(result)
    }

    fn cancellation_requested(&self) -> bool {
        self.cancel
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

impl AllotmentRunResult {
    fn halt(&mut self, reason: HaltReason) {
        self.state = RunState::Halted;
        self.events.push(AllotmentEvent::RunHalted { reason });
    }
}
