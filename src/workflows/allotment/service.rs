use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use super::allocator::{AllotmentError, AllotmentRunResult, Allocator, Clock};
use super::domain::{Room, Student, StudentId};
use super::eligibility::{eligible_students, AllotmentPolicy};
use super::pool::RoomPool;
use super::ranking::rank_by_category;
use super::registration::{RegistrationError, RoomRegistration, StudentRegistration};
use super::repository::{HostelRepository, RepositoryError};
use super::views::{RosterView, StudentAllotmentView};

/// Service composing ranking, eligibility, the room pool and the allocator over a repository.
pub struct AllotmentService<R> {
    repository: Arc<R>,
    policy: AllotmentPolicy,
    clock: Clock,
    run_lock: Mutex<()>,
    cancel: Arc<AtomicBool>,
}

impl<R> AllotmentService<R>
where
    R: HostelRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: AllotmentPolicy) -> Self {
        Self {
            repository,
            policy,
            clock: chrono::Utc::now,
            run_lock: Mutex::new(()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> AllotmentPolicy {
        self.policy
    }

    /// Raising this flag halts the in-flight run before its next student, and every run
    /// started or queued after it, until [`AllotmentService::resume_runs`] clears it.
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Clear a raised cancellation flag so later runs process students again.
    pub fn resume_runs(&self) {
        self.cancel.store(false, Ordering::Release);
    }

    /// Run with the configured cutoff.
    pub fn run_default(&self) -> Result<AllotmentRunResult, AllotmentServiceError> {
        self.run_allotment(self.policy.category_cutoff)
    }

    /// Allot rooms to the top `category_cutoff` unallotted students of every category.
    ///
    /// Runs are serialized: a second caller blocks until the first run reaches a terminal
    /// state. Students and rooms are snapshotted once when the run starts.
    pub fn run_allotment(
        &self,
        category_cutoff: usize,
    ) -> Result<AllotmentRunResult, AllotmentServiceError> {
        if category_cutoff == 0 {
            return Err(AllotmentServiceError::InvalidCutoff);
        }

        let _serialized = self
            .run_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        info!(
            category_cutoff,
            order = %self.policy.order,
            "automatic allotment process started"
        );

        let students = self.repository.list_students()?;
        let allotted: HashSet<StudentId> = self
            .repository
            .list_allotments()?
            .into_iter()
            .map(|allotment| allotment.student_id)
            .collect();

        let ranked = rank_by_category(&students);
        let eligible = eligible_students(ranked, &allotted, category_cutoff, self.policy.order);
        let mut pool = RoomPool::new(self.repository.list_rooms_with_space()?);

        info!(
            students = students.len(),
            already_allotted = allotted.len(),
            eligible = eligible.len(),
            seats = pool.remaining_seats(),
            "allotment snapshot taken"
        );

        let allocator = Allocator::new(self.repository.as_ref())
            .with_clock(self.clock)
            .with_cancellation(&self.cancel);

        match allocator.run(eligible, &mut pool, category_cutoff) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(error = %err, "allotment run failed");
                Err(err.into())
            }
        }
    }

    pub fn register_student(
        &self,
        registration: StudentRegistration,
    ) -> Result<Student, AllotmentServiceError> {
        let student = registration.validate()?;
        let stored = self.repository.insert_student(student)?;
        info!(registration_id = %stored.registration_id, category = %stored.category, "student registered");
        Ok(stored)
    }

    pub fn register_room(
        &self,
        registration: RoomRegistration,
    ) -> Result<Room, AllotmentServiceError> {
        let room = registration.validate()?;
        let stored = self.repository.insert_room(room)?;
        info!(room = %stored.room_number, capacity = stored.total_capacity, "room registered");
        Ok(stored)
    }

    /// Look up a student's allotment by registration id.
    pub fn student_allotment(
        &self,
        registration_id: &str,
    ) -> Result<StudentAllotmentView, AllotmentServiceError> {
        let student = self
            .repository
            .find_student(registration_id.trim())?
            .ok_or(RepositoryError::NotFound)?;

        let allotment = self
            .repository
            .list_allotments()?
            .into_iter()
            .find(|allotment| allotment.student_id == student.id);

        let Some(allotment) = allotment else {
            return Ok(StudentAllotmentView::build(student, None));
        };

        let room = self
            .repository
            .list_rooms()?
            .into_iter()
            .find(|room| room.id == allotment.room_id)
            .ok_or(RepositoryError::NotFound)?;

        Ok(StudentAllotmentView::build(student, Some((&allotment, &room))))
    }

    pub fn roster(&self) -> Result<RosterView, AllotmentServiceError> {
        let students = self.repository.list_students()?;
        let allotments = self.repository.list_allotments()?;
        let rooms = self.repository.list_rooms()?;
        Ok(RosterView::build(students, &allotments, &rooms))
    }
}

/// Error raised by the allotment service.
#[derive(Debug, thiserror::Error)]
pub enum AllotmentServiceError {
    #[error("category cutoff must be at least 1")]
    InvalidCutoff,
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Allotment(#[from] AllotmentError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
