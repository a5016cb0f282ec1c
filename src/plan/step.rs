//! A Step (C7): the smallest unit of work in the plan hierarchy, usually
//! "launch this task". Tracks its own status and, optionally, the pod
//! instance it would occupy — used to detect conflicts with other
//! in-flight work.

use parking_lot::Mutex;

use crate::model::PodInstanceRequirement;
use crate::plan::strategy::Element;
use crate::status::Status;

pub struct Step {
    pub name: String,
    pub requirement: Option<PodInstanceRequirement>,
    status: Mutex<Status>,
    errors: Mutex<Vec<String>>,
}

impl Step {
    pub fn new(name: impl Into<String>, requirement: Option<PodInstanceRequirement>) -> Self {
        Self {
            name: name.into(),
            requirement,
            status: Mutex::new(Status::Pending),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn status(&self) -> Status {
        *self.status.lock()
    }

    pub fn set_status(&self, status: Status) {
        *self.status.lock() = status;
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn add_error(&self, message: impl Into<String>) {
        self.errors.lock().push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.lock().is_empty()
    }

    /// A step is eligible to start iff it's still `Pending`, carries no
    /// errors, and its pod instance doesn't conflict with any requirement
    /// already considered dirty (claimed by other in-flight work).
    pub fn is_eligible(&self, dirty_assets: &[PodInstanceRequirement]) -> bool {
        if self.status() != Status::Pending || self.has_errors() {
            return false;
        }
        match &self.requirement {
            None => true,
            Some(req) => !dirty_assets.iter().any(|d| d.conflicts_with(req)),
        }
    }

    /// Whether this step currently holds its pod instance "dirty" — active
    /// enough that a conflicting step elsewhere must not start.
    pub fn is_dirty(&self) -> bool {
        matches!(
            self.status(),
            Status::Prepared | Status::Starting | Status::Started | Status::InProgress
        )
    }
}

impl Element for Step {
    fn status(&self) -> Status {
        Step::status(self)
    }
}
