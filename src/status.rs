//! Status aggregation (C6): rolls up the statuses of a collection of
//! child elements (steps within a phase, phases within a plan) into one
//! parent status via a fixed, ordered set of rules.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Error,
    Waiting,
    Pending,
    Prepared,
    Starting,
    Started,
    InProgress,
    Complete,
}

/// Aggregates a parent's status from its children's statuses, its
/// candidates' statuses, its own error list, and whether it is interrupted.
/// Never reads the parent's own cached status, so there's no cycle. Rules
/// are evaluated in order; the first one that matches wins. An empty child
/// list vacuously satisfies "all children Complete".
pub fn aggregate(
    child_statuses: &[Status],
    candidate_statuses: &[Status],
    errors: &[String],
    is_interrupted: bool,
) -> Status {
    let any_child = |s: Status| child_statuses.iter().any(|c| *c == s);
    let any_candidate = |s: Status| candidate_statuses.iter().any(|c| *c == s);

    if !errors.is_empty() || any_child(Status::Error) {
        Status::Error
    } else if child_statuses.iter().all(|s| *s == Status::Complete) {
        Status::Complete
    } else if is_interrupted {
        Status::Waiting
    } else if any_child(Status::Prepared) {
        Status::InProgress
    } else if any_candidate(Status::Waiting) {
        Status::Waiting
    } else if any_candidate(Status::InProgress) {
        Status::InProgress
    } else if any_child(Status::Complete)
        && candidate_statuses
            .iter()
            .any(|c| matches!(c, Status::Pending | Status::Starting | Status::Started))
    {
        Status::InProgress
    } else if any_candidate(Status::Pending) {
        Status::Pending
    } else if any_child(Status::Waiting) {
        Status::Waiting
    } else if any_candidate(Status::Starting) {
        Status::Starting
    } else if any_candidate(Status::Started) {
        Status::Started
    } else {
        Status::Error
    }
}

impl Status {
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Complete | Status::Error)
    }
}
