//! Candidate-selection strategy (part of C7): controls which of a Phase's
//! steps, or a Plan's phases, are currently eligible to start.

use serde::{Deserialize, Serialize};

use crate::status::Status;

pub trait Element {
    fn status(&self) -> Status;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Only the first non-terminal child is a candidate; children run one
    /// at a time, in declaration order.
    Serial,
    /// Every non-terminal child is a candidate simultaneously.
    Parallel,
}

impl Strategy {
    /// Indices of the children that this strategy currently admits as
    /// candidates to start/continue work on.
    pub fn candidate_indices<T: Element>(&self, elements: &[T]) -> Vec<usize> {
        match self {
            Strategy::Serial => elements
                .iter()
                .position(|e| !e.status().is_terminal())
                .into_iter()
                .collect(),
            Strategy::Parallel => elements
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.status().is_terminal())
                .map(|(i, _)| i)
                .collect(),
        }
    }
}
