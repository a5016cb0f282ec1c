//! A Phase (C7): a named, strategy-ordered group of steps within a plan.

use crate::plan::step::Step;
use crate::plan::strategy::{Element, Strategy};
use crate::status::{Status, aggregate};

pub struct Phase {
    pub name: String,
    pub steps: Vec<Step>,
    pub strategy: Strategy,
}

impl Phase {
    pub fn new(name: impl Into<String>, steps: Vec<Step>, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            steps,
            strategy,
        }
    }

    pub fn status(&self) -> Status {
        let children: Vec<Status> = self.steps.iter().map(Step::status).collect();
        let candidates: Vec<Status> = self.candidate_steps().iter().map(|s| s.status()).collect();
        // A phase carries no error list of its own; a step's errors only
        // ever block that step's own eligibility, surfacing here through
        // the step's Error status rather than through this parameter.
        aggregate(&children, &candidates, &[], false)
    }

    pub fn candidate_steps(&self) -> Vec<&Step> {
        self.strategy
            .candidate_indices(&self.steps)
            .into_iter()
            .map(|i| &self.steps[i])
            .collect()
    }
}

impl Element for Phase {
    fn status(&self) -> Status {
        Phase::status(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_phase_exposes_only_first_pending_step() {
        let phase = Phase::new(
            "p1",
            vec![Step::new("s1", None), Step::new("s2", None)],
            Strategy::Serial,
        );
        phase.steps[0].set_status(Status::Complete);
        let candidates: Vec<&str> = phase.candidate_steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(candidates, vec!["s2"]);
    }

    #[test]
    fn phase_status_aggregates_its_steps() {
        let phase = Phase::new("p1", vec![Step::new("s1", None)], Strategy::Serial);
        assert_eq!(phase.status(), Status::Pending);
        phase.steps[0].set_status(Status::Complete);
        assert_eq!(phase.status(), Status::Complete);
    }
}
