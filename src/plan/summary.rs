//! Plan JSON projection (C14): a pure, serializable snapshot of a plan's
//! current state, with no HTTP wiring of its own — an embedder's query
//! layer calls `plan_summary` and serves the result however it likes.

use serde::Serialize;

use crate::plan::phase::Phase;
use crate::plan::plan::Plan;
use crate::plan::step::Step;
use crate::status::Status;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepSummary {
    pub name: String,
    pub status: Status,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub name: String,
    pub status: Status,
    pub steps: Vec<StepSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanSummary {
    pub name: String,
    pub status: Status,
    pub phases: Vec<PhaseSummary>,
}

fn step_summary(step: &Step) -> StepSummary {
    StepSummary {
        name: step.name.clone(),
        status: step.status(),
    }
}

fn phase_summary(phase: &Phase) -> PhaseSummary {
    PhaseSummary {
        name: phase.name.clone(),
        status: phase.status(),
        steps: phase.steps.iter().map(step_summary).collect(),
    }
}

pub fn plan_summary(plan: &Plan) -> PlanSummary {
    PlanSummary {
        name: plan.name.clone(),
        status: plan.status(),
        phases: plan.phases.iter().map(phase_summary).collect(),
    }
}
