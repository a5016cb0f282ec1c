//! A Plan (C7): a named, strategy-ordered group of phases — the top of
//! the hierarchy the framework runner drives.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::model::PodInstanceRequirement;
use crate::plan::phase::Phase;
use crate::plan::step::Step;
use crate::plan::strategy::{Element, Strategy};
use crate::status::{Status, aggregate};

pub struct Plan {
    pub name: String,
    pub phases: Vec<Phase>,
    pub strategy: Strategy,
    interrupted: AtomicBool,
}

impl Plan {
    pub fn new(name: impl Into<String>, phases: Vec<Phase>, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            phases,
            strategy,
            interrupted: AtomicBool::new(false),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Relaxed)
    }

    pub fn set_interrupted(&self, interrupted: bool) {
        self.interrupted.store(interrupted, Ordering::Relaxed);
    }

    pub fn status(&self) -> Status {
        let children: Vec<Status> = self.phases.iter().map(Phase::status).collect();
        let candidates: Vec<Status> = self.candidate_phases().iter().map(|p| p.status()).collect();
        aggregate(&children, &candidates, &[], self.is_interrupted())
    }

    /// There is still work this plan wants done: not all phases are
    /// Complete, and nothing has interrupted the plan.
    pub fn has_operations(&self) -> bool {
        self.status() != Status::Complete && !self.is_interrupted()
    }

    pub fn candidate_phases(&self) -> Vec<&Phase> {
        self.strategy
            .candidate_indices(&self.phases)
            .into_iter()
            .map(|i| &self.phases[i])
            .collect()
    }

    fn all_steps(&self) -> impl Iterator<Item = &Step> {
        self.phases.iter().flat_map(|p| p.steps.iter())
    }
}

impl Element for Plan {
    fn status(&self) -> Status {
        Plan::status(self)
    }
}

/// Pod instances claimed by currently in-flight (not merely pending) steps
/// across every plan — the set a step's requirement must not conflict with
/// before it's allowed to start.
pub fn dirty_assets(plans: &[Plan]) -> Vec<PodInstanceRequirement> {
    plans
        .iter()
        .flat_map(Plan::all_steps)
        .filter(|s| s.is_dirty())
        .filter_map(|s| s.requirement.clone())
        .collect()
}

/// Every step, across every plan, that its plan's and phase's strategy
/// currently admits as a candidate and whose requirement doesn't conflict
/// with the dirty set. This is the Step list eligible to actually be
/// launched right now.
pub fn launchable_tasks(plans: &[Plan]) -> Vec<&Step> {
    let dirty = dirty_assets(plans);
    plans
        .iter()
        .filter(|plan| plan.has_operations())
        .flat_map(Plan::candidate_phases)
        .flat_map(Phase::candidate_steps)
        .filter(|step| step.is_eligible(&dirty))
        .collect()
}
