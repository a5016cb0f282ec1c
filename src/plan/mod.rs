//! Plan hierarchy (C7): Plan -> Phase -> Step, with strategy-driven
//! candidate selection and the JSON projection (C14) used to inspect it.

pub mod phase;
pub mod plan;
pub mod step;
pub mod strategy;
pub mod summary;

pub use phase::Phase;
pub use plan::{Plan, dirty_assets, launchable_tasks};
pub use step::Step;
pub use strategy::{Element, Strategy};
pub use summary::{PlanSummary, plan_summary};
