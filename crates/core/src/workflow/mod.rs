pub mod alerts;
pub mod engine;
pub mod stages;
pub mod stats;

#[cfg(test)]
mod property_tests;

pub use alerts::{Alert, AlertCode, AlertKind, AlertThresholds};
pub use engine::{ActionPlan, ActionRequest, NextAction, RfqWorkflow};
pub use stages::{ActionSet, RfqAction, Stage, StageId, STAGES};
pub use stats::{StageStatistics, StageTally};
