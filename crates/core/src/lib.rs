pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod workflow;

pub use audit::{
    AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use domain::rfq::{ReceivedQuote, RfqId, RfqSnapshot, SupplierRef, TimelineEntry};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use workflow::{
    ActionPlan, ActionRequest, ActionSet, Alert, AlertCode, AlertKind, AlertThresholds,
    NextAction, RfqAction, RfqWorkflow, Stage, StageId, StageStatistics, StageTally, STAGES,
};
