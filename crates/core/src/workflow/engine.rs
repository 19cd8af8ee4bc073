use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::audit::{AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::rfq::{RfqId, RfqSnapshot, TimelineEntry};
use crate::errors::DomainError;
use crate::workflow::alerts::{derive_alerts, Alert, AlertThresholds};
use crate::workflow::stages::{RfqAction, Stage, StageId, STAGES, STAGE_COUNT};
use crate::workflow::stats::{self, StageStatistics};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NextAction {
    pub action: RfqAction,
    pub label: &'static str,
    pub icon: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: RfqAction,
    pub actor: String,
    pub note: Option<String>,
    pub requested_at: DateTime<Utc>,
}

impl ActionRequest {
    pub fn new(action: RfqAction, actor: impl Into<String>, requested_at: DateTime<Utc>) -> Self {
        Self { action, actor: actor.into(), note: None, requested_at }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Mutation the caller should persist after an accepted action. `from == to`
/// for actions that do not move the RFQ.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub rfq_id: RfqId,
    pub action: RfqAction,
    pub from: StageId,
    pub to: StageId,
    pub timeline_entry: TimelineEntry,
}

impl ActionPlan {
    pub fn changes_stage(&self) -> bool {
        self.from != self.to
    }
}

/// Single forward step, or the recall/rejection edge back to draft.
pub fn is_legal_transition(current: StageId, target: StageId) -> bool {
    if current.next() == Some(target) {
        return true;
    }

    target == StageId::Draft && matches!(current, StageId::Sent | StageId::NeedsApproval)
}

pub fn progress_percent(stage: StageId) -> f64 {
    (stage.index() + 1) as f64 / STAGE_COUNT as f64 * 100.0
}

pub fn next_action_for(rfq: &RfqSnapshot) -> Option<NextAction> {
    let next = |action, label, icon| Some(NextAction { action, label, icon });

    match rfq.stage {
        StageId::Draft => next(RfqAction::SubmitForApproval, "Submit for approval", "send"),
        StageId::NeedsApproval => next(RfqAction::Approve, "Approve RFQ", "check-circle"),
        StageId::Approved => next(RfqAction::Send, "Send to suppliers", "mail"),
        StageId::Sent | StageId::Waiting if rfq.quotes.is_empty() => {
            next(RfqAction::SendReminder, "Remind suppliers", "bell")
        }
        StageId::Sent | StageId::Waiting => next(RfqAction::Compare, "Compare quotes", "scale"),
        StageId::Comparing => next(RfqAction::Select, "Select supplier", "award"),
        StageId::Selected => next(RfqAction::CreatePo, "Create purchase order", "file-text"),
        StageId::PoCreated => next(RfqAction::Close, "Close RFQ", "archive"),
        StageId::Closed => None,
    }
}

pub fn plan_action(rfq: &RfqSnapshot, request: &ActionRequest) -> Result<ActionPlan, DomainError> {
    let from = rfq.stage;
    let action = request.action;

    if !from.allows(action) {
        return Err(DomainError::ActionNotAllowed { stage: from, action });
    }

    let to = match action.target_stage() {
        Some(target) if is_legal_transition(from, target) => target,
        Some(target) => return Err(DomainError::InvalidTransition { from, to: target }),
        None => from,
    };

    Ok(ActionPlan {
        rfq_id: rfq.id.clone(),
        action,
        from,
        to,
        timeline_entry: TimelineEntry {
            rfq_id: rfq.id.clone(),
            action,
            from,
            to,
            actor: request.actor.clone(),
            note: request.note.clone(),
            occurred_at: request.requested_at,
        },
    })
}

/// Entry point used by request handlers. Holds only the alert thresholds;
/// the stage table itself is static.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RfqWorkflow {
    thresholds: AlertThresholds,
}

impl RfqWorkflow {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    pub fn stages(&self) -> &'static [Stage] {
        &STAGES
    }

    pub fn stage_info(&self, stage_id: &str) -> Option<&'static Stage> {
        StageId::from_str(stage_id).ok().map(StageId::info)
    }

    pub fn can_perform_action(&self, stage_id: &str, action: &str) -> bool {
        match (StageId::from_str(stage_id), RfqAction::from_str(action)) {
            (Ok(stage), Ok(action)) => stage.allows(action),
            _ => false,
        }
    }

    /// Unknown identifiers on either side are never legal, including the
    /// backward edge to draft.
    pub fn can_transition_to(&self, current: &str, target: &str) -> bool {
        match (StageId::from_str(current), StageId::from_str(target)) {
            (Ok(current), Ok(target)) => is_legal_transition(current, target),
            _ => false,
        }
    }

    pub fn move_to_next_stage(&self, current: &str) -> Option<&'static Stage> {
        StageId::from_str(current).ok().and_then(StageId::next).map(StageId::info)
    }

    pub fn alerts(&self, rfq: &RfqSnapshot, now: DateTime<Utc>) -> Vec<Alert> {
        derive_alerts(rfq, now, &self.thresholds)
    }

    pub fn progress(&self, rfq: &RfqSnapshot) -> f64 {
        progress_percent(rfq.stage)
    }

    pub fn progress_for_stage(&self, stage_id: &str) -> Result<f64, DomainError> {
        StageId::from_str(stage_id).map(progress_percent)
    }

    pub fn next_action(&self, rfq: &RfqSnapshot) -> Option<NextAction> {
        next_action_for(rfq)
    }

    pub fn overdue<'a>(&self, rfqs: &'a [RfqSnapshot], now: DateTime<Utc>) -> Vec<&'a RfqSnapshot> {
        stats::overdue_rfqs(rfqs, now, self.thresholds.overdue_days)
    }

    pub fn no_response<'a>(&self, rfqs: &'a [RfqSnapshot]) -> Vec<&'a RfqSnapshot> {
        stats::no_response_rfqs(rfqs)
    }

    pub fn stage_statistics(&self, rfqs: &[RfqSnapshot]) -> StageStatistics {
        stats::stage_statistics(rfqs)
    }

    pub fn plan_action(
        &self,
        rfq: &RfqSnapshot,
        request: &ActionRequest,
    ) -> Result<ActionPlan, DomainError> {
        let result = plan_action(rfq, request);
        match &result {
            Ok(plan) => debug!(
                event_name = "rfq.action.planned",
                rfq_id = %rfq.id,
                action = %plan.action,
                from = %plan.from,
                to = %plan.to,
                "rfq action accepted"
            ),
            Err(error) => info!(
                event_name = "rfq.action.denied",
                rfq_id = %rfq.id,
                action = %request.action,
                stage = %rfq.stage,
                error = %error,
                "rfq action denied"
            ),
        }
        result
    }

    pub fn plan_action_with_audit<S>(
        &self,
        rfq: &RfqSnapshot,
        request: &ActionRequest,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<ActionPlan, DomainError>
    where
        S: AuditSink,
    {
        let result = self.plan_action(rfq, request);
        match &result {
            Ok(plan) => sink.emit(
                AuditEvent::new(
                    audit,
                    "rfq.action_planned",
                    AuditOutcome::Accepted,
                    request.requested_at,
                )
                .with_metadata("action", plan.action.as_str())
                .with_metadata("from", plan.from.as_str())
                .with_metadata("to", plan.to.as_str()),
            ),
            Err(error) => sink.emit(
                AuditEvent::new(
                    audit,
                    "rfq.action_rejected",
                    AuditOutcome::Rejected,
                    request.requested_at,
                )
                .with_metadata("action", request.action.as_str())
                .with_metadata("stage", rfq.stage.as_str())
                .with_metadata("error", error.to_string()),
            ),
        }
        result
    }
}
