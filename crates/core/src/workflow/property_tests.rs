//! Property-based checks for the transition relation and derived signals.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::domain::rfq::{ReceivedQuote, RfqSnapshot, SupplierRef};
use crate::workflow::engine::{is_legal_transition, plan_action, progress_percent, ActionRequest};
use crate::workflow::stages::{RfqAction, StageId};
use crate::workflow::{AlertCode, AlertKind, AlertThresholds, RfqWorkflow};

fn any_stage() -> impl Strategy<Value = StageId> {
    (0..StageId::ALL.len()).prop_map(|index| StageId::ALL[index])
}

fn any_action() -> impl Strategy<Value = RfqAction> {
    (0..RfqAction::ALL.len()).prop_map(|index| RfqAction::ALL[index])
}

fn any_snapshot() -> impl Strategy<Value = RfqSnapshot> {
    (
        any_stage(),
        0usize..6,
        prop::collection::vec(1i64..100_000, 0..6),
        prop::option::of(-240i64..240),
        prop::option::of(0i64..480),
        prop::option::of(1i64..100_000),
    )
        .prop_map(|(stage, supplier_count, prices, deadline_hours, sent_hours_ago, budget)| {
            let now = fixed_now();
            let mut rfq = RfqSnapshot::new("rfq-prop", "RFQ-PROP", stage)
                .with_suppliers(
                    (0..supplier_count).map(|n| SupplierRef::new(format!("sup-{n}"))).collect(),
                )
                .with_quotes(
                    prices.into_iter().map(|p| ReceivedQuote::priced(Decimal::new(p, 0))).collect(),
                );
            rfq.deadline = deadline_hours.map(|hours| now + Duration::hours(hours));
            rfq.sent_at = sent_hours_ago.map(|hours| now - Duration::hours(hours));
            rfq.budget = budget.map(|value| Decimal::new(value, 0));
            rfq
        })
}

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).single().expect("valid fixture instant")
}

proptest! {
    #[test]
    fn transition_relation_is_exactly_step_or_recall(from in any_stage(), to in any_stage()) {
        let step = to.index() == from.index() + 1;
        let recall = to == StageId::Draft
            && matches!(from, StageId::Sent | StageId::NeedsApproval);

        prop_assert_eq!(is_legal_transition(from, to), step || recall);
        prop_assert_eq!(
            RfqWorkflow::default().can_transition_to(from.as_str(), to.as_str()),
            step || recall
        );
    }

    #[test]
    fn progress_grows_with_every_forward_step(stage in any_stage()) {
        match stage.next() {
            Some(next) => {
                prop_assert!(progress_percent(next) > progress_percent(stage));
                prop_assert!(progress_percent(stage) < 100.0);
            }
            None => prop_assert_eq!(progress_percent(stage), 100.0),
        }
    }

    #[test]
    fn alerts_are_a_pure_function_of_snapshot_and_clock(rfq in any_snapshot()) {
        let workflow = RfqWorkflow::new(AlertThresholds::default());
        let first = workflow.alerts(&rfq, fixed_now());
        let second = workflow.alerts(&rfq, fixed_now());

        prop_assert_eq!(first, second);
    }

    #[test]
    fn passed_deadline_yields_exactly_one_error(
        mut rfq in any_snapshot(),
        hours_late in 1i64..240,
    ) {
        rfq.deadline = Some(fixed_now() - Duration::hours(hours_late));
        let alerts = RfqWorkflow::default().alerts(&rfq, fixed_now());

        let errors: Vec<_> = alerts.iter().filter(|alert| alert.kind == AlertKind::Error).collect();
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors[0].code, AlertCode::DeadlinePassed);
        prop_assert_eq!(errors[0].action, RfqAction::ExtendDeadline);
        prop_assert!(!alerts.iter().any(|alert| alert.code == AlertCode::DeadlineImminent));
    }

    #[test]
    fn planning_never_mutates_and_stays_legal(rfq in any_snapshot(), action in any_action()) {
        let original = rfq.clone();
        let request = ActionRequest::new(action, "prop-actor", fixed_now());

        if let Ok(plan) = plan_action(&rfq, &request) {
            prop_assert!(rfq.stage.allows(action));
            prop_assert!(plan.from == plan.to || is_legal_transition(plan.from, plan.to));
            prop_assert_eq!(plan.timeline_entry.from, plan.from);
            prop_assert_eq!(plan.timeline_entry.to, plan.to);
        } else {
            prop_assert!(!rfq.stage.allows(action));
        }
        prop_assert_eq!(rfq, original);
    }
}
