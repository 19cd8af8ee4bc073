use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::rfq::RfqSnapshot;
use crate::workflow::stages::{RfqAction, StageId};

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCode {
    DeadlinePassed,
    DeadlineImminent,
    NoResponses,
    LowResponseRate,
    BudgetExceeded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub code: AlertCode,
    pub message: String,
    pub action: RfqAction,
}

impl Alert {
    fn new(kind: AlertKind, code: AlertCode, action: RfqAction, message: String) -> Self {
        Self { kind, code, message, action }
    }
}

/// Day and percentage limits used by alert derivation and the overdue scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Warn when the deadline is closer than this.
    pub deadline_warning_days: u32,
    /// Flag a waiting RFQ without quotes once it was sent longer ago than this.
    pub no_response_days: u32,
    /// Response rate (received / invited) below which the RFQ is flagged.
    pub low_response_rate_pct: u32,
    /// Only flag a low response rate when the deadline is this close.
    pub low_response_window_days: u32,
    /// Staleness window for waiting RFQs that carry no deadline.
    pub overdue_days: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            deadline_warning_days: 2,
            no_response_days: 3,
            low_response_rate_pct: 50,
            low_response_window_days: 3,
            overdue_days: 7,
        }
    }
}

pub fn derive_alerts(
    rfq: &RfqSnapshot,
    now: DateTime<Utc>,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(deadline) = rfq.deadline {
        if deadline < now {
            alerts.push(Alert::new(
                AlertKind::Error,
                AlertCode::DeadlinePassed,
                RfqAction::ExtendDeadline,
                format!("Supplier response deadline passed on {}", deadline.format("%Y-%m-%d")),
            ));
        } else if deadline - now < days(thresholds.deadline_warning_days) {
            let remaining = whole_days_remaining(deadline - now);
            alerts.push(Alert::new(
                AlertKind::Warning,
                AlertCode::DeadlineImminent,
                RfqAction::RemindSuppliers,
                format!("Supplier response deadline in {remaining} day(s)"),
            ));
        }
    }

    if rfq.stage == StageId::Waiting && rfq.quotes.is_empty() {
        if let Some(sent_at) = rfq.sent_at {
            let elapsed = now - sent_at;
            if elapsed > days(thresholds.no_response_days) {
                alerts.push(Alert::new(
                    AlertKind::Warning,
                    AlertCode::NoResponses,
                    RfqAction::SendReminder,
                    format!(
                        "No supplier responses yet, {} day(s) after sending",
                        elapsed.num_days()
                    ),
                ));
            }
        }
    }

    if rfq.stage == StageId::Waiting && !rfq.suppliers.is_empty() && !rfq.quotes.is_empty() {
        let received = rfq.quotes.len();
        let invited = rfq.suppliers.len();
        let below_rate = received * 100 < invited * thresholds.low_response_rate_pct as usize;
        let deadline_close = rfq
            .deadline
            .is_some_and(|deadline| deadline - now < days(thresholds.low_response_window_days));

        if below_rate && deadline_close {
            alerts.push(Alert::new(
                AlertKind::Info,
                AlertCode::LowResponseRate,
                RfqAction::SendReminder,
                format!("Low response rate: {received}/{invited} suppliers have quoted"),
            ));
        }
    }

    if let (Some(budget), Some(lowest)) = (rfq.budget, rfq.lowest_quote()) {
        if lowest > budget {
            alerts.push(Alert::new(
                AlertKind::Warning,
                AlertCode::BudgetExceeded,
                RfqAction::ReviewBudget,
                format!("Lowest quote {lowest} exceeds budget {budget}"),
            ));
        }
    }

    alerts
}

pub(crate) fn days(count: u32) -> Duration {
    Duration::days(i64::from(count))
}

fn whole_days_remaining(remaining: Duration) -> i64 {
    let seconds = remaining.num_seconds().max(0);
    (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}
