use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rfq::RfqSnapshot;
use crate::workflow::alerts::days;
use crate::workflow::stages::StageId;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTally {
    pub count: usize,
    pub total_value: Decimal,
}

/// Per-stage tallies keyed in workflow order. Every stage is present, even
/// when no RFQ currently sits in it.
pub type StageStatistics = BTreeMap<StageId, StageTally>;

/// RFQs that still expect supplier activity but are late: either the deadline
/// has passed, or no deadline was set and the RFQ has been waiting for more
/// than `stale_after_days` since it was sent.
pub fn overdue_rfqs(
    rfqs: &[RfqSnapshot],
    now: DateTime<Utc>,
    stale_after_days: u32,
) -> Vec<&RfqSnapshot> {
    rfqs.iter()
        .filter(|rfq| !rfq.stage.is_settled())
        .filter(|rfq| match rfq.deadline {
            Some(deadline) => deadline < now,
            None => {
                rfq.stage == StageId::Waiting
                    && rfq.sent_at.is_some_and(|sent_at| now - sent_at > days(stale_after_days))
            }
        })
        .collect()
}

pub fn no_response_rfqs(rfqs: &[RfqSnapshot]) -> Vec<&RfqSnapshot> {
    rfqs.iter().filter(|rfq| rfq.stage == StageId::Waiting && rfq.quotes.is_empty()).collect()
}

pub fn stage_statistics(rfqs: &[RfqSnapshot]) -> StageStatistics {
    let mut statistics: StageStatistics =
        StageId::ALL.into_iter().map(|stage| (stage, StageTally::default())).collect();

    for rfq in rfqs {
        let tally = statistics.entry(rfq.stage).or_default();
        tally.count += 1;
        tally.total_value += rfq.estimated_cost.unwrap_or(Decimal::ZERO);
    }

    statistics
}
