use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::DomainError;
use crate::workflow::stages::{RfqAction, StageId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RfqId(pub String);

impl fmt::Display for RfqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRef {
    #[serde(alias = "supplierId")]
    pub supplier_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl SupplierRef {
    pub fn new(supplier_id: impl Into<String>) -> Self {
        Self { supplier_id: supplier_id.into(), name: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReceivedQuote {
    #[serde(default, alias = "supplierId")]
    pub supplier_id: Option<String>,
    #[serde(alias = "totalPrice")]
    pub total_price: Decimal,
    #[serde(default, alias = "receivedAt")]
    pub received_at: Option<DateTime<Utc>>,
}

impl ReceivedQuote {
    pub fn priced(total_price: Decimal) -> Self {
        Self { supplier_id: None, total_price, received_at: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub rfq_id: RfqId,
    pub action: RfqAction,
    pub from: StageId,
    pub to: StageId,
    pub actor: String,
    #[serde(default)]
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Read-only view of an RFQ aggregate as loaded by the persistence layer.
///
/// Collections that are absent or `null` in the source document deserialize
/// as empty, so the workflow functions never have to special-case them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RfqSnapshot {
    pub id: RfqId,
    #[serde(alias = "rfqNumber")]
    pub rfq_number: String,
    pub stage: StageId,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, alias = "sentAt")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub budget: Option<Decimal>,
    #[serde(default, alias = "estimatedCost")]
    pub estimated_cost: Option<Decimal>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suppliers: Vec<SupplierRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub quotes: Vec<ReceivedQuote>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timeline: Vec<TimelineEntry>,
}

impl RfqSnapshot {
    pub fn new(id: impl Into<String>, rfq_number: impl Into<String>, stage: StageId) -> Self {
        Self {
            id: RfqId(id.into()),
            rfq_number: rfq_number.into(),
            stage,
            deadline: None,
            sent_at: None,
            budget: None,
            estimated_cost: None,
            suppliers: Vec::new(),
            quotes: Vec::new(),
            timeline: Vec::new(),
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_sent_at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.sent_at = Some(sent_at);
        self
    }

    pub fn with_budget(mut self, budget: Decimal) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_estimated_cost(mut self, estimated_cost: Decimal) -> Self {
        self.estimated_cost = Some(estimated_cost);
        self
    }

    pub fn with_suppliers(mut self, suppliers: Vec<SupplierRef>) -> Self {
        self.suppliers = suppliers;
        self
    }

    pub fn with_quotes(mut self, quotes: Vec<ReceivedQuote>) -> Self {
        self.quotes = quotes;
        self
    }

    /// Builds a snapshot from an untyped document, reporting an unrecognized
    /// `stage` as [`DomainError::UnknownStage`] instead of a generic decode
    /// failure.
    pub fn from_json_value(value: Value) -> Result<Self, DomainError> {
        if let Some(stage) = value.get("stage").and_then(Value::as_str) {
            StageId::from_str(stage)?;
        }

        serde_json::from_value(value)
            .map_err(|error| DomainError::InvalidSnapshot(error.to_string()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DomainError> {
        let value = serde_json::from_str::<Value>(raw)
            .map_err(|error| DomainError::InvalidSnapshot(error.to_string()))?;
        Self::from_json_value(value)
    }

    pub fn lowest_quote(&self) -> Option<Decimal> {
        self.quotes.iter().map(|quote| quote.total_price).min()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{ReceivedQuote, RfqSnapshot};
    use crate::errors::DomainError;
    use crate::workflow::stages::StageId;

    #[test]
    fn missing_and_null_collections_become_empty() {
        let snapshot = RfqSnapshot::from_json_str(
            r#"{"id":"rfq-1","rfq_number":"RFQ-2026-0001","stage":"waiting","suppliers":null}"#,
        )
        .expect("snapshot should decode");

        assert_eq!(snapshot.stage, StageId::Waiting);
        assert!(snapshot.suppliers.is_empty());
        assert!(snapshot.quotes.is_empty());
        assert!(snapshot.timeline.is_empty());
        assert_eq!(snapshot.deadline, None);
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let snapshot = RfqSnapshot::from_json_str(
            r#"{
                "id": "rfq-2",
                "rfqNumber": "RFQ-2026-0002",
                "stage": "comparing",
                "sentAt": "2026-03-01T09:00:00Z",
                "estimatedCost": 1200.50,
                "budget": "1500",
                "suppliers": [{"supplierId": "sup-1"}, {"supplier_id": "sup-2", "name": "Acme"}],
                "quotes": [{"supplierId": "sup-1", "totalPrice": 1100}]
            }"#,
        )
        .expect("snapshot should decode");

        assert_eq!(snapshot.rfq_number, "RFQ-2026-0002");
        assert!(snapshot.sent_at.is_some());
        assert_eq!(snapshot.estimated_cost, Some(Decimal::new(120_050, 2)));
        assert_eq!(snapshot.budget, Some(Decimal::new(1500, 0)));
        assert_eq!(snapshot.suppliers[1].name.as_deref(), Some("Acme"));
        assert_eq!(snapshot.lowest_quote(), Some(Decimal::new(1100, 0)));
    }

    #[test]
    fn unknown_stage_is_a_domain_error() {
        let error = RfqSnapshot::from_json_str(
            r#"{"id":"rfq-3","rfq_number":"RFQ-3","stage":"on_hold"}"#,
        )
        .expect_err("unknown stage must be rejected");

        assert_eq!(error, DomainError::UnknownStage("on_hold".to_owned()));
    }

    #[test]
    fn structurally_broken_documents_are_invalid_snapshots() {
        let error = RfqSnapshot::from_json_str(r#"{"id":"rfq-4","stage":"draft"}"#)
            .expect_err("rfq_number is required");
        assert!(matches!(
            error,
            DomainError::InvalidSnapshot(ref message) if message.contains("rfq_number")
        ));

        let error = RfqSnapshot::from_json_str("not json").expect_err("garbage must be rejected");
        assert!(matches!(error, DomainError::InvalidSnapshot(_)));
    }

    #[test]
    fn lowest_quote_is_none_without_quotes() {
        let snapshot = RfqSnapshot::new("rfq-5", "RFQ-5", StageId::Waiting);
        assert_eq!(snapshot.lowest_quote(), None);

        let snapshot = snapshot.with_quotes(vec![
            ReceivedQuote::priced(Decimal::new(900, 0)),
            ReceivedQuote::priced(Decimal::new(450, 0)),
        ]);
        assert_eq!(snapshot.lowest_quote(), Some(Decimal::new(450, 0)));
    }
}
