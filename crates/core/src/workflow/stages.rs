use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::errors::DomainError;

pub const STAGE_COUNT: usize = 9;

/// Stage identifiers in workflow order. The discriminant is the position in
/// [`STAGES`], so `Ord` follows workflow progression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Draft,
    NeedsApproval,
    Approved,
    Sent,
    Waiting,
    Comparing,
    Selected,
    PoCreated,
    Closed,
}

impl StageId {
    pub const ALL: [StageId; STAGE_COUNT] = [
        StageId::Draft,
        StageId::NeedsApproval,
        StageId::Approved,
        StageId::Sent,
        StageId::Waiting,
        StageId::Comparing,
        StageId::Selected,
        StageId::PoCreated,
        StageId::Closed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::NeedsApproval => "needs_approval",
            Self::Approved => "approved",
            Self::Sent => "sent",
            Self::Waiting => "waiting",
            Self::Comparing => "comparing",
            Self::Selected => "selected",
            Self::PoCreated => "po_created",
            Self::Closed => "closed",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    /// A PO exists or the RFQ is closed; supplier deadlines no longer apply.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::PoCreated | Self::Closed)
    }

    pub fn info(self) -> &'static Stage {
        &STAGES[self.index()]
    }

    pub fn allows(self, action: RfqAction) -> bool {
        self.info().allowed_actions.contains(action)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == value)
            .ok_or_else(|| DomainError::UnknownStage(value.to_owned()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RfqAction {
    Edit,
    Delete,
    InviteSupplier,
    SubmitForApproval,
    Approve,
    Reject,
    Recall,
    Send,
    AwaitResponses,
    RecordQuote,
    SendReminder,
    RemindSuppliers,
    ExtendDeadline,
    ReviewBudget,
    Compare,
    Select,
    CreatePo,
    Close,
}

impl RfqAction {
    pub const ALL: [RfqAction; 18] = [
        RfqAction::Edit,
        RfqAction::Delete,
        RfqAction::InviteSupplier,
        RfqAction::SubmitForApproval,
        RfqAction::Approve,
        RfqAction::Reject,
        RfqAction::Recall,
        RfqAction::Send,
        RfqAction::AwaitResponses,
        RfqAction::RecordQuote,
        RfqAction::SendReminder,
        RfqAction::RemindSuppliers,
        RfqAction::ExtendDeadline,
        RfqAction::ReviewBudget,
        RfqAction::Compare,
        RfqAction::Select,
        RfqAction::CreatePo,
        RfqAction::Close,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::InviteSupplier => "invite_supplier",
            Self::SubmitForApproval => "submit_for_approval",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Recall => "recall",
            Self::Send => "send",
            Self::AwaitResponses => "await_responses",
            Self::RecordQuote => "record_quote",
            Self::SendReminder => "send_reminder",
            Self::RemindSuppliers => "remind_suppliers",
            Self::ExtendDeadline => "extend_deadline",
            Self::ReviewBudget => "review_budget",
            Self::Compare => "compare",
            Self::Select => "select",
            Self::CreatePo => "create_po",
            Self::Close => "close",
        }
    }

    /// Stage an action moves the RFQ into, or `None` when the action leaves
    /// the stage untouched.
    pub fn target_stage(self) -> Option<StageId> {
        match self {
            Self::SubmitForApproval => Some(StageId::NeedsApproval),
            Self::Approve => Some(StageId::Approved),
            Self::Reject | Self::Recall => Some(StageId::Draft),
            Self::Send => Some(StageId::Sent),
            Self::AwaitResponses => Some(StageId::Waiting),
            Self::Compare => Some(StageId::Comparing),
            Self::Select => Some(StageId::Selected),
            Self::CreatePo => Some(StageId::PoCreated),
            Self::Close => Some(StageId::Closed),
            Self::Edit
            | Self::Delete
            | Self::InviteSupplier
            | Self::RecordQuote
            | Self::SendReminder
            | Self::RemindSuppliers
            | Self::ExtendDeadline
            | Self::ReviewBudget => None,
        }
    }
}

impl fmt::Display for RfqAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RfqAction {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| DomainError::UnknownAction(value.to_owned()))
    }
}

/// Fixed-size bit set over [`RfqAction`], usable in `const` tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ActionSet(u32);

impl ActionSet {
    pub const EMPTY: Self = Self(0);

    pub const fn of(actions: &[RfqAction]) -> Self {
        let mut bits = 0u32;
        let mut i = 0;
        while i < actions.len() {
            bits |= Self::bit(actions[i]);
            i += 1;
        }
        Self(bits)
    }

    const fn bit(action: RfqAction) -> u32 {
        1u32 << (action as u32)
    }

    pub const fn contains(self, action: RfqAction) -> bool {
        self.0 & Self::bit(action) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = RfqAction> {
        RfqAction::ALL.into_iter().filter(move |action| self.contains(*action))
    }
}

impl Serialize for ActionSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Stage {
    pub id: StageId,
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub allowed_actions: ActionSet,
}

pub static STAGES: [Stage; STAGE_COUNT] = [
    Stage {
        id: StageId::Draft,
        name: "Draft",
        description: "RFQ is being prepared and can still be edited",
        color: "gray",
        allowed_actions: ActionSet::of(&[
            RfqAction::Edit,
            RfqAction::Delete,
            RfqAction::InviteSupplier,
            RfqAction::SubmitForApproval,
        ]),
    },
    Stage {
        id: StageId::NeedsApproval,
        name: "Needs approval",
        description: "Waiting for an approver to release the RFQ",
        color: "orange",
        allowed_actions: ActionSet::of(&[RfqAction::Approve, RfqAction::Reject, RfqAction::Recall]),
    },
    Stage {
        id: StageId::Approved,
        name: "Approved",
        description: "Approved and ready to be sent to suppliers",
        color: "teal",
        allowed_actions: ActionSet::of(&[RfqAction::InviteSupplier, RfqAction::Send]),
    },
    Stage {
        id: StageId::Sent,
        name: "Sent",
        description: "Sent to the invited suppliers",
        color: "blue",
        allowed_actions: ActionSet::of(&[
            RfqAction::AwaitResponses,
            RfqAction::Recall,
            RfqAction::RecordQuote,
            RfqAction::SendReminder,
            RfqAction::RemindSuppliers,
            RfqAction::ExtendDeadline,
        ]),
    },
    Stage {
        id: StageId::Waiting,
        name: "Waiting for quotes",
        description: "Collecting supplier quotes until the deadline",
        color: "yellow",
        allowed_actions: ActionSet::of(&[
            RfqAction::RecordQuote,
            RfqAction::SendReminder,
            RfqAction::RemindSuppliers,
            RfqAction::ExtendDeadline,
            RfqAction::ReviewBudget,
            RfqAction::Compare,
        ]),
    },
    Stage {
        id: StageId::Comparing,
        name: "Comparing",
        description: "Received quotes are being compared",
        color: "purple",
        allowed_actions: ActionSet::of(&[
            RfqAction::RecordQuote,
            RfqAction::ExtendDeadline,
            RfqAction::ReviewBudget,
            RfqAction::Select,
        ]),
    },
    Stage {
        id: StageId::Selected,
        name: "Supplier selected",
        description: "A winning quote has been selected",
        color: "indigo",
        allowed_actions: ActionSet::of(&[RfqAction::ReviewBudget, RfqAction::CreatePo]),
    },
    Stage {
        id: StageId::PoCreated,
        name: "PO created",
        description: "A purchase order was issued to the selected supplier",
        color: "green",
        allowed_actions: ActionSet::of(&[RfqAction::Close]),
    },
    Stage {
        id: StageId::Closed,
        name: "Closed",
        description: "RFQ completed",
        color: "slate",
        allowed_actions: ActionSet::EMPTY,
    },
];

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ActionSet, RfqAction, StageId, STAGES};
    use crate::errors::DomainError;

    #[test]
    fn table_positions_match_stage_discriminants() {
        for (index, stage) in STAGES.iter().enumerate() {
            assert_eq!(stage.id.index(), index, "stage {} is out of place", stage.id);
            assert_eq!(StageId::ALL[index], stage.id);
        }
    }

    #[test]
    fn stage_ids_round_trip_through_their_identifiers() {
        for stage in StageId::ALL {
            assert_eq!(StageId::from_str(stage.as_str()), Ok(stage));
        }
        assert_eq!(
            StageId::from_str("archived"),
            Err(DomainError::UnknownStage("archived".to_owned()))
        );
        assert!(StageId::from_str("Draft").is_err());
    }

    #[test]
    fn serde_identifiers_match_display() {
        for stage in StageId::ALL {
            let encoded = serde_json::to_string(&stage).expect("serialize stage");
            assert_eq!(encoded, format!("\"{stage}\""));
        }
        for action in RfqAction::ALL {
            let encoded = serde_json::to_string(&action).expect("serialize action");
            assert_eq!(encoded, format!("\"{action}\""));
        }
    }

    #[test]
    fn action_set_membership() {
        let set = ActionSet::of(&[RfqAction::Send, RfqAction::Close]);
        assert!(set.contains(RfqAction::Send));
        assert!(set.contains(RfqAction::Close));
        assert!(!set.contains(RfqAction::Edit));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![RfqAction::Send, RfqAction::Close]);
        assert!(ActionSet::EMPTY.is_empty());
    }

    #[test]
    fn closed_is_the_only_stage_without_actions() {
        for stage in &STAGES {
            assert_eq!(stage.allowed_actions.is_empty(), stage.id == StageId::Closed);
        }
    }

    #[test]
    fn settled_stages_are_po_created_and_closed() {
        let settled: Vec<_> = StageId::ALL.into_iter().filter(|stage| stage.is_settled()).collect();
        assert_eq!(settled, vec![StageId::PoCreated, StageId::Closed]);
        assert!(StageId::Closed.is_last());
    }

    #[test]
    fn stage_serializes_allowed_actions_as_identifiers() {
        let encoded = serde_json::to_value(StageId::Approved.info()).expect("serialize stage");
        assert_eq!(encoded["id"], "approved");
        assert_eq!(encoded["allowed_actions"], serde_json::json!(["invite_supplier", "send"]));
    }
}
