use std::str::FromStr;

use rfqflow_core::workflow::engine::is_legal_transition;
use rfqflow_core::{ApplicationError, DomainError, StageId};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct TransitionCheck {
    from: StageId,
    to: StageId,
    allowed: bool,
}

pub fn run(from: &str, to: &str) -> CommandResult {
    let stages = StageId::from_str(from).and_then(|from| Ok((from, StageId::from_str(to)?)));
    let (from, to) = match stages {
        Ok(stages) => stages,
        Err(error) => return CommandResult::from_error("transition", &error.into()),
    };

    if !is_legal_transition(from, to) {
        let denial = ApplicationError::from(DomainError::InvalidTransition { from, to });
        return CommandResult::from_error("transition", &denial);
    }

    CommandResult::success_with_data(
        "transition",
        format!("transition from `{from}` to `{to}` is allowed"),
        &TransitionCheck { from, to, allowed: true },
    )
}
