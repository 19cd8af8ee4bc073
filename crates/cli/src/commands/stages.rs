use rfqflow_core::STAGES;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    CommandResult::success_with_data(
        "stages",
        format!("{} workflow stages in progression order", STAGES.len()),
        &STAGES,
    )
}
