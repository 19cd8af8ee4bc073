use std::path::Path;

use rfqflow_core::config::AppConfig;
use rfqflow_core::{Alert, ApplicationError, NextAction, RfqAction, RfqId, StageId};
use serde::Serialize;

use crate::commands::{load_snapshot, resolve_now, CommandResult};

#[derive(Debug, Serialize)]
struct InspectReport {
    rfq_id: RfqId,
    rfq_number: String,
    stage: StageId,
    stage_name: &'static str,
    progress: f64,
    next_action: Option<NextAction>,
    allowed_actions: Vec<RfqAction>,
    alerts: Vec<Alert>,
}

pub fn run(config: &AppConfig, file: &Path, now: Option<&str>) -> CommandResult {
    match inspect(config, file, now) {
        Ok(report) => CommandResult::success_with_data(
            "inspect",
            format!("rfq `{}` is in stage `{}`", report.rfq_number, report.stage),
            &report,
        ),
        Err(error) => CommandResult::from_error("inspect", &error),
    }
}

fn inspect(
    config: &AppConfig,
    file: &Path,
    now: Option<&str>,
) -> Result<InspectReport, ApplicationError> {
    let now = resolve_now(now)?;
    let rfq = load_snapshot(file)?;
    let workflow = config.workflow();
    let stage = rfq.stage.info();

    let alerts = workflow.alerts(&rfq, now);
    tracing::info!(
        event_name = "cli.inspect.completed",
        rfq_id = %rfq.id,
        stage = %rfq.stage,
        alert_count = alerts.len(),
        "rfq inspected"
    );

    Ok(InspectReport {
        progress: workflow.progress(&rfq),
        next_action: workflow.next_action(&rfq),
        allowed_actions: stage.allowed_actions.iter().collect(),
        stage_name: stage.name,
        stage: rfq.stage,
        rfq_id: rfq.id,
        rfq_number: rfq.rfq_number,
        alerts,
    })
}
