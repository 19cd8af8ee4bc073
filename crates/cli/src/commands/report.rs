use std::path::Path;

use rfqflow_core::config::AppConfig;
use rfqflow_core::{ApplicationError, RfqId, RfqSnapshot, StageStatistics};
use serde::Serialize;
use serde_json::Value;

use crate::commands::{read_json_file, resolve_now, CommandResult};

#[derive(Debug, Serialize)]
struct RejectedRecord {
    index: usize,
    error: String,
}

#[derive(Debug, Serialize)]
struct PipelineReport {
    total: usize,
    statistics: StageStatistics,
    overdue: Vec<RfqId>,
    no_response: Vec<RfqId>,
    rejected: Vec<RejectedRecord>,
}

pub fn run(config: &AppConfig, file: &Path, now: Option<&str>) -> CommandResult {
    match report(config, file, now) {
        Ok(report) => CommandResult::success_with_data(
            "report",
            format!(
                "{} rfqs evaluated, {} overdue, {} rejected",
                report.total,
                report.overdue.len(),
                report.rejected.len()
            ),
            &report,
        ),
        Err(error) => CommandResult::from_error("report", &error),
    }
}

fn report(
    config: &AppConfig,
    file: &Path,
    now: Option<&str>,
) -> Result<PipelineReport, ApplicationError> {
    let now = resolve_now(now)?;
    let workflow = config.workflow();

    let Value::Array(records) = read_json_file(file)? else {
        return Err(ApplicationError::Input(format!(
            "`{}` must contain a JSON array of rfq snapshots",
            file.display()
        )));
    };

    let mut rfqs: Vec<RfqSnapshot> = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        match RfqSnapshot::from_json_value(record) {
            Ok(rfq) => rfqs.push(rfq),
            Err(error) => {
                tracing::warn!(
                    event_name = "cli.report.record_rejected",
                    index,
                    error = %error,
                    "skipping rfq record"
                );
                rejected.push(RejectedRecord { index, error: error.to_string() });
            }
        }
    }

    Ok(PipelineReport {
        total: rfqs.len(),
        statistics: workflow.stage_statistics(&rfqs),
        overdue: ids(workflow.overdue(&rfqs, now)),
        no_response: ids(workflow.no_response(&rfqs)),
        rejected,
    })
}

fn ids(selected: Vec<&RfqSnapshot>) -> Vec<RfqId> {
    selected.into_iter().map(|rfq| rfq.id.clone()).collect()
}
