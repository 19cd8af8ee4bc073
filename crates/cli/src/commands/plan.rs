use std::path::{Path, PathBuf};
use std::str::FromStr;

use rfqflow_core::config::AppConfig;
use rfqflow_core::{
    ActionPlan, ActionRequest, ApplicationError, AuditContext, RfqAction, TracingAuditSink,
};
use uuid::Uuid;

use crate::commands::{load_snapshot, resolve_now, CommandResult};

#[derive(Debug, Clone)]
pub struct PlanArgs {
    pub file: PathBuf,
    pub action: String,
    pub actor: String,
    pub note: Option<String>,
    pub now: Option<String>,
}

pub fn run(config: &AppConfig, args: &PlanArgs) -> CommandResult {
    match plan(config, args) {
        Ok(plan) => {
            let message = if plan.changes_stage() {
                format!("`{}` moves rfq from `{}` to `{}`", plan.action, plan.from, plan.to)
            } else {
                format!("`{}` keeps rfq in `{}`", plan.action, plan.from)
            };
            CommandResult::success_with_data("plan", message, &plan)
        }
        Err(error) => CommandResult::from_error("plan", &error),
    }
}

fn plan(config: &AppConfig, args: &PlanArgs) -> Result<ActionPlan, ApplicationError> {
    let actor = args.actor.trim();
    if actor.is_empty() {
        return Err(ApplicationError::Input("actor must not be empty".to_string()));
    }

    let action = RfqAction::from_str(&args.action)?;
    let requested_at = resolve_now(args.now.as_deref())?;
    let rfq = load_snapshot(Path::new(&args.file))?;

    let mut request = ActionRequest::new(action, actor, requested_at);
    if let Some(note) = args.note.as_deref().filter(|note| !note.trim().is_empty()) {
        request = request.with_note(note);
    }

    let audit = AuditContext::new(Some(rfq.id.clone()), Uuid::new_v4().to_string(), actor);
    let plan = config.workflow().plan_action_with_audit(&rfq, &request, &TracingAuditSink, &audit)?;
    Ok(plan)
}
