use serde::{Deserialize, Serialize};

use super::execute::{ExecuteRecord, ExecutionContext, LogStatus};
use super::record::{NextAction, StageRecord};

pub const MISSING_LOGS: &str = "Execution logs missing or invalid.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValidateStatus {
    Error,
    Failed,
    Passed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRecord {
    pub status: ValidateStatus,
    pub trusted: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub next: NextAction,
}

impl ValidateRecord {
    pub fn invalid_input() -> Self {
        Self {
            status: ValidateStatus::Error,
            trusted: false,
            issues: Vec::new(),
            warnings: Vec::new(),
            reason: Some("Invalid input to validation layer".to_string()),
            next: NextAction::Halt,
        }
    }
}

fn analyze(execution: Option<&ExecutionContext>) -> (Vec<String>, Vec<String>) {
    let warnings = Vec::new();
    let Some(execution) = execution else {
        return (vec![MISSING_LOGS.to_string()], warnings);
    };

    let issues = execution
        .logs
        .iter()
        .filter(|log| log.status == LogStatus::Failed)
        .map(|log| {
            format!(
                "Step {} failed: {}",
                log.step_id,
                log.error.as_deref().unwrap_or("unknown error")
            )
        })
        .collect();
    (issues, warnings)
}

/// Trust verdict over an execution log.
pub fn process(execute: &ExecuteRecord) -> ValidateRecord {
    let (issues, warnings) = analyze(execute.execution.as_ref());

    let record = if issues.is_empty() {
        ValidateRecord {
            status: ValidateStatus::Passed,
            trusted: true,
            issues,
            warnings,
            reason: None,
            next: NextAction::Finalize,
        }
    } else {
        ValidateRecord {
            status: ValidateStatus::Failed,
            trusted: false,
            issues,
            warnings,
            reason: None,
            next: NextAction::InspectAndFix,
        }
    };

    tracing::debug!(
        stage = "validate",
        status = %record.status,
        issues = record.issues.len()
    );
    record
}

pub fn process_record(input: &StageRecord) -> ValidateRecord {
    match input {
        StageRecord::Execute(execute) => process(execute),
        other => {
            tracing::info!(stage = "validate", got = %other.stage(), "rejected predecessor");
            ValidateRecord::invalid_input()
        }
    }
}
