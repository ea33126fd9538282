use serde::{Deserialize, Serialize};

use super::record::{NextAction, StageRecord};
use super::validate::{ValidateRecord, ValidateStatus};

pub const SUMMARY_SUCCESS: &str = "Plan executed and validated successfully.";
pub const SUMMARY_FAILED: &str = "Execution failed validation.";
pub const SUMMARY_UNKNOWN: &str = "Unknown validation outcome.";
pub const SUMMARY_INVALID: &str = "Invalid system state. Cannot finalize output.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinalizeStatus {
    Error,
    Failed,
    Success,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeRecord {
    pub status: FinalizeStatus,
    pub trusted: bool,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<String>>,
    pub next: NextAction,
}

impl FinalizeRecord {
    fn new(status: FinalizeStatus, summary: &str, next: NextAction) -> Self {
        Self {
            status,
            trusted: status == FinalizeStatus::Success,
            summary: summary.to_string(),
            issues: None,
            next,
        }
    }

    pub fn invalid_input() -> Self {
        Self::new(FinalizeStatus::Error, SUMMARY_INVALID, NextAction::Halt)
    }
}

/// User-safe summary of a trust verdict.
pub fn process(validate: &ValidateRecord) -> FinalizeRecord {
    let record = match validate.status {
        ValidateStatus::Failed => FinalizeRecord {
            issues: Some(validate.issues.clone()),
            ..FinalizeRecord::new(
                FinalizeStatus::Failed,
                SUMMARY_FAILED,
                NextAction::InspectAndFix,
            )
        },
        ValidateStatus::Passed => FinalizeRecord::new(
            FinalizeStatus::Success,
            SUMMARY_SUCCESS,
            NextAction::ReadyForNextStep,
        ),
        ValidateStatus::Error => {
            FinalizeRecord::new(FinalizeStatus::Unknown, SUMMARY_UNKNOWN, NextAction::Halt)
        }
    };

    tracing::debug!(stage = "finalize", status = %record.status, trusted = record.trusted);
    record
}

pub fn process_record(input: &StageRecord) -> FinalizeRecord {
    match input {
        StageRecord::Validate(validate) => process(validate),
        other => {
            tracing::info!(stage = "finalize", got = %other.stage(), "rejected predecessor");
            FinalizeRecord::invalid_input()
        }
    }
}
