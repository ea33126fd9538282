use serde::{Deserialize, Serialize};

use super::decide::DecideRecord;
use super::execute::ExecuteRecord;
use super::finalize::FinalizeRecord;
use super::plan::PlanRecord;
use super::understand::UnderstandRecord;
use super::validate::ValidateRecord;

/// Routing hint every record carries for whoever consumes it next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NextAction {
    Halt,
    AwaitInput,
    Clarify,
    ClarifyThenPlan,
    Plan,
    Execute,
    InspectError,
    Validate,
    InspectAndFix,
    Finalize,
    ReadyForNextStep,
}

impl NextAction {
    /// `inspect_and_fix` → `inspect and fix`.
    pub fn humanized(self) -> String {
        self.to_string().replace('_', " ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StageName {
    Understand,
    Decide,
    Plan,
    Execute,
    Validate,
    Finalize,
}

impl StageName {
    /// Ordered label used in the `pipeline` field of a run trace.
    pub fn label(self) -> &'static str {
        match self {
            Self::Understand => "001_understand",
            Self::Decide => "002_decide",
            Self::Plan => "003_plan",
            Self::Execute => "004_execute",
            Self::Validate => "005_validate",
            Self::Finalize => "006_finalize",
        }
    }
}

/// One stage output, tagged by the stage that produced it.
///
/// Stages take their predecessor's concrete record type, so a wrong
/// predecessor cannot be passed in-process. The tag only matters at the
/// external boundary, where a record arrives as JSON and is routed through the
/// `process_record` decoders of each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageRecord {
    Understand(UnderstandRecord),
    Decide(DecideRecord),
    Plan(PlanRecord),
    Execute(ExecuteRecord),
    Validate(ValidateRecord),
    Finalize(FinalizeRecord),
}

impl StageRecord {
    pub fn stage(&self) -> StageName {
        match self {
            Self::Understand(_) => StageName::Understand,
            Self::Decide(_) => StageName::Decide,
            Self::Plan(_) => StageName::Plan,
            Self::Execute(_) => StageName::Execute,
            Self::Validate(_) => StageName::Validate,
            Self::Finalize(_) => StageName::Finalize,
        }
    }

    /// The routing hint of the wrapped record. Understand records carry none.
    pub fn next(&self) -> Option<NextAction> {
        match self {
            Self::Understand(_) => None,
            Self::Decide(r) => Some(r.next),
            Self::Plan(r) => Some(r.next),
            Self::Execute(r) => Some(r.next),
            Self::Validate(r) => Some(r.next),
            Self::Finalize(r) => Some(r.next),
        }
    }
}

impl From<UnderstandRecord> for StageRecord {
    fn from(record: UnderstandRecord) -> Self {
        Self::Understand(record)
    }
}

impl From<DecideRecord> for StageRecord {
    fn from(record: DecideRecord) -> Self {
        Self::Decide(record)
    }
}

impl From<PlanRecord> for StageRecord {
    fn from(record: PlanRecord) -> Self {
        Self::Plan(record)
    }
}

impl From<ExecuteRecord> for StageRecord {
    fn from(record: ExecuteRecord) -> Self {
        Self::Execute(record)
    }
}

impl From<ValidateRecord> for StageRecord {
    fn from(record: ValidateRecord) -> Self {
        Self::Validate(record)
    }
}

impl From<FinalizeRecord> for StageRecord {
    fn from(record: FinalizeRecord) -> Self {
        Self::Finalize(record)
    }
}

/// Current Unix time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
