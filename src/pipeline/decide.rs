use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{NextAction, StageRecord};
use super::understand::{Clarity, UnderstandRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DecideStatus {
    Error,
    NeedInput,
    NeedClarification,
    Partial,
    Proceed,
    CannotDecide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecideRecord {
    pub status: DecideStatus,
    pub reason: String,
    pub next: NextAction,
}

impl DecideRecord {
    fn new(status: DecideStatus, reason: &str, next: NextAction) -> Self {
        Self {
            status,
            reason: reason.to_string(),
            next,
        }
    }

    pub fn invalid_input() -> Self {
        Self::new(
            DecideStatus::Error,
            "Invalid input to decision layer",
            NextAction::Halt,
        )
    }

    /// Whether the planning stage should look at this verdict at all.
    /// Clarification verdicts still go to planning so the plan can record
    /// what is missing.
    pub fn reaches_planning(&self) -> bool {
        !matches!(self.next, NextAction::Halt | NextAction::AwaitInput)
    }
}

/// Route an understanding into a verdict. Only the recorded clarity is
/// consulted; the understanding stage is trusted for everything else.
pub fn process(understand: &UnderstandRecord) -> DecideRecord {
    let record = if understand.meta.empty {
        DecideRecord::new(
            DecideStatus::NeedInput,
            "No input provided",
            NextAction::AwaitInput,
        )
    } else {
        match understand.intent.clarity {
            Clarity::Low => DecideRecord::new(
                DecideStatus::NeedClarification,
                "Request is too vague",
                NextAction::Clarify,
            ),
            Clarity::Medium => DecideRecord::new(
                DecideStatus::Partial,
                "Request partially understood",
                NextAction::ClarifyThenPlan,
            ),
            Clarity::High => DecideRecord::new(
                DecideStatus::Proceed,
                "Request clear enough to proceed",
                NextAction::Plan,
            ),
        }
    };

    tracing::debug!(stage = "decide", status = %record.status, next = %record.next);
    record
}

/// Boundary entry point: accepts any record and rejects the wrong predecessor.
pub fn process_record(input: &StageRecord) -> DecideRecord {
    match input {
        StageRecord::Understand(understand) => process(understand),
        other => {
            tracing::info!(stage = "decide", got = %other.stage(), "rejected predecessor");
            DecideRecord::invalid_input()
        }
    }
}

/// Decode a record that arrived as JSON and route it.
///
/// An understanding whose clarity is missing or outside the known levels
/// cannot be decided. Any other payload that fails to decode is treated as a
/// wrong predecessor.
pub fn process_json(value: &Value) -> DecideRecord {
    match serde_json::from_value::<StageRecord>(value.clone()) {
        Ok(record) => process_record(&record),
        Err(e) => {
            let is_understanding = value.get("stage").and_then(Value::as_str) == Some("understand");
            let clarity_known = value
                .pointer("/intent/clarity")
                .is_some_and(|clarity| Clarity::deserialize(clarity).is_ok());
            if is_understanding && !clarity_known {
                tracing::info!(stage = "decide", "unknown clarity: {e}");
                DecideRecord::new(
                    DecideStatus::CannotDecide,
                    "Unhandled decision state",
                    NextAction::Halt,
                )
            } else {
                tracing::info!(stage = "decide", "undecodable record: {e}");
                DecideRecord::invalid_input()
            }
        }
    }
}
