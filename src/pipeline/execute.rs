use std::fmt;

use serde::{Deserialize, Serialize};

use super::plan::{Plan, PlanRecord, PlanStatus, PlanStep};
use super::record::{NextAction, StageRecord, now_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecStatus {
    Error,
    Blocked,
    Halted,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogStatus {
    ExecutedStub,
    Executed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub step_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl LogEntry {
    pub fn executed(step: &PlanStep, status: LogStatus) -> Self {
        Self {
            step_id: step.id,
            action: Some(step.action.clone()),
            status,
            error: None,
            output: None,
            timestamp: Some(now_millis()),
        }
    }

    pub fn failed(step: &PlanStep, error: impl Into<String>) -> Self {
        Self {
            step_id: step.id,
            action: Some(step.action.clone()),
            status: LogStatus::Failed,
            error: Some(error.into()),
            output: None,
            timestamp: Some(now_millis()),
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = Some(output);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub execution_id: String,
    pub current_step: u32,
    pub completed_steps: Vec<u32>,
    pub halted: bool,
    pub logs: Vec<LogEntry>,
    pub plan_snapshot: Plan,
}

impl ExecutionContext {
    fn new(plan: &Plan) -> Self {
        Self {
            execution_id: format!("exec_{}", uuid::Uuid::new_v4().simple()),
            current_step: 0,
            completed_steps: Vec::new(),
            halted: false,
            logs: Vec::new(),
            plan_snapshot: plan.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRecord {
    pub status: ExecStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub next: NextAction,
}

impl ExecuteRecord {
    fn rejected(status: ExecStatus, reason: &str) -> Self {
        Self {
            status,
            execution: None,
            reason: Some(reason.to_string()),
            next: NextAction::Halt,
        }
    }

    pub fn invalid_input() -> Self {
        Self::rejected(ExecStatus::Error, "Invalid input to execution layer")
    }
}

/// Result of running one plan step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(LogEntry),
    Failed(LogEntry),
}

/// Runs individual plan steps for the executor.
pub trait StepEngine: Send + Sync {
    fn name(&self) -> &str;

    fn run_step(&self, step: &PlanStep, plan: &Plan) -> StepOutcome;
}

/// Records every step as executed without doing any work.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubEngine;

impl StepEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    fn run_step(&self, step: &PlanStep, _plan: &Plan) -> StepOutcome {
        StepOutcome::Executed(LogEntry::executed(step, LogStatus::ExecutedStub))
    }
}

impl fmt::Debug for dyn StepEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepEngine")
            .field("name", &self.name())
            .finish()
    }
}

/// Execute a plan with the stub engine.
pub fn process(plan: &PlanRecord) -> ExecuteRecord {
    process_with(plan, &StubEngine)
}

/// Boundary entry point: accepts any record and rejects the wrong predecessor.
pub fn process_record(input: &StageRecord, engine: &dyn StepEngine) -> ExecuteRecord {
    match input {
        StageRecord::Plan(plan) => process_with(plan, engine),
        other => {
            tracing::info!(stage = "execute", got = %other.stage(), "rejected predecessor");
            ExecuteRecord::invalid_input()
        }
    }
}

pub fn process_with(record: &PlanRecord, engine: &dyn StepEngine) -> ExecuteRecord {
    let plan = match (&record.status, &record.plan) {
        (PlanStatus::Ready, Some(plan)) => plan,
        _ => {
            tracing::info!(stage = "execute", plan_status = %record.status, "plan not ready");
            return ExecuteRecord::rejected(ExecStatus::Blocked, "Plan is not ready for execution");
        }
    };

    let mut context = ExecutionContext::new(plan);
    for step in &plan.steps {
        if context.halted {
            break;
        }
        context.current_step = step.id;

        match engine.run_step(step, plan) {
            StepOutcome::Executed(entry) => {
                context.logs.push(entry);
                context.completed_steps.push(step.id);
            }
            StepOutcome::Failed(entry) => {
                tracing::warn!(
                    stage = "execute",
                    engine = engine.name(),
                    step_id = step.id,
                    error = entry.error.as_deref().unwrap_or("unknown error"),
                    "step failed"
                );
                context.logs.push(entry);
                context.halted = true;
            }
        }
    }

    let (status, next) = if context.halted {
        (ExecStatus::Halted, NextAction::InspectError)
    } else {
        (ExecStatus::Completed, NextAction::Validate)
    };

    tracing::debug!(
        stage = "execute",
        engine = engine.name(),
        execution_id = %context.execution_id,
        completed = context.completed_steps.len(),
        %status
    );

    ExecuteRecord {
        status,
        execution: Some(context),
        reason: None,
        next,
    }
}
