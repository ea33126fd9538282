//! Planning stage: expands a routing verdict into an ordered step list.
//!
//! The step template is deliberately generic and does not look at the
//! detected action or target; per-intent templates would plug in here.

use serde::{Deserialize, Serialize};

use super::decide::{DecideRecord, DecideStatus};
use super::record::{NextAction, StageRecord};
use super::understand::{Clarity, Intent, Target, UnderstandRecord};

pub const CLARIFY_DETAILS: &str = "Please provide more details.";
pub const CLARIFY_SCOPE: &str = "Some aspects are unclear. Specify scope, constraints, or target.";
pub const RISK_UNKNOWN_TARGET: &str = "Target is not clearly defined.";
pub const RISK_INCOMPLETE_CLARITY: &str = "Incomplete clarity may cause rework.";
const PLAN_NOTE: &str = "This is a high-level plan. Execution happens in later stages.";

/// The generic template, in execution order.
const TEMPLATE: [(&str, &str); 7] = [
    (
        "analyze_requirements",
        "Understand full requirements and constraints",
    ),
    ("design_architecture", "Create high-level architecture"),
    ("decompose_modules", "Break system into modules/components"),
    (
        "select_technologies",
        "Choose languages/tools based on constraints",
    ),
    ("implement_modules", "Implement modules incrementally"),
    ("validate_and_test", "Validate correctness and run tests"),
    (
        "integrate_and_finalize",
        "Integrate modules and finalize output",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanStatus {
    Error,
    Blocked,
    CannotPlan,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: u32,
    pub action: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub steps: Vec<PlanStep>,
    pub requires_clarification: bool,
    pub clarifications: Vec<String>,
    pub risks: Vec<String>,
    pub notes: Vec<String>,
}

impl Plan {
    /// Empty plan with a fresh identifier.
    pub fn base() -> Self {
        Self {
            plan_id: format!("plan_{}", uuid::Uuid::new_v4().simple()),
            steps: Vec::new(),
            requires_clarification: false,
            clarifications: Vec::new(),
            risks: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn push_template_steps(&mut self) {
        self.steps.extend(TEMPLATE.iter().zip(1..).map(
            |(&(action, description), id)| PlanStep {
                id,
                action: action.to_string(),
                description: description.to_string(),
            },
        ));
    }

    fn detect_risks(&mut self, intent: &Intent) {
        if intent.target == Target::Unknown {
            self.risks.push(RISK_UNKNOWN_TARGET.to_string());
        }
        if intent.clarity != Clarity::High {
            self.risks.push(RISK_INCOMPLETE_CLARITY.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub status: PlanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub next: NextAction,
}

impl PlanRecord {
    pub fn invalid_input() -> Self {
        Self {
            status: PlanStatus::Error,
            plan: None,
            reason: Some("Invalid input to planning layer".to_string()),
            next: NextAction::Halt,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == PlanStatus::Ready && self.plan.is_some()
    }
}

/// Plan from a verdict and the understanding it was derived from.
pub fn process(decide: &DecideRecord, understand: &UnderstandRecord) -> PlanRecord {
    build(decide, Some(&understand.intent))
}

/// Boundary entry point. Risk detection is skipped when `understand` is not an
/// understanding record.
pub fn process_record(decide: &StageRecord, understand: Option<&StageRecord>) -> PlanRecord {
    let StageRecord::Decide(decide) = decide else {
        tracing::info!(stage = "plan", got = %decide.stage(), "rejected predecessor");
        return PlanRecord::invalid_input();
    };
    let intent = match understand {
        Some(StageRecord::Understand(record)) => Some(&record.intent),
        _ => None,
    };
    build(decide, intent)
}

fn build(decide: &DecideRecord, intent: Option<&Intent>) -> PlanRecord {
    let mut plan = Plan::base();

    match decide.status {
        DecideStatus::NeedClarification => {
            plan.requires_clarification = true;
            plan.clarifications.push(CLARIFY_DETAILS.to_string());
            tracing::info!(stage = "plan", plan_id = %plan.plan_id, "blocked on clarification");
            return PlanRecord {
                status: PlanStatus::Blocked,
                plan: Some(plan),
                reason: Some("Clarification required before planning".to_string()),
                next: NextAction::Clarify,
            };
        }
        DecideStatus::Partial => {
            plan.requires_clarification = true;
            plan.clarifications.push(CLARIFY_SCOPE.to_string());
        }
        DecideStatus::Proceed => {}
        DecideStatus::Error | DecideStatus::NeedInput | DecideStatus::CannotDecide => {
            let reason = if decide.reason.is_empty() {
                "Planning not allowed".to_string()
            } else {
                decide.reason.clone()
            };
            return PlanRecord {
                status: PlanStatus::CannotPlan,
                plan: Some(plan),
                reason: Some(reason),
                next: NextAction::Halt,
            };
        }
    }

    plan.push_template_steps();
    if let Some(intent) = intent {
        plan.detect_risks(intent);
    }
    plan.notes.push(PLAN_NOTE.to_string());

    tracing::debug!(
        stage = "plan",
        plan_id = %plan.plan_id,
        steps = plan.steps.len(),
        risks = plan.risks.len(),
        "plan ready"
    );

    PlanRecord {
        status: PlanStatus::Ready,
        plan: Some(plan),
        reason: None,
        next: NextAction::Execute,
    }
}
