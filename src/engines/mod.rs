//! Step engines beyond the stub: code-generation task preparation and its
//! structural validator.

pub mod codegen;
pub mod validator;

use crate::pipeline::execute::{LogEntry, LogStatus, StepEngine, StepOutcome};
use crate::pipeline::plan::{Plan, PlanStep};

/// Plan step that gets a prepared code-generation task.
pub const IMPLEMENT_STEP: &str = "implement_modules";

/// Prepares and validates a code-generation task for the implementation
/// step. Every other step is recorded like the stub engine does.
#[derive(Debug, Clone)]
pub struct CodegenEngine {
    language: String,
}

impl CodegenEngine {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

impl StepEngine for CodegenEngine {
    fn name(&self) -> &str {
        "codegen"
    }

    fn run_step(&self, step: &PlanStep, plan: &Plan) -> StepOutcome {
        if step.action != IMPLEMENT_STEP {
            return StepOutcome::Executed(LogEntry::executed(step, LogStatus::ExecutedStub));
        }

        let purpose = Some(step.description.as_str());
        let prepared = match codegen::prepare(&plan.plan_id, &self.language, purpose) {
            Ok(prepared) => prepared,
            Err(e) => return StepOutcome::Failed(LogEntry::failed(step, e.to_string())),
        };

        let validation = validator::validate(&prepared);
        let output = serde_json::to_value(&validation).unwrap_or_default();
        if validation.passed() {
            StepOutcome::Executed(LogEntry::executed(step, LogStatus::Executed).with_output(output))
        } else {
            StepOutcome::Failed(
                LogEntry::failed(step, validation.issues.join("; ")).with_output(output),
            )
        }
    }
}
