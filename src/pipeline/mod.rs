//! The stage-gated pipeline.
//!
//! ```text
//! Understand → Decide → Plan → Execute → Validate → Finalize
//! ```
//!
//! Every stage is a pure function from its predecessor's record to a new
//! record. A stage that halts ends the run; the trace keeps every record that
//! was produced so callers can audit where and why the run stopped.

pub mod decide;
pub mod execute;
pub mod finalize;
pub mod plan;
pub mod record;
pub mod understand;
pub mod validate;

use std::sync::Arc;

use serde::Serialize;

pub use execute::{StepEngine, StepOutcome, StubEngine};
pub use finalize::FinalizeRecord;
pub use record::{NextAction, StageName, StageRecord};

pub const EMPTY_INPUT_ERROR: &str = "Input is empty";

/// Records produced by one run, in stage order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineTrace {
    records: Vec<StageRecord>,
}

impl PipelineTrace {
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Ordered labels of the stages that ran.
    pub fn labels(&self) -> Vec<&'static str> {
        self.records.iter().map(|r| r.stage().label()).collect()
    }

    /// The last record produced. A trace always holds at least the
    /// understand and decide records.
    pub fn result(&self) -> Option<&StageRecord> {
        self.records.last()
    }

    pub fn get(&self, stage: StageName) -> Option<&StageRecord> {
        self.records.iter().find(|r| r.stage() == stage)
    }

    pub fn finalize(&self) -> Option<&FinalizeRecord> {
        match self.get(StageName::Finalize) {
            Some(StageRecord::Finalize(record)) => Some(record),
            _ => None,
        }
    }

    /// Trust as reported by the finalize record; runs that halted earlier are
    /// never trusted.
    pub fn trusted(&self) -> bool {
        self.finalize().is_some_and(|f| f.trusted)
    }

    fn push(&mut self, record: impl Into<StageRecord>) {
        self.records.push(record.into());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineRun {
    /// Input was empty or whitespace; no stage ran.
    EmptyInput,
    Traced(PipelineTrace),
}

impl PipelineRun {
    pub fn trace(&self) -> Option<&PipelineTrace> {
        match self {
            Self::EmptyInput => None,
            Self::Traced(trace) => Some(trace),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    engine: Arc<dyn StepEngine>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Arc::new(StubEngine))
    }
}

impl Pipeline {
    pub fn new(engine: Arc<dyn StepEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Run every stage that its predecessor allows.
    pub fn run(&self, raw: &str) -> PipelineRun {
        if raw.chars().all(understand::is_blank) {
            tracing::info!("empty input, pipeline not started");
            return PipelineRun::EmptyInput;
        }

        let mut trace = PipelineTrace {
            records: Vec::with_capacity(6),
        };

        let understood = understand::process(raw);
        let decided = decide::process(&understood);
        let reaches_planning = decided.reaches_planning();
        trace.push(understood.clone());
        trace.push(decided.clone());
        if !reaches_planning {
            tracing::info!(stage = "decide", status = %decided.status, "pipeline halted");
            return PipelineRun::Traced(trace);
        }

        let planned = plan::process(&decided, &understood);
        let ready = planned.is_ready();
        trace.push(planned.clone());
        if !ready {
            tracing::info!(stage = "plan", status = %planned.status, "pipeline halted");
            return PipelineRun::Traced(trace);
        }

        let executed = execute::process_with(&planned, self.engine.as_ref());
        let has_context = executed.execution.is_some();
        trace.push(executed.clone());
        if !has_context {
            tracing::info!(stage = "execute", status = %executed.status, "pipeline halted");
            return PipelineRun::Traced(trace);
        }

        let validated = validate::process(&executed);
        let finalized = finalize::process(&validated);
        trace.push(validated);
        trace.push(finalized);

        tracing::debug!(stages = trace.records.len(), trusted = trace.trusted(), "pipeline finished");
        PipelineRun::Traced(trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::plan::{Plan, PlanStep};

    struct AlwaysFails;

    impl StepEngine for AlwaysFails {
        fn name(&self) -> &str {
            "always_fails"
        }

        fn run_step(&self, step: &PlanStep, _plan: &Plan) -> StepOutcome {
            StepOutcome::Failed(execute::LogEntry::failed(step, "nope"))
        }
    }

    #[test]
    fn whitespace_input_short_circuits() {
        assert_eq!(Pipeline::default().run("   \n\t"), PipelineRun::EmptyInput);
        assert_eq!(Pipeline::default().run("\u{FEFF}"), PipelineRun::EmptyInput);
    }

    #[test]
    fn clear_request_runs_every_stage() {
        let run = Pipeline::default().run("please fix this bug in my code");
        let trace = run.trace().unwrap();
        assert_eq!(
            trace.labels(),
            vec![
                "001_understand",
                "002_decide",
                "003_plan",
                "004_execute",
                "005_validate",
                "006_finalize"
            ]
        );
        assert!(trace.trusted());
        assert_eq!(trace.result().unwrap().stage(), StageName::Finalize);
    }

    #[test]
    fn vague_request_stops_after_planning() {
        let run = Pipeline::default().run("hello");
        let trace = run.trace().unwrap();
        assert_eq!(trace.labels(), vec!["001_understand", "002_decide", "003_plan"]);
        assert_eq!(trace.result().unwrap().next(), Some(NextAction::Clarify));
        assert!(!trace.trusted());
        assert!(trace.finalize().is_none());
    }

    #[test]
    fn halted_execution_still_reaches_finalize_untrusted() {
        let pipeline = Pipeline::new(Arc::new(AlwaysFails));
        let run = pipeline.run("build a database");
        let trace = run.trace().unwrap();
        assert_eq!(trace.records().len(), 6);
        let finalize = trace.finalize().unwrap();
        assert!(!finalize.trusted);
        assert_eq!(
            finalize.issues.as_deref(),
            Some(&["Step 1 failed: nope".to_string()][..])
        );
    }
}
