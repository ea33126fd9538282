//! One request end to end: pipeline, reply, session memory.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{Config, EngineKind};
use crate::engines::CodegenEngine;
use crate::error::{AdbhutamError, LlmError, Result};
use crate::memory::MemoryRegistry;
use crate::pipeline::{EMPTY_INPUT_ERROR, Pipeline, PipelineRun, StageRecord, StepEngine, StubEngine};
use crate::response::{EMPTY_INPUT_REPLY, Responder};

/// What a caller gets back for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunOutput {
    EmptyInput {
        stage: &'static str,
        error: &'static str,
        reply: String,
    },
    Completed {
        pipeline: Vec<&'static str>,
        trace: Vec<StageRecord>,
        result: StageRecord,
        reply: String,
    },
}

impl RunOutput {
    fn empty_input() -> Self {
        Self::EmptyInput {
            stage: "ui",
            error: EMPTY_INPUT_ERROR,
            reply: EMPTY_INPUT_REPLY.to_string(),
        }
    }

    pub fn reply(&self) -> &str {
        match self {
            Self::EmptyInput { reply, .. } | Self::Completed { reply, .. } => reply,
        }
    }

    pub fn result(&self) -> Option<&StageRecord> {
        match self {
            Self::EmptyInput { .. } => None,
            Self::Completed { result, .. } => Some(result),
        }
    }

    /// Trust as the finalize record states it.
    pub fn trusted(&self) -> bool {
        matches!(self.result(), Some(StageRecord::Finalize(f)) if f.trusted)
    }
}

pub fn engine_from_config(config: &Config) -> Arc<dyn StepEngine> {
    match config.pipeline.engine {
        EngineKind::Stub => Arc::new(StubEngine),
        EngineKind::Codegen => Arc::new(CodegenEngine::new(
            config.pipeline.codegen_language.clone(),
        )),
    }
}

pub struct Agent {
    pipeline: Pipeline,
    responder: Responder,
    memories: MemoryRegistry,
}

impl Agent {
    pub fn new(pipeline: Pipeline, responder: Responder, memories: MemoryRegistry) -> Self {
        Self {
            pipeline,
            responder,
            memories,
        }
    }

    /// Assemble an agent from configuration. Invalid settings and provider
    /// construction failures come back as typed errors.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let pipeline = Pipeline::new(engine_from_config(config));
        let responder = Responder::from_config(config).map_err(|e| match e.downcast::<LlmError>() {
            Ok(llm) => AdbhutamError::Llm(llm),
            Err(other) => AdbhutamError::Other(other),
        })?;
        tracing::info!(
            engine = pipeline.engine_name(),
            response_mode = ?responder.mode(),
            "agent ready"
        );
        Ok(Self::new(
            pipeline,
            responder,
            MemoryRegistry::new(config.memory.capacity)
                .with_max_sessions(config.memory.max_sessions),
        ))
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    pub fn memories(&self) -> &MemoryRegistry {
        &self.memories
    }

    pub async fn handle(&self, session: &str, input: &str) -> RunOutput {
        let run = self.pipeline.run(input);
        let PipelineRun::Traced(trace) = &run else {
            return RunOutput::empty_input();
        };

        let history = self.memories.snapshot(session);
        let reply = self.responder.reply(&run, input, &history).await;
        self.memories.record_exchange(session, input, &reply);

        let records = trace.records().to_vec();
        let Some(result) = records.last().cloned() else {
            return RunOutput::empty_input();
        };

        RunOutput::Completed {
            pipeline: trace.labels(),
            trace: records,
            result,
            reply,
        }
    }
}
