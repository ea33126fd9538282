use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const GENERATOR_ENGINE: &str = "code_generator";
pub const PREPARED: &str = "prepared";
pub const DEFAULT_MAX_LINES: u32 = 200;
/// Size estimate used to split work before any content exists.
const ESTIMATED_LINES: u32 = 1000;
const UNSPECIFIED_PURPOSE: &str = "unspecified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpec {
    pub chunk_id: u32,
    pub max_lines: u32,
    pub generated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenTask {
    pub task_id: String,
    pub module: String,
    pub language: String,
    pub purpose: String,
    pub chunks: Vec<ChunkSpec>,
    pub status: TaskStatus,
}

/// Generator output. `engine` and `status` stay plain strings because the
/// validator must also judge outputs that did not come from [`prepare`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prepared {
    pub engine: String,
    pub status: String,
    pub task: CodegenTask,
}

pub fn prepare(module: &str, language: &str, purpose: Option<&str>) -> Result<Prepared, EngineError> {
    prepare_with(module, language, purpose, DEFAULT_MAX_LINES)
}

/// Build a pending task split into `ceil(estimate / max_lines)` logical chunks.
pub fn prepare_with(
    module: &str,
    language: &str,
    purpose: Option<&str>,
    max_lines: u32,
) -> Result<Prepared, EngineError> {
    if module.trim().is_empty() {
        return Err(EngineError::InvalidTask("module"));
    }
    if language.trim().is_empty() {
        return Err(EngineError::InvalidTask("language"));
    }
    if max_lines == 0 {
        return Err(EngineError::InvalidTask("max_lines"));
    }

    let chunk_count = ESTIMATED_LINES.div_ceil(max_lines);
    let chunks = (1..=chunk_count)
        .map(|chunk_id| ChunkSpec {
            chunk_id,
            max_lines,
            generated: false,
        })
        .collect();

    let task = CodegenTask {
        task_id: format!("codegen_{}", uuid::Uuid::new_v4().simple()),
        module: module.to_string(),
        language: language.to_string(),
        purpose: purpose
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(UNSPECIFIED_PURPOSE)
            .to_string(),
        chunks,
        status: TaskStatus::Pending,
    };

    tracing::debug!(
        task_id = %task.task_id,
        module = task.module.as_str(),
        chunks = task.chunks.len(),
        "code generation task prepared"
    );

    Ok(Prepared {
        engine: GENERATOR_ENGINE.to_string(),
        status: PREPARED.to_string(),
        task,
    })
}
