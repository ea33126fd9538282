use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::codegen::{CodegenTask, GENERATOR_ENGINE, PREPARED, Prepared};

pub const VALIDATOR_ENGINE: &str = "code_validator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeValidation {
    pub engine: String,
    pub status: ValidationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<CodegenTask>,
}

impl CodeValidation {
    fn failed(issues: Vec<String>) -> Self {
        Self {
            engine: VALIDATOR_ENGINE.to_string(),
            status: ValidationStatus::Failed,
            issues,
            task: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == ValidationStatus::Passed
    }
}

/// Structural problems in a task, in detection order.
pub fn task_issues(task: &CodegenTask) -> Vec<String> {
    let mut issues = Vec::new();

    if task.task_id.trim().is_empty() {
        issues.push("Missing task_id".to_string());
    }
    if task.module.trim().is_empty() {
        issues.push("Module name is missing".to_string());
    }
    if task.language.trim().is_empty() {
        issues.push("Target language is missing".to_string());
    }
    if task.chunks.is_empty() {
        issues.push("No chunks defined for generation".to_string());
    }

    let mut seen = HashSet::new();
    for chunk in &task.chunks {
        if chunk.chunk_id == 0 {
            issues.push("Chunk without chunk_id detected".to_string());
            continue;
        }
        if !seen.insert(chunk.chunk_id) {
            issues.push(format!("Duplicate chunk_id detected: {}", chunk.chunk_id));
        }
        if chunk.max_lines == 0 {
            issues.push(format!("Invalid max_lines for chunk {}", chunk.chunk_id));
        }
    }

    issues
}

pub fn validate(prepared: &Prepared) -> CodeValidation {
    if prepared.engine != GENERATOR_ENGINE || prepared.status != PREPARED {
        return CodeValidation::failed(vec!["Invalid generator output".to_string()]);
    }

    let issues = task_issues(&prepared.task);
    if !issues.is_empty() {
        tracing::debug!(task_id = %prepared.task.task_id, issues = issues.len(), "task rejected");
        return CodeValidation::failed(issues);
    }

    CodeValidation {
        engine: VALIDATOR_ENGINE.to_string(),
        status: ValidationStatus::Passed,
        issues: Vec::new(),
        task: Some(prepared.task.clone()),
    }
}
