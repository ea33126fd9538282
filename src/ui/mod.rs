//! Terminal presentation of a run.
//!
//! Debug mode prints the structured trace as JSON. End-user mode prints the
//! verdict and the reply. Trust is taken from the finalize record as given.

pub mod style;

use crate::agent::RunOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Debug,
    EndUser,
}

impl RenderMode {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug { Self::Debug } else { Self::EndUser }
    }
}

pub fn render(output: &RunOutput, mode: RenderMode) -> anyhow::Result<String> {
    match mode {
        RenderMode::Debug => Ok(serde_json::to_string_pretty(output)?),
        RenderMode::EndUser => Ok(render_end_user(output)),
    }
}

fn render_end_user(output: &RunOutput) -> String {
    let RunOutput::Completed { result, reply, .. } = output else {
        return output.reply().to_string();
    };

    let verdict = if output.trusted() {
        style::success("✓ trusted")
    } else {
        style::warning("! not trusted")
    };
    format!(
        "{verdict} {}\n\n{reply}",
        style::dim(format!("(ended at {})", result.stage().label()))
    )
}
