//! External pretty-printer pass.

use std::process::{Command, Stdio};

use tracing::warn;

use whittle_core::ProgramBuffer;

use crate::error::EngineError;
use crate::harness::Enlarge;
use crate::methods::{Reduction, Step, TrialCtx};

/// Which pretty-printer binary to run and with which options.
#[derive(Debug, Clone)]
pub struct IndentTool {
    pub bin: String,
    pub args: Vec<String>,
}

impl Default for IndentTool {
    fn default() -> Self {
        Self {
            bin: "indent".to_string(),
            args: [
                "-bad", "-bap", "-bc", "-cs", "-pcs", "-prs", "-saf", "-sai", "-saw", "-sob",
                "-ss", "-bl",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// One-shot reformat of the whole program through the external
/// pretty-printer, offered as a single (possibly enlarging) candidate.
pub struct Reindent {
    tool: IndentTool,
}

impl Reindent {
    pub fn new(tool: IndentTool) -> Self {
        Self { tool }
    }
}

impl Reduction for Reindent {
    fn name(&self) -> &'static str {
        "indent"
    }

    fn rank(&self) -> u32 {
        15
    }

    fn description(&self) -> &'static str {
        "run the external pretty-printer over the whole program"
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let cfile = ctx.harness.cfile().to_path_buf();
        ctx.buffer.save(&cfile)?;

        let status = Command::new(&self.tool.bin)
            .args(&self.tool.args)
            .arg(&cfile)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| EngineError::Tool {
                tool: self.tool.bin.clone(),
                source: e,
            })?;

        if !status.success() {
            warn!(tool = %self.tool.bin, code = ?status.code(), "pretty-printer failed, skipping");
            ctx.harness.restore(ctx.buffer)?;
            return Ok(Step::Done(false));
        }

        *ctx.buffer = ProgramBuffer::load(&cfile)?;
        let verdict = ctx.harness.test(
            ctx.buffer,
            ctx.method,
            Enlarge::Allow,
            ctx.stats,
            ctx.pass,
            ctx.pos,
        )?;
        Ok(Step::Done(verdict.accepted()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tool_options() {
        let tool = IndentTool::default();
        assert_eq!(tool.bin, "indent");
        assert_eq!(tool.args.len(), 12);
        assert_eq!(tool.args[0], "-bad");
        assert_eq!(tool.args[11], "-bl");
    }
}
