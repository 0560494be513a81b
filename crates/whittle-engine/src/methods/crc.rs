//! Checksum-call rewriting.

use whittle_core::pattern;

use crate::error::EngineError;
use crate::harness::Enlarge;
use crate::methods::{Reduction, Step, TrialCtx};

const CALLEE: &[u8] = b"transparent_crc";

/// Rewrites a `transparent_crc(arg, ...)` call into a plain print of its
/// first argument.
///
/// The whole call becomes `printf ("%d\n", (int)arg)`, which preserves
/// the observable value while cutting the checksum machinery loose so
/// later methods can chew on the rest of the statement.
pub struct CrcCalls;

impl CrcCalls {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CrcCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl Reduction for CrcCalls {
    fn name(&self) -> &'static str {
        "crc"
    }

    fn rank(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "replace a transparent_crc call with a printf of its first argument"
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let pos = ctx.pos;
        let (end, repl) = {
            let buf = ctx.bytes();
            let Some(m) = pattern::call(buf, pos) else {
                return Ok(Step::Miss);
            };
            if &buf[m.name_start..m.name_end] != CALLEE {
                return Ok(Step::Miss);
            }
            // Not the tail of a longer identifier.
            if pos > 0 && (buf[pos - 1].is_ascii_alphanumeric() || buf[pos - 1] == b'_') {
                return Ok(Step::Miss);
            }

            let args = &buf[m.args_start..m.args_end];
            let first = match args.iter().position(|&b| b == b',') {
                Some(comma) => &args[..comma],
                None => args,
            }
            .trim_ascii();

            let mut repl = b"printf (\"%d\\n\", (int)".to_vec();
            repl.extend_from_slice(first);
            repl.push(b')');
            (m.end, repl)
        };

        let v = ctx.attempt(pos, end, &repl, Enlarge::Deny)?;
        Ok(if v.accepted() { Step::Hit } else { Step::Miss })
    }
}
