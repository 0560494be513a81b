//! Function-level reshuffling: prototype/definition moves and the
//! per-function argument bookkeeping.

use std::collections::HashSet;

use whittle_core::pattern;

use crate::error::EngineError;
use crate::harness::Enlarge;
use crate::methods::{Reduction, Step, TrialCtx};

/// Moves a function definition up into the slot of its prototype.
///
/// When a prototype starts at the current position and a definition with
/// the same name starts later, one combined candidate replaces the
/// prototype with the full definition text and deletes the definition
/// from its original place. The net effect removes the standalone
/// prototype, so the edit always shrinks. On acceptance the sweep skips
/// past the moved definition.
pub struct MoveFunc;

impl MoveFunc {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MoveFunc {
    fn default() -> Self {
        Self::new()
    }
}

impl Reduction for MoveFunc {
    fn name(&self) -> &'static str {
        "move_func"
    }

    fn rank(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "replace a prototype with its later definition, deleting the original slot"
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let pos = ctx.pos;
        let (proto_end, def_start, def_end, def_text) = {
            let buf = ctx.bytes();
            let Some(proto) = pattern::prototype(buf, pos, None) else {
                return Ok(Step::Miss);
            };
            let name = buf[proto.name_start..proto.name_end].to_vec();

            let mut q = proto.end;
            let def = loop {
                if q >= buf.len() {
                    return Ok(Step::Miss);
                }
                if let Some(d) = pattern::function_def(buf, q, Some(&name)) {
                    break d;
                }
                q += 1;
            };
            (proto.end, q, def.end, buf[q..def.end].to_vec())
        };

        let landing = pos + def_text.len();
        let mut edits = [
            (def_start, def_end, Vec::new()),
            (pos, proto_end, def_text),
        ];
        if ctx.attempt_edits(&mut edits, Enlarge::Deny)?.accepted() {
            Ok(Step::HitTo(landing))
        } else {
            Ok(Step::Miss)
        }
    }
}

/// Records each function once and skips past its prototype.
///
/// TODO: perform the coordinated edit this bookkeeping prepares for —
/// dropping an argument from the recorded prototype, its definition and
/// every call site in one candidate.
pub struct DelArgs {
    seen: HashSet<Vec<u8>>,
}

impl DelArgs {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }
}

impl Default for DelArgs {
    fn default() -> Self {
        Self::new()
    }
}

impl Reduction for DelArgs {
    fn name(&self) -> &'static str {
        "del_args"
    }

    fn rank(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "record each function prototype once and skip past it"
    }

    fn begin_pass(&mut self) {
        self.seen.clear();
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let buf = ctx.bytes();
        if let Some(proto) = pattern::prototype(buf, ctx.pos, None) {
            let name = buf[proto.name_start..proto.name_end].to_vec();
            if self.seen.insert(name) {
                return Ok(Step::MissTo(proto.end));
            }
        }
        Ok(Step::Miss)
    }
}
