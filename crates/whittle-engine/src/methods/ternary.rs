//! Conditional-expression folding.

use whittle_core::pattern;

use crate::error::EngineError;
use crate::harness::Enlarge;
use crate::methods::{Reduction, Step, TrialCtx};

/// Folds a border-flanked `a ? b : c` to one of its arms.
///
/// Two candidates per site: the `b` arm first, then the `c` arm.
pub struct Ternary;

impl Ternary {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Ternary {
    fn default() -> Self {
        Self::new()
    }
}

impl Reduction for Ternary {
    fn name(&self) -> &'static str {
        "ternary"
    }

    fn rank(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "replace a ? b : c with b, or failing that with c"
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let pos = ctx.pos;
        let (end, then_arm, else_arm) = {
            let buf = ctx.bytes();
            let Some(t) = pattern::ternary(buf, pos) else {
                return Ok(Step::Miss);
            };
            let left_ok = pos > 0 && pattern::is_border_or_space(buf[pos - 1]);
            let right_ok = buf.get(t.end).is_some_and(|&b| pattern::is_border_or_space(b));
            if !left_ok || !right_ok {
                return Ok(Step::Miss);
            }
            (
                t.end,
                buf[t.then_start..t.then_end].to_vec(),
                buf[t.else_start..t.else_end].to_vec(),
            )
        };

        if ctx.attempt(pos, end, &then_arm, Enlarge::Deny)?.accepted() {
            return Ok(Step::Hit);
        }
        if ctx.attempt(pos, end, &else_arm, Enlarge::Deny)?.accepted() {
            return Ok(Step::Hit);
        }
        Ok(Step::Miss)
    }
}
