//! Integer-literal shortening.

use whittle_core::pattern;

use crate::error::EngineError;
use crate::harness::Enlarge;
use crate::methods::{Reduction, Step, TrialCtx};

/// Shortens an integer literal one piece at a time.
///
/// For a literal at the current position (which must sit on a border, so
/// identifier tails never match), three ordered candidates:
///
/// 1. drop the first digit, when two or more digits remain;
/// 2. drop the last `U`/`L` suffix letter;
/// 3. drop the sign-and-base prefix.
///
/// Accepted edits keep the position, so `0x1ULL` shrinks stepwise to
/// `0x1UL`, `0x1U`, `0x1` and finally `1`.
pub struct ShortenInts;

impl ShortenInts {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShortenInts {
    fn default() -> Self {
        Self::new()
    }
}

impl Reduction for ShortenInts {
    fn name(&self) -> &'static str {
        "shorten_ints"
    }

    fn rank(&self) -> u32 {
        5
    }

    fn description(&self) -> &'static str {
        "shorten an integer literal: leading digit, suffix letters, base prefix"
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let pos = ctx.pos;
        let lit = {
            let buf = ctx.bytes();
            if pos == 0 || !pattern::is_border_or_space(buf[pos - 1]) {
                return Ok(Step::Miss);
            }
            match pattern::int_literal(buf, pos) {
                Some(lit) => lit,
                None => return Ok(Step::Miss),
            }
        };

        if lit.digit_count() >= 2 {
            let v = ctx.attempt(lit.digits_start, lit.digits_start + 1, b"", Enlarge::Deny)?;
            if v.accepted() {
                return Ok(Step::Hit);
            }
        }

        if lit.suffix_len() >= 1 {
            let v = ctx.attempt(lit.end - 1, lit.end, b"", Enlarge::Deny)?;
            if v.accepted() {
                return Ok(Step::Hit);
            }
        }

        if lit.has_prefix() {
            let v = ctx.attempt(lit.start, lit.digits_start, b"", Enlarge::Deny)?;
            if v.accepted() {
                return Ok(Step::Hit);
            }
        }

        Ok(Step::Miss)
    }
}
