//! Whitespace normalization methods.

use crate::error::EngineError;
use crate::harness::Enlarge;
use crate::methods::{Reduction, Step, TrialCtx};

/// Collapses the whitespace run at the current position to one space.
pub struct Blanks;

impl Blanks {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Blanks {
    fn default() -> Self {
        Self::new()
    }
}

impl Reduction for Blanks {
    fn name(&self) -> &'static str {
        "blanks"
    }

    fn rank(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "collapse the whitespace run at the current position to a single space"
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let pos = ctx.pos;
        let buf = ctx.bytes();
        let is_ws = |i: usize| buf.get(i).is_some_and(|b| b.is_ascii_whitespace());
        if !(is_ws(pos) && is_ws(pos + 1)) {
            return Ok(Step::Miss);
        }
        let mut end = pos + 2;
        while is_ws(end) {
            end += 1;
        }

        let verdict = ctx.attempt(pos, end, b" ", Enlarge::Deny)?;
        Ok(if verdict.accepted() { Step::Hit } else { Step::Miss })
    }
}

/// One-shot whole-buffer whitespace cleanup.
///
/// Offers three candidates in order: collapse every whitespace run to a
/// single space; insert a newline after each `:` that directly precedes a
/// non-whitespace byte; pad commas with spaces and re-collapse. The last
/// two may enlarge the program.
pub struct AllBlanks;

impl AllBlanks {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AllBlanks {
    fn default() -> Self {
        Self::new()
    }
}

/// Every whitespace run becomes one space.
pub(crate) fn collapse_runs(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_run = false;
    for &b in bytes {
        if b.is_ascii_whitespace() {
            if !in_run {
                out.push(b' ');
            }
            in_run = true;
        } else {
            out.push(b);
            in_run = false;
        }
    }
    out
}

fn newline_after_colons(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for (i, &b) in bytes.iter().enumerate() {
        out.push(b);
        if b == b':'
            && bytes
                .get(i + 1)
                .is_some_and(|n| !n.is_ascii_whitespace())
        {
            out.push(b'\n');
        }
    }
    out
}

fn pad_commas(bytes: &[u8]) -> Vec<u8> {
    let mut padded = Vec::with_capacity(bytes.len() * 2);
    for &b in bytes {
        if b == b',' {
            padded.extend_from_slice(b" , ");
        } else {
            padded.push(b);
        }
    }
    collapse_runs(&padded)
}

impl Reduction for AllBlanks {
    fn name(&self) -> &'static str {
        "all_blanks"
    }

    fn rank(&self) -> u32 {
        0
    }

    fn description(&self) -> &'static str {
        "whole-buffer whitespace cleanup: collapse runs, break after labels, pad commas"
    }

    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError> {
        let mut worked = false;

        let collapsed = collapse_runs(ctx.bytes());
        if collapsed != ctx.bytes() {
            worked |= ctx.attempt_whole(collapsed, Enlarge::Deny)?.accepted();
        }

        let broken = newline_after_colons(ctx.bytes());
        if broken != ctx.bytes() {
            worked |= ctx.attempt_whole(broken, Enlarge::Allow)?.accepted();
        }

        let padded = pad_commas(ctx.bytes());
        if padded != ctx.bytes() {
            worked |= ctx.attempt_whole(padded, Enlarge::Allow)?.accepted();
        }

        Ok(Step::Done(worked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_runs() {
        assert_eq!(collapse_runs(b"a  b\t\nc"), b"a b c");
        assert_eq!(collapse_runs(b"a b"), b"a b");
        assert_eq!(collapse_runs(b""), b"");
    }

    #[test]
    fn test_collapse_runs_idempotent() {
        let once = collapse_runs(b"  int\t\tmain ( ) ;\n\n");
        assert_eq!(collapse_runs(&once), once);
    }

    #[test]
    fn test_newline_after_colons() {
        assert_eq!(newline_after_colons(b"lbl:x"), b"lbl:\nx");
        // Already followed by whitespace: nothing inserted.
        assert_eq!(newline_after_colons(b"lbl:\nx"), b"lbl:\nx");
        assert_eq!(newline_after_colons(b"lbl: x"), b"lbl: x");
        // Trailing colon has nothing to separate.
        assert_eq!(newline_after_colons(b"x:"), b"x:");
    }

    #[test]
    fn test_newline_after_colons_idempotent() {
        let once = newline_after_colons(b"a:b c:d");
        assert_eq!(newline_after_colons(&once), once);
    }

    #[test]
    fn test_pad_commas() {
        assert_eq!(pad_commas(b"f(a,b)"), b"f(a , b)");
        // Already padded commas come out unchanged.
        assert_eq!(pad_commas(b"f(a , b)"), b"f(a , b)");
    }

    #[test]
    fn test_full_cleanup_is_idempotent() {
        let input = b"int  f ( int a,int b ) { lbl:return a; }".to_vec();
        let once = pad_commas(&newline_after_colons(&collapse_runs(&input)));
        let twice = pad_commas(&newline_after_colons(&collapse_runs(&once)));
        assert_eq!(once, twice);
    }
}
