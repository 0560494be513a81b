//! The reduction method catalogue.
//!
//! Every method is a value implementing [`Reduction`]: given the current
//! position it proposes zero or more candidate edits, runs each through
//! the oracle harness, and reports how the sweep position should move.
//! The driver never knows what a method does, only its name, its rank and
//! the [`Step`] it returns.

mod blanks;
mod brackets;
mod crc;
mod functions;
mod indent;
mod ints;
mod regex_rules;
mod ternary;

pub use blanks::{AllBlanks, Blanks};
pub use brackets::PairStrip;
pub use crc::CrcCalls;
pub use functions::{DelArgs, MoveFunc};
pub use indent::{IndentTool, Reindent};
pub use ints::ShortenInts;
pub use regex_rules::ReplaceRegex;
pub use ternary::Ternary;

use whittle_core::ProgramBuffer;

use crate::error::EngineError;
use crate::harness::{Enlarge, OracleHarness, Verdict};
use crate::stats::RunStats;

/// How the sweep position moves after a `try_at` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing matched or every candidate was rejected; advance one byte.
    Miss,
    /// No accepted edit, but skip ahead to the given position.
    MissTo(usize),
    /// An edit was accepted; stay at the same position so further edits
    /// can apply at the same site.
    Hit,
    /// An edit was accepted; continue from the given position.
    HitTo(usize),
    /// The method ran once for the whole buffer; end the pass. Carries
    /// whether any edit was accepted.
    Done(bool),
}

/// Everything a method needs to run trials at one position.
pub struct TrialCtx<'a> {
    pub buffer: &'a mut ProgramBuffer,
    pub harness: &'a mut OracleHarness,
    pub stats: &'a mut RunStats,
    /// Name of the method being driven, for counters and logging.
    pub method: &'static str,
    /// Outer pass number, for the progress line.
    pub pass: u32,
    /// Current sweep position.
    pub pos: usize,
}

impl TrialCtx<'_> {
    /// The buffer as a byte slice.
    pub fn bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Splices `repl` over `[start, end)` and runs the trial. On a
    /// rejection the harness restores the buffer byte-identical.
    pub fn attempt(
        &mut self,
        start: usize,
        end: usize,
        repl: &[u8],
        enlarge: Enlarge,
    ) -> Result<Verdict, EngineError> {
        self.buffer.splice(start, end, repl);
        self.harness
            .test(self.buffer, self.method, enlarge, self.stats, self.pass, self.pos)
    }

    /// Applies several non-overlapping edits as one candidate and runs
    /// the trial. Edits are applied back-to-front so earlier spans keep
    /// their offsets.
    pub fn attempt_edits(
        &mut self,
        edits: &mut [(usize, usize, Vec<u8>)],
        enlarge: Enlarge,
    ) -> Result<Verdict, EngineError> {
        edits.sort_by(|a, b| b.0.cmp(&a.0));
        for (start, end, repl) in edits.iter() {
            self.buffer.splice(*start, *end, repl);
        }
        self.harness
            .test(self.buffer, self.method, enlarge, self.stats, self.pass, self.pos)
    }

    /// Replaces the whole buffer with `contents` and runs the trial.
    pub fn attempt_whole(
        &mut self,
        contents: Vec<u8>,
        enlarge: Enlarge,
    ) -> Result<Verdict, EngineError> {
        self.buffer.set_contents(contents);
        self.harness
            .test(self.buffer, self.method, enlarge, self.stats, self.pass, self.pos)
    }
}

/// A single reduction method.
///
/// Methods are stateless between runs except for per-pass bookkeeping,
/// which [`Reduction::begin_pass`] resets.
impl std::fmt::Debug for dyn Reduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reduction").field("name", &self.name()).finish()
    }
}

pub trait Reduction {
    /// Registry name; doubles as the CLI flag.
    fn name(&self) -> &'static str;

    /// Priority rank. Lower ranks run earlier in each outer pass.
    fn rank(&self) -> u32;

    /// One-line description for `--list-methods`.
    fn description(&self) -> &'static str {
        "no description"
    }

    /// Called before each sweep of this method over the buffer.
    fn begin_pass(&mut self) {}

    /// Proposes and tests candidates at `ctx.pos`.
    fn try_at(&mut self, ctx: &mut TrialCtx<'_>) -> Result<Step, EngineError>;
}

/// Every method in the registry, with its canonical rank.
pub fn all_methods(indent_tool: IndentTool) -> Vec<Box<dyn Reduction>> {
    vec![
        Box::new(AllBlanks::new()),
        Box::new(Blanks::new()),
        Box::new(CrcCalls::new()),
        Box::new(MoveFunc::new()),
        Box::new(DelArgs::new()),
        Box::new(PairStrip::braces()),
        Box::new(Ternary::new()),
        Box::new(PairStrip::parens()),
        Box::new(ReplaceRegex::new()),
        Box::new(ShortenInts::new()),
        Box::new(Reindent::new(indent_tool)),
    ]
}

/// The registry names, in declaration order.
pub fn method_names() -> Vec<&'static str> {
    all_methods(IndentTool::default())
        .iter()
        .map(|m| m.name())
        .collect()
}

/// Builds the methods for the given names, or every method for an empty
/// selection guarded by `all`.
pub fn select(
    names: &[String],
    all: bool,
    indent_tool: IndentTool,
) -> Result<Vec<Box<dyn Reduction>>, EngineError> {
    let registry = all_methods(indent_tool);
    if all {
        return Ok(registry);
    }
    let known: Vec<&'static str> = registry.iter().map(|m| m.name()).collect();
    for name in names {
        if !known.contains(&name.as_str()) {
            return Err(EngineError::UnknownMethod(name.clone()));
        }
    }
    Ok(registry
        .into_iter()
        .filter(|m| names.iter().any(|n| n == m.name()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_and_ranks() {
        let methods = all_methods(IndentTool::default());
        let ranks: Vec<(&str, u32)> = methods.iter().map(|m| (m.name(), m.rank())).collect();
        assert_eq!(
            ranks,
            vec![
                ("all_blanks", 0),
                ("blanks", 1),
                ("crc", 1),
                ("move_func", 2),
                ("del_args", 2),
                ("brackets", 2),
                ("ternary", 2),
                ("parens", 3),
                ("replace_regex", 4),
                ("shorten_ints", 5),
                ("indent", 15),
            ]
        );
    }

    #[test]
    fn test_select_by_name() {
        let methods = select(
            &["parens".to_string(), "ternary".to_string()],
            false,
            IndentTool::default(),
        )
        .unwrap();
        let names: Vec<&str> = methods.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["ternary", "parens"]);
    }

    #[test]
    fn test_select_unknown_method() {
        let err = select(&["frobnicate".to_string()], false, IndentTool::default()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownMethod(_)));
    }

    #[test]
    fn test_select_all() {
        let methods = select(&[], true, IndentTool::default()).unwrap();
        assert_eq!(methods.len(), 11);
    }
}
