//! The fixpoint driver.
//!
//! One *pass* sweeps a single method over the buffer from position 0 to
//! the end. One *outer pass* runs every enabled method, in ascending
//! rank order. The run terminates when a full outer pass commits no edit
//! anywhere: the fixpoint.

use tracing::{debug, info};

use whittle_core::ProgramBuffer;

use crate::error::EngineError;
use crate::harness::OracleHarness;
use crate::methods::{Reduction, Step, TrialCtx};
use crate::stats::RunStats;

/// Drives the enabled methods to a fixpoint.
pub struct FixpointDriver {
    methods: Vec<Box<dyn Reduction>>,
}

impl FixpointDriver {
    /// Builds a driver over the given methods, sorted by ascending rank.
    ///
    /// The sort is stable, so methods sharing a rank keep their registry
    /// order.
    pub fn new(mut methods: Vec<Box<dyn Reduction>>) -> Self {
        methods.sort_by_key(|m| m.rank());
        Self { methods }
    }

    /// The enabled method names in execution order.
    pub fn method_names(&self) -> Vec<&'static str> {
        self.methods.iter().map(|m| m.name()).collect()
    }

    /// Runs outer passes until one commits nothing, returning how many
    /// outer passes ran.
    pub fn run(
        &mut self,
        buffer: &mut ProgramBuffer,
        harness: &mut OracleHarness,
        stats: &mut RunStats,
    ) -> Result<u32, EngineError> {
        let mut pass = 0u32;
        loop {
            pass += 1;
            let snapshot = harness.work_dir().join(format!("delta_backup_{pass}.c"));
            buffer.save(&snapshot)?;
            info!(pass, len = buffer.len(), "starting outer pass");

            let mut any = false;
            for idx in 0..self.methods.len() {
                any |= self.run_method_pass(idx, pass, buffer, harness, stats)?;
            }

            if !any {
                info!(pass, len = buffer.len(), "fixpoint reached");
                return Ok(pass);
            }
        }
    }

    /// Sweeps one method over the whole buffer once.
    fn run_method_pass(
        &mut self,
        idx: usize,
        pass: u32,
        buffer: &mut ProgramBuffer,
        harness: &mut OracleHarness,
        stats: &mut RunStats,
    ) -> Result<bool, EngineError> {
        let method = &mut self.methods[idx];
        harness.sanity_check(method.name())?;
        method.begin_pass();
        debug!(pass, method = method.name(), len = buffer.len(), "starting method pass");

        let mut pos = 0usize;
        let mut worked = false;
        while pos < buffer.len() {
            let mut ctx = TrialCtx {
                buffer: &mut *buffer,
                harness: &mut *harness,
                stats: &mut *stats,
                method: method.name(),
                pass,
                pos,
            };
            match method.try_at(&mut ctx)? {
                Step::Miss => pos += 1,
                // Jumps always make progress, so a stray backwards target
                // cannot stall the sweep.
                Step::MissTo(p) => pos = p.max(pos + 1),
                // The position stays put after an accepted edit; further
                // edits may apply at the same site.
                Step::Hit => worked = true,
                Step::HitTo(p) => {
                    worked = true;
                    pos = p.max(pos + 1);
                }
                Step::Done(w) => {
                    worked |= w;
                    break;
                }
            }
        }

        Ok(worked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::{
        AllBlanks, CrcCalls, DelArgs, MoveFunc, PairStrip, ReplaceRegex, ShortenInts, Ternary,
    };
    use crate::testutil::run_scenario;

    const KEEP_X: &str = "grep -q X prog.c";

    #[test]
    fn test_empty_body_program_terminates_immediately() {
        let methods: Vec<Box<dyn Reduction>> = vec![
            Box::new(AllBlanks::new()),
            Box::new(PairStrip::braces()),
            Box::new(PairStrip::parens()),
            Box::new(ReplaceRegex::new()),
        ];
        let s = run_scenario("", "exit 0", methods);
        assert_eq!(s.passes, 1);
        assert_eq!(s.stats.total_successes(), 0);
        assert_eq!(s.final_text, " ");
    }

    #[test]
    fn test_braces_scenario_keeps_contents() {
        let s = run_scenario(
            " int main(void){int x; X; return 0;} ",
            KEEP_X,
            vec![Box::new(PairStrip::braces())],
        );
        // Deleting the whole braced run would lose X, so only the two
        // brace characters go.
        assert!(s.final_text.contains('X'));
        assert!(!s.final_text.contains('{'));
        assert!(!s.final_text.contains('}'));
        assert!(s.final_text.contains("int main(void)"));
        assert!(s.stats.method("brackets").successes >= 1);
    }

    #[test]
    fn test_parens_scenario_falls_back_to_bracket_only_deletion() {
        let s = run_scenario(
            " a = (b + c); X ",
            "grep -q 'b + c' prog.c && grep -q X prog.c",
            vec![Box::new(PairStrip::parens())],
        );
        assert_eq!(s.final_text, " a = b + c; X ");
        let c = s.stats.method("parens");
        assert_eq!(c.successes, 1);
        // The whole-span candidate was rejected first.
        assert!(c.failures >= 1);
    }

    #[test]
    fn test_shorten_ints_scenario_steps_through_suffix_then_prefix() {
        let s = run_scenario(
            " int x = 0x1ULL; X ",
            KEEP_X,
            vec![Box::new(ShortenInts::new())],
        );
        assert_eq!(s.final_text, " int x = 1; X ");
        // 0x1ULL -> 0x1UL -> 0x1U -> 0x1 -> 1
        assert_eq!(s.stats.method("shorten_ints").successes, 4);
    }

    #[test]
    fn test_ternary_scenario_prefers_then_arm() {
        let s = run_scenario(
            " a ? b : c ; X ",
            KEEP_X,
            vec![Box::new(Ternary::new())],
        );
        assert_eq!(s.final_text, " b ; X ");
    }

    #[test]
    fn test_ternary_scenario_falls_back_to_else_arm() {
        let s = run_scenario(
            " a ? b : c ; X ",
            "grep -q 'c' prog.c && grep -q X prog.c",
            vec![Box::new(Ternary::new())],
        );
        assert_eq!(s.final_text, " c ; X ");
    }

    #[test]
    fn test_crc_scenario_rewrites_to_printf() {
        let s = run_scenario(
            " transparent_crc(g_1, \"x\", 0); X ",
            KEEP_X,
            vec![Box::new(CrcCalls::new())],
        );
        assert!(s.final_text.contains("printf (\"%d\\n\", (int)g_1);"));
        assert!(!s.final_text.contains("transparent_crc"));
    }

    #[test]
    fn test_all_blanks_scenario_normalizes_whitespace() {
        let s = run_scenario(
            " int  main ( ) {  lbl:x  ;  }  X ",
            KEEP_X,
            vec![Box::new(AllBlanks::new())],
        );
        assert!(!s.final_text.contains("  "));
        assert!(s.final_text.contains('X'));
        // The label colon picked up a separator.
        assert!(s.final_text.contains("lbl: x"));
        // The second outer pass found nothing left to do.
        assert_eq!(s.passes, 2);
    }

    #[test]
    fn test_replace_regex_scenario_reduces_monotonically() {
        let s = run_scenario(
            " int x = 3; ; X ",
            KEEP_X,
            vec![Box::new(ReplaceRegex::new())],
        );
        assert!(s.final_text.contains('X'));
        assert!(s.final_text.len() <= " int x = 3; ; X ".len());
        assert!(s.stats.method("replace_regex").successes >= 1);
        assert!(s.stats.committed_len <= s.stats.original_len);
    }

    #[test]
    fn test_move_func_scenario_pulls_definition_into_prototype_slot() {
        let input =
            " int foo(void); int bar(void) { return 0; } int foo(void) { return X; } ";
        let s = run_scenario(input, KEEP_X, vec![Box::new(MoveFunc::new())]);

        assert!(!s.final_text.contains("foo(void);"));
        let foo_def = s.final_text.find("int foo(void) { return X; }").unwrap();
        let bar_def = s.final_text.find("int bar(void)").unwrap();
        assert!(foo_def < bar_def);
        assert_eq!(s.stats.method("move_func").successes, 1);
    }

    #[test]
    fn test_del_args_records_without_editing() {
        let s = run_scenario(
            " int foo(void); int foo(void); X ",
            KEEP_X,
            vec![Box::new(DelArgs::new())],
        );
        // Bookkeeping only: nothing accepted, so one pass suffices.
        assert_eq!(s.passes, 1);
        assert_eq!(s.stats.total_successes(), 0);
        assert_eq!(s.final_text, " int foo(void); int foo(void); X ");
    }

    #[test]
    fn test_blanks_collapses_each_run() {
        let s = run_scenario(
            " a  b;   X ",
            KEEP_X,
            vec![Box::new(crate::methods::Blanks::new())],
        );
        assert_eq!(s.final_text, " a b; X ");
        assert_eq!(s.stats.method("blanks").successes, 2);
    }

    #[test]
    fn test_combined_methods_terminate_and_keep_marker() {
        let input = " int foo(void); int foo(void) { int y = 0x22UL; y += 3; \
                     transparent_crc(y, \"y\", 0); if (y > 0) { q = y ? 1 : 2; } \
                     lbl: goto lbl; X; return 0; } ";
        let methods: Vec<Box<dyn Reduction>> = vec![
            Box::new(AllBlanks::new()),
            Box::new(crate::methods::Blanks::new()),
            Box::new(CrcCalls::new()),
            Box::new(MoveFunc::new()),
            Box::new(DelArgs::new()),
            Box::new(PairStrip::braces()),
            Box::new(Ternary::new()),
            Box::new(PairStrip::parens()),
            Box::new(ReplaceRegex::new()),
            Box::new(ShortenInts::new()),
        ];
        let s = run_scenario(input, KEEP_X, methods);

        assert!(s.final_text.contains('X'));
        assert!(s.final_text.len() <= input.len());
        assert!(s.stats.committed_len <= s.stats.original_len);
        assert!(s.stats.total_successes() > 0);
        // The last outer pass is the one that found nothing.
        assert!(s.passes >= 2);
    }

    #[test]
    fn test_methods_sorted_by_rank() {
        let driver = FixpointDriver::new(vec![
            Box::new(ShortenInts::new()),
            Box::new(AllBlanks::new()),
            Box::new(PairStrip::parens()),
            Box::new(PairStrip::braces()),
        ]);
        assert_eq!(
            driver.method_names(),
            vec!["all_blanks", "brackets", "parens", "shorten_ints"]
        );
    }

    #[test]
    fn test_snapshot_per_outer_pass() {
        let s = run_scenario(
            " a ? b : c ; X ",
            KEEP_X,
            vec![Box::new(Ternary::new())],
        );
        assert!(s.dir.path().join("delta_backup_1.c").exists());
        assert!(s.dir.path().join("delta_backup_2.c").exists());
    }
}
