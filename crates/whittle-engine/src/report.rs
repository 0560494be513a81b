//! Final run report, as text and as JSON.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::EngineError;
use crate::stats::RunStats;

/// Everything the run produced, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,

    /// The oracle script that classified trials.
    pub oracle: String,

    /// The file that was reduced.
    pub target: String,

    /// Outer passes run, the fixpoint pass included.
    pub passes: u32,

    /// The run counters.
    pub stats: RunStats,
}

impl RunReport {
    /// Assembles a report stamped with the current time.
    pub fn new(oracle: String, target: String, passes: u32, stats: RunStats) -> Self {
        Self {
            generated_at: Utc::now(),
            oracle,
            target,
            passes,
            stats,
        }
    }

    /// Renders the human-readable report.
    ///
    /// Method and rule counters with no recorded trials are suppressed.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "reduction of {} complete", self.target);
        let _ = writeln!(
            out,
            "  {} -> {} bytes ({:.1}% reduction) in {} passes",
            self.stats.original_len,
            self.stats.committed_len,
            self.stats.reduction_percentage(),
            self.passes
        );
        let _ = writeln!(
            out,
            "  {} trials, {} cache hits",
            self.stats.trials, self.stats.cache_hits
        );

        let mut any = false;
        for (name, c) in &self.stats.methods {
            if c.total() == 0 {
                continue;
            }
            if !any {
                let _ = writeln!(out, "method counters:");
                any = true;
            }
            let _ = writeln!(out, "  {:>14}: {} ok, {} rejected", name, c.successes, c.failures);
        }

        let tables = [
            ("rewrite rules", &self.stats.plain_rules),
            ("delimited rewrite rules", &self.stats.delimited_rules),
        ];
        for (label, rules) in tables {
            let mut any = false;
            for (idx, c) in rules {
                if c.total() == 0 {
                    continue;
                }
                if !any {
                    let _ = writeln!(out, "{label}:");
                    any = true;
                }
                let _ = writeln!(out, "  #{idx:<3} {} ok, {} rejected", c.successes, c.failures);
            }
        }

        out
    }

    /// Writes the report as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::RuleTable;

    fn sample_report() -> RunReport {
        let mut stats = RunStats::new(100);
        stats.set_committed_len(40);
        stats.record_method("parens", true);
        stats.record_method("parens", false);
        stats.record_rule(RuleTable::Delimited, 7, true);
        RunReport::new("oracle.sh".into(), "prog.c".into(), 3, stats)
    }

    #[test]
    fn test_text_report_contents() {
        let text = sample_report().render_text();
        assert!(text.contains("100 -> 40 bytes (60.0% reduction) in 3 passes"));
        assert!(text.contains("parens: 1 ok, 1 rejected"));
        assert!(text.contains("delimited rewrite rules:"));
        assert!(text.contains("#7"));
    }

    #[test]
    fn test_zero_counters_suppressed() {
        let mut stats = RunStats::new(10);
        stats.set_committed_len(10);
        let text = RunReport::new("o".into(), "t".into(), 1, stats).render_text();
        assert!(!text.contains("method counters:"));
        assert!(!text.contains("rewrite rules:"));
    }

    #[test]
    fn test_json_roundtrip_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        sample_report().write_json(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["passes"], 3);
        assert_eq!(value["stats"]["methods"]["parens"]["successes"], 1);
        assert_eq!(value["stats"]["delimited_rules"]["7"]["successes"], 1);
    }
}
