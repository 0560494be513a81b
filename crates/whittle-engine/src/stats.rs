//! Counters gathered over a reduction run.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Success/failure tally for one method or one rewrite rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counter {
    /// Trials the oracle accepted.
    pub successes: u64,
    /// Trials the oracle rejected (cache hits included).
    pub failures: u64,
}

impl Counter {
    /// Total number of trials recorded.
    pub fn total(&self) -> u64 {
        self.successes + self.failures
    }

    fn record(&mut self, accepted: bool) {
        if accepted {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }
}

/// Which rewrite-rule catalogue a rule counter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTable {
    /// Rules applied wherever their pattern matches.
    Plain,
    /// Rules that additionally require border characters on both flanks.
    Delimited,
}

/// Statistics for a whole reduction run.
///
/// Methods report through `record_*` calls as trials happen; the final
/// report renders the maps with zero-entry suppression.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// Length of the program when the run started.
    pub original_len: usize,

    /// Length of the last accepted program.
    pub committed_len: usize,

    /// Number of trials answered from the cache without running the
    /// oracle.
    pub cache_hits: u64,

    /// Total trials, cache hits included.
    pub trials: u64,

    /// Per-method counters, keyed by method name.
    pub methods: BTreeMap<&'static str, Counter>,

    /// Per-rule counters for the plain rewrite catalogue, keyed by
    /// catalogue position.
    pub plain_rules: BTreeMap<usize, Counter>,

    /// Per-rule counters for the border-delimited rewrite catalogue.
    pub delimited_rules: BTreeMap<usize, Counter>,
}

impl RunStats {
    /// Creates stats for a program of the given starting length.
    pub fn new(original_len: usize) -> Self {
        Self {
            original_len,
            committed_len: original_len,
            cache_hits: 0,
            trials: 0,
            methods: BTreeMap::new(),
            plain_rules: BTreeMap::new(),
            delimited_rules: BTreeMap::new(),
        }
    }

    /// Records that a trial took place.
    pub fn record_trial(&mut self) {
        self.trials += 1;
    }

    /// Records a trial answered from the cache.
    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    /// Records the outcome of a trial for a method.
    pub fn record_method(&mut self, method: &'static str, accepted: bool) {
        self.methods.entry(method).or_default().record(accepted);
    }

    /// Records the outcome of a trial for a rewrite rule.
    pub fn record_rule(&mut self, table: RuleTable, index: usize, accepted: bool) {
        let map = match table {
            RuleTable::Plain => &mut self.plain_rules,
            RuleTable::Delimited => &mut self.delimited_rules,
        };
        map.entry(index).or_default().record(accepted);
    }

    /// The current tally for a method.
    pub fn method(&self, method: &str) -> Counter {
        self.methods.get(method).copied().unwrap_or_default()
    }

    /// Updates the committed program length.
    pub fn set_committed_len(&mut self, len: usize) {
        self.committed_len = len;
    }

    /// Total accepted trials across every method.
    pub fn total_successes(&self) -> u64 {
        self.methods.values().map(|c| c.successes).sum()
    }

    /// Percent shrinkage of the committed program relative to the
    /// original.
    pub fn reduction_percentage(&self) -> f64 {
        if self.original_len == 0 {
            return 0.0;
        }
        (1.0 - self.committed_len as f64 / self.original_len as f64) * 100.0
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} bytes ({:.1}% reduction), {} trials, {} cache hits",
            self.original_len,
            self.committed_len,
            self.reduction_percentage(),
            self.trials,
            self.cache_hits
        )
    }
}
