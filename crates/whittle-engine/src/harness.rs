//! Oracle harness: runs trials against the external oracle script.
//!
//! A trial writes the candidate program to the working file, asks the
//! oracle whether it is still interesting, and either commits the edit
//! (refreshing the backup file) or restores the previous program from the
//! backup. Verdicts are cached keyed by the full program text; the cache
//! is dropped whenever the committed program strictly shrinks, which also
//! bounds its memory.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use whittle_core::ProgramBuffer;

use crate::error::EngineError;
use crate::stats::RunStats;

/// Outcome of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The oracle accepted the candidate; the edit is committed.
    Accept,
    /// The oracle rejected the candidate; the buffer was restored.
    Reject,
}

impl Verdict {
    /// True for [`Verdict::Accept`].
    pub fn accepted(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Whether a trial is allowed to grow the program.
///
/// A method that promises non-growth and then commits a longer program
/// has a bug; the harness turns that into a fatal
/// [`EngineError::ContractViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enlarge {
    Deny,
    Allow,
}

/// Drives the external oracle and owns the working files.
///
/// The oracle is an executable script invoked as `./<name>` from its own
/// directory, with no arguments and no stdin; it reads the working file
/// itself and exits 0 iff the program is interesting. Its output is
/// discarded.
#[derive(Debug)]
pub struct OracleHarness {
    oracle_dir: PathBuf,
    oracle_invocation: PathBuf,
    cfile: PathBuf,
    backup: PathBuf,
    work_dir: PathBuf,
    cache: HashMap<Vec<u8>, bool>,
    committed_len: usize,
    trial_no: u64,
    keep_trials: bool,
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn is_executable_file(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

impl OracleHarness {
    /// Sets up the harness for a run.
    ///
    /// Validates the oracle, snapshots the untouched input to
    /// `<cfile>.orig`, writes the sentinel-normalized buffer back to the
    /// working file, and seeds `<cfile>.bak` from it.
    pub fn new(
        oracle: &Path,
        cfile: &Path,
        buffer: &ProgramBuffer,
        keep_trials: bool,
    ) -> Result<Self, EngineError> {
        if !is_executable_file(oracle) {
            return Err(EngineError::BadOracle {
                path: oracle.to_path_buf(),
            });
        }

        let oracle_dir = match oracle.parent() {
            Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("."),
        };
        let oracle_invocation =
            Path::new(".").join(oracle.file_name().ok_or_else(|| EngineError::BadOracle {
                path: oracle.to_path_buf(),
            })?);

        let backup = sibling_with_suffix(cfile, ".bak");
        let orig = sibling_with_suffix(cfile, ".orig");
        fs::copy(cfile, &orig)?;

        buffer.save(cfile)?;
        fs::copy(cfile, &backup)?;

        let work_dir = match cfile.parent() {
            Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("."),
        };

        Ok(Self {
            oracle_dir,
            oracle_invocation,
            cfile: cfile.to_path_buf(),
            backup,
            work_dir,
            cache: HashMap::new(),
            committed_len: buffer.len(),
            trial_no: 0,
            keep_trials,
        })
    }

    /// The working file the oracle reads.
    pub fn cfile(&self) -> &Path {
        &self.cfile
    }

    /// The directory snapshots and trial files are written to.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Length of the last committed program.
    pub fn committed_len(&self) -> usize {
        self.committed_len
    }

    /// Number of cached verdicts currently held.
    pub fn cached_verdicts(&self) -> usize {
        self.cache.len()
    }

    /// Checks that the oracle still accepts the last committed program.
    ///
    /// Runs at the start of every method pass. A failure here means the
    /// backup invariant is broken and the run cannot continue.
    pub fn sanity_check(&mut self, method: &str) -> Result<(), EngineError> {
        fs::copy(&self.backup, &self.cfile)?;
        if self.run_oracle()? {
            Ok(())
        } else {
            Err(EngineError::SanityCheckFailed {
                method: method.to_string(),
            })
        }
    }

    /// Restores the buffer and the working file from the backup.
    pub fn restore(&self, buffer: &mut ProgramBuffer) -> Result<(), EngineError> {
        fs::copy(&self.backup, &self.cfile)?;
        *buffer = ProgramBuffer::load(&self.cfile)?;
        Ok(())
    }

    /// Runs one trial for the candidate currently in `buffer`.
    ///
    /// `pass` and `pos` only feed the progress line. A cache hit counts
    /// as a rejection whatever the cached verdict was: replaying a known
    /// success cannot make progress, so reverting keeps the sweep moving.
    pub fn test(
        &mut self,
        buffer: &mut ProgramBuffer,
        method: &'static str,
        enlarge: Enlarge,
        stats: &mut RunStats,
        pass: u32,
        pos: usize,
    ) -> Result<Verdict, EngineError> {
        self.trial_no += 1;
        stats.record_trial();

        if self.keep_trials {
            let trial_path = self.work_dir.join(format!("delta_tmp_{}.c", self.trial_no));
            buffer.save(&trial_path)?;
        }

        let key = buffer.to_vec();
        if let Some(&cached) = self.cache.get(&key) {
            stats.record_cache_hit();
            stats.record_method(method, false);
            self.restore(buffer)?;
            let c = stats.method(method);
            debug!(
                pass,
                method,
                pos,
                len = key.len(),
                cached,
                success = c.successes,
                failure = c.failures,
                "trial rejected (cached)"
            );
            return Ok(Verdict::Reject);
        }

        buffer.save(&self.cfile)?;
        let interesting = self.run_oracle()?;
        self.cache.insert(key, interesting);

        if interesting {
            fs::copy(&self.cfile, &self.backup)?;
            stats.record_method(method, true);

            let new_len = buffer.len();
            if new_len > self.committed_len && enlarge == Enlarge::Deny {
                return Err(EngineError::ContractViolation {
                    method: method.to_string(),
                    old: self.committed_len,
                    new: new_len,
                });
            }
            if new_len < self.committed_len {
                self.cache.clear();
            }
            self.committed_len = new_len;
            stats.set_committed_len(new_len);

            let c = stats.method(method);
            info!(
                pass,
                method,
                pos,
                len = new_len,
                success = c.successes,
                failure = c.failures,
                reduction = format!("{:.1}%", stats.reduction_percentage()),
                "trial accepted"
            );
            Ok(Verdict::Accept)
        } else {
            stats.record_method(method, false);
            self.restore(buffer)?;
            let c = stats.method(method);
            debug!(
                pass,
                method,
                pos,
                success = c.successes,
                failure = c.failures,
                "trial rejected"
            );
            Ok(Verdict::Reject)
        }
    }

    fn run_oracle(&self) -> Result<bool, EngineError> {
        let status = Command::new(&self.oracle_invocation)
            .current_dir(&self.oracle_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| EngineError::Tool {
                tool: self.oracle_invocation.display().to_string(),
                source: e,
            })?;
        Ok(status.success())
    }
}
