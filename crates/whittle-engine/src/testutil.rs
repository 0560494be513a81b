//! Shared fixtures for engine tests: temp working directories with an
//! executable shell oracle, plus a one-call driver run.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use whittle_core::ProgramBuffer;

use crate::driver::FixpointDriver;
use crate::harness::OracleHarness;
use crate::methods::Reduction;
use crate::stats::RunStats;

/// Writes an executable `#!/bin/sh` script into `dir`.
pub(crate) fn write_oracle(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// Outcome of a full driver run over a scratch working directory.
pub(crate) struct Scenario {
    pub dir: TempDir,
    pub final_text: String,
    pub stats: RunStats,
    pub passes: u32,
}

/// Runs the given methods to a fixpoint over `input`, with the oracle
/// script body deciding interestingness. The oracle runs from the temp
/// directory and sees the program as `prog.c`.
pub(crate) fn run_scenario(
    input: &str,
    oracle_body: &str,
    methods: Vec<Box<dyn Reduction>>,
) -> Scenario {
    let dir = tempfile::tempdir().unwrap();
    let cfile = dir.path().join("prog.c");
    fs::write(&cfile, input).unwrap();
    let oracle = write_oracle(dir.path(), "oracle.sh", oracle_body);

    let mut buffer = ProgramBuffer::load(&cfile).unwrap();
    let mut stats = RunStats::new(buffer.len());
    let mut harness = OracleHarness::new(&oracle, &cfile, &buffer, false).unwrap();
    let mut driver = FixpointDriver::new(methods);

    let passes = driver.run(&mut buffer, &mut harness, &mut stats).unwrap();
    let final_text = fs::read_to_string(&cfile).unwrap();
    Scenario {
        dir,
        final_text,
        stats,
        passes,
    }
}
