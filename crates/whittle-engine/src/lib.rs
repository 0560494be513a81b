//! # whittle-engine
//!
//! The reduction engine behind the `whittle` binary: a catalogue of
//! syntactic reduction methods, the oracle harness that decides whether
//! each candidate edit keeps the program interesting, and the fixpoint
//! driver that sweeps every enabled method over the program until a full
//! round makes no progress.
//!
//! The engine deliberately produces syntactically invalid intermediate
//! programs; the oracle filters them out cheaply. Everything runs
//! strictly serially — at most one oracle subprocess is ever in flight.
//!
//! ## Example
//!
//! ```rust,ignore
//! use whittle_core::ProgramBuffer;
//! use whittle_engine::{methods, FixpointDriver, IndentTool, OracleHarness, RunStats};
//!
//! let mut buffer = ProgramBuffer::load("prog.c")?;
//! let mut stats = RunStats::new(buffer.len());
//! let mut harness = OracleHarness::new("oracle.sh".as_ref(), "prog.c".as_ref(), &buffer, false)?;
//! let mut driver = FixpointDriver::new(methods::select(&[], true, IndentTool::default())?);
//!
//! let passes = driver.run(&mut buffer, &mut harness, &mut stats)?;
//! println!("{} passes, {:.1}% smaller", passes, stats.reduction_percentage());
//! ```

pub mod driver;
pub mod error;
pub mod harness;
pub mod methods;
pub mod report;
pub mod stats;

#[cfg(test)]
pub(crate) mod testutil;

pub use driver::FixpointDriver;
pub use error::EngineError;
pub use harness::{Enlarge, OracleHarness, Verdict};
pub use methods::{IndentTool, Reduction, Step, TrialCtx};
pub use report::RunReport;
pub use stats::{Counter, RuleTable, RunStats};
