//! Validation and cycle-cost harness for overlapping memory-move routines.
//!
//! ## Scope
//! This crate sweeps a combinatorial space of (length, source offset,
//! destination offset) move cases, confirms that each candidate routine
//! produces byte-for-byte the same buffer as a trusted reference routine,
//! and measures each invocation's cost in cycles and memory-stall events.
//!
//! ## Key invariants
//! - Every generated case is bounds-checked against the buffer capacity;
//!   out-of-bounds cases are recorded as failures, never silently skipped.
//! - Buffer comparison covers the *entire* capacity, not just the moved
//!   region, so a routine that clobbers bytes outside its destination
//!   range is caught.
//! - Per-case failures are local: both buffer images are re-seeded before
//!   every case, so no failure can corrupt a later case.
//! - The sweep continues after a recorded failure; a batch run surfaces
//!   every failing configuration, not just the first.
//!
//! ## Harness flow (one case)
//! 1) Seed the reference and candidate images identically.
//! 2) Invoke the reference routine on one image and the candidate on the
//!    other, each bracketed by counter samples with no intervening work.
//! 3) Compare the two images over the full capacity.
//! 4) Emit a measurement line when the case is flagged for reporting;
//!    record a failure with the full case parameters otherwise.
//!
//! ## Notable entry points
//! - `run_sweep` / `run_case`: batch and single-case execution.
//! - `MoveRoutine`: the capability a routine under test implements;
//!   `Reference` is the oracle.
//! - `PerfCounter`: cycle and memory-stall instrumentation.
//! - `MoveReproArtifact`: self-contained failure reproduction.

pub mod artifact;
pub mod counter;
pub mod fixture;
pub mod report;
pub mod routine;
pub mod sweep;

pub use artifact::{MoveReproArtifact, ReplayError, ARTIFACT_SCHEMA_VERSION};
pub use counter::{CounterError, PerfCounter, STALL_MASK};
pub use fixture::MoveFixture;
pub use report::Reporter;
pub use routine::{builtin_candidates, candidate_by_name, MoveRoutine, Reference};
pub use sweep::{
    case_count, max_data_len_limit, offset_limit, run_case, run_sweep, CaseFailure, CaseOutcome,
    CycleMeasurement, MoveCase, ReportMode, SweepConfig, SweepOutcome,
};
