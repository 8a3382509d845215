//! Case enumeration and per-case execution.
//!
//! # Scope
//! The sweep walks every (data_len, src_offset, dest_offset) triple under
//! the triangular bound `offset_limit = 2 * data_len + 5`, which covers
//! small disjoint moves through maximally-overlapping ones relative to
//! each length. For each case it seeds the fixture, times the reference
//! and the candidate, and compares whole buffers.
//!
//! # Invariants
//! - The offset bound is coupled to the buffer capacity: for large
//!   length limits it can name offsets past the buffer. Such cases are a
//!   configuration error and are *recorded as failures*, never silently
//!   skipped; [`max_data_len_limit`] derives the largest limit that
//!   cannot produce one.
//! - A recorded failure never stops an exhaustive run: the sweep
//!   continues so a batch surfaces every failing configuration.
//! - Reporting is independent of correctness and never affects the
//!   pass/fail outcome.

use std::io;

use serde::{Deserialize, Serialize};

use crate::counter::{PerfCounter, STALL_MASK};
use crate::fixture::MoveFixture;
use crate::report::Reporter;
use crate::routine::MoveRoutine;

/// One concrete combination of move length and offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCase {
    pub data_len: usize,
    pub src_offset: usize,
    pub dest_offset: usize,
}

impl MoveCase {
    /// Capacity invariant: both regions must fit strictly inside the
    /// buffer.
    ///
    /// Checked addition: cases arrive from the CLI and from replay
    /// artifacts, so near-`usize::MAX` fields must fail the check, not
    /// overflow it.
    pub fn fits(&self, capacity: usize) -> bool {
        self.data_len
            .checked_add(self.src_offset)
            .is_some_and(|end| end < capacity)
            && self
                .data_len
                .checked_add(self.dest_offset)
                .is_some_and(|end| end < capacity)
    }
}

impl std::fmt::Display for MoveCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "len={} src={} dst={}",
            self.data_len, self.src_offset, self.dest_offset
        )
    }
}

/// Elapsed cost of one routine invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleMeasurement {
    /// Wrapping cycle-counter delta across the call.
    pub cycles: u64,
    /// Stall-counter delta, masked to the 8-bit stall register width.
    pub stalls: u64,
}

/// A recorded per-case failure, carrying everything needed to reproduce
/// the case as a single-case run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseFailure {
    /// The generated case violates the capacity invariant.
    Bounds { case: MoveCase, capacity: usize },
    /// Candidate output differs from the reference somewhere in the
    /// buffer.
    Mismatch {
        case: MoveCase,
        /// First differing buffer index.
        index: usize,
        /// Reference byte at that index.
        expected: u8,
        /// Candidate byte at that index.
        actual: u8,
    },
}

impl CaseFailure {
    pub fn case(&self) -> &MoveCase {
        match self {
            Self::Bounds { case, .. } | Self::Mismatch { case, .. } => case,
        }
    }
}

impl std::fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounds { case, capacity } => {
                write!(f, "case {case} exceeds capacity {capacity}")
            }
            Self::Mismatch {
                case,
                index,
                expected,
                actual,
            } => write!(
                f,
                "case {case} mismatch at index {index}: reference {expected:#04x}, candidate {actual:#04x}"
            ),
        }
    }
}

impl std::error::Error for CaseFailure {}

/// Which measured cases get a report line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// Correctness only, no measurement lines.
    None,
    /// Only cases at the final `data_len` of the batch.
    #[default]
    FinalLength,
    /// Every case.
    All,
}

/// Sweep parameters. `Default` matches the observed harness
/// configuration: 512-byte buffer, lengths below 32, final-length
/// reporting.
#[derive(Clone, Copy, Debug)]
pub struct SweepConfig {
    pub capacity: usize,
    pub data_len_limit: usize,
    pub report: ReportMode,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            capacity: 512,
            data_len_limit: 32,
            report: ReportMode::FinalLength,
        }
    }
}

/// Result of one executed case.
#[derive(Clone, Debug)]
pub struct CaseOutcome {
    pub case: MoveCase,
    pub reference: CycleMeasurement,
    pub candidate: CycleMeasurement,
    pub failure: Option<CaseFailure>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Aggregate result of a batch run.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub cases_run: usize,
    pub passed: usize,
    pub reported: usize,
    pub failures: Vec<CaseFailure>,
}

impl SweepOutcome {
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Offset bound for one move length.
pub fn offset_limit(data_len: usize) -> usize {
    2 * data_len + 5
}

/// Number of cases a full sweep executes for `data_len_limit`.
pub fn case_count(data_len_limit: usize) -> usize {
    (0..data_len_limit)
        .map(|len| {
            let limit = offset_limit(len);
            limit * limit
        })
        .sum()
}

/// Largest `data_len_limit` whose sweep cannot generate a case violating
/// the capacity invariant.
///
/// The worst case at length `L` is offset `2L + 4`, so `L` is safe while
/// `3L + 4 < capacity`.
pub fn max_data_len_limit(capacity: usize) -> usize {
    if capacity < 5 {
        return 0;
    }
    (capacity - 5) / 3 + 1
}

/// Run one case: seed, invoke both routines timed, compare whole
/// buffers. Returns the outcome; never writes to a sink.
pub fn run_case(
    case: MoveCase,
    fixture: &mut MoveFixture,
    counter: &PerfCounter,
    oracle: &dyn MoveRoutine,
    candidate: &dyn MoveRoutine,
) -> CaseOutcome {
    let capacity = fixture.capacity();
    if !case.fits(capacity) {
        return CaseOutcome {
            case,
            reference: CycleMeasurement::default(),
            candidate: CycleMeasurement::default(),
            failure: Some(CaseFailure::Bounds { case, capacity }),
        };
    }

    fixture.seed(&case);
    let reference = timed_invoke(counter, oracle, fixture.reference_image(), &case);
    let candidate_cost = timed_invoke(counter, candidate, fixture.candidate_image(), &case);

    let failure = fixture.compare().map(|m| CaseFailure::Mismatch {
        case,
        index: m.index,
        expected: m.expected,
        actual: m.actual,
    });

    CaseOutcome {
        case,
        reference,
        candidate: candidate_cost,
        failure,
    }
}

/// Sample order is stalls outermost so the cycle window stays tight
/// around the call itself.
fn timed_invoke(
    counter: &PerfCounter,
    routine: &dyn MoveRoutine,
    buf: &mut [u8],
    case: &MoveCase,
) -> CycleMeasurement {
    let stall_start = counter.sample_stalls();
    let start = counter.sample_cycles();
    routine.invoke(buf, case.dest_offset, case.src_offset, case.data_len);
    let stop = counter.sample_cycles();
    let stall_stop = counter.sample_stalls();
    CycleMeasurement {
        cycles: PerfCounter::elapsed(start, stop),
        stalls: PerfCounter::elapsed(stall_start, stall_stop) & STALL_MASK,
    }
}

/// Drive the full case matrix for one candidate against the oracle.
///
/// Failures are recorded and the sweep continues; only sink I/O errors
/// abort the run.
pub fn run_sweep<W: io::Write>(
    config: &SweepConfig,
    counter: &PerfCounter,
    oracle: &dyn MoveRoutine,
    candidate: &dyn MoveRoutine,
    reporter: &mut Reporter<W>,
) -> io::Result<SweepOutcome> {
    let mut fixture = MoveFixture::new(config.capacity);
    let mut outcome = SweepOutcome::default();

    let mut header_written = false;
    for data_len in 0..config.data_len_limit {
        let limit = offset_limit(data_len);
        let report_len = match config.report {
            ReportMode::None => false,
            ReportMode::FinalLength => data_len + 1 == config.data_len_limit,
            ReportMode::All => true,
        };
        for src_offset in 0..limit {
            for dest_offset in 0..limit {
                let case = MoveCase {
                    data_len,
                    src_offset,
                    dest_offset,
                };
                let result = run_case(case, &mut fixture, counter, oracle, candidate);
                outcome.cases_run += 1;
                if let Some(failure) = &result.failure {
                    reporter.failure_line(candidate.name(), failure)?;
                    outcome.failures.push(failure.clone());
                } else {
                    outcome.passed += 1;
                }
                if report_len {
                    if !header_written {
                        reporter.header()?;
                        header_written = true;
                    }
                    reporter.case_line(&result)?;
                    outcome.reported += 1;
                }
            }
        }
    }

    reporter.summary(candidate.name(), outcome.passed, outcome.failures.len())?;
    Ok(outcome)
}
