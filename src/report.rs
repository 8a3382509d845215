//! Fixed-width measurement lines, failure lines, and batch summaries.
//!
//! The sink is any blocking `io::Write` (stdout in the CLI, a byte
//! vector in tests). One line per reported case; a header with matching
//! field names precedes the first measurement line of a batch; a summary
//! line closes each batch with pass/fail totals.

use std::io;

use crate::sweep::{CaseFailure, CaseOutcome};

const W_LEN: usize = 10;
const W_OFF: usize = 12;
const W_CYC: usize = 12;

/// Formats harness output into a blocking byte sink.
pub struct Reporter<W: io::Write> {
    out: W,
    /// False when the stall channel is absent; stall columns then show
    /// a dash instead of a misleading zero.
    stalls_supported: bool,
}

impl<W: io::Write> Reporter<W> {
    pub fn new(out: W, stalls_supported: bool) -> Self {
        Self {
            out,
            stalls_supported,
        }
    }

    /// Header line naming every measurement field.
    pub fn header(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "{:<W_LEN$}{:<W_OFF$}{:<W_OFF$}{:<W_CYC$}{:<W_CYC$}{:<W_CYC$}{:<W_CYC$}",
            "data_len",
            "src_offset",
            "dest_offset",
            "ref_cycles",
            "cand_cycles",
            "ref_stalls",
            "cand_stalls",
        )
    }

    /// One measurement line for a reported case.
    pub fn case_line(&mut self, outcome: &CaseOutcome) -> io::Result<()> {
        let (ref_stalls, cand_stalls) = if self.stalls_supported {
            (
                outcome.reference.stalls.to_string(),
                outcome.candidate.stalls.to_string(),
            )
        } else {
            ("-".to_string(), "-".to_string())
        };
        writeln!(
            self.out,
            "{:<W_LEN$}{:<W_OFF$}{:<W_OFF$}{:<W_CYC$}{:<W_CYC$}{:<W_CYC$}{:<W_CYC$}",
            outcome.case.data_len,
            outcome.case.src_offset,
            outcome.case.dest_offset,
            outcome.reference.cycles,
            outcome.candidate.cycles,
            ref_stalls,
            cand_stalls,
        )
    }

    /// One line per recorded failure, naming the exact configuration so
    /// it can be re-run as a single case.
    pub fn failure_line(&mut self, routine: &str, failure: &CaseFailure) -> io::Result<()> {
        writeln!(self.out, "FAIL {routine}: {failure}")
    }

    /// Batch summary with pass/fail totals.
    pub fn summary(&mut self, routine: &str, passed: usize, failed: usize) -> io::Result<()> {
        writeln!(
            self.out,
            "{routine}: {} cases, {passed} passed, {failed} failed",
            passed + failed
        )
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
