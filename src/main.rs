//! Overlapping-move validation and cycle-cost CLI.
//!
//! Sweeps the (length, src offset, dest offset) case matrix for each
//! selected candidate routine against the trusted reference, printing
//! fixed-width measurement lines to stdout and recording every failing
//! configuration.
//!
//! # Output Format
//!
//! Measurement lines:
//! `data_len src_offset dest_offset ref_cycles cand_cycles ref_stalls cand_stalls`
//!
//! Failure lines: `FAIL <routine>: <case parameters>`
//!
//! Statistics are written to stderr upon completion:
//! `cases=N passed=N failed=N reported=N elapsed_ms=N`
//!
//! # Exit Codes
//!
//! - `0`: all cases passed
//! - `1`: at least one failure recorded
//! - `2`: invalid arguments or configuration error

use std::env;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use movebench::artifact::{write_artifact, MoveReproArtifact};
use movebench::counter::PerfCounter;
use movebench::fixture::MoveFixture;
use movebench::report::Reporter;
use movebench::routine::{builtin_candidates, candidate_by_name, MoveRoutine, Reference};
use movebench::sweep::{run_case, run_sweep, MoveCase, ReportMode, SweepConfig};

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!(
        "usage: {} [OPTIONS]

OPTIONS:
    --len-limit=<N>         Exclusive move-length limit for the sweep (default: 32)
    --capacity=<N>          Buffer capacity in bytes (default: 512)
    --routine=<name>        Run only one candidate: bytewise, word, stdptr (default: all)
    --report=<mode>         Measurement lines: none, final, all (default: final)
    --case=<len,src,dst>    Run a single case instead of a sweep; always reported
    --artifact-dir=<path>   Write one JSON artifact per recorded failure
    --strict-stalls         Fail startup when the memory-stall counter is unavailable
    --help, -h              Show this help message",
        exe.to_string_lossy()
    );
}

fn parse_case(value: &str) -> Option<MoveCase> {
    let mut parts = value.split(',');
    let data_len = parts.next()?.trim().parse().ok()?;
    let src_offset = parts.next()?.trim().parse().ok()?;
    let dest_offset = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(MoveCase {
        data_len,
        src_offset,
        dest_offset,
    })
}

fn main() -> io::Result<()> {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "movebench".into());

    let mut config = SweepConfig::default();
    let mut routine: Option<String> = None;
    let mut single_case: Option<MoveCase> = None;
    let mut artifact_dir: Option<PathBuf> = None;
    let mut strict_stalls = false;

    for arg in args {
        let Some(flag) = arg.to_str() else {
            eprintln!("invalid argument: {}", arg.to_string_lossy());
            std::process::exit(2);
        };
        if let Some(value) = flag.strip_prefix("--len-limit=") {
            config.data_len_limit = value.parse().unwrap_or_else(|_| {
                eprintln!("invalid --len-limit value: {}", value);
                std::process::exit(2);
            });
            continue;
        }
        if let Some(value) = flag.strip_prefix("--capacity=") {
            let n: usize = value.parse().unwrap_or_else(|_| {
                eprintln!("invalid --capacity value: {}", value);
                std::process::exit(2);
            });
            if n == 0 {
                eprintln!("--capacity must be >= 1");
                std::process::exit(2);
            }
            config.capacity = n;
            continue;
        }
        if let Some(value) = flag.strip_prefix("--routine=") {
            routine = Some(value.to_string());
            continue;
        }
        if let Some(value) = flag.strip_prefix("--report=") {
            config.report = match value {
                "none" => ReportMode::None,
                "final" => ReportMode::FinalLength,
                "all" => ReportMode::All,
                _ => {
                    eprintln!("invalid --report value: {} (none|final|all)", value);
                    std::process::exit(2);
                }
            };
            continue;
        }
        if let Some(value) = flag.strip_prefix("--case=") {
            single_case = Some(parse_case(value).unwrap_or_else(|| {
                eprintln!("invalid --case value: {} (expected len,src,dst)", value);
                std::process::exit(2);
            }));
            continue;
        }
        if let Some(value) = flag.strip_prefix("--artifact-dir=") {
            artifact_dir = Some(PathBuf::from(value));
            continue;
        }
        match flag {
            "--strict-stalls" => strict_stalls = true,
            "--help" | "-h" => {
                print_usage(&exe);
                std::process::exit(0);
            }
            _ => {
                eprintln!("unknown flag: {}", flag);
                print_usage(&exe);
                std::process::exit(2);
            }
        }
    }

    let candidates: Vec<Box<dyn MoveRoutine>> = match routine {
        Some(name) => {
            let Some(candidate) = candidate_by_name(&name) else {
                eprintln!("unknown routine: {}", name);
                std::process::exit(2);
            };
            vec![candidate]
        }
        None => builtin_candidates(),
    };

    let counter = PerfCounter::enable(strict_stalls).unwrap_or_else(|err| {
        eprintln!("counter error: {err}");
        std::process::exit(2);
    });

    let start = Instant::now();
    let stdout = io::stdout();
    let mut reporter = Reporter::new(stdout.lock(), counter.stalls_supported());

    let mut cases = 0usize;
    let mut passed = 0usize;
    let mut reported = 0usize;
    let mut failures = Vec::new();

    for candidate in &candidates {
        if let Some(case) = single_case {
            // Single-case invocations are always reported.
            let mut fixture = MoveFixture::new(config.capacity);
            let outcome = run_case(case, &mut fixture, &counter, &Reference, candidate.as_ref());
            reporter.header()?;
            reporter.case_line(&outcome)?;
            reported += 1;
            cases += 1;
            match outcome.failure {
                Some(failure) => {
                    reporter.failure_line(candidate.name(), &failure)?;
                    failures.push((candidate.name(), failure));
                    reporter.summary(candidate.name(), 0, 1)?;
                }
                None => {
                    passed += 1;
                    reporter.summary(candidate.name(), 1, 0)?;
                }
            }
        } else {
            let outcome = run_sweep(
                &config,
                &counter,
                &Reference,
                candidate.as_ref(),
                &mut reporter,
            )?;
            cases += outcome.cases_run;
            passed += outcome.passed;
            reported += outcome.reported;
            failures.extend(
                outcome
                    .failures
                    .into_iter()
                    .map(|failure| (candidate.name(), failure)),
            );
        }
    }

    if let Some(dir) = artifact_dir {
        for (name, failure) in &failures {
            let artifact = MoveReproArtifact::capture(config.capacity, name, failure);
            if let Err(err) = write_artifact(&dir, &artifact) {
                eprintln!("artifact write failed: {err}");
                std::process::exit(2);
            }
        }
    }

    let elapsed = start.elapsed();
    eprintln!(
        "cases={} passed={} failed={} reported={} elapsed_ms={}",
        cases,
        passed,
        failures.len(),
        reported,
        elapsed.as_millis()
    );

    if failures.is_empty() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
