//! Replay a recorded failure artifact as a single-case run.
//!
//! Loads a `.case.json` artifact written by the harness, re-executes
//! exactly that case against the routine it names, and reports the
//! outcome.
//!
//! # Exit Codes
//!
//! - `0`: the replayed case passed
//! - `1`: the replayed case failed again
//! - `2`: invalid arguments, unreadable artifact, or counter error

use std::env;
use std::io;
use std::path::PathBuf;

use movebench::artifact::load_artifact_path;
use movebench::counter::PerfCounter;
use movebench::report::Reporter;

fn print_usage(exe: &std::ffi::OsStr) {
    eprintln!("usage: {} <artifact.case.json>", exe.to_string_lossy());
}

fn main() -> io::Result<()> {
    let mut args = env::args_os();
    let exe = args.next().unwrap_or_else(|| "replay".into());
    let mut path: Option<PathBuf> = None;

    for arg in args {
        if let Some(flag) = arg.to_str() {
            match flag {
                "--help" | "-h" => {
                    print_usage(&exe);
                    std::process::exit(0);
                }
                _ if flag.starts_with("--") => {
                    eprintln!("unknown flag: {}", flag);
                    print_usage(&exe);
                    std::process::exit(2);
                }
                _ => {}
            }
        }
        if path.is_some() {
            print_usage(&exe);
            std::process::exit(2);
        }
        path = Some(PathBuf::from(arg));
    }

    let Some(path) = path else {
        print_usage(&exe);
        std::process::exit(2);
    };

    let artifact = load_artifact_path(&path).unwrap_or_else(|err| {
        eprintln!("cannot load artifact: {err}");
        std::process::exit(2);
    });

    let counter = PerfCounter::enable(false).unwrap_or_else(|err| {
        eprintln!("counter error: {err}");
        std::process::exit(2);
    });

    let outcome = movebench::artifact::replay_artifact(&artifact, &counter).unwrap_or_else(|err| {
        eprintln!("replay failed: {err}");
        std::process::exit(2);
    });

    let stdout = io::stdout();
    let mut reporter = Reporter::new(stdout.lock(), counter.stalls_supported());
    reporter.header()?;
    reporter.case_line(&outcome)?;

    match outcome.failure {
        Some(failure) => {
            reporter.failure_line(&artifact.routine, &failure)?;
            eprintln!("replay: case still fails");
            std::process::exit(1);
        }
        None => {
            eprintln!("replay: case passes");
            Ok(())
        }
    }
}
