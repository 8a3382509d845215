//! A recorded failure must round-trip through its JSON artifact and
//! replay to the same outcome.

use tempfile::TempDir;

use movebench::artifact::{load_artifact_path, replay_artifact, write_artifact, MoveReproArtifact};
use movebench::{
    run_case, CaseFailure, MoveCase, MoveFixture, MoveRoutine, PerfCounter, Reference,
};

/// Forward-only copy, broken on overlapping dest-past-src moves.
struct ForwardOnly;

impl MoveRoutine for ForwardOnly {
    fn name(&self) -> &'static str {
        "forward_only"
    }

    fn invoke(&self, buf: &mut [u8], dest: usize, src: usize, len: usize) {
        for i in 0..len {
            buf[dest + i] = buf[src + i];
        }
    }
}

fn record_failure() -> CaseFailure {
    let counter = PerfCounter::enable(false).expect("enable counter");
    let mut fixture = MoveFixture::new(512);
    let case = MoveCase {
        data_len: 256,
        src_offset: 0x21,
        dest_offset: 0x25,
    };
    let outcome = run_case(case, &mut fixture, &counter, &Reference, &ForwardOnly);
    outcome.failure.expect("forward-only must fail scenario C")
}

#[test]
fn failure_artifact_round_trips_through_disk() {
    let failure = record_failure();
    // Replay resolves routines by name, so the artifact names a
    // built-in rather than the test-local broken routine.
    let artifact = MoveReproArtifact::capture(512, "word", &failure);

    let dir = TempDir::new().expect("temp dir");
    let path = write_artifact(dir.path(), &artifact).expect("write artifact");
    assert!(path.ends_with("case-len256-s33-d37.case.json"));

    let loaded = load_artifact_path(&path).expect("load artifact");
    assert_eq!(loaded.case, artifact.case);
    assert_eq!(loaded.failure, failure);
    assert_eq!(loaded.capacity, 512);
}

#[test]
fn replaying_a_correct_routine_passes_the_recorded_case() {
    let failure = record_failure();
    // The failure was recorded against a broken routine; replaying the
    // same case against a correct one passes, which is exactly what a
    // fixed build should show.
    let artifact = MoveReproArtifact::capture(512, "word", &failure);
    let counter = PerfCounter::enable(false).expect("enable counter");
    let outcome = replay_artifact(&artifact, &counter).expect("replay");
    assert!(outcome.passed());
    assert_eq!(outcome.case, failure.case().to_owned());
}

#[test]
fn mismatch_carries_the_first_divergent_index() {
    match record_failure() {
        CaseFailure::Mismatch { index, expected, actual, .. } => {
            // Forward copy first diverges one source-distance into the
            // destination region: dest..dest+dist is correct, then the
            // clobbered bytes repeat.
            assert_eq!(index, 0x25 + 4);
            assert_ne!(expected, actual);
        }
        other => panic!("expected mismatch, got {other}"),
    }
}
