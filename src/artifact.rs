//! Reproducible artifact schema for recorded failures.
//!
//! Each failing case can be serialized to a self-contained JSON file and
//! re-executed later as a single-case run. Determinism-critical inputs
//! (capacity, routine name, the case itself) sit alongside diagnostic
//! metadata (crate version, target triple) that does not affect replay.
//! The schema is versioned for forward-compatible evolution.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::counter::PerfCounter;
use crate::fixture::MoveFixture;
use crate::routine::{candidate_by_name, Reference};
use crate::sweep::{run_case, CaseFailure, CaseOutcome, MoveCase};

/// Artifact schema version, bumped on any layout change.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Self-contained reproduction artifact for one recorded failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveReproArtifact {
    pub schema_version: u32,

    /// Version stamp for diagnostics (not determinism-critical).
    pub harness_pkg_version: String,
    /// Build target triple (diagnostics only).
    pub target: String,

    /// Replay keys.
    pub capacity: usize,
    pub routine: String,
    pub case: MoveCase,

    /// The failure as recorded by the original run.
    pub failure: CaseFailure,
}

impl MoveReproArtifact {
    /// Capture a recorded failure for the named candidate routine.
    pub fn capture(capacity: usize, routine: &str, failure: &CaseFailure) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            harness_pkg_version: env!("CARGO_PKG_VERSION").to_string(),
            target: target_triple(),
            capacity,
            routine: routine.to_string(),
            case: *failure.case(),
            failure: failure.clone(),
        }
    }

    /// Stable file name: `case-len{L}-s{S}-d{D}.case.json`.
    pub fn file_name(&self) -> String {
        format!(
            "case-len{}-s{}-d{}.case.json",
            self.case.data_len, self.case.src_offset, self.case.dest_offset
        )
    }
}

fn target_triple() -> String {
    format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
}

/// Errors returned while loading or replaying artifacts.
#[derive(Debug)]
pub enum ReplayError {
    Io(io::Error),
    Json(serde_json::Error),
    /// The artifact names a routine this build does not know.
    UnknownRoutine(String),
    /// The artifact was written by an incompatible schema.
    SchemaVersion(u32),
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "replay I/O error: {err}"),
            Self::Json(err) => write!(f, "replay JSON error: {err}"),
            Self::UnknownRoutine(name) => write!(f, "unknown routine in artifact: {name}"),
            Self::SchemaVersion(v) => write!(
                f,
                "unsupported artifact schema version {v} (expected {ARTIFACT_SCHEMA_VERSION})"
            ),
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<io::Error> for ReplayError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Serialize an artifact into `dir`, returning the written path.
pub fn write_artifact(dir: &Path, artifact: &MoveReproArtifact) -> Result<PathBuf, ReplayError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(artifact.file_name());
    let json = serde_json::to_vec_pretty(artifact)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Load an artifact from JSON bytes, rejecting incompatible schemas.
pub fn load_artifact(bytes: &[u8]) -> Result<MoveReproArtifact, ReplayError> {
    let artifact: MoveReproArtifact = serde_json::from_slice(bytes)?;
    if artifact.schema_version != ARTIFACT_SCHEMA_VERSION {
        return Err(ReplayError::SchemaVersion(artifact.schema_version));
    }
    Ok(artifact)
}

/// Load an artifact from disk.
pub fn load_artifact_path(path: &Path) -> Result<MoveReproArtifact, ReplayError> {
    let bytes = fs::read(path)?;
    load_artifact(&bytes)
}

/// Re-run exactly the artifact's case against its routine.
///
/// Uses the capacity and routine name embedded in the artifact so the
/// replayed case matches the original failing configuration.
pub fn replay_artifact(
    artifact: &MoveReproArtifact,
    counter: &PerfCounter,
) -> Result<CaseOutcome, ReplayError> {
    let candidate = candidate_by_name(&artifact.routine)
        .ok_or_else(|| ReplayError::UnknownRoutine(artifact.routine.clone()))?;
    let mut fixture = MoveFixture::new(artifact.capacity);
    Ok(run_case(
        artifact.case,
        &mut fixture,
        counter,
        &Reference,
        candidate.as_ref(),
    ))
}
