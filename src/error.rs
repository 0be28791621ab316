// Error types shared by the table loaders, the sampler and the shower driver

use std::path::PathBuf;
use thiserror::Error;

use crate::process::Process;

#[derive(Error, Debug)]
pub enum ShowerError {
    #[error("Unknown process name: '{0}'")]
    UnknownProcess(String),

    #[error("Unknown target material: '{0}'")]
    UnknownMaterial(String),

    #[error("Species code {0} cannot seed a shower")]
    UnknownSpecies(i32),

    #[error("No cross section table for {process} in material '{material}'")]
    MissingTable { process: Process, material: String },

    #[error("No table file configured for {0}")]
    NoTableSource(Process),

    #[error("No sample ladder loaded for {0}")]
    MissingLadder(Process),

    #[error("Invalid table for {process}: {reason}")]
    InvalidTable { process: String, reason: String },

    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Particle {id} has zero 3-momentum; direction is undefined")]
    DegenerateDirection { id: u128 },

    #[error("No {process} draw accepted at E = {energy} GeV after {evaluations} evaluations")]
    SamplingExhausted {
        process: Process,
        energy: f64,
        evaluations: u64,
    },

    #[error("Particle {0} already has a terminal state")]
    AlreadyEnded(u128),

    #[error("Child id of particle {parent_id} does not fit in 128 bits")]
    IdOverflow { parent_id: u128 },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, ShowerError>;
