//! Engine-level failures: the second of the two failure classes the
//! simulation distinguishes. Instruction-level failures never reach here —
//! they're accounted for in-band via `Organism::errors` and never
//! propagate as a `Result`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FungeraError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("corrupt snapshot: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("malformed genome: {reason}")]
    MalformedGenome { reason: String },
}
