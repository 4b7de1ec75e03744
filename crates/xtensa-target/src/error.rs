//! Error types for target description operations.

use std::path::PathBuf;

/// Errors that can occur while resolving or configuring a target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The triple string could not be parsed.
    #[error("invalid target triple '{triple}': {reason}")]
    InvalidTriple {
        /// The rejected triple.
        triple: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The triple names an architecture this backend does not handle.
    #[error("unsupported architecture '{arch}' in triple '{triple}'")]
    UnsupportedArchitecture {
        /// The architecture component.
        arch: String,
        /// The full triple.
        triple: String,
    },

    /// The CPU name is not in the processor table (strict resolution only).
    #[error("'{cpu}' is not a recognized Xtensa processor")]
    UnknownCpu {
        /// The rejected CPU name.
        cpu: String,
    },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading or writing an options file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Options file not found.
    #[error("options file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The options are well-formed but inconsistent.
    #[error("invalid target options: {detail}")]
    InvalidOptions {
        /// Description of the problem.
        detail: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
