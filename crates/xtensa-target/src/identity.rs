//! Target identity and its resolution into a concrete configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use target_lexicon::{Architecture, Triple};

use crate::cpu::Cpu;
use crate::error::{Result, TargetError};
use crate::features::FeatureSet;
use crate::options::TargetOptions;

/// Parse a triple and check that it names an Xtensa target.
pub fn parse_triple(triple: &str) -> Result<Triple> {
    let parsed = Triple::from_str(triple).map_err(|e| TargetError::InvalidTriple {
        triple: triple.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.architecture != Architecture::XTensa {
        return Err(TargetError::UnsupportedArchitecture {
            arch: parsed.architecture.to_string(),
            triple: triple.to_string(),
        });
    }
    Ok(parsed)
}

/// What a subtarget is built for, exactly as requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetIdentity {
    triple: Triple,
    cpu_name: String,
    feature_string: String,
    little_endian: bool,
}

impl TargetIdentity {
    /// Identity for `triple` with the given CPU and feature string.
    pub fn new(
        triple: Triple,
        cpu_name: impl Into<String>,
        feature_string: impl Into<String>,
        little_endian: bool,
    ) -> Self {
        Self {
            triple,
            cpu_name: cpu_name.into(),
            feature_string: feature_string.into(),
            little_endian,
        }
    }

    /// The target triple.
    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    /// The CPU name as given, before fallback.
    pub fn cpu_name(&self) -> &str {
        &self.cpu_name
    }

    /// The feature string as given.
    pub fn feature_string(&self) -> &str {
        &self.feature_string
    }

    /// Byte order requested.
    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }
}

impl fmt::Display for TargetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cpu={} features=\"{}\" {}",
            self.triple,
            if self.cpu_name.is_empty() {
                Cpu::DEFAULT.name()
            } else {
                self.cpu_name.as_str()
            },
            self.feature_string,
            if self.little_endian { "le" } else { "be" }
        )
    }
}

/// A validated identity: known CPU, final feature set, shared options.
///
/// Every sub-object factory is driven from one of these, so all parts of a
/// subtarget agree on the configuration.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    identity: TargetIdentity,
    cpu: Cpu,
    features: FeatureSet,
    ignored_features: Vec<String>,
    options: Arc<TargetOptions>,
}

impl ResolvedTarget {
    /// Resolve the CPU name and feature string of `identity`.
    ///
    /// An unknown CPU falls back to [`Cpu::DEFAULT`] with a warning, unless
    /// `options.strict_cpu_resolution` is set. Unknown feature tokens are
    /// always warned about and skipped.
    pub fn resolve(identity: TargetIdentity, options: Arc<TargetOptions>) -> Result<Self> {
        let cpu = match Cpu::from_name(identity.cpu_name()) {
            Some(cpu) => cpu,
            None if options.strict_cpu_resolution => {
                return Err(TargetError::UnknownCpu {
                    cpu: identity.cpu_name().to_string(),
                });
            }
            None => {
                log::warn!(
                    "'{}' is not a recognized processor for this target (ignoring processor, using '{}')",
                    identity.cpu_name(),
                    Cpu::DEFAULT.name()
                );
                Cpu::DEFAULT
            }
        };

        let mut features = cpu.default_features();
        let ignored_features = features.apply(identity.feature_string());

        Ok(Self {
            identity,
            cpu,
            features,
            ignored_features,
            options,
        })
    }

    /// The identity as requested.
    pub fn identity(&self) -> &TargetIdentity {
        &self.identity
    }

    /// The CPU actually in effect.
    pub fn cpu(&self) -> Cpu {
        self.cpu
    }

    /// CPU defaults with the feature string applied.
    pub fn features(&self) -> FeatureSet {
        self.features
    }

    /// Feature-string tokens that were not recognized.
    pub fn ignored_features(&self) -> &[String] {
        &self.ignored_features
    }

    /// Options shared with the target machine.
    pub fn options(&self) -> &Arc<TargetOptions> {
        &self.options
    }
}
