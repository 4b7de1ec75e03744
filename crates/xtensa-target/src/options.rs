//! Target-machine-wide code generation options and their TOML form.
//!
//! Options are shared by every subtarget a target machine creates. They can
//! be built in code or loaded from a `.toml` file:
//!
//! ```toml
//! no-frame-pointer-elim = true
//! fix-global-base-reg = false
//! strict-cpu-resolution = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// Code generation options fixed for the lifetime of a target machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TargetOptions {
    /// Keep a frame pointer in every function.
    pub no_frame_pointer_elim: bool,
    /// Re-materialize the global base register after calls instead of
    /// assuming it survives them.
    pub fix_global_base_reg: bool,
    /// Reject unknown CPU names instead of falling back to `generic`.
    pub strict_cpu_resolution: bool,
    /// Raise the stack alignment above the ABI's 16 bytes. Must be a power of
    /// two; values below the ABI alignment have no effect.
    pub stack_alignment: Option<u64>,
}

impl TargetOptions {
    /// Check the options for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if let Some(align) = self.stack_alignment {
            if !align.is_power_of_two() {
                return Err(TargetError::InvalidOptions {
                    detail: format!("stack-alignment {align} is not a power of two"),
                });
            }
        }
        Ok(())
    }
}

/// Load options from a TOML file.
pub fn load_options_toml(path: &Path) -> Result<TargetOptions> {
    if !path.exists() {
        return Err(TargetError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_options_toml(&content)
}

/// Parse and validate options from a TOML string. Missing keys take their defaults.
pub fn parse_options_toml(toml_str: &str) -> Result<TargetOptions> {
    let options: TargetOptions = toml::from_str(toml_str)?;
    options.validate()?;
    Ok(options)
}

/// Serialize options to pretty TOML.
pub fn options_to_toml(options: &TargetOptions) -> Result<String> {
    let toml_str = toml::to_string_pretty(options)?;
    Ok(toml_str)
}
