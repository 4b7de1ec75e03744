//! Machine functions: the per-function unit the backend compiles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::MachineFrameInfo;

/// Identifier of a machine function within its compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// Attributes attached to a function by the front end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FunctionAttributes {
    /// Keep a dedicated frame pointer even when it could be eliminated.
    #[serde(default)]
    pub no_frame_pointer_elim: bool,
    /// Per-function CPU override (`"target-cpu"`).
    #[serde(default)]
    pub target_cpu: Option<String>,
    /// Per-function feature-string override (`"target-features"`).
    #[serde(default)]
    pub target_features: Option<String>,
    /// Whether the function accepts a variable number of arguments.
    #[serde(default)]
    pub is_vararg: bool,
}

/// A function in its machine-level representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineFunction {
    id: FunctionId,
    name: String,
    attributes: FunctionAttributes,
    frame_info: MachineFrameInfo,
}

impl MachineFunction {
    /// Create a function with default attributes and an empty frame.
    pub fn new(id: FunctionId, name: impl Into<String>) -> Self {
        Self::with_attributes(id, name, FunctionAttributes::default())
    }

    /// Create a function with the given attributes and an empty frame.
    pub fn with_attributes(
        id: FunctionId,
        name: impl Into<String>,
        attributes: FunctionAttributes,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            attributes,
            frame_info: MachineFrameInfo::new(),
        }
    }

    /// Identifier of this function within its unit.
    pub fn id(&self) -> FunctionId {
        self.id
    }

    /// Symbol name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes attached to the function.
    pub fn attributes(&self) -> &FunctionAttributes {
        &self.attributes
    }

    /// Mutable access to the attributes.
    pub fn attributes_mut(&mut self) -> &mut FunctionAttributes {
        &mut self.attributes
    }

    /// The stack-object table.
    pub fn frame_info(&self) -> &MachineFrameInfo {
        &self.frame_info
    }

    /// Mutable access to the stack-object table.
    pub fn frame_info_mut(&mut self) -> &mut MachineFrameInfo {
        &mut self.frame_info
    }

    /// Whether the function asks to keep its frame pointer.
    pub fn disables_frame_pointer_elim(&self) -> bool {
        self.attributes.no_frame_pointer_elim
    }

    /// Whether the function takes a variable argument list.
    pub fn is_vararg(&self) -> bool {
        self.attributes.is_vararg
    }
}
