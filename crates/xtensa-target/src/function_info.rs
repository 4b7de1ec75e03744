//! Xtensa-private per-function state.

use std::collections::HashMap;

use xtensa_mir::{FrameIndex, FunctionId, MachineFunction};

/// Backend state for one machine function that the machine-level
/// representation has no place for.
///
/// Owned by whoever compiles the function; mutated only through `&mut`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XtensaFunctionInfo {
    function: FunctionId,
    /// Frame index of the start of the variadic save area. `FrameIndex(0)` means unset.
    var_args_frame_index: FrameIndex,
    max_call_frame_size: u64,
}

impl XtensaFunctionInfo {
    /// Sentinel for "no variadic area".
    pub const NO_VAR_ARGS: FrameIndex = FrameIndex(0);

    /// An empty record for `mf`.
    pub fn new(mf: &MachineFunction) -> Self {
        Self {
            function: mf.id(),
            var_args_frame_index: Self::NO_VAR_ARGS,
            max_call_frame_size: 0,
        }
    }

    /// The function this record belongs to.
    pub fn function(&self) -> FunctionId {
        self.function
    }

    /// Start of the variadic save area, or [`Self::NO_VAR_ARGS`].
    pub fn var_args_frame_index(&self) -> FrameIndex {
        self.var_args_frame_index
    }

    /// Whether a variadic save area was recorded.
    pub fn has_var_args_area(&self) -> bool {
        self.var_args_frame_index != Self::NO_VAR_ARGS
    }

    /// Record the variadic save area.
    ///
    /// # Panics
    ///
    /// If the area was already recorded.
    pub fn set_var_args_frame_index(&mut self, index: FrameIndex) {
        assert!(
            !self.has_var_args_area(),
            "variadic area of {} already set to {:?}, refusing {:?}",
            self.function,
            self.var_args_frame_index,
            index
        );
        self.var_args_frame_index = index;
    }

    /// Account for a call site needing `size` bytes of outgoing stack.
    pub fn observe_call_frame_size(&mut self, size: u64) {
        self.max_call_frame_size = self.max_call_frame_size.max(size);
    }

    /// Largest outgoing call footprint seen so far.
    pub fn max_call_frame_size(&self) -> u64 {
        self.max_call_frame_size
    }
}

/// Function records of one compilation unit, keyed by function.
#[derive(Debug, Default)]
pub struct FunctionInfoMap {
    infos: HashMap<FunctionId, XtensaFunctionInfo>,
}

impl FunctionInfoMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The record of `mf`, created on first use.
    pub fn get_or_create(&mut self, mf: &MachineFunction) -> &mut XtensaFunctionInfo {
        self.infos
            .entry(mf.id())
            .or_insert_with(|| XtensaFunctionInfo::new(mf))
    }

    /// The record of `function`, if one was created.
    pub fn get(&self, function: FunctionId) -> Option<&XtensaFunctionInfo> {
        self.infos.get(&function)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no record was created yet.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}
