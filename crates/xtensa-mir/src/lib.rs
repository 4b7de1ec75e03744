//! Machine-level function representation consumed by the Xtensa backend.
//!
//! This crate holds only what target description code needs to see of a
//! function: its identity, its front-end attributes, and its stack-object table.

pub mod frame;
pub mod function;

pub use frame::{align_up, FrameIndex, MachineFrameInfo, StackObject, StackObjectKind};
pub use function::{FunctionAttributes, FunctionId, MachineFunction};
