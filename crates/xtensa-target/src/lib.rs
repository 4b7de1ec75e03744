//! Xtensa target description for the code generator.
//!
//! Turns a target triple, CPU name and feature string into an immutable
//! [`Subtarget`] bundling:
//! - **Instruction info:** register files and addressing limits
//! - **Frame lowering:** stack direction, alignment, frame-pointer policy
//! - **Calling-convention lowering:** CALL0 or windowed argument passing
//!
//! Per-function backend state lives in [`XtensaFunctionInfo`], owned by
//! whoever compiles that function rather than by the subtarget.

pub mod cpu;
pub mod error;
pub mod features;
pub mod frame_lowering;
pub mod function_info;
pub mod identity;
pub mod instr_info;
pub mod lowering;
pub mod machine;
pub mod options;
pub mod registers;
pub mod subtarget;

pub use cpu::Cpu;
pub use error::{Result, TargetError};
pub use features::{Feature, FeatureSet};
pub use frame_lowering::{FrameLowering, FramePointerReason};
pub use function_info::{FunctionInfoMap, XtensaFunctionInfo};
pub use identity::{parse_triple, ResolvedTarget, TargetIdentity};
pub use instr_info::InstrInfo;
pub use lowering::{Abi, ArgLocation, ArgType, TargetLowering};
pub use machine::TargetMachine;
pub use options::TargetOptions;
pub use registers::{Reg, RegClass};
pub use subtarget::Subtarget;
