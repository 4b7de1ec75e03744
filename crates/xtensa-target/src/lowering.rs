//! Calling-convention lowering: where arguments live and what calls cost on the stack.
//!
//! Two ABIs exist. CALL0 passes arguments in `a2`-`a7` with a flat register
//! file. The windowed ABI rotates the register window on `call8`, so the
//! caller writes `a10`-`a15` and the callee reads them as `a2`-`a7`.

use std::fmt;

use xtensa_mir::{align_up, FrameIndex, MachineFunction};

use crate::features::Feature;
use crate::frame_lowering::stack_alignment;
use crate::function_info::XtensaFunctionInfo;
use crate::identity::ResolvedTarget;
use crate::instr_info::InstrInfo;
use crate::registers::{RegClass, Reg, RegisterClass, A15, A7};

/// Number of argument words passed in registers.
pub const MAX_ARG_WORDS: u64 = 6;

const WORD_BYTES: u64 = 4;

/// Which calling convention a subtarget uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    /// Flat register file, `call0`/`ret`.
    Call0,
    /// Rotating register windows, `call8`/`entry`/`retw`.
    Windowed,
}

impl Abi {
    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Abi::Call0 => "call0",
            Abi::Windowed => "windowed",
        }
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type of an argument as seen by the calling convention.
///
/// Floating point values travel in address registers like integers of the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// One word.
    I32,
    /// Two words, low word first.
    I64,
    /// One word.
    F32,
    /// Two words, low word first.
    F64,
}

impl ArgType {
    fn words(self) -> u64 {
        match self {
            ArgType::I32 | ArgType::F32 => 1,
            ArgType::I64 | ArgType::F64 => 2,
        }
    }
}

/// Where one argument is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgLocation {
    /// A single register.
    Reg(Reg),
    /// Low word in the first register.
    RegPair(Reg, Reg),
    /// Byte offset from the stack pointer at the call.
    Stack { offset: u64, size_bytes: u64 },
}

/// Result of assigning a whole argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgAssignment {
    pub locations: Vec<ArgLocation>,
    /// Argument registers consumed, in words.
    pub register_words: u64,
    /// Bytes of stack the arguments occupy, before alignment.
    pub stack_bytes: u64,
}

/// Target calling-convention lowering.
///
/// Object-safe so implementations can be stored in `Box<dyn TargetLowering>`.
pub trait TargetLowering: fmt::Debug + Send + Sync {
    /// The calling convention implemented.
    fn abi(&self) -> Abi;

    /// Argument registers as seen by the callee.
    fn arg_registers(&self) -> &[Reg];

    /// Argument registers as written by the caller.
    fn call_arg_registers(&self) -> &[Reg];

    /// Registers carrying return values, as seen by the callee.
    fn return_registers(&self) -> &[Reg];

    /// Address registers a callee must preserve.
    fn callee_saved(&self) -> &[Reg];

    /// Register reserved as frame pointer when a function needs one.
    fn frame_pointer(&self) -> Reg;

    /// Alignment of outgoing argument areas.
    fn stack_alignment(&self) -> u64;

    /// Assign argument locations from the callee's point of view.
    ///
    /// Arguments take consecutive words; two-word values start on an even
    /// word. Once an argument does not fit in the remaining registers, it and
    /// every later argument go on the stack.
    fn assign_arguments(&self, args: &[ArgType]) -> ArgAssignment {
        assign_words(self.arg_registers(), args)
    }

    /// Lower the incoming arguments of `mf`.
    ///
    /// Stack-passed arguments become fixed frame objects. For a variadic
    /// function, the unnamed register arguments get a save area placed just
    /// below the incoming stack arguments, and its index is recorded in `info`.
    fn lower_formal_arguments(
        &self,
        mf: &mut MachineFunction,
        info: &mut XtensaFunctionInfo,
        args: &[ArgType],
    ) -> Vec<ArgLocation> {
        let assignment = self.assign_arguments(args);
        let frame = mf.frame_info_mut();
        for location in &assignment.locations {
            if let ArgLocation::Stack { offset, size_bytes } = *location {
                frame.create_fixed_object(size_bytes, offset as i64);
            }
        }

        if mf.is_vararg() {
            let frame = mf.frame_info_mut();
            let index: FrameIndex = if assignment.register_words < MAX_ARG_WORDS {
                let save_bytes = (MAX_ARG_WORDS - assignment.register_words) * WORD_BYTES;
                frame.create_fixed_object(save_bytes, -(save_bytes as i64))
            } else {
                frame.create_fixed_object(WORD_BYTES, assignment.stack_bytes as i64)
            };
            log::debug!(
                "{}: variadic area at {:?} after {} register words",
                mf.name(),
                index,
                assignment.register_words
            );
            info.set_var_args_frame_index(index);
        }

        assignment.locations
    }

    /// Lower the argument setup of one call site made by `mf`.
    ///
    /// The aligned outgoing stack footprint is reported to `info` and to the
    /// frame table of `mf`, and returned.
    fn lower_call(
        &self,
        mf: &mut MachineFunction,
        info: &mut XtensaFunctionInfo,
        args: &[ArgType],
    ) -> u64 {
        let assignment = assign_words(self.call_arg_registers(), args);
        let size = align_up(assignment.stack_bytes, self.stack_alignment());
        info.observe_call_frame_size(size);
        mf.frame_info_mut().adjust_max_call_frame_size(size);
        size
    }
}

fn assign_words(registers: &[Reg], args: &[ArgType]) -> ArgAssignment {
    let max_words = registers.len() as u64;
    let mut cursor: u64 = 0;
    let mut locations = Vec::with_capacity(args.len());

    for &arg in args {
        let words = arg.words();
        cursor = align_up(cursor, words);
        if cursor < max_words && cursor + words > max_words {
            cursor = max_words;
        }
        let location = if cursor + words <= max_words {
            let first = registers[cursor as usize];
            if words == 1 {
                ArgLocation::Reg(first)
            } else {
                ArgLocation::RegPair(first, registers[cursor as usize + 1])
            }
        } else {
            ArgLocation::Stack {
                offset: (cursor - max_words) * WORD_BYTES,
                size_bytes: words * WORD_BYTES,
            }
        };
        locations.push(location);
        cursor += words;
    }

    ArgAssignment {
        locations,
        register_words: cursor.min(max_words),
        stack_bytes: cursor.saturating_sub(max_words) * WORD_BYTES,
    }
}

fn ar_range(ar: &RegisterClass, first: u8, count: u8) -> Vec<Reg> {
    ar.regs()
        .skip(usize::from(first))
        .take(usize::from(count))
        .collect()
}

/// The CALL0 ABI: flat register file, `a12`-`a15` callee-saved, `a15` as frame pointer.
#[derive(Debug, Clone)]
pub struct Call0Lowering {
    arg_registers: Vec<Reg>,
    return_registers: Vec<Reg>,
    callee_saved: Vec<Reg>,
    stack_alignment: u64,
}

impl TargetLowering for Call0Lowering {
    fn abi(&self) -> Abi {
        Abi::Call0
    }

    fn arg_registers(&self) -> &[Reg] {
        &self.arg_registers
    }

    fn call_arg_registers(&self) -> &[Reg] {
        &self.arg_registers
    }

    fn return_registers(&self) -> &[Reg] {
        &self.return_registers
    }

    fn callee_saved(&self) -> &[Reg] {
        &self.callee_saved
    }

    fn frame_pointer(&self) -> Reg {
        A15
    }

    fn stack_alignment(&self) -> u64 {
        self.stack_alignment
    }
}

/// The windowed ABI with `call8`: the window rotation preserves the
/// caller's registers, `a7` is the frame pointer.
#[derive(Debug, Clone)]
pub struct WindowedLowering {
    arg_registers: Vec<Reg>,
    call_arg_registers: Vec<Reg>,
    return_registers: Vec<Reg>,
    stack_alignment: u64,
}

impl TargetLowering for WindowedLowering {
    fn abi(&self) -> Abi {
        Abi::Windowed
    }

    fn arg_registers(&self) -> &[Reg] {
        &self.arg_registers
    }

    fn call_arg_registers(&self) -> &[Reg] {
        &self.call_arg_registers
    }

    fn return_registers(&self) -> &[Reg] {
        &self.return_registers
    }

    fn callee_saved(&self) -> &[Reg] {
        &[]
    }

    fn frame_pointer(&self) -> Reg {
        A7
    }

    fn stack_alignment(&self) -> u64 {
        self.stack_alignment
    }
}

/// Build the calling-convention lowering for a resolved target.
///
/// The windowed ABI is used whenever the `windowed` option is present.
pub fn create(resolved: &ResolvedTarget, instr_info: &dyn InstrInfo) -> Box<dyn TargetLowering> {
    let ar = instr_info
        .register_class(RegClass::Ar)
        .expect("address register file is always present");
    let stack_alignment = stack_alignment(resolved.options());

    if resolved.features().has(Feature::Windowed) {
        Box::new(WindowedLowering {
            arg_registers: ar_range(ar, 2, 6),
            call_arg_registers: ar_range(ar, 10, 6),
            return_registers: ar_range(ar, 2, 4),
            stack_alignment,
        })
    } else {
        Box::new(Call0Lowering {
            arg_registers: ar_range(ar, 2, 6),
            return_registers: ar_range(ar, 2, 4),
            callee_saved: ar_range(ar, 12, 4),
            stack_alignment,
        })
    }
}
