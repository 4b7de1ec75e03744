//! Instruction info: what the subtarget's instruction set can express.
//!
//! Built first during subtarget construction. Frame lowering and
//! calling-convention lowering both read register files and addressing
//! limits from here.

use std::fmt;
use std::ops::RangeInclusive;

use crate::features::{Feature, FeatureSet};
use crate::identity::ResolvedTarget;
use crate::registers::{RegClass, Reg, RegisterClass, A0, SP};

/// Largest byte offset reachable by `l32i`/`s32i` (8-bit immediate scaled by 4).
pub const L32I_MAX_OFFSET: u64 = 255 * 4;

/// Target instruction information, queried by later pipeline stages.
///
/// Object-safe so implementations can be stored in `Box<dyn InstrInfo>`.
pub trait InstrInfo: fmt::Debug + Send + Sync {
    /// Register files present on this subtarget.
    fn register_classes(&self) -> &[RegisterClass];

    /// Look up a register file, if the subtarget has it.
    fn register_class(&self, class: RegClass) -> Option<&RegisterClass> {
        self.register_classes().iter().find(|rc| rc.class == class)
    }

    /// Stack pointer register.
    fn stack_pointer(&self) -> Reg;

    /// Register holding the return address after a call.
    fn return_address(&self) -> Reg;

    /// Largest stack-pointer-relative offset a single load/store can address.
    fn max_sp_offset(&self) -> u64;

    /// Whether `offset` from the stack pointer is reachable by one word load/store.
    fn is_legal_sp_offset(&self, offset: u64) -> bool {
        offset <= self.max_sp_offset() && offset % 4 == 0
    }

    /// Immediate range of `addi`.
    fn addi_range(&self) -> RangeInclusive<i64>;

    /// Whether 16-bit narrow encodings are available.
    fn has_narrow_instructions(&self) -> bool;

    /// Whether the global base register must be restored after calls.
    fn fixes_global_base_reg(&self) -> bool;
}

/// Instruction info for the Xtensa core ISA and its configured options.
#[derive(Debug, Clone)]
pub struct XtensaInstrInfo {
    register_classes: Vec<RegisterClass>,
    features: FeatureSet,
    fix_global_base_reg: bool,
}

impl XtensaInstrInfo {
    fn new(resolved: &ResolvedTarget) -> Self {
        let features = resolved.features();
        let mut register_classes = vec![RegisterClass {
            class: RegClass::Ar,
            count: 16,
            width_bits: 32,
        }];
        if features.has(Feature::Boolean) {
            register_classes.push(RegisterClass {
                class: RegClass::Br,
                count: 16,
                width_bits: 1,
            });
        }
        if features.has(Feature::SingleFloat) {
            register_classes.push(RegisterClass {
                class: RegClass::Fpr,
                count: 16,
                width_bits: 32,
            });
        }
        Self {
            register_classes,
            features,
            fix_global_base_reg: resolved.options().fix_global_base_reg,
        }
    }
}

impl InstrInfo for XtensaInstrInfo {
    fn register_classes(&self) -> &[RegisterClass] {
        &self.register_classes
    }

    fn stack_pointer(&self) -> Reg {
        SP
    }

    fn return_address(&self) -> Reg {
        A0
    }

    fn max_sp_offset(&self) -> u64 {
        L32I_MAX_OFFSET
    }

    fn addi_range(&self) -> RangeInclusive<i64> {
        -128..=127
    }

    fn has_narrow_instructions(&self) -> bool {
        self.features.has(Feature::Density)
    }

    fn fixes_global_base_reg(&self) -> bool {
        self.fix_global_base_reg
    }
}

/// Build the instruction info for a resolved target.
pub fn create(resolved: &ResolvedTarget) -> Box<dyn InstrInfo> {
    Box::new(XtensaInstrInfo::new(resolved))
}
