//! Xtensa register model.

use std::fmt;

/// Register file a register belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegClass {
    /// Address registers `a0`-`a15`.
    Ar,
    /// Boolean registers `b0`-`b15`.
    Br,
    /// Floating point registers `f0`-`f15`.
    Fpr,
}

impl RegClass {
    fn prefix(self) -> char {
        match self {
            RegClass::Ar => 'a',
            RegClass::Br => 'b',
            RegClass::Fpr => 'f',
        }
    }
}

/// A physical register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg {
    /// Register file.
    pub class: RegClass,
    /// Number within the file.
    pub index: u8,
}

impl Reg {
    /// Address register `a{index}`.
    pub const fn ar(index: u8) -> Self {
        Self {
            class: RegClass::Ar,
            index,
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class.prefix(), self.index)
    }
}

/// Return address.
pub const A0: Reg = Reg::ar(0);
/// Stack pointer.
pub const SP: Reg = Reg::ar(1);
/// Frame pointer under the windowed ABI.
pub const A7: Reg = Reg::ar(7);
/// Frame pointer under CALL0.
pub const A15: Reg = Reg::ar(15);

/// A register file present on a subtarget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterClass {
    /// Which file this is.
    pub class: RegClass,
    /// Number of registers in the file.
    pub count: u8,
    /// Width of each register in bits.
    pub width_bits: u32,
}

impl RegisterClass {
    /// The `index`-th register of this file, if it exists.
    pub fn reg(&self, index: u8) -> Option<Reg> {
        (index < self.count).then_some(Reg {
            class: self.class,
            index,
        })
    }

    /// Every register in the file.
    pub fn regs(&self) -> impl Iterator<Item = Reg> + '_ {
        (0..self.count).map(move |index| Reg {
            class: self.class,
            index,
        })
    }
}
