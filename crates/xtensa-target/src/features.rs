//! Xtensa ISA options and feature-string parsing.
//!
//! Xtensa is a configurable architecture: beyond the core ISA every option
//! (density instructions, register windows, the FPU, ...) may or may not be
//! present. A [`FeatureSet`] records which options a subtarget has.

use std::fmt;

use bitflags::bitflags;

/// A configurable Xtensa ISA option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    /// Code density option (16-bit narrow instructions).
    Density,
    /// Windowed register option (`call4/8/12`, `entry`, `retw`).
    Windowed,
    /// Boolean registers `b0`-`b15`.
    Boolean,
    /// Zero-overhead loop instructions.
    Loop,
    /// `sext` instruction.
    Sext,
    /// Normalization shift amount instructions.
    Nsa,
    /// 16-bit integer multiply.
    Mul16,
    /// 32-bit integer multiply, low word.
    Mul32,
    /// 32-bit integer multiply, high word.
    Mul32High,
    /// 32-bit integer divide and remainder.
    Div32,
    /// 16-bit multiply-accumulate unit.
    Mac16,
    /// Double-precision floating point acceleration.
    DfpAccel,
    /// Single-precision floating point coprocessor, `f0`-`f15`.
    SingleFloat,
    /// `s32c1i` conditional store.
    S32c1i,
    /// Thread pointer special register.
    ThreadPtr,
    /// Extended `l32r` literal addressing.
    ExtendedL32r,
    /// `ATOMCTL` register controlling atomic operation behaviour.
    Atomctl,
    /// `MEMCTL` cache and memory control register.
    Memctl,
    /// Debug option (breakpoints, `break` instructions).
    Debug,
    /// Exception architecture.
    Exception,
    /// High-priority interrupt levels.
    HighPriInterrupts,
    /// Coprocessor context option.
    Coprocessor,
    /// Interrupt option.
    Interrupt,
    /// Relocatable exception vectors.
    RelocatableVector,
    /// Timer interrupts (`CCOMPARE`).
    TimerInt,
    /// Processor ID register.
    Prid,
    /// Region protection memory management.
    RegionProtection,
    /// Miscellaneous special registers `MISC0`-`MISC3`.
    MiscSr,
}

impl Feature {
    /// Every feature, in table order.
    pub const ALL: [Feature; 28] = [
        Feature::Density,
        Feature::Windowed,
        Feature::Boolean,
        Feature::Loop,
        Feature::Sext,
        Feature::Nsa,
        Feature::Mul16,
        Feature::Mul32,
        Feature::Mul32High,
        Feature::Div32,
        Feature::Mac16,
        Feature::DfpAccel,
        Feature::SingleFloat,
        Feature::S32c1i,
        Feature::ThreadPtr,
        Feature::ExtendedL32r,
        Feature::Atomctl,
        Feature::Memctl,
        Feature::Debug,
        Feature::Exception,
        Feature::HighPriInterrupts,
        Feature::Coprocessor,
        Feature::Interrupt,
        Feature::RelocatableVector,
        Feature::TimerInt,
        Feature::Prid,
        Feature::RegionProtection,
        Feature::MiscSr,
    ];

    /// The token used for this feature in feature strings.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Density => "density",
            Feature::Windowed => "windowed",
            Feature::Boolean => "bool",
            Feature::Loop => "loop",
            Feature::Sext => "sext",
            Feature::Nsa => "nsa",
            Feature::Mul16 => "mul16",
            Feature::Mul32 => "mul32",
            Feature::Mul32High => "mul32high",
            Feature::Div32 => "div32",
            Feature::Mac16 => "mac16",
            Feature::DfpAccel => "dfpaccel",
            Feature::SingleFloat => "fp",
            Feature::S32c1i => "s32c1i",
            Feature::ThreadPtr => "threadptr",
            Feature::ExtendedL32r => "extendedl32r",
            Feature::Atomctl => "atomctl",
            Feature::Memctl => "memctl",
            Feature::Debug => "debug",
            Feature::Exception => "exception",
            Feature::HighPriInterrupts => "highpriinterrupts",
            Feature::Coprocessor => "coprocessor",
            Feature::Interrupt => "interrupt",
            Feature::RelocatableVector => "rvector",
            Feature::TimerInt => "timerint",
            Feature::Prid => "prid",
            Feature::RegionProtection => "regprotect",
            Feature::MiscSr => "miscsr",
        }
    }

    /// Look up a feature by its feature-string token.
    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// The single-flag set for this feature.
    pub fn flag(self) -> FeatureSet {
        match self {
            Feature::Density => FeatureSet::DENSITY,
            Feature::Windowed => FeatureSet::WINDOWED,
            Feature::Boolean => FeatureSet::BOOLEAN,
            Feature::Loop => FeatureSet::LOOP,
            Feature::Sext => FeatureSet::SEXT,
            Feature::Nsa => FeatureSet::NSA,
            Feature::Mul16 => FeatureSet::MUL16,
            Feature::Mul32 => FeatureSet::MUL32,
            Feature::Mul32High => FeatureSet::MUL32_HIGH,
            Feature::Div32 => FeatureSet::DIV32,
            Feature::Mac16 => FeatureSet::MAC16,
            Feature::DfpAccel => FeatureSet::DFP_ACCEL,
            Feature::SingleFloat => FeatureSet::SINGLE_FLOAT,
            Feature::S32c1i => FeatureSet::S32C1I,
            Feature::ThreadPtr => FeatureSet::THREAD_PTR,
            Feature::ExtendedL32r => FeatureSet::EXTENDED_L32R,
            Feature::Atomctl => FeatureSet::ATOMCTL,
            Feature::Memctl => FeatureSet::MEMCTL,
            Feature::Debug => FeatureSet::DEBUG,
            Feature::Exception => FeatureSet::EXCEPTION,
            Feature::HighPriInterrupts => FeatureSet::HIGH_PRI_INTERRUPTS,
            Feature::Coprocessor => FeatureSet::COPROCESSOR,
            Feature::Interrupt => FeatureSet::INTERRUPT,
            Feature::RelocatableVector => FeatureSet::RELOCATABLE_VECTOR,
            Feature::TimerInt => FeatureSet::TIMER_INT,
            Feature::Prid => FeatureSet::PRID,
            Feature::RegionProtection => FeatureSet::REGION_PROTECTION,
            Feature::MiscSr => FeatureSet::MISC_SR,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of enabled ISA options, one flag per [`Feature`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeatureSet: u32 {
        const DENSITY             = 1 << 0;
        const WINDOWED            = 1 << 1;
        const BOOLEAN             = 1 << 2;
        const LOOP                = 1 << 3;
        const SEXT                = 1 << 4;
        const NSA                 = 1 << 5;
        const MUL16               = 1 << 6;
        const MUL32               = 1 << 7;
        const MUL32_HIGH          = 1 << 8;
        const DIV32               = 1 << 9;
        const MAC16               = 1 << 10;
        const DFP_ACCEL           = 1 << 11;
        const SINGLE_FLOAT        = 1 << 12;
        const S32C1I              = 1 << 13;
        const THREAD_PTR          = 1 << 14;
        const EXTENDED_L32R       = 1 << 15;
        const ATOMCTL             = 1 << 16;
        const MEMCTL              = 1 << 17;
        const DEBUG               = 1 << 18;
        const EXCEPTION           = 1 << 19;
        const HIGH_PRI_INTERRUPTS = 1 << 20;
        const COPROCESSOR         = 1 << 21;
        const INTERRUPT           = 1 << 22;
        const RELOCATABLE_VECTOR  = 1 << 23;
        const TIMER_INT           = 1 << 24;
        const PRID                = 1 << 25;
        const REGION_PROTECTION   = 1 << 26;
        const MISC_SR             = 1 << 27;
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl FeatureSet {
    /// The set holding exactly `features`.
    pub fn from_features(features: &[Feature]) -> Self {
        features
            .iter()
            .fold(Self::empty(), |set, feature| set | feature.flag())
    }

    /// Whether `feature` is enabled.
    pub fn has(&self, feature: Feature) -> bool {
        self.contains(feature.flag())
    }

    /// Number of enabled features.
    pub fn len(&self) -> usize {
        self.bits().count_ones() as usize
    }

    /// Enabled features in table order.
    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL
            .into_iter()
            .filter(move |f| self.has(*f))
    }

    /// Apply a feature string on top of this set.
    ///
    /// Tokens are comma separated. A leading `+` enables, `-` disables, and a
    /// bare name enables. Empty tokens are skipped. Unrecognized names are
    /// logged, left out of the set, and returned to the caller.
    pub fn apply(&mut self, feature_string: &str) -> Vec<String> {
        let mut ignored = Vec::new();
        for raw in feature_string.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            let (enable, name) = match token.as_bytes()[0] {
                b'+' => (true, &token[1..]),
                b'-' => (false, &token[1..]),
                _ => (true, token),
            };
            match Feature::from_name(name) {
                Some(feature) if enable => self.insert(feature.flag()),
                Some(feature) => self.remove(feature.flag()),
                None => {
                    log::warn!(
                        "'{name}' is not a recognized feature for this target (ignoring feature)"
                    );
                    ignored.push(name.to_string());
                }
            }
        }
        ignored
    }
}

impl fmt::Display for FeatureSet {
    /// Renders as a canonical feature string (`+density,+windowed`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, feature) in self.features().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "+{feature}")?;
        }
        Ok(())
    }
}
