//! Processor table: known Xtensa cores and their default ISA options.

use crate::features::{Feature, FeatureSet};

use Feature::*;

/// A known Xtensa processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cpu {
    /// Core ISA plus the density option.
    Generic,
    /// Espressif ESP8266 (LX106), CALL0 only.
    Esp8266,
    /// Espressif ESP32 (LX6).
    Esp32,
    /// Espressif ESP32-S2 (LX7, no FPU).
    Esp32S2,
    /// Espressif ESP32-S3 (LX7).
    Esp32S3,
}

const GENERIC_FEATURES: &[Feature] = &[Density];

const ESP8266_FEATURES: &[Feature] = &[
    Density,
    Nsa,
    Mul32,
    ExtendedL32r,
    Debug,
    Exception,
    HighPriInterrupts,
    Interrupt,
    RelocatableVector,
    TimerInt,
    RegionProtection,
    Prid,
];

const ESP32_FEATURES: &[Feature] = &[
    Density,
    SingleFloat,
    Loop,
    Mac16,
    Windowed,
    Boolean,
    Sext,
    Nsa,
    Mul16,
    Mul32,
    Mul32High,
    DfpAccel,
    S32c1i,
    ThreadPtr,
    Div32,
    Atomctl,
    Memctl,
    Debug,
    Exception,
    HighPriInterrupts,
    Coprocessor,
    Interrupt,
    RelocatableVector,
    TimerInt,
    Prid,
    RegionProtection,
    MiscSr,
];

const ESP32S2_FEATURES: &[Feature] = &[
    Density,
    Windowed,
    Sext,
    Nsa,
    Mul16,
    Mul32,
    Mul32High,
    ThreadPtr,
    Div32,
    Memctl,
    Debug,
    Exception,
    HighPriInterrupts,
    Coprocessor,
    Interrupt,
    RelocatableVector,
    TimerInt,
    Prid,
    RegionProtection,
    MiscSr,
];

const ESP32S3_FEATURES: &[Feature] = &[
    Density,
    SingleFloat,
    Loop,
    Mac16,
    Windowed,
    Boolean,
    Sext,
    Nsa,
    Mul16,
    Mul32,
    Mul32High,
    S32c1i,
    ThreadPtr,
    Div32,
    Atomctl,
    Memctl,
    Debug,
    Exception,
    HighPriInterrupts,
    Coprocessor,
    Interrupt,
    RelocatableVector,
    TimerInt,
    Prid,
    RegionProtection,
    MiscSr,
];

impl Cpu {
    /// The processor used when none (or an unknown one) is named.
    pub const DEFAULT: Cpu = Cpu::Generic;

    /// Every known processor.
    pub const ALL: [Cpu; 5] = [
        Cpu::Generic,
        Cpu::Esp8266,
        Cpu::Esp32,
        Cpu::Esp32S2,
        Cpu::Esp32S3,
    ];

    /// The name accepted on the `-mcpu`-style interface.
    pub fn name(self) -> &'static str {
        match self {
            Cpu::Generic => "generic",
            Cpu::Esp8266 => "esp8266",
            Cpu::Esp32 => "esp32",
            Cpu::Esp32S2 => "esp32s2",
            Cpu::Esp32S3 => "esp32s3",
        }
    }

    /// Look up a processor by name. The empty string names the default.
    pub fn from_name(name: &str) -> Option<Cpu> {
        if name.is_empty() {
            return Some(Cpu::DEFAULT);
        }
        Cpu::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// ISA options the processor implements before any feature string is applied.
    pub fn default_features(self) -> FeatureSet {
        let table = match self {
            Cpu::Generic => GENERIC_FEATURES,
            Cpu::Esp8266 => ESP8266_FEATURES,
            Cpu::Esp32 => ESP32_FEATURES,
            Cpu::Esp32S2 => ESP32S2_FEATURES,
            Cpu::Esp32S3 => ESP32S3_FEATURES,
        };
        FeatureSet::from_features(table)
    }
}
