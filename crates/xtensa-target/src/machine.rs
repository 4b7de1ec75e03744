//! The target machine: module-wide target configuration and the subtarget cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use target_lexicon::Triple;
use xtensa_mir::MachineFunction;

use crate::error::Result;
use crate::function_info::XtensaFunctionInfo;
use crate::identity::{parse_triple, TargetIdentity};
use crate::options::TargetOptions;
use crate::subtarget::Subtarget;

/// Target machine for one compilation: triple, default CPU and features,
/// endianness and shared options.
///
/// Subtargets are created lazily, one per distinct (CPU, features) pair
/// requested by the functions being compiled, and reused afterwards.
#[derive(Debug)]
pub struct TargetMachine {
    triple: Triple,
    cpu: String,
    features: String,
    little_endian: bool,
    options: Arc<TargetOptions>,
    subtargets: Mutex<HashMap<(String, String), Arc<Subtarget>>>,
}

impl TargetMachine {
    /// Create a target machine, validating the triple and options up front.
    pub fn new(
        triple: &str,
        cpu: impl Into<String>,
        features: impl Into<String>,
        options: TargetOptions,
        little_endian: bool,
    ) -> Result<Self> {
        let triple = parse_triple(triple)?;
        options.validate()?;
        Ok(Self {
            triple,
            cpu: cpu.into(),
            features: features.into(),
            little_endian,
            options: Arc::new(options),
            subtargets: Mutex::new(HashMap::new()),
        })
    }

    /// The validated triple.
    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    /// Machine-wide options.
    pub fn options(&self) -> &TargetOptions {
        &self.options
    }

    /// The subtarget for the machine's default CPU and features.
    pub fn default_subtarget(&self) -> Result<Arc<Subtarget>> {
        self.subtarget(&self.cpu, &self.features)
    }

    /// The subtarget for `mf`, honoring its `target-cpu` and
    /// `target-features` attributes.
    pub fn subtarget_for(&self, mf: &MachineFunction) -> Result<Arc<Subtarget>> {
        let attributes = mf.attributes();
        let cpu = attributes.target_cpu.as_deref().unwrap_or(&self.cpu);
        let features = attributes
            .target_features
            .as_deref()
            .unwrap_or(&self.features);
        self.subtarget(cpu, features)
    }

    /// The cached subtarget for `cpu` and `features`, built on first request.
    pub fn subtarget(&self, cpu: &str, features: &str) -> Result<Arc<Subtarget>> {
        let key = (cpu.to_string(), features.to_string());
        let mut cache = self
            .subtargets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(subtarget) = cache.get(&key) {
            return Ok(Arc::clone(subtarget));
        }

        let identity = TargetIdentity::new(self.triple.clone(), cpu, features, self.little_endian);
        let subtarget = Subtarget::new(identity, Arc::clone(&self.options))?;
        cache.insert(key, Arc::clone(&subtarget));
        Ok(subtarget)
    }

    /// Number of distinct subtargets created so far.
    pub fn subtarget_count(&self) -> usize {
        self.subtargets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// A fresh backend record for `mf`.
    pub fn create_function_info(&self, mf: &MachineFunction) -> XtensaFunctionInfo {
        XtensaFunctionInfo::new(mf)
    }
}

#[cfg(test)]
mod tests {
    use xtensa_mir::{FunctionAttributes, FunctionId};

    use super::*;
    use crate::cpu::Cpu;
    use crate::error::TargetError;
    use crate::lowering::{Abi, ArgType};

    fn machine(cpu: &str, options: TargetOptions) -> TargetMachine {
        TargetMachine::new("xtensa-unknown-none-elf", cpu, "", options, true).unwrap()
    }

    #[test]
    fn rejects_foreign_triple() {
        let err = TargetMachine::new(
            "aarch64-unknown-linux-gnu",
            "generic",
            "",
            TargetOptions::default(),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, TargetError::UnsupportedArchitecture { .. }));
    }

    #[test]
    fn endianness_reaches_subtargets() {
        let tm = TargetMachine::new(
            "xtensa-unknown-none-elf",
            "esp32",
            "",
            TargetOptions::default(),
            false,
        )
        .unwrap();
        assert!(!tm.default_subtarget().unwrap().is_little_endian());
        assert!(!tm.subtarget("esp8266", "").unwrap().is_little_endian());
    }

    #[test]
    fn rejects_invalid_options() {
        let options = TargetOptions {
            stack_alignment: Some(24),
            ..TargetOptions::default()
        };
        let err =
            TargetMachine::new("xtensa-unknown-none-elf", "", "", options, true).unwrap_err();
        assert!(matches!(err, TargetError::InvalidOptions { .. }));
    }

    #[test]
    fn subtargets_are_cached_per_key() {
        let tm = machine("esp32", TargetOptions::default());
        let a = tm.default_subtarget().unwrap();
        let b = tm.default_subtarget().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(tm.subtarget_count(), 1);

        let c = tm.subtarget("esp32", "-windowed").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(tm.subtarget_count(), 2);
    }

    #[test]
    fn function_attributes_select_the_subtarget() {
        let tm = machine("esp32", TargetOptions::default());
        let attributes = FunctionAttributes {
            target_cpu: Some("esp8266".into()),
            ..FunctionAttributes::default()
        };
        let mf = MachineFunction::with_attributes(FunctionId(0), "isr", attributes);
        let st = tm.subtarget_for(&mf).unwrap();
        assert_eq!(st.cpu(), Cpu::Esp8266);
        assert_eq!(st.target_lowering().abi(), Abi::Call0);

        let plain = MachineFunction::new(FunctionId(1), "main");
        assert_eq!(tm.subtarget_for(&plain).unwrap().cpu(), Cpu::Esp32);
    }

    #[test]
    fn strict_machine_fails_on_unknown_function_cpu() {
        let options = TargetOptions {
            strict_cpu_resolution: true,
            ..TargetOptions::default()
        };
        let tm = machine("esp32", options);
        let attributes = FunctionAttributes {
            target_cpu: Some("esp31".into()),
            ..FunctionAttributes::default()
        };
        let mf = MachineFunction::with_attributes(FunctionId(0), "f", attributes);
        assert!(matches!(
            tm.subtarget_for(&mf),
            Err(TargetError::UnknownCpu { .. })
        ));
        assert_eq!(tm.subtarget_count(), 0);
    }

    #[test]
    fn options_reach_every_subtarget() {
        let options = TargetOptions {
            fix_global_base_reg: true,
            ..TargetOptions::default()
        };
        let tm = machine("generic", options);
        let st = tm.default_subtarget().unwrap();
        assert!(st.options().fix_global_base_reg);
        assert!(st.instr_info().fixes_global_base_reg());
    }

    #[test]
    fn lowering_a_function_end_to_end() {
        let tm = machine("esp32", TargetOptions::default());
        let attributes = FunctionAttributes {
            is_vararg: true,
            ..FunctionAttributes::default()
        };
        let mut mf = MachineFunction::with_attributes(FunctionId(9), "logf", attributes);
        let st = tm.subtarget_for(&mf).unwrap();
        let mut info = tm.create_function_info(&mf);
        assert_eq!(info.function(), mf.id());

        let lowering = st.target_lowering();
        lowering.lower_formal_arguments(&mut mf, &mut info, &[ArgType::I32, ArgType::I32]);
        assert!(info.has_var_args_area());
        lowering.lower_call(&mut mf, &mut info, &[ArgType::I64; 5]);
        lowering.lower_call(&mut mf, &mut info, &[ArgType::I32]);

        assert_eq!(info.max_call_frame_size(), 16);
        assert!(!st.frame_lowering().has_frame_register(&mf));
    }
}
