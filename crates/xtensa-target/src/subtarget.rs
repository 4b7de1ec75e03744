//! The subtarget: one immutable bundle of target objects per (triple, CPU, features, endianness).

use std::sync::Arc;

use crate::cpu::Cpu;
use crate::error::Result;
use crate::features::{Feature, FeatureSet};
use crate::frame_lowering::{self, FrameLowering};
use crate::identity::{ResolvedTarget, TargetIdentity};
use crate::instr_info::{self, InstrInfo};
use crate::lowering::{self, TargetLowering};
use crate::options::TargetOptions;

/// Resolved configuration plus the instruction info, frame lowering and
/// calling-convention lowering built from it.
///
/// Only ever handed out as `Arc<Subtarget>`; it has no setters and is safe
/// to share between threads compiling different functions.
#[derive(Debug)]
pub struct Subtarget {
    resolved: ResolvedTarget,
    instr_info: Box<dyn InstrInfo>,
    frame_lowering: Box<dyn FrameLowering>,
    target_lowering: Box<dyn TargetLowering>,
}

impl Subtarget {
    /// Resolve `identity` and build every sub-object.
    ///
    /// Instruction info is built first; frame lowering and calling-convention
    /// lowering are built from the same resolved configuration.
    pub fn new(identity: TargetIdentity, options: Arc<TargetOptions>) -> Result<Arc<Self>> {
        let resolved = ResolvedTarget::resolve(identity, options)?;
        let instr_info = instr_info::create(&resolved);

        let subtarget = Arc::new_cyclic(|this| {
            let frame_lowering = frame_lowering::create(this.clone(), &resolved);
            let target_lowering = lowering::create(&resolved, instr_info.as_ref());
            Subtarget {
                resolved,
                instr_info,
                frame_lowering,
                target_lowering,
            }
        });

        log::debug!(
            "subtarget for {}: cpu={} abi={} features={}",
            subtarget.identity(),
            subtarget.cpu().name(),
            subtarget.target_lowering().abi(),
            subtarget.features()
        );
        Ok(subtarget)
    }

    /// The identity this subtarget was requested with.
    pub fn identity(&self) -> &TargetIdentity {
        self.resolved.identity()
    }

    /// The CPU in effect after fallback.
    pub fn cpu(&self) -> Cpu {
        self.resolved.cpu()
    }

    /// Enabled ISA options.
    pub fn features(&self) -> FeatureSet {
        self.resolved.features()
    }

    /// Whether `feature` is enabled.
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.resolved.features().has(feature)
    }

    /// Options of the owning target machine.
    pub fn options(&self) -> &TargetOptions {
        self.resolved.options()
    }

    /// Register files and addressing limits.
    pub fn instr_info(&self) -> &dyn InstrInfo {
        self.instr_info.as_ref()
    }

    /// Frame layout policy.
    pub fn frame_lowering(&self) -> &dyn FrameLowering {
        self.frame_lowering.as_ref()
    }

    /// Calling-convention lowering.
    pub fn target_lowering(&self) -> &dyn TargetLowering {
        self.target_lowering.as_ref()
    }

    /// Byte order.
    pub fn is_little_endian(&self) -> bool {
        self.identity().is_little_endian()
    }

    /// Whether calls use the windowed ABI.
    pub fn is_windowed_abi(&self) -> bool {
        self.has_feature(Feature::Windowed)
    }

    /// Whether narrow 16-bit encodings are available.
    pub fn has_density(&self) -> bool {
        self.has_feature(Feature::Density)
    }

    /// Whether the single-precision FPU is present.
    pub fn has_single_float(&self) -> bool {
        self.has_feature(Feature::SingleFloat)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use xtensa_mir::{FunctionId, MachineFunction};

    use super::*;
    use crate::identity::parse_triple;
    use crate::lowering::Abi;
    use crate::registers::{RegClass, A15, A7};

    fn subtarget(cpu: &str, features: &str) -> Arc<Subtarget> {
        let _ = env_logger::builder().is_test(true).try_init();
        let identity = TargetIdentity::new(
            parse_triple("xtensa-unknown-none-elf").unwrap(),
            cpu,
            features,
            true,
        );
        Subtarget::new(identity, Arc::default()).unwrap()
    }

    #[test]
    fn generic_little_endian_subtarget() {
        let st = subtarget("generic", "");
        assert!(st.is_little_endian());
        assert!(st.frame_lowering().stack_grows_downward());
        assert_eq!(st.frame_lowering().required_alignment(), 16);
        assert_eq!(st.cpu(), Cpu::Generic);
        assert!(st.has_density());
        assert!(!st.is_windowed_abi());
    }

    #[test]
    fn big_endian_subtarget() {
        let identity = TargetIdentity::new(
            parse_triple("xtensa-unknown-none-elf").unwrap(),
            "esp8266",
            "",
            false,
        );
        let st = Subtarget::new(identity, Arc::default()).unwrap();
        assert!(!st.is_little_endian());
        assert!(st.identity().to_string().ends_with(" be"));
        assert_eq!(st.frame_lowering().required_alignment(), 16);
    }

    #[test]
    fn every_cpu_builds_all_sub_objects() {
        for cpu in Cpu::ALL {
            let st = subtarget(cpu.name(), "");
            assert!(st.instr_info().register_class(RegClass::Ar).is_some());
            assert!(st.frame_lowering().required_alignment().is_power_of_two());
            assert_eq!(st.target_lowering().arg_registers().len(), 6);
        }
    }

    #[test]
    fn sub_objects_agree_on_the_abi() {
        let windowed = subtarget("esp32", "");
        assert_eq!(windowed.target_lowering().abi(), Abi::Windowed);
        assert_eq!(windowed.frame_lowering().frame_register(), A7);
        assert!(windowed.has_single_float());
        assert!(windowed.instr_info().register_class(RegClass::Fpr).is_some());

        let call0 = subtarget("esp32", "-windowed,-fp");
        assert_eq!(call0.target_lowering().abi(), Abi::Call0);
        assert_eq!(call0.frame_lowering().frame_register(), A15);
        assert!(call0.instr_info().register_class(RegClass::Fpr).is_none());
    }

    #[test]
    fn identical_inputs_give_identical_frame_policy() {
        let a = subtarget("esp32s3", "+mul16");
        let b = subtarget("esp32s3", "+mul16");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(
            a.frame_lowering().stack_grows_downward(),
            b.frame_lowering().stack_grows_downward()
        );
        assert_eq!(
            a.frame_lowering().required_alignment(),
            b.frame_lowering().required_alignment()
        );
        assert_eq!(a.features(), b.features());
    }

    #[test]
    fn unknown_cpu_still_builds() {
        let st = subtarget("xtensa-lx9000", "+bogus");
        assert_eq!(st.cpu(), Cpu::Generic);
        assert_eq!(st.identity().cpu_name(), "xtensa-lx9000");
    }

    #[test]
    fn shared_across_threads() {
        let st = subtarget("esp32", "");
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let st = Arc::clone(&st);
                thread::spawn(move || {
                    let mut mf = MachineFunction::new(FunctionId(i), format!("f{i}"));
                    if i % 2 == 0 {
                        mf.frame_info_mut().create_variable_sized_object(4);
                    }
                    st.frame_lowering().has_frame_register(&mf)
                })
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![true, false, true, false]);
    }
}
