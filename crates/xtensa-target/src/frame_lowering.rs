//! Frame lowering policy: stack direction, alignment, and the frame-pointer decision.

use std::fmt;
use std::sync::{Arc, Weak};

use xtensa_mir::{align_up, MachineFunction};

use crate::identity::ResolvedTarget;
use crate::options::TargetOptions;
use crate::registers::Reg;
use crate::subtarget::Subtarget;

/// Stack alignment required by both Xtensa ABIs, in bytes.
pub const ABI_STACK_ALIGNMENT: u64 = 16;

/// Effective stack alignment under `options`.
pub fn stack_alignment(options: &TargetOptions) -> u64 {
    options
        .stack_alignment
        .map_or(ABI_STACK_ALIGNMENT, |a| a.max(ABI_STACK_ALIGNMENT))
}

/// Why a function keeps a dedicated frame pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePointerReason {
    /// The function has allocations sized at run time.
    VariableSizedObjects,
    /// The function takes the address of its own frame.
    FrameAddressTaken,
    /// A local needs more alignment than the stack provides.
    StackRealignment,
    /// The function or the target options disable frame pointer elimination.
    EliminationDisabled,
    /// Locals, pushed up by the outgoing call area, lie beyond what one
    /// stack-pointer-relative load can reach.
    FrameTooLarge,
}

/// Stack frame layout policy of a subtarget.
///
/// Object-safe so implementations can be stored in `Box<dyn FrameLowering>`.
pub trait FrameLowering: fmt::Debug + Send + Sync {
    /// Whether pushes move the stack pointer to lower addresses.
    fn stack_grows_downward(&self) -> bool;

    /// Stack alignment at function boundaries, a power of two.
    fn required_alignment(&self) -> u64;

    /// Alignment of the stack around call sequences.
    fn transient_alignment(&self) -> u64;

    /// Offset of the local area from the incoming stack pointer.
    fn local_area_offset(&self) -> i64;

    /// The register used as frame pointer when one is needed.
    fn frame_register(&self) -> Reg;

    /// The first rule that forces a frame pointer for `mf`, if any.
    fn frame_pointer_reason(&self, mf: &MachineFunction) -> Option<FramePointerReason>;

    /// Whether `mf` needs a dedicated frame-pointer register.
    fn has_frame_register(&self, mf: &MachineFunction) -> bool {
        self.frame_pointer_reason(mf).is_some()
    }

    /// Round a frame size up to the required alignment.
    fn align_frame_size(&self, size: u64) -> u64 {
        align_up(size, self.required_alignment())
    }
}

/// Frame lowering for Xtensa.
///
/// Holds a non-owning handle to the subtarget that owns it so it can read
/// sibling state (options, instruction info, ABI registers). The handle is
/// valid for as long as the policy is reachable through its subtarget.
#[derive(Debug)]
pub struct XtensaFrameLowering {
    subtarget: Weak<Subtarget>,
    alignment: u64,
}

impl XtensaFrameLowering {
    fn subtarget(&self) -> Arc<Subtarget> {
        self.subtarget
            .upgrade()
            .expect("frame lowering queried without a live subtarget")
    }
}

impl FrameLowering for XtensaFrameLowering {
    fn stack_grows_downward(&self) -> bool {
        true
    }

    fn required_alignment(&self) -> u64 {
        self.alignment
    }

    fn transient_alignment(&self) -> u64 {
        self.alignment
    }

    fn local_area_offset(&self) -> i64 {
        0
    }

    fn frame_register(&self) -> Reg {
        self.subtarget().target_lowering().frame_pointer()
    }

    fn frame_pointer_reason(&self, mf: &MachineFunction) -> Option<FramePointerReason> {
        let subtarget = self.subtarget();
        let frame = mf.frame_info();

        let reason = if frame.has_var_sized_objects() {
            Some(FramePointerReason::VariableSizedObjects)
        } else if frame.is_frame_address_taken() {
            Some(FramePointerReason::FrameAddressTaken)
        } else if frame.max_alignment() > self.alignment {
            Some(FramePointerReason::StackRealignment)
        } else if mf.disables_frame_pointer_elim() || subtarget.options().no_frame_pointer_elim {
            Some(FramePointerReason::EliminationDisabled)
        } else if self.align_frame_size(frame.estimate_stack_size())
            + self.align_frame_size(frame.max_call_frame_size())
            > subtarget.instr_info().max_sp_offset()
        {
            Some(FramePointerReason::FrameTooLarge)
        } else {
            None
        };

        log::trace!("{}: frame pointer {:?}", mf.name(), reason);
        reason
    }
}

/// Build the frame lowering policy for a subtarget under construction.
///
/// `subtarget` cannot be upgraded until construction finishes; the policy
/// only dereferences it when queried.
pub fn create(subtarget: Weak<Subtarget>, resolved: &ResolvedTarget) -> Box<dyn FrameLowering> {
    Box::new(XtensaFrameLowering {
        subtarget,
        alignment: stack_alignment(resolved.options()),
    })
}

#[cfg(test)]
mod tests {
    use xtensa_mir::FunctionId;

    use super::*;
    use crate::cpu::Cpu;
    use crate::function_info::XtensaFunctionInfo;
    use crate::identity::{parse_triple, TargetIdentity};
    use crate::lowering::ArgType;

    fn subtarget_with(cpu: &str, options: TargetOptions) -> Arc<Subtarget> {
        let identity = TargetIdentity::new(
            parse_triple("xtensa-unknown-none-elf").unwrap(),
            cpu,
            "",
            true,
        );
        Subtarget::new(identity, Arc::new(options)).unwrap()
    }

    fn function() -> MachineFunction {
        MachineFunction::new(FunctionId(0), "f")
    }

    #[test]
    fn leaf_function_needs_no_frame_pointer() {
        let st = subtarget_with("generic", TargetOptions::default());
        let mut mf = function();
        mf.frame_info_mut().create_stack_object(64, 4);
        assert!(!st.frame_lowering().has_frame_register(&mf));
        assert_eq!(st.frame_lowering().frame_pointer_reason(&mf), None);
    }

    #[test]
    fn variable_sized_objects_need_frame_pointer_on_every_cpu() {
        for cpu in Cpu::ALL {
            let st = subtarget_with(cpu.name(), TargetOptions::default());
            let mut mf = function();
            mf.frame_info_mut().create_variable_sized_object(4);
            assert!(st.frame_lowering().has_frame_register(&mf), "{cpu:?}");
            assert_eq!(
                st.frame_lowering().frame_pointer_reason(&mf),
                Some(FramePointerReason::VariableSizedObjects)
            );
        }
    }

    #[test]
    fn function_attribute_disables_elimination() {
        let st = subtarget_with("generic", TargetOptions::default());
        let mut mf = function();
        mf.attributes_mut().no_frame_pointer_elim = true;
        assert_eq!(
            st.frame_lowering().frame_pointer_reason(&mf),
            Some(FramePointerReason::EliminationDisabled)
        );
    }

    #[test]
    fn target_option_disables_elimination() {
        let options = TargetOptions {
            no_frame_pointer_elim: true,
            ..TargetOptions::default()
        };
        let st = subtarget_with("generic", options);
        assert!(st.frame_lowering().has_frame_register(&function()));
    }

    #[test]
    fn frame_address_taken_needs_frame_pointer() {
        let st = subtarget_with("esp32", TargetOptions::default());
        let mut mf = function();
        mf.frame_info_mut().set_frame_address_taken(true);
        assert_eq!(
            st.frame_lowering().frame_pointer_reason(&mf),
            Some(FramePointerReason::FrameAddressTaken)
        );
    }

    #[test]
    fn frames_beyond_l32i_range_need_frame_pointer() {
        let st = subtarget_with("generic", TargetOptions::default());

        let mut fits = function();
        fits.frame_info_mut().create_stack_object(1008, 4);
        assert!(!st.frame_lowering().has_frame_register(&fits));

        // 1020 bytes rounds up to 1024 once aligned.
        let mut too_big = function();
        too_big.frame_info_mut().create_stack_object(1020, 4);
        assert_eq!(
            st.frame_lowering().frame_pointer_reason(&too_big),
            Some(FramePointerReason::FrameTooLarge)
        );
    }

    #[test]
    fn outgoing_call_area_counts_toward_frame_size() {
        let st = subtarget_with("generic", TargetOptions::default());
        let mut mf = function();
        let mut info = XtensaFunctionInfo::new(&mf);
        mf.frame_info_mut().create_stack_object(1008, 4);
        assert!(!st.frame_lowering().has_frame_register(&mf));

        // Six words spill to the stack: 24 bytes, 32 once aligned.
        let outgoing = st
            .target_lowering()
            .lower_call(&mut mf, &mut info, &[ArgType::I32; 12]);
        assert_eq!(outgoing, 32);
        assert_eq!(
            st.frame_lowering().frame_pointer_reason(&mf),
            Some(FramePointerReason::FrameTooLarge)
        );
    }

    #[test]
    #[should_panic(expected = "without a live subtarget")]
    fn dangling_subtarget_handle_panics() {
        let identity = TargetIdentity::new(
            parse_triple("xtensa-unknown-none-elf").unwrap(),
            "generic",
            "",
            true,
        );
        let resolved = ResolvedTarget::resolve(identity, Arc::default()).unwrap();
        let fl = create(Weak::new(), &resolved);
        // Policy constants need no subtarget.
        assert_eq!(fl.required_alignment(), 16);
        fl.has_frame_register(&function());
    }

    #[test]
    fn over_aligned_locals_need_realignment() {
        let st = subtarget_with("generic", TargetOptions::default());
        let mut mf = function();
        mf.frame_info_mut().create_stack_object(32, 32);
        assert_eq!(
            st.frame_lowering().frame_pointer_reason(&mf),
            Some(FramePointerReason::StackRealignment)
        );

        let options = TargetOptions {
            stack_alignment: Some(32),
            ..TargetOptions::default()
        };
        let aligned = subtarget_with("generic", options);
        assert!(!aligned.frame_lowering().has_frame_register(&mf));
        assert_eq!(aligned.frame_lowering().align_frame_size(40), 64);
    }

    #[test]
    fn fixed_policy_values() {
        let st = subtarget_with("esp8266", TargetOptions::default());
        let fl = st.frame_lowering();
        assert!(fl.stack_grows_downward());
        assert_eq!(fl.required_alignment(), 16);
        assert_eq!(fl.transient_alignment(), 16);
        assert_eq!(fl.local_area_offset(), 0);
        assert_eq!(fl.align_frame_size(20), 32);
    }

    #[test]
    fn alignment_override_only_raises() {
        assert_eq!(stack_alignment(&TargetOptions::default()), 16);
        let low = TargetOptions {
            stack_alignment: Some(4),
            ..TargetOptions::default()
        };
        assert_eq!(stack_alignment(&low), 16);
        let high = TargetOptions {
            stack_alignment: Some(64),
            ..TargetOptions::default()
        };
        assert_eq!(stack_alignment(&high), 64);
    }
}
