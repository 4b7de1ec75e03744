//! Stack objects and the per-function frame table.
//!
//! The frame table is what the backend sees of a function's stack: one entry
//! per local allocation, plus fixed objects placed at known offsets from the
//! incoming stack pointer (stack-passed arguments, variadic save areas).

use serde::{Deserialize, Serialize};

/// Index into a function's stack-object table.
///
/// Fixed objects get negative indices (`-1`, `-2`, ...); ordinary objects
/// count up from zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct FrameIndex(pub i32);

impl FrameIndex {
    /// Whether this index refers to a fixed object.
    pub fn is_fixed(self) -> bool {
        self.0 < 0
    }
}

/// How a stack object is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StackObjectKind {
    /// Placed at `offset` bytes from the incoming stack pointer.
    Fixed { offset: i64 },
    /// Statically sized local.
    Local,
    /// Allocation whose size is only known at run time.
    VariableSized,
}

/// A single entry in the frame table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StackObject {
    /// Size in bytes (0 for variable-sized objects).
    pub size_bytes: u64,
    /// Required alignment in bytes.
    pub alignment_bytes: u64,
    /// Placement.
    pub kind: StackObjectKind,
}

/// The stack-object table of one machine function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MachineFrameInfo {
    objects: Vec<StackObject>,
    fixed_objects: Vec<StackObject>,
    frame_address_taken: bool,
    max_call_frame_size: u64,
}

impl MachineFrameInfo {
    /// Create an empty frame table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a statically sized local.
    pub fn create_stack_object(&mut self, size_bytes: u64, alignment_bytes: u64) -> FrameIndex {
        self.push_object(StackObject {
            size_bytes,
            alignment_bytes: alignment_bytes.max(1),
            kind: StackObjectKind::Local,
        })
    }

    /// Add a dynamically sized allocation.
    pub fn create_variable_sized_object(&mut self, alignment_bytes: u64) -> FrameIndex {
        self.push_object(StackObject {
            size_bytes: 0,
            alignment_bytes: alignment_bytes.max(1),
            kind: StackObjectKind::VariableSized,
        })
    }

    /// Add an object at a fixed offset from the incoming stack pointer.
    ///
    /// The alignment is the largest power of two (capped at 16) dividing `offset`.
    pub fn create_fixed_object(&mut self, size_bytes: u64, offset: i64) -> FrameIndex {
        let alignment_bytes = if offset == 0 {
            16
        } else {
            (1u64 << offset.unsigned_abs().trailing_zeros()).min(16)
        };
        self.fixed_objects.push(StackObject {
            size_bytes,
            alignment_bytes,
            kind: StackObjectKind::Fixed { offset },
        });
        FrameIndex(-(self.fixed_objects.len() as i32))
    }

    fn push_object(&mut self, object: StackObject) -> FrameIndex {
        self.objects.push(object);
        FrameIndex(self.objects.len() as i32 - 1)
    }

    /// Look up an object by index.
    pub fn object(&self, index: FrameIndex) -> Option<&StackObject> {
        if index.is_fixed() {
            let slot = (-index.0 - 1) as usize;
            self.fixed_objects.get(slot)
        } else {
            self.objects.get(index.0 as usize)
        }
    }

    /// All objects with their indices, fixed objects first.
    pub fn objects(&self) -> impl Iterator<Item = (FrameIndex, &StackObject)> {
        let fixed = self
            .fixed_objects
            .iter()
            .enumerate()
            .map(|(i, o)| (FrameIndex(-(i as i32) - 1), o));
        let locals = self
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| (FrameIndex(i as i32), o));
        fixed.chain(locals)
    }

    /// Number of non-fixed objects.
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Number of fixed objects.
    pub fn num_fixed_objects(&self) -> usize {
        self.fixed_objects.len()
    }

    /// Whether any object has a run-time size.
    pub fn has_var_sized_objects(&self) -> bool {
        self.objects
            .iter()
            .any(|o| o.kind == StackObjectKind::VariableSized)
    }

    /// Record that the function takes the address of its own frame.
    pub fn set_frame_address_taken(&mut self, taken: bool) {
        self.frame_address_taken = taken;
    }

    /// Whether the function takes the address of its own frame.
    pub fn is_frame_address_taken(&self) -> bool {
        self.frame_address_taken
    }

    /// Account for a call site that needs `size` bytes of outgoing argument
    /// space below the locals. Only the largest size is kept.
    pub fn adjust_max_call_frame_size(&mut self, size: u64) {
        self.max_call_frame_size = self.max_call_frame_size.max(size);
    }

    /// Largest outgoing argument area of any call in the function.
    pub fn max_call_frame_size(&self) -> u64 {
        self.max_call_frame_size
    }

    /// Largest alignment requested by any object (at least 1).
    pub fn max_alignment(&self) -> u64 {
        self.objects
            .iter()
            .chain(self.fixed_objects.iter())
            .map(|o| o.alignment_bytes)
            .max()
            .unwrap_or(1)
    }

    /// Estimated size of the local area: every statically sized local laid out
    /// in order at its natural alignment, padded to the largest alignment.
    ///
    /// Fixed objects live in the caller's frame and are not counted.
    pub fn estimate_stack_size(&self) -> u64 {
        let mut size: u64 = 0;
        for object in &self.objects {
            if object.kind != StackObjectKind::Local {
                continue;
            }
            size = align_up(size, object.alignment_bytes);
            size += object.size_bytes;
        }
        align_up(size, self.max_alignment())
    }
}

/// Round `value` up to a multiple of `align`. An alignment of 0 leaves the value unchanged.
pub fn align_up(value: u64, align: u64) -> u64 {
    if align == 0 {
        return value;
    }
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_signed_by_kind() {
        let mut frame = MachineFrameInfo::new();
        let local = frame.create_stack_object(4, 4);
        let fixed = frame.create_fixed_object(4, 0);
        let fixed2 = frame.create_fixed_object(8, 8);
        assert_eq!(local, FrameIndex(0));
        assert_eq!(fixed, FrameIndex(-1));
        assert_eq!(fixed2, FrameIndex(-2));
        assert!(fixed.is_fixed());
        assert!(!local.is_fixed());
        assert_eq!(frame.object(fixed2).unwrap().size_bytes, 8);
        assert_eq!(frame.num_objects(), 1);
        assert_eq!(frame.num_fixed_objects(), 2);
        assert_eq!(frame.objects().count(), 3);
    }

    #[test]
    fn unknown_index_is_none() {
        let frame = MachineFrameInfo::new();
        assert!(frame.object(FrameIndex(0)).is_none());
        assert!(frame.object(FrameIndex(-1)).is_none());
    }

    #[test]
    fn estimate_pads_to_alignment() {
        let mut frame = MachineFrameInfo::new();
        frame.create_stack_object(1, 1);
        frame.create_stack_object(4, 4);
        frame.create_stack_object(2, 8);
        // 1 -> pad to 4 -> 8 -> pad to 8 -> 10 -> pad to 8-multiple = 16
        assert_eq!(frame.estimate_stack_size(), 16);
    }

    #[test]
    fn variable_sized_objects_are_flagged() {
        let mut frame = MachineFrameInfo::new();
        frame.create_stack_object(16, 4);
        assert!(!frame.has_var_sized_objects());
        frame.create_variable_sized_object(4);
        assert!(frame.has_var_sized_objects());
        assert_eq!(frame.estimate_stack_size(), 16);
    }

    #[test]
    fn fixed_alignment_follows_offset() {
        let mut frame = MachineFrameInfo::new();
        let a = frame.create_fixed_object(4, 4);
        let b = frame.create_fixed_object(4, 12);
        let c = frame.create_fixed_object(4, 64);
        assert_eq!(frame.object(a).unwrap().alignment_bytes, 4);
        assert_eq!(frame.object(b).unwrap().alignment_bytes, 4);
        assert_eq!(frame.object(c).unwrap().alignment_bytes, 16);
    }

    #[test]
    fn call_frame_size_keeps_the_maximum() {
        let mut frame = MachineFrameInfo::new();
        assert_eq!(frame.max_call_frame_size(), 0);
        frame.adjust_max_call_frame_size(32);
        frame.adjust_max_call_frame_size(16);
        assert_eq!(frame.max_call_frame_size(), 32);
        // Outgoing arguments are not locals.
        assert_eq!(frame.estimate_stack_size(), 0);
    }

    #[test]
    fn align_up_zero_is_identity() {
        assert_eq!(align_up(13, 0), 13);
        assert_eq!(align_up(13, 4), 16);
        assert_eq!(align_up(16, 16), 16);
    }
}
