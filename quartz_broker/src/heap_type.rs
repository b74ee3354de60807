//! Coarse classification of heap objects, derived from their map.

use bitflags::bitflags;
use quartz_heap::{HeapAddr, InstanceType, Map, MapFlags, ReadOnlyRoots};

/// Which special value an object is, as far as the compiler cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OddballType {
    /// Not an oddball.
    None,
    /// `true` or `false`.
    Boolean,
    Undefined,
    Null,
    /// The hole marker.
    Hole,
    /// The uninitialized marker.
    Uninitialized,
    /// Any other internal marker.
    Other,
}

bitflags! {
    /// Map properties the compiler tests without reading the full map.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HeapObjectTypeFlags: u8 {
        /// Behaves like `undefined` under `typeof` and in boolean context.
        const UNDETECTABLE = 1 << 0;
        /// Callable.
        const CALLABLE = 1 << 1;
    }
}

/// Instance type, oddball classification and flags of a heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapObjectType {
    instance_type: InstanceType,
    flags: HeapObjectTypeFlags,
    oddball_type: OddballType,
}

impl HeapObjectType {
    pub fn new(
        instance_type: InstanceType,
        flags: HeapObjectTypeFlags,
        oddball_type: OddballType,
    ) -> Self {
        debug_assert!(
            (oddball_type == OddballType::None) != instance_type.is_oddball(),
            "oddball classification disagrees with instance type {instance_type}"
        );
        Self { instance_type, flags, oddball_type }
    }

    /// Classify objects described by `map`, found at `map_addr`.
    ///
    /// Oddballs are told apart by map identity, so `true` and `false` (which
    /// share a map) are both [`OddballType::Boolean`].
    pub fn from_map(roots: &ReadOnlyRoots, map_addr: HeapAddr, map: &Map) -> Self {
        let instance_type = map.instance_type();
        let oddball_type = if !instance_type.is_oddball() {
            OddballType::None
        } else if map_addr == roots.undefined_map {
            OddballType::Undefined
        } else if map_addr == roots.null_map {
            OddballType::Null
        } else if map_addr == roots.boolean_map {
            OddballType::Boolean
        } else if map_addr == roots.the_hole_map {
            OddballType::Hole
        } else if map_addr == roots.uninitialized_map {
            OddballType::Uninitialized
        } else {
            OddballType::Other
        };

        let mut flags = HeapObjectTypeFlags::empty();
        if map.has(MapFlags::UNDETECTABLE) {
            flags |= HeapObjectTypeFlags::UNDETECTABLE;
        }
        if map.has(MapFlags::CALLABLE) {
            flags |= HeapObjectTypeFlags::CALLABLE;
        }

        Self::new(instance_type, flags, oddball_type)
    }

    #[inline]
    pub fn instance_type(&self) -> InstanceType {
        self.instance_type
    }

    #[inline]
    pub fn flags(&self) -> HeapObjectTypeFlags {
        self.flags
    }

    #[inline]
    pub fn oddball_type(&self) -> OddballType {
        self.oddball_type
    }

    #[inline]
    pub fn is_undetectable(&self) -> bool {
        self.flags.contains(HeapObjectTypeFlags::UNDETECTABLE)
    }

    #[inline]
    pub fn is_callable(&self) -> bool {
        self.flags.contains(HeapObjectTypeFlags::CALLABLE)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_heap::{Heap, NativeContextSlot, Tagged};

    fn classify(heap: &Heap, object: HeapAddr) -> HeapObjectType {
        let map_addr = heap.map_of(object).unwrap();
        let map = heap.map(map_addr).unwrap();
        HeapObjectType::from_map(heap.roots(), map_addr, &map)
    }

    #[test]
    fn test_oddballs_classified_by_map() {
        let heap = Heap::new();
        let roots = heap.roots().clone();
        assert_eq!(classify(&heap, roots.undefined_value).oddball_type(), OddballType::Undefined);
        assert_eq!(classify(&heap, roots.null_value).oddball_type(), OddballType::Null);
        assert_eq!(classify(&heap, roots.true_value).oddball_type(), OddballType::Boolean);
        assert_eq!(classify(&heap, roots.false_value).oddball_type(), OddballType::Boolean);
        assert_eq!(classify(&heap, roots.the_hole_value).oddball_type(), OddballType::Hole);
        assert_eq!(
            classify(&heap, roots.uninitialized_value).oddball_type(),
            OddballType::Uninitialized
        );
        assert_eq!(classify(&heap, roots.exception).oddball_type(), OddballType::Other);
    }

    #[test]
    fn test_undetectable_and_callable_flags() {
        let heap = Heap::new();
        let roots = heap.roots().clone();

        let undefined = classify(&heap, roots.undefined_value);
        assert!(undefined.is_undetectable());
        assert!(!undefined.is_callable());

        let array_function = heap
            .native_context_slot(NativeContextSlot::ArrayFunction)
            .and_then(Tagged::as_heap)
            .unwrap();
        let function = classify(&heap, array_function);
        assert!(function.is_callable());
        assert_eq!(function.instance_type(), InstanceType::JsFunction);
        assert_eq!(function.oddball_type(), OddballType::None);
    }

    #[test]
    fn test_plain_string_is_not_oddball() {
        let heap = Heap::new();
        let s = heap.new_string("abc");
        let ty = classify(&heap, s);
        assert_eq!(ty.instance_type(), InstanceType::String);
        assert_eq!(ty.oddball_type(), OddballType::None);
        assert!(ty.flags().is_empty());
    }
}
