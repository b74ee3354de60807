//! Read-only roots and native context layout.

use crate::handle::HeapAddr;
use crate::instance_type::ElementsKind;
use crate::object::{FunctionKind, LanguageMode, MIN_CONTEXT_SLOTS};

// =============================================================================
// Read-Only Roots
// =============================================================================

/// Well-known objects created at bootstrap. They never move or die.
#[derive(Debug, Clone)]
pub struct ReadOnlyRoots {
    // Maps of maps and special values.
    pub meta_map: HeapAddr,
    pub undefined_map: HeapAddr,
    pub null_map: HeapAddr,
    pub boolean_map: HeapAddr,
    pub the_hole_map: HeapAddr,
    pub uninitialized_map: HeapAddr,
    pub arguments_marker_map: HeapAddr,
    pub exception_map: HeapAddr,
    pub optimized_out_map: HeapAddr,
    pub stale_register_map: HeapAddr,

    // Special values.
    pub undefined_value: HeapAddr,
    pub null_value: HeapAddr,
    pub true_value: HeapAddr,
    pub false_value: HeapAddr,
    pub the_hole_value: HeapAddr,
    pub uninitialized_value: HeapAddr,
    pub arguments_marker: HeapAddr,
    pub exception: HeapAddr,
    pub optimized_out: HeapAddr,
    pub stale_register: HeapAddr,

    // Primitive and storage maps.
    pub heap_number_map: HeapAddr,
    pub mutable_heap_number_map: HeapAddr,
    pub string_map: HeapAddr,
    pub internalized_string_map: HeapAddr,
    pub fixed_array_map: HeapAddr,
    pub fixed_cow_array_map: HeapAddr,
    pub fixed_double_array_map: HeapAddr,
    pub property_array_map: HeapAddr,

    // Metadata, context and cell maps.
    pub scope_info_map: HeapAddr,
    pub shared_function_info_map: HeapAddr,
    pub script_context_table_map: HeapAddr,
    pub native_context_map: HeapAddr,
    pub function_context_map: HeapAddr,
    pub eval_context_map: HeapAddr,
    pub script_context_map: HeapAddr,
    pub module_map: HeapAddr,
    pub cell_map: HeapAddr,
    pub many_closures_cell_map: HeapAddr,
    pub property_cell_map: HeapAddr,
    pub allocation_site_map: HeapAddr,
    pub code_map: HeapAddr,

    // Empty singletons.
    pub empty_fixed_array: HeapAddr,
    pub empty_scope_info: HeapAddr,

    // Strings.
    pub empty_string: HeapAddr,
    pub length_string: HeapAddr,
    pub undefined_string: HeapAddr,
    pub object_string: HeapAddr,
    pub boolean_string: HeapAddr,
    pub number_string: HeapAddr,
    pub string_string: HeapAddr,
    pub function_string: HeapAddr,

    // Builtin code.
    pub array_prototype_shift_code: HeapAddr,
    pub call_function_forward_varargs_code: HeapAddr,
}

// =============================================================================
// Native Context Slots
// =============================================================================

/// Named slots of the native context, following the common context header.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeContextSlot {
    GlobalProxy,
    ScriptContextTable,
    ArrayFunction,
    SloppyArgumentsMap,
    StrictArgumentsMap,
    FastAliasedArgumentsMap,
    // Initial array maps, in `ElementsKind` order.
    JsArrayPackedSmiElementsMap,
    JsArrayHoleySmiElementsMap,
    JsArrayPackedElementsMap,
    JsArrayHoleyElementsMap,
    JsArrayPackedDoubleElementsMap,
    JsArrayHoleyDoubleElementsMap,
    // Function maps.
    SloppyFunctionMap,
    StrictFunctionMap,
    StrictFunctionWithoutPrototypeMap,
    MethodWithHomeObjectMap,
    ClassFunctionMap,
    GeneratorFunctionMap,
    AsyncFunctionMap,
    IteratorResultMap,
}

impl NativeContextSlot {
    /// Number of named slots.
    pub const COUNT: usize = 20;

    /// Every named slot in index order.
    pub const ALL: [NativeContextSlot; Self::COUNT] = [
        NativeContextSlot::GlobalProxy,
        NativeContextSlot::ScriptContextTable,
        NativeContextSlot::ArrayFunction,
        NativeContextSlot::SloppyArgumentsMap,
        NativeContextSlot::StrictArgumentsMap,
        NativeContextSlot::FastAliasedArgumentsMap,
        NativeContextSlot::JsArrayPackedSmiElementsMap,
        NativeContextSlot::JsArrayHoleySmiElementsMap,
        NativeContextSlot::JsArrayPackedElementsMap,
        NativeContextSlot::JsArrayHoleyElementsMap,
        NativeContextSlot::JsArrayPackedDoubleElementsMap,
        NativeContextSlot::JsArrayHoleyDoubleElementsMap,
        NativeContextSlot::SloppyFunctionMap,
        NativeContextSlot::StrictFunctionMap,
        NativeContextSlot::StrictFunctionWithoutPrototypeMap,
        NativeContextSlot::MethodWithHomeObjectMap,
        NativeContextSlot::ClassFunctionMap,
        NativeContextSlot::GeneratorFunctionMap,
        NativeContextSlot::AsyncFunctionMap,
        NativeContextSlot::IteratorResultMap,
    ];

    /// Total slot count of a native context.
    pub const CONTEXT_LENGTH: usize = MIN_CONTEXT_SLOTS + Self::COUNT;

    /// First function map slot index.
    pub const FIRST_FUNCTION_MAP_INDEX: usize = NativeContextSlot::SloppyFunctionMap.index();

    /// Last function map slot index.
    pub const LAST_FUNCTION_MAP_INDEX: usize = NativeContextSlot::AsyncFunctionMap.index();

    /// Raw context slot index.
    #[inline]
    pub const fn index(self) -> usize {
        MIN_CONTEXT_SLOTS + self as usize
    }

    /// Slot of the initial array map for a fast elements kind.
    pub const fn initial_js_array_map(kind: ElementsKind) -> Option<NativeContextSlot> {
        Some(match kind {
            ElementsKind::PackedSmi => NativeContextSlot::JsArrayPackedSmiElementsMap,
            ElementsKind::HoleySmi => NativeContextSlot::JsArrayHoleySmiElementsMap,
            ElementsKind::Packed => NativeContextSlot::JsArrayPackedElementsMap,
            ElementsKind::Holey => NativeContextSlot::JsArrayHoleyElementsMap,
            ElementsKind::PackedDouble => NativeContextSlot::JsArrayPackedDoubleElementsMap,
            ElementsKind::HoleyDouble => NativeContextSlot::JsArrayHoleyDoubleElementsMap,
            ElementsKind::Dictionary => return None,
        })
    }

    /// Slot of the map used for closures of the given kind.
    pub const fn function_map(kind: FunctionKind, mode: LanguageMode) -> NativeContextSlot {
        match (kind, mode) {
            (FunctionKind::Normal, LanguageMode::Sloppy) => NativeContextSlot::SloppyFunctionMap,
            (FunctionKind::Normal, LanguageMode::Strict) => NativeContextSlot::StrictFunctionMap,
            (FunctionKind::Arrow, _) => NativeContextSlot::StrictFunctionWithoutPrototypeMap,
            (FunctionKind::Method, _) => NativeContextSlot::MethodWithHomeObjectMap,
            (FunctionKind::ClassConstructor, _) => NativeContextSlot::ClassFunctionMap,
            (FunctionKind::Generator, _) => NativeContextSlot::GeneratorFunctionMap,
            (FunctionKind::Async, _) => NativeContextSlot::AsyncFunctionMap,
        }
    }

    /// Check if a raw index addresses a function map slot.
    #[inline]
    pub const fn is_function_map_index(index: usize) -> bool {
        index >= Self::FIRST_FUNCTION_MAP_INDEX && index <= Self::LAST_FUNCTION_MAP_INDEX
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_indices_follow_header() {
        assert_eq!(NativeContextSlot::GlobalProxy.index(), MIN_CONTEXT_SLOTS);
        for (i, slot) in NativeContextSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), MIN_CONTEXT_SLOTS + i);
        }
        assert_eq!(
            NativeContextSlot::CONTEXT_LENGTH,
            NativeContextSlot::IteratorResultMap.index() + 1
        );
    }

    #[test]
    fn test_initial_array_maps_follow_elements_kind_order() {
        for (i, kind) in [
            ElementsKind::PackedSmi,
            ElementsKind::HoleySmi,
            ElementsKind::Packed,
            ElementsKind::Holey,
            ElementsKind::PackedDouble,
            ElementsKind::HoleyDouble,
        ]
        .into_iter()
        .enumerate()
        {
            let slot = NativeContextSlot::initial_js_array_map(kind).unwrap();
            assert_eq!(
                slot.index(),
                NativeContextSlot::JsArrayPackedSmiElementsMap.index() + i
            );
        }
        assert!(NativeContextSlot::initial_js_array_map(ElementsKind::Dictionary).is_none());
    }

    #[test]
    fn test_function_map_range() {
        for kind in [
            FunctionKind::Normal,
            FunctionKind::Arrow,
            FunctionKind::Method,
            FunctionKind::ClassConstructor,
            FunctionKind::Generator,
            FunctionKind::Async,
        ] {
            for mode in [LanguageMode::Sloppy, LanguageMode::Strict] {
                let index = NativeContextSlot::function_map(kind, mode).index();
                assert!(NativeContextSlot::is_function_map_index(index));
            }
        }
        assert!(!NativeContextSlot::is_function_map_index(
            NativeContextSlot::IteratorResultMap.index()
        ));
    }
}
