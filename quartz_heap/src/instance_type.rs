//! Instance types and elements kinds.
//!
//! Every map records the instance type of the objects it describes. The set of
//! instance types is closed: the compiler and the broker match on it
//! exhaustively.

use std::fmt;

// =============================================================================
// Instance Type
// =============================================================================

/// Structural family of a heap object.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    /// A map (hidden class) describing other objects.
    Map,
    /// A special value: undefined, null, booleans, holes and internal markers.
    Oddball,
    /// Immutable boxed double.
    HeapNumber,
    /// Mutable boxed double used for out-of-object double fields.
    MutableHeapNumber,
    /// Sequential string.
    String,
    /// Internalized (unique) string.
    InternalizedString,
    /// Array of tagged values.
    FixedArray,
    /// Array of unboxed doubles.
    FixedDoubleArray,
    /// Out-of-object property storage of a JS object.
    PropertyArray,
    /// Ordinary JS object.
    JsObject,
    /// JS array.
    JsArray,
    /// JS function (closure).
    JsFunction,
    /// Global proxy object.
    JsGlobalProxy,
    /// Function or eval context.
    Context,
    /// Global (native) context.
    NativeContext,
    /// Table of script contexts.
    ScriptContextTable,
    /// Scope metadata for contexts.
    ScopeInfo,
    /// Shared function metadata.
    SharedFunctionInfo,
    /// Module record.
    Module,
    /// Single-value cell.
    Cell,
    /// Property cell for global properties.
    PropertyCell,
    /// Allocation-site feedback for literals.
    AllocationSite,
    /// Code object.
    Code,
}

impl InstanceType {
    /// Map instance type.
    #[inline]
    pub const fn is_map(self) -> bool {
        matches!(self, InstanceType::Map)
    }

    /// Special value.
    #[inline]
    pub const fn is_oddball(self) -> bool {
        matches!(self, InstanceType::Oddball)
    }

    /// Any string.
    #[inline]
    pub const fn is_string(self) -> bool {
        matches!(self, InstanceType::String | InstanceType::InternalizedString)
    }

    /// Property key. Quartz has no symbols, so every name is a string.
    #[inline]
    pub const fn is_name(self) -> bool {
        self.is_string()
    }

    /// Internalized string.
    #[inline]
    pub const fn is_internalized_string(self) -> bool {
        matches!(self, InstanceType::InternalizedString)
    }

    /// Immutable boxed number.
    #[inline]
    pub const fn is_heap_number(self) -> bool {
        matches!(self, InstanceType::HeapNumber)
    }

    /// Mutable boxed number.
    #[inline]
    pub const fn is_mutable_heap_number(self) -> bool {
        matches!(self, InstanceType::MutableHeapNumber)
    }

    /// Any array-like backing storage.
    #[inline]
    pub const fn is_fixed_array_base(self) -> bool {
        matches!(
            self,
            InstanceType::FixedArray | InstanceType::FixedDoubleArray | InstanceType::PropertyArray
        )
    }

    /// Tagged backing storage.
    #[inline]
    pub const fn is_fixed_array(self) -> bool {
        matches!(self, InstanceType::FixedArray | InstanceType::PropertyArray)
    }

    /// Double backing storage.
    #[inline]
    pub const fn is_fixed_double_array(self) -> bool {
        matches!(self, InstanceType::FixedDoubleArray)
    }

    /// Any object with named properties and elements.
    #[inline]
    pub const fn is_js_object(self) -> bool {
        matches!(
            self,
            InstanceType::JsObject
                | InstanceType::JsArray
                | InstanceType::JsFunction
                | InstanceType::JsGlobalProxy
        )
    }

    /// JS array.
    #[inline]
    pub const fn is_js_array(self) -> bool {
        matches!(self, InstanceType::JsArray)
    }

    /// JS function.
    #[inline]
    pub const fn is_js_function(self) -> bool {
        matches!(self, InstanceType::JsFunction)
    }

    /// Global proxy.
    #[inline]
    pub const fn is_js_global_proxy(self) -> bool {
        matches!(self, InstanceType::JsGlobalProxy)
    }

    /// Any context, native or not.
    #[inline]
    pub const fn is_context(self) -> bool {
        matches!(self, InstanceType::Context | InstanceType::NativeContext)
    }

    /// Native context.
    #[inline]
    pub const fn is_native_context(self) -> bool {
        matches!(self, InstanceType::NativeContext)
    }

    /// Script context table.
    #[inline]
    pub const fn is_script_context_table(self) -> bool {
        matches!(self, InstanceType::ScriptContextTable)
    }

    /// Scope info.
    #[inline]
    pub const fn is_scope_info(self) -> bool {
        matches!(self, InstanceType::ScopeInfo)
    }

    /// Shared function info.
    #[inline]
    pub const fn is_shared_function_info(self) -> bool {
        matches!(self, InstanceType::SharedFunctionInfo)
    }

    /// Module.
    #[inline]
    pub const fn is_module(self) -> bool {
        matches!(self, InstanceType::Module)
    }

    /// Cell.
    #[inline]
    pub const fn is_cell(self) -> bool {
        matches!(self, InstanceType::Cell)
    }

    /// Property cell.
    #[inline]
    pub const fn is_property_cell(self) -> bool {
        matches!(self, InstanceType::PropertyCell)
    }

    /// Allocation site.
    #[inline]
    pub const fn is_allocation_site(self) -> bool {
        matches!(self, InstanceType::AllocationSite)
    }

    /// Code.
    #[inline]
    pub const fn is_code(self) -> bool {
        matches!(self, InstanceType::Code)
    }

    /// Upper-case name used in short descriptions.
    pub const fn name(self) -> &'static str {
        match self {
            InstanceType::Map => "MAP_TYPE",
            InstanceType::Oddball => "ODDBALL_TYPE",
            InstanceType::HeapNumber => "HEAP_NUMBER_TYPE",
            InstanceType::MutableHeapNumber => "MUTABLE_HEAP_NUMBER_TYPE",
            InstanceType::String => "STRING_TYPE",
            InstanceType::InternalizedString => "INTERNALIZED_STRING_TYPE",
            InstanceType::FixedArray => "FIXED_ARRAY_TYPE",
            InstanceType::FixedDoubleArray => "FIXED_DOUBLE_ARRAY_TYPE",
            InstanceType::PropertyArray => "PROPERTY_ARRAY_TYPE",
            InstanceType::JsObject => "JS_OBJECT_TYPE",
            InstanceType::JsArray => "JS_ARRAY_TYPE",
            InstanceType::JsFunction => "JS_FUNCTION_TYPE",
            InstanceType::JsGlobalProxy => "JS_GLOBAL_PROXY_TYPE",
            InstanceType::Context => "CONTEXT_TYPE",
            InstanceType::NativeContext => "NATIVE_CONTEXT_TYPE",
            InstanceType::ScriptContextTable => "SCRIPT_CONTEXT_TABLE_TYPE",
            InstanceType::ScopeInfo => "SCOPE_INFO_TYPE",
            InstanceType::SharedFunctionInfo => "SHARED_FUNCTION_INFO_TYPE",
            InstanceType::Module => "MODULE_TYPE",
            InstanceType::Cell => "CELL_TYPE",
            InstanceType::PropertyCell => "PROPERTY_CELL_TYPE",
            InstanceType::AllocationSite => "ALLOCATION_SITE_TYPE",
            InstanceType::Code => "CODE_TYPE",
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Elements Kind
// =============================================================================

/// Representation of a JS object's indexed backing storage.
///
/// The order matters: the `Packed*`/`Holey*` kinds in declaration order index
/// the initial array maps stored in the native context.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementsKind {
    /// Small integers only, no holes.
    PackedSmi = 0,
    /// Small integers with holes.
    HoleySmi = 1,
    /// Arbitrary tagged values, no holes.
    Packed = 2,
    /// Arbitrary tagged values with holes.
    Holey = 3,
    /// Unboxed doubles, no holes.
    PackedDouble = 4,
    /// Unboxed doubles with holes.
    HoleyDouble = 5,
    /// Hash-table backed storage.
    Dictionary = 6,
}

impl ElementsKind {
    /// Number of fast (non-dictionary) kinds.
    pub const FAST_KIND_COUNT: usize = 6;

    /// Tagged storage holding Smis or arbitrary objects.
    #[inline]
    pub const fn is_smi_or_object(self) -> bool {
        matches!(
            self,
            ElementsKind::PackedSmi
                | ElementsKind::HoleySmi
                | ElementsKind::Packed
                | ElementsKind::Holey
        )
    }

    /// Unboxed double storage.
    #[inline]
    pub const fn is_double(self) -> bool {
        matches!(self, ElementsKind::PackedDouble | ElementsKind::HoleyDouble)
    }

    /// Storage may contain holes.
    #[inline]
    pub const fn is_holey(self) -> bool {
        matches!(
            self,
            ElementsKind::HoleySmi | ElementsKind::Holey | ElementsKind::HoleyDouble
        )
    }

    /// Position among the fast kinds, `None` for dictionary storage.
    #[inline]
    pub const fn fast_index(self) -> Option<usize> {
        match self {
            ElementsKind::Dictionary => None,
            kind => Some(kind as usize),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_object_family() {
        for ty in [
            InstanceType::JsObject,
            InstanceType::JsArray,
            InstanceType::JsFunction,
            InstanceType::JsGlobalProxy,
        ] {
            assert!(ty.is_js_object(), "{ty} should be a JS object");
        }
        assert!(!InstanceType::Map.is_js_object());
        assert!(!InstanceType::Context.is_js_object());
    }

    #[test]
    fn test_context_family() {
        assert!(InstanceType::Context.is_context());
        assert!(InstanceType::NativeContext.is_context());
        assert!(InstanceType::NativeContext.is_native_context());
        assert!(!InstanceType::Context.is_native_context());
    }

    #[test]
    fn test_storage_family() {
        assert!(InstanceType::FixedArray.is_fixed_array_base());
        assert!(InstanceType::PropertyArray.is_fixed_array());
        assert!(InstanceType::FixedDoubleArray.is_fixed_array_base());
        assert!(!InstanceType::FixedDoubleArray.is_fixed_array());
    }

    #[test]
    fn test_elements_kind_classes() {
        assert!(ElementsKind::PackedSmi.is_smi_or_object());
        assert!(ElementsKind::Holey.is_holey());
        assert!(ElementsKind::HoleyDouble.is_double());
        assert!(!ElementsKind::Dictionary.is_smi_or_object());
        assert!(!ElementsKind::Dictionary.is_double());
    }

    #[test]
    fn test_elements_kind_fast_index() {
        assert_eq!(ElementsKind::PackedSmi.fast_index(), Some(0));
        assert_eq!(ElementsKind::HoleyDouble.fast_index(), Some(5));
        assert_eq!(ElementsKind::Dictionary.fast_index(), None);
    }
}
