//! Heap object bodies.
//!
//! A heap object is a map pointer, a generation and a body. The body variant
//! is fixed by the instance type of the map; the typed getters on
//! [`Heap`](crate::Heap) check that pairing and return `None` on mismatch.

use std::sync::Arc;

use crate::handle::{HeapAddr, Tagged};
use crate::instance_type::ElementsKind;
use crate::map::{FIXED_ARRAY_HEADER_SIZE, Map, PropertyDetails};

// =============================================================================
// Generation
// =============================================================================

/// Region of the heap an object lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Young generation, freshly allocated.
    Nursery,
    /// Survived one minor collection.
    Survivor,
    /// Old generation.
    Tenured,
    /// Read-only space created at bootstrap.
    ReadOnly,
}

impl Generation {
    /// Young objects may move or die at the next minor collection.
    #[inline]
    pub const fn is_young(self) -> bool {
        matches!(self, Generation::Nursery | Generation::Survivor)
    }
}

// =============================================================================
// Object
// =============================================================================

/// One heap-allocated object.
#[derive(Debug, Clone)]
pub struct HeapObject {
    /// The object's map.
    pub map: HeapAddr,
    /// Where the object lives.
    pub generation: Generation,
    /// Kind-specific contents.
    pub body: HeapObjectBody,
}

/// Kind-specific contents of a heap object.
#[derive(Debug, Clone)]
pub enum HeapObjectBody {
    /// A map.
    Map(Map),
    /// A special value.
    Oddball(OddballBody),
    /// Boxed double, immutable or mutable depending on the map.
    Number(f64),
    /// String contents, internalized or not depending on the map.
    String(Arc<str>),
    /// Tagged storage (fixed arrays and property arrays).
    FixedArray(Vec<Tagged>),
    /// Unboxed double storage; `None` marks a hole.
    FixedDoubleArray(Vec<Option<f64>>),
    /// Plain JS object or global proxy.
    JsObject(JsObjectBody),
    /// JS array.
    JsArray(JsObjectBody, JsArrayFields),
    /// JS function.
    JsFunction(JsObjectBody, JsFunctionFields),
    /// Context of any kind.
    Context(ContextBody),
    /// Script context table.
    ScriptContextTable(Vec<HeapAddr>),
    /// Scope info.
    ScopeInfo(ScopeInfoBody),
    /// Shared function info.
    SharedFunctionInfo(SharedFunctionInfoBody),
    /// Module.
    Module(ModuleBody),
    /// Cell.
    Cell(Tagged),
    /// Property cell.
    PropertyCell(PropertyCellBody),
    /// Allocation site.
    AllocationSite(AllocationSiteBody),
    /// Code object.
    Code(Builtin),
}

impl HeapObjectBody {
    /// Shared JS object part, if the body belongs to the JS object family.
    pub fn as_js_object(&self) -> Option<&JsObjectBody> {
        match self {
            HeapObjectBody::JsObject(object)
            | HeapObjectBody::JsArray(object, _)
            | HeapObjectBody::JsFunction(object, _) => Some(object),
            _ => None,
        }
    }

    pub(crate) fn as_js_object_mut(&mut self) -> Option<&mut JsObjectBody> {
        match self {
            HeapObjectBody::JsObject(object)
            | HeapObjectBody::JsArray(object, _)
            | HeapObjectBody::JsFunction(object, _) => Some(object),
            _ => None,
        }
    }

    /// Number of entries of array-like storage.
    pub fn storage_length(&self) -> Option<usize> {
        match self {
            HeapObjectBody::FixedArray(values) => Some(values.len()),
            HeapObjectBody::FixedDoubleArray(values) => Some(values.len()),
            _ => None,
        }
    }

    /// Allocation size of array-like storage in bytes.
    pub fn storage_size(&self) -> Option<usize> {
        self.storage_length().map(|len| FIXED_ARRAY_HEADER_SIZE + len * 8)
    }
}

// =============================================================================
// Oddballs
// =============================================================================

/// Which special value an oddball is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OddballKind {
    Undefined,
    Null,
    True,
    False,
    TheHole,
    Uninitialized,
    ArgumentsMarker,
    Exception,
    OptimizedOut,
    StaleRegister,
}

/// Oddball contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OddballBody {
    /// Which special value.
    pub kind: OddballKind,
    /// Cached numeric conversion.
    pub to_number: f64,
}

// =============================================================================
// JS Objects
// =============================================================================

/// Value stored in an in-object field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// Tagged value.
    Tagged(Tagged),
    /// Unboxed double.
    Double(f64),
}

/// Part shared by every JS object.
#[derive(Debug, Clone)]
pub struct JsObjectBody {
    /// Out-of-object property storage (a property array or the empty fixed array).
    pub properties: HeapAddr,
    /// Indexed backing storage.
    pub elements: HeapAddr,
    /// In-object fields, `inobject_properties` of the map long.
    pub in_object: Vec<FieldValue>,
}

/// Array-specific fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsArrayFields {
    /// The `length` value.
    pub length: Tagged,
}

/// Function-specific fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsFunctionFields {
    /// Shared function info.
    pub shared: HeapAddr,
    /// Closure context.
    pub context: HeapAddr,
    /// Initial map for `new`, once created.
    pub initial_map: Option<HeapAddr>,
}

// =============================================================================
// Contexts
// =============================================================================

/// Number of header slots of every context.
pub const MIN_CONTEXT_SLOTS: usize = 4;

/// Header slot holding the scope info.
pub const SCOPE_INFO_INDEX: usize = 0;
/// Header slot holding the previous context.
pub const PREVIOUS_INDEX: usize = 1;
/// Header slot holding the extension object.
pub const EXTENSION_INDEX: usize = 2;
/// Header slot holding the native context.
pub const NATIVE_CONTEXT_INDEX: usize = 3;

/// Context contents. Header slots come first, then locals.
#[derive(Debug, Clone)]
pub struct ContextBody {
    /// All slots, header included.
    pub slots: Vec<Tagged>,
}

impl ContextBody {
    /// Raw slot.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Tagged> {
        self.slots.get(index).copied()
    }

    /// Scope info of the context.
    pub fn scope_info(&self) -> Option<HeapAddr> {
        self.get(SCOPE_INFO_INDEX)?.as_heap()
    }

    /// Previous context, `None` if the slot holds a non-context marker.
    ///
    /// The heap stores `undefined` there; callers resolve it against the
    /// roots, see [`Heap::context_previous`](crate::Heap::context_previous).
    pub fn previous_raw(&self) -> Option<Tagged> {
        self.get(PREVIOUS_INDEX)
    }

    /// Number of slots.
    #[inline]
    pub fn length(&self) -> usize {
        self.slots.len()
    }
}

/// Binding mode of a context-allocated variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableMode {
    Var,
    Let,
    Const,
}

/// One context-allocated local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLocal {
    /// Variable name (internalized string).
    pub name: HeapAddr,
    /// Binding mode.
    pub mode: VariableMode,
}

/// Scope info contents.
#[derive(Debug, Clone, Default)]
pub struct ScopeInfoBody {
    /// Context-allocated locals in slot order.
    pub context_locals: Vec<ContextLocal>,
    /// Whether the scope allocates a context at all.
    pub needs_context: bool,
}

impl ScopeInfoBody {
    /// Length of contexts created for this scope, 0 when none is needed.
    pub fn context_length(&self) -> usize {
        if self.needs_context || !self.context_locals.is_empty() {
            MIN_CONTEXT_SLOTS + self.context_locals.len()
        } else {
            0
        }
    }

    /// Slot index of the local named `name`.
    pub fn slot_of(&self, name: HeapAddr) -> Option<(usize, VariableMode)> {
        self.context_locals
            .iter()
            .position(|local| local.name == name)
            .map(|i| (MIN_CONTEXT_SLOTS + i, self.context_locals[i].mode))
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Syntactic kind of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Normal,
    Arrow,
    Method,
    ClassConstructor,
    Generator,
    Async,
}

impl FunctionKind {
    /// Generators and async functions suspend and resume.
    #[inline]
    pub const fn is_resumable(self) -> bool {
        matches!(self, FunctionKind::Generator | FunctionKind::Async)
    }

    /// Functions usable with `new`.
    #[inline]
    pub const fn is_constructable(self) -> bool {
        matches!(self, FunctionKind::Normal | FunctionKind::ClassConstructor)
    }
}

/// Strictness of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageMode {
    Sloppy,
    Strict,
}

/// Builtins with their own code object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    ArrayConstructor,
    ArrayPrototypeShift,
    ArrayPrototypePush,
    CallFunctionForwardVarargs,
    MathAbs,
    MathFloor,
    StringPrototypeCharAt,
}

/// Identity of a builtin function the compiler knows how to inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunctionId {
    ArrayPush,
    ArrayShift,
    MathAbs,
    MathFloor,
    StringCharAt,
}

/// Bytecode summary attached to interpreted functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BytecodeInfo {
    /// Number of interpreter registers.
    pub register_count: u32,
}

/// Shared function info contents.
#[derive(Debug, Clone)]
pub struct SharedFunctionInfoBody {
    /// Function name (a string).
    pub name: HeapAddr,
    /// Declared formal parameter count.
    pub formal_parameter_count: u16,
    /// Parameter list repeats a name.
    pub has_duplicate_parameters: bool,
    /// Syntactic kind.
    pub kind: FunctionKind,
    /// Strictness.
    pub language_mode: LanguageMode,
    /// Defined by the runtime itself.
    pub native: bool,
    /// Builtin implementing the function, if any.
    pub builtin: Option<Builtin>,
    /// Inlinable builtin identity, if any.
    pub function_id: Option<BuiltinFunctionId>,
    /// Construct calls go through the builtin construct stub.
    pub construct_as_builtin: bool,
    /// Compiled bytecode, if any.
    pub bytecode: Option<BytecodeInfo>,
}

impl SharedFunctionInfoBody {
    /// User function without bytecode or builtin.
    pub fn new(name: HeapAddr, kind: FunctionKind, language_mode: LanguageMode) -> Self {
        Self {
            name,
            formal_parameter_count: 0,
            has_duplicate_parameters: false,
            kind,
            language_mode,
            native: false,
            builtin: None,
            function_id: None,
            construct_as_builtin: false,
            bytecode: None,
        }
    }
}

// =============================================================================
// Modules and Cells
// =============================================================================

/// Module contents.
#[derive(Debug, Clone, Default)]
pub struct ModuleBody {
    /// Cells of regular exports, addressed by positive cell indices.
    pub regular_exports: Vec<HeapAddr>,
    /// Cells of regular imports, addressed by negative cell indices.
    pub regular_imports: Vec<HeapAddr>,
}

impl ModuleBody {
    /// Cell addressed by `cell_index`: `1..` are exports, `..=-1` imports.
    pub fn cell(&self, cell_index: i32) -> Option<HeapAddr> {
        match cell_index {
            0 => None,
            i if i > 0 => self.regular_exports.get(i as usize - 1).copied(),
            i => self.regular_imports.get((-i) as usize - 1).copied(),
        }
    }

    /// Every cell, exports first.
    pub fn cells(&self) -> impl Iterator<Item = HeapAddr> + '_ {
        self.regular_exports.iter().chain(&self.regular_imports).copied()
    }
}

/// Property cell contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyCellBody {
    /// Current value.
    pub value: Tagged,
    /// Details of the global property.
    pub details: PropertyDetails,
}

// =============================================================================
// Allocation Sites
// =============================================================================

/// Pretenuring decision of an allocation site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PretenureMode {
    NotTenured,
    Tenured,
}

/// Allocation site contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationSiteBody {
    /// Literal boilerplate, if the site belongs to a literal.
    pub boilerplate: Option<HeapAddr>,
    /// Elements kind transition info.
    pub elements_kind: ElementsKind,
    /// Site of a nested literal, if any.
    pub nested_site: Option<HeapAddr>,
    /// Pretenuring decision.
    pub pretenure: PretenureMode,
    /// Array constructor calls may be inlined.
    pub can_inline_call: bool,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_young() {
        assert!(Generation::Nursery.is_young());
        assert!(Generation::Survivor.is_young());
        assert!(!Generation::Tenured.is_young());
        assert!(!Generation::ReadOnly.is_young());
    }

    #[test]
    fn test_scope_info_context_length() {
        let none = ScopeInfoBody::default();
        assert_eq!(none.context_length(), 0);

        let with_locals = ScopeInfoBody {
            context_locals: vec![
                ContextLocal { name: HeapAddr::from_raw(5), mode: VariableMode::Let },
                ContextLocal { name: HeapAddr::from_raw(6), mode: VariableMode::Const },
            ],
            needs_context: true,
        };
        assert_eq!(with_locals.context_length(), MIN_CONTEXT_SLOTS + 2);
        assert_eq!(
            with_locals.slot_of(HeapAddr::from_raw(6)),
            Some((MIN_CONTEXT_SLOTS + 1, VariableMode::Const))
        );
        assert_eq!(with_locals.slot_of(HeapAddr::from_raw(7)), None);
    }

    #[test]
    fn test_module_cell_indexing() {
        let module = ModuleBody {
            regular_exports: vec![HeapAddr::from_raw(10), HeapAddr::from_raw(11)],
            regular_imports: vec![HeapAddr::from_raw(20)],
        };
        assert_eq!(module.cell(1), Some(HeapAddr::from_raw(10)));
        assert_eq!(module.cell(2), Some(HeapAddr::from_raw(11)));
        assert_eq!(module.cell(-1), Some(HeapAddr::from_raw(20)));
        assert_eq!(module.cell(0), None);
        assert_eq!(module.cell(3), None);
        assert_eq!(module.cells().count(), 3);
    }

    #[test]
    fn test_storage_size() {
        let body = HeapObjectBody::FixedDoubleArray(vec![Some(1.0), None, Some(2.0)]);
        assert_eq!(body.storage_length(), Some(3));
        assert_eq!(body.storage_size(), Some(FIXED_ARRAY_HEADER_SIZE + 24));
        assert_eq!(HeapObjectBody::Number(1.0).storage_size(), None);
    }

    #[test]
    fn test_function_kind_predicates() {
        assert!(FunctionKind::Generator.is_resumable());
        assert!(!FunctionKind::Normal.is_resumable());
        assert!(FunctionKind::ClassConstructor.is_constructable());
        assert!(!FunctionKind::Arrow.is_constructable());
    }
}
