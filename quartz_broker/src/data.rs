//! Descriptors: immutable snapshots of heap objects.
//!
//! A descriptor is created once per object identity and never changes. Every
//! reference from one descriptor to another is a [`DataId`] into the owning
//! broker's arena, so cycles in the heap (the meta map, a constructor and its
//! initial map, a closure and its native context) need no special handling.

use std::fmt;
use std::sync::Arc;

use quartz_heap::{
    Builtin, BuiltinFunctionId, ElementsKind, FunctionKind, LanguageMode, Map, NativeContextSlot,
    OddballKind, PretenureMode, PropertyDetails, SharedFunctionInfoBody, Tagged, VariableMode,
};
use smallvec::SmallVec;

use crate::heap_type::HeapObjectType;

/// Index of a descriptor in its broker's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataId(u32);

impl DataId {
    #[inline]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position in the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataId({})", self.0)
    }
}

// =============================================================================
// Object Data
// =============================================================================

/// Descriptor of one object identity.
#[derive(Debug, Clone)]
pub struct ObjectData {
    object: Tagged,
    kind: ObjectDataKind,
}

/// How much of the object a descriptor holds.
#[derive(Debug, Clone)]
pub enum ObjectDataKind {
    /// An immediate; nothing to capture.
    Smi,
    /// Identity only, created in `Disabled` mode where every read is live.
    Stub,
    /// Full snapshot of a heap object.
    HeapObject(HeapObjectData),
}

impl ObjectData {
    pub(crate) fn new(object: Tagged, kind: ObjectDataKind) -> Self {
        debug_assert_eq!(object.is_smi(), matches!(kind, ObjectDataKind::Smi));
        Self { object, kind }
    }

    /// Identity this descriptor stands for.
    #[inline]
    pub fn object(&self) -> Tagged {
        self.object
    }

    #[inline]
    pub fn kind(&self) -> &ObjectDataKind {
        &self.kind
    }

    #[inline]
    pub fn is_smi(&self) -> bool {
        matches!(self.kind, ObjectDataKind::Smi)
    }

    #[inline]
    pub fn is_stub(&self) -> bool {
        matches!(self.kind, ObjectDataKind::Stub)
    }

    /// Heap object snapshot, `None` for Smis and stubs.
    #[inline]
    pub fn as_heap_object(&self) -> Option<&HeapObjectData> {
        match &self.kind {
            ObjectDataKind::HeapObject(data) => Some(data),
            _ => None,
        }
    }

    /// Kind-specific part of a heap object snapshot.
    #[inline]
    pub fn body(&self) -> Option<&DataBody> {
        self.as_heap_object().map(HeapObjectData::body)
    }
}

/// Snapshot of a heap object: its classification, its map and its contents.
#[derive(Debug, Clone)]
pub struct HeapObjectData {
    ty: HeapObjectType,
    map: DataId,
    body: DataBody,
}

impl HeapObjectData {
    pub(crate) fn new(ty: HeapObjectType, map: DataId, body: DataBody) -> Self {
        Self { ty, map, body }
    }

    #[inline]
    pub fn heap_object_type(&self) -> HeapObjectType {
        self.ty
    }

    #[inline]
    pub fn map(&self) -> DataId {
        self.map
    }

    #[inline]
    pub fn body(&self) -> &DataBody {
        &self.body
    }
}

// =============================================================================
// Bodies
// =============================================================================

/// Contents captured for each kind of heap object.
#[derive(Debug, Clone)]
pub enum DataBody {
    Map(Box<MapData>),
    Oddball(OddballKind),
    HeapNumber(f64),
    MutableHeapNumber(f64),
    String(Arc<str>),
    /// Fixed arrays, copy-on-write arrays and property arrays.
    FixedArray(Vec<DataId>),
    /// `None` marks a hole.
    FixedDoubleArray(Vec<Option<f64>>),
    JsObject(Box<JsObjectData>),
    Context(ContextData),
    ScriptContextTable(Vec<DataId>),
    ScopeInfo(ScopeInfoData),
    SharedFunctionInfo(Box<SharedFunctionInfoData>),
    Module(ModuleData),
    Cell(DataId),
    PropertyCell(PropertyCellData),
    AllocationSite(AllocationSiteData),
    Code(Builtin),
}

impl DataBody {
    /// Variant name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            DataBody::Map(_) => "Map",
            DataBody::Oddball(_) => "Oddball",
            DataBody::HeapNumber(_) => "HeapNumber",
            DataBody::MutableHeapNumber(_) => "MutableHeapNumber",
            DataBody::String(_) => "String",
            DataBody::FixedArray(_) => "FixedArray",
            DataBody::FixedDoubleArray(_) => "FixedDoubleArray",
            DataBody::JsObject(_) => "JsObject",
            DataBody::Context(_) => "Context",
            DataBody::ScriptContextTable(_) => "ScriptContextTable",
            DataBody::ScopeInfo(_) => "ScopeInfo",
            DataBody::SharedFunctionInfo(_) => "SharedFunctionInfo",
            DataBody::Module(_) => "Module",
            DataBody::Cell(_) => "Cell",
            DataBody::PropertyCell(_) => "PropertyCell",
            DataBody::AllocationSite(_) => "AllocationSite",
            DataBody::Code(_) => "Code",
        }
    }
}

/// A map, with descriptor keys and the constructor resolved.
#[derive(Debug, Clone)]
pub struct MapData {
    pub map: Map,
    /// Key of each own descriptor, in descriptor order.
    pub keys: SmallVec<[DataId; 4]>,
    pub constructor_or_backpointer: DataId,
    pub is_fixed_cow_array_map: bool,
}

/// Value of a named field as captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapturedField {
    Tagged(DataId),
    Double(f64),
}

/// Any member of the JS object family.
#[derive(Debug, Clone)]
pub struct JsObjectData {
    pub properties: DataId,
    pub elements: DataId,
    pub in_object: SmallVec<[CapturedField; 4]>,
    pub kind: JsObjectKind,
}

/// Subtype-specific part of a JS object.
#[derive(Debug, Clone)]
pub enum JsObjectKind {
    Plain,
    GlobalProxy,
    Array { length: DataId },
    Function(JsFunctionData),
}

/// A closure, with everything the compiler reads off it.
#[derive(Debug, Clone)]
pub struct JsFunctionData {
    pub shared: DataId,
    pub context: DataId,
    pub initial_map: Option<DataId>,
    /// Global proxy of the closure's native context.
    pub global_proxy: DataId,
}

/// Any context. Slot 0 onward, header included.
#[derive(Debug, Clone)]
pub struct ContextData {
    pub slots: Vec<DataId>,
    pub native: Option<NativeContextData>,
}

/// Extra state captured for the native context.
#[derive(Debug, Clone, Copy)]
pub struct NativeContextData {
    pub sloppy_arguments_map: DataId,
}

#[derive(Debug, Clone)]
pub struct ScopeInfoData {
    pub context_length: usize,
    /// Context-allocated locals in slot order.
    pub locals: SmallVec<[(DataId, VariableMode); 4]>,
}

#[derive(Debug, Clone)]
pub struct SharedFunctionInfoData {
    pub name: DataId,
    pub internal_formal_parameter_count: u16,
    pub function_map_index: usize,
    pub has_duplicate_parameters: bool,
    pub kind: FunctionKind,
    pub language_mode: LanguageMode,
    pub native: bool,
    pub builtin: Option<Builtin>,
    pub function_id: Option<BuiltinFunctionId>,
    pub construct_as_builtin: bool,
    pub bytecode_register_count: Option<u32>,
}

impl SharedFunctionInfoData {
    /// Summary of `shared` with its name resolved to `name`.
    pub(crate) fn from_body(shared: &SharedFunctionInfoBody, name: DataId) -> Self {
        Self {
            name,
            internal_formal_parameter_count: shared.formal_parameter_count,
            function_map_index: NativeContextSlot::function_map(shared.kind, shared.language_mode)
                .index(),
            has_duplicate_parameters: shared.has_duplicate_parameters,
            kind: shared.kind,
            language_mode: shared.language_mode,
            native: shared.native,
            builtin: shared.builtin,
            function_id: shared.function_id,
            construct_as_builtin: shared.construct_as_builtin,
            bytecode_register_count: shared.bytecode.map(|bytecode| bytecode.register_count),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleData {
    pub exports: Vec<DataId>,
    pub imports: Vec<DataId>,
}

impl ModuleData {
    /// Cell addressed by a signed cell index: positive for exports, negative
    /// for imports.
    pub fn cell(&self, cell_index: i32) -> Option<DataId> {
        match cell_index {
            0 => None,
            i if i > 0 => self.exports.get(i as usize - 1).copied(),
            i => self.imports.get(i.unsigned_abs() as usize - 1).copied(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyCellData {
    pub value: DataId,
    pub details: PropertyDetails,
}

#[derive(Debug, Clone, Copy)]
pub struct AllocationSiteData {
    pub boilerplate: Option<DataId>,
    pub nested_site: Option<DataId>,
    pub elements_kind: ElementsKind,
    pub pretenure: PretenureMode,
    pub can_inline_call: bool,
    /// Classifier verdict at capture time.
    pub is_fast_literal: bool,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_cell_indexing() {
        let module = ModuleData {
            exports: vec![DataId::new(10), DataId::new(11)],
            imports: vec![DataId::new(20)],
        };
        assert_eq!(module.cell(1), Some(DataId::new(10)));
        assert_eq!(module.cell(2), Some(DataId::new(11)));
        assert_eq!(module.cell(-1), Some(DataId::new(20)));
        assert_eq!(module.cell(0), None);
        assert_eq!(module.cell(3), None);
        assert_eq!(module.cell(-2), None);
    }

    #[test]
    fn test_smi_data() {
        let data = ObjectData::new(Tagged::smi(7), ObjectDataKind::Smi);
        assert!(data.is_smi());
        assert!(!data.is_stub());
        assert!(data.as_heap_object().is_none());
        assert_eq!(data.object(), Tagged::smi(7));
    }

    #[test]
    fn test_data_id_debug() {
        assert_eq!(format!("{:?}", DataId::new(3)), "DataId(3)");
    }
}
