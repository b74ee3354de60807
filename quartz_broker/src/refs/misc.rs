//! Function metadata, modules, cells, allocation sites and code.

use quartz_heap::{
    Builtin, BuiltinFunctionId, ElementsKind, FunctionKind, LanguageMode, PretenureMode,
    PropertyDetails,
};

use super::{HeapObjectRef, JsObjectRef, ObjectRef, StringRef};
use crate::data::{AllocationSiteData, DataBody, SharedFunctionInfoData};
use crate::error::{BrokerViolation, OrFatal, fatal};
use crate::literal::{FastLiteralBudget, is_fast_literal};

define_ref! {
    /// Facade for the metadata shared by all closures of one function.
    SharedFunctionInfoRef => HeapObjectRef
}

define_ref! {
    ModuleRef => HeapObjectRef
}

define_ref! {
    /// Box holding a module variable.
    CellRef => HeapObjectRef
}

define_ref! {
    /// Box holding a global property.
    PropertyCellRef => HeapObjectRef
}

define_ref! {
    /// Facade for allocation feedback of a literal or array constructor call.
    AllocationSiteRef => HeapObjectRef
}

define_ref! {
    CodeRef => HeapObjectRef
}

// =============================================================================
// SharedFunctionInfoRef
// =============================================================================

impl<'b> SharedFunctionInfoRef<'b> {
    fn with_info<R>(&self, f: impl FnOnce(&SharedFunctionInfoData) -> R) -> R {
        match self.live() {
            Some(heap) => {
                let shared = heap
                    .shared_function_info(self.address())
                    .map(|shared| shared.clone())
                    .or_fatal(|| self.mismatch("SharedFunctionInfo"));
                let name = self.live_sibling(shared.name.into()).data_id();
                f(&SharedFunctionInfoData::from_body(&shared, name))
            }
            None => self.body("SharedFunctionInfo", |body| match body {
                DataBody::SharedFunctionInfo(info) => Some(f(info)),
                _ => None,
            }),
        }
    }

    pub fn name(&self) -> StringRef<'b> {
        let name = self.with_info(|info| info.name);
        self.sibling(name).as_string()
    }

    pub fn internal_formal_parameter_count(&self) -> u16 {
        self.with_info(|info| info.internal_formal_parameter_count)
    }

    /// Native context slot of the map for closures of this function.
    pub fn function_map_index(&self) -> usize {
        self.with_info(|info| info.function_map_index)
    }

    pub fn has_duplicate_parameters(&self) -> bool {
        self.with_info(|info| info.has_duplicate_parameters)
    }

    pub fn kind(&self) -> FunctionKind {
        self.with_info(|info| info.kind)
    }

    pub fn language_mode(&self) -> LanguageMode {
        self.with_info(|info| info.language_mode)
    }

    /// Defined by the runtime rather than by user code.
    pub fn native(&self) -> bool {
        self.with_info(|info| info.native)
    }

    pub fn has_builtin_id(&self) -> bool {
        self.with_info(|info| info.builtin.is_some())
    }

    /// Builtin implementing this function. Fatal when there is none.
    pub fn builtin_id(&self) -> Builtin {
        self.with_info(|info| info.builtin).or_fatal(|| BrokerViolation::UnresolvedDependency {
            object: self.object(),
            dependency: "builtin id",
        })
    }

    pub fn construct_as_builtin(&self) -> bool {
        self.with_info(|info| info.construct_as_builtin)
    }

    pub fn has_bytecode_array(&self) -> bool {
        self.with_info(|info| info.bytecode_register_count.is_some())
    }

    /// Interpreter register count. Fatal without bytecode.
    pub fn bytecode_register_count(&self) -> u32 {
        self.with_info(|info| info.bytecode_register_count).or_fatal(|| {
            BrokerViolation::UnresolvedDependency { object: self.object(), dependency: "bytecode" }
        })
    }

    pub fn has_builtin_function_id(&self) -> bool {
        self.with_info(|info| info.function_id.is_some())
    }

    /// Inlinable builtin identity. Fatal when there is none.
    pub fn builtin_function_id(&self) -> BuiltinFunctionId {
        self.with_info(|info| info.function_id).or_fatal(|| {
            BrokerViolation::UnresolvedDependency {
                object: self.object(),
                dependency: "builtin function id",
            }
        })
    }
}

// =============================================================================
// Modules and cells
// =============================================================================

impl<'b> ModuleRef<'b> {
    /// Cell for a signed cell index: positive for exports, negative for
    /// imports. Fatal when no such cell exists.
    pub fn get_cell(&self, cell_index: i32) -> CellRef<'b> {
        let cell = match self.live() {
            Some(heap) => heap
                .module(self.address())
                .or_fatal(|| self.mismatch("Module"))
                .cell(cell_index)
                .map(|cell| self.live_sibling(cell.into())),
            None => self
                .body("Module", |body| match body {
                    DataBody::Module(module) => Some(module.cell(cell_index)),
                    _ => None,
                })
                .map(|id| self.sibling(id)),
        };
        cell.or_fatal(|| self.out_of_bounds(cell_index)).as_cell()
    }
}

impl<'b> CellRef<'b> {
    pub fn value(&self) -> ObjectRef<'b> {
        match self.live() {
            Some(heap) => {
                let value = heap.cell(self.address()).or_fatal(|| self.mismatch("Cell"));
                self.live_sibling(value)
            }
            None => {
                let id = self.body("Cell", |body| match body {
                    DataBody::Cell(value) => Some(*value),
                    _ => None,
                });
                self.sibling(id)
            }
        }
    }
}

impl<'b> PropertyCellRef<'b> {
    /// Value at capture time.
    pub fn value(&self) -> ObjectRef<'b> {
        match self.live() {
            Some(heap) => {
                let cell = heap.property_cell(self.address()).or_fatal(|| self.mismatch("PropertyCell"));
                self.live_sibling(cell.value)
            }
            None => {
                let id = self.body("PropertyCell", |body| match body {
                    DataBody::PropertyCell(cell) => Some(cell.value),
                    _ => None,
                });
                self.sibling(id)
            }
        }
    }

    pub fn property_details(&self) -> PropertyDetails {
        match self.live() {
            Some(heap) => heap
                .property_cell(self.address())
                .map(|cell| cell.details)
                .or_fatal(|| self.mismatch("PropertyCell")),
            None => self.body("PropertyCell", |body| match body {
                DataBody::PropertyCell(cell) => Some(cell.details),
                _ => None,
            }),
        }
    }
}

// =============================================================================
// AllocationSiteRef
// =============================================================================

impl<'b> AllocationSiteRef<'b> {
    /// Stored fields of the site. Live reads copy them without classifying.
    fn site(&self) -> AllocationSiteData {
        match self.live() {
            Some(heap) => {
                let site = heap
                    .allocation_site(self.address())
                    .or_fatal(|| self.mismatch("AllocationSite"));
                AllocationSiteData {
                    boilerplate: site.boilerplate.map(|b| self.live_sibling(b.into()).data_id()),
                    nested_site: site.nested_site.map(|s| self.live_sibling(s.into()).data_id()),
                    elements_kind: site.elements_kind,
                    pretenure: site.pretenure,
                    can_inline_call: site.can_inline_call,
                    is_fast_literal: false,
                }
            }
            None => self.body("AllocationSite", |body| match body {
                DataBody::AllocationSite(site) => Some(*site),
                _ => None,
            }),
        }
    }

    /// Check if the site belongs to an object or array literal.
    pub fn points_to_literal(&self) -> bool {
        self.site().boilerplate.is_some()
    }

    /// Literal boilerplate, `None` for array constructor sites.
    pub fn boilerplate(&self) -> Option<JsObjectRef<'b>> {
        self.site().boilerplate.map(|id| self.sibling(id).as_js_object())
    }

    /// Site of the first nested literal.
    pub fn nested_site(&self) -> Option<AllocationSiteRef<'b>> {
        self.site().nested_site.map(|id| self.sibling(id).as_allocation_site())
    }

    pub fn elements_kind(&self) -> ElementsKind {
        self.site().elements_kind
    }

    pub fn can_inline_call(&self) -> bool {
        self.site().can_inline_call
    }

    pub fn pretenure_mode(&self) -> PretenureMode {
        self.site().pretenure
    }

    /// Check if the boilerplate can be copied inline by generated code.
    ///
    /// Live reads run the classifier, which may migrate the boilerplate graph
    /// off deprecated maps. Fatal for sites that do not point to a literal.
    pub fn is_fast_literal(&self) -> bool {
        let site = self.site();
        let Some(boilerplate) = site.boilerplate else {
            fatal(BrokerViolation::UnresolvedDependency {
                object: self.object(),
                dependency: "literal boilerplate",
            });
        };
        match self.live() {
            Some(heap) => {
                let boilerplate = self.sibling(boilerplate).address();
                is_fast_literal(heap, boilerplate, &mut FastLiteralBudget::default())
            }
            None => site.is_fast_literal,
        }
    }
}

impl<'b> CodeRef<'b> {
    pub fn builtin(&self) -> Builtin {
        match self.live() {
            Some(heap) => heap.code(self.address()).or_fatal(|| self.mismatch("Code")),
            None => self.body("Code", |body| match body {
                DataBody::Code(builtin) => Some(*builtin),
                _ => None,
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::testing::brokers;
    use crate::{BrokerConfig, JsHeapBroker};
    use quartz_heap::{
        AllocationSiteBody, Builtin, BytecodeInfo, ElementsKind, FieldValue, FunctionKind, Heap,
        LanguageMode, PretenureMode, PropertyDetails, Representation, SharedFunctionInfoBody,
        Tagged,
    };
    use std::sync::Arc;

    fn site(boilerplate: Option<quartz_heap::HeapAddr>) -> AllocationSiteBody {
        AllocationSiteBody {
            boilerplate,
            elements_kind: ElementsKind::PackedSmi,
            nested_site: None,
            pretenure: PretenureMode::NotTenured,
            can_inline_call: true,
        }
    }

    #[test]
    fn test_shared_function_info() {
        let heap = Arc::new(Heap::new());
        let name = heap.internalize("f");
        let mut body = SharedFunctionInfoBody::new(name, FunctionKind::Normal, LanguageMode::Sloppy);
        body.formal_parameter_count = 2;
        body.bytecode = Some(BytecodeInfo { register_count: 7 });
        let shared = heap.new_shared_function_info(body);
        for broker in brokers(&heap, &[shared.into()]) {
            let shared = broker.object_ref(shared.into()).as_shared_function_info();
            assert_eq!(shared.name().value().as_ref(), "f");
            assert_eq!(shared.internal_formal_parameter_count(), 2);
            assert_eq!(shared.kind(), FunctionKind::Normal);
            assert_eq!(shared.language_mode(), LanguageMode::Sloppy);
            assert!(!shared.native());
            assert!(!shared.has_duplicate_parameters());
            assert!(!shared.has_builtin_id());
            assert!(!shared.has_builtin_function_id());
            assert!(shared.has_bytecode_array());
            assert_eq!(shared.bytecode_register_count(), 7);

            let map = broker.native_context().function_map_from_index(shared.function_map_index());
            assert!(map.is_callable());
        }
    }

    #[test]
    fn test_module_cells() {
        let heap = Arc::new(Heap::new());
        let export = heap.new_cell(Tagged::smi(1));
        let import = heap.new_cell(Tagged::smi(-1));
        let module = heap.new_module(vec![export], vec![import]);
        for broker in brokers(&heap, &[module.into()]) {
            let module = broker.object_ref(module.into()).as_module();
            assert_eq!(module.get_cell(1).object(), Tagged::from(export));
            assert_eq!(module.get_cell(1).value().as_smi(), 1);
            assert_eq!(module.get_cell(-1).value().as_smi(), -1);
        }
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_missing_module_cell_is_fatal() {
        let heap = Arc::new(Heap::new());
        let module = heap.new_module(Vec::new(), Vec::new());
        let broker = JsHeapBroker::new(heap, BrokerConfig::concurrent());
        broker.object_ref(module.into()).as_module().get_cell(1);
    }

    #[test]
    fn test_property_cell() {
        let heap = Arc::new(Heap::new());
        let details = PropertyDetails::field(Representation::Smi);
        let cell = heap.new_property_cell(Tagged::smi(42), details);
        for broker in brokers(&heap, &[cell.into()]) {
            let cell = broker.object_ref(cell.into()).as_property_cell();
            assert_eq!(cell.value().as_smi(), 42);
            assert_eq!(cell.property_details(), details);
        }
    }

    #[test]
    fn test_allocation_site_without_literal() {
        let heap = Arc::new(Heap::new());
        let site = heap.new_allocation_site(site(None));
        for broker in brokers(&heap, &[site.into()]) {
            let site = broker.object_ref(site.into()).as_allocation_site();
            assert!(!site.points_to_literal());
            assert!(site.boilerplate().is_none());
            assert!(site.nested_site().is_none());
            assert_eq!(site.elements_kind(), ElementsKind::PackedSmi);
            assert_eq!(site.pretenure_mode(), PretenureMode::NotTenured);
            assert!(site.can_inline_call());
        }
    }

    #[test]
    fn test_allocation_site_literal() {
        let heap = Arc::new(Heap::new());
        let map = heap.new_object_map(&[("a", Representation::Smi)], ElementsKind::PackedSmi);
        let inner = heap.new_js_object(map, vec![FieldValue::Tagged(Tagged::smi(1))]);
        let inner_site = heap.new_allocation_site(site(Some(inner)));
        let mut outer = site(Some(inner));
        outer.nested_site = Some(inner_site);
        let outer = heap.new_allocation_site(outer);
        for broker in brokers(&heap, &[outer.into()]) {
            let site = broker.object_ref(outer.into()).as_allocation_site();
            assert!(site.points_to_literal());
            assert!(site.is_fast_literal());
            assert_eq!(site.boilerplate().unwrap().object(), Tagged::from(inner));
            assert_eq!(site.nested_site().unwrap().object(), Tagged::from(inner_site));
        }
    }

    #[test]
    fn test_live_site_getters_leave_boilerplate_map() {
        let heap = Arc::new(Heap::new());
        let old = heap.new_object_map(&[("a", Representation::Smi)], ElementsKind::PackedSmi);
        let new = heap.new_object_map(&[("a", Representation::Smi)], ElementsKind::PackedSmi);
        let boilerplate = heap.new_js_object(old, vec![FieldValue::Tagged(Tagged::smi(1))]);
        assert!(heap.deprecate_map(old, new));
        let literal = heap.new_allocation_site(site(Some(boilerplate)));
        let broker = JsHeapBroker::new(Arc::clone(&heap), BrokerConfig::default());

        let literal = broker.object_ref(literal.into()).as_allocation_site();
        assert_eq!(literal.pretenure_mode(), PretenureMode::NotTenured);
        assert_eq!(literal.elements_kind(), ElementsKind::PackedSmi);
        assert!(literal.can_inline_call());
        assert!(literal.points_to_literal());
        assert!(literal.boilerplate().is_some());
        assert_eq!(heap.map_of(boilerplate), Some(old));

        assert!(literal.is_fast_literal());
        assert_eq!(heap.map_of(boilerplate), Some(new));
    }

    #[test]
    #[should_panic(expected = "literal boilerplate")]
    fn test_is_fast_literal_without_literal_is_fatal() {
        let heap = Arc::new(Heap::new());
        let site = heap.new_allocation_site(site(None));
        let broker = JsHeapBroker::new(heap, BrokerConfig::default());
        broker.object_ref(site.into()).as_allocation_site().is_fast_literal();
    }

    #[test]
    fn test_builtin_code() {
        for broker in brokers(&Arc::new(Heap::new()), &[]) {
            let code = broker.object_ref(broker.roots().array_prototype_shift_code.into());
            assert!(code.is_code());
            assert_eq!(code.as_code().builtin(), Builtin::ArrayPrototypeShift);
        }
    }
}
