//! Heap bootstrap and allocation.
//!
//! [`Heap::new`] builds the read-only roots and one native context. The
//! remaining methods are the allocation API used by the runtime and by tests
//! to build object graphs.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::handle::{HeapAddr, Tagged};
use crate::heap::Heap;
use crate::instance_type::{ElementsKind, InstanceType};
use crate::map::{Map, MapFlags, PropertyDetails, Representation};
use crate::object::{
    AllocationSiteBody, Builtin, ContextBody, ContextLocal, FieldValue, FunctionKind, Generation,
    HeapObject, HeapObjectBody, JsArrayFields, JsFunctionFields, JsObjectBody, LanguageMode,
    MIN_CONTEXT_SLOTS, ModuleBody, NATIVE_CONTEXT_INDEX, OddballBody, OddballKind, PREVIOUS_INDEX, PropertyCellBody,
    SCOPE_INFO_INDEX, ScopeInfoBody, SharedFunctionInfoBody, VariableMode,
};
use crate::roots::{NativeContextSlot, ReadOnlyRoots};

// =============================================================================
// Bootstrap
// =============================================================================

#[derive(Default)]
struct Bootstrap {
    objects: Vec<HeapObject>,
    strings: FxHashMap<Arc<str>, HeapAddr>,
}

impl Bootstrap {
    fn alloc(&mut self, map: HeapAddr, generation: Generation, body: HeapObjectBody) -> HeapAddr {
        let addr = HeapAddr::from_raw(self.objects.len() as u32);
        self.objects.push(HeapObject { map, generation, body });
        addr
    }

    fn map(&mut self, meta_map: HeapAddr, map: Map) -> HeapAddr {
        self.alloc(meta_map, Generation::ReadOnly, HeapObjectBody::Map(map))
    }

    fn internalize(&mut self, string_map: HeapAddr, value: &str) -> HeapAddr {
        if let Some(&addr) = self.strings.get(value) {
            return addr;
        }
        let value: Arc<str> = Arc::from(value);
        let addr = self.alloc(
            string_map,
            Generation::ReadOnly,
            HeapObjectBody::String(Arc::clone(&value)),
        );
        self.strings.insert(value, addr);
        addr
    }

    fn map_mut(&mut self, addr: HeapAddr) -> Option<&mut Map> {
        match &mut self.objects.get_mut(addr.index())?.body {
            HeapObjectBody::Map(map) => Some(map),
            _ => None,
        }
    }

    fn set_slot(&mut self, context: HeapAddr, index: usize, value: Tagged) {
        if let Some(HeapObjectBody::Context(body)) =
            self.objects.get_mut(context.index()).map(|o| &mut o.body)
        {
            body.slots[index] = value;
        }
    }
}

fn empty_js_object(roots: &ReadOnlyRoots) -> JsObjectBody {
    JsObjectBody {
        properties: roots.empty_fixed_array,
        elements: roots.empty_fixed_array,
        in_object: Vec::new(),
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Bootstrap a heap with its read-only roots and a native context.
    pub fn new() -> Self {
        let mut b = Bootstrap::default();
        let placeholder = Tagged::smi(0);

        // The meta map is the map of every map, itself included.
        let meta_map = b.map(HeapAddr::from_raw(0), Map::new(InstanceType::Map, placeholder));
        let map_of = |b: &mut Bootstrap, ty: InstanceType| b.map(meta_map, Map::new(ty, placeholder));

        let undetectable = |b: &mut Bootstrap| {
            b.map(
                meta_map,
                Map::new(InstanceType::Oddball, placeholder).with_flags(MapFlags::UNDETECTABLE),
            )
        };
        let undefined_map = undetectable(&mut b);
        let null_map = undetectable(&mut b);
        let boolean_map = map_of(&mut b, InstanceType::Oddball);
        let the_hole_map = map_of(&mut b, InstanceType::Oddball);
        let uninitialized_map = map_of(&mut b, InstanceType::Oddball);
        let arguments_marker_map = map_of(&mut b, InstanceType::Oddball);
        let exception_map = map_of(&mut b, InstanceType::Oddball);
        let optimized_out_map = map_of(&mut b, InstanceType::Oddball);
        let stale_register_map = map_of(&mut b, InstanceType::Oddball);

        let oddball = |b: &mut Bootstrap, map: HeapAddr, kind: OddballKind, to_number: f64| {
            b.alloc(
                map,
                Generation::ReadOnly,
                HeapObjectBody::Oddball(OddballBody { kind, to_number }),
            )
        };
        let undefined_value = oddball(&mut b, undefined_map, OddballKind::Undefined, f64::NAN);
        let null_value = oddball(&mut b, null_map, OddballKind::Null, 0.0);
        let true_value = oddball(&mut b, boolean_map, OddballKind::True, 1.0);
        let false_value = oddball(&mut b, boolean_map, OddballKind::False, 0.0);
        let the_hole_value = oddball(&mut b, the_hole_map, OddballKind::TheHole, f64::NAN);
        let uninitialized_value =
            oddball(&mut b, uninitialized_map, OddballKind::Uninitialized, f64::NAN);
        let arguments_marker =
            oddball(&mut b, arguments_marker_map, OddballKind::ArgumentsMarker, f64::NAN);
        let exception = oddball(&mut b, exception_map, OddballKind::Exception, f64::NAN);
        let optimized_out = oddball(&mut b, optimized_out_map, OddballKind::OptimizedOut, f64::NAN);
        let stale_register =
            oddball(&mut b, stale_register_map, OddballKind::StaleRegister, f64::NAN);

        let heap_number_map = map_of(&mut b, InstanceType::HeapNumber);
        let mutable_heap_number_map = map_of(&mut b, InstanceType::MutableHeapNumber);
        let string_map = map_of(&mut b, InstanceType::String);
        let internalized_string_map = map_of(&mut b, InstanceType::InternalizedString);
        let fixed_array_map = map_of(&mut b, InstanceType::FixedArray);
        let fixed_cow_array_map = map_of(&mut b, InstanceType::FixedArray);
        let fixed_double_array_map = map_of(&mut b, InstanceType::FixedDoubleArray);
        let property_array_map = map_of(&mut b, InstanceType::PropertyArray);
        let scope_info_map = map_of(&mut b, InstanceType::ScopeInfo);
        let shared_function_info_map = map_of(&mut b, InstanceType::SharedFunctionInfo);
        let script_context_table_map = map_of(&mut b, InstanceType::ScriptContextTable);
        let native_context_map = map_of(&mut b, InstanceType::NativeContext);
        let function_context_map = map_of(&mut b, InstanceType::Context);
        let eval_context_map = map_of(&mut b, InstanceType::Context);
        let script_context_map = map_of(&mut b, InstanceType::Context);
        let module_map = map_of(&mut b, InstanceType::Module);
        let cell_map = map_of(&mut b, InstanceType::Cell);
        let many_closures_cell_map = map_of(&mut b, InstanceType::Cell);
        let property_cell_map = map_of(&mut b, InstanceType::PropertyCell);
        let allocation_site_map = map_of(&mut b, InstanceType::AllocationSite);
        let code_map = map_of(&mut b, InstanceType::Code);

        let empty_fixed_array = b.alloc(
            fixed_array_map,
            Generation::ReadOnly,
            HeapObjectBody::FixedArray(Vec::new()),
        );
        let empty_scope_info = b.alloc(
            scope_info_map,
            Generation::ReadOnly,
            HeapObjectBody::ScopeInfo(ScopeInfoBody::default()),
        );

        let string = |b: &mut Bootstrap, value: &str| b.internalize(internalized_string_map, value);
        let empty_string = string(&mut b, "");
        let length_string = string(&mut b, "length");
        let undefined_string = string(&mut b, "undefined");
        let object_string = string(&mut b, "object");
        let boolean_string = string(&mut b, "boolean");
        let number_string = string(&mut b, "number");
        let string_string = string(&mut b, "string");
        let function_string = string(&mut b, "function");

        let code = |b: &mut Bootstrap, builtin: Builtin| {
            b.alloc(code_map, Generation::ReadOnly, HeapObjectBody::Code(builtin))
        };
        let array_prototype_shift_code = code(&mut b, Builtin::ArrayPrototypeShift);
        let call_function_forward_varargs_code = code(&mut b, Builtin::CallFunctionForwardVarargs);

        for object in &mut b.objects {
            if let HeapObjectBody::Map(map) = &mut object.body {
                map.set_constructor_or_backpointer(undefined_value.into());
            }
        }

        let roots = ReadOnlyRoots {
            meta_map,
            undefined_map,
            null_map,
            boolean_map,
            the_hole_map,
            uninitialized_map,
            arguments_marker_map,
            exception_map,
            optimized_out_map,
            stale_register_map,
            undefined_value,
            null_value,
            true_value,
            false_value,
            the_hole_value,
            uninitialized_value,
            arguments_marker,
            exception,
            optimized_out,
            stale_register,
            heap_number_map,
            mutable_heap_number_map,
            string_map,
            internalized_string_map,
            fixed_array_map,
            fixed_cow_array_map,
            fixed_double_array_map,
            property_array_map,
            scope_info_map,
            shared_function_info_map,
            script_context_table_map,
            native_context_map,
            function_context_map,
            eval_context_map,
            script_context_map,
            module_map,
            cell_map,
            many_closures_cell_map,
            property_cell_map,
            allocation_site_map,
            code_map,
            empty_fixed_array,
            empty_scope_info,
            empty_string,
            length_string,
            undefined_string,
            object_string,
            boolean_string,
            number_string,
            string_string,
            function_string,
            array_prototype_shift_code,
            call_function_forward_varargs_code,
        };

        let native_context = bootstrap_native_context(&mut b, &roots);
        let native_slots = NativeContextSlot::ALL.map(|slot| {
            match b.objects.get(native_context.index()).map(|o| &o.body) {
                Some(HeapObjectBody::Context(body)) => body
                    .get(slot.index())
                    .and_then(Tagged::as_heap)
                    .unwrap_or(roots.undefined_value),
                _ => roots.undefined_value,
            }
        });

        Heap {
            objects: RwLock::new(b.objects),
            strings: Mutex::new(b.strings),
            roots,
            native_context,
            native_slots,
        }
    }
}

fn function_map_flags(slot: NativeContextSlot) -> MapFlags {
    let base = MapFlags::CALLABLE;
    match slot {
        NativeContextSlot::SloppyFunctionMap
        | NativeContextSlot::StrictFunctionMap
        | NativeContextSlot::ClassFunctionMap => {
            base | MapFlags::CONSTRUCTOR | MapFlags::HAS_PROTOTYPE_SLOT
        }
        NativeContextSlot::GeneratorFunctionMap => base | MapFlags::HAS_PROTOTYPE_SLOT,
        _ => base,
    }
}

fn bootstrap_native_context(b: &mut Bootstrap, roots: &ReadOnlyRoots) -> HeapAddr {
    let undefined = Tagged::from(roots.undefined_value);
    let tenured = Generation::Tenured;

    // Allocate the context first so closures can point at it.
    let mut slots = vec![undefined; NativeContextSlot::CONTEXT_LENGTH];
    slots[SCOPE_INFO_INDEX] = roots.empty_scope_info.into();
    let native = b.alloc(
        roots.native_context_map,
        tenured,
        HeapObjectBody::Context(ContextBody { slots }),
    );
    b.set_slot(native, NATIVE_CONTEXT_INDEX, native.into());

    let new_map = |b: &mut Bootstrap, map: Map| {
        b.alloc(roots.meta_map, tenured, HeapObjectBody::Map(map))
    };

    let global_proxy_map = new_map(b, Map::new(InstanceType::JsGlobalProxy, undefined));
    let global_proxy = b.alloc(global_proxy_map, tenured, HeapObjectBody::JsObject(empty_js_object(roots)));
    b.set_slot(native, NativeContextSlot::GlobalProxy.index(), global_proxy.into());

    let table = b.alloc(
        roots.script_context_table_map,
        tenured,
        HeapObjectBody::ScriptContextTable(Vec::new()),
    );
    b.set_slot(native, NativeContextSlot::ScriptContextTable.index(), table.into());

    let callee = b.internalize(roots.internalized_string_map, "callee");
    let sloppy_arguments = Map::new(InstanceType::JsObject, undefined)
        .with_inobject_properties(2)
        .with_field(roots.length_string, Representation::Tagged)
        .with_field(callee, Representation::Tagged);
    let fast_aliased_arguments = sloppy_arguments.clone();
    let strict_arguments = Map::new(InstanceType::JsObject, undefined)
        .with_inobject_properties(1)
        .with_field(roots.length_string, Representation::Tagged);
    for (slot, arguments) in [
        (NativeContextSlot::SloppyArgumentsMap, sloppy_arguments),
        (NativeContextSlot::StrictArgumentsMap, strict_arguments),
        (NativeContextSlot::FastAliasedArgumentsMap, fast_aliased_arguments),
    ] {
        let addr = new_map(b, arguments);
        b.set_slot(native, slot.index(), addr.into());
    }

    let mut array_maps = Vec::with_capacity(ElementsKind::FAST_KIND_COUNT);
    for kind in [
        ElementsKind::PackedSmi,
        ElementsKind::HoleySmi,
        ElementsKind::Packed,
        ElementsKind::Holey,
        ElementsKind::PackedDouble,
        ElementsKind::HoleyDouble,
    ] {
        let addr = new_map(
            b,
            Map::new(InstanceType::JsArray, undefined)
                .with_elements_kind(kind)
                .with_constant(roots.length_string),
        );
        if let Some(slot) = NativeContextSlot::initial_js_array_map(kind) {
            b.set_slot(native, slot.index(), addr.into());
        }
        array_maps.push(addr);
    }

    let mut function_maps = Vec::new();
    for slot in NativeContextSlot::ALL {
        if !NativeContextSlot::is_function_map_index(slot.index()) {
            continue;
        }
        let addr = new_map(
            b,
            Map::new(InstanceType::JsFunction, undefined).with_flags(function_map_flags(slot)),
        );
        b.set_slot(native, slot.index(), addr.into());
        function_maps.push((slot, addr));
    }
    let sloppy_function_map = function_maps
        .iter()
        .find(|(slot, _)| *slot == NativeContextSlot::SloppyFunctionMap)
        .map_or(roots.meta_map, |(_, addr)| *addr);

    let value = b.internalize(roots.internalized_string_map, "value");
    let done = b.internalize(roots.internalized_string_map, "done");
    let iterator_result = new_map(
        b,
        Map::new(InstanceType::JsObject, undefined)
            .with_inobject_properties(2)
            .with_field(value, Representation::Tagged)
            .with_field(done, Representation::HeapObject),
    );
    b.set_slot(native, NativeContextSlot::IteratorResultMap.index(), iterator_result.into());

    let array_name = b.internalize(roots.internalized_string_map, "Array");
    let array_shared = b.alloc(
        roots.shared_function_info_map,
        tenured,
        HeapObjectBody::SharedFunctionInfo(SharedFunctionInfoBody {
            formal_parameter_count: 1,
            native: true,
            builtin: Some(Builtin::ArrayConstructor),
            construct_as_builtin: true,
            ..SharedFunctionInfoBody::new(array_name, FunctionKind::Normal, LanguageMode::Sloppy)
        }),
    );
    let array_function = b.alloc(
        sloppy_function_map,
        tenured,
        HeapObjectBody::JsFunction(
            empty_js_object(roots),
            JsFunctionFields {
                shared: array_shared,
                context: native,
                initial_map: array_maps.first().copied(),
            },
        ),
    );
    b.set_slot(native, NativeContextSlot::ArrayFunction.index(), array_function.into());

    // Array maps point back at their constructor.
    for addr in array_maps {
        if let Some(map) = b.map_mut(addr) {
            map.set_constructor_or_backpointer(array_function.into());
        }
    }

    native
}

// =============================================================================
// Allocation
// =============================================================================

impl Heap {
    /// Allocate an object with an explicit map and generation.
    pub fn allocate(&self, map: HeapAddr, generation: Generation, body: HeapObjectBody) -> HeapAddr {
        let mut objects = self.objects.write();
        let addr = HeapAddr::from_raw(objects.len() as u32);
        objects.push(HeapObject { map, generation, body });
        addr
    }

    #[inline]
    fn allocate_young(&self, map: HeapAddr, body: HeapObjectBody) -> HeapAddr {
        self.allocate(map, Generation::Nursery, body)
    }

    /// Unique string for `value`.
    pub fn internalize(&self, value: &str) -> HeapAddr {
        let mut strings = self.strings.lock();
        if let Some(&addr) = strings.get(value) {
            return addr;
        }
        let value: Arc<str> = Arc::from(value);
        let addr = self.allocate(
            self.roots.internalized_string_map,
            Generation::Tenured,
            HeapObjectBody::String(Arc::clone(&value)),
        );
        strings.insert(value, addr);
        addr
    }

    /// Fresh, non-unique string.
    pub fn new_string(&self, value: &str) -> HeapAddr {
        self.allocate_young(self.roots.string_map, HeapObjectBody::String(Arc::from(value)))
    }

    /// Immutable boxed number.
    pub fn new_heap_number(&self, value: f64) -> HeapAddr {
        self.allocate_young(self.roots.heap_number_map, HeapObjectBody::Number(value))
    }

    /// Mutable boxed number.
    pub fn new_mutable_heap_number(&self, value: f64) -> HeapAddr {
        self.allocate_young(self.roots.mutable_heap_number_map, HeapObjectBody::Number(value))
    }

    /// Tagged storage; the empty fixed array for no values.
    pub fn new_fixed_array(&self, values: Vec<Tagged>) -> HeapAddr {
        if values.is_empty() {
            return self.roots.empty_fixed_array;
        }
        self.allocate_young(self.roots.fixed_array_map, HeapObjectBody::FixedArray(values))
    }

    /// Copy-on-write tagged storage.
    pub fn new_fixed_cow_array(&self, values: Vec<Tagged>) -> HeapAddr {
        self.allocate_young(self.roots.fixed_cow_array_map, HeapObjectBody::FixedArray(values))
    }

    /// Double storage; the empty fixed array for no values.
    pub fn new_fixed_double_array(&self, values: Vec<Option<f64>>) -> HeapAddr {
        if values.is_empty() {
            return self.roots.empty_fixed_array;
        }
        self.allocate_young(
            self.roots.fixed_double_array_map,
            HeapObjectBody::FixedDoubleArray(values),
        )
    }

    /// Out-of-object property storage.
    pub fn new_property_array(&self, values: Vec<Tagged>) -> HeapAddr {
        self.allocate_young(self.roots.property_array_map, HeapObjectBody::FixedArray(values))
    }

    /// Install a map.
    pub fn new_map(&self, map: Map) -> HeapAddr {
        self.allocate(self.roots.meta_map, Generation::Tenured, HeapObjectBody::Map(map))
    }

    /// Map for plain objects with the given in-object fields.
    pub fn new_object_map(
        &self,
        fields: &[(&str, Representation)],
        elements_kind: ElementsKind,
    ) -> HeapAddr {
        let mut map = Map::new(InstanceType::JsObject, self.roots.undefined_value.into())
            .with_elements_kind(elements_kind)
            .with_inobject_properties(fields.len() as u16);
        for (name, representation) in fields {
            map = map.with_field(self.internalize(name), *representation);
        }
        self.new_map(map)
    }

    /// Plain object with the given in-object field values and no elements.
    pub fn new_js_object(&self, map: HeapAddr, in_object: Vec<FieldValue>) -> HeapAddr {
        self.allocate_young(
            map,
            HeapObjectBody::JsObject(JsObjectBody {
                properties: self.roots.empty_fixed_array,
                elements: self.roots.empty_fixed_array,
                in_object,
            }),
        )
    }

    /// Array with the initial map for `kind`.
    pub fn new_js_array(&self, kind: ElementsKind, elements: HeapAddr, length: i32) -> HeapAddr {
        let slot = NativeContextSlot::initial_js_array_map(kind)
            .unwrap_or(NativeContextSlot::JsArrayHoleyElementsMap);
        let map = self.native_map(slot);
        self.allocate_young(
            map,
            HeapObjectBody::JsArray(
                JsObjectBody {
                    properties: self.roots.empty_fixed_array,
                    elements,
                    in_object: Vec::new(),
                },
                JsArrayFields { length: Tagged::smi(length) },
            ),
        )
    }

    /// Shared function info.
    pub fn new_shared_function_info(&self, body: SharedFunctionInfoBody) -> HeapAddr {
        self.allocate(
            self.roots.shared_function_info_map,
            Generation::Tenured,
            HeapObjectBody::SharedFunctionInfo(body),
        )
    }

    /// Closure over `context` with the function map matching the shared info.
    pub fn new_function(&self, shared: HeapAddr, context: HeapAddr) -> HeapAddr {
        let slot = self
            .shared_function_info(shared)
            .map(|info| NativeContextSlot::function_map(info.kind, info.language_mode))
            .unwrap_or(NativeContextSlot::SloppyFunctionMap);
        let map = self.native_map(slot);
        self.allocate_young(
            map,
            HeapObjectBody::JsFunction(
                JsObjectBody {
                    properties: self.roots.empty_fixed_array,
                    elements: self.roots.empty_fixed_array,
                    in_object: Vec::new(),
                },
                JsFunctionFields { shared, context, initial_map: None },
            ),
        )
    }

    /// Scope info for a scope with the given context-allocated locals.
    pub fn new_scope_info(&self, locals: &[(&str, VariableMode)]) -> HeapAddr {
        let context_locals = locals
            .iter()
            .map(|(name, mode)| ContextLocal { name: self.internalize(name), mode: *mode })
            .collect::<Vec<_>>();
        self.allocate(
            self.roots.scope_info_map,
            Generation::Tenured,
            HeapObjectBody::ScopeInfo(ScopeInfoBody {
                needs_context: !context_locals.is_empty(),
                context_locals,
            }),
        )
    }

    fn new_context(
        &self,
        map: HeapAddr,
        previous: HeapAddr,
        scope_info: HeapAddr,
        locals: Vec<Tagged>,
    ) -> HeapAddr {
        let mut slots = vec![Tagged::from(self.roots.undefined_value); MIN_CONTEXT_SLOTS];
        slots[SCOPE_INFO_INDEX] = scope_info.into();
        slots[PREVIOUS_INDEX] = previous.into();
        slots[NATIVE_CONTEXT_INDEX] = self.native_context.into();
        slots.extend(locals);
        self.allocate_young(map, HeapObjectBody::Context(ContextBody { slots }))
    }

    /// Function context chained to `previous`.
    pub fn new_function_context(
        &self,
        previous: HeapAddr,
        scope_info: HeapAddr,
        locals: Vec<Tagged>,
    ) -> HeapAddr {
        self.new_context(self.roots.function_context_map, previous, scope_info, locals)
    }

    /// Script context registered in the native context's script context table.
    pub fn new_script_context(&self, scope_info: HeapAddr, locals: Vec<Tagged>) -> HeapAddr {
        let context = self.new_context(
            self.roots.script_context_map,
            self.native_context,
            scope_info,
            locals,
        );
        let table = self.native_map(NativeContextSlot::ScriptContextTable);
        let mut objects = self.objects.write();
        if let Some(HeapObjectBody::ScriptContextTable(contexts)) =
            objects.get_mut(table.index()).map(|o| &mut o.body)
        {
            contexts.push(context);
        }
        context
    }

    /// Module with the given export and import cells.
    pub fn new_module(&self, regular_exports: Vec<HeapAddr>, regular_imports: Vec<HeapAddr>) -> HeapAddr {
        self.allocate(
            self.roots.module_map,
            Generation::Tenured,
            HeapObjectBody::Module(ModuleBody { regular_exports, regular_imports }),
        )
    }

    /// Cell holding `value`.
    pub fn new_cell(&self, value: Tagged) -> HeapAddr {
        self.allocate_young(self.roots.cell_map, HeapObjectBody::Cell(value))
    }

    /// Property cell for a global property.
    pub fn new_property_cell(&self, value: Tagged, details: PropertyDetails) -> HeapAddr {
        self.allocate(
            self.roots.property_cell_map,
            Generation::Tenured,
            HeapObjectBody::PropertyCell(PropertyCellBody { value, details }),
        )
    }

    /// Allocation site.
    pub fn new_allocation_site(&self, body: AllocationSiteBody) -> HeapAddr {
        self.allocate(
            self.roots.allocation_site_map,
            Generation::Tenured,
            HeapObjectBody::AllocationSite(body),
        )
    }

    // -------------------------------------------------------------------------
    // Native context
    // -------------------------------------------------------------------------

    /// Value of a named native context slot.
    pub fn native_context_slot(&self, slot: NativeContextSlot) -> Option<Tagged> {
        self.context(self.native_context)?.get(slot.index())
    }

    /// Bootstrap value of a named native context slot.
    #[inline]
    fn native_map(&self, slot: NativeContextSlot) -> HeapAddr {
        self.native_slots[slot as usize]
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_roots_are_typed() {
        let heap = Heap::new();
        let roots = heap.roots();
        assert_eq!(heap.instance_type_of(roots.empty_fixed_array), Some(InstanceType::FixedArray));
        assert_eq!(heap.instance_type_of(roots.length_string), Some(InstanceType::InternalizedString));
        assert_eq!(heap.instance_type_of(roots.native_context_map), Some(InstanceType::Map));
        assert_eq!(heap.code(roots.array_prototype_shift_code), Some(Builtin::ArrayPrototypeShift));
        assert!(heap.map(roots.undefined_map).unwrap().has(MapFlags::UNDETECTABLE));
        assert!(!heap.map(roots.boolean_map).unwrap().has(MapFlags::UNDETECTABLE));
    }

    #[test]
    fn test_bootstrap_map_constructors_are_undefined() {
        let heap = Heap::new();
        let roots = heap.roots();
        assert_eq!(
            heap.map(roots.heap_number_map).unwrap().constructor_or_backpointer(),
            Tagged::from(roots.undefined_value)
        );
    }

    #[test]
    fn test_native_context_slots() {
        let heap = Heap::new();
        let native = heap.native_context();
        assert_eq!(heap.instance_type_of(native), Some(InstanceType::NativeContext));
        for slot in NativeContextSlot::ALL {
            let value = heap.native_context_slot(slot).and_then(Tagged::as_heap);
            assert!(value.is_some(), "{slot:?} not initialized");
        }
        let proxy = heap.native_context_slot(NativeContextSlot::GlobalProxy).unwrap();
        assert_eq!(heap.instance_type(proxy), Some(InstanceType::JsGlobalProxy));
    }

    #[test]
    fn test_array_function_cycle() {
        let heap = Heap::new();
        let array_function = heap
            .native_context_slot(NativeContextSlot::ArrayFunction)
            .and_then(Tagged::as_heap)
            .unwrap();
        let fields = heap.js_function(array_function).unwrap();
        assert_eq!(fields.context, heap.native_context());
        let initial_map = fields.initial_map.unwrap();
        assert_eq!(
            heap.map(initial_map).unwrap().constructor_or_backpointer(),
            Tagged::from(array_function)
        );
        let shared = heap.shared_function_info(fields.shared).unwrap();
        assert_eq!(shared.builtin, Some(Builtin::ArrayConstructor));
    }

    #[test]
    fn test_internalize_is_unique() {
        let heap = Heap::new();
        let a = heap.internalize("x");
        let b = heap.internalize("x");
        assert_eq!(a, b);
        assert_eq!(heap.internalize("length"), heap.roots().length_string);
        assert_ne!(heap.new_string("x"), heap.new_string("x"));
    }

    #[test]
    fn test_empty_storage_is_shared() {
        let heap = Heap::new();
        assert_eq!(heap.new_fixed_array(vec![]), heap.roots().empty_fixed_array);
        assert_eq!(heap.new_fixed_double_array(vec![]), heap.roots().empty_fixed_array);
        assert_ne!(heap.new_fixed_array(vec![Tagged::smi(1)]), heap.roots().empty_fixed_array);
    }

    #[test]
    fn test_new_function_picks_map_by_kind() {
        let heap = Heap::new();
        let name = heap.internalize("f");
        let arrow = heap.new_shared_function_info(SharedFunctionInfoBody::new(
            name,
            FunctionKind::Arrow,
            LanguageMode::Strict,
        ));
        let f = heap.new_function(arrow, heap.native_context());
        let map = heap.map_of(f).unwrap();
        assert_eq!(
            Some(Tagged::from(map)),
            heap.native_context_slot(NativeContextSlot::StrictFunctionWithoutPrototypeMap)
        );
        assert!(!heap.map(map).unwrap().has(MapFlags::CONSTRUCTOR));
    }

    #[test]
    fn test_script_context_registered() {
        let heap = Heap::new();
        let scope = heap.new_scope_info(&[("x", VariableMode::Const)]);
        let context = heap.new_script_context(scope, vec![Tagged::smi(1)]);
        let table = heap
            .native_context_slot(NativeContextSlot::ScriptContextTable)
            .and_then(Tagged::as_heap)
            .unwrap();
        assert_eq!(&*heap.script_context_table(table).unwrap(), &[context]);
        assert_eq!(heap.context_previous(context), Some(heap.native_context()));
    }

    #[test]
    fn test_new_js_array_uses_initial_map() {
        let heap = Heap::new();
        let elements = heap.new_fixed_double_array(vec![Some(1.0)]);
        let array = heap.new_js_array(ElementsKind::PackedDouble, elements, 1);
        let map = heap.map_of(array).unwrap();
        assert_eq!(heap.map(map).unwrap().elements_kind(), ElementsKind::PackedDouble);
        assert_eq!(heap.js_array(array).unwrap().length, Tagged::smi(1));
    }
}
