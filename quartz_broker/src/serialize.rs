//! Capture of heap objects into descriptors.
//!
//! Each capture copies what it needs out of the heap first and only then
//! resolves dependencies, so no heap read guard is held across a nested
//! capture. Nested captures may migrate objects, which takes the write lock.

use quartz_heap::object::NATIVE_CONTEXT_INDEX;
use quartz_heap::{FieldValue, HeapAddr, InstanceType, NativeContextSlot, Tagged};

use crate::access::CaptureScope;
use crate::broker::JsHeapBroker;
use crate::data::{
    AllocationSiteData, CapturedField, ContextData, DataBody, DataId, HeapObjectData,
    JsFunctionData, JsObjectData, JsObjectKind, MapData, ModuleData, NativeContextData,
    ObjectData, ObjectDataKind, PropertyCellData, ScopeInfoData, SharedFunctionInfoData,
};
use crate::error::{BrokerViolation, OrFatal};
use crate::literal::{FastLiteralBudget, is_fast_literal};

/// Register `object`, capture it and everything it references, and install
/// its descriptor.
pub(crate) fn serialize(broker: &JsHeapBroker, scope: CaptureScope<'_>, object: Tagged) -> DataId {
    let id = broker.reserve(object);
    let kind = match object {
        Tagged::Smi(_) => ObjectDataKind::Smi,
        Tagged::Heap(addr) => ObjectDataKind::HeapObject(serialize_heap_object(broker, scope, addr)),
    };
    broker.install(id, ObjectData::new(object, kind));
    id
}

fn mismatch(addr: HeapAddr, expected: &'static str) -> impl FnOnce() -> BrokerViolation {
    move || BrokerViolation::KindMismatch { object: addr.into(), expected }
}

fn unresolved(addr: HeapAddr, dependency: &'static str) -> impl FnOnce() -> BrokerViolation {
    move || BrokerViolation::UnresolvedDependency { object: addr.into(), dependency }
}

fn serialize_heap_object(
    broker: &JsHeapBroker,
    scope: CaptureScope<'_>,
    addr: HeapAddr,
) -> HeapObjectData {
    let heap = scope.heap();
    // Objects are captured with their current map. A failed migration keeps
    // the deprecated one.
    if heap.is_js_object(addr.into()) {
        heap.try_migrate_instance(addr);
    }
    let map_addr = heap.map_of(addr).or_fatal(unresolved(addr, "map"));
    let ty = broker.heap_object_type_from_map(heap, map_addr);
    let map = broker.resolve(scope, map_addr.into());

    let body = match ty.instance_type() {
        InstanceType::Map => serialize_map(broker, scope, addr),
        InstanceType::Oddball => {
            DataBody::Oddball(heap.oddball(addr).or_fatal(mismatch(addr, "Oddball")).kind)
        }
        InstanceType::HeapNumber => {
            DataBody::HeapNumber(heap.number_value(addr).or_fatal(mismatch(addr, "HeapNumber")))
        }
        InstanceType::MutableHeapNumber => DataBody::MutableHeapNumber(
            heap.number_value(addr).or_fatal(mismatch(addr, "MutableHeapNumber")),
        ),
        InstanceType::String | InstanceType::InternalizedString => {
            DataBody::String(heap.string(addr).or_fatal(mismatch(addr, "String")))
        }
        InstanceType::FixedArray | InstanceType::PropertyArray => {
            let values = heap
                .fixed_array(addr)
                .map(|values| values.to_vec())
                .or_fatal(mismatch(addr, "FixedArray"));
            DataBody::FixedArray(resolve_all(broker, scope, values))
        }
        InstanceType::FixedDoubleArray => DataBody::FixedDoubleArray(
            heap.fixed_double_array(addr)
                .map(|values| values.to_vec())
                .or_fatal(mismatch(addr, "FixedDoubleArray")),
        ),
        InstanceType::JsObject
        | InstanceType::JsArray
        | InstanceType::JsFunction
        | InstanceType::JsGlobalProxy => serialize_js_object(broker, scope, addr, ty.instance_type()),
        InstanceType::Context | InstanceType::NativeContext => serialize_context(
            broker,
            scope,
            addr,
            ty.instance_type() == InstanceType::NativeContext,
        ),
        InstanceType::ScriptContextTable => {
            let contexts = heap
                .script_context_table(addr)
                .map(|table| table.iter().map(|&c| Tagged::from(c)).collect::<Vec<_>>())
                .or_fatal(mismatch(addr, "ScriptContextTable"));
            DataBody::ScriptContextTable(resolve_all(broker, scope, contexts))
        }
        InstanceType::ScopeInfo => {
            let (context_length, locals) = heap
                .scope_info(addr)
                .map(|info| (info.context_length(), info.context_locals.clone()))
                .or_fatal(mismatch(addr, "ScopeInfo"));
            DataBody::ScopeInfo(ScopeInfoData {
                context_length,
                locals: locals
                    .into_iter()
                    .map(|local| (broker.resolve(scope, local.name.into()), local.mode))
                    .collect(),
            })
        }
        InstanceType::SharedFunctionInfo => serialize_shared_function_info(broker, scope, addr),
        InstanceType::Module => {
            let (exports, imports) = heap
                .module(addr)
                .map(|module| (module.regular_exports.clone(), module.regular_imports.clone()))
                .or_fatal(mismatch(addr, "Module"));
            let resolve_cells = |cells: Vec<HeapAddr>| -> Vec<DataId> {
                cells.into_iter().map(|c| broker.resolve(scope, c.into())).collect()
            };
            DataBody::Module(ModuleData {
                exports: resolve_cells(exports),
                imports: resolve_cells(imports),
            })
        }
        InstanceType::Cell => {
            let value = heap.cell(addr).or_fatal(mismatch(addr, "Cell"));
            DataBody::Cell(broker.resolve(scope, value))
        }
        InstanceType::PropertyCell => {
            let cell = heap.property_cell(addr).or_fatal(mismatch(addr, "PropertyCell"));
            DataBody::PropertyCell(PropertyCellData {
                value: broker.resolve(scope, cell.value),
                details: cell.details,
            })
        }
        InstanceType::AllocationSite => serialize_allocation_site(broker, scope, addr),
        InstanceType::Code => DataBody::Code(heap.code(addr).or_fatal(mismatch(addr, "Code"))),
    };

    HeapObjectData::new(ty, map, body)
}

fn resolve_all(broker: &JsHeapBroker, scope: CaptureScope<'_>, values: Vec<Tagged>) -> Vec<DataId> {
    values.into_iter().map(|value| broker.resolve(scope, value)).collect()
}

fn serialize_map(broker: &JsHeapBroker, scope: CaptureScope<'_>, addr: HeapAddr) -> DataBody {
    let heap = scope.heap();
    let map = heap.map(addr).map(|map| map.clone()).or_fatal(mismatch(addr, "Map"));
    let keys = map
        .descriptors()
        .iter()
        .map(|entry| broker.resolve(scope, entry.key.into()))
        .collect();
    let constructor_or_backpointer = broker.resolve(scope, map.constructor_or_backpointer());
    DataBody::Map(Box::new(MapData {
        keys,
        constructor_or_backpointer,
        is_fixed_cow_array_map: addr == heap.roots().fixed_cow_array_map,
        map,
    }))
}

fn serialize_js_object(
    broker: &JsHeapBroker,
    scope: CaptureScope<'_>,
    addr: HeapAddr,
    instance_type: InstanceType,
) -> DataBody {
    let heap = scope.heap();
    let (properties, elements, fields) = heap
        .js_object(addr)
        .map(|object| (object.properties, object.elements, object.in_object.clone()))
        .or_fatal(mismatch(addr, "JsObject"));

    let kind = match instance_type {
        InstanceType::JsArray => {
            let array = heap.js_array(addr).or_fatal(mismatch(addr, "JsArray"));
            JsObjectKind::Array { length: broker.resolve(scope, array.length) }
        }
        InstanceType::JsFunction => JsObjectKind::Function(serialize_function(broker, scope, addr)),
        InstanceType::JsGlobalProxy => JsObjectKind::GlobalProxy,
        _ => JsObjectKind::Plain,
    };

    DataBody::JsObject(Box::new(JsObjectData {
        properties: broker.resolve(scope, properties.into()),
        elements: broker.resolve(scope, elements.into()),
        in_object: fields
            .into_iter()
            .map(|field| match field {
                FieldValue::Tagged(value) => CapturedField::Tagged(broker.resolve(scope, value)),
                FieldValue::Double(value) => CapturedField::Double(value),
            })
            .collect(),
        kind,
    }))
}

fn serialize_function(
    broker: &JsHeapBroker,
    scope: CaptureScope<'_>,
    addr: HeapAddr,
) -> JsFunctionData {
    let heap = scope.heap();
    let function = heap.js_function(addr).or_fatal(mismatch(addr, "JsFunction"));
    let native = heap
        .context(function.context)
        .and_then(|context| context.get(NATIVE_CONTEXT_INDEX))
        .and_then(Tagged::as_heap)
        .or_fatal(unresolved(addr, "native context"));
    let global_proxy = heap
        .context(native)
        .and_then(|context| context.get(NativeContextSlot::GlobalProxy.index()))
        .or_fatal(unresolved(addr, "global proxy"));

    JsFunctionData {
        shared: broker.resolve(scope, function.shared.into()),
        context: broker.resolve(scope, function.context.into()),
        initial_map: function.initial_map.map(|map| broker.resolve(scope, map.into())),
        global_proxy: broker.resolve(scope, global_proxy),
    }
}

fn serialize_context(
    broker: &JsHeapBroker,
    scope: CaptureScope<'_>,
    addr: HeapAddr,
    is_native: bool,
) -> DataBody {
    let slots = scope
        .heap()
        .context(addr)
        .map(|context| context.slots.clone())
        .or_fatal(mismatch(addr, "Context"));
    let slots = resolve_all(broker, scope, slots);
    let native = if is_native {
        let sloppy_arguments_map = slots
            .get(NativeContextSlot::SloppyArgumentsMap.index())
            .copied()
            .or_fatal(unresolved(addr, "sloppy arguments map"));
        Some(NativeContextData { sloppy_arguments_map })
    } else {
        None
    };
    DataBody::Context(ContextData { slots, native })
}

fn serialize_shared_function_info(
    broker: &JsHeapBroker,
    scope: CaptureScope<'_>,
    addr: HeapAddr,
) -> DataBody {
    let shared = scope
        .heap()
        .shared_function_info(addr)
        .map(|shared| shared.clone())
        .or_fatal(mismatch(addr, "SharedFunctionInfo"));
    let name = broker.resolve(scope, shared.name.into());
    DataBody::SharedFunctionInfo(Box::new(SharedFunctionInfoData::from_body(&shared, name)))
}

fn serialize_allocation_site(
    broker: &JsHeapBroker,
    scope: CaptureScope<'_>,
    addr: HeapAddr,
) -> DataBody {
    let heap = scope.heap();
    let site = heap.allocation_site(addr).or_fatal(mismatch(addr, "AllocationSite"));

    // Classify before capturing the boilerplate: classification may migrate
    // it, and the captured maps must be the migrated ones.
    let is_fast_literal = site.boilerplate.is_some_and(|boilerplate| {
        is_fast_literal(heap, boilerplate, &mut FastLiteralBudget::default())
    });

    DataBody::AllocationSite(AllocationSiteData {
        boilerplate: site.boilerplate.map(|b| broker.resolve(scope, b.into())),
        nested_site: site.nested_site.map(|s| broker.resolve(scope, s.into())),
        elements_kind: site.elements_kind,
        pretenure: site.pretenure,
        can_inline_call: site.can_inline_call,
        is_fast_literal,
    })
}
