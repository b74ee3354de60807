//! JS object family: plain objects, arrays, functions and the global proxy.

use quartz_heap::object::NATIVE_CONTEXT_INDEX;
use quartz_heap::{
    BuiltinFunctionId, ElementsKind, FieldIndex, FieldValue, JsFunctionFields, NativeContextSlot,
    Tagged,
};

use super::{ContextRef, FixedArrayBaseRef, HeapObjectRef, MapRef, ObjectRef, SharedFunctionInfoRef};
use crate::data::{CapturedField, DataBody, DataId, JsFunctionData, JsObjectData, JsObjectKind};
use crate::error::{BrokerViolation, OrFatal, fatal};

define_ref! {
    /// Facade for any JS object.
    JsObjectRef => HeapObjectRef
}

define_ref! {
    JsArrayRef => JsObjectRef
}

define_ref! {
    /// Facade for a closure.
    JsFunctionRef => JsObjectRef
}

define_ref! {
    JsGlobalProxyRef => JsObjectRef
}

/// A field value read either live or from a descriptor.
enum FieldRead {
    Live(FieldValue),
    Captured(CapturedField),
}

// =============================================================================
// JsObjectRef
// =============================================================================

impl<'b> JsObjectRef<'b> {
    fn with_data<R>(&self, f: impl FnOnce(&JsObjectData) -> Option<R>) -> R {
        self.body("JsObject", |body| match body {
            DataBody::JsObject(object) => f(object),
            _ => None,
        })
    }

    /// Indexed backing storage.
    pub fn elements(&self) -> FixedArrayBaseRef<'b> {
        let elements = match self.live() {
            Some(heap) => {
                let elements = heap
                    .js_object(self.address())
                    .map(|object| object.elements)
                    .or_fatal(|| self.mismatch("JsObject"));
                self.live_sibling(elements.into())
            }
            None => self.sibling(self.with_data(|object| Some(object.elements))),
        };
        elements.as_fixed_array_base()
    }

    pub fn elements_kind(&self) -> ElementsKind {
        self.map().elements_kind()
    }

    /// Check if the field at `index` is stored as a raw double in the object.
    #[inline]
    pub fn is_unboxed_double_field(&self, index: FieldIndex) -> bool {
        index.in_object && index.is_double
    }

    fn field(&self, index: FieldIndex) -> FieldRead {
        let out_of_bounds = || self.out_of_bounds(i64::from(index.property_index));
        if let Some(slot) = index.outobject_index() {
            let properties = match self.live() {
                Some(heap) => {
                    let properties = heap
                        .js_object(self.address())
                        .map(|object| object.properties)
                        .or_fatal(|| self.mismatch("JsObject"));
                    self.live_sibling(properties.into())
                }
                None => self.sibling(self.with_data(|object| Some(object.properties))),
            };
            let value = properties.as_fixed_array().get(slot);
            return match self.live() {
                Some(_) => FieldRead::Live(FieldValue::Tagged(value.object())),
                None => FieldRead::Captured(CapturedField::Tagged(value.data_id())),
            };
        }

        let slot = index.property_index as usize;
        match self.live() {
            Some(heap) => FieldRead::Live(
                heap.js_object(self.address())
                    .and_then(|object| object.in_object.get(slot).copied())
                    .or_fatal(out_of_bounds),
            ),
            None => FieldRead::Captured(
                self.with_data(|object| Some(object.in_object.get(slot).copied()))
                    .or_fatal(out_of_bounds),
            ),
        }
    }

    /// Tagged value of a fast-mode field. Fatal for unboxed doubles.
    pub fn raw_fast_property_at(&self, index: FieldIndex) -> ObjectRef<'b> {
        match self.field(index) {
            FieldRead::Live(FieldValue::Tagged(value)) => self.live_sibling(value),
            FieldRead::Captured(CapturedField::Tagged(id)) => self.sibling(id),
            _ => fatal_field(self.object(), "tagged field"),
        }
    }

    /// Raw double of an unboxed double field. Fatal for tagged fields.
    pub fn raw_fast_double_property_at(&self, index: FieldIndex) -> f64 {
        match self.field(index) {
            FieldRead::Live(FieldValue::Double(value))
            | FieldRead::Captured(CapturedField::Double(value)) => value,
            _ => fatal_field(self.object(), "double field"),
        }
    }

    /// Move the elements backing store to the old generation.
    ///
    /// Needs live heap access. The store keeps its identity, so descriptors
    /// that reference it stay valid.
    pub fn ensure_elements_tenured(&self) {
        let heap = self.broker().live_heap();
        let elements = self.elements().address();
        heap.promote(elements);
    }
}

fn fatal_field(object: Tagged, expected: &'static str) -> ! {
    fatal(BrokerViolation::KindMismatch { object, expected })
}

// =============================================================================
// JsArrayRef
// =============================================================================

impl<'b> JsArrayRef<'b> {
    /// The `length` property, a Smi or a heap number.
    pub fn length(&self) -> ObjectRef<'b> {
        match self.live() {
            Some(heap) => {
                let array = heap.js_array(self.address()).or_fatal(|| self.mismatch("JsArray"));
                self.live_sibling(array.length)
            }
            None => {
                let id = self.with_data(|object| match object.kind {
                    JsObjectKind::Array { length } => Some(length),
                    _ => None,
                });
                self.sibling(id)
            }
        }
    }
}

// =============================================================================
// JsFunctionRef
// =============================================================================

/// Function fields as facades-to-be: live addresses or descriptor ids.
enum FunctionRead {
    Live(JsFunctionFields),
    Captured(JsFunctionData),
}

impl<'b> JsFunctionRef<'b> {
    fn read(&self) -> FunctionRead {
        match self.live() {
            Some(heap) => FunctionRead::Live(
                heap.js_function(self.address()).or_fatal(|| self.mismatch("JsFunction")),
            ),
            None => FunctionRead::Captured(self.with_data(|object| match &object.kind {
                JsObjectKind::Function(function) => Some(function.clone()),
                _ => None,
            })),
        }
    }

    fn resolve(
        &self,
        live: impl FnOnce(&JsFunctionFields) -> Tagged,
        captured: impl FnOnce(&JsFunctionData) -> DataId,
    ) -> ObjectRef<'b> {
        match self.read() {
            FunctionRead::Live(fields) => self.live_sibling(live(&fields)),
            FunctionRead::Captured(data) => self.sibling(captured(&data)),
        }
    }

    pub fn shared(&self) -> SharedFunctionInfoRef<'b> {
        self.resolve(|f| f.shared.into(), |d| d.shared).as_shared_function_info()
    }

    pub fn context(&self) -> ContextRef<'b> {
        self.resolve(|f| f.context.into(), |d| d.context).as_context()
    }

    pub fn has_initial_map(&self) -> bool {
        match self.read() {
            FunctionRead::Live(fields) => fields.initial_map.is_some(),
            FunctionRead::Captured(data) => data.initial_map.is_some(),
        }
    }

    /// Map of objects constructed by this function. Fatal if there is none.
    pub fn initial_map(&self) -> MapRef<'b> {
        let map = match self.read() {
            FunctionRead::Live(fields) => fields.initial_map.map(|map| self.live_sibling(map.into())),
            FunctionRead::Captured(data) => data.initial_map.map(|id| self.sibling(id)),
        };
        map.or_fatal(|| BrokerViolation::UnresolvedDependency {
            object: self.object(),
            dependency: "initial map",
        })
        .as_map()
    }

    /// Callable with `new`.
    pub fn is_constructor(&self) -> bool {
        self.map().is_constructor()
    }

    /// Global proxy of the function's native context.
    pub fn global_proxy(&self) -> JsGlobalProxyRef<'b> {
        let proxy = match self.read() {
            FunctionRead::Live(fields) => {
                let heap = self.live().or_fatal(|| self.mismatch("JsFunction"));
                let proxy = heap
                    .context(fields.context)
                    .and_then(|context| context.get(NATIVE_CONTEXT_INDEX))
                    .and_then(Tagged::as_heap)
                    .and_then(|native| {
                        heap.context(native)
                            .and_then(|context| context.get(NativeContextSlot::GlobalProxy.index()))
                    })
                    .or_fatal(|| BrokerViolation::UnresolvedDependency {
                        object: self.object(),
                        dependency: "global proxy",
                    });
                self.live_sibling(proxy)
            }
            FunctionRead::Captured(data) => self.sibling(data.global_proxy),
        };
        proxy.as_js_global_proxy()
    }

    pub fn has_builtin_function_id(&self) -> bool {
        self.shared().has_builtin_function_id()
    }

    /// Builtin function id of the shared info. Fatal if there is none.
    pub fn builtin_function_id(&self) -> BuiltinFunctionId {
        self.shared().builtin_function_id()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::testing::brokers;
    use crate::{BrokerConfig, BrokerMode, JsHeapBroker};
    use quartz_heap::{
        ElementsKind, FieldValue, FunctionKind, Generation, Heap, LanguageMode, Representation,
        SharedFunctionInfoBody, Tagged,
    };
    use std::sync::Arc;

    #[test]
    fn test_fields_and_elements() {
        let heap = Arc::new(Heap::new());
        let map = heap.new_object_map(
            &[("t", Representation::Tagged), ("d", Representation::Double)],
            ElementsKind::PackedSmi,
        );
        let name = heap.new_string("value");
        let object =
            heap.new_js_object(map, vec![FieldValue::Tagged(name.into()), FieldValue::Double(0.25)]);
        let elements = heap.new_fixed_array(vec![Tagged::smi(7)]);
        assert!(heap.set_elements(object, elements));
        for broker in brokers(&heap, &[object.into()]) {
            let object = broker.object_ref(object.into()).as_js_object();
            let map = object.map();
            let tagged = map.field_index_for(0).unwrap();
            let double = map.field_index_for(1).unwrap();

            assert!(!object.is_unboxed_double_field(tagged));
            assert!(object.is_unboxed_double_field(double));
            assert_eq!(object.raw_fast_property_at(tagged).object(), Tagged::from(name));
            assert_eq!(object.raw_fast_double_property_at(double), 0.25);

            assert_eq!(object.elements_kind(), ElementsKind::PackedSmi);
            let elements = object.elements();
            assert_eq!(elements.length(), 1);
            assert_eq!(elements.as_fixed_array().get(0).as_smi(), 7);
        }
    }

    #[test]
    fn test_array_length() {
        let heap = Arc::new(Heap::new());
        let elements = heap.new_fixed_array(vec![Tagged::smi(1), Tagged::smi(2)]);
        let array = heap.new_js_array(ElementsKind::PackedSmi, elements, 2);
        for broker in brokers(&heap, &[array.into()]) {
            let array = broker.object_ref(array.into()).as_js_array();
            assert_eq!(array.length().as_smi(), 2);
            assert_eq!(array.elements_kind(), ElementsKind::PackedSmi);
            assert!(array.map().is_js_array_map());
        }
    }

    #[test]
    fn test_array_function() {
        for broker in brokers(&Arc::new(Heap::new()), &[]) {
            let native = broker.native_context();
            let array_function = native.array_function();

            assert!(array_function.has_initial_map());
            assert_eq!(
                array_function.initial_map(),
                native.initial_js_array_map(ElementsKind::PackedSmi)
            );
            assert!(array_function.is_constructor());
            assert_eq!(array_function.context(), *native);
            assert_eq!(array_function.global_proxy(), native.global_proxy());
            assert!(array_function.shared().native());
            assert!(!array_function.has_builtin_function_id());
        }
    }

    #[test]
    fn test_closure_with_builtin_function_id() {
        let heap = Arc::new(Heap::new());
        let name = heap.internalize("push");
        let mut body = SharedFunctionInfoBody::new(name, FunctionKind::Method, LanguageMode::Strict);
        body.function_id = Some(quartz_heap::BuiltinFunctionId::ArrayPush);
        let shared = heap.new_shared_function_info(body);
        let function = heap.new_function(shared, heap.native_context());
        for broker in brokers(&heap, &[function.into()]) {
            let function = broker.object_ref(function.into()).as_js_function();
            assert!(!function.has_initial_map());
            assert!(!function.is_constructor());
            assert!(function.has_builtin_function_id());
            assert_eq!(
                function.builtin_function_id(),
                quartz_heap::BuiltinFunctionId::ArrayPush
            );
            assert_eq!(function.shared().name().value().as_ref(), "push");
        }
    }

    #[test]
    fn test_ensure_elements_tenured() {
        // Promotion writes to the heap, so only the live modes can run it.
        for config in [BrokerConfig::default(), BrokerConfig::concurrent()] {
            let heap = Arc::new(Heap::new());
            let map = heap.new_object_map(&[], ElementsKind::PackedSmi);
            let object = heap.new_js_object(map, vec![]);
            let elements = heap.new_fixed_array(vec![Tagged::smi(1)]);
            assert!(heap.set_elements(object, elements));
            assert_eq!(heap.generation_of(elements), Some(Generation::Nursery));
            let broker = JsHeapBroker::new(Arc::clone(&heap), config);

            let object = broker.object_ref(object.into()).as_js_object();
            let before = object.elements();
            object.ensure_elements_tenured();
            assert_eq!(heap.generation_of(elements), Some(Generation::Tenured));
            assert_eq!(object.elements(), before);
        }
    }

    #[test]
    #[should_panic(expected = "live heap access is not allowed in serialized mode")]
    fn test_ensure_elements_tenured_needs_live_heap() {
        let heap = Arc::new(Heap::new());
        let map = heap.new_object_map(&[], ElementsKind::PackedSmi);
        let object = heap.new_js_object(map, vec![]);
        let mut broker = JsHeapBroker::new(heap, BrokerConfig::concurrent());
        broker.get_or_create_data(object.into());
        broker.stop_serializing();
        assert_eq!(broker.mode(), BrokerMode::Serialized);
        broker.object_ref(object.into()).as_js_object().ensure_elements_tenured();
    }

    #[test]
    #[should_panic(expected = "is not a double field")]
    fn test_double_read_of_tagged_field_is_fatal() {
        let heap = Arc::new(Heap::new());
        let map = heap.new_object_map(&[("t", Representation::Smi)], ElementsKind::Holey);
        let object = heap.new_js_object(map, vec![FieldValue::Tagged(Tagged::smi(1))]);
        let broker = JsHeapBroker::new(heap, BrokerConfig::default());
        let object = broker.object_ref(object.into()).as_js_object();
        let index = object.map().field_index_for(0).unwrap();
        object.raw_fast_double_property_at(index);
    }
}
