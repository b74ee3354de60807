//! End-to-end tests of the capture / hand-off cycle.
//!
//! The main thread captures descriptors, stops serializing and hands the
//! broker to a compiler thread, which must then get every answer from the
//! snapshot while the main thread keeps mutating the heap.
//!
//! Coverage:
//! - Hand-off across threads with concurrent heap mutation
//! - Snapshot immutability and identity uniqueness
//! - Identical answers in `Disabled` and `Serialized` modes
//! - Fast-literal classification through allocation sites
//! - Fatal violations

use std::sync::{Arc, mpsc};
use std::thread;

use quartz_broker::{
    BrokerConfig, BrokerMode, FastLiteralBudget, JsHeapBroker, OddballType, is_fast_literal,
};
use quartz_heap::{
    AllocationSiteBody, ElementsKind, FieldValue, Heap, HeapAddr, PretenureMode, Representation,
    Tagged,
};

// =============================================================================
// Helpers
// =============================================================================

/// Object `{ a: 1, b: 2 }` with elements `[1, 2, 3]`.
fn small_literal(heap: &Heap) -> HeapAddr {
    let map = heap.new_object_map(
        &[("a", Representation::Smi), ("b", Representation::Smi)],
        ElementsKind::PackedSmi,
    );
    let object = heap.new_js_object(
        map,
        vec![FieldValue::Tagged(Tagged::smi(1)), FieldValue::Tagged(Tagged::smi(2))],
    );
    let elements = heap.new_fixed_array(vec![Tagged::smi(1), Tagged::smi(2), Tagged::smi(3)]);
    assert!(heap.set_elements(object, elements));
    object
}

/// Object with one tagged field holding `value`.
fn wrap(heap: &Heap, value: HeapAddr) -> HeapAddr {
    let map = heap.new_object_map(&[("f", Representation::HeapObject)], ElementsKind::Holey);
    heap.new_js_object(map, vec![FieldValue::Tagged(value.into())])
}

/// Four objects deep: `root.f.f.f.x`.
fn deep_literal(heap: &Heap) -> HeapAddr {
    let leaf_map = heap.new_object_map(&[("x", Representation::Smi)], ElementsKind::Holey);
    let leaf = heap.new_js_object(leaf_map, vec![FieldValue::Tagged(Tagged::smi(0))]);
    let level2 = wrap(heap, leaf);
    let level1 = wrap(heap, level2);
    wrap(heap, level1)
}

fn literal_site(heap: &Heap, boilerplate: HeapAddr) -> HeapAddr {
    heap.new_allocation_site(AllocationSiteBody {
        boilerplate: Some(boilerplate),
        elements_kind: ElementsKind::PackedSmi,
        nested_site: None,
        pretenure: PretenureMode::NotTenured,
        can_inline_call: false,
    })
}

/// Capture `objects` with a concurrent broker, then stop serializing.
fn serialized_broker(heap: &Arc<Heap>, objects: &[Tagged]) -> JsHeapBroker {
    let mut broker = JsHeapBroker::new(Arc::clone(heap), BrokerConfig::concurrent());
    broker.serialize_standard_objects();
    for &object in objects {
        broker.get_or_create_data(object);
    }
    broker.stop_serializing();
    broker
}

// =============================================================================
// Hand-off
// =============================================================================

#[test]
fn test_handoff_to_compiler_thread() {
    let heap = Arc::new(Heap::new());
    let object = small_literal(&heap);
    let site = literal_site(&heap, object);
    let array_function = heap.native_context_slot(quartz_heap::NativeContextSlot::ArrayFunction);
    let array_function = array_function.expect("bootstrap installs the Array function");

    let broker = serialized_broker(&heap, &[site.into(), array_function]);
    assert_eq!(broker.mode(), BrokerMode::Serialized);

    let (tx, rx) = mpsc::channel();
    let compiler = thread::spawn(move || {
        let site = broker.object_ref(site.into()).as_allocation_site();
        let boilerplate = site.boilerplate().expect("literal site");
        let index = boilerplate.map().field_index_for(0).expect("field");
        let function = broker.object_ref(array_function).as_js_function();
        tx.send((
            site.is_fast_literal(),
            boilerplate.raw_fast_property_at(index).as_smi(),
            boilerplate.elements().length(),
            function.shared().native(),
            function.shared().name().value().to_string(),
        ))
        .expect("receiver alive");
    });

    // The main thread keeps running the program meanwhile.
    for i in 0..100 {
        heap.set_field(object, 0, FieldValue::Tagged(Tagged::smi(i)));
    }

    let answers = rx.recv().expect("compiler thread reports");
    compiler.join().expect("compiler thread finishes");
    assert_eq!(answers, (true, 1, 3, true, "Array".to_string()));
}

#[test]
fn test_snapshot_ignores_later_mutation() {
    let heap = Arc::new(Heap::new());
    let object = small_literal(&heap);
    let cell = heap.new_cell(Tagged::smi(10));
    let broker = serialized_broker(&heap, &[object.into(), cell.into()]);

    let elements = heap.new_fixed_array(vec![Tagged::smi(9)]);
    assert!(heap.set_elements(object, elements));
    assert!(heap.set_field(object, 1, FieldValue::Tagged(Tagged::smi(99))));
    assert!(heap.set_cell_value(cell, Tagged::smi(11)));

    let object = broker.object_ref(object.into()).as_js_object();
    let index = object.map().field_index_for(1).expect("field");
    assert_eq!(object.raw_fast_property_at(index).as_smi(), 2);
    assert_eq!(object.elements().length(), 3);
    assert_eq!(broker.object_ref(cell.into()).as_cell().value().as_smi(), 10);
}

#[test]
fn test_identity_is_unique() {
    let heap = Arc::new(Heap::new());
    let object = small_literal(&heap);
    let broker = serialized_broker(&heap, &[object.into()]);
    let count = broker.descriptor_count();

    let a = broker.object_ref(object.into());
    let b = broker.object_ref(object.into());
    assert_eq!(a, b);
    assert_eq!(a.data_id(), b.data_id());
    assert_eq!(a.as_js_object().map(), b.as_heap_object().map());
    assert_eq!(broker.descriptor_count(), count);
}

// =============================================================================
// Mode uniformity
// =============================================================================

#[test]
fn test_disabled_and_serialized_agree() {
    let summarize = |config: BrokerConfig| {
        let heap = Arc::new(Heap::new());
        let object = small_literal(&heap);
        let site = literal_site(&heap, object);
        let mut broker = JsHeapBroker::new(heap, config);
        if broker.serializing_allowed() {
            broker.serialize_standard_objects();
            broker.get_or_create_data(site.into());
            broker.get_or_create_data(broker.roots().null_value.into());
            broker.get_or_create_data(broker.roots().undefined_value.into());
            broker.stop_serializing();
        }

        let site = broker.object_ref(site.into()).as_allocation_site();
        let boilerplate = site.boilerplate().expect("literal site");
        let map = boilerplate.map();
        let null = broker.object_ref(broker.roots().null_value.into());
        let undefined = broker.object_ref(broker.roots().undefined_value.into());
        (
            site.is_fast_literal(),
            map.inobject_properties(),
            map.number_of_own_descriptors(),
            map.instance_type(),
            boilerplate.elements_kind(),
            boilerplate.elements().length(),
            boilerplate.type_of().value().to_string(),
            null.type_of().value().to_string(),
            undefined.oddball_type(),
            boilerplate.boolean_value(),
        )
    };
    assert_eq!(summarize(BrokerConfig::default()), summarize(BrokerConfig::concurrent()));
}

#[test]
fn test_booleans_are_distinguished_by_value() {
    for config in [BrokerConfig::default(), BrokerConfig::concurrent()] {
        let heap = Arc::new(Heap::new());
        let object = small_literal(&heap);
        let mut broker = JsHeapBroker::new(heap, config);
        if broker.serializing_allowed() {
            broker.serialize_standard_objects();
            broker.get_or_create_data(object.into());
            broker.stop_serializing();
        }

        let t = broker.object_ref(broker.roots().true_value.into());
        let f = broker.object_ref(broker.roots().false_value.into());
        let object = broker.object_ref(object.into());
        assert_eq!(t.oddball_type(), OddballType::Boolean);
        assert_eq!(f.oddball_type(), OddballType::Boolean);
        assert_ne!(t, f);
        assert_eq!(t.oddball_to_number(), 1.0);
        assert_eq!(f.oddball_to_number(), 0.0);
        assert_eq!(object.oddball_type(), OddballType::None);
        assert!(!object.is_oddball());
    }
}

// =============================================================================
// Fast literals
// =============================================================================

#[test]
fn test_small_literal_uses_five_units() {
    let heap = Arc::new(Heap::new());
    let object = small_literal(&heap);
    let broker = JsHeapBroker::new(heap, BrokerConfig::default());

    let mut budget = FastLiteralBudget::new(3, 10);
    assert!(is_fast_literal(broker.live_heap(), object, &mut budget));
    assert_eq!(budget.remaining_properties(), 5);
}

#[test]
fn test_deep_literal_is_not_fast() {
    for config in [BrokerConfig::default(), BrokerConfig::concurrent()] {
        let heap = Arc::new(Heap::new());
        let root = deep_literal(&heap);
        let site = literal_site(&heap, root);
        let mut broker = JsHeapBroker::new(heap, config);
        if broker.serializing_allowed() {
            broker.get_or_create_data(site.into());
            broker.stop_serializing();
        }
        let site = broker.object_ref(site.into()).as_allocation_site();
        assert!(site.points_to_literal());
        assert!(!site.is_fast_literal());
    }
}

#[test]
fn test_boilerplate_captured_before_its_site_is_migrated() {
    let summarize = |config: BrokerConfig| {
        let heap = Arc::new(Heap::new());
        let old = heap.new_object_map(&[("a", Representation::Smi)], ElementsKind::PackedSmi);
        let new = heap.new_object_map(&[("a", Representation::Smi)], ElementsKind::PackedSmi);
        let boilerplate = heap.new_js_object(old, vec![FieldValue::Tagged(Tagged::smi(1))]);
        assert!(heap.deprecate_map(old, new));
        let site = literal_site(&heap, boilerplate);
        let mut broker = JsHeapBroker::new(heap, config);
        if broker.serializing_allowed() {
            broker.get_or_create_data(boilerplate.into());
            broker.get_or_create_data(site.into());
            broker.stop_serializing();
        }

        let site = broker.object_ref(site.into()).as_allocation_site();
        let fast = site.is_fast_literal();
        let map = site.boilerplate().expect("literal site").map();
        (fast, map.is_deprecated(), map.object() == Tagged::from(new))
    };
    assert_eq!(summarize(BrokerConfig::concurrent()), (true, false, true));
    assert_eq!(summarize(BrokerConfig::default()), summarize(BrokerConfig::concurrent()));
}

// =============================================================================
// Fatal violations
// =============================================================================

#[test]
#[should_panic(expected = "in strict serialized mode")]
fn test_uncaptured_object_is_fatal_after_handoff() {
    let heap = Arc::new(Heap::new());
    let object = small_literal(&heap);
    let broker = serialized_broker(&heap, &[]);
    broker.object_ref(object.into());
}

#[test]
#[should_panic(expected = "live heap access is not allowed")]
fn test_live_heap_is_fatal_after_handoff() {
    let heap = Arc::new(Heap::new());
    let broker = serialized_broker(&heap, &[]);
    broker.live_heap();
}

#[test]
#[should_panic(expected = "descriptor creation is not allowed")]
fn test_capture_is_fatal_after_handoff() {
    let heap = Arc::new(Heap::new());
    let broker = serialized_broker(&heap, &[]);
    broker.capture_scope();
}

#[test]
fn test_relaxed_broker_captures_late() {
    let heap = Arc::new(Heap::new());
    let object = small_literal(&heap);
    let config = BrokerConfig { strict_heap_broker: false, ..BrokerConfig::concurrent() };
    let mut broker = JsHeapBroker::new(heap, config);
    broker.stop_serializing();

    let object = broker.object_ref(object.into()).as_js_object();
    assert_eq!(object.elements().length(), 3);
}
