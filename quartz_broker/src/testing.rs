//! Broker set-ups shared by the facade tests.

use std::sync::Arc;

use quartz_heap::{Heap, Tagged};

use crate::{BrokerConfig, BrokerMode, JsHeapBroker};

/// One broker per way the compiler can see `heap`: live in `Disabled`,
/// capturing on demand in `Serializing`, and from the snapshot in strict
/// `Serialized`.
///
/// The snapshot broker captures the standard objects, the native context and
/// `objects` before it stops serializing, so every check must only reach
/// objects in that closure.
pub(crate) fn brokers(heap: &Arc<Heap>, objects: &[Tagged]) -> [JsHeapBroker; 3] {
    let disabled = JsHeapBroker::new(Arc::clone(heap), BrokerConfig::default());

    let serializing = JsHeapBroker::new(Arc::clone(heap), BrokerConfig::concurrent());
    serializing.serialize_standard_objects();

    let mut serialized = JsHeapBroker::new(Arc::clone(heap), BrokerConfig::concurrent());
    serialized.serialize_standard_objects();
    serialized.native_context();
    for &object in objects {
        serialized.get_or_create_data(object);
    }
    serialized.stop_serializing();

    assert_eq!(disabled.mode(), BrokerMode::Disabled);
    assert_eq!(serializing.mode(), BrokerMode::Serializing);
    assert_eq!(serialized.mode(), BrokerMode::Serialized);
    [disabled, serializing, serialized]
}
