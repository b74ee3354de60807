//! The heap broker: one per compilation unit.
//!
//! # Identity cache
//!
//! `refs` maps each object identity to the single descriptor ever created for
//! it; `arena` owns the descriptors. A descriptor is registered (as
//! [`Slot::Reserved`]) before its dependencies are captured and installed
//! once they are, so a dependency that leads back to an object under
//! construction resolves to the reserved id instead of recursing forever.
//!
//! # Threading
//!
//! The broker is `Send` but not `Sync`. It is built and primed on the
//! heap-owning thread, switched to `Serialized` with
//! [`stop_serializing`](JsHeapBroker::stop_serializing), and then moved to
//! the compiler thread. Facades borrow the broker, so the switch cannot
//! happen while any of them is alive.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use quartz_heap::{Heap, HeapAddr, ReadOnlyRoots, Tagged};
use rustc_hash::FxHashMap;

use crate::access::{CaptureScope, LiveHeap};
use crate::config::BrokerConfig;
use crate::data::{DataId, ObjectData, ObjectDataKind};
use crate::error::{BrokerViolation, OrFatal, fatal};
use crate::heap_type::HeapObjectType;
use crate::mode::BrokerMode;
use crate::refs::{NativeContextRef, ObjectRef};
use crate::serialize;

enum Slot {
    Reserved(Tagged),
    Ready(Arc<ObjectData>),
}

#[derive(Default)]
struct BrokerState {
    refs: FxHashMap<Tagged, DataId>,
    arena: Vec<Slot>,
}

/// Mediates every heap read of one compilation unit.
pub struct JsHeapBroker {
    heap: Arc<Heap>,
    config: BrokerConfig,
    mode: BrokerMode,
    state: RefCell<BrokerState>,
}

impl JsHeapBroker {
    /// Create a broker in the mode selected by `config`.
    pub fn new(heap: Arc<Heap>, config: BrokerConfig) -> Self {
        let mode = config.initial_mode();
        let broker = Self {
            heap,
            config,
            mode,
            state: RefCell::new(BrokerState::default()),
        };
        if config.trace_heap_broker {
            tracing::debug!(
                target: "quartz::heap_broker",
                broker = ?(&broker as *const Self),
                %mode,
                strict = config.strict_heap_broker,
                "constructing heap broker"
            );
        }
        broker
    }

    // =========================================================================
    // Mode
    // =========================================================================

    #[inline]
    pub fn mode(&self) -> BrokerMode {
        self.mode
    }

    #[inline]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.config.strict_heap_broker
    }

    /// Whether descriptors may be created in the current mode.
    #[inline]
    pub fn serializing_allowed(&self) -> bool {
        self.mode.serializing_allowed(self.is_strict())
    }

    /// End the capture phase. Only legal in `Serializing` mode.
    pub fn stop_serializing(&mut self) {
        self.mode = self.mode.transition_to_serialized().unwrap_or_else(|v| fatal(v));
        if self.config.trace_heap_broker {
            tracing::debug!(
                target: "quartz::heap_broker",
                broker = ?(self as *const Self),
                descriptors = self.descriptor_count(),
                "stopping serialization"
            );
        }
    }

    // =========================================================================
    // Heap Access
    // =========================================================================

    /// Live heap access. Fatal unless the current mode permits live reads.
    pub fn live_heap(&self) -> LiveHeap<'_> {
        if !self.mode.live_reads_allowed(self.is_strict()) {
            fatal(BrokerViolation::LiveHeapForbidden { mode: self.mode });
        }
        LiveHeap::new(&self.heap)
    }

    /// Live heap access, only in `Disabled` mode where facades read through.
    #[inline]
    pub fn disabled_heap(&self) -> Option<LiveHeap<'_>> {
        (self.mode == BrokerMode::Disabled).then(|| LiveHeap::new(&self.heap))
    }

    /// Permission to create descriptors. Fatal unless serializing is allowed.
    pub fn capture_scope(&self) -> CaptureScope<'_> {
        if !self.serializing_allowed() {
            fatal(BrokerViolation::CaptureForbidden { mode: self.mode });
        }
        CaptureScope::new(&self.heap)
    }

    /// Read-only roots. Their addresses never change, so reading them is not
    /// a heap access.
    #[inline]
    pub fn roots(&self) -> &ReadOnlyRoots {
        self.heap.roots()
    }

    /// The global execution context.
    pub fn native_context(&self) -> NativeContextRef<'_> {
        self.object_ref(self.heap.native_context().into()).as_native_context()
    }

    // =========================================================================
    // Identity Cache
    // =========================================================================

    /// Descriptor for `object`, if one exists.
    pub fn get_data(&self, object: Tagged) -> Option<DataId> {
        self.state.borrow().refs.get(&object).copied()
    }

    /// Descriptor for `object`, capturing it first if needed.
    ///
    /// Fatal unless serializing is allowed.
    pub fn get_or_create_data(&self, object: Tagged) -> DataId {
        let scope = self.capture_scope();
        self.resolve(scope, object)
    }

    pub(crate) fn resolve(&self, scope: CaptureScope<'_>, object: Tagged) -> DataId {
        match self.get_data(object) {
            Some(id) => id,
            None => serialize::serialize(self, scope, object),
        }
    }

    /// Register a complete descriptor. Fatal if `object` already has one.
    pub(crate) fn add_data(&self, object: Tagged, data: ObjectData) -> DataId {
        let id = self.insert(object, Slot::Ready(Arc::new(data)));
        self.trace_creation(id, object);
        id
    }

    /// Register `object` before capturing it.
    pub(crate) fn reserve(&self, object: Tagged) -> DataId {
        let id = self.insert(object, Slot::Reserved(object));
        self.trace_creation(id, object);
        id
    }

    /// Install the descriptor of a reserved object.
    pub(crate) fn install(&self, id: DataId, data: ObjectData) {
        let mut state = self.state.borrow_mut();
        match state.arena.get_mut(id.index()) {
            Some(slot @ Slot::Reserved(_)) => *slot = Slot::Ready(Arc::new(data)),
            Some(Slot::Ready(existing)) => {
                let object = existing.object();
                drop(state);
                fatal(BrokerViolation::DuplicateData { object })
            }
            None => {
                drop(state);
                fatal(BrokerViolation::UnknownDescriptor { id })
            }
        }
    }

    fn insert(&self, object: Tagged, slot: Slot) -> DataId {
        let mut state = self.state.borrow_mut();
        if state.refs.contains_key(&object) {
            drop(state);
            fatal(BrokerViolation::DuplicateData { object });
        }
        let id = DataId::new(state.arena.len());
        state.arena.push(slot);
        state.refs.insert(object, id);
        id
    }

    /// Descriptor behind `id`. Fatal while it is still under construction.
    pub fn data(&self, id: DataId) -> Arc<ObjectData> {
        let state = self.state.borrow();
        match state.arena.get(id.index()) {
            Some(Slot::Ready(data)) => Arc::clone(data),
            Some(Slot::Reserved(object)) => {
                let object = *object;
                drop(state);
                fatal(BrokerViolation::UnderConstruction { object })
            }
            None => {
                drop(state);
                fatal(BrokerViolation::UnknownDescriptor { id })
            }
        }
    }

    /// Number of descriptors created so far.
    pub fn descriptor_count(&self) -> usize {
        self.state.borrow().arena.len()
    }

    fn trace_creation(&self, id: DataId, object: Tagged) {
        if self.config.trace_heap_broker {
            tracing::debug!(
                target: "quartz::heap_broker",
                broker = ?(self as *const Self),
                data = id.index(),
                address = format_args!("{:#x}", object.address()),
                object = %self.heap.short_print(object),
                "creating data"
            );
        }
    }

    // =========================================================================
    // Facade Construction
    // =========================================================================

    /// Facade for `object`.
    ///
    /// - `Disabled`: looks up or registers an identity stub.
    /// - `Serializing`: looks up or captures.
    /// - `Serialized`: looks up; a miss is fatal in strict mode and captured
    ///   otherwise.
    pub fn object_ref(&self, object: Tagged) -> ObjectRef<'_> {
        let id = match self.mode {
            BrokerMode::Disabled => self.get_data(object).unwrap_or_else(|| {
                let kind = if object.is_smi() { ObjectDataKind::Smi } else { ObjectDataKind::Stub };
                self.add_data(object, ObjectData::new(object, kind))
            }),
            BrokerMode::Serializing => self.get_or_create_data(object),
            BrokerMode::Serialized if self.is_strict() => self
                .get_data(object)
                .or_fatal(|| BrokerViolation::MissingData { object }),
            BrokerMode::Serialized => self.get_or_create_data(object),
        };
        ObjectRef::from_data(self, id)
    }

    /// Classify objects described by the map at `map`.
    pub fn heap_object_type_from_map(&self, heap: LiveHeap<'_>, map: HeapAddr) -> HeapObjectType {
        let guard = heap.map(map).or_fatal(|| BrokerViolation::KindMismatch {
            object: map.into(),
            expected: "Map",
        });
        HeapObjectType::from_map(heap.roots(), map, &guard)
    }

    // =========================================================================
    // Standard Objects
    // =========================================================================

    /// Capture the objects every compilation reads regardless of its input.
    pub fn serialize_standard_objects(&self) {
        if self.config.trace_heap_broker {
            tracing::debug!(
                target: "quartz::heap_broker",
                broker = ?(self as *const Self),
                "serializing standard objects"
            );
        }
        let scope = self.capture_scope();
        let roots = self.heap.roots();
        for object in [
            roots.empty_fixed_array,
            roots.eval_context_map,
            roots.function_context_map,
            roots.many_closures_cell_map,
            roots.length_string,
            roots.array_prototype_shift_code,
            roots.call_function_forward_varargs_code,
            roots.true_value,
            roots.false_value,
            roots.undefined_string,
            roots.object_string,
            roots.boolean_string,
            roots.number_string,
            roots.string_string,
            roots.function_string,
        ] {
            self.resolve(scope, object.into());
        }
    }
}

impl fmt::Debug for JsHeapBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsHeapBroker")
            .field("mode", &self.mode)
            .field("strict", &self.is_strict())
            .field("descriptors", &self.descriptor_count())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
