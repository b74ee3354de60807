//! Quartz Heap Broker
//!
//! Mediates every heap read the optimizing compiler makes, so that the
//! compiler frontend can run off the main thread against an immutable
//! snapshot.
//!
//! # Modes
//!
//! - **Disabled**: the frontend runs on the main thread; facades read the live
//!   heap directly.
//! - **Serializing**: the main thread captures descriptors for every object
//!   the compiler will need. Facades read descriptors.
//! - **Serialized**: capture is over. In strict mode, touching an object
//!   without a descriptor is fatal, as is any live heap read.
//!
//! # Descriptors and facades
//!
//! A descriptor ([`ObjectData`]) is created once per object identity and never
//! changes. A facade ([`ObjectRef`] and its typed relatives) is a broker
//! reference plus a descriptor id; facades for the same identity compare
//! equal.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use quartz_broker::{BrokerConfig, JsHeapBroker};
//! use quartz_heap::Heap;
//!
//! let heap = Arc::new(Heap::new());
//! let mut broker = JsHeapBroker::new(heap, BrokerConfig::concurrent());
//! broker.serialize_standard_objects();
//! let array_function = broker.native_context().array_function();
//! broker.stop_serializing();
//! assert!(array_function.shared().native());
//! ```

#![warn(clippy::all)]

pub mod access;
pub mod broker;
pub mod config;
pub mod data;
pub mod error;
pub mod heap_type;
pub mod literal;
pub mod mode;
pub mod refs;

mod serialize;
#[cfg(test)]
mod testing;

pub use access::{CaptureScope, LiveHeap};
pub use broker::JsHeapBroker;
pub use config::BrokerConfig;
pub use data::{DataBody, DataId, HeapObjectData, ObjectData, ObjectDataKind};
pub use error::{BrokerViolation, OrFatal, fatal};
pub use heap_type::{HeapObjectType, HeapObjectTypeFlags, OddballType};
pub use literal::{
    FastLiteralBudget, MAX_FAST_LITERAL_DEPTH, MAX_FAST_LITERAL_PROPERTIES, is_fast_literal,
};
pub use mode::BrokerMode;
pub use refs::{
    AllocationSiteRef, CellRef, CodeRef, ContextRef, FixedArrayBaseRef, FixedArrayRef,
    FixedDoubleArrayRef, HeapNumberRef, HeapObjectRef, InternalizedStringRef, JsArrayRef,
    JsFunctionRef, JsGlobalProxyRef, JsObjectRef, MapRef, ModuleRef, MutableHeapNumberRef,
    NameRef, NativeContextRef, ObjectRef, PropertyCellRef, ScopeInfoRef, ScriptContextLookup,
    ScriptContextTableRef, SharedFunctionInfoRef, StringRef,
};
