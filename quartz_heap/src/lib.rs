//! Quartz Heap
//!
//! The managed heap model the optimizing compiler reads through the heap
//! broker.
//!
//! # Layout
//!
//! - **Identities**: [`HeapAddr`] names a heap slot, [`Tagged`] is either a
//!   small-integer immediate or a heap address.
//! - **Maps**: every object points to a [`Map`] describing its instance type,
//!   elements kind and named-property layout. Maps are objects too; the meta
//!   map is its own map.
//! - **Roots**: [`ReadOnlyRoots`] holds the special values, the shared maps and
//!   a few builtin code objects. [`Heap::native_context`] is the single global
//!   context, with its named slots described by [`NativeContextSlot`].
//!
//! # Concurrency
//!
//! `Heap` is `Sync`. All reads go through a `parking_lot::RwLock` taken
//! recursively, so any thread holding a `&Heap` may read. Whether a thread is
//! *allowed* to read the live heap is a compiler-level policy enforced by the
//! broker, not by this crate.
//!
//! # Usage
//!
//! ```ignore
//! use quartz_heap::{ElementsKind, FieldValue, Heap, Representation, Tagged};
//!
//! let heap = Heap::new();
//! let map = heap.new_object_map(&[("x", Representation::Smi)], ElementsKind::Packed);
//! let object = heap.new_js_object(map, vec![FieldValue::Tagged(Tagged::smi(1))]);
//! assert_eq!(heap.map_of(object), Some(map));
//! ```

#![warn(clippy::all)]

pub mod conversions;
pub mod handle;
pub mod heap;
pub mod instance_type;
pub mod map;
pub mod object;
pub mod roots;

mod factory;

pub use conversions::string_to_number;
pub use handle::{HeapAddr, Tagged};
pub use heap::Heap;
pub use instance_type::{ElementsKind, InstanceType};
pub use map::{
    DescriptorEntry, FieldIndex, MAX_IN_OBJECT_PROPERTIES, MAX_REGULAR_HEAP_OBJECT_SIZE, Map,
    MapFlags, PropertyAttributes, PropertyDetails, PropertyKind, PropertyLocation, Representation,
};
pub use object::{
    AllocationSiteBody, Builtin, BuiltinFunctionId, BytecodeInfo, ContextBody, ContextLocal,
    FieldValue, FunctionKind, Generation, HeapObject, HeapObjectBody, JsArrayFields,
    JsFunctionFields, JsObjectBody, LanguageMode, MIN_CONTEXT_SLOTS, ModuleBody, OddballBody,
    OddballKind, PretenureMode, PropertyCellBody, ScopeInfoBody, SharedFunctionInfoBody,
    VariableMode,
};
pub use roots::{NativeContextSlot, ReadOnlyRoots};
