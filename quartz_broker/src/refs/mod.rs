//! Typed facades over heap objects.
//!
//! A facade is a broker reference plus a descriptor id. In `Disabled` mode
//! every accessor reads the live heap; in the other modes it reads the
//! descriptor. Both paths return the same answers for an unchanged heap.
//!
//! The facade family mirrors the heap taxonomy: each typed facade derefs to
//! its parent, down to [`ObjectRef`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use quartz_heap::{HeapAddr, InstanceType, OddballKind, Tagged};

use crate::access::LiveHeap;
use crate::broker::JsHeapBroker;
use crate::data::{DataBody, DataId, ObjectData};
use crate::error::{BrokerViolation, OrFatal, fatal};
use crate::heap_type::{HeapObjectType, OddballType};

/// Declare a typed facade deriving to `$parent`.
macro_rules! define_ref {
    ($(#[$meta:meta])* $name:ident => $parent:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name<'b>($parent<'b>);

        impl<'b> $name<'b> {
            #[inline]
            pub(crate) fn from_object_unchecked(object: $crate::refs::ObjectRef<'b>) -> Self {
                Self($parent::from_object_unchecked(object))
            }
        }

        impl<'b> std::ops::Deref for $name<'b> {
            type Target = $parent<'b>;

            #[inline]
            fn deref(&self) -> &$parent<'b> {
                &self.0
            }
        }

        impl<'b> From<$name<'b>> for $crate::refs::ObjectRef<'b> {
            #[inline]
            fn from(r: $name<'b>) -> Self {
                r.object_ref()
            }
        }

        impl std::fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.object())
            }
        }
    };
}

mod context;
mod js_object;
mod map;
mod misc;
mod storage;

pub use context::{
    ContextRef, NativeContextRef, ScopeInfoRef, ScriptContextLookup, ScriptContextTableRef,
};
pub use js_object::{JsArrayRef, JsFunctionRef, JsGlobalProxyRef, JsObjectRef};
pub use map::MapRef;
pub use misc::{
    AllocationSiteRef, CellRef, CodeRef, ModuleRef, PropertyCellRef, SharedFunctionInfoRef,
};
pub use storage::{
    FixedArrayBaseRef, FixedArrayRef, FixedDoubleArrayRef, HeapNumberRef, InternalizedStringRef,
    MutableHeapNumberRef, NameRef, StringRef,
};

// =============================================================================
// ObjectRef
// =============================================================================

/// Facade for any value, immediate or heap object.
///
/// Two facades are equal iff they come from the same broker and name the same
/// identity. Identity is cached, so that is a single id comparison.
#[derive(Clone, Copy)]
pub struct ObjectRef<'b> {
    broker: &'b JsHeapBroker,
    data: DataId,
}

impl<'b> ObjectRef<'b> {
    /// Facade for `object`; see [`JsHeapBroker::object_ref`].
    #[inline]
    pub fn new(broker: &'b JsHeapBroker, object: Tagged) -> Self {
        broker.object_ref(object)
    }

    #[inline]
    pub(crate) fn from_data(broker: &'b JsHeapBroker, data: DataId) -> Self {
        Self { broker, data }
    }

    #[inline]
    pub fn broker(&self) -> &'b JsHeapBroker {
        self.broker
    }

    #[inline]
    pub fn data_id(&self) -> DataId {
        self.data
    }

    /// This facade, without its static type.
    #[inline]
    pub fn object_ref(&self) -> ObjectRef<'b> {
        *self
    }

    /// The descriptor behind this facade.
    #[inline]
    pub fn data(&self) -> Arc<ObjectData> {
        self.broker.data(self.data)
    }

    /// Identity this facade stands for.
    #[inline]
    pub fn object(&self) -> Tagged {
        self.data().object()
    }

    /// Same broker, same identity.
    #[inline]
    pub fn equals(&self, other: ObjectRef<'b>) -> bool {
        *self == other
    }

    // -------------------------------------------------------------------------
    // Helpers for typed accessors
    // -------------------------------------------------------------------------

    /// Live heap when facades read through, that is in `Disabled` mode.
    #[inline]
    pub(crate) fn live(&self) -> Option<LiveHeap<'b>> {
        self.broker.disabled_heap()
    }

    /// Address of a heap object. Fatal for Smis.
    pub(crate) fn address(&self) -> HeapAddr {
        let object = self.object();
        object.as_heap().or_fatal(|| BrokerViolation::KindMismatch { object, expected: "HeapObject" })
    }

    pub(crate) fn mismatch(&self, expected: &'static str) -> BrokerViolation {
        BrokerViolation::KindMismatch { object: self.object(), expected }
    }

    pub(crate) fn out_of_bounds(&self, index: impl Into<i64>) -> BrokerViolation {
        BrokerViolation::IndexOutOfBounds { object: self.object(), index: index.into() }
    }

    /// Read the captured body. Fatal if `f` finds nothing.
    pub(crate) fn body<R>(&self, expected: &'static str, f: impl FnOnce(&DataBody) -> Option<R>) -> R {
        let data = self.data();
        data.body().and_then(f).or_fatal(|| BrokerViolation::KindMismatch {
            object: data.object(),
            expected,
        })
    }

    /// Facade for a descriptor of the same broker.
    #[inline]
    pub(crate) fn sibling(&self, data: DataId) -> ObjectRef<'b> {
        ObjectRef::from_data(self.broker, data)
    }

    /// Facade for a value read from the live heap.
    #[inline]
    pub(crate) fn live_sibling(&self, object: Tagged) -> ObjectRef<'b> {
        self.broker.object_ref(object)
    }

    fn instance_type(&self) -> Option<InstanceType> {
        let addr = self.object().as_heap()?;
        match self.live() {
            Some(heap) => heap.instance_type_of(addr),
            None => self.data().as_heap_object().map(|d| d.heap_object_type().instance_type()),
        }
    }

    // -------------------------------------------------------------------------
    // Immediates
    // -------------------------------------------------------------------------

    #[inline]
    pub fn is_smi(&self) -> bool {
        self.object().is_smi()
    }

    /// Value of a Smi. Fatal for heap objects.
    pub fn as_smi(&self) -> i32 {
        self.object().as_smi().or_fatal(|| self.mismatch("Smi"))
    }

    #[inline]
    pub fn is_heap_object(&self) -> bool {
        !self.is_smi()
    }

    pub fn as_heap_object(&self) -> HeapObjectRef<'b> {
        if !self.is_heap_object() {
            fatal(self.mismatch("HeapObject"));
        }
        HeapObjectRef(*self)
    }

    #[inline]
    pub fn is_oddball(&self) -> bool {
        self.instance_type().is_some_and(InstanceType::is_oddball)
    }

    // -------------------------------------------------------------------------
    // Special values and conversions
    // -------------------------------------------------------------------------

    /// Special-value classification; `None` for Smis and ordinary objects.
    pub fn oddball_type(&self) -> OddballType {
        if self.is_smi() {
            return OddballType::None;
        }
        self.as_heap_object().heap_object_type().oddball_type()
    }

    /// Result of the `typeof` operator, as an internalized string.
    pub fn type_of(&self) -> StringRef<'b> {
        let roots = self.broker.roots();
        let name = if self.is_smi() {
            roots.number_string
        } else {
            let ty = self.as_heap_object().heap_object_type();
            match ty.oddball_type() {
                OddballType::Undefined => roots.undefined_string,
                OddballType::Null => roots.object_string,
                OddballType::Boolean => roots.boolean_string,
                OddballType::Hole | OddballType::Uninitialized | OddballType::Other => {
                    roots.undefined_string
                }
                OddballType::None if ty.is_undetectable() => roots.undefined_string,
                OddballType::None if ty.is_callable() => roots.function_string,
                OddballType::None => match ty.instance_type() {
                    InstanceType::String | InstanceType::InternalizedString => roots.string_string,
                    InstanceType::HeapNumber | InstanceType::MutableHeapNumber => {
                        roots.number_string
                    }
                    _ => roots.object_string,
                },
            }
        };
        self.broker.object_ref(name.into()).as_string()
    }

    /// Truthiness under `ToBoolean`.
    pub fn boolean_value(&self) -> bool {
        if self.is_smi() {
            return self.as_smi() != 0;
        }
        let heap_object = self.as_heap_object();
        let ty = heap_object.heap_object_type();
        if ty.is_undetectable() {
            return false;
        }
        match ty.oddball_type() {
            OddballType::None => {}
            OddballType::Boolean => return heap_object.oddball_kind() == OddballKind::True,
            _ => return false,
        }
        match ty.instance_type() {
            InstanceType::HeapNumber => {
                let value = self.as_heap_number().value();
                value != 0.0 && !value.is_nan()
            }
            InstanceType::MutableHeapNumber => {
                let value = self.as_mutable_heap_number().value();
                value != 0.0 && !value.is_nan()
            }
            InstanceType::String | InstanceType::InternalizedString => {
                self.as_string().length() > 0
            }
            _ => true,
        }
    }

    /// Numeric value of `true`, `false`, `undefined` or `null`.
    ///
    /// Fatal for anything else. In strict `Serialized` mode the boolean
    /// values must have been primed by
    /// [`serialize_standard_objects`](JsHeapBroker::serialize_standard_objects).
    pub fn oddball_to_number(&self) -> f64 {
        match self.oddball_type() {
            OddballType::Boolean => {
                let true_ref = self.broker.object_ref(self.broker.roots().true_value.into());
                if self.equals(true_ref) { 1.0 } else { 0.0 }
            }
            OddballType::Undefined => f64::NAN,
            OddballType::Null => 0.0,
            _ => fatal(BrokerViolation::InvalidOddballConversion { object: self.object() }),
        }
    }
}

impl PartialEq for ObjectRef<'_> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.broker, other.broker) && self.data == other.data
    }
}

impl Eq for ObjectRef<'_> {}

impl Hash for ObjectRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.broker, state);
        self.data.hash(state);
    }
}

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:?}, {:?})", self.data, self.object())
    }
}

// =============================================================================
// Kind checks
// =============================================================================

macro_rules! define_kind_checks {
    ($($is:ident, $as:ident => $ty:ident;)*) => {
        impl<'b> ObjectRef<'b> {
            $(
                #[doc = concat!("Check if this is a [`", stringify!($ty), "`] candidate.")]
                #[inline]
                pub fn $is(&self) -> bool {
                    self.instance_type().is_some_and(InstanceType::$is)
                }

                #[doc = concat!("View as a [`", stringify!($ty), "`]. Fatal on mismatch.")]
                pub fn $as(&self) -> $ty<'b> {
                    if !self.$is() {
                        fatal(self.mismatch(stringify!($ty)));
                    }
                    $ty::from_object_unchecked(*self)
                }
            )*
        }
    };
}

define_kind_checks! {
    is_map, as_map => MapRef;
    is_heap_number, as_heap_number => HeapNumberRef;
    is_mutable_heap_number, as_mutable_heap_number => MutableHeapNumberRef;
    is_name, as_name => NameRef;
    is_string, as_string => StringRef;
    is_internalized_string, as_internalized_string => InternalizedStringRef;
    is_fixed_array_base, as_fixed_array_base => FixedArrayBaseRef;
    is_fixed_array, as_fixed_array => FixedArrayRef;
    is_fixed_double_array, as_fixed_double_array => FixedDoubleArrayRef;
    is_js_object, as_js_object => JsObjectRef;
    is_js_array, as_js_array => JsArrayRef;
    is_js_function, as_js_function => JsFunctionRef;
    is_js_global_proxy, as_js_global_proxy => JsGlobalProxyRef;
    is_context, as_context => ContextRef;
    is_native_context, as_native_context => NativeContextRef;
    is_script_context_table, as_script_context_table => ScriptContextTableRef;
    is_scope_info, as_scope_info => ScopeInfoRef;
    is_shared_function_info, as_shared_function_info => SharedFunctionInfoRef;
    is_module, as_module => ModuleRef;
    is_cell, as_cell => CellRef;
    is_property_cell, as_property_cell => PropertyCellRef;
    is_allocation_site, as_allocation_site => AllocationSiteRef;
    is_code, as_code => CodeRef;
}

// =============================================================================
// HeapObjectRef
// =============================================================================

/// Facade for any heap object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapObjectRef<'b>(ObjectRef<'b>);

impl<'b> HeapObjectRef<'b> {
    #[inline]
    pub(crate) fn from_object_unchecked(object: ObjectRef<'b>) -> Self {
        HeapObjectRef(object)
    }

    /// The object's map.
    pub fn map(&self) -> MapRef<'b> {
        match self.live() {
            Some(heap) => {
                let map = heap.map_of(self.address()).or_fatal(|| self.mismatch("HeapObject"));
                self.live_sibling(map.into()).as_map()
            }
            None => {
                let map = self.data().as_heap_object().map(|d| d.map());
                self.sibling(map.or_fatal(|| self.mismatch("HeapObject"))).as_map()
            }
        }
    }

    /// Instance type, oddball classification and map flags.
    pub fn heap_object_type(&self) -> HeapObjectType {
        match self.live() {
            Some(heap) => {
                let map = heap.map_of(self.address()).or_fatal(|| self.mismatch("HeapObject"));
                self.broker().heap_object_type_from_map(heap, map)
            }
            None => self
                .data()
                .as_heap_object()
                .map(|d| d.heap_object_type())
                .or_fatal(|| self.mismatch("HeapObject")),
        }
    }

    /// Which special value an oddball is. Fatal for other objects.
    pub(crate) fn oddball_kind(&self) -> OddballKind {
        let kind = match self.live() {
            Some(heap) => heap.oddball(self.address()).map(|o| o.kind),
            None => self.data().body().and_then(|body| match body {
                DataBody::Oddball(kind) => Some(*kind),
                _ => None,
            }),
        };
        kind.or_fatal(|| self.mismatch("Oddball"))
    }
}

impl<'b> std::ops::Deref for HeapObjectRef<'b> {
    type Target = ObjectRef<'b>;

    #[inline]
    fn deref(&self) -> &ObjectRef<'b> {
        &self.0
    }
}

impl<'b> From<HeapObjectRef<'b>> for ObjectRef<'b> {
    #[inline]
    fn from(r: HeapObjectRef<'b>) -> Self {
        r.0
    }
}

impl fmt::Debug for HeapObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeapObjectRef({:?})", self.object())
    }
}

// =============================================================================
// Tests
// =============================================================================
