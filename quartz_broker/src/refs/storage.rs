//! Array storage, strings and boxed numbers.

use std::sync::Arc;

use quartz_heap::string_to_number;

use super::{HeapObjectRef, ObjectRef};
use crate::data::DataBody;
use crate::error::OrFatal;

define_ref! {
    /// Tagged or double array storage.
    FixedArrayBaseRef => HeapObjectRef
}

define_ref! {
    /// Tagged array storage, property arrays included.
    FixedArrayRef => FixedArrayBaseRef
}

define_ref! {
    /// Unboxed double storage.
    FixedDoubleArrayRef => FixedArrayBaseRef
}

define_ref! {
    /// Property key.
    NameRef => HeapObjectRef
}

define_ref! {
    StringRef => NameRef
}

define_ref! {
    InternalizedStringRef => StringRef
}

define_ref! {
    HeapNumberRef => HeapObjectRef
}

define_ref! {
    MutableHeapNumberRef => HeapObjectRef
}

impl<'b> FixedArrayBaseRef<'b> {
    /// Number of entries.
    pub fn length(&self) -> usize {
        match self.live() {
            Some(heap) => heap
                .storage_length(self.address())
                .or_fatal(|| self.mismatch("FixedArrayBase")),
            None => self.body("FixedArrayBase", |body| match body {
                DataBody::FixedArray(values) => Some(values.len()),
                DataBody::FixedDoubleArray(values) => Some(values.len()),
                _ => None,
            }),
        }
    }
}

impl<'b> FixedArrayRef<'b> {
    /// Entry `index`. Fatal when out of bounds.
    pub fn get(&self, index: usize) -> ObjectRef<'b> {
        let entry = match self.live() {
            Some(heap) => heap
                .fixed_array(self.address())
                .and_then(|values| values.get(index).copied())
                .map(|value| self.live_sibling(value)),
            None => self
                .body("FixedArray", |body| match body {
                    DataBody::FixedArray(values) => Some(values.get(index).copied()),
                    _ => None,
                })
                .map(|id| self.sibling(id)),
        };
        entry.or_fatal(|| self.out_of_bounds(index as i64))
    }

    /// Check if entry `index` is the hole.
    pub fn is_the_hole(&self, index: usize) -> bool {
        self.get(index).object() == self.broker().roots().the_hole_value.into()
    }
}

impl<'b> FixedDoubleArrayRef<'b> {
    fn element(&self, index: usize) -> Option<f64> {
        let element = match self.live() {
            Some(heap) => heap
                .fixed_double_array(self.address())
                .and_then(|values| values.get(index).copied()),
            None => self.body("FixedDoubleArray", |body| match body {
                DataBody::FixedDoubleArray(values) => Some(values.get(index).copied()),
                _ => None,
            }),
        };
        element.or_fatal(|| self.out_of_bounds(index as i64))
    }

    /// Raw value of entry `index`; holes read as NaN.
    pub fn get_scalar(&self, index: usize) -> f64 {
        self.element(index).unwrap_or(f64::NAN)
    }

    /// Check if entry `index` is a hole.
    pub fn is_the_hole(&self, index: usize) -> bool {
        self.element(index).is_none()
    }
}

impl<'b> StringRef<'b> {
    /// String contents.
    pub fn value(&self) -> Arc<str> {
        match self.live() {
            Some(heap) => heap.string(self.address()).or_fatal(|| self.mismatch("String")),
            None => self.body("String", |body| match body {
                DataBody::String(value) => Some(Arc::clone(value)),
                _ => None,
            }),
        }
    }

    /// Length in UTF-16 code units.
    pub fn length(&self) -> usize {
        self.value().encode_utf16().count()
    }

    /// First UTF-16 code unit, `None` for the empty string.
    pub fn first_char(&self) -> Option<u16> {
        self.value().encode_utf16().next()
    }

    /// `ToNumber` of the contents.
    pub fn to_number(&self) -> f64 {
        string_to_number(&self.value())
    }
}

impl<'b> HeapNumberRef<'b> {
    pub fn value(&self) -> f64 {
        match self.live() {
            Some(heap) => heap.number_value(self.address()).or_fatal(|| self.mismatch("HeapNumber")),
            None => self.body("HeapNumber", |body| match body {
                DataBody::HeapNumber(value) => Some(*value),
                _ => None,
            }),
        }
    }
}

impl<'b> MutableHeapNumberRef<'b> {
    /// Value at capture time. The live value may have changed since.
    pub fn value(&self) -> f64 {
        match self.live() {
            Some(heap) => heap
                .number_value(self.address())
                .or_fatal(|| self.mismatch("MutableHeapNumber")),
            None => self.body("MutableHeapNumber", |body| match body {
                DataBody::MutableHeapNumber(value) => Some(*value),
                _ => None,
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
