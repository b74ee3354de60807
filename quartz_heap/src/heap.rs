//! The managed heap.
//!
//! Objects live in a slot vector guarded by a `parking_lot::RwLock`. Slots are
//! never reused, so a [`HeapAddr`] is a stable identity for the lifetime of
//! the heap. Reads take the lock recursively and hand out mapped guards that
//! borrow one body; writes are limited to the mutator API and the two narrow
//! mutations the compiler is allowed to perform (`try_migrate_instance` and
//! `promote`).

use std::sync::Arc;

use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap;

use crate::handle::{HeapAddr, Tagged};
use crate::instance_type::InstanceType;
use crate::map::{Map, MapFlags, Representation};
use crate::object::{
    AllocationSiteBody, Builtin, ContextBody, FieldValue, Generation, HeapObject, HeapObjectBody,
    JsArrayFields, JsFunctionFields, JsObjectBody, ModuleBody, OddballBody, PropertyCellBody,
    ScopeInfoBody, SharedFunctionInfoBody,
};
use crate::roots::{NativeContextSlot, ReadOnlyRoots};

// =============================================================================
// Heap
// =============================================================================

/// A heap with its read-only roots and one native context.
pub struct Heap {
    pub(crate) objects: RwLock<Vec<HeapObject>>,
    pub(crate) strings: Mutex<FxHashMap<Arc<str>, HeapAddr>>,
    pub(crate) roots: ReadOnlyRoots,
    pub(crate) native_context: HeapAddr,
    /// Bootstrap values of the named native context slots.
    pub(crate) native_slots: [HeapAddr; NativeContextSlot::COUNT],
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("objects", &self.object_count())
            .field("native_context", &self.native_context)
            .finish()
    }
}

impl Heap {
    /// Read-only roots.
    #[inline]
    pub fn roots(&self) -> &ReadOnlyRoots {
        &self.roots
    }

    /// The native context.
    #[inline]
    pub fn native_context(&self) -> HeapAddr {
        self.native_context
    }

    /// Number of allocated objects.
    pub fn object_count(&self) -> usize {
        self.objects.read_recursive().len()
    }

    // -------------------------------------------------------------------------
    // Generic reads
    // -------------------------------------------------------------------------

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, Vec<HeapObject>> {
        self.objects.read_recursive()
    }

    fn project<T: ?Sized>(
        &self,
        addr: HeapAddr,
        f: impl FnOnce(&HeapObjectBody) -> Option<&T>,
    ) -> Option<MappedRwLockReadGuard<'_, T>> {
        RwLockReadGuard::try_map(self.read(), |objects| {
            objects.get(addr.index()).and_then(|object| f(&object.body))
        })
        .ok()
    }

    fn copy<T>(&self, addr: HeapAddr, f: impl FnOnce(&HeapObjectBody) -> Option<T>) -> Option<T> {
        let objects = self.read();
        objects.get(addr.index()).and_then(|object| f(&object.body))
    }

    /// Check that `addr` names an allocated object.
    #[inline]
    pub fn contains(&self, addr: HeapAddr) -> bool {
        addr.index() < self.read().len()
    }

    /// Map of the object at `addr`.
    pub fn map_of(&self, addr: HeapAddr) -> Option<HeapAddr> {
        self.read().get(addr.index()).map(|object| object.map)
    }

    /// Generation of the object at `addr`.
    pub fn generation_of(&self, addr: HeapAddr) -> Option<Generation> {
        self.read().get(addr.index()).map(|object| object.generation)
    }

    /// Instance type of the object at `addr`, read through its map.
    pub fn instance_type_of(&self, addr: HeapAddr) -> Option<InstanceType> {
        let objects = self.read();
        let map = objects.get(addr.index())?.map;
        match &objects.get(map.index())?.body {
            HeapObjectBody::Map(map) => Some(map.instance_type()),
            _ => None,
        }
    }

    /// Instance type of a tagged value, `None` for Smis.
    #[inline]
    pub fn instance_type(&self, value: Tagged) -> Option<InstanceType> {
        self.instance_type_of(value.as_heap()?)
    }

    /// Check if a tagged value is a JS object.
    #[inline]
    pub fn is_js_object(&self, value: Tagged) -> bool {
        self.instance_type(value).is_some_and(InstanceType::is_js_object)
    }

    // -------------------------------------------------------------------------
    // Typed reads
    // -------------------------------------------------------------------------

    /// Map body of the map at `addr`.
    pub fn map(&self, addr: HeapAddr) -> Option<MappedRwLockReadGuard<'_, Map>> {
        self.project(addr, |body| match body {
            HeapObjectBody::Map(map) => Some(map),
            _ => None,
        })
    }

    /// Oddball contents.
    pub fn oddball(&self, addr: HeapAddr) -> Option<OddballBody> {
        self.copy(addr, |body| match body {
            HeapObjectBody::Oddball(oddball) => Some(*oddball),
            _ => None,
        })
    }

    /// Value of a heap number (mutable or not).
    pub fn number_value(&self, addr: HeapAddr) -> Option<f64> {
        self.copy(addr, |body| match body {
            HeapObjectBody::Number(value) => Some(*value),
            _ => None,
        })
    }

    /// String contents.
    pub fn string(&self, addr: HeapAddr) -> Option<Arc<str>> {
        self.copy(addr, |body| match body {
            HeapObjectBody::String(value) => Some(Arc::clone(value)),
            _ => None,
        })
    }

    /// Tagged storage contents.
    pub fn fixed_array(&self, addr: HeapAddr) -> Option<MappedRwLockReadGuard<'_, [Tagged]>> {
        self.project(addr, |body| match body {
            HeapObjectBody::FixedArray(values) => Some(values.as_slice()),
            _ => None,
        })
    }

    /// Double storage contents.
    pub fn fixed_double_array(
        &self,
        addr: HeapAddr,
    ) -> Option<MappedRwLockReadGuard<'_, [Option<f64>]>> {
        self.project(addr, |body| match body {
            HeapObjectBody::FixedDoubleArray(values) => Some(values.as_slice()),
            _ => None,
        })
    }

    /// Length of array-like storage.
    pub fn storage_length(&self, addr: HeapAddr) -> Option<usize> {
        self.copy(addr, HeapObjectBody::storage_length)
    }

    /// Allocation size of array-like storage in bytes.
    pub fn storage_size(&self, addr: HeapAddr) -> Option<usize> {
        self.copy(addr, HeapObjectBody::storage_size)
    }

    /// JS object part of any JS object.
    pub fn js_object(&self, addr: HeapAddr) -> Option<MappedRwLockReadGuard<'_, JsObjectBody>> {
        self.project(addr, HeapObjectBody::as_js_object)
    }

    /// Array fields.
    pub fn js_array(&self, addr: HeapAddr) -> Option<JsArrayFields> {
        self.copy(addr, |body| match body {
            HeapObjectBody::JsArray(_, array) => Some(*array),
            _ => None,
        })
    }

    /// Function fields.
    pub fn js_function(&self, addr: HeapAddr) -> Option<JsFunctionFields> {
        self.copy(addr, |body| match body {
            HeapObjectBody::JsFunction(_, function) => Some(*function),
            _ => None,
        })
    }

    /// Context contents.
    pub fn context(&self, addr: HeapAddr) -> Option<MappedRwLockReadGuard<'_, ContextBody>> {
        self.project(addr, |body| match body {
            HeapObjectBody::Context(context) => Some(context),
            _ => None,
        })
    }

    /// Previous context in the chain, `None` at the outermost context.
    pub fn context_previous(&self, addr: HeapAddr) -> Option<HeapAddr> {
        let previous = self.context(addr)?.previous_raw()?.as_heap()?;
        self.instance_type_of(previous)
            .filter(|ty| ty.is_context())
            .map(|_| previous)
    }

    /// Script contexts of a table.
    pub fn script_context_table(
        &self,
        addr: HeapAddr,
    ) -> Option<MappedRwLockReadGuard<'_, [HeapAddr]>> {
        self.project(addr, |body| match body {
            HeapObjectBody::ScriptContextTable(contexts) => Some(contexts.as_slice()),
            _ => None,
        })
    }

    /// Scope info contents.
    pub fn scope_info(&self, addr: HeapAddr) -> Option<MappedRwLockReadGuard<'_, ScopeInfoBody>> {
        self.project(addr, |body| match body {
            HeapObjectBody::ScopeInfo(info) => Some(info),
            _ => None,
        })
    }

    /// Shared function info contents.
    pub fn shared_function_info(
        &self,
        addr: HeapAddr,
    ) -> Option<MappedRwLockReadGuard<'_, SharedFunctionInfoBody>> {
        self.project(addr, |body| match body {
            HeapObjectBody::SharedFunctionInfo(shared) => Some(shared),
            _ => None,
        })
    }

    /// Module contents.
    pub fn module(&self, addr: HeapAddr) -> Option<MappedRwLockReadGuard<'_, ModuleBody>> {
        self.project(addr, |body| match body {
            HeapObjectBody::Module(module) => Some(module),
            _ => None,
        })
    }

    /// Cell value.
    pub fn cell(&self, addr: HeapAddr) -> Option<Tagged> {
        self.copy(addr, |body| match body {
            HeapObjectBody::Cell(value) => Some(*value),
            _ => None,
        })
    }

    /// Property cell contents.
    pub fn property_cell(&self, addr: HeapAddr) -> Option<PropertyCellBody> {
        self.copy(addr, |body| match body {
            HeapObjectBody::PropertyCell(cell) => Some(*cell),
            _ => None,
        })
    }

    /// Allocation site contents.
    pub fn allocation_site(&self, addr: HeapAddr) -> Option<AllocationSiteBody> {
        self.copy(addr, |body| match body {
            HeapObjectBody::AllocationSite(site) => Some(*site),
            _ => None,
        })
    }

    /// Builtin implemented by a code object.
    pub fn code(&self, addr: HeapAddr) -> Option<Builtin> {
        self.copy(addr, |body| match body {
            HeapObjectBody::Code(builtin) => Some(*builtin),
            _ => None,
        })
    }

    // -------------------------------------------------------------------------
    // Mutator writes
    // -------------------------------------------------------------------------

    fn update(&self, addr: HeapAddr, f: impl FnOnce(&mut HeapObject) -> bool) -> bool {
        let mut objects = self.objects.write();
        objects.get_mut(addr.index()).is_some_and(f)
    }

    /// Store an in-object field.
    pub fn set_field(&self, object: HeapAddr, index: usize, value: FieldValue) -> bool {
        self.update(object, |o| {
            match o.body.as_js_object_mut().and_then(|body| body.in_object.get_mut(index)) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            }
        })
    }

    /// Replace the backing storage of a JS object.
    pub fn set_elements(&self, object: HeapAddr, elements: HeapAddr) -> bool {
        self.update(object, |o| match o.body.as_js_object_mut() {
            Some(body) => {
                body.elements = elements;
                true
            }
            None => false,
        })
    }

    /// Replace the out-of-object property storage of a JS object.
    pub fn set_properties(&self, object: HeapAddr, properties: HeapAddr) -> bool {
        self.update(object, |o| match o.body.as_js_object_mut() {
            Some(body) => {
                body.properties = properties;
                true
            }
            None => false,
        })
    }

    /// Store into tagged storage.
    pub fn set_element(&self, storage: HeapAddr, index: usize, value: Tagged) -> bool {
        self.update(storage, |o| match &mut o.body {
            HeapObjectBody::FixedArray(values) if index < values.len() => {
                values[index] = value;
                true
            }
            _ => false,
        })
    }

    /// Set the `length` of an array.
    pub fn set_array_length(&self, array: HeapAddr, length: Tagged) -> bool {
        self.update(array, |o| match &mut o.body {
            HeapObjectBody::JsArray(_, fields) => {
                fields.length = length;
                true
            }
            _ => false,
        })
    }

    /// Store a context slot.
    pub fn set_context_slot(&self, context: HeapAddr, index: usize, value: Tagged) -> bool {
        self.update(context, |o| match &mut o.body {
            HeapObjectBody::Context(body) if index < body.slots.len() => {
                body.slots[index] = value;
                true
            }
            _ => false,
        })
    }

    /// Store a cell value.
    pub fn set_cell_value(&self, cell: HeapAddr, value: Tagged) -> bool {
        self.update(cell, |o| match &mut o.body {
            HeapObjectBody::Cell(slot) => {
                *slot = value;
                true
            }
            _ => false,
        })
    }

    /// Store a property cell value.
    pub fn set_property_cell_value(&self, cell: HeapAddr, value: Tagged) -> bool {
        self.update(cell, |o| match &mut o.body {
            HeapObjectBody::PropertyCell(body) => {
                body.value = value;
                true
            }
            _ => false,
        })
    }

    /// Install the initial map of a function.
    pub fn set_initial_map(&self, function: HeapAddr, map: HeapAddr) -> bool {
        self.update(function, |o| match &mut o.body {
            HeapObjectBody::JsFunction(_, fields) => {
                fields.initial_map = Some(map);
                true
            }
            _ => false,
        })
    }

    /// Mark `old` deprecated in favor of `replacement`.
    pub fn deprecate_map(&self, old: HeapAddr, replacement: HeapAddr) -> bool {
        self.update(old, |o| match &mut o.body {
            HeapObjectBody::Map(map) => {
                map.deprecate(replacement);
                true
            }
            _ => false,
        })
    }

    // -------------------------------------------------------------------------
    // Narrow mutations used by the compiler
    // -------------------------------------------------------------------------

    /// Move an object off a deprecated map.
    ///
    /// Follows the migration chain to the first non-deprecated map and
    /// rewrites the in-object fields to the target representations, boxing or
    /// unboxing doubles as needed. Returns `false` if the chain ends without a
    /// usable target, loops back on itself, or the layouts disagree; the
    /// object is unchanged then.
    pub fn try_migrate_instance(&self, object: HeapAddr) -> bool {
        let mut objects = self.objects.write();

        let Some(map_addr) = objects.get(object.index()).map(|o| o.map) else {
            return false;
        };
        let Some(old_map) = map_body(&objects, map_addr).cloned() else {
            return false;
        };
        if !old_map.has(MapFlags::DEPRECATED) {
            return true;
        }

        // A chain longer than the heap has objects revisits a map.
        let mut target = old_map.migration_target();
        let mut new_map = None;
        for _ in 0..objects.len() {
            let Some(addr) = target else { return false };
            let Some(map) = map_body(&objects, addr) else {
                return false;
            };
            if !map.has(MapFlags::DEPRECATED) {
                new_map = Some((addr, map.clone()));
                break;
            }
            target = map.migration_target();
        }
        let Some((new_map_addr, new_map)) = new_map else {
            return false;
        };
        if new_map.inobject_properties() != old_map.inobject_properties()
            || new_map.number_of_own_descriptors() < old_map.number_of_own_descriptors()
        {
            return false;
        }

        let Some(mut fields) = objects[object.index()]
            .body
            .as_js_object()
            .map(|body| body.in_object.clone())
        else {
            return false;
        };

        for i in 0..new_map.number_of_own_descriptors() {
            let Some(index) = new_map.field_index_for(i) else { continue };
            if !index.in_object {
                continue;
            }
            let Some(slot) = fields.get_mut(index.property_index as usize) else {
                return false;
            };
            let representation = new_map.descriptors()[i].details.representation;
            *slot = match (*slot, representation) {
                (FieldValue::Double(value), Representation::Double) => FieldValue::Double(value),
                (FieldValue::Tagged(Tagged::Smi(value)), Representation::Double) => {
                    FieldValue::Double(value as f64)
                }
                (FieldValue::Tagged(Tagged::Heap(boxed)), Representation::Double) => {
                    match &objects[boxed.index()].body {
                        HeapObjectBody::Number(value) => FieldValue::Double(*value),
                        _ => return false,
                    }
                }
                (FieldValue::Double(value), _) => {
                    let boxed = HeapAddr::from_raw(objects.len() as u32);
                    objects.push(HeapObject {
                        map: self.roots.mutable_heap_number_map,
                        generation: Generation::Nursery,
                        body: HeapObjectBody::Number(value),
                    });
                    FieldValue::Tagged(Tagged::Heap(boxed))
                }
                (tagged, _) => tagged,
            };
        }

        let target_object = &mut objects[object.index()];
        target_object.map = new_map_addr;
        if let Some(body) = target_object.body.as_js_object_mut() {
            body.in_object = fields;
        }
        true
    }

    /// Promote a young object to the old generation, keeping its identity.
    ///
    /// Returns `true` if the object was young.
    pub fn promote(&self, addr: HeapAddr) -> bool {
        self.update(addr, |o| {
            if o.generation.is_young() {
                o.generation = Generation::Tenured;
                true
            } else {
                false
            }
        })
    }

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------

    /// One-line description of a value for tracing.
    pub fn short_print(&self, value: Tagged) -> String {
        let addr = match value {
            Tagged::Smi(value) => return format!("Smi {value}"),
            Tagged::Heap(addr) => addr,
        };
        let objects = self.read();
        let Some(object) = objects.get(addr.index()) else {
            return format!("<invalid {addr:?}>");
        };
        match &object.body {
            HeapObjectBody::Map(map) => format!("<Map({})>", map.instance_type()),
            HeapObjectBody::Oddball(oddball) => format!("{:?}", oddball.kind).to_lowercase(),
            HeapObjectBody::Number(value) => format!("{value}"),
            HeapObjectBody::String(value) => match map_body(&objects, object.map) {
                Some(map) if map.instance_type().is_internalized_string() => format!("#{value}"),
                _ => format!("\"{value}\""),
            },
            HeapObjectBody::FixedArray(values) => format!("<FixedArray[{}]>", values.len()),
            HeapObjectBody::FixedDoubleArray(values) => {
                format!("<FixedDoubleArray[{}]>", values.len())
            }
            HeapObjectBody::JsFunction(_, function) => {
                let name = match objects.get(function.shared.index()).map(|o| &o.body) {
                    Some(HeapObjectBody::SharedFunctionInfo(shared)) => {
                        match objects.get(shared.name.index()).map(|o| &o.body) {
                            Some(HeapObjectBody::String(name)) => name.to_string(),
                            _ => String::new(),
                        }
                    }
                    _ => String::new(),
                };
                format!("<JSFunction {name}>")
            }
            _ => match map_body(&objects, object.map) {
                Some(map) => format!("<{}>", map.instance_type()),
                None => "<unknown>".to_string(),
            },
        }
    }
}

fn map_body(objects: &[HeapObject], addr: HeapAddr) -> Option<&Map> {
    match &objects.get(addr.index())?.body {
        HeapObjectBody::Map(map) => Some(map),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance_type::ElementsKind;
    use crate::object::OddballKind;

    #[test]
    fn test_meta_map_is_its_own_map() {
        let heap = Heap::new();
        let meta = heap.roots().meta_map;
        assert_eq!(heap.map_of(meta), Some(meta));
        assert_eq!(heap.instance_type_of(meta), Some(InstanceType::Map));
    }

    #[test]
    fn test_typed_getters_check_kind() {
        let heap = Heap::new();
        let number = heap.new_heap_number(1.5);
        assert_eq!(heap.number_value(number), Some(1.5));
        assert!(heap.string(number).is_none());
        assert!(heap.map(number).is_none());
        assert!(heap.fixed_array(number).is_none());
        assert!(heap.map_of(HeapAddr::from_raw(u32::MAX)).is_none());
    }

    #[test]
    fn test_oddballs() {
        let heap = Heap::new();
        let roots = heap.roots();
        assert_eq!(heap.oddball(roots.true_value).unwrap().kind, OddballKind::True);
        assert_eq!(heap.oddball(roots.null_value).unwrap().to_number, 0.0);
        assert!(heap.oddball(roots.undefined_value).unwrap().to_number.is_nan());
        assert_eq!(heap.map_of(roots.true_value), heap.map_of(roots.false_value));
    }

    #[test]
    fn test_set_field_and_elements() {
        let heap = Heap::new();
        let map = heap.new_object_map(&[("a", Representation::Tagged)], ElementsKind::Packed);
        let object = heap.new_js_object(map, vec![FieldValue::Tagged(Tagged::smi(1))]);

        assert!(heap.set_field(object, 0, FieldValue::Tagged(Tagged::smi(2))));
        assert!(!heap.set_field(object, 1, FieldValue::Tagged(Tagged::smi(2))));
        assert_eq!(
            heap.js_object(object).unwrap().in_object[0],
            FieldValue::Tagged(Tagged::smi(2))
        );

        let elements = heap.new_fixed_array(vec![Tagged::smi(1), Tagged::smi(2)]);
        assert!(heap.set_elements(object, elements));
        assert!(heap.set_element(elements, 1, Tagged::smi(9)));
        assert!(!heap.set_element(elements, 2, Tagged::smi(9)));
        assert_eq!(heap.fixed_array(elements).unwrap()[1], Tagged::smi(9));
    }

    #[test]
    fn test_promote_keeps_identity() {
        let heap = Heap::new();
        let storage = heap.new_fixed_array(vec![Tagged::smi(1)]);
        assert_eq!(heap.generation_of(storage), Some(Generation::Nursery));
        assert!(heap.promote(storage));
        assert_eq!(heap.generation_of(storage), Some(Generation::Tenured));
        assert!(!heap.promote(storage));
        assert_eq!(heap.fixed_array(storage).unwrap().len(), 1);
    }

    #[test]
    fn test_try_migrate_instance_generalizes_fields() {
        let heap = Heap::new();
        let old = heap.new_object_map(
            &[("x", Representation::Double), ("y", Representation::Smi)],
            ElementsKind::Holey,
        );
        let object = heap.new_js_object(
            old,
            vec![FieldValue::Double(2.5), FieldValue::Tagged(Tagged::smi(4))],
        );
        let new = heap.new_object_map(
            &[("x", Representation::Tagged), ("y", Representation::Double)],
            ElementsKind::Holey,
        );
        assert!(heap.deprecate_map(old, new));

        assert!(heap.try_migrate_instance(object));
        assert_eq!(heap.map_of(object), Some(new));

        let fields = heap.js_object(object).unwrap().in_object.clone();
        let FieldValue::Tagged(Tagged::Heap(boxed)) = fields[0] else {
            panic!("expected a boxed double, got {:?}", fields[0]);
        };
        assert_eq!(heap.number_value(boxed), Some(2.5));
        assert_eq!(fields[1], FieldValue::Double(4.0));
    }

    #[test]
    fn test_try_migrate_instance_without_target_fails() {
        let heap = Heap::new();
        let old = heap.new_object_map(&[("x", Representation::Smi)], ElementsKind::Holey);
        let object = heap.new_js_object(old, vec![FieldValue::Tagged(Tagged::smi(1))]);
        let mismatched = heap.new_object_map(&[], ElementsKind::Holey);
        heap.deprecate_map(old, mismatched);
        assert!(!heap.try_migrate_instance(object));
        assert_eq!(heap.map_of(object), Some(old));
    }

    #[test]
    fn test_try_migrate_instance_with_cyclic_chain_fails() {
        let heap = Heap::new();
        let a = heap.new_object_map(&[("x", Representation::Smi)], ElementsKind::Holey);
        let b = heap.new_object_map(&[("x", Representation::Smi)], ElementsKind::Holey);
        let object = heap.new_js_object(a, vec![FieldValue::Tagged(Tagged::smi(1))]);
        assert!(heap.deprecate_map(a, b));
        assert!(heap.deprecate_map(b, a));
        assert!(!heap.try_migrate_instance(object));
        assert_eq!(heap.map_of(object), Some(a));
    }

    #[test]
    fn test_try_migrate_instance_on_current_map() {
        let heap = Heap::new();
        let map = heap.new_object_map(&[], ElementsKind::Holey);
        let object = heap.new_js_object(map, vec![]);
        assert!(heap.try_migrate_instance(object));
        assert_eq!(heap.map_of(object), Some(map));
    }

    #[test]
    fn test_context_previous_chain() {
        let heap = Heap::new();
        let scope = heap.new_scope_info(&[]);
        let native = heap.native_context();
        let outer = heap.new_function_context(native, scope, vec![]);
        let inner = heap.new_function_context(outer, scope, vec![]);
        assert_eq!(heap.context_previous(inner), Some(outer));
        assert_eq!(heap.context_previous(outer), Some(native));
        assert_eq!(heap.context_previous(native), None);
    }

    #[test]
    fn test_short_print() {
        let heap = Heap::new();
        let roots = heap.roots().clone();
        assert_eq!(heap.short_print(Tagged::smi(3)), "Smi 3");
        assert_eq!(heap.short_print(roots.true_value.into()), "true");
        assert_eq!(heap.short_print(roots.length_string.into()), "#length");
        assert_eq!(heap.short_print(roots.meta_map.into()), "<Map(MAP_TYPE)>");
        let s = heap.new_string("abc");
        assert_eq!(heap.short_print(s.into()), "\"abc\"");
    }
}
