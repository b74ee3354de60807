//! Map facade.

use quartz_heap::{ElementsKind, FieldIndex, InstanceType, Map, MapFlags, PropertyDetails};

use super::{HeapObjectRef, NameRef, ObjectRef};
use crate::data::DataBody;
use crate::error::OrFatal;

define_ref! {
    /// Facade for a map (hidden class).
    MapRef => HeapObjectRef
}

impl<'b> MapRef<'b> {
    fn with_map<R>(&self, f: impl FnOnce(&Map) -> R) -> R {
        match self.live() {
            Some(heap) => heap.map(self.address()).map(|map| f(&map)).or_fatal(|| self.mismatch("Map")),
            None => self.body("Map", |body| match body {
                DataBody::Map(data) => Some(f(&data.map)),
                _ => None,
            }),
        }
    }

    pub fn instance_type(&self) -> InstanceType {
        self.with_map(Map::instance_type)
    }

    pub fn elements_kind(&self) -> ElementsKind {
        self.with_map(Map::elements_kind)
    }

    /// Instance size in bytes.
    pub fn instance_size(&self) -> u32 {
        self.with_map(Map::instance_size)
    }

    pub fn inobject_properties(&self) -> u16 {
        self.with_map(Map::inobject_properties)
    }

    pub fn number_of_own_descriptors(&self) -> usize {
        self.with_map(Map::number_of_own_descriptors)
    }

    /// Details of descriptor `index`. Fatal when out of range.
    pub fn property_details(&self, index: usize) -> PropertyDetails {
        self.with_map(|map| map.descriptors().get(index).map(|entry| entry.details))
            .or_fatal(|| self.out_of_bounds(index as i64))
    }

    /// Key of descriptor `index`. Fatal when out of range.
    pub fn property_key(&self, index: usize) -> NameRef<'b> {
        let key = match self.live() {
            Some(_) => self
                .with_map(|map| map.descriptors().get(index).map(|entry| entry.key))
                .map(|key| self.live_sibling(key.into())),
            None => self
                .body("Map", |body| match body {
                    DataBody::Map(data) => Some(data.keys.get(index).copied()),
                    _ => None,
                })
                .map(|id| self.sibling(id)),
        };
        key.or_fatal(|| self.out_of_bounds(index as i64)).as_name()
    }

    /// Field position of descriptor `index`, `None` for constants.
    pub fn field_index_for(&self, index: usize) -> Option<FieldIndex> {
        self.with_map(|map| map.field_index_for(index))
    }

    /// Byte offset of in-object field `index`.
    pub fn inobject_property_offset(&self, index: usize) -> i64 {
        self.with_map(|map| map.inobject_property_offset(index))
    }

    pub fn is_deprecated(&self) -> bool {
        self.with_map(|map| map.has(MapFlags::DEPRECATED))
    }

    pub fn can_be_deprecated(&self) -> bool {
        self.with_map(Map::can_be_deprecated)
    }

    pub fn is_stable(&self) -> bool {
        self.with_map(|map| map.has(MapFlags::STABLE))
    }

    pub fn can_transition(&self) -> bool {
        self.with_map(Map::can_transition)
    }

    pub fn is_dictionary_map(&self) -> bool {
        self.with_map(|map| map.has(MapFlags::DICTIONARY))
    }

    pub fn is_js_array_map(&self) -> bool {
        self.instance_type().is_js_array()
    }

    /// Check if this is the map of copy-on-write arrays.
    pub fn is_fixed_cow_array_map(&self) -> bool {
        match self.live() {
            Some(heap) => self.address() == heap.roots().fixed_cow_array_map,
            None => self.body("Map", |body| match body {
                DataBody::Map(data) => Some(data.is_fixed_cow_array_map),
                _ => None,
            }),
        }
    }

    pub fn has_prototype_slot(&self) -> bool {
        self.with_map(|map| map.has(MapFlags::HAS_PROTOTYPE_SLOT))
    }

    pub fn is_inobject_slack_tracking_in_progress(&self) -> bool {
        self.with_map(|map| map.has(MapFlags::SLACK_TRACKING))
    }

    /// Instances may be called with `new`.
    pub fn is_constructor(&self) -> bool {
        self.with_map(|map| map.has(MapFlags::CONSTRUCTOR))
    }

    pub fn is_callable(&self) -> bool {
        self.with_map(|map| map.has(MapFlags::CALLABLE))
    }

    pub fn is_undetectable(&self) -> bool {
        self.with_map(|map| map.has(MapFlags::UNDETECTABLE))
    }

    /// Constructor function, or the map this one transitioned from.
    pub fn constructor_or_backpointer(&self) -> ObjectRef<'b> {
        match self.live() {
            Some(_) => {
                let value = self.with_map(Map::constructor_or_backpointer);
                self.live_sibling(value)
            }
            None => {
                let id = self.body("Map", |body| match body {
                    DataBody::Map(data) => Some(data.constructor_or_backpointer),
                    _ => None,
                });
                self.sibling(id)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
