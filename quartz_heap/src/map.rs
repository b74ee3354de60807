//! Maps (hidden classes).
//!
//! A map describes the layout shared by every object that points to it: the
//! instance type, the size of the object, how many named fields are stored
//! in-object, and the own property descriptors in definition order.
//!
//! ```text
//!  JsObject                      Map
//!  +--------------+              +---------------------------+
//!  | map ---------+------------> | instance_type: JsObject   |
//!  | properties   |              | inobject_properties: 2    |
//!  | elements     |              | descriptors:              |
//!  | field 0      |  <-----------+   "x" Field(0) Smi        |
//!  | field 1      |  <-----------+   "y" Field(1) Double     |
//!  +--------------+              +---------------------------+
//! ```
//!
//! Fields whose index is at or beyond `inobject_properties` live in the
//! object's out-of-object property array.

use crate::handle::{HeapAddr, Tagged};
use crate::instance_type::{ElementsKind, InstanceType};

// =============================================================================
// Layout Constants
// =============================================================================

/// Size of one tagged slot in bytes.
pub const TAGGED_SIZE: u32 = 8;

/// Header size of every JS object: map, properties and elements words.
pub const JS_OBJECT_HEADER_SIZE: u32 = 3 * TAGGED_SIZE;

/// Largest instance size a map may describe.
pub const MAX_INSTANCE_SIZE: u32 = 2048;

/// Maximum number of named fields stored directly in an object.
pub const MAX_IN_OBJECT_PROPERTIES: usize =
    ((MAX_INSTANCE_SIZE - JS_OBJECT_HEADER_SIZE) / TAGGED_SIZE) as usize;

/// Objects larger than this are allocated outside the regular spaces.
pub const MAX_REGULAR_HEAP_OBJECT_SIZE: usize = 8 * 1024;

/// Header size of array-like storage: map and length words.
pub const FIXED_ARRAY_HEADER_SIZE: usize = 2 * TAGGED_SIZE as usize;

// =============================================================================
// Map Flags
// =============================================================================

bitflags::bitflags! {
    /// Bit field of a map.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapFlags: u16 {
        /// Objects are invisible to ordinary property probing (`typeof` is "undefined").
        const UNDETECTABLE = 1 << 0;
        /// Objects can be invoked.
        const CALLABLE = 1 << 1;
        /// Objects can be used with `new`.
        const CONSTRUCTOR = 1 << 2;
        /// The map was replaced by a more general one.
        const DEPRECATED = 1 << 3;
        /// No transitions away from this map are expected.
        const STABLE = 1 << 4;
        /// Named properties live in a hash table.
        const DICTIONARY = 1 << 5;
        /// Objects carry a prototype-or-initial-map slot.
        const HAS_PROTOTYPE_SLOT = 1 << 6;
        /// In-object slack tracking is still running.
        const SLACK_TRACKING = 1 << 7;
    }
}

impl Default for MapFlags {
    #[inline]
    fn default() -> Self {
        MapFlags::STABLE
    }
}

// =============================================================================
// Property Details
// =============================================================================

bitflags::bitflags! {
    /// Attributes of a named property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyAttributes: u8 {
        /// Value cannot be changed.
        const READ_ONLY = 1 << 0;
        /// Property is skipped by enumeration.
        const DONT_ENUM = 1 << 1;
        /// Property cannot be deleted.
        const DONT_DELETE = 1 << 2;
    }
}

/// Data or accessor property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Plain value.
    Data,
    /// Getter/setter pair.
    Accessor,
}

/// Where the value of a property is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyLocation {
    /// In a field of the object.
    Field,
    /// As a constant in the descriptor itself.
    Descriptor,
}

/// Tracked field representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Small integers only.
    Smi,
    /// Numbers stored as unboxed doubles.
    Double,
    /// Heap object references only.
    HeapObject,
    /// Anything.
    Tagged,
}

/// Packed description of one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDetails {
    /// Data or accessor.
    pub kind: PropertyKind,
    /// Field or descriptor constant.
    pub location: PropertyLocation,
    /// Field representation.
    pub representation: Representation,
    /// Attribute bits.
    pub attributes: PropertyAttributes,
}

impl PropertyDetails {
    /// Writable data field with the given representation.
    #[inline]
    pub const fn field(representation: Representation) -> Self {
        Self {
            kind: PropertyKind::Data,
            location: PropertyLocation::Field,
            representation,
            attributes: PropertyAttributes::empty(),
        }
    }

    /// Data constant stored in the descriptor.
    #[inline]
    pub const fn constant() -> Self {
        Self {
            kind: PropertyKind::Data,
            location: PropertyLocation::Descriptor,
            representation: Representation::Tagged,
            attributes: PropertyAttributes::empty(),
        }
    }

    /// Replace the attributes.
    #[inline]
    pub const fn with_attributes(self, attributes: PropertyAttributes) -> Self {
        Self { attributes, ..self }
    }

    /// Check if the property is read-only.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.attributes.contains(PropertyAttributes::READ_ONLY)
    }
}

/// One own property of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorEntry {
    /// Property key (an internalized string).
    pub key: HeapAddr,
    /// Property details.
    pub details: PropertyDetails,
    /// Field number, meaningful for `PropertyLocation::Field` only.
    pub field_index: u16,
}

/// Resolved position of a field inside an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldIndex {
    /// Field number counted over in-object and out-of-object fields.
    pub property_index: u16,
    /// Field is stored in the object itself.
    pub in_object: bool,
    /// Field has double representation.
    pub is_double: bool,
    /// Number of in-object fields of the owning map.
    pub inobject_properties: u16,
}

impl FieldIndex {
    /// Index into the out-of-object property array, `None` for in-object fields.
    #[inline]
    pub fn outobject_index(&self) -> Option<usize> {
        (!self.in_object).then(|| (self.property_index - self.inobject_properties) as usize)
    }
}

// =============================================================================
// Map
// =============================================================================

/// A hidden class.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    instance_type: InstanceType,
    flags: MapFlags,
    elements_kind: ElementsKind,
    instance_size: u32,
    inobject_properties: u16,
    descriptors: Vec<DescriptorEntry>,
    constructor_or_backpointer: Tagged,
    migration_target: Option<HeapAddr>,
}

impl Map {
    /// Create a map with no descriptors and no in-object fields.
    pub fn new(instance_type: InstanceType, constructor_or_backpointer: Tagged) -> Self {
        let instance_size = if instance_type.is_js_object() {
            JS_OBJECT_HEADER_SIZE
        } else {
            TAGGED_SIZE
        };
        Self {
            instance_type,
            flags: MapFlags::default(),
            elements_kind: ElementsKind::Holey,
            instance_size,
            inobject_properties: 0,
            descriptors: Vec::new(),
            constructor_or_backpointer,
            migration_target: None,
        }
    }

    /// Add flags.
    pub fn with_flags(mut self, flags: MapFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the elements kind.
    pub fn with_elements_kind(mut self, kind: ElementsKind) -> Self {
        self.elements_kind = kind;
        self
    }

    /// Reserve in-object space for `count` fields.
    pub fn with_inobject_properties(mut self, count: u16) -> Self {
        debug_assert!(count as usize <= MAX_IN_OBJECT_PROPERTIES);
        self.inobject_properties = count;
        self.instance_size = JS_OBJECT_HEADER_SIZE + count as u32 * TAGGED_SIZE;
        self
    }

    /// Append a field descriptor; the field number is assigned in order.
    pub fn with_field(mut self, key: HeapAddr, representation: Representation) -> Self {
        let field_index = self
            .descriptors
            .iter()
            .filter(|d| d.details.location == PropertyLocation::Field)
            .count() as u16;
        self.descriptors.push(DescriptorEntry {
            key,
            details: PropertyDetails::field(representation),
            field_index,
        });
        self
    }

    /// Append a constant descriptor.
    pub fn with_constant(mut self, key: HeapAddr) -> Self {
        self.descriptors.push(DescriptorEntry {
            key,
            details: PropertyDetails::constant(),
            field_index: 0,
        });
        self
    }

    /// Instance type of described objects.
    #[inline]
    pub fn instance_type(&self) -> InstanceType {
        self.instance_type
    }

    /// Bit field.
    #[inline]
    pub fn flags(&self) -> MapFlags {
        self.flags
    }

    /// Elements kind of described objects.
    #[inline]
    pub fn elements_kind(&self) -> ElementsKind {
        self.elements_kind
    }

    /// Instance size in bytes.
    #[inline]
    pub fn instance_size(&self) -> u32 {
        self.instance_size
    }

    /// Number of in-object field slots.
    #[inline]
    pub fn inobject_properties(&self) -> u16 {
        self.inobject_properties
    }

    /// Own descriptors in definition order.
    #[inline]
    pub fn descriptors(&self) -> &[DescriptorEntry] {
        &self.descriptors
    }

    /// Number of own descriptors.
    #[inline]
    pub fn number_of_own_descriptors(&self) -> usize {
        self.descriptors.len()
    }

    /// Constructor function or transition back pointer.
    #[inline]
    pub fn constructor_or_backpointer(&self) -> Tagged {
        self.constructor_or_backpointer
    }

    /// Replacement map once deprecated.
    #[inline]
    pub fn migration_target(&self) -> Option<HeapAddr> {
        self.migration_target
    }

    /// Check a flag.
    #[inline]
    pub fn has(&self, flag: MapFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Field position of descriptor `i`, `None` if it is not a field.
    pub fn field_index_for(&self, i: usize) -> Option<FieldIndex> {
        let entry = self.descriptors.get(i)?;
        if entry.details.location != PropertyLocation::Field {
            return None;
        }
        Some(FieldIndex {
            property_index: entry.field_index,
            in_object: entry.field_index < self.inobject_properties,
            is_double: entry.details.representation == Representation::Double,
            inobject_properties: self.inobject_properties,
        })
    }

    /// Byte offset of in-object field `index` from the object start.
    #[inline]
    pub fn inobject_property_offset(&self, index: usize) -> i64 {
        self.instance_size as i64 - (self.inobject_properties as i64 - index as i64) * TAGGED_SIZE as i64
    }

    /// A field with a specialized representation may be generalized later.
    pub fn can_be_deprecated(&self) -> bool {
        self.descriptors.iter().any(|d| {
            d.details.location == PropertyLocation::Field
                && d.details.representation != Representation::Tagged
        })
    }

    /// Only JS objects transition to other maps.
    #[inline]
    pub fn can_transition(&self) -> bool {
        self.instance_type.is_js_object()
    }

    pub(crate) fn deprecate(&mut self, target: HeapAddr) {
        self.flags.insert(MapFlags::DEPRECATED);
        self.flags.remove(MapFlags::STABLE);
        self.migration_target = Some(target);
    }

    pub(crate) fn set_constructor_or_backpointer(&mut self, value: Tagged) {
        self.constructor_or_backpointer = value;
    }
}

// =============================================================================
// Tests
// =============================================================================
