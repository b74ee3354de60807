//! Fast-literal classification of allocation-site boilerplates.
//!
//! A boilerplate is *fast* when the compiler may inline a copy of it: the
//! object graph is shallow, small, free of dictionary-mode storage, and every
//! map on it is up to date.

use quartz_heap::{
    FieldValue, HeapAddr, MAX_IN_OBJECT_PROPERTIES, MAX_REGULAR_HEAP_OBJECT_SIZE, MapFlags, Tagged,
};
use smallvec::SmallVec;

use crate::access::LiveHeap;

/// Maximum nesting depth of a fast literal, the boilerplate itself included.
pub const MAX_FAST_LITERAL_DEPTH: usize = 3;

/// Maximum number of elements and fields across a fast literal's graph.
pub const MAX_FAST_LITERAL_PROPERTIES: usize = MAX_IN_OBJECT_PROPERTIES;

/// Depth and property allowance for one classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastLiteralBudget {
    depth: usize,
    properties: usize,
}

impl FastLiteralBudget {
    pub const fn new(depth: usize, properties: usize) -> Self {
        Self { depth, properties }
    }

    /// Depth allowance.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Property units not yet spent.
    #[inline]
    pub const fn remaining_properties(&self) -> usize {
        self.properties
    }
}

impl Default for FastLiteralBudget {
    fn default() -> Self {
        Self::new(MAX_FAST_LITERAL_DEPTH, MAX_FAST_LITERAL_PROPERTIES)
    }
}

/// Check whether `boilerplate` can be copied inline.
///
/// Spends one property unit per element and per field visited, shared across
/// the whole graph. May migrate objects off deprecated maps, which is why it
/// needs live heap access.
pub fn is_fast_literal(
    heap: LiveHeap<'_>,
    boilerplate: HeapAddr,
    budget: &mut FastLiteralBudget,
) -> bool {
    is_fast_literal_helper(heap, boilerplate, budget.depth, &mut budget.properties)
}

fn spend(max_properties: &mut usize) -> bool {
    if *max_properties == 0 {
        return false;
    }
    *max_properties -= 1;
    true
}

fn is_fast_literal_helper(
    heap: LiveHeap<'_>,
    boilerplate: HeapAddr,
    max_depth: usize,
    max_properties: &mut usize,
) -> bool {
    // Migration takes the heap write lock: no read guard may be held here.
    if !heap.try_migrate_instance(boilerplate) {
        return false;
    }
    if max_depth == 0 {
        return false;
    }

    let Some(map) = heap.map_of(boilerplate).and_then(|addr| heap.map(addr).map(|m| m.clone()))
    else {
        return false;
    };
    let Some((properties, elements, fields)) = heap
        .js_object(boilerplate)
        .map(|o| (o.properties, o.elements, o.in_object.clone()))
    else {
        return false;
    };

    // Elements.
    let length = heap.storage_length(elements).unwrap_or(0);
    let is_cow = heap.map_of(elements) == Some(heap.roots().fixed_cow_array_map);
    if length > 0 && !is_cow {
        let kind = map.elements_kind();
        if kind.is_smi_or_object() {
            let values: SmallVec<[Tagged; 16]> = match heap.fixed_array(elements) {
                Some(values) => values.iter().copied().collect(),
                None => return false,
            };
            for value in values {
                if !spend(max_properties) {
                    return false;
                }
                if let Tagged::Heap(nested) = value
                    && heap.is_js_object(value)
                    && !is_fast_literal_helper(heap, nested, max_depth - 1, max_properties)
                {
                    return false;
                }
            }
        } else if kind.is_double() {
            if heap.storage_size(elements).unwrap_or(usize::MAX) > MAX_REGULAR_HEAP_OBJECT_SIZE {
                return false;
            }
        } else {
            return false;
        }
    }

    // Named properties: only in-object fields on a fast map.
    if map.has(MapFlags::DICTIONARY) || heap.storage_length(properties).unwrap_or(0) != 0 {
        return false;
    }

    for i in 0..map.number_of_own_descriptors() {
        let Some(index) = map.field_index_for(i) else { continue };
        if !spend(max_properties) {
            return false;
        }
        if index.in_object && index.is_double {
            continue;
        }
        let Some(value) = fields.get(index.property_index as usize) else {
            return false;
        };
        if let FieldValue::Tagged(value @ Tagged::Heap(nested)) = *value
            && heap.is_js_object(value)
            && !is_fast_literal_helper(heap, nested, max_depth - 1, max_properties)
        {
            return false;
        }
    }
    true
}

// =============================================================================
// Tests
// =============================================================================
