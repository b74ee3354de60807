//! Contexts, scope metadata and the script context table.

use quartz_heap::object::{PREVIOUS_INDEX, SCOPE_INFO_INDEX};
use quartz_heap::{ElementsKind, MIN_CONTEXT_SLOTS, NativeContextSlot, Tagged, VariableMode};

use super::{
    HeapObjectRef, JsFunctionRef, JsGlobalProxyRef, MapRef, NameRef, ObjectRef,
};
use crate::data::DataBody;
use crate::error::{BrokerViolation, OrFatal, fatal};

define_ref! {
    /// Facade for a context of any kind.
    ContextRef => HeapObjectRef
}

define_ref! {
    /// Facade for the global execution context.
    NativeContextRef => ContextRef
}

define_ref! {
    ScriptContextTableRef => HeapObjectRef
}

define_ref! {
    ScopeInfoRef => HeapObjectRef
}

/// Where a script-level binding lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptContextLookup<'b> {
    /// Script context holding the binding.
    pub context: ContextRef<'b>,
    /// The binding was declared `const`.
    pub immutable: bool,
    /// Slot index inside `context`.
    pub index: usize,
}

// =============================================================================
// ContextRef
// =============================================================================

impl<'b> ContextRef<'b> {
    fn slot(&self, index: usize) -> Option<ObjectRef<'b>> {
        match self.live() {
            Some(heap) => heap
                .context(self.address())
                .and_then(|context| context.get(index))
                .map(|value| self.live_sibling(value)),
            None => self
                .body("Context", |body| match body {
                    DataBody::Context(context) => Some(context.slots.get(index).copied()),
                    _ => None,
                })
                .map(|id| self.sibling(id)),
        }
    }

    /// Number of slots, header included.
    pub fn length(&self) -> usize {
        match self.live() {
            Some(heap) => heap
                .context(self.address())
                .map(|context| context.length())
                .or_fatal(|| self.mismatch("Context")),
            None => self.body("Context", |body| match body {
                DataBody::Context(context) => Some(context.slots.len()),
                _ => None,
            }),
        }
    }

    /// Slot `index`. Fatal when out of bounds.
    pub fn get(&self, index: usize) -> ObjectRef<'b> {
        self.slot(index).or_fatal(|| self.out_of_bounds(index as i64))
    }

    /// Enclosing context, `None` for the outermost one.
    pub fn previous(&self) -> Option<ContextRef<'b>> {
        self.slot(PREVIOUS_INDEX)
            .filter(|previous| previous.is_context())
            .map(|previous| previous.as_context())
    }

    pub fn scope_info(&self) -> ScopeInfoRef<'b> {
        self.get(SCOPE_INFO_INDEX).as_scope_info()
    }
}

// =============================================================================
// NativeContextRef
// =============================================================================

impl<'b> NativeContextRef<'b> {
    fn named(&self, slot: NativeContextSlot) -> ObjectRef<'b> {
        self.get(slot.index())
    }

    pub fn sloppy_arguments_map(&self) -> MapRef<'b> {
        if self.live().is_some() {
            return self.named(NativeContextSlot::SloppyArgumentsMap).as_map();
        }
        let id = self.body("NativeContext", |body| match body {
            DataBody::Context(context) => context.native.map(|native| native.sloppy_arguments_map),
            _ => None,
        });
        self.sibling(id).as_map()
    }

    pub fn strict_arguments_map(&self) -> MapRef<'b> {
        self.named(NativeContextSlot::StrictArgumentsMap).as_map()
    }

    pub fn fast_aliased_arguments_map(&self) -> MapRef<'b> {
        self.named(NativeContextSlot::FastAliasedArgumentsMap).as_map()
    }

    /// Initial map of arrays with generic tagged elements.
    pub fn js_array_fast_elements_map(&self) -> MapRef<'b> {
        self.initial_js_array_map(ElementsKind::Packed)
    }

    /// Initial array map for a fast elements kind. Fatal for dictionary
    /// elements.
    pub fn initial_js_array_map(&self, kind: ElementsKind) -> MapRef<'b> {
        let slot = NativeContextSlot::initial_js_array_map(kind).or_fatal(|| {
            BrokerViolation::UnresolvedDependency {
                object: self.object(),
                dependency: "initial array map for dictionary elements",
            }
        });
        self.named(slot).as_map()
    }

    pub fn iterator_result_map(&self) -> MapRef<'b> {
        self.named(NativeContextSlot::IteratorResultMap).as_map()
    }

    pub fn array_function(&self) -> JsFunctionRef<'b> {
        self.named(NativeContextSlot::ArrayFunction).as_js_function()
    }

    pub fn global_proxy(&self) -> JsGlobalProxyRef<'b> {
        self.named(NativeContextSlot::GlobalProxy).as_js_global_proxy()
    }

    pub fn script_context_table(&self) -> ScriptContextTableRef<'b> {
        self.named(NativeContextSlot::ScriptContextTable).as_script_context_table()
    }

    /// Function map stored at raw slot `index`.
    ///
    /// Fatal unless `index` lies in the function-map range.
    pub fn function_map_from_index(&self, index: usize) -> MapRef<'b> {
        if !NativeContextSlot::is_function_map_index(index) {
            fatal(self.out_of_bounds(index as i64));
        }
        self.get(index).as_map()
    }
}

// =============================================================================
// ScriptContextTableRef
// =============================================================================

impl<'b> ScriptContextTableRef<'b> {
    /// Script contexts in declaration order.
    pub fn contexts(&self) -> Vec<ContextRef<'b>> {
        let contexts: Vec<ObjectRef<'b>> = match self.live() {
            Some(heap) => heap
                .script_context_table(self.address())
                .map(|table| table.to_vec())
                .or_fatal(|| self.mismatch("ScriptContextTable"))
                .into_iter()
                .map(|context| self.live_sibling(Tagged::from(context)))
                .collect(),
            None => self.body("ScriptContextTable", |body| match body {
                DataBody::ScriptContextTable(contexts) => {
                    Some(contexts.iter().map(|&id| self.sibling(id)).collect())
                }
                _ => None,
            }),
        };
        contexts.into_iter().map(|context| context.as_context()).collect()
    }

    pub fn length(&self) -> usize {
        self.contexts().len()
    }

    /// Find the script context slot bound to `name`.
    pub fn lookup(&self, name: NameRef<'b>) -> Option<ScriptContextLookup<'b>> {
        if !name.is_string() {
            return None;
        }
        self.contexts().into_iter().find_map(|context| {
            let (index, mode) = context.scope_info().context_local(name)?;
            Some(ScriptContextLookup {
                context,
                immutable: mode == VariableMode::Const,
                index,
            })
        })
    }
}

// =============================================================================
// ScopeInfoRef
// =============================================================================

impl<'b> ScopeInfoRef<'b> {
    /// Length of contexts created for this scope, 0 when none is needed.
    pub fn context_length(&self) -> usize {
        match self.live() {
            Some(heap) => heap
                .scope_info(self.address())
                .map(|info| info.context_length())
                .or_fatal(|| self.mismatch("ScopeInfo")),
            None => self.body("ScopeInfo", |body| match body {
                DataBody::ScopeInfo(info) => Some(info.context_length),
                _ => None,
            }),
        }
    }

    /// Slot index and declaration mode of the context local `name`.
    pub fn context_local(&self, name: NameRef<'b>) -> Option<(usize, VariableMode)> {
        match self.live() {
            Some(heap) => {
                let name = name.address();
                heap.scope_info(self.address())
                    .or_fatal(|| self.mismatch("ScopeInfo"))
                    .slot_of(name)
            }
            None => self.body("ScopeInfo", |body| match body {
                DataBody::ScopeInfo(info) => Some(
                    info.locals
                        .iter()
                        .position(|&(local, _)| local == name.data_id())
                        .map(|i| (MIN_CONTEXT_SLOTS + i, info.locals[i].1)),
                ),
                _ => None,
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
