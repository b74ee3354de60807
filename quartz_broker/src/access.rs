//! Capability tokens for heap access.
//!
//! The broker hands out a [`LiveHeap`] only in modes where the calling thread
//! may read the heap, and a [`CaptureScope`] only where descriptors may be
//! created. Code that reads the heap or builds descriptors takes one of these
//! as a parameter, so the permission check happens once, at the broker.
//!
//! Both tokens are `!Send` and `!Sync`: a token minted on the heap-owning
//! thread cannot leak to a compiler worker.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use quartz_heap::Heap;

/// Permission to read the live heap from the current thread.
#[derive(Clone, Copy)]
pub struct LiveHeap<'a> {
    heap: &'a Heap,
    _not_send: PhantomData<*const ()>,
}

impl<'a> LiveHeap<'a> {
    #[inline]
    pub(crate) fn new(heap: &'a Heap) -> Self {
        Self { heap, _not_send: PhantomData }
    }

    /// The heap itself, for the token's lifetime.
    #[inline]
    pub fn heap(self) -> &'a Heap {
        self.heap
    }
}

impl Deref for LiveHeap<'_> {
    type Target = Heap;

    #[inline]
    fn deref(&self) -> &Heap {
        self.heap
    }
}

impl fmt::Debug for LiveHeap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveHeap")
            .field("objects", &self.heap.object_count())
            .finish()
    }
}

/// Permission to create descriptors, which implies live reads.
#[derive(Clone, Copy, Debug)]
pub struct CaptureScope<'a> {
    heap: LiveHeap<'a>,
}

impl<'a> CaptureScope<'a> {
    #[inline]
    pub(crate) fn new(heap: &'a Heap) -> Self {
        Self { heap: LiveHeap::new(heap) }
    }

    /// Live reads performed while capturing.
    #[inline]
    pub fn heap(self) -> LiveHeap<'a> {
        self.heap
    }
}
