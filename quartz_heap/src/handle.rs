//! Object identities.
//!
//! The heap hands out two kinds of identity:
//!
//! - [`HeapAddr`]: the slot of a heap-allocated object. Slots are never reused,
//!   so an address stays valid (and unique) for the lifetime of the heap.
//! - [`Tagged`]: a tagged value that is either a small integer immediate or a
//!   heap address. This is the identity the compiler works with.
//!
//! Both are plain `Copy` values. Equality is identity: two `Heap` values are
//! equal iff they denote the same object, and two `Smi` values are equal iff
//! they carry the same integer (immediates are canonical).

use std::fmt;

// =============================================================================
// Heap Address
// =============================================================================

/// Address of a heap-allocated object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct HeapAddr(u32);

impl HeapAddr {
    /// Create an address from a raw slot index.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw slot index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Slot index as `usize`.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for HeapAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeapAddr({:#x})", self.0)
    }
}

// =============================================================================
// Tagged Value
// =============================================================================

/// A tagged value: a small-integer immediate or a reference to a heap object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tagged {
    /// Small integer stored directly in the value, no heap representation.
    Smi(i32),
    /// Reference to a heap-allocated object.
    Heap(HeapAddr),
}

impl Tagged {
    /// Create a Smi.
    #[inline]
    pub const fn smi(value: i32) -> Self {
        Tagged::Smi(value)
    }

    /// Check if this is an immediate.
    #[inline]
    pub const fn is_smi(self) -> bool {
        matches!(self, Tagged::Smi(_))
    }

    /// Get the immediate value, if any.
    #[inline]
    pub const fn as_smi(self) -> Option<i32> {
        match self {
            Tagged::Smi(value) => Some(value),
            Tagged::Heap(_) => None,
        }
    }

    /// Get the heap address, if any.
    #[inline]
    pub const fn as_heap(self) -> Option<HeapAddr> {
        match self {
            Tagged::Smi(_) => None,
            Tagged::Heap(addr) => Some(addr),
        }
    }

    /// Raw tagged word, used for diagnostics only.
    ///
    /// Smis are shifted left by one with a clear low bit; heap addresses are
    /// word-aligned slot offsets with the low bit set.
    #[inline]
    pub const fn address(self) -> u64 {
        match self {
            Tagged::Smi(value) => ((value as i64) << 1) as u64,
            Tagged::Heap(addr) => ((addr.0 as u64) << 3) | 1,
        }
    }
}

impl From<HeapAddr> for Tagged {
    #[inline]
    fn from(addr: HeapAddr) -> Self {
        Tagged::Heap(addr)
    }
}

impl fmt::Debug for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tagged::Smi(value) => write!(f, "Smi({})", value),
            Tagged::Heap(addr) => write!(f, "{:?}", addr),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
