//! Broker mode state machine.
//!
//! ```text
//!   Disabled            (never transitions)
//!
//!   Serializing ──stop_serializing──> Serialized
//! ```

use std::fmt;

use crate::config::BrokerConfig;
use crate::error::BrokerViolation;

/// Whether the broker reads the live heap or a captured snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerMode {
    /// Single-threaded compile: every read is a live heap read and no full
    /// descriptors are created.
    Disabled,
    /// Capture phase on the heap-owning thread: live reads are allowed and
    /// everything needed later is materialized into descriptors.
    Serializing,
    /// Post-capture: every query is answered from descriptors.
    Serialized,
}

impl BrokerMode {
    /// Mode selected by the configuration.
    #[inline]
    pub fn initial(config: &BrokerConfig) -> Self {
        if config.concurrent_compiler_frontend {
            BrokerMode::Serializing
        } else {
            BrokerMode::Disabled
        }
    }

    /// Whether descriptors may be created.
    ///
    /// Always in `Serializing`; in `Serialized` only without strict mode.
    #[inline]
    pub fn serializing_allowed(self, strict: bool) -> bool {
        match self {
            BrokerMode::Serializing => true,
            BrokerMode::Serialized => !strict,
            BrokerMode::Disabled => false,
        }
    }

    /// Whether the current thread may read the live heap.
    #[inline]
    pub fn live_reads_allowed(self, strict: bool) -> bool {
        self == BrokerMode::Disabled || self.serializing_allowed(strict)
    }

    /// The only legal transition: `Serializing` to `Serialized`.
    pub fn transition_to_serialized(self) -> Result<Self, BrokerViolation> {
        match self {
            BrokerMode::Serializing => Ok(BrokerMode::Serialized),
            from => Err(BrokerViolation::IllegalTransition { from }),
        }
    }

    /// Lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            BrokerMode::Disabled => "disabled",
            BrokerMode::Serializing => "serializing",
            BrokerMode::Serialized => "serialized",
        }
    }
}

impl fmt::Display for BrokerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializing_allowed_table() {
        for strict in [true, false] {
            assert!(!BrokerMode::Disabled.serializing_allowed(strict));
            assert!(BrokerMode::Serializing.serializing_allowed(strict));
        }
        assert!(!BrokerMode::Serialized.serializing_allowed(true));
        assert!(BrokerMode::Serialized.serializing_allowed(false));
    }

    #[test]
    fn test_live_reads_allowed_table() {
        assert!(BrokerMode::Disabled.live_reads_allowed(true));
        assert!(BrokerMode::Serializing.live_reads_allowed(true));
        assert!(!BrokerMode::Serialized.live_reads_allowed(true));
        assert!(BrokerMode::Serialized.live_reads_allowed(false));
    }

    #[test]
    fn test_transition() {
        assert_eq!(
            BrokerMode::Serializing.transition_to_serialized(),
            Ok(BrokerMode::Serialized)
        );
        assert_eq!(
            BrokerMode::Serialized.transition_to_serialized(),
            Err(BrokerViolation::IllegalTransition { from: BrokerMode::Serialized })
        );
        assert!(BrokerMode::Disabled.transition_to_serialized().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(BrokerMode::Serializing.to_string(), "serializing");
    }
}
