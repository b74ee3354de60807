//! Broker consistency violations.
//!
//! Every violation is fatal: it means the capture phase or its caller broke
//! an invariant, and the compilation unit is aborted. Violations are never
//! returned to callers as `Result`s; [`fatal`] logs and panics.

use quartz_heap::Tagged;

use crate::data::DataId;
use crate::mode::BrokerMode;

/// A broken broker invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerViolation {
    #[error("duplicate descriptor for {object:?}")]
    DuplicateData { object: Tagged },

    #[error("no descriptor for {object:?} in strict serialized mode")]
    MissingData { object: Tagged },

    #[error("descriptor creation is not allowed in {mode} mode")]
    CaptureForbidden { mode: BrokerMode },

    #[error("live heap access is not allowed in {mode} mode")]
    LiveHeapForbidden { mode: BrokerMode },

    #[error("cannot resolve {dependency} of {object:?}")]
    UnresolvedDependency {
        object: Tagged,
        dependency: &'static str,
    },

    #[error("{object:?} is not a {expected}")]
    KindMismatch {
        object: Tagged,
        expected: &'static str,
    },

    #[error("index {index} is out of bounds for {object:?}")]
    IndexOutOfBounds { object: Tagged, index: i64 },

    #[error("descriptor for {object:?} accessed while under construction")]
    UnderConstruction { object: Tagged },

    #[error("descriptor {id:?} does not belong to this broker")]
    UnknownDescriptor { id: DataId },

    #[error("illegal mode transition from {from}")]
    IllegalTransition { from: BrokerMode },

    #[error("{object:?} has no numeric value as an oddball")]
    InvalidOddballConversion { object: Tagged },
}

/// Abort the current compilation unit.
#[cold]
#[track_caller]
pub fn fatal(violation: BrokerViolation) -> ! {
    tracing::error!(target: "quartz::heap_broker", %violation, "heap broker invariant violated");
    panic!("heap broker: {violation}")
}

/// Turn an absent value into a fatal violation.
pub trait OrFatal<T> {
    /// Unwrap or abort with the violation built by `violation`.
    fn or_fatal(self, violation: impl FnOnce() -> BrokerViolation) -> T;
}

impl<T> OrFatal<T> for Option<T> {
    #[inline]
    #[track_caller]
    fn or_fatal(self, violation: impl FnOnce() -> BrokerViolation) -> T {
        match self {
            Some(value) => value,
            None => fatal(violation()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_messages() {
        let v = BrokerViolation::MissingData { object: Tagged::smi(4) };
        assert_eq!(v.to_string(), "no descriptor for Smi(4) in strict serialized mode");

        let v = BrokerViolation::CaptureForbidden { mode: BrokerMode::Serialized };
        assert_eq!(v.to_string(), "descriptor creation is not allowed in serialized mode");
    }

    #[test]
    fn test_or_fatal_passes_values_through() {
        let value = Some(3).or_fatal(|| BrokerViolation::MissingData { object: Tagged::smi(0) });
        assert_eq!(value, 3);
    }

    #[test]
    #[should_panic(expected = "heap broker: illegal mode transition from disabled")]
    fn test_fatal_panics_with_message() {
        fatal(BrokerViolation::IllegalTransition { from: BrokerMode::Disabled });
    }

    #[test]
    #[should_panic(expected = "is not a Map")]
    fn test_or_fatal_on_none() {
        let _: u8 = None.or_fatal(|| BrokerViolation::KindMismatch {
            object: Tagged::smi(1),
            expected: "Map",
        });
    }
}
