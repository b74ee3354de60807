//! Broker configuration resolved from `-X` options and environment variables.

use crate::mode::BrokerMode;

// =============================================================================
// Broker Configuration
// =============================================================================

/// Settings that control how a [`JsHeapBroker`](crate::JsHeapBroker) runs.
///
/// Resolved once before compilation starts; the broker copies it at
/// construction and never consults the environment again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerConfig {
    // -------------------------------------------------------------------------
    // Mode selection
    // -------------------------------------------------------------------------
    /// Capture heap state up front so the rest of compilation can run off the
    /// heap-owning thread. Selects `Serializing` instead of `Disabled`.
    pub concurrent_compiler_frontend: bool,

    /// Forbid descriptor creation after serialization stopped. When off, a
    /// miss in `Serialized` mode falls back to live capture.
    pub strict_heap_broker: bool,

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------
    /// Emit a `tracing` event for broker construction, standard-object
    /// priming, every descriptor creation and the mode handoff.
    pub trace_heap_broker: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            concurrent_compiler_frontend: false,
            strict_heap_broker: true,
            trace_heap_broker: false,
        }
    }
}

impl BrokerConfig {
    /// Environment variable enabling the concurrent frontend.
    pub const ENV_CONCURRENT_FRONTEND: &'static str = "QUARTZ_CONCURRENT_FRONTEND";
    /// Environment variable controlling strict mode.
    pub const ENV_STRICT_HEAP_BROKER: &'static str = "QUARTZ_STRICT_HEAP_BROKER";
    /// Environment variable enabling tracing.
    pub const ENV_TRACE_HEAP_BROKER: &'static str = "QUARTZ_TRACE_HEAP_BROKER";

    /// Configuration for a concurrent compile with strict capture.
    pub fn concurrent() -> Self {
        Self {
            concurrent_compiler_frontend: true,
            ..Self::default()
        }
    }

    /// Defaults overridden by `-X` options.
    pub fn from_x_options<S: AsRef<str>>(options: &[S]) -> Self {
        Self::default().with_x_options(options)
    }

    /// Apply `-X` options in order; later options win.
    ///
    /// Recognized options:
    /// - `concurrent-frontend` / `no-concurrent-frontend`
    /// - `strict-heap-broker` / `relaxed-heap-broker`
    /// - `trace-heap-broker` / `no-trace-heap-broker`
    pub fn with_x_options<S: AsRef<str>>(mut self, options: &[S]) -> Self {
        for opt in options {
            match opt.as_ref() {
                "concurrent-frontend" => self.concurrent_compiler_frontend = true,
                "no-concurrent-frontend" => self.concurrent_compiler_frontend = false,
                "strict-heap-broker" => self.strict_heap_broker = true,
                "relaxed-heap-broker" => self.strict_heap_broker = false,
                "trace-heap-broker" => self.trace_heap_broker = true,
                "no-trace-heap-broker" => self.trace_heap_broker = false,
                _ => {}
            }
        }
        self
    }

    /// Defaults overridden by `QUARTZ_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env(|var| std::env::var(var).ok())
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// A variable that is unset leaves the setting alone; `""` and `"0"`
    /// turn it off; anything else turns it on.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |var: &str| lookup(var).map(|v| !v.is_empty() && v != "0");
        if let Some(value) = flag(Self::ENV_CONCURRENT_FRONTEND) {
            self.concurrent_compiler_frontend = value;
        }
        if let Some(value) = flag(Self::ENV_STRICT_HEAP_BROKER) {
            self.strict_heap_broker = value;
        }
        if let Some(value) = flag(Self::ENV_TRACE_HEAP_BROKER) {
            self.trace_heap_broker = value;
        }
        self
    }

    /// Mode a broker built with this configuration starts in.
    #[inline]
    pub fn initial_mode(&self) -> BrokerMode {
        BrokerMode::initial(self)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();
        assert!(!config.concurrent_compiler_frontend);
        assert!(config.strict_heap_broker);
        assert!(!config.trace_heap_broker);
        assert_eq!(config.initial_mode(), BrokerMode::Disabled);
    }

    #[test]
    fn test_concurrent_config_starts_serializing() {
        let config = BrokerConfig::concurrent();
        assert!(config.strict_heap_broker);
        assert_eq!(config.initial_mode(), BrokerMode::Serializing);
    }

    #[test]
    fn test_x_options() {
        let config = BrokerConfig::from_x_options(&[
            "concurrent-frontend",
            "relaxed-heap-broker",
            "trace-heap-broker",
        ]);
        assert!(config.concurrent_compiler_frontend);
        assert!(!config.strict_heap_broker);
        assert!(config.trace_heap_broker);
    }

    #[test]
    fn test_x_options_last_wins() {
        let config =
            BrokerConfig::from_x_options(&["concurrent-frontend", "no-concurrent-frontend"]);
        assert!(!config.concurrent_compiler_frontend);
    }

    #[test]
    fn test_x_options_ignores_unknown() {
        let config = BrokerConfig::from_x_options(&["jit=off", "frozen_modules"]);
        assert_eq!(config, BrokerConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let env = |var: &str| match var {
            BrokerConfig::ENV_CONCURRENT_FRONTEND => Some("1".to_string()),
            BrokerConfig::ENV_STRICT_HEAP_BROKER => Some("0".to_string()),
            _ => None,
        };
        let config = BrokerConfig::default().with_env(env);
        assert!(config.concurrent_compiler_frontend);
        assert!(!config.strict_heap_broker);
        assert!(!config.trace_heap_broker);
    }

    #[test]
    fn test_env_empty_value_is_off() {
        let config = BrokerConfig::concurrent().with_env(|var| {
            (var == BrokerConfig::ENV_CONCURRENT_FRONTEND).then(String::new)
        });
        assert!(!config.concurrent_compiler_frontend);
    }
}
