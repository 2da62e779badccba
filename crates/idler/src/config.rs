//! Client configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! {
//!   "server": "203.0.113.7:27015",
//!   "session": { "liveness_timeout_secs": 45 },
//!   "runner": { "tick_rate_hz": 20 }
//! }
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use idler_session::SessionConfig;
use serde::Deserialize;

use crate::IdlerError;

// ---------------------------------------------------------------------------
// RunnerConfig
// ---------------------------------------------------------------------------

/// How often the runner drives the session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Ticks per second. Clamped to `1..=MAX_TICK_RATE_HZ`. Default: 10.
    pub tick_rate_hz: u32,

    /// Upper bound of the random delay before the first tick, so clients
    /// started together do not poll in lockstep. 0 disables it.
    /// Default: 250 ms.
    pub initial_jitter_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 10,
            initial_jitter_ms: 250,
        }
    }
}

impl RunnerConfig {
    /// Highest supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            tracing::warn!(
                rate = self.tick_rate_hz,
                clamped,
                "tick_rate_hz out of range, clamping"
            );
            self.tick_rate_hz = clamped;
        }
        self
    }

    /// Time between two ticks at the (validated) rate.
    pub fn tick_interval(&self) -> Duration {
        let rate = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        Duration::from_secs_f64(1.0 / f64::from(rate))
    }
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Everything needed to start and drive one client session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the application server. Default: `127.0.0.1:27015`.
    pub server: SocketAddr,
    pub session: SessionConfig,
    pub runner: RunnerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: SocketAddr::from((Ipv4Addr::LOCALHOST, 27015)),
            session: SessionConfig::default(),
            runner: RunnerConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses a JSON config document. Missing fields take their defaults.
    ///
    /// # Errors
    /// [`IdlerError::Config`] if the document is not valid JSON or a field
    /// has the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self, IdlerError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(Self {
            runner: config.runner.validated(),
            ..config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_defaults() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.tick_rate_hz, 10);
        assert_eq!(cfg.initial_jitter_ms, 250);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_validated_clamps_zero_rate() {
        let cfg = RunnerConfig::with_rate(0).validated();
        assert_eq!(cfg.tick_rate_hz, 1);
    }

    #[test]
    fn test_validated_clamps_excessive_rate() {
        let cfg = RunnerConfig::with_rate(10_000).validated();
        assert_eq!(cfg.tick_rate_hz, RunnerConfig::MAX_TICK_RATE_HZ);
    }

    #[test]
    fn test_from_json_str_empty_object_is_default() {
        let cfg = ClientConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_from_json_str_partial_sections() {
        let cfg = ClientConfig::from_json_str(
            r#"{
                "server": "203.0.113.7:27015",
                "session": { "liveness_timeout_secs": 45 },
                "runner": { "tick_rate_hz": 20 }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.server, "203.0.113.7:27015".parse().unwrap());
        assert_eq!(cfg.session.liveness_timeout_secs, 45);
        assert_eq!(cfg.session.connect_timeout_secs, 20);
        assert_eq!(cfg.runner.tick_rate_hz, 20);
        assert_eq!(cfg.runner.initial_jitter_ms, 250);
    }

    #[test]
    fn test_from_json_str_validates_runner() {
        let cfg = ClientConfig::from_json_str(r#"{ "runner": { "tick_rate_hz": 0 } }"#).unwrap();
        assert_eq!(cfg.runner.tick_rate_hz, 1);
    }

    #[test]
    fn test_from_json_str_bad_address_is_config_error() {
        let err = ClientConfig::from_json_str(r#"{ "server": "not an address" }"#).unwrap_err();
        assert!(matches!(err, IdlerError::Config(_)));
    }
}
