//! Adapter configuration knobs.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming a wire transcript file.
pub const PROTOCOL_LOG_ENV: &str = "TRACE_DAP_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Sleep between non-blocking reads while suspended.
    pub poll_interval: Duration,
    /// How often the transport is drained while the debuggee runs. `None`
    /// leaves client messages queued until the next suspension.
    pub running_poll_interval: Option<Duration>,
    /// Display strings longer than this many characters are truncated.
    pub max_value_len: usize,
    /// Append every incoming and outgoing payload to this file.
    pub protocol_log: Option<PathBuf>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            running_poll_interval: Some(Duration::from_millis(50)),
            max_value_len: 1000,
            protocol_log: None,
        }
    }
}

impl AdapterConfig {
    /// Fill unset fields from the environment.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if self.protocol_log.is_none() {
            self.protocol_log = std::env::var_os(PROTOCOL_LOG_ENV)
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from);
        }
        self
    }
}
