//! Severity-leveled log sink.
//!
//! The plant reports through `tracing`; whichever subscriber the binary
//! installs is the transport. `Critical` has no tracing level of its own and
//! is emitted at error level with `critical = true`.

use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Warnings are raised to errors while the plant runs in fault mode, so
    /// process anomalies stand out next to injected faults.
    pub fn escalated(self, fault_mode: bool) -> Self {
        if fault_mode && self == Severity::Warning {
            Severity::Error
        } else {
            self
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Emit one message with an optional free-text context.
pub fn report(severity: Severity, message: &str, context: Option<&str>) {
    let message = message.trim();
    let context = context.unwrap_or("");
    match severity {
        Severity::Debug => tracing::debug!(context, "{message}"),
        Severity::Info => tracing::info!(context, "{message}"),
        Severity::Warning => tracing::warn!(context, "{message}"),
        Severity::Error => tracing::error!(context, "{message}"),
        Severity::Critical => tracing::error!(critical = true, context, "{message}"),
    }
}
