//! Transient, auto-dismissing feedback messages.
//!
//! Only one notification is displayed at a time: showing a new one discards
//! the current one, whatever its remaining lifetime.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::{offset, Clock};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn color(self) -> &'static str {
        match self {
            Severity::Success => "#34a853",
            Severity::Error => "#d93025",
            Severity::Warning => "#f29900",
            Severity::Info => "#4285f4",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Success => "check-circle",
            Severity::Error => "exclamation-circle",
            Severity::Warning => "exclamation-triangle",
            Severity::Info => "info-circle",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub shown_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Notifier<C: Clock> {
    clock: C,
    timeout: Duration,
    next_id: u64,
    active: Option<Notification>,
}

impl<C: Clock> Notifier<C> {
    pub fn new(clock: C, timeout: Duration) -> Self {
        Self {
            clock,
            timeout,
            next_id: 1,
            active: None,
        }
    }

    /// Replaces whatever is displayed with `message`.
    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) -> &Notification {
        let message = message.into();
        let now = self.clock.now();
        let id = self.next_id;
        self.next_id += 1;

        if let Some(previous) = self.active.take() {
            tracing::debug!(replaced = previous.id, "notification replaced before expiry");
        }
        tracing::debug!(id, %severity, message = %message, "notification shown");

        self.active.insert(Notification {
            id,
            message,
            severity,
            shown_at: now,
            expires_at: offset(now, self.timeout),
        })
    }

    pub fn current(&self) -> Option<&Notification> {
        self.active.as_ref()
    }

    /// User-initiated close.
    pub fn dismiss(&mut self) -> Option<Notification> {
        self.active.take()
    }

    /// Closes notification `id` if it is still displayed.
    pub fn dismiss_id(&mut self, id: u64) -> Option<Notification> {
        match &self.active {
            Some(active) if active.id == id => self.active.take(),
            _ => None,
        }
    }

    /// Drops the displayed notification once its timeout has elapsed.
    pub fn expire(&mut self) -> Option<Notification> {
        let now = self.clock.now();
        match &self.active {
            Some(active) if active.expires_at <= now => self.active.take(),
            _ => None,
        }
    }

    pub fn next_expiry(&self) -> Option<DateTime<Utc>> {
        self.active.as_ref().map(|active| active.expires_at)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
