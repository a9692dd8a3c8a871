//! Sync health telemetry
//!
//! A [`HealthTracker`] is a cheap cloneable handle over shared state. The
//! engine records one outcome per run; any clone can read the current
//! [`SyncHealth`] or a classified [`HealthSummary`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Smoothing factor for the sync duration moving average.
pub const EMA_ALPHA: f64 = 0.1;

const CRITICAL_THRESHOLD: f64 = 0.5;
const WARNING_THRESHOLD: f64 = 0.2;

/// Point-in-time health counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHealth {
    pub last_sync_time: DateTime<Utc>,
    pub total_agents: usize,
    pub synced_agents: usize,
    pub failed_agents: usize,
    /// Exponential moving average of run duration, in milliseconds.
    pub average_sync_time: f64,
    pub error_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Default for SyncHealth {
    fn default() -> Self {
        Self {
            last_sync_time: DateTime::<Utc>::UNIX_EPOCH,
            total_agents: 0,
            synced_agents: 0,
            failed_agents: 0,
            average_sync_time: 0.0,
            error_rate: 0.0,
            last_error: None,
        }
    }
}

impl SyncHealth {
    fn recompute_error_rate(&mut self) {
        self.error_rate = if self.total_agents == 0 {
            0.0
        } else {
            self.failed_agents as f64 / self.total_agents as f64
        };
    }
}

/// Severity derived from the error rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn from_error_rate(error_rate: f64) -> Self {
        if error_rate > CRITICAL_THRESHOLD {
            Self::Critical
        } else if error_rate > WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Healthy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Numbers shown alongside a [`HealthSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub total_agents: usize,
    pub synced_agents: usize,
    pub failed_agents: usize,
    pub error_rate: f64,
    pub average_sync_time_ms: u64,
    pub last_sync_time: DateTime<Utc>,
}

/// At-a-glance health classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub status: HealthStatus,
    pub message: String,
    pub metrics: HealthMetrics,
}

/// Shared handle over [`SyncHealth`].
#[derive(Debug, Clone, Default)]
pub struct HealthTracker {
    inner: Arc<Mutex<SyncHealth>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total_agents(&self, total: usize) {
        let mut health = self.lock();
        health.total_agents = total;
        health.recompute_error_rate();
    }

    /// Record a run that completed, with its counts and duration.
    pub fn record_success(&self, synced: usize, failed: usize, duration_ms: f64) {
        let mut health = self.lock();
        health.last_sync_time = Utc::now();
        health.synced_agents = synced;
        health.failed_agents = failed;
        health.average_sync_time = if health.average_sync_time == 0.0 {
            duration_ms
        } else {
            health.average_sync_time * (1.0 - EMA_ALPHA) + duration_ms * EMA_ALPHA
        };
        health.recompute_error_rate();
        health.last_error = None;
    }

    /// Record a run that aborted. The duration average is left alone.
    pub fn record_failure(&self, message: impl Into<String>) {
        let mut health = self.lock();
        health.failed_agents += 1;
        health.last_error = Some(message.into());
        health.recompute_error_rate();
    }

    pub fn snapshot(&self) -> SyncHealth {
        self.lock().clone()
    }

    pub fn summary(&self) -> HealthSummary {
        let health = self.snapshot();
        let status = HealthStatus::from_error_rate(health.error_rate);

        let mut message = format!(
            "{}: {:.1}% sync failure rate",
            status,
            health.error_rate * 100.0
        );
        if let Some(last_error) = &health.last_error {
            message.push_str(&format!(" - Last error: {}", last_error));
        }

        HealthSummary {
            status,
            message,
            metrics: HealthMetrics {
                total_agents: health.total_agents,
                synced_agents: health.synced_agents,
                failed_agents: health.failed_agents,
                error_rate: health.error_rate,
                average_sync_time_ms: health.average_sync_time.round() as u64,
                last_sync_time: health.last_sync_time,
            },
        }
    }

    fn lock(&self) -> MutexGuard<'_, SyncHealth> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
