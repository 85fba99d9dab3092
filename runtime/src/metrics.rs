//! Prometheus metrics for the store runtime and the kiosk domain.
//!
//! Metrics are recorded through the `metrics` facade everywhere; nothing is
//! exported until a recorder is installed. [`MetricsRecorder::install`]
//! installs the Prometheus recorder and registers metric descriptions.
//!
//! # Example
//!
//! ```rust,no_run
//! use queue_kiosk_runtime::metrics::MetricsRecorder;
//!
//! let recorder = MetricsRecorder::install()?;
//! // ... run the kiosk ...
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok::<(), queue_kiosk_runtime::metrics::MetricsError>(())
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// If a recorder is already installed (e.g. by another test), this logs a
    /// warning and returns a recorder without a render handle.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    pub fn install() -> Result<Self, MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                register_metrics();
                tracing::info!("Prometheus metrics recorder installed");
                Ok(Self {
                    handle: Some(handle),
                })
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(Self { handle: None })
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus exposition format.
    ///
    /// Returns `None` if this recorder was not the one installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store
    describe_counter!("store.commands.total", "Commands sent to stores by callers");
    describe_counter!("store.feedback.total", "Actions produced by effects and fed back");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside the reducer while holding the state write lock"
    );
    describe_counter!("store.effects.executed", "Effects executed, labelled by type");
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );

    // Kiosk
    describe_counter!("kiosk.tickets.issued", "Tickets drawn by customers");
    describe_counter!("kiosk.tickets.called", "Tickets assigned to a counter");
    describe_counter!(
        "kiosk.tickets.abandoned",
        "Tickets dropped because their counter went offline mid-service"
    );
    describe_counter!("kiosk.service.completed", "Services marked complete");
    describe_counter!("kiosk.counter.not_found", "Operations naming an unknown counter");
    describe_gauge!("kiosk.queue.length", "Tickets waiting to be called");
}
