//! Tracing pipeline bootstrap.

use livraria_kernel::settings::{LogFormat, TelemetrySettings};

/// Initialize the tracing subscriber according to settings.
///
/// Safe to call more than once; later calls are no-ops, which keeps tests
/// that each bootstrap the app from panicking.
pub fn init(settings: &TelemetrySettings) {
    let installed = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt().try_init(),
        LogFormat::Json => tracing_subscriber::fmt().json().try_init(),
    };

    if installed.is_ok() {
        tracing::info!(format = ?settings.log_format, "telemetry initialized");
    }
}
