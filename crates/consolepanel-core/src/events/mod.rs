//! Process-level lifecycle events shared by the CLI and the server.

use tracing::{error, info, warn};

use crate::errors::PanelError;
use crate::tools::ToolProbe;

pub fn log_app_startup(command: &str) {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION"),
        command = command
    );
}

pub fn log_app_shutdown() {
    info!(event = "core.app.shutdown_started");
}

pub fn log_app_error(error: &dyn std::error::Error) {
    error!(
        event = "core.app.error_occurred",
        error = %error,
        error_type = std::any::type_name_of_val(error)
    );
}

/// Like [`log_app_error`], tagged with the error's stable code.
pub fn log_panel_error<E: PanelError>(error: &E) {
    error!(
        event = "core.app.error_occurred",
        error = %error,
        error_code = error.error_code(),
        user_error = error.is_user_error()
    );
}

/// Warn about every configured tool that could not be resolved.
///
/// Returns how many were missing.
pub fn log_tool_probes(probes: &[ToolProbe]) -> usize {
    let mut missing = 0;
    for probe in probes {
        match &probe.resolved {
            Some(path) => info!(
                event = "core.tools.probe_resolved",
                program = probe.program,
                path = %path.display()
            ),
            None => {
                missing += 1;
                warn!(
                    event = "core.tools.probe_missing",
                    program = probe.program,
                    "Configured tool was not found; operations that need it will fail"
                );
            }
        }
    }
    missing
}
