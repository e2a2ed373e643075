//! Event handling and user feedback

use console::{style, Term};
use satdl_events::{
    AppEvent, CredentialEvent, EventLevel, EventMessage, GeneralEvent, RequestEvent, SweepEvent,
    TransferEvent,
};

/// Renders lifecycle events on stderr while a command runs
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    debug_enabled: bool,
    /// Suppress console output (JSON mode)
    quiet: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            debug_enabled,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event(&message);
        if self.quiet {
            return;
        }
        if matches!(message.meta.level, EventLevel::Debug | EventLevel::Trace) && !self.debug_enabled
        {
            return;
        }

        match message.event {
            AppEvent::General(event) => self.handle_general(event),
            AppEvent::Request(event) => self.handle_request(event),
            AppEvent::Sweep(event) => self.handle_sweep(event),
            AppEvent::Transfer(event) => self.handle_transfer(event),
            AppEvent::Credential(event) => self.handle_credential(event),
        }
    }

    fn handle_general(&self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message } => self.show_warning(&message),
            GeneralEvent::Error { message } => self.show_error(&message),
            GeneralEvent::OperationStarted { operation } => self.show_status(&operation),
        }
    }

    fn handle_request(&self, event: RequestEvent) {
        match event {
            RequestEvent::Created { request_id, .. } => {
                self.show_success(&format!("Created request {request_id}"));
            }
            RequestEvent::VerificationStarted { request_id } => {
                self.show_status(&format!("Checking {request_id} with the authority"));
            }
            RequestEvent::Verified {
                request_id,
                from,
                to,
                packages,
                ..
            } => {
                if from == to {
                    self.show_status(&format!("{request_id}: still {to}"));
                } else if packages > 0 {
                    self.show_success(&format!(
                        "{request_id}: {from} -> {to} ({packages} package(s))"
                    ));
                } else {
                    self.show_success(&format!("{request_id}: {from} -> {to}"));
                }
            }
            RequestEvent::VerificationSkipped {
                request_id,
                state,
                reason,
            } => {
                self.show_status(&format!("{request_id}: {state}, skipped ({reason})"));
            }
            // Manual failures surface through the command error; sweep
            // failures through the end-of-pass summary.
            RequestEvent::VerificationFailed { .. } => {}
        }
    }

    fn handle_sweep(&self, event: SweepEvent) {
        match event {
            SweepEvent::Started {
                candidates,
                automatic,
            } => {
                let label = if automatic { "Automatic sweep" } else { "Sweep" };
                self.show_status(&format!("{label}: checking {candidates} request(s)"));
            }
            SweepEvent::Completed {
                checked,
                failed,
                duration,
                ..
            } => {
                if failed.is_empty() {
                    self.show_success(&format!(
                        "Checked {checked} request(s) in {:.1}s",
                        duration.as_secs_f64()
                    ));
                } else {
                    self.show_warning(&format!(
                        "Checked {checked} request(s); {} could not be verified:",
                        failed.len()
                    ));
                    for failure in failed {
                        self.show_warning(&format!("  {}: {}", failure.request_id, failure.message));
                    }
                }
            }
            SweepEvent::AutoEnabled { period } => {
                self.show_status(&format!(
                    "Automatic verification on (every {}s)",
                    period.as_secs()
                ));
            }
            SweepEvent::AutoDisabled => self.show_status("Automatic verification off"),
        }
    }

    fn handle_transfer(&self, event: TransferEvent) {
        match event {
            TransferEvent::Started { package_id, .. } => {
                self.show_status(&format!("Downloading {package_id}"));
            }
            TransferEvent::Completed {
                package_id,
                path,
                bytes,
                ..
            } => {
                self.show_success(&format!(
                    "Downloaded {package_id} ({bytes} bytes) -> {}",
                    path.display()
                ));
            }
            TransferEvent::Failed {
                package_id,
                failure,
                ..
            } => {
                self.show_error(&format!("Download of {package_id} failed: {}", failure.message));
            }
        }
    }

    fn handle_credential(&self, event: CredentialEvent) {
        match event {
            CredentialEvent::ValidationStarted { certificate } => {
                self.show_status(&format!("Validating credential {certificate}"));
            }
            CredentialEvent::Validated { subject_id } => {
                self.show_success(&format!("Credential validated for {subject_id}"));
            }
            CredentialEvent::ValidationFailed { reason } => {
                self.show_error(&format!("Credential validation failed: {reason}"));
            }
            CredentialEvent::Cleared => self.show_status("Credential cleared"),
        }
    }

    fn show_status(&self, message: &str) {
        let _ = self.term.write_line(message);
    }

    fn show_success(&self, message: &str) {
        let line = if self.colors_enabled {
            style(message).green().to_string()
        } else {
            message.to_string()
        };
        let _ = self.term.write_line(&line);
    }

    fn show_warning(&self, message: &str) {
        let line = if self.colors_enabled {
            style(message).yellow().to_string()
        } else {
            format!("Warning: {message}")
        };
        let _ = self.term.write_line(&line);
    }

    fn show_error(&self, message: &str) {
        let line = if self.colors_enabled {
            style(message).red().bold().to_string()
        } else {
            format!("Error: {message}")
        };
        let _ = self.term.write_line(&line);
    }
}

/// Mirror every event into the tracing log at the level its metadata carries
fn log_event(message: &EventMessage) {
    let correlation = message.meta.correlation_id.as_deref().unwrap_or("-");
    let payload = serde_json::to_string(&message.event).unwrap_or_default();
    match message.meta.level {
        EventLevel::Error => {
            tracing::error!(source = message.meta.source.as_str(), correlation, event = %payload);
        }
        EventLevel::Warn => {
            tracing::warn!(source = message.meta.source.as_str(), correlation, event = %payload);
        }
        EventLevel::Info => {
            tracing::info!(source = message.meta.source.as_str(), correlation, event = %payload);
        }
        EventLevel::Debug => {
            tracing::debug!(source = message.meta.source.as_str(), correlation, event = %payload);
        }
        EventLevel::Trace => {
            tracing::trace!(source = message.meta.source.as_str(), correlation, event = %payload);
        }
    }
}
