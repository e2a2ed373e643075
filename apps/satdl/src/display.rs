//! Output rendering and formatting

use crate::commands::OperationResult;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use satdl_credentials::CredentialRecord;
use satdl_lifecycle::{ActivityRecord, DownloadedPackage, RetrievalRequest, SweepReport};
use satdl_types::{ActivityOutcome, ColorChoice, DashboardStats, LifecycleState};
use std::io;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted table
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::Credential(record) => self.render_credential(record),
            OperationResult::RequestCreated(request) | OperationResult::RequestVerified(request) => {
                self.render_request(request)
            }
            OperationResult::Sweep(report) => self.render_sweep(report),
            OperationResult::RequestList(requests) => self.render_request_list(requests),
            OperationResult::History(history) => self.render_history(history),
            OperationResult::Stats(stats) => self.render_stats(stats),
            OperationResult::Downloads(downloads) => self.render_downloads(downloads),
            OperationResult::Packages(packages) => self.render_packages(packages),
            OperationResult::Success(message) => self.render_success_message(message),
        }
    }

    fn render_credential(&self, record: &CredentialRecord) -> io::Result<()> {
        let Some(subject_id) = record.subject_id.as_deref().filter(|_| record.configured) else {
            return self.term.write_line("No signing credential configured.");
        };

        self.term.write_line(&self.style_heading(subject_id))?;
        if let Some(validated_at) = record.validated_at {
            self.term.write_line(&format!(
                "Validated:   {}",
                validated_at.format(TIMESTAMP_FORMAT)
            ))?;
        }
        if let Some(path) = &record.certificate_path {
            self.term
                .write_line(&format!("Certificate: {}", path.display()))?;
        }
        if let Some(path) = &record.key_path {
            self.term
                .write_line(&format!("Private key: {}", path.display()))?;
        }
        Ok(())
    }

    /// Render a single request in detail
    fn render_request(&self, request: &RetrievalRequest) -> io::Result<()> {
        self.term
            .write_line(&self.style_heading(request.request_id().as_str()))?;
        self.term.write_line(&format!(
            "State:       {}",
            self.style_state(request.state())
        ))?;
        self.term.write_line(&format!(
            "Documents:   {} ({}, {})",
            request.kind(),
            request.format(),
            request.activity_filter()
        ))?;
        self.term.write_line(&format!(
            "Period:      {} to {}",
            request.period_start(),
            request.period_end()
        ))?;
        self.term.write_line(&format!(
            "Created:     {}",
            request.created_at().format(TIMESTAMP_FORMAT)
        ))?;
        if let Some(checked) = request.last_checked_at() {
            self.term.write_line(&format!(
                "Checked:     {}",
                checked.format(TIMESTAMP_FORMAT)
            ))?;
        }
        if let Some(message) = request.last_message() {
            self.term.write_line(&format!("Message:     {message}"))?;
        }
        if !request.packages().is_empty() {
            self.term.write_line("Packages:")?;
            for package in request.packages() {
                self.term.write_line(&format!("  - {package}"))?;
            }
        }
        Ok(())
    }

    /// Render request list
    fn render_request_list(&self, requests: &[RetrievalRequest]) -> io::Result<()> {
        if requests.is_empty() {
            return self.term.write_line("No retrieval requests.");
        }

        let mut table = self.table();
        table.set_header(vec![
            Cell::new("Request").add_attribute(Attribute::Bold),
            Cell::new("Kind").add_attribute(Attribute::Bold),
            Cell::new("Format").add_attribute(Attribute::Bold),
            Cell::new("Period").add_attribute(Attribute::Bold),
            Cell::new("State").add_attribute(Attribute::Bold),
            Cell::new("Packages").add_attribute(Attribute::Bold),
            Cell::new("Last checked").add_attribute(Attribute::Bold),
        ]);

        for request in requests {
            table.add_row(vec![
                Cell::new(request.request_id()),
                Cell::new(request.kind()),
                Cell::new(request.format()),
                Cell::new(format!(
                    "{} .. {}",
                    request.period_start(),
                    request.period_end()
                )),
                self.state_cell(request.state()),
                Cell::new(request.packages().len()),
                Cell::new(
                    request
                        .last_checked_at()
                        .map_or_else(|| "-".to_string(), |t| t.format(TIMESTAMP_FORMAT).to_string()),
                ),
            ]);
        }

        self.term.write_line(&table.to_string())
    }

    fn render_sweep(&self, report: &SweepReport) -> io::Result<()> {
        if report.outcomes.is_empty() {
            return self.term.write_line("No pending requests to verify.");
        }

        let mut table = self.table();
        table.set_header(vec![
            Cell::new("Request").add_attribute(Attribute::Bold),
            Cell::new("State").add_attribute(Attribute::Bold),
        ]);
        for outcome in &report.outcomes {
            table.add_row(vec![
                Cell::new(&outcome.request_id),
                self.state_cell(outcome.state),
            ]);
        }
        self.term.write_line(&table.to_string())?;

        if !report.failures.is_empty() {
            self.term.write_line("")?;
            self.term.write_line(&format!(
                "{} request(s) could not be verified:",
                report.failures.len()
            ))?;
            for failure in &report.failures {
                self.term
                    .write_line(&format!("  {}: {}", failure.request_id, failure.message))?;
            }
        }
        Ok(())
    }

    fn render_history(&self, history: &[ActivityRecord]) -> io::Result<()> {
        if history.is_empty() {
            return self.term.write_line("No activity recorded.");
        }

        let mut table = self.table();
        table.set_header(vec![
            Cell::new("Time").add_attribute(Attribute::Bold),
            Cell::new("Kind").add_attribute(Attribute::Bold),
            Cell::new("Outcome").add_attribute(Attribute::Bold),
            Cell::new("Request").add_attribute(Attribute::Bold),
            Cell::new("Description").add_attribute(Attribute::Bold),
        ]);

        for record in history {
            let outcome = Cell::new(record.outcome);
            let outcome = if self.colors_enabled() {
                match record.outcome {
                    ActivityOutcome::Success => outcome.fg(Color::Green),
                    ActivityOutcome::Error => outcome.fg(Color::Red),
                    ActivityOutcome::Info => outcome.fg(Color::Blue),
                }
            } else {
                outcome
            };
            table.add_row(vec![
                Cell::new(record.timestamp.format(TIMESTAMP_FORMAT)),
                Cell::new(record.kind),
                outcome,
                Cell::new(
                    record
                        .request_id
                        .as_ref()
                        .map_or_else(|| "-".to_string(), ToString::to_string),
                ),
                Cell::new(&record.description),
            ]);
        }

        self.term.write_line(&table.to_string())
    }

    fn render_stats(&self, stats: &DashboardStats) -> io::Result<()> {
        let mut table = self.table();
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![Cell::new("Total requests"), Cell::new(stats.total_requests)]);
        table.add_row(vec![Cell::new("Active requests"), Cell::new(stats.active_requests)]);
        table.add_row(vec![Cell::new("Ready requests"), Cell::new(stats.ready_requests)]);
        table.add_row(vec![
            Cell::new("Packages downloaded"),
            Cell::new(stats.packages_downloaded),
        ]);
        table.add_row(vec![
            Cell::new("Errors (last 24h)"),
            Cell::new(stats.recent_errors),
        ]);
        let success_rate = stats
            .success_rate
            .map_or_else(|| "-".to_string(), |rate| format!("{rate:.1}%"));
        table.add_row(vec![Cell::new("Success rate"), Cell::new(success_rate)]);
        self.term.write_line(&table.to_string())
    }

    fn render_packages(&self, packages: &[DownloadedPackage]) -> io::Result<()> {
        if packages.is_empty() {
            return self.term.write_line("No downloaded packages.");
        }

        let mut table = self.table();
        table.set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Request").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
            Cell::new("Downloaded").add_attribute(Attribute::Bold),
        ]);
        for package in packages {
            table.add_row(vec![
                Cell::new(&package.package_id),
                Cell::new(&package.request_id),
                Cell::new(format_size(package.size)),
                Cell::new(package.downloaded_at.format(TIMESTAMP_FORMAT)),
            ]);
        }
        self.term.write_line(&table.to_string())
    }

    fn render_downloads(&self, downloads: &[DownloadedPackage]) -> io::Result<()> {
        if downloads.is_empty() {
            return self.term.write_line("Nothing downloaded.");
        }

        let mut table = self.table();
        table.set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("File").add_attribute(Attribute::Bold),
            Cell::new("Size").add_attribute(Attribute::Bold),
        ]);
        for download in downloads {
            table.add_row(vec![
                Cell::new(&download.package_id),
                Cell::new(download.path.display()),
                Cell::new(format_size(download.size)),
            ]);
        }
        self.term.write_line(&table.to_string())
    }

    fn render_success_message(&self, message: &str) -> io::Result<()> {
        let line = if self.colors_enabled() {
            Style::new().green().apply_to(message).to_string()
        } else {
            message.to_string()
        };
        self.term.write_line(&line)
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.colors_enabled() {
            table.force_no_tty();
        }
        table
    }

    fn state_cell(&self, state: LifecycleState) -> Cell {
        let cell = Cell::new(state);
        if !self.colors_enabled() {
            return cell;
        }
        match state {
            LifecycleState::Ready => cell.fg(Color::Green),
            LifecycleState::Pending | LifecycleState::Processing => cell.fg(Color::Yellow),
            LifecycleState::CompletedEmpty => cell.fg(Color::Blue),
            LifecycleState::Rejected | LifecycleState::Expired | LifecycleState::Failed => {
                cell.fg(Color::Red)
            }
        }
    }

    fn style_state(&self, state: LifecycleState) -> String {
        if !self.colors_enabled() {
            return state.to_string();
        }
        let style = match state {
            LifecycleState::Ready => Style::new().green(),
            LifecycleState::Pending | LifecycleState::Processing => Style::new().yellow(),
            LifecycleState::CompletedEmpty => Style::new().blue(),
            LifecycleState::Rejected | LifecycleState::Expired | LifecycleState::Failed => {
                Style::new().red()
            }
        };
        style.apply_to(state).to_string()
    }

    fn style_heading(&self, text: &str) -> String {
        if self.colors_enabled() {
            Style::new().bold().cyan().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if colors should be used
    fn colors_enabled(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

/// Human readable byte count
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
