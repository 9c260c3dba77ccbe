//! Output formatting utilities for the CLI
//!
//! Coloured status lines for progress messages and a table for
//! `devstack status`.

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// State of one component as seen by `devstack status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Running,
    Stopped,
    Reachable,
    Unreachable,
    Disabled,
}

impl std::fmt::Display for ComponentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ComponentState::Running => "running",
            ComponentState::Stopped => "stopped",
            ComponentState::Reachable => "reachable",
            ComponentState::Unreachable => "unreachable",
            ComponentState::Disabled => "disabled",
        };
        write!(f, "{}", s)
    }
}

/// One row of the status report
#[derive(Debug, Clone, Serialize)]
pub struct ComponentStatus {
    pub name: String,
    pub state: ComponentState,
    /// PIDs or address, depending on the component
    pub detail: String,
}

/// Everything `devstack status` reports
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub components: Vec<ComponentStatus>,
}

/// Format a status report as a table
pub fn format_status(report: &StatusReport) -> String {
    #[derive(Tabled)]
    struct StatusRow {
        #[tabled(rename = "COMPONENT")]
        name: String,
        #[tabled(rename = "STATE")]
        state: String,
        #[tabled(rename = "DETAIL")]
        detail: String,
    }

    let rows: Vec<StatusRow> = report
        .components
        .iter()
        .map(|c| StatusRow {
            name: c.name.clone(),
            state: c.state.to_string(),
            detail: if c.detail.is_empty() {
                "-".to_string()
            } else {
                c.detail.clone()
            },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format a PID list for display
pub fn format_pids(pids: &[u32]) -> String {
    pids.iter()
        .map(|pid| pid.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow with a warning symbol prefix
///
/// Outputs to stderr.
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
