use std::io::Write;

use chimeclock_core::{ClockDisplay, StatusDisplay, Theme};

/// Writes the clock face in place on one line and status messages on
/// their own lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalDisplay;

impl StatusDisplay for TerminalDisplay {
    fn show_status(&mut self, status: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "\r\x1b[2K{status}");
        let _ = out.flush();
    }
}

impl ClockDisplay for TerminalDisplay {
    fn show_time(&mut self, face: &str, theme: Theme) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r\x1b[2K{face}  [{theme}]");
        let _ = out.flush();
    }
}
