//! The status report bundled with every backup.
//!

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// The file name of the report inside the staging directory and archive.
pub const REPORT_FILE_NAME: &str = "PROJECT_STATUS.txt";

/// Render the status report for a backup taken at `timestamp`.
pub fn render_report(timestamp: &str) -> String {
    format!(
        "\
DSR PRO AI - PROJECT STATUS
===========================

Generated: {timestamp}
Version:   0.1.0 (Migration Phase)

1. EXECUTIVE SUMMARY
--------------------
Current State: Migration from Flet to PySide6 (Qt).
Health:        On Track
Key Achievement: Core architecture re-designed for 30,000+ image capacity using virtualization.

2. ROADMAP & MILESTONES
-----------------------
Phase 1  Core Setup (PySide6)    In Progress   40%
Phase 2  UI Shell (Dark Mode)    Pending        0%
Phase 3  Grid Engine (Virtual)   Pending        0%
Phase 4  AI Integration          Ready (Old)  100%

3. RISKS & BLOCKERS
-------------------
Previous:     Flet framework limitation (arrow keys, performance).
Resolution:   Migrated to PySide6. Arrow key support is now native.
Current Risk: Learning curve for Qt Model/View programming (high complexity).

4. PENDING TASKS
----------------
[ ] Verify project setup execution.
[ ] Copy database manager from the old project.
[ ] Implement QListView for 30k image handling.
[ ] Design Gold/Black theme.
"
    )
}

/// Write the rendered report into `directory`, returning the report's path.
pub fn write_report(directory: &Path, timestamp: &str) -> io::Result<PathBuf> {
    let path = directory.join(REPORT_FILE_NAME);
    fs::write(&path, render_report(timestamp))?;

    Ok(path)
}
