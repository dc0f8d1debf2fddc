//! Export the current buffer to a text file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use swarmtail_types::ArcLogLine;

/// Lines joined with `\n`, no trailing terminator
pub fn export_text(lines: &[ArcLogLine]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `swarm-logs-YYYY-MM-DDTHH-MM-SS.txt`
pub fn export_file_name(at: DateTime<Local>) -> String {
    format!("swarm-logs-{}.txt", at.format("%Y-%m-%dT%H-%M-%S"))
}

/// Write a snapshot to `dir`, returning the path written
pub fn write_export(dir: &Path, lines: &[ArcLogLine]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(Local::now()));
    fs::write(&path, export_text(lines))?;
    Ok(path)
}
