use std::io::{self, Write};
use std::path::Path;

use crossterm::style::{Color, Stylize};

use crate::core::error::ReencodeError;
use crate::core::outcome::Outcome;
use crate::core::plan::EncodingPlan;

/// Operator-facing output: the pre-encode banner and one summary line per file.
/// Failures go to `err` so a batch driver reading `out` only sees results.
pub struct Reporter<W: Write, E: Write> {
    out: W,
    err: E,
    color: bool,
    quiet: bool,
}

impl Reporter<io::Stdout, io::Stderr> {
    pub fn terminal(color: bool, quiet: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), color, quiet)
    }
}

impl<W: Write, E: Write> Reporter<W, E> {
    pub fn new(out: W, err: E, color: bool, quiet: bool) -> Self {
        Self {
            out,
            err,
            color,
            quiet,
        }
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }

    pub fn announce(&mut self, plan: &EncodingPlan) {
        if self.quiet || plan.is_empty() {
            return;
        }
        let _ = writeln!(
            self.out,
            "{} => {}",
            plan.source.display(),
            plan.output.display()
        );
    }

    pub fn outcome(&mut self, outcome: &Outcome) {
        let line = match outcome {
            Outcome::Encoded { source, output } => format!(
                "{} {} => {}{}",
                self.paint("encoded", Color::Green),
                source.display(),
                output.display(),
                size_change(source, output)
            ),
            Outcome::Overwritten { source, target } => format!(
                "{} {} with re-encoded file{}",
                self.paint("replaced", Color::Green),
                target.display(),
                // After the rename only the new file is left to measure.
                if source == target {
                    size_of(target).map(|s| format!(" ({s})")).unwrap_or_default()
                } else {
                    size_change(source, target)
                }
            ),
            Outcome::Skipped { source, codec } => format!(
                "{} {} (already {codec})",
                self.paint("skipped", Color::Yellow),
                source.display()
            ),
        };
        let _ = writeln!(self.out, "{line}");
    }

    pub fn failure(&mut self, source: &Path, err: &ReencodeError) {
        let label = self.paint("failed", Color::Red);
        let _ = writeln!(self.err, "{label} {}: {err}", source.display());
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn size_of(path: &Path) -> Option<String> {
    std::fs::metadata(path)
        .ok()
        .map(|meta| format_bytes(meta.len()))
}

fn size_change(before: &Path, after: &Path) -> String {
    match (size_of(before), size_of(after)) {
        (Some(before), Some(after)) => format!(" ({before} -> {after})"),
        _ => String::new(),
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let value = bytes as f64;
    if value >= GB {
        format!("{:.2} GB", value / GB)
    } else if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}
