//! Statistics display and persistent run state.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::RunReport;

/// Default location of the persisted run state, next to the config file.
pub const DEFAULT_STATE_FILE: &str = "state.json";

/// Persistent state recorded after each successful generation run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnilistState {
    pub last_update: Option<DateTime<Utc>>,
    pub sources: Vec<SourceStats>,
    pub input_lines: usize,
    pub excluded: usize,
    pub rejected: usize,
    pub deduplicated: usize,
    pub output_rules: usize,
    pub sections: Vec<SectionStats>,
}

/// Per-source statistics for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStats {
    pub name: String,
    pub raw_count: usize,
    pub from_cache: bool,
}

/// Final rule count for one output section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionStats {
    pub name: String,
    pub rule_count: usize,
}

impl UnilistState {
    /// Load state from file, empty state when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save state to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Record the outcome of a generation run.
    pub fn record_run(&mut self, sources: Vec<SourceStats>, report: &RunReport) {
        self.sources = sources;
        self.input_lines = report.input_lines;
        self.excluded = report.excluded;
        self.rejected = report.rejected_total();
        self.deduplicated = report.deduplicated;
        self.output_rules = report.output_rules;
        self.sections = report
            .section_counts
            .iter()
            .map(|(name, count)| SectionStats {
                name: name.clone(),
                rule_count: *count,
            })
            .collect();
        self.last_update = Some(Utc::now());
    }
}

/// Compact count for log lines: plain below one thousand, K/M suffixed
/// above.
pub fn format_count(n: usize) -> String {
    match n {
        0..=999 => n.to_string(),
        1_000..=999_999 => format!("{:.1}K", n as f64 / 1e3),
        _ => format!("{:.1}M", n as f64 / 1e6),
    }
}

/// Thousands-separated count for table cells.
pub fn format_count_with_separator(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.bytes().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(d as char);
    }
    out
}

/// Human-readable byte size for the post-write log line.
pub fn format_bytes(bytes: u64) -> String {
    const SCALES: [(u64, &str); 3] = [(1 << 30, "GB"), (1 << 20, "MB"), (1 << 10, "KB")];
    for (unit, label) in SCALES {
        if bytes >= unit {
            return format!("{:.1} {}", bytes as f64 / unit as f64, label);
        }
    }
    format!("{} B", bytes)
}

/// Clip a name to a table column, ending in "..." when clipped. Counts
/// chars, not bytes, so multibyte source names never split.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Display formatted statistics from the last run.
pub fn display_stats(state: &UnilistState) {
    println!();
    println!("══════════════════════════════════════════════════════════════════");
    println!(" UNILIST GENERATION STATISTICS");
    println!("══════════════════════════════════════════════════════════════════");
    println!();

    if !state.sources.is_empty() {
        println!(" SOURCE                        LINES        ORIGIN");
        println!(" ──────────────────────────── ──────────── ────────");
        for source in &state.sources {
            println!(
                " {:<28} {:>12} {:>8}",
                truncate(&source.name, 28),
                format_count_with_separator(source.raw_count),
                if source.from_cache { "cache" } else { "network" },
            );
        }
        println!(" ──────────────────────────── ──────────── ────────");
        println!(
            " {:<28} {:>12}",
            "TOTAL",
            format_count_with_separator(state.input_lines),
        );
        println!();
    }

    println!(" PIPELINE");
    println!(" ────────────────────────────────────────────────────────────────");
    println!(
        " Input lines:     {}",
        format_count_with_separator(state.input_lines)
    );
    println!(
        " Excluded:        {}",
        format_count_with_separator(state.excluded)
    );
    println!(
        " Rejected:        {}",
        format_count_with_separator(state.rejected)
    );
    println!(
        " Deduplicated:    {}",
        format_count_with_separator(state.deduplicated)
    );
    println!(
        " Output rules:    {}",
        format_count_with_separator(state.output_rules)
    );
    println!();

    if !state.sections.is_empty() {
        println!(" SECTION                                 RULES");
        println!(" ─────────────────────────────────────── ────────────");
        for section in &state.sections {
            println!(
                " {:<39} {:>12}",
                truncate(&section.name, 39),
                format_count_with_separator(section.rule_count),
            );
        }
        println!();
    }

    if let Some(last_update) = state.last_update {
        let local: DateTime<Local> = last_update.into();
        let ago = format_duration_ago(last_update);
        println!(" Last update: {} ({})", local.format("%Y-%m-%d %H:%M:%S"), ago);
    } else {
        println!(" Last update: never");
    }

    println!("══════════════════════════════════════════════════════════════════");
    println!();
}

/// Format duration since a timestamp
fn format_duration_ago(dt: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(dt);

    let seconds = duration.num_seconds();
    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86400)
    }
}
