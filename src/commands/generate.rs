//! Generate command implementation.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dialect::SyntaxDictionary;
use crate::engine::{self, SourceInput};
use crate::fetcher::{FetchResult, Fetcher};
use crate::generator;
use crate::parser::ExcludeSet;
use crate::stats::{
    self, format_bytes, format_count, SourceStats, UnilistState, DEFAULT_STATE_FILE,
};

/// Run the generate command
pub async fn run(
    config_path: &Path,
    output: Option<PathBuf>,
    no_cache: bool,
    dry_run: bool,
    show_stats: bool,
) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Cache and state live next to the config file
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let cache_dir = base_dir.join("cache");
    let state_path = base_dir.join(DEFAULT_STATE_FILE);

    let enabled = config.enabled_sources();
    if enabled.is_empty() {
        warn!("No sources enabled. Check your configuration.");
        return Ok(());
    }

    info!("Fetching {} sources...", enabled.len());
    let fetcher = Fetcher::new(&config.settings, &cache_dir, !no_cache)?;
    let results = fetcher.fetch_sources(&enabled).await;

    // Completion order is arbitrary; reassemble in configured priority order
    let mut by_name: HashMap<String, FetchResult> = HashMap::new();
    for (name, result) in results {
        match result {
            Ok(fetch_result) => {
                by_name.insert(name, fetch_result);
            }
            Err(e) => {
                error!("Failed to fetch {}: {:#}", name, e);
            }
        }
    }

    let mut inputs = Vec::new();
    let mut source_stats = Vec::new();
    for source in &enabled {
        if let Some(fetched) = by_name.remove(&source.name) {
            source_stats.push(SourceStats {
                name: fetched.name,
                raw_count: fetched.lines.len(),
                from_cache: fetched.from_cache,
            });
            inputs.push(SourceInput {
                source: source.descriptor(),
                lines: fetched.lines,
            });
        }
    }

    if inputs.is_empty() {
        anyhow::bail!("No sources fetched successfully");
    }

    let dict = SyntaxDictionary::new();
    let excludes = ExcludeSet::compile(&config.exclude_patterns)
        .context("Failed to compile exclude patterns")?;
    let sections = config.section_specs();

    let run_output = engine::run(inputs, &sections, &dict, &excludes)?;
    let report = &run_output.report;

    info!(
        "Normalized {} lines -> {} rules ({} excluded, {} rejected, {} deduplicated)",
        format_count(report.input_lines),
        format_count(report.output_rules),
        format_count(report.excluded),
        format_count(report.rejected_total()),
        format_count(report.deduplicated)
    );

    let content = generator::render(&config.metadata, &run_output.sections);

    let mut state = UnilistState::load(&state_path).unwrap_or_default();
    state.record_run(source_stats, report);

    let output_path = output.unwrap_or_else(|| PathBuf::from(&config.settings.output_file));
    if dry_run {
        info!("Dry run: not writing {:?}", output_path);
    } else {
        generator::write_list(&output_path, &content)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        info!("Wrote {:?} ({})", output_path, format_bytes(content.len() as u64));
        state.save(&state_path)?;
    }

    if show_stats {
        stats::display_stats(&state);
    }

    println!();
    println!(
        "[OK] {} rules generated across {} sections",
        format_count(report.output_rules),
        run_output.sections.len()
    );

    Ok(())
}
