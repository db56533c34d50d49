//! Clean-cache command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::fetcher::Fetcher;

/// Run the clean-cache command
pub fn run(config_path: &Path) -> Result<()> {
    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let fetcher = Fetcher::new(&config.settings, base_dir.join("cache"), false)?;
    let removed = fetcher.clean_cache()?;

    println!("Removed {} cached source file(s)", removed);
    Ok(())
}
