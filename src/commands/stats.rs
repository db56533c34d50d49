//! Stats command implementation.

use anyhow::Result;
use std::path::Path;

use crate::stats::{display_stats, UnilistState, DEFAULT_STATE_FILE};

/// Run the stats command
pub fn run(config_path: &Path) -> Result<()> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let state = UnilistState::load(&base_dir.join(DEFAULT_STATE_FILE))?;
    display_stats(&state);
    Ok(())
}
