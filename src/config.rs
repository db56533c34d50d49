//! Configuration management for unilist.
//!
//! The `sources.json` file carries four blocks: list metadata (header
//! fields), runtime settings, the source table, the section routing table,
//! and the pre-parse exclude patterns.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::assembler::SectionSpec;
use crate::dialect::Dialect;
use crate::rule::SourceDescriptor;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Header fields for the generated list.
    pub metadata: Metadata,

    /// Runtime settings (fetching, caching, output).
    pub settings: Settings,

    /// Upstream filter list sources.
    pub sources: Vec<SourceConfig>,

    /// Output sections and their rule-type routing.
    pub sections: Vec<SectionConfig>,

    /// Regular expressions applied pre-parse, anchored at line start.
    /// Matching lines are skipped silently (comments, banners, checksums).
    pub exclude_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata: Metadata::default(),
            settings: Settings::default(),
            sources: default_sources(),
            sections: default_sections(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            anyhow::bail!("No sources defined in configuration");
        }

        for source in &self.sources {
            if source.name.is_empty() {
                anyhow::bail!("Source with empty name in configuration");
            }
            if source.enabled && !source.url.starts_with("https://") {
                anyhow::bail!(
                    "Source '{}' URL must use HTTPS: {}",
                    source.name,
                    source.url
                );
            }
        }

        if self.sections.is_empty() {
            anyhow::bail!("No sections defined in configuration");
        }
        for section in &self.sections {
            if section.rule_types.is_empty() {
                anyhow::bail!("Section '{}' routes no rule types", section.name);
            }
        }

        // Exclude patterns must compile; report the bad one early rather
        // than mid-run
        crate::parser::ExcludeSet::compile(&self.exclude_patterns)?;

        Ok(())
    }

    /// Enabled sources sorted by priority (lower number first).
    pub fn enabled_sources(&self) -> Vec<&SourceConfig> {
        let mut sources: Vec<&SourceConfig> =
            self.sources.iter().filter(|s| s.enabled).collect();
        sources.sort_by_key(|s| s.priority);
        sources
    }

    /// Section routing specs in configured order.
    pub fn section_specs(&self) -> Vec<SectionSpec> {
        self.sections
            .iter()
            .map(|s| SectionSpec {
                name: s.name.clone(),
                description: s.description.clone(),
                rule_type_codes: s.rule_types.clone(),
            })
            .collect()
    }
}

/// Header fields written at the top of the generated list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub author: String,
    pub homepage: String,
    pub expires: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: "Unified Filter List".to_string(),
            description: "Deduplicated, conflict-resolved adblock rules from multiple sources"
                .to_string(),
            author: "unilist".to_string(),
            homepage: "https://github.com/itsrody/unilist".to_string(),
            expires: "1 day".to_string(),
        }
    }
}

/// Runtime settings with the defaults the tool has always shipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cache validity in seconds.
    pub cache_ttl: u64,
    pub max_retries: u32,
    /// Delay between retries in seconds (doubled per attempt).
    pub retry_delay: u64,
    /// HTTP timeout in seconds.
    pub timeout: u64,
    pub user_agent: String,
    pub parallel_downloads: usize,
    pub output_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl: 86400,
            max_retries: 3,
            retry_delay: 5,
            timeout: 30,
            user_agent: format!("unilist/{}", env!("CARGO_PKG_VERSION")),
            parallel_downloads: 5,
            output_file: "unified-list.txt".to_string(),
        }
    }
}

/// One upstream source list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Filter syntax dialect of this source.
    #[serde(alias = "type")]
    pub dialect: Dialect,
    pub url: String,
    /// Lower number = higher precedence in conflict resolution.
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl SourceConfig {
    /// Provenance descriptor carried on every rule from this source.
    pub fn descriptor(&self) -> SourceDescriptor {
        SourceDescriptor {
            name: self.name.clone(),
            dialect: self.dialect,
            priority: self.priority,
            enabled: self.enabled,
        }
    }
}

/// One output section and the rule-type codes it routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule_types: Vec<u32>,
}

fn default_priority() -> u32 {
    999
}

fn default_true() -> bool {
    true
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "easylist".to_string(),
            dialect: Dialect::Abp,
            url: "https://easylist.to/easylist/easylist.txt".to_string(),
            priority: 1,
            enabled: true,
        },
        SourceConfig {
            name: "easyprivacy".to_string(),
            dialect: Dialect::Abp,
            url: "https://easylist.to/easylist/easyprivacy.txt".to_string(),
            priority: 2,
            enabled: true,
        },
        SourceConfig {
            name: "ublock-filters".to_string(),
            dialect: Dialect::Ublock,
            url: "https://ublockorigin.github.io/uAssets/filters/filters.txt".to_string(),
            priority: 3,
            enabled: true,
        },
        SourceConfig {
            name: "adguard-base".to_string(),
            dialect: Dialect::Adguard,
            url: "https://filters.adtidy.org/extension/ublock/filters/2.txt".to_string(),
            priority: 10,
            enabled: false,
        },
        SourceConfig {
            name: "stevenblack-hosts".to_string(),
            dialect: Dialect::Hosts,
            url: "https://raw.githubusercontent.com/StevenBlack/hosts/master/hosts".to_string(),
            priority: 20,
            enabled: false,
        },
    ]
}

fn default_sections() -> Vec<SectionConfig> {
    vec![
        SectionConfig {
            name: "Network Blocking Rules".to_string(),
            description: "Network request block and allow filters".to_string(),
            rule_types: vec![1],
        },
        SectionConfig {
            name: "Cosmetic Rules".to_string(),
            description: "Element hiding selectors".to_string(),
            rule_types: vec![3],
        },
        SectionConfig {
            name: "Scriptlet Injection Rules".to_string(),
            description: "Anti-adblock countermeasures".to_string(),
            rule_types: vec![7],
        },
        SectionConfig {
            name: "HTML Filtering Rules".to_string(),
            description: "Response body filters".to_string(),
            rule_types: vec![8],
        },
        SectionConfig {
            name: "Parameter Removal Rules".to_string(),
            description: "Tracking parameter strippers".to_string(),
            rule_types: vec![14],
        },
        SectionConfig {
            name: "Redirect Rules".to_string(),
            description: "Resource replacement filters".to_string(),
            rule_types: vec![15],
        },
    ]
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        r"!".to_string(),
        r"\[Adblock".to_string(),
        r"# ".to_string(),
        r"#$".to_string(),
        r"! Checksum".to_string(),
    ]
}
