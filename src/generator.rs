//! Output list generation.
//!
//! Renders the assembled sections into the final filter list text and
//! writes it atomically (temp file in the target directory, then rename),
//! so a crash mid-write never leaves a truncated list behind.

use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Write;
use std::path::Path;

use crate::assembler::Section;
use crate::config::Metadata;

/// Render the complete filter list: metadata header, then each non-empty
/// section under a banner comment.
pub fn render(metadata: &Metadata, sections: &[Section]) -> String {
    let total_rules: usize = sections.iter().map(|s| s.rules.len()).sum();
    let mut out = String::new();

    out.push_str(&format!("! Title: {}\n", metadata.title));
    out.push_str(&format!("! Description: {}\n", metadata.description));
    if !metadata.author.is_empty() {
        out.push_str(&format!("! Author: {}\n", metadata.author));
    }
    if !metadata.homepage.is_empty() {
        out.push_str(&format!("! Homepage: {}\n", metadata.homepage));
    }
    out.push_str(&format!(
        "! Last updated: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("! Total rules: {}\n", total_rules));
    out.push_str(&format!("! Expires: {}\n", metadata.expires));

    for section in sections {
        if section.rules.is_empty() {
            continue;
        }
        out.push('\n');
        out.push_str(&format!("! ----- {} -----\n", section.name));
        if !section.description.is_empty() {
            out.push_str(&format!("! {}\n", section.description));
        }
        for line in section.lines() {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}

/// Write the rendered list to disk atomically.
pub fn write_list(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    let mut temp = tempfile::NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
        .context("Failed to create temporary output file")?;
    temp.write_all(content.as_bytes())
        .context("Failed to write output file")?;
    temp.flush().context("Failed to flush output file")?;
    temp.persist(path)
        .with_context(|| format!("Failed to persist output file: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{CanonicalKey, ResolvedRule, RuleKind};

    fn section(name: &str, rules: Vec<ResolvedRule>) -> Section {
        Section {
            name: name.to_string(),
            description: format!("{} rules", name),
            rule_type_codes: vec![1],
            rules,
        }
    }

    fn rule(pattern: &str) -> ResolvedRule {
        ResolvedRule {
            key: CanonicalKey {
                kind: RuleKind::Network,
                pattern: pattern.to_string(),
                modifiers: String::new(),
            },
            winner: crate::rule::ParsedRule {
                kind: RuleKind::Network,
                pattern: pattern.to_string(),
                modifiers: vec![],
                is_exception: false,
                domains_applied: vec![],
                origin: crate::rule::SourceDescriptor {
                    name: "test".to_string(),
                    dialect: crate::dialect::Dialect::Ublock,
                    priority: 1,
                    enabled: true,
                },
                raw_text: pattern.to_string(),
            },
            merged_domain_scope: vec![],
            shadowed: vec![],
        }
    }

    fn metadata() -> Metadata {
        Metadata {
            title: "Unified List".to_string(),
            description: "Merged filters".to_string(),
            author: "tests".to_string(),
            homepage: String::new(),
            expires: "1 day".to_string(),
        }
    }

    #[test]
    fn test_header_fields() {
        let out = render(&metadata(), &[]);
        assert!(out.starts_with("! Title: Unified List\n"));
        assert!(out.contains("! Description: Merged filters\n"));
        assert!(out.contains("! Author: tests\n"));
        assert!(!out.contains("! Homepage:"));
        assert!(out.contains("! Total rules: 0\n"));
        assert!(out.contains("! Expires: 1 day\n"));
    }

    #[test]
    fn test_sections_rendered_with_banner() {
        let sections = vec![
            section("Network Filters", vec![rule("||ads.example^")]),
            section("Empty Section", vec![]),
        ];
        let out = render(&metadata(), &sections);
        assert!(out.contains("! ----- Network Filters -----\n"));
        assert!(out.contains("||ads.example^\n"));
        assert!(!out.contains("Empty Section"));
        assert!(out.contains("! Total rules: 1\n"));
    }

    #[test]
    fn test_write_list_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("list.txt");
        write_list(&path, "! Title: x\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "! Title: x\n");
    }

    #[test]
    fn test_write_list_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        write_list(&path, "old\n").unwrap();
        write_list(&path, "new\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }
}
