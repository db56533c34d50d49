//! Check command implementation.

use anyhow::Result;

use crate::classifier;
use crate::dialect::{Dialect, SyntaxDictionary};
use crate::parser::{self, ExcludeSet, LineOutcome};
use crate::rule::{RawLine, SourceDescriptor};

/// Run the check command: parse one rule and show its canonical form.
pub fn run(rule_text: &str, dialect_name: &str) -> Result<()> {
    let dialect: Dialect = dialect_name
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let dict = SyntaxDictionary::new();
    let raw = RawLine {
        text: rule_text.to_string(),
        source: SourceDescriptor {
            name: "cli".to_string(),
            dialect,
            priority: 0,
            enabled: true,
        },
        line_number: 1,
    };

    println!();
    match parser::parse(&raw, &dict, &ExcludeSet::empty()) {
        LineOutcome::Parsed(rule) => {
            let classified = classifier::classify(rule);
            println!("Kind:      {}", classified.rule.kind);
            if classified.rule.is_exception {
                println!("Exception: yes");
            }
            if !classified.rule.domains_applied.is_empty() {
                println!("Scope:     {}", classified.rule.domains_applied.join(", "));
            }
            println!("Canonical: {}", classified.key);
            println!(
                "Output:    {}",
                classified.rule.canonical_line(&classified.rule.domains_applied)
            );
        }
        LineOutcome::Rejected(rejected) => {
            println!("REJECTED: {}", rejected.reason.label());
        }
        // Unreachable with an empty exclude set
        LineOutcome::Excluded => {}
    }
    println!();

    Ok(())
}
