//! Section assembler: routes resolved rules into configured sections and
//! serializes them to canonical text.
//!
//! Routing is by rule-kind code. The configuration in practice maps each
//! kind to exactly one section, but nothing here assumes that: a rule may
//! match several sections, and a rule matching none goes to a catch-all
//! section and is reported, never dropped.

use tracing::warn;

use crate::rule::{ResolvedRule, RuleKind};

/// Name of the section that picks up rules no configured section wants.
pub const CATCH_ALL_SECTION: &str = "Unclassified Rules";

/// Section routing configuration, one entry per output section.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub name: String,
    pub description: String,
    pub rule_type_codes: Vec<u32>,
}

/// One assembled output section. Built once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub description: String,
    pub rule_type_codes: Vec<u32>,
    pub rules: Vec<ResolvedRule>,
}

impl Section {
    /// Canonical rule-text lines, in resolved order.
    pub fn lines(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.canonical_line()).collect()
    }
}

/// Partition resolved rules into sections per the configured routing.
///
/// Returns the assembled sections (catch-all appended only when used) and
/// the list of rule kinds that had no routing entry.
pub fn assemble(resolved: Vec<ResolvedRule>, specs: &[SectionSpec]) -> (Vec<Section>, Vec<RuleKind>) {
    let mut sections: Vec<Section> = specs
        .iter()
        .map(|spec| Section {
            name: spec.name.clone(),
            description: spec.description.clone(),
            rule_type_codes: spec.rule_type_codes.clone(),
            rules: Vec::new(),
        })
        .collect();

    let mut catch_all: Vec<ResolvedRule> = Vec::new();
    let mut unrouted_kinds: Vec<RuleKind> = Vec::new();

    for rule in resolved {
        let code = rule.winner.kind.code();
        let mut routed = false;
        for section in sections.iter_mut() {
            if section.rule_type_codes.contains(&code) {
                section.rules.push(rule.clone());
                routed = true;
            }
        }
        if !routed {
            if !unrouted_kinds.contains(&rule.winner.kind) {
                warn!(
                    kind = %rule.winner.kind,
                    "no section routes rule kind; using catch-all"
                );
                unrouted_kinds.push(rule.winner.kind);
            }
            catch_all.push(rule);
        }
    }

    if !catch_all.is_empty() {
        sections.push(Section {
            name: CATCH_ALL_SECTION.to_string(),
            description: "Rules whose kind is not routed by any configured section".to_string(),
            rule_type_codes: Vec::new(),
            rules: catch_all,
        });
    }

    (sections, unrouted_kinds)
}
