//! Pipeline orchestration: raw source lines in, assembled sections and a
//! diagnostics report out.
//!
//! The engine is a pure, stateless-between-runs transformation: the same
//! input always produces byte-identical output. Per-line failures are
//! recorded in the report and never abort the run; a broken internal
//! invariant aborts with no partial output.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use crate::assembler::{assemble, Section, SectionSpec};
use crate::classifier::classify;
use crate::dialect::SyntaxDictionary;
use crate::error::UnilistError;
use crate::parser::{parse, ExcludeSet, LineOutcome};
use crate::resolver::resolve;
use crate::rule::{ClassifiedRule, RawLine, RejectedLine, RuleKind, SourceDescriptor};

/// All lines retrieved from one source.
///
/// Sources that failed retrieval are simply absent from the input; that
/// failure is the fetcher's concern, reported upstream.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub source: SourceDescriptor,
    pub lines: Vec<String>,
}

/// Run-level diagnostics accumulated over one engine run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Total raw lines received across all sources.
    pub input_lines: usize,
    /// Lines silently skipped by exclude patterns.
    pub excluded: usize,
    /// Rejected lines per reason.
    pub rejects: BTreeMap<String, usize>,
    /// Lines that became parsed rules.
    pub parsed: usize,
    /// Rules removed by conflict resolution (merged into a winner or
    /// shadowed by one).
    pub deduplicated: usize,
    /// Distinct rules in the final output.
    pub output_rules: usize,
    /// Kinds that had no configured section and fell through to the
    /// catch-all.
    pub unrouted_kinds: Vec<RuleKind>,
    /// Final rule count per section, in output order.
    pub section_counts: Vec<(String, usize)>,
}

impl RunReport {
    pub fn rejected_total(&self) -> usize {
        self.rejects.values().sum()
    }
}

/// Output of one engine run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub sections: Vec<Section>,
    pub report: RunReport,
    /// Rejected lines, kept for diagnostics display. Never part of the
    /// generated list.
    pub rejected: Vec<RejectedLine>,
}

/// Run the full normalization and conflict-resolution pipeline.
///
/// Inputs are ordered by `(source priority, given order)` before parsing so
/// the resolver's tie-breaking is deterministic. Parsing each line is
/// independent; resolution is strictly sequential.
pub fn run(
    mut inputs: Vec<SourceInput>,
    sections: &[SectionSpec],
    dict: &SyntaxDictionary,
    excludes: &ExcludeSet,
) -> Result<RunOutput, UnilistError> {
    inputs.sort_by_key(|input| input.source.priority);

    let mut report = RunReport::default();
    let mut rejected: Vec<RejectedLine> = Vec::new();
    let mut classified: Vec<ClassifiedRule> = Vec::new();

    for input in &inputs {
        debug!(
            source = %input.source.name,
            lines = input.lines.len(),
            "parsing source"
        );
        for (idx, text) in input.lines.iter().enumerate() {
            report.input_lines += 1;
            let raw = RawLine {
                text: text.clone(),
                source: input.source.clone(),
                line_number: idx + 1,
            };
            match parse(&raw, dict, excludes) {
                LineOutcome::Excluded => report.excluded += 1,
                LineOutcome::Parsed(rule) => {
                    report.parsed += 1;
                    classified.push(classify(rule));
                }
                LineOutcome::Rejected(line) => {
                    *report.rejects.entry(line.reason.label().to_string()).or_default() += 1;
                    rejected.push(line);
                }
            }
        }
    }

    info!(
        input = report.input_lines,
        parsed = report.parsed,
        excluded = report.excluded,
        rejected = report.rejected_total(),
        "parse stage complete"
    );

    let resolved = resolve(classified);
    report.deduplicated = report.parsed - resolved.len();
    report.output_rules = resolved.len();

    let (sections, unrouted_kinds) = assemble(resolved, sections);
    report.unrouted_kinds = unrouted_kinds;
    report.section_counts = sections
        .iter()
        .map(|s| (s.name.clone(), s.rules.len()))
        .collect();

    verify_invariants(&sections)?;

    info!(
        output = report.output_rules,
        deduplicated = report.deduplicated,
        "engine run complete"
    );

    Ok(RunOutput {
        sections,
        report,
        rejected,
    })
}

/// Fail closed when the resolver's uniqueness contract was broken: no two
/// rules in the final output may share a canonical key.
fn verify_invariants(sections: &[Section]) -> Result<(), UnilistError> {
    for section in sections {
        // Within one section keys must be unique; across sections a rule
        // may legitimately appear more than once by configuration.
        let mut in_section = HashSet::new();
        for rule in &section.rules {
            if !in_section.insert(&rule.key) {
                return Err(UnilistError::InvariantViolation(format!(
                    "duplicate canonical key in section '{}': {}",
                    section.name, rule.key
                )));
            }
        }
    }
    Ok(())
}
