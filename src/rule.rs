//! Typed rule model shared by all pipeline stages.
//!
//! A raw text line from a source becomes a [`ParsedRule`] (or a
//! [`RejectedLine`]), gains a [`CanonicalKey`] during classification, and
//! ends up inside a [`ResolvedRule`] after conflict resolution. Values are
//! replaced, never mutated, as they move between stages.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dialect::Dialect;

/// One configured upstream list.
///
/// Lower `priority` wins conflict-resolution ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub dialect: Dialect,
    pub priority: u32,
    pub enabled: bool,
}

/// A single raw text line with its provenance.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub text: String,
    pub source: SourceDescriptor,
    pub line_number: usize,
}

/// The syntax family a rule belongs to.
///
/// Every parsed rule has exactly one kind. Codes match the section routing
/// table in the configuration (`rule_types`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// Network block/allow filter (`||example.com^`, `@@||example.com^`)
    Network,
    /// Cosmetic element hiding (`example.com##.ad`)
    Cosmetic,
    /// Scriptlet injection (`example.com##+js(aopr, detector)`)
    Scriptlet,
    /// HTML filtering (`example.com##^script:has-text(ads)`)
    HtmlFilter,
    /// Resource redirect (`||ads.example^$redirect=noop.js`)
    Redirect,
    /// URL parameter removal (`||example.com^$removeparam=utm_source`)
    RemoveParam,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::Network,
        RuleKind::Cosmetic,
        RuleKind::Scriptlet,
        RuleKind::HtmlFilter,
        RuleKind::Redirect,
        RuleKind::RemoveParam,
    ];

    /// Stable numeric code used by section routing configuration.
    pub fn code(&self) -> u32 {
        match self {
            RuleKind::Network => 1,
            RuleKind::Cosmetic => 3,
            RuleKind::Scriptlet => 7,
            RuleKind::HtmlFilter => 8,
            RuleKind::RemoveParam => 14,
            RuleKind::Redirect => 15,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::Network => "network",
            RuleKind::Cosmetic => "cosmetic",
            RuleKind::Scriptlet => "scriptlet",
            RuleKind::HtmlFilter => "html-filter",
            RuleKind::RemoveParam => "removeparam",
            RuleKind::Redirect => "redirect",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single `name` or `name=value` entry from a rule's modifier tail.
///
/// Recognized names are stored in canonical form; unrecognized but
/// well-formed modifiers keep their original name and raw value so no
/// information is lost through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
    pub value: Option<String>,
}

impl Modifier {
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn valued(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => f.write_str(&self.name),
        }
    }
}

/// A rule parsed into its structural parts, with provenance.
#[derive(Debug, Clone)]
pub struct ParsedRule {
    pub kind: RuleKind,
    /// Domain/URL pattern for network rules, selector or payload for the
    /// cosmetic family (scriptlet payloads are opaque, preserved verbatim).
    pub pattern: String,
    /// Modifier tail in original order, duplicate names already rejected.
    /// Never contains `domain`; that lives in `domains_applied`.
    pub modifiers: Vec<Modifier>,
    pub is_exception: bool,
    /// Scope restriction; empty means the rule applies everywhere.
    pub domains_applied: Vec<String>,
    pub origin: SourceDescriptor,
    pub raw_text: String,
}

impl ParsedRule {
    /// Serialize to canonical rule text with the given domain scope.
    ///
    /// The modifier tail is emitted sorted by name so two runs over the same
    /// input produce byte-identical output. Cosmetic-family rules re-emit as
    /// `domains##pattern` with the domain list sorted.
    pub fn canonical_line(&self, scope: &[String]) -> String {
        let mut domains: Vec<&str> = scope.iter().map(String::as_str).collect();
        domains.sort_unstable();
        domains.dedup();

        match self.kind {
            RuleKind::Cosmetic | RuleKind::Scriptlet | RuleKind::HtmlFilter => {
                let sep = if self.is_exception { "#@#" } else { "##" };
                format!("{}{}{}", domains.join(","), sep, self.pattern)
            }
            RuleKind::Network | RuleKind::Redirect | RuleKind::RemoveParam => {
                let mut tail: Vec<String> =
                    self.modifiers.iter().map(|m| m.to_string()).collect();
                if !domains.is_empty() {
                    tail.push(format!("domain={}", domains.join("|")));
                }
                tail.sort_unstable();

                let marker = if self.is_exception { "@@" } else { "" };
                if tail.is_empty() {
                    format!("{}{}", marker, self.pattern)
                } else {
                    format!("{}{}${}", marker, self.pattern, tail.join(","))
                }
            }
        }
    }
}

/// Why a line could not be turned into a [`ParsedRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// Blank or comment line not covered by the configured exclude patterns.
    EmptyOrComment,
    /// Dialect-specific token the syntax dictionary knows to be untranslatable.
    UnknownDialectToken,
    /// Structurally broken modifier tail (duplicate or empty modifier names).
    MalformedModifierList,
    /// Pattern/selector syntax too broken to classify safely.
    AmbiguousPatternSyntax,
}

impl RejectReason {
    pub const ALL: [RejectReason; 4] = [
        RejectReason::EmptyOrComment,
        RejectReason::UnknownDialectToken,
        RejectReason::MalformedModifierList,
        RejectReason::AmbiguousPatternSyntax,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::EmptyOrComment => "empty-or-comment",
            RejectReason::UnknownDialectToken => "unknown-dialect-token",
            RejectReason::MalformedModifierList => "malformed-modifier-list",
            RejectReason::AmbiguousPatternSyntax => "ambiguous-pattern-syntax",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A line the parser refused, kept for diagnostics only.
#[derive(Debug, Clone)]
pub struct RejectedLine {
    pub raw: RawLine,
    pub reason: RejectReason,
}

/// Equivalence key for merge/conflict resolution.
///
/// Two rules with the same key are candidates for merging or shadowing.
/// The exception marker is deliberately NOT part of the key: an exception
/// and a block rule for the same structural pattern must collide so that
/// exception precedence can apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    pub kind: RuleKind,
    pub pattern: String,
    /// Canonical modifier tail, sorted by name, domain scope excluded.
    pub modifiers: String,
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}:{}", self.kind, self.pattern)
        } else {
            write!(f, "{}:{}${}", self.kind, self.pattern, self.modifiers)
        }
    }
}

/// A [`ParsedRule`] paired with its derived [`CanonicalKey`].
#[derive(Debug, Clone)]
pub struct ClassifiedRule {
    pub rule: ParsedRule,
    pub key: CanonicalKey,
}

/// The single surviving rule for one canonical key.
#[derive(Debug, Clone)]
pub struct ResolvedRule {
    pub key: CanonicalKey,
    pub winner: ParsedRule,
    /// Union of contributing scopes; empty when any contributor was global.
    pub merged_domain_scope: Vec<String>,
    /// Rules that lost resolution, in input order. Diagnostics only.
    pub shadowed: Vec<ParsedRule>,
}

impl ResolvedRule {
    /// Canonical output text for this rule.
    pub fn canonical_line(&self) -> String {
        self.winner.canonical_line(&self.merged_domain_scope)
    }
}
