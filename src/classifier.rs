//! Classifier: final kind assignment and canonical-key derivation.
//!
//! The parser establishes the syntax family; this stage refines network
//! rules into redirect/removeparam kinds from modifier presence, normalizes
//! the pattern, and derives the [`CanonicalKey`] used for equivalence. A new
//! rule value is produced; nothing is mutated in place.

use crate::rule::{CanonicalKey, ClassifiedRule, ParsedRule, RuleKind};

/// Assign the final kind and derive the canonical key.
pub fn classify(rule: ParsedRule) -> ClassifiedRule {
    let kind = refine_kind(&rule);
    let pattern = normalize_pattern(kind, &rule.pattern);
    let modifiers = canonical_modifier_tail(&rule);

    let rule = ParsedRule { kind, ..rule };
    let key = CanonicalKey {
        kind,
        pattern,
        modifiers,
    };
    ClassifiedRule { rule, key }
}

/// First-match-wins over the syntax families. The cosmetic family is
/// already decided by its separator syntax; network rules split further on
/// specific modifier presence, redirect before removeparam.
fn refine_kind(rule: &ParsedRule) -> RuleKind {
    match rule.kind {
        RuleKind::Cosmetic | RuleKind::Scriptlet | RuleKind::HtmlFilter => rule.kind,
        _ => {
            if rule
                .modifiers
                .iter()
                .any(|m| m.name == "redirect" || m.name == "redirect-rule")
            {
                RuleKind::Redirect
            } else if rule.modifiers.iter().any(|m| m.name == "removeparam") {
                RuleKind::RemoveParam
            } else {
                RuleKind::Network
            }
        }
    }
}

/// Normalize a pattern for equivalence comparison.
///
/// Only literal-domain patterns are folded (lowercase labels, trailing dot,
/// default port, collapsed wildcard runs). URL and regex patterns get
/// whitespace trimming only: equivalence must never be inferred across
/// structure we cannot prove, so false negatives are fine, false positives
/// are not.
pub fn normalize_pattern(kind: RuleKind, pattern: &str) -> String {
    match kind {
        RuleKind::Cosmetic | RuleKind::Scriptlet | RuleKind::HtmlFilter => {
            pattern.trim().to_string()
        }
        RuleKind::Network | RuleKind::Redirect | RuleKind::RemoveParam => {
            let trimmed = pattern.trim();
            // Regex atoms are opaque: byte identity or nothing
            if trimmed.len() > 1 && trimmed.starts_with('/') && trimmed.ends_with('/') {
                return trimmed.to_string();
            }
            let collapsed = collapse_wildcards(trimmed);
            match literal_domain_parts(&collapsed) {
                Some((host, caret)) => {
                    let host = host.to_ascii_lowercase();
                    let host = host.trim_end_matches('.');
                    format!("||{}{}", host, if caret { "^" } else { "" })
                }
                None => collapsed,
            }
        }
    }
}

/// Collapse runs of `*` into a single wildcard.
fn collapse_wildcards(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut prev_star = false;
    for c in pattern.chars() {
        if c == '*' && prev_star {
            continue;
        }
        prev_star = c == '*';
        out.push(c);
    }
    out
}

/// Match `||host^` / `||host` with a plain literal host (no wildcards, no
/// path). Returns the host with any default port stripped, and whether the
/// separator caret was present.
fn literal_domain_parts(pattern: &str) -> Option<(&str, bool)> {
    let rest = pattern.strip_prefix("||")?;
    let (host_port, caret) = match rest.strip_suffix('^') {
        Some(h) => (h, true),
        None => (rest, false),
    };
    let host = host_port
        .strip_suffix(":80")
        .or_else(|| host_port.strip_suffix(":443"))
        .unwrap_or(host_port);
    let literal = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
    if literal {
        Some((host, caret))
    } else {
        None
    }
}

/// Canonical modifier tail for the key: sorted by name, domain scope
/// excluded (the parser already keeps `domain` out of the modifier list).
fn canonical_modifier_tail(rule: &ParsedRule) -> String {
    let mut parts: Vec<String> = rule.modifiers.iter().map(|m| m.to_string()).collect();
    parts.sort_unstable();
    parts.join(",")
}
