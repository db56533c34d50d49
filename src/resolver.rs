//! Conflict resolver: one winning rule per canonical key.
//!
//! Strictly sequential by design. Tie-breaking depends on input order, so
//! the caller hands rules over in `(source priority, line order)` sequence
//! and this stage never re-sorts, groups by key in first-appearance order,
//! and picks winners deterministically.

use std::collections::HashMap;

use tracing::debug;

use crate::rule::{CanonicalKey, ClassifiedRule, ParsedRule, ResolvedRule};

/// Resolve a classified rule sequence into one [`ResolvedRule`] per key.
///
/// Precedence within a group:
/// 1. exception rules always beat block rules, regardless of source
///    priority (an exception is safety-critical and never dropped in favor
///    of a block);
/// 2. among the surviving side, lowest `(source priority, input sequence)`
///    wins;
/// 3. domain scopes of the surviving side are unioned when the union truly
///    widens coverage. Rules sharing a key are already identical in every
///    modifier other than domain scope, but negated scope entries make a
///    textual union narrow instead of widen; such groups keep the winner's
///    scope unmerged.
///
/// Losers are recorded as shadowed, never silently discarded.
pub fn resolve(rules: Vec<ClassifiedRule>) -> Vec<ResolvedRule> {
    let mut order: Vec<CanonicalKey> = Vec::new();
    let mut groups: HashMap<CanonicalKey, Vec<(usize, ClassifiedRule)>> = HashMap::new();

    for (seq, classified) in rules.into_iter().enumerate() {
        let entry = groups.entry(classified.key.clone()).or_default();
        if entry.is_empty() {
            order.push(classified.key.clone());
        }
        entry.push((seq, classified));
    }

    order
        .into_iter()
        .map(|key| {
            let group = groups.remove(&key).expect("group exists for ordered key");
            resolve_group(key, group)
        })
        .collect()
}

fn resolve_group(key: CanonicalKey, group: Vec<(usize, ClassifiedRule)>) -> ResolvedRule {
    let has_exception = group.iter().any(|(_, c)| c.rule.is_exception);

    // The active side supplies winner and merged scope; the other side is
    // shadowed wholesale.
    let active: Vec<&(usize, ClassifiedRule)> = group
        .iter()
        .filter(|(_, c)| c.rule.is_exception == has_exception)
        .collect();

    let (winner_seq, winner) = active
        .iter()
        .min_by_key(|(seq, c)| (c.rule.origin.priority, *seq))
        .map(|(seq, c)| (*seq, c.rule.clone()))
        .expect("conflict group is never empty");

    let merged_domain_scope = merge_domain_scope(&winner, &active);

    let shadowed: Vec<ParsedRule> = group
        .iter()
        .filter(|(seq, _)| *seq != winner_seq)
        .map(|(_, c)| c.rule.clone())
        .collect();

    if !shadowed.is_empty() {
        debug!(
            key = %key,
            winner = %winner.origin.name,
            shadowed = shadowed.len(),
            "resolved conflict group"
        );
    }

    ResolvedRule {
        key,
        winner,
        merged_domain_scope,
        shadowed,
    }
}

/// Union of the contributing scopes. A single global contributor (empty
/// scope) makes the merged scope global, since a scope restriction can only
/// narrow applicability.
///
/// Negated entries (`~host`) subtract from a rule's coverage, so a textual
/// union that mixes them with entries from other contributors does not
/// compute a coverage union: `~b.com` merged with `a.com` would collapse to
/// "a.com only", narrowing the negated contributor. When any negated entry
/// is present and the contributing scopes are not all identical, the group
/// is non-mergeable and the winner keeps its own scope.
fn merge_domain_scope(winner: &ParsedRule, active: &[&(usize, ClassifiedRule)]) -> Vec<String> {
    let mut scopes: Vec<Vec<String>> = Vec::new();
    for (_, c) in active {
        if c.rule.domains_applied.is_empty() {
            return Vec::new();
        }
        let mut scope = c.rule.domains_applied.clone();
        scope.sort_unstable();
        scope.dedup();
        scopes.push(scope);
    }

    let has_negated = scopes.iter().flatten().any(|d| d.starts_with('~'));
    if has_negated && scopes.windows(2).any(|w| w[0] != w[1]) {
        let mut scope = winner.domains_applied.clone();
        scope.sort_unstable();
        scope.dedup();
        return scope;
    }

    let mut merged: Vec<String> = scopes.into_iter().flatten().collect();
    merged.sort_unstable();
    merged.dedup();
    merged
}
